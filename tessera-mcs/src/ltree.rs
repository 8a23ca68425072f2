//! L-tree compression of WOTS+ public keys.
//!
//! An L-tree folds the `len` elements of a WOTS+ public key into a single
//! n-byte leaf by repeated pairwise tree hashing; an odd element at any
//! level is carried up unhashed.

use tessera_core::Result;

use crate::address::Address;
use crate::hash::{KeygenPrf, ScratchPad, TweakHash};
use crate::params::Context;
use crate::wots;

/// Compress the `len` n-byte elements in `wots_pk` down to one leaf.
/// The buffer is consumed as workspace.
pub(crate) fn ltree_root_into(
    ctx: &Context,
    hash: &TweakHash,
    wots_pk: &mut [u8],
    mut addr: Address,
    out: &mut [u8],
) {
    let n = ctx.n();
    let mut l = ctx.wots_len() as usize;
    let mut height: u32 = 0;
    let mut pair = [0u8; 128];

    while l > 1 {
        addr.set_tree_height(height);
        let parents = l / 2;
        for i in 0..parents {
            addr.set_tree_index(i as u32);
            pair[..2 * n].copy_from_slice(&wots_pk[2 * i * n..(2 * i + 2) * n]);
            hash.thash_h_into(
                &pair[..n],
                &pair[n..2 * n],
                addr,
                &mut wots_pk[i * n..(i + 1) * n],
            );
        }
        if l % 2 == 1 {
            // Odd element moves up a level unhashed.
            pair[..n].copy_from_slice(&wots_pk[(l - 1) * n..l * n]);
            wots_pk[parents * n..(parents + 1) * n].copy_from_slice(&pair[..n]);
            l = parents + 1;
        } else {
            l = parents;
        }
        height += 1;
    }
    out[..n].copy_from_slice(&wots_pk[..n]);
}

/// Compute the tree leaf for the one-time key `index` within `(layer,
/// tree)`: generate the WOTS+ public key into the scratchpad and compress
/// it with the matching L-tree address.
pub(crate) fn gen_leaf_into(
    ctx: &Context,
    hash: &TweakHash,
    keygen: &KeygenPrf,
    layer: u32,
    tree: u64,
    index: u32,
    pad: &mut ScratchPad,
    out: &mut [u8],
) -> Result<()> {
    let ots_addr = Address::ots(layer, tree, index);
    let ltree_addr = Address::ltree(layer, tree, index);

    wots::pk_gen_into(ctx, hash, keygen, ots_addr, &mut pad.wots)?;
    ltree_root_into(ctx, hash, &mut pad.wots, ltree_addr, out);
    Ok(())
}

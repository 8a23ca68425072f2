//! Leaf generation for tree construction.
//!
//! Leaves are independent functions of the seeds and their address, so tree
//! construction fans the leaf computations out over a worker pool. Work is
//! handed out in batches to keep scheduling overhead below the cost of a
//! WOTS+ key generation, and every worker owns a private scratchpad.
//! Internal-node construction stays sequential in the tree builders.

use tessera_core::Result;

use crate::hash::{KeygenPrf, ScratchPad, TweakHash};
use crate::ltree::gen_leaf_into;
use crate::params::Context;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Leaves handed to a worker per claim.
#[cfg(feature = "parallel")]
const LEAF_BATCH: usize = 32;

/// Generate `count` leaves for `(layer, tree)` into a contiguous buffer,
/// leaf `k` at offset `k * n`.
pub(crate) fn generate_leaves(
    ctx: &Context,
    hash: &TweakHash,
    keygen: &KeygenPrf,
    layer: u32,
    tree: u64,
    count: u32,
) -> Result<Vec<u8>> {
    let n = ctx.n();
    let mut out = vec![0u8; count as usize * n];

    #[cfg(feature = "parallel")]
    if ctx.threads() != 1 && count > 1 {
        generate_parallel(ctx, hash, keygen, layer, tree, &mut out)?;
        return Ok(out);
    }

    let mut pad = ScratchPad::new(ctx);
    for idx in 0..count {
        let start = idx as usize * n;
        gen_leaf_into(
            ctx,
            hash,
            keygen,
            layer,
            tree,
            idx,
            &mut pad,
            &mut out[start..start + n],
        )?;
    }
    Ok(out)
}

#[cfg(feature = "parallel")]
fn generate_parallel(
    ctx: &Context,
    hash: &TweakHash,
    keygen: &KeygenPrf,
    layer: u32,
    tree: u64,
    out: &mut [u8],
) -> Result<()> {
    let n = ctx.n();
    let work = |out: &mut [u8]| {
        out.par_chunks_mut(n)
            .enumerate()
            .with_min_len(LEAF_BATCH)
            .try_for_each_init(
                || ScratchPad::new(ctx),
                |pad, (idx, chunk)| {
                    gen_leaf_into(ctx, hash, keygen, layer, tree, idx as u32, pad, chunk)
                },
            )
    };

    // An explicit thread count gets its own pool; otherwise the global
    // pool (one worker per core) is used.
    if ctx.threads() > 1 {
        if let Ok(pool) = rayon::ThreadPoolBuilder::new()
            .num_threads(ctx.threads())
            .build()
        {
            return pool.install(|| work(out));
        }
    }
    work(out)
}

//! The balanced Merkle root tree authenticating channel roots.
//!
//! Leaf `k` is the L-tree of the WOTS+ public key at `(layer 0, tree 0,
//! index k)`. The one-time key under leaf `k` signs the k-th channel root
//! issued by the key pair; the tree root is the key pair's public root.

use tessera_core::Result;

use crate::address::Address;
use crate::hash::{KeygenPrf, TweakHash};
use crate::params::Context;
use crate::parallel::generate_leaves;

pub(crate) struct RootTree {
    height: u32,
    n: usize,
    /// All levels, leaves first: level `l` holds `2^(height - l)` nodes.
    buf: Vec<u8>,
}

impl RootTree {
    /// Deterministically build the full tree: `2^height` leaves via the
    /// worker pool, then each level bottom-up.
    pub fn generate(ctx: &Context, hash: &TweakHash, keygen: &KeygenPrf) -> Result<Self> {
        let height = ctx.params().root_height;
        let n = ctx.n();
        let num_leaves = 1usize << height;
        let mut tree = Self {
            height,
            n,
            buf: vec![0u8; (2 * num_leaves - 1) * n],
        };

        let leaves = generate_leaves(ctx, hash, keygen, 0, 0, num_leaves as u32)?;
        tree.buf[..leaves.len()].copy_from_slice(&leaves);

        let base_addr = Address::node(0, 0);
        let mut pair = [0u8; 128];
        let mut parent = [0u8; 64];
        for level in 0..height {
            for i in 0..1u32 << (height - level - 1) {
                let mut addr = base_addr;
                addr.set_tree_height(level);
                addr.set_tree_index(i);

                let src = tree.offset(level, 2 * i);
                pair[..2 * n].copy_from_slice(&tree.buf[src..src + 2 * n]);
                hash.thash_h_into(&pair[..n], &pair[n..2 * n], addr, &mut parent[..n]);

                let dst = tree.offset(level + 1, i);
                tree.buf[dst..dst + n].copy_from_slice(&parent[..n]);
            }
        }
        Ok(tree)
    }

    fn offset(&self, level: u32, index: u32) -> usize {
        // Level l starts after 2^(h+1) - 2^(h+1-l) earlier nodes.
        let skipped = (1usize << (self.height + 1)) - (1usize << (self.height + 1 - level));
        (skipped + index as usize) * self.n
    }

    fn node(&self, level: u32, index: u32) -> &[u8] {
        let start = self.offset(level, index);
        &self.buf[start..start + self.n]
    }

    /// The tree root: the key pair's public root.
    pub fn root(&self) -> &[u8] {
        self.node(self.height, 0)
    }

    /// Write the authentication path for `leaf_idx` into `out`
    /// (`height * n` bytes, bottom-up).
    pub fn auth_path_into(&self, leaf_idx: u32, out: &mut [u8]) {
        let n = self.n;
        for level in 0..self.height {
            let sibling = (leaf_idx >> level) ^ 1;
            let dst = level as usize * n;
            out[dst..dst + n].copy_from_slice(self.node(level, sibling));
        }
    }
}

/// Recompute the root from a leaf and its authentication path, choosing
/// sibling order from the leaf index bits. Used by the verifier.
pub(crate) fn compute_root_from_leaf(
    ctx: &Context,
    hash: &TweakHash,
    leaf: &[u8],
    leaf_idx: u32,
    auth_path: &[u8],
    out: &mut [u8],
) {
    let n = ctx.n();
    let height = ctx.params().root_height;
    let base_addr = Address::node(0, 0);

    let mut node = [0u8; 64];
    node[..n].copy_from_slice(leaf);

    for level in 0..height {
        let mut addr = base_addr;
        addr.set_tree_height(level);
        addr.set_tree_index(leaf_idx >> (level + 1));

        let sibling = &auth_path[level as usize * n..(level as usize + 1) * n];
        let mut parent = [0u8; 64];
        if (leaf_idx >> level) & 1 == 0 {
            hash.thash_h_into(&node[..n], sibling, addr, &mut parent[..n]);
        } else {
            hash.thash_h_into(sibling, &node[..n], addr, &mut parent[..n]);
        }
        node = parent;
    }
    out[..n].copy_from_slice(&node[..n]);
}

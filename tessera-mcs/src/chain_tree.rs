//! The asymmetric chain tree backing a channel layer.
//!
//! A chain tree of height `t` has `t` leaves but internal nodes only at
//! index 0 or 1:
//!
//! ```text
//!                 node(t-1, 0)
//!                /         |
//!        node(t-2, 0)  node(t-2, 1)
//!            /    |
//!          ...  node(1, 1)
//!          /  |
//!  node(0, 0) node(0, 1)
//! ```
//!
//! `leaf(0) = node(0, 0)` and `leaf(k) = node(k-1, 1)` for `k >= 1`; each
//! internal node hashes the two nodes one level down. Signatures consume
//! leaves from the top of the tree downward, so each one needs only the
//! single left sibling below it as its authentication path.
//!
//! All nodes live in one contiguous buffer, `node(h, i)` at byte offset
//! `n * (2h + i)`.

use tessera_core::Result;

use crate::address::Address;
use crate::hash::{KeygenPrf, TweakHash};
use crate::params::Context;
use crate::parallel::generate_leaves;

pub(crate) struct ChainTree {
    height: u32,
    n: usize,
    buf: Vec<u8>,
}

impl ChainTree {
    /// Deterministically generate the chain tree for `(chan_idx, layer)`:
    /// all `t` leaves (worker pool), then the internal spine bottom-up.
    pub fn generate(
        ctx: &Context,
        hash: &TweakHash,
        keygen: &KeygenPrf,
        chan_idx: u32,
        layer: u32,
    ) -> Result<Self> {
        let t = ctx.chain_height(layer);
        let n = ctx.n();
        let mut tree = Self {
            height: t,
            n,
            buf: vec![0u8; (2 * t as usize - 1) * n],
        };

        let leaves = generate_leaves(ctx, hash, keygen, layer, u64::from(chan_idx), t)?;
        for k in 0..t {
            let src = k as usize * n;
            let dst = tree.offset(k.saturating_sub(1), u32::from(k > 0));
            tree.buf[dst..dst + n].copy_from_slice(&leaves[src..src + n]);
        }

        let base_addr = Address::node(layer, u64::from(chan_idx));
        let mut left = [0u8; 64];
        let mut right = [0u8; 64];
        let mut parent = [0u8; 64];
        for h in 1..t {
            let mut addr = base_addr;
            addr.set_tree_height(h - 1);
            addr.set_tree_index(0);

            left[..n].copy_from_slice(tree.node(h - 1, 0));
            right[..n].copy_from_slice(tree.node(h - 1, 1));
            hash.thash_h_into(&left[..n], &right[..n], addr, &mut parent[..n]);

            let dst = tree.offset(h, 0);
            tree.buf[dst..dst + n].copy_from_slice(&parent[..n]);
        }
        Ok(tree)
    }

    fn offset(&self, height: u32, index: u32) -> usize {
        debug_assert!(index <= 1);
        self.n * (2 * height as usize + index as usize)
    }

    /// The node at `(height, index)`.
    pub fn node(&self, height: u32, index: u32) -> &[u8] {
        let start = self.offset(height, index);
        &self.buf[start..start + self.n]
    }

    /// The leaf for the one-time key at `index`.
    pub fn leaf(&self, index: u32) -> &[u8] {
        if index == 0 {
            self.node(0, 0)
        } else {
            self.node(index - 1, 1)
        }
    }

    /// The tree root, authenticated by a channel-root or grow signature.
    pub fn root(&self) -> &[u8] {
        self.node(self.height - 1, 0)
    }

    /// The authentication sibling for the s-th signature of this layer
    /// (`s` in `1..height`), i.e. the left node one level below the value
    /// the verifier recomputes. The final signature (`s == height`) has no
    /// sibling: its leaf is compared to the anchor directly.
    pub fn auth_sibling(&self, s: u32) -> Option<&[u8]> {
        if s < self.height {
            Some(self.node(self.height - s - 1, 0))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Params;

    fn build(t: u32) -> (Context, TweakHash, ChainTree) {
        let params = Params::new(32, 16, 2, t, 1).unwrap();
        let ctx = Context::new(params).unwrap().with_threads(1);
        let hash = TweakHash::new(32, &[2u8; 32]);
        let keygen = KeygenPrf::new(32, &[1u8; 32]);
        let tree = ChainTree::generate(&ctx, &hash, &keygen, 1, 1).unwrap();
        (ctx, hash, tree)
    }

    #[test]
    fn test_buffer_covers_all_nodes() {
        let (_, _, tree) = build(5);
        assert_eq!(tree.buf.len(), (2 * 5 - 1) * 32);

        // Offsets tile the buffer without overlap.
        let mut seen = vec![false; 2 * 5 - 1];
        for h in 0..5u32 {
            let max_i = if h == 4 { 0 } else { 1 };
            for i in 0..=max_i {
                let slot = tree.offset(h, i) / 32;
                assert!(!seen[slot], "overlapping node ({h}, {i})");
                seen[slot] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_leaf_aliases_nodes() {
        let (_, _, tree) = build(4);
        assert_eq!(tree.leaf(0), tree.node(0, 0));
        for k in 1..4 {
            assert_eq!(tree.leaf(k), tree.node(k - 1, 1));
        }
    }

    #[test]
    fn test_internal_nodes_hash_children() {
        let (_, hash, tree) = build(4);
        let mut out = [0u8; 32];
        for h in 1..4u32 {
            let mut addr = Address::node(1, 1);
            addr.set_tree_height(h - 1);
            addr.set_tree_index(0);
            hash.thash_h_into(tree.node(h - 1, 0), tree.node(h - 1, 1), addr, &mut out);
            assert_eq!(tree.node(h, 0), &out);
        }
    }

    #[test]
    fn test_auth_sibling_mapping() {
        let (_, _, tree) = build(4);
        assert_eq!(tree.auth_sibling(1).unwrap(), tree.node(2, 0));
        assert_eq!(tree.auth_sibling(2).unwrap(), tree.node(1, 0));
        assert_eq!(tree.auth_sibling(3).unwrap(), tree.node(0, 0));
        assert!(tree.auth_sibling(4).is_none());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let (_, _, t1) = build(4);
        let (_, _, t2) = build(4);
        assert_eq!(t1.buf, t2.buf);
    }

    #[test]
    fn test_height_one_tree() {
        let (_, _, tree) = build(1);
        assert_eq!(tree.buf.len(), 32);
        assert_eq!(tree.root(), tree.leaf(0));
        assert!(tree.auth_sibling(1).is_none());
    }
}

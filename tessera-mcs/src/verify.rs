//! The stateless verifier and per-channel verification state.
//!
//! Verification recomputes the signed structure from the signature alone
//! and compares the result to a trusted value in constant time. For channel
//! roots the trusted value is the key pair's public root; for messages it
//! is the channel's current *authentication node*: the chain-tree root for
//! the first signature of a chain, thereafter the previous signature's
//! authentication path. [`ChannelVerifier`] tracks that node per channel.

use subtle::ConstantTimeEq;
use tessera_core::{Error, Result};

use crate::address::Address;
use crate::hash::{hash_message, ScratchPad, TweakHash};
use crate::ltree::ltree_root_into;
use crate::params::{Context, Params, PARAMS_BYTES};
use crate::root_tree::compute_root_from_leaf;
use crate::signature::{GrowSignature, MsgSignature, RootSignature};
use crate::wots;

/// A verification key: the public root, the public seed, and the
/// parameters. The seed-keyed hash midstate is built once at construction.
#[derive(Clone)]
pub struct PublicKey {
    ctx: Context,
    root: Vec<u8>,
    pub_seed: Vec<u8>,
    hash: TweakHash,
}

impl PublicKey {
    pub(crate) fn from_parts(ctx: Context, root: Vec<u8>, pub_seed: Vec<u8>) -> Self {
        let hash = TweakHash::new(ctx.n(), &pub_seed);
        Self {
            ctx,
            root,
            pub_seed,
            hash,
        }
    }

    /// The parameter set this key was generated under.
    #[must_use]
    pub fn params(&self) -> &Params {
        self.ctx.params()
    }

    /// The root-tree root.
    #[must_use]
    pub fn root(&self) -> &[u8] {
        &self.root
    }

    /// Serialize as `root(n) | pubSeed(n) | params`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 * self.ctx.n() + PARAMS_BYTES);
        out.extend_from_slice(&self.root);
        out.extend_from_slice(&self.pub_seed);
        out.extend_from_slice(&self.ctx.params().to_bytes());
        out
    }

    /// Deserialize from [`to_bytes`](Self::to_bytes) output.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < PARAMS_BYTES {
            return Err(Error::InvalidKeyLength {
                expected: PARAMS_BYTES,
                actual: bytes.len(),
            });
        }
        let params = Params::from_bytes(&bytes[bytes.len() - PARAMS_BYTES..])?;
        let ctx = Context::new(params)?;
        let n = ctx.n();
        if bytes.len() != 2 * n + PARAMS_BYTES {
            return Err(Error::InvalidKeyLength {
                expected: 2 * n + PARAMS_BYTES,
                actual: bytes.len(),
            });
        }
        Ok(Self::from_parts(
            ctx,
            bytes[..n].to_vec(),
            bytes[n..2 * n].to_vec(),
        ))
    }

    /// Verify a channel-root signature against the root tree.
    ///
    /// Returns `false` on any invalidity, malformed lengths included.
    #[must_use]
    pub fn verify_channel_root(&self, sig: &RootSignature, ch_root: &[u8]) -> bool {
        let n = self.ctx.n();
        let auth_len = self.ctx.params().root_height as usize * n;
        if ch_root.len() != n
            || sig.drv.len() != n
            || sig.wots_sig.len() != self.ctx.wots_sig_bytes()
            || sig.auth_path.len() != auth_len
            || sig.root_hash.len() != n
            || sig.seq_no >= self.ctx.root_capacity()
        {
            return false;
        }

        let mut digest = vec![0u8; n];
        hash_message(
            n,
            &sig.drv,
            &self.root,
            u64::from(sig.seq_no),
            ch_root,
            &mut digest,
        );

        let mut pad = ScratchPad::new(&self.ctx);
        let ScratchPad { wots: wots_buf, digits } = &mut pad;
        if wots::pk_from_sig_into(
            &self.ctx,
            &self.hash,
            &sig.wots_sig,
            &digest,
            Address::ots(0, 0, sig.seq_no),
            digits,
            wots_buf,
        )
        .is_err()
        {
            return false;
        }

        let mut leaf = [0u8; 64];
        ltree_root_into(
            &self.ctx,
            &self.hash,
            wots_buf,
            Address::ltree(0, 0, sig.seq_no),
            &mut leaf[..n],
        );

        let mut computed = vec![0u8; n];
        compute_root_from_leaf(
            &self.ctx,
            &self.hash,
            &leaf[..n],
            sig.seq_no,
            &sig.auth_path,
            &mut computed,
        );

        bool::from(computed.ct_eq(&self.root) & sig.root_hash.ct_eq(ch_root))
    }

    /// Verify a message signature against the channel's current
    /// authentication node.
    ///
    /// For all but the last signature of a chain tree, the recomputed
    /// parent node must equal `auth_node` and the signature's own
    /// `auth_path` becomes the verifier's next trusted node. The last
    /// signature (the reserved key) recomputes the leaf itself.
    ///
    /// Returns `false` on any invalidity, malformed lengths included.
    #[must_use]
    pub fn verify_channel_msg(&self, sig: &MsgSignature, msg: &[u8], auth_node: &[u8]) -> bool {
        let n = self.ctx.n();
        if sig.chan_idx == 0
            || sig.layer == 0
            || sig.drv.len() != n
            || sig.wots_sig.len() != self.ctx.wots_sig_bytes()
            || sig.auth_path.len() != n
            || auth_node.len() != n
        {
            return false;
        }
        let t = self.ctx.chain_height(sig.layer);
        let s = sig.chain_seq_no;
        if s == 0 || s > t {
            return false;
        }
        let leaf_idx = t - s;

        let sig_idx = (u64::from(sig.chan_idx) << 32) | u64::from(sig.seq_no);
        let mut digest = vec![0u8; n];
        hash_message(n, &sig.drv, &self.root, sig_idx, msg, &mut digest);

        let mut pad = ScratchPad::new(&self.ctx);
        let ScratchPad { wots: wots_buf, digits } = &mut pad;
        if wots::pk_from_sig_into(
            &self.ctx,
            &self.hash,
            &sig.wots_sig,
            &digest,
            Address::ots(sig.layer, u64::from(sig.chan_idx), leaf_idx),
            digits,
            wots_buf,
        )
        .is_err()
        {
            return false;
        }

        let mut leaf = [0u8; 64];
        ltree_root_into(
            &self.ctx,
            &self.hash,
            wots_buf,
            Address::ltree(sig.layer, u64::from(sig.chan_idx), leaf_idx),
            &mut leaf[..n],
        );

        if s < t {
            let mut addr = Address::node(sig.layer, u64::from(sig.chan_idx));
            addr.set_tree_height(leaf_idx - 1);
            addr.set_tree_index(0);

            let mut computed = vec![0u8; n];
            self.hash
                .thash_h_into(&sig.auth_path, &leaf[..n], addr, &mut computed);
            bool::from(computed.ct_eq(auth_node))
        } else {
            bool::from(leaf[..n].ct_eq(auth_node))
        }
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.ctx.params() == other.ctx.params()
            && self.root == other.root
            && self.pub_seed == other.pub_seed
    }
}

impl Eq for PublicKey {}

impl core::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PublicKey")
            .field("params", self.ctx.params())
            .finish_non_exhaustive()
    }
}

/// Verifier-side state for one channel: the latest trusted authentication
/// node plus the expected counters, advanced only on successful
/// verification.
pub struct ChannelVerifier {
    pk: PublicKey,
    chan_idx: u32,
    layer: u32,
    next_chain_seq_no: u32,
    next_seq_no: u32,
    anchor: Vec<u8>,
}

impl ChannelVerifier {
    /// Accept a channel: check its root signature and anchor at the signed
    /// chain-tree root.
    pub fn new(pk: PublicKey, chan_idx: u32, root_sig: &RootSignature) -> Result<Self> {
        if chan_idx == 0 {
            return Err(Error::UnknownChannel { idx: chan_idx });
        }
        if !pk.verify_channel_root(root_sig, &root_sig.root_hash) {
            return Err(Error::InvalidSignature);
        }
        let anchor = root_sig.root_hash.clone();
        Ok(Self {
            pk,
            chan_idx,
            layer: 1,
            next_chain_seq_no: 1,
            next_seq_no: 0,
            anchor,
        })
    }

    /// The currently trusted authentication node.
    #[must_use]
    pub fn anchor(&self) -> &[u8] {
        &self.anchor
    }

    /// Verify the next message signature in the channel's order and, on
    /// success, advance the trusted node.
    pub fn verify_msg(&mut self, sig: &MsgSignature, msg: &[u8]) -> bool {
        if !self.expected(sig) || !self.pk.verify_channel_msg(sig, msg, &self.anchor) {
            return false;
        }
        let t = self.pk.ctx.chain_height(self.layer);
        if sig.chain_seq_no < t {
            self.anchor = sig.auth_path.clone();
        }
        // A message signed with the reserved key leaves no further
        // authentication node; the chain ends unless a grow follows it.
        self.next_chain_seq_no += 1;
        self.next_seq_no += 1;
        true
    }

    /// Verify a grow signature and, on success, re-anchor at the new
    /// chain-tree root and move to the next layer.
    pub fn verify_grow(&mut self, grow: &GrowSignature) -> bool {
        let sig = &grow.msg_sig;
        let t = self.pk.ctx.chain_height(self.layer);
        if sig.chain_seq_no != t
            || grow.root.len() != self.pk.ctx.n()
            || !self.expected(sig)
            || !self.pk.verify_channel_msg(sig, &grow.root, &self.anchor)
        {
            return false;
        }
        self.anchor = grow.root.clone();
        self.layer += 1;
        self.next_chain_seq_no = 1;
        self.next_seq_no += 1;
        true
    }

    fn expected(&self, sig: &MsgSignature) -> bool {
        sig.chan_idx == self.chan_idx
            && sig.layer == self.layer
            && sig.chain_seq_no == self.next_chain_seq_no
            && sig.seq_no == self.next_seq_no
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_key_roundtrip() {
        let params = Params::new(32, 16, 3, 4, 2).unwrap();
        let ctx = Context::new(params).unwrap();
        let pk = PublicKey::from_parts(ctx, vec![1u8; 32], vec![2u8; 32]);

        let bytes = pk.to_bytes();
        assert_eq!(bytes.len(), 64 + PARAMS_BYTES);
        assert_eq!(PublicKey::from_bytes(&bytes).unwrap(), pk);
    }

    #[test]
    fn test_public_key_rejects_bad_length() {
        let params = Params::new(32, 16, 3, 4, 2).unwrap();
        let ctx = Context::new(params).unwrap();
        let pk = PublicKey::from_parts(ctx, vec![1u8; 32], vec![2u8; 32]);

        let bytes = pk.to_bytes();
        assert!(PublicKey::from_bytes(&bytes[1..]).is_err());
    }

    #[test]
    fn test_malformed_signature_is_false_not_panic() {
        let params = Params::new(32, 16, 3, 4, 2).unwrap();
        let ctx = Context::new(params).unwrap();
        let pk = PublicKey::from_parts(ctx, vec![1u8; 32], vec![2u8; 32]);

        let sig = RootSignature {
            seq_no: 0,
            drv: vec![0; 16], // wrong length
            wots_sig: vec![0; 8],
            auth_path: vec![0; 8],
            root_hash: vec![0; 32],
        };
        assert!(!pk.verify_channel_root(&sig, &[0u8; 32]));
    }
}

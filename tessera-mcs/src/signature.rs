//! Signature types and their wire encodings.
//!
//! All encodings are network byte order with n-byte hash elements. Element
//! widths follow from the parameter set, so decoding requires the params
//! (carried by the public key) and validates the total length up front.

use tessera_core::{Error, Result};

use crate::params::{Context, Params};
use crate::utils::to_int;

/// A signature over a channel root, issued under the root tree.
///
/// Wire layout:
/// `seqNo(4) | drv(n) | wotsSig(len*n) | authPath(rootH*n) | rootHash(n)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootSignature {
    pub(crate) seq_no: u32,
    pub(crate) drv: Vec<u8>,
    pub(crate) wots_sig: Vec<u8>,
    pub(crate) auth_path: Vec<u8>,
    pub(crate) root_hash: Vec<u8>,
}

impl RootSignature {
    /// The root-tree leaf index that signed this channel root.
    #[must_use]
    pub fn seq_no(&self) -> u32 {
        self.seq_no
    }

    /// The channel root covered by this signature.
    #[must_use]
    pub fn root_hash(&self) -> &[u8] {
        &self.root_hash
    }

    /// Encoded length for a parameter set.
    pub fn encoded_len(params: &Params) -> Result<usize> {
        let ctx = Context::new(*params)?;
        let n = ctx.n();
        Ok(4 + n + ctx.wots_sig_bytes() + params.root_height as usize * n + n)
    }

    /// Serialize to the wire layout.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            4 + self.drv.len() + self.wots_sig.len() + self.auth_path.len() + self.root_hash.len(),
        );
        out.extend_from_slice(&self.seq_no.to_be_bytes());
        out.extend_from_slice(&self.drv);
        out.extend_from_slice(&self.wots_sig);
        out.extend_from_slice(&self.auth_path);
        out.extend_from_slice(&self.root_hash);
        out
    }

    /// Deserialize from the wire layout.
    pub fn from_bytes(bytes: &[u8], params: &Params) -> Result<Self> {
        let expected = Self::encoded_len(params)?;
        if bytes.len() != expected {
            return Err(Error::InvalidSignatureLength {
                expected,
                actual: bytes.len(),
            });
        }
        let ctx = Context::new(*params)?;
        let n = ctx.n();
        let wots = ctx.wots_sig_bytes();
        let auth = params.root_height as usize * n;

        let mut at = 0usize;
        let seq_no = to_int(&bytes[at..at + 4]) as u32;
        at += 4;
        let drv = bytes[at..at + n].to_vec();
        at += n;
        let wots_sig = bytes[at..at + wots].to_vec();
        at += wots;
        let auth_path = bytes[at..at + auth].to_vec();
        at += auth;
        let root_hash = bytes[at..at + n].to_vec();

        Ok(Self {
            seq_no,
            drv,
            wots_sig,
            auth_path,
            root_hash,
        })
    }
}

/// A message signature within a channel's chain tree.
///
/// Wire layout:
/// `seqNo(4) | chainSeqNo(4) | chIdx(4) | layer(4) | drv(n) | wotsSig(len*n)
/// | authPath(n) | [RootSignature]`, the trailing root signature present on
/// the first message signature of a channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgSignature {
    pub(crate) seq_no: u32,
    pub(crate) chain_seq_no: u32,
    pub(crate) chan_idx: u32,
    pub(crate) layer: u32,
    pub(crate) drv: Vec<u8>,
    pub(crate) wots_sig: Vec<u8>,
    pub(crate) auth_path: Vec<u8>,
    pub(crate) root_sig: Option<RootSignature>,
}

impl MsgSignature {
    /// Monotone per-channel message counter, starting at 0.
    #[must_use]
    pub fn seq_no(&self) -> u32 {
        self.seq_no
    }

    /// 1-based signature number within the current chain tree.
    #[must_use]
    pub fn chain_seq_no(&self) -> u32 {
        self.chain_seq_no
    }

    /// The channel this signature belongs to (1-based).
    #[must_use]
    pub fn chan_idx(&self) -> u32 {
        self.chan_idx
    }

    /// The chain-tree layer this signature was issued at (1-based).
    #[must_use]
    pub fn layer(&self) -> u32 {
        self.layer
    }

    /// The embedded channel-root signature, present on the channel's first
    /// message signature.
    #[must_use]
    pub fn root_sig(&self) -> Option<&RootSignature> {
        self.root_sig.as_ref()
    }

    /// The authentication sibling released by this signature: the
    /// verifier's trusted node for the channel's next signature. All zero
    /// on a signature issued with the reserved last key.
    #[must_use]
    pub fn auth_path(&self) -> &[u8] {
        &self.auth_path
    }

    /// Encoded length without the optional embedded root signature.
    pub fn base_encoded_len(params: &Params) -> Result<usize> {
        let ctx = Context::new(*params)?;
        let n = ctx.n();
        Ok(16 + n + ctx.wots_sig_bytes() + n)
    }

    /// Serialize to the wire layout.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.seq_no.to_be_bytes());
        out.extend_from_slice(&self.chain_seq_no.to_be_bytes());
        out.extend_from_slice(&self.chan_idx.to_be_bytes());
        out.extend_from_slice(&self.layer.to_be_bytes());
        out.extend_from_slice(&self.drv);
        out.extend_from_slice(&self.wots_sig);
        out.extend_from_slice(&self.auth_path);
        if let Some(root_sig) = &self.root_sig {
            out.extend_from_slice(&root_sig.to_bytes());
        }
        out
    }

    /// Deserialize from the wire layout; the embedded root signature is
    /// detected by total length.
    pub fn from_bytes(bytes: &[u8], params: &Params) -> Result<Self> {
        let base = Self::base_encoded_len(params)?;
        let embedded = base + RootSignature::encoded_len(params)?;
        if bytes.len() != base && bytes.len() != embedded {
            return Err(Error::InvalidSignatureLength {
                expected: base,
                actual: bytes.len(),
            });
        }
        let ctx = Context::new(*params)?;
        let n = ctx.n();
        let wots = ctx.wots_sig_bytes();

        let mut at = 0usize;
        let seq_no = to_int(&bytes[at..at + 4]) as u32;
        let chain_seq_no = to_int(&bytes[at + 4..at + 8]) as u32;
        let chan_idx = to_int(&bytes[at + 8..at + 12]) as u32;
        let layer = to_int(&bytes[at + 12..at + 16]) as u32;
        at += 16;
        let drv = bytes[at..at + n].to_vec();
        at += n;
        let wots_sig = bytes[at..at + wots].to_vec();
        at += wots;
        let auth_path = bytes[at..at + n].to_vec();
        at += n;

        let root_sig = if bytes.len() == embedded {
            Some(RootSignature::from_bytes(&bytes[at..], params)?)
        } else {
            None
        };

        Ok(Self {
            seq_no,
            chain_seq_no,
            chan_idx,
            layer,
            drv,
            wots_sig,
            auth_path,
            root_sig,
        })
    }
}

/// A grow signature: a message signature whose message is the next chain
/// tree's root, carried alongside that root.
///
/// Wire layout: `MsgSignature | root(n)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrowSignature {
    pub(crate) msg_sig: MsgSignature,
    pub(crate) root: Vec<u8>,
}

impl GrowSignature {
    /// The signature over the new chain-tree root, issued with the previous
    /// chain tree's reserved last key.
    #[must_use]
    pub fn msg_sig(&self) -> &MsgSignature {
        &self.msg_sig
    }

    /// The new chain-tree root.
    #[must_use]
    pub fn root(&self) -> &[u8] {
        &self.root
    }

    /// Serialize to the wire layout.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.msg_sig.to_bytes();
        out.extend_from_slice(&self.root);
        out
    }

    /// Deserialize from the wire layout.
    pub fn from_bytes(bytes: &[u8], params: &Params) -> Result<Self> {
        let n = params.n as usize;
        if bytes.len() < n {
            return Err(Error::InvalidSignatureLength {
                expected: MsgSignature::base_encoded_len(params)? + n,
                actual: bytes.len(),
            });
        }
        let (sig_bytes, root) = bytes.split_at(bytes.len() - n);
        Ok(Self {
            msg_sig: MsgSignature::from_bytes(sig_bytes, params)?,
            root: root.to_vec(),
        })
    }
}

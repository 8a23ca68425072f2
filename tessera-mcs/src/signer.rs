//! The stateful signer: key generation, channels, and signing.
//!
//! A private key signs an unbounded stream of messages per channel and up
//! to `2^root_height` channel roots over its lifetime. Counters never
//! regress: the root index and the per-channel counters advance in the same
//! critical section that produces the signature bytes, so a one-time key
//! can never be used twice. Callers that must survive restarts persist the
//! key (`to_bytes`) after every signature; the scheme itself keeps no
//! state outside this struct.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand_core::{CryptoRng, OsRng, TryRngCore};
use tessera_core::{Error, Result, Zeroizing};
use zeroize::Zeroize;

use crate::address::Address;
use crate::chain_tree::ChainTree;
use crate::hash::{hash_message, prf_u64, KeygenPrf, ScratchPad, TweakHash};
use crate::params::{Context, PARAMS_BYTES};
use crate::root_tree::RootTree;
use crate::signature::{GrowSignature, MsgSignature, RootSignature};
use crate::verify::PublicKey;
use crate::wots;

/// Lock a mutex, recovering the guard if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Per-channel signing state, guarded by the channel's own mutex.
struct ChannelState {
    /// Number of chain trees issued so far; the current layer, 1-based.
    layers: u32,
    /// 1-based count of signatures issued within the current chain tree.
    chain_seq_no: u32,
    /// Monotone count of message signatures across all layers.
    seq_no: u32,
    /// The channel's root signature, embedded in the first message
    /// signature. Absent on keys restored from bytes.
    root_sig: Option<RootSignature>,
}

struct Channel {
    state: Mutex<ChannelState>,
}

/// A stateful signing key.
///
/// All signing methods take `&self`; internal mutexes arbitrate the
/// root-tree index and the per-channel counters, so a key can be shared
/// across threads behind an `Arc`.
pub struct PrivateKey {
    ctx: Context,
    sk_seed: Vec<u8>,
    sk_prf: Vec<u8>,
    pub_seed: Vec<u8>,
    root: Vec<u8>,
    hash: TweakHash,
    keygen: KeygenPrf,
    /// Next free root-tree leaf.
    seq_no: Mutex<u32>,
    /// Channels in creation order; channel `i` lives at `channels[i - 1]`.
    channels: Mutex<Vec<Arc<Channel>>>,
}

impl PrivateKey {
    /// Generate a key pair from the given randomness source.
    pub fn generate(ctx: Context, rng: &mut impl CryptoRng) -> Result<(Self, PublicKey)> {
        let n = ctx.n();
        let mut seeds = Zeroizing::new(vec![0u8; 3 * n]);
        rng.fill_bytes(&mut seeds);
        Self::derive(ctx, &seeds[..n], &seeds[n..2 * n], &seeds[2 * n..])
    }

    /// Generate a key pair from the operating system's randomness source.
    pub fn generate_os(ctx: Context) -> Result<(Self, PublicKey)> {
        let n = ctx.n();
        let mut seeds = Zeroizing::new(vec![0u8; 3 * n]);
        OsRng
            .try_fill_bytes(&mut seeds)
            .map_err(|_| Error::RandomnessFailure)?;
        Self::derive(ctx, &seeds[..n], &seeds[n..2 * n], &seeds[2 * n..])
    }

    /// Derive a key pair from caller-provided seeds. Deterministic: the
    /// same seeds always produce the same key pair.
    pub fn derive(
        ctx: Context,
        sk_seed: &[u8],
        sk_prf: &[u8],
        pub_seed: &[u8],
    ) -> Result<(Self, PublicKey)> {
        let n = ctx.n();
        for seed in [sk_seed, sk_prf, pub_seed] {
            if seed.len() != n {
                return Err(Error::InvalidKeyLength {
                    expected: n,
                    actual: seed.len(),
                });
            }
        }

        let hash = TweakHash::new(n, pub_seed);
        let keygen = KeygenPrf::new(n, sk_seed);
        let root = RootTree::generate(&ctx, &hash, &keygen)?.root().to_vec();

        let sk = Self {
            ctx: ctx.clone(),
            sk_seed: sk_seed.to_vec(),
            sk_prf: sk_prf.to_vec(),
            pub_seed: pub_seed.to_vec(),
            root: root.clone(),
            hash,
            keygen,
            seq_no: Mutex::new(0),
            channels: Mutex::new(Vec::new()),
        };
        let pk = PublicKey::from_parts(ctx, root, pub_seed.to_vec());
        Ok((sk, pk))
    }

    /// The verification key for this signing key.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_parts(self.ctx.clone(), self.root.clone(), self.pub_seed.clone())
    }

    /// Number of channels created so far.
    #[must_use]
    pub fn channel_count(&self) -> u32 {
        lock(&self.channels).len() as u32
    }

    /// Open a new channel: generate its first chain tree and sign the tree
    /// root under the root tree. Returns the 1-based channel index and the
    /// root signature that anchors the channel for verifiers.
    ///
    /// Fails with [`Error::OutOfRootKeys`] once all `2^root_height` root
    /// leaves are consumed; no state changes in that case.
    pub fn create_channel(&self) -> Result<(u32, RootSignature)> {
        let mut channels = lock(&self.channels);
        let idx = channels.len() as u32 + 1;

        let tree = ChainTree::generate(&self.ctx, &self.hash, &self.keygen, idx, 1)?;
        let root_sig = self.sign_channel_root(tree.root())?;

        channels.push(Arc::new(Channel {
            state: Mutex::new(ChannelState {
                layers: 1,
                chain_seq_no: 0,
                seq_no: 0,
                root_sig: Some(root_sig.clone()),
            }),
        }));
        Ok((idx, root_sig))
    }

    /// Sign `msg` within the given channel.
    ///
    /// The last one-time key of each chain tree is reserved for signing the
    /// next chain tree's root; reaching it yields [`Error::MustGrowFirst`]
    /// unless `allow_last_key` is set. [`grow_channel`](Self::grow_channel)
    /// is the intended consumer of the reserved key.
    pub fn sign_channel_msg(
        &self,
        chan_idx: u32,
        msg: &[u8],
        allow_last_key: bool,
    ) -> Result<MsgSignature> {
        let channel = self.channel(chan_idx)?;
        let mut state = lock(&channel.state);
        self.sign_msg_locked(chan_idx, &mut state, msg, allow_last_key)
    }

    /// Extend the channel with its next chain tree: sign the new tree's
    /// root with the current tree's reserved last key, then activate the
    /// new layer.
    ///
    /// Fails with [`Error::ChannelNotGrowable`] while unused message keys
    /// remain in the current tree.
    pub fn grow_channel(&self, chan_idx: u32) -> Result<GrowSignature> {
        let channel = self.channel(chan_idx)?;
        let mut state = lock(&channel.state);

        let height = self.ctx.chain_height(state.layers);
        if state.chain_seq_no != height - 1 {
            return Err(Error::ChannelNotGrowable { idx: chan_idx });
        }

        let next_tree =
            ChainTree::generate(&self.ctx, &self.hash, &self.keygen, chan_idx, state.layers + 1)?;
        let root = next_tree.root().to_vec();
        let msg_sig = self.sign_msg_locked(chan_idx, &mut state, &root, true)?;

        state.layers += 1;
        state.chain_seq_no = 0;
        Ok(GrowSignature { msg_sig, root })
    }

    /// Current chain-tree layer of a channel (1-based).
    pub fn channel_layers(&self, chan_idx: u32) -> Result<u32> {
        let channel = self.channel(chan_idx)?;
        let state = lock(&channel.state);
        Ok(state.layers)
    }

    /// Message signatures left in the channel's current chain tree before
    /// it must be grown.
    pub fn remaining_msg_signatures(&self, chan_idx: u32) -> Result<u32> {
        let channel = self.channel(chan_idx)?;
        let state = lock(&channel.state);
        let height = self.ctx.chain_height(state.layers);
        Ok(height - 1 - state.chain_seq_no)
    }

    fn channel(&self, chan_idx: u32) -> Result<Arc<Channel>> {
        if chan_idx == 0 {
            return Err(Error::UnknownChannel { idx: chan_idx });
        }
        let channels = lock(&self.channels);
        channels
            .get(chan_idx as usize - 1)
            .cloned()
            .ok_or(Error::UnknownChannel { idx: chan_idx })
    }

    /// Reserve the next root-tree leaf. The check precedes the increment,
    /// so exhaustion leaves the counter untouched.
    fn next_root_index(&self) -> Result<u32> {
        let mut seq_no = lock(&self.seq_no);
        if *seq_no >= self.ctx.root_capacity() {
            return Err(Error::OutOfRootKeys);
        }
        let idx = *seq_no;
        *seq_no += 1;
        Ok(idx)
    }

    /// Sign a channel root under the root tree.
    fn sign_channel_root(&self, ch_root: &[u8]) -> Result<RootSignature> {
        let n = self.ctx.n();
        let seq_no = self.next_root_index()?;

        let mut drv = vec![0u8; n];
        prf_u64(n, &self.sk_prf, u64::from(seq_no), &mut drv);
        let mut digest = vec![0u8; n];
        hash_message(n, &drv, &self.root, u64::from(seq_no), ch_root, &mut digest);

        let mut pad = ScratchPad::new(&self.ctx);
        let mut wots_sig = vec![0u8; self.ctx.wots_sig_bytes()];
        wots::sign_into(
            &self.ctx,
            &self.hash,
            &self.keygen,
            &digest,
            Address::ots(0, 0, seq_no),
            &mut pad.digits,
            &mut wots_sig,
        )?;

        let tree = RootTree::generate(&self.ctx, &self.hash, &self.keygen)?;
        let mut auth_path = vec![0u8; self.ctx.params().root_height as usize * n];
        tree.auth_path_into(seq_no, &mut auth_path);

        Ok(RootSignature {
            seq_no,
            drv,
            wots_sig,
            auth_path,
            root_hash: ch_root.to_vec(),
        })
    }

    /// Sign a message with the channel state already locked. All fallible
    /// checks come before the first counter mutation.
    fn sign_msg_locked(
        &self,
        chan_idx: u32,
        state: &mut ChannelState,
        msg: &[u8],
        allow_last_key: bool,
    ) -> Result<MsgSignature> {
        let height = self.ctx.chain_height(state.layers);
        if state.chain_seq_no >= height || (state.chain_seq_no == height - 1 && !allow_last_key) {
            return Err(Error::MustGrowFirst { idx: chan_idx });
        }

        // The s-th signature of this layer consumes the leaf at index
        // height - s; leaves are spent from the top of the tree down.
        let s = state.chain_seq_no + 1;
        let leaf_idx = height - s;

        let tree = ChainTree::generate(&self.ctx, &self.hash, &self.keygen, chan_idx, state.layers)?;

        let n = self.ctx.n();
        let sig_idx = (u64::from(chan_idx) << 32) | u64::from(state.seq_no);
        let mut drv = vec![0u8; n];
        prf_u64(n, &self.sk_prf, sig_idx, &mut drv);
        let mut digest = vec![0u8; n];
        hash_message(n, &drv, &self.root, sig_idx, msg, &mut digest);

        let mut pad = ScratchPad::new(&self.ctx);
        let mut wots_sig = vec![0u8; self.ctx.wots_sig_bytes()];
        wots::sign_into(
            &self.ctx,
            &self.hash,
            &self.keygen,
            &digest,
            Address::ots(state.layers, u64::from(chan_idx), leaf_idx),
            &mut pad.digits,
            &mut wots_sig,
        )?;

        let auth_path = match tree.auth_sibling(s) {
            Some(node) => node.to_vec(),
            // The reserved last key verifies against the anchor directly.
            None => vec![0u8; n],
        };
        let root_sig = if state.seq_no == 0 {
            state.root_sig.clone()
        } else {
            None
        };

        let sig = MsgSignature {
            seq_no: state.seq_no,
            chain_seq_no: s,
            chan_idx,
            layer: state.layers,
            drv,
            wots_sig,
            auth_path,
            root_sig,
        };
        state.chain_seq_no = s;
        state.seq_no += 1;
        Ok(sig)
    }

    /// Serialize the key, including all channel counters:
    /// `skSeed | skPrf | pubSeed | root | seqNo(4) | count(4) | channels | params`,
    /// each channel as `idx(4) | layers(4) | chainSeqNo(4) | seqNo(4)`.
    ///
    /// The embedded per-channel root signatures are not part of the format;
    /// a restored key no longer embeds them in first message signatures.
    #[must_use]
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        let channels = lock(&self.channels);
        let mut out = Zeroizing::new(Vec::with_capacity(
            4 * self.ctx.n() + 8 + channels.len() * 16 + PARAMS_BYTES,
        ));
        out.extend_from_slice(&self.sk_seed);
        out.extend_from_slice(&self.sk_prf);
        out.extend_from_slice(&self.pub_seed);
        out.extend_from_slice(&self.root);
        out.extend_from_slice(&lock(&self.seq_no).to_be_bytes());
        out.extend_from_slice(&(channels.len() as u32).to_be_bytes());
        for (i, channel) in channels.iter().enumerate() {
            let state = lock(&channel.state);
            out.extend_from_slice(&(i as u32 + 1).to_be_bytes());
            out.extend_from_slice(&state.layers.to_be_bytes());
            out.extend_from_slice(&state.chain_seq_no.to_be_bytes());
            out.extend_from_slice(&state.seq_no.to_be_bytes());
        }
        out.extend_from_slice(&self.ctx.params().to_bytes());
        out
    }

    /// Restore a key from [`to_bytes`](Self::to_bytes) output.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < PARAMS_BYTES {
            return Err(Error::InvalidKeyLength {
                expected: PARAMS_BYTES,
                actual: bytes.len(),
            });
        }
        let params = crate::params::Params::from_bytes(&bytes[bytes.len() - PARAMS_BYTES..])?;
        let ctx = Context::new(params)?;
        let n = ctx.n();

        let header = 4 * n + 8;
        if bytes.len() < header + PARAMS_BYTES
            || (bytes.len() - header - PARAMS_BYTES) % 16 != 0
        {
            return Err(Error::InvalidKeyLength {
                expected: header + PARAMS_BYTES,
                actual: bytes.len(),
            });
        }

        let sk_seed = bytes[..n].to_vec();
        let sk_prf = bytes[n..2 * n].to_vec();
        let pub_seed = bytes[2 * n..3 * n].to_vec();
        let root = bytes[3 * n..4 * n].to_vec();
        let seq_no = crate::utils::to_int(&bytes[4 * n..4 * n + 4]) as u32;
        let count = crate::utils::to_int(&bytes[4 * n + 4..4 * n + 8]) as usize;

        let table = &bytes[header..bytes.len() - PARAMS_BYTES];
        if table.len() != count * 16 {
            return Err(Error::InvalidKeyLength {
                expected: header + count * 16 + PARAMS_BYTES,
                actual: bytes.len(),
            });
        }

        let mut channels = Vec::with_capacity(count);
        for (i, entry) in table.chunks_exact(16).enumerate() {
            let idx = crate::utils::to_int(&entry[0..4]) as usize;
            if idx != i + 1 {
                return Err(Error::InvalidKeyLength {
                    expected: i + 1,
                    actual: idx,
                });
            }
            channels.push(Arc::new(Channel {
                state: Mutex::new(ChannelState {
                    layers: crate::utils::to_int(&entry[4..8]) as u32,
                    chain_seq_no: crate::utils::to_int(&entry[8..12]) as u32,
                    seq_no: crate::utils::to_int(&entry[12..16]) as u32,
                    root_sig: None,
                }),
            }));
        }

        let hash = TweakHash::new(n, &pub_seed);
        let keygen = KeygenPrf::new(n, &sk_seed);
        Ok(Self {
            ctx,
            sk_seed,
            sk_prf,
            pub_seed,
            root,
            hash,
            keygen,
            seq_no: Mutex::new(seq_no),
            channels: Mutex::new(channels),
        })
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.sk_seed.zeroize();
        self.sk_prf.zeroize();
    }
}

impl core::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("params", self.ctx.params())
            .field("channels", &lock(&self.channels).len())
            .finish_non_exhaustive()
    }
}

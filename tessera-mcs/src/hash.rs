//! Keyed hash primitives with multi-target resistance.
//!
//! All hashes are prefix-keyed invocations of SHA-256 (n = 32) or SHA-512
//! (n = 64): `Hash(toByte(prefix, n) || key || input)`. Tree hashes bind a
//! 32-byte [`Address`] into every call through address-derived keys and
//! bitmasks, so no two hash invocations within a key pair see the same
//! input.
//!
//! The prefix-plus-seed head of the PRF invocations is fixed per key pair,
//! so the hasher state after absorbing it is computed once and cloned per
//! call.

use sha2::{Digest, Sha256, Sha512};
use zeroize::Zeroize;

use crate::address::Address;
use crate::params::Context;
use crate::utils::to_byte;

/// Domain-separation prefix for the WOTS+ chaining hash F.
const PREFIX_F: u64 = 0;
/// Domain-separation prefix for the two-to-one tree hash H.
const PREFIX_H: u64 = 1;
/// Domain-separation prefix for the arbitrary-length message hash.
const PREFIX_MSG: u64 = 2;
/// Domain-separation prefix for the address-keyed PRF.
const PREFIX_PRF: u64 = 3;
/// Domain-separation prefix for one-time-key seed derivation.
const PREFIX_PRF_KEYGEN: u64 = 4;

/// Hash core selected by the security parameter.
#[derive(Clone)]
enum CoreHasher {
    Sha256(Sha256),
    Sha512(Sha512),
}

impl CoreHasher {
    fn new(n: usize) -> Self {
        debug_assert!(n == 32 || n == 64);
        if n == 32 {
            Self::Sha256(Sha256::new())
        } else {
            Self::Sha512(Sha512::new())
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    fn finalize_into(self, out: &mut [u8]) {
        match self {
            Self::Sha256(h) => out.copy_from_slice(&h.finalize()),
            Self::Sha512(h) => out.copy_from_slice(&h.finalize()),
        }
    }
}

/// A reusable hasher midstate: the core hash after absorbing
/// `toByte(prefix, n) || key`.
#[derive(Clone)]
struct Midstate {
    mid: CoreHasher,
    n: usize,
}

impl Midstate {
    fn new(n: usize, prefix: u64, key: &[u8]) -> Self {
        debug_assert_eq!(key.len(), n);
        let mut pad = [0u8; 64];
        to_byte(&mut pad[..n], prefix);

        let mut mid = CoreHasher::new(n);
        mid.update(&pad[..n]);
        mid.update(key);
        Self { mid, n }
    }

    /// Finish the hash over `input`, writing `n` bytes.
    fn eval_into(&self, input: &[u8], out: &mut [u8]) {
        debug_assert_eq!(out.len(), self.n);
        let mut h = self.mid.clone();
        h.update(input);
        h.finalize_into(out);
    }
}

/// The public-seed-keyed tweakable hash functions.
///
/// Shared by signer and verifier; holds the precomputed PRF midstate for the
/// key pair's public seed.
#[derive(Clone)]
pub(crate) struct TweakHash {
    n: usize,
    prf_pub: Midstate,
}

impl TweakHash {
    pub fn new(n: usize, pub_seed: &[u8]) -> Self {
        Self {
            n,
            prf_pub: Midstate::new(n, PREFIX_PRF, pub_seed),
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// `PRF(pub_seed, addr)` into `out`.
    pub fn prf_into(&self, addr: &Address, out: &mut [u8]) {
        self.prf_pub.eval_into(addr.as_bytes(), out);
    }

    /// WOTS+ chaining hash: `F(key, input ^ mask)` with key and mask drawn
    /// from the PRF at the given address.
    pub fn thash_f_into(&self, input: &[u8], mut addr: Address, out: &mut [u8]) {
        let n = self.n;
        let mut key = [0u8; 64];
        let mut mask = [0u8; 64];

        addr.set_key_and_mask(0);
        self.prf_into(&addr, &mut key[..n]);
        addr.set_key_and_mask(1);
        self.prf_into(&addr, &mut mask[..n]);

        for (m, x) in mask[..n].iter_mut().zip(input) {
            *m ^= x;
        }

        let mut pad = [0u8; 64];
        to_byte(&mut pad[..n], PREFIX_F);

        let mut h = CoreHasher::new(n);
        h.update(&pad[..n]);
        h.update(&key[..n]);
        h.update(&mask[..n]);
        h.finalize_into(out);
    }

    /// Two-to-one tree hash: `H(key, (left ^ mask_l) || (right ^ mask_r))`
    /// with key and masks drawn from the PRF at the given address.
    pub fn thash_h_into(&self, left: &[u8], right: &[u8], mut addr: Address, out: &mut [u8]) {
        let n = self.n;
        let mut key = [0u8; 64];
        let mut mask_l = [0u8; 64];
        let mut mask_r = [0u8; 64];

        addr.set_key_and_mask(0);
        self.prf_into(&addr, &mut key[..n]);
        addr.set_key_and_mask(1);
        self.prf_into(&addr, &mut mask_l[..n]);
        addr.set_key_and_mask(2);
        self.prf_into(&addr, &mut mask_r[..n]);

        for (m, x) in mask_l[..n].iter_mut().zip(left) {
            *m ^= x;
        }
        for (m, x) in mask_r[..n].iter_mut().zip(right) {
            *m ^= x;
        }

        let mut pad = [0u8; 64];
        to_byte(&mut pad[..n], PREFIX_H);

        let mut h = CoreHasher::new(n);
        h.update(&pad[..n]);
        h.update(&key[..n]);
        h.update(&mask_l[..n]);
        h.update(&mask_r[..n]);
        h.finalize_into(out);
    }
}

/// The secret-seed-keyed PRF used to derive WOTS+ chain seeds.
#[derive(Clone)]
pub(crate) struct KeygenPrf {
    state: Midstate,
}

impl KeygenPrf {
    pub fn new(n: usize, sk_seed: &[u8]) -> Self {
        Self {
            state: Midstate::new(n, PREFIX_PRF_KEYGEN, sk_seed),
        }
    }

    /// `PRF_keygen(sk_seed, addr)` into `out`. The output is secret key
    /// material; callers zeroize it after use.
    pub fn eval_into(&self, addr: &Address, out: &mut [u8]) {
        self.state.eval_into(addr.as_bytes(), out);
    }
}

/// `PRF(key, toByte(idx, 32))`: the per-signature randomizer `drv`.
pub(crate) fn prf_u64(n: usize, key: &[u8], idx: u64, out: &mut [u8]) {
    let mut input = [0u8; 32];
    to_byte(&mut input, idx);

    let mut pad = [0u8; 64];
    to_byte(&mut pad[..n], PREFIX_PRF);

    let mut h = CoreHasher::new(n);
    h.update(&pad[..n]);
    h.update(key);
    h.update(&input);
    h.finalize_into(out);
}

/// Randomized message hash:
/// `H_msg(drv || root || toByte(idx, n), msg)`.
pub(crate) fn hash_message(
    n: usize,
    drv: &[u8],
    root: &[u8],
    idx: u64,
    msg: &[u8],
    out: &mut [u8],
) {
    let mut pad = [0u8; 64];
    to_byte(&mut pad[..n], PREFIX_MSG);
    let mut idx_bytes = [0u8; 64];
    to_byte(&mut idx_bytes[..n], idx);

    let mut h = CoreHasher::new(n);
    h.update(&pad[..n]);
    h.update(drv);
    h.update(root);
    h.update(&idx_bytes[..n]);
    h.update(msg);
    h.finalize_into(out);
}

/// Per-call workspace for signing, verification, and leaf generation.
///
/// Holds the WOTS+ buffer (the largest intermediate) and the digit array so
/// a single allocation serves a whole operation. Workers own one pad each;
/// pads are never shared.
pub(crate) struct ScratchPad {
    /// WOTS+ public key / signature workspace, `len * n` bytes.
    pub wots: Vec<u8>,
    /// Base-w digit workspace, `len` entries.
    pub digits: Vec<u32>,
}

impl ScratchPad {
    pub fn new(ctx: &Context) -> Self {
        Self {
            wots: vec![0u8; ctx.wots_sig_bytes()],
            digits: vec![0u32; ctx.wots_len() as usize],
        }
    }
}

impl Drop for ScratchPad {
    fn drop(&mut self) {
        // The WOTS buffer transiently holds expanded secret seeds.
        self.wots.zeroize();
    }
}

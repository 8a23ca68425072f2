//! WOTS+ one-time signatures over n-byte message digests.
//!
//! Each one-time key is `len` hash chains of length `w`. Chain seeds are
//! derived on demand from the secret seed via the keygen PRF, so the scheme
//! stores no per-key material.

use tessera_core::{Error, Result};
use zeroize::Zeroize;

use crate::address::Address;
use crate::hash::{KeygenPrf, TweakHash};
use crate::params::Context;
use crate::utils::{base_2b, checksum_digits, wots_checksum};

/// Walk a hash chain: apply the chaining hash `steps` times starting from
/// position `start`, updating the address's hash index at every step.
///
/// Returns `ChainIndexOutOfRange` if the walk would step past `w - 1`;
/// reachable only through an internal logic error.
pub(crate) fn chain_into(
    hash: &TweakHash,
    w: u32,
    x: &[u8],
    start: u32,
    steps: u32,
    mut addr: Address,
    out: &mut [u8],
) -> Result<()> {
    if start + steps > w - 1 {
        return Err(Error::ChainIndexOutOfRange { start, steps });
    }

    let n = hash.n();
    out[..n].copy_from_slice(&x[..n]);

    let mut tmp = [0u8; 64];
    for i in start..start + steps {
        addr.set_hash_index(i);
        tmp[..n].copy_from_slice(&out[..n]);
        hash.thash_f_into(&tmp[..n], addr, &mut out[..n]);
    }
    Ok(())
}

/// Expand an n-byte digest into `len` base-w digits: `len1` message digits
/// followed by `len2` checksum digits.
pub(crate) fn chain_lengths(ctx: &Context, digest: &[u8], digits: &mut [u32]) {
    let len1 = ctx.wots_len1() as usize;
    let lg_w = ctx.params().lg_w();

    let (msg_digits, csum_digits) = digits.split_at_mut(len1);
    debug_assert_eq!(csum_digits.len(), ctx.wots_len2() as usize);
    base_2b(msg_digits, digest, lg_w);

    let csum = wots_checksum(msg_digits, ctx.params().w);
    checksum_digits(csum, lg_w, csum_digits);
}

/// Derive the chain seed for chain `i` of the one-time key at `ots_addr`.
fn chain_seed(keygen: &KeygenPrf, ots_addr: Address, i: u32, out: &mut [u8]) {
    let mut seed_addr = ots_addr;
    seed_addr.set_chain_index(i);
    seed_addr.set_hash_index(0);
    seed_addr.set_key_and_mask(0);
    keygen.eval_into(&seed_addr, out);
}

/// Compute the WOTS+ public key at `ots_addr`: every chain walked to its
/// endpoint. Writes `len * n` bytes into `pk`.
pub(crate) fn pk_gen_into(
    ctx: &Context,
    hash: &TweakHash,
    keygen: &KeygenPrf,
    ots_addr: Address,
    pk: &mut [u8],
) -> Result<()> {
    let n = ctx.n();
    let w = ctx.params().w;
    let mut seed = [0u8; 64];

    for (i, element) in pk.chunks_exact_mut(n).enumerate() {
        let i = i as u32;
        chain_seed(keygen, ots_addr, i, &mut seed[..n]);

        let mut addr = ots_addr;
        addr.set_chain_index(i);
        chain_into(hash, w, &seed[..n], 0, w - 1, addr, element)?;
    }
    seed.zeroize();
    Ok(())
}

/// Sign an n-byte digest with the one-time key at `ots_addr`. Writes
/// `len * n` bytes into `sig`; `digits` is scratch for the digit expansion.
pub(crate) fn sign_into(
    ctx: &Context,
    hash: &TweakHash,
    keygen: &KeygenPrf,
    digest: &[u8],
    ots_addr: Address,
    digits: &mut [u32],
    sig: &mut [u8],
) -> Result<()> {
    let n = ctx.n();
    let w = ctx.params().w;
    chain_lengths(ctx, digest, digits);

    let mut seed = [0u8; 64];
    for (i, element) in sig.chunks_exact_mut(n).enumerate() {
        chain_seed(keygen, ots_addr, i as u32, &mut seed[..n]);

        let mut addr = ots_addr;
        addr.set_chain_index(i as u32);
        chain_into(hash, w, &seed[..n], 0, digits[i], addr, element)?;
    }
    seed.zeroize();
    Ok(())
}

/// Recompute the candidate WOTS+ public key from a signature and the signed
/// digest. Writes `len * n` bytes into `pk`.
pub(crate) fn pk_from_sig_into(
    ctx: &Context,
    hash: &TweakHash,
    sig: &[u8],
    digest: &[u8],
    ots_addr: Address,
    digits: &mut [u32],
    pk: &mut [u8],
) -> Result<()> {
    let n = ctx.n();
    let w = ctx.params().w;
    chain_lengths(ctx, digest, digits);

    for (i, element) in pk.chunks_exact_mut(n).enumerate() {
        let mut addr = ots_addr;
        addr.set_chain_index(i as u32);
        chain_into(
            hash,
            w,
            &sig[i * n..(i + 1) * n],
            digits[i],
            w - 1 - digits[i],
            addr,
            element,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Params;

    fn test_ctx() -> Context {
        Context::new(Params::new(32, 16, 2, 2, 1).unwrap()).unwrap()
    }

    fn fixtures() -> (Context, TweakHash, KeygenPrf) {
        let ctx = test_ctx();
        let hash = TweakHash::new(32, &[2u8; 32]);
        let keygen = KeygenPrf::new(32, &[1u8; 32]);
        (ctx, hash, keygen)
    }

    #[test]
    fn test_chain_zero_steps_is_identity() {
        let (_, hash, _) = fixtures();
        let x = [5u8; 32];
        let mut out = [0u8; 32];
        chain_into(&hash, 16, &x, 0, 0, Address::ots(0, 0, 0), &mut out).unwrap();
        assert_eq!(out, x);
    }

    #[test]
    fn test_chain_composition() {
        // chain(x, 0, 5) == chain(chain(x, 0, 3), 3, 2)
        let (_, hash, _) = fixtures();
        let x = [5u8; 32];
        let addr = Address::ots(0, 0, 0);

        let mut full = [0u8; 32];
        chain_into(&hash, 16, &x, 0, 5, addr, &mut full).unwrap();

        let mut part = [0u8; 32];
        chain_into(&hash, 16, &x, 0, 3, addr, &mut part).unwrap();
        let mut rest = [0u8; 32];
        chain_into(&hash, 16, &part, 3, 2, addr, &mut rest).unwrap();

        assert_eq!(full, rest);
    }

    #[test]
    fn test_chain_rejects_overrun() {
        let (_, hash, _) = fixtures();
        let x = [5u8; 32];
        let mut out = [0u8; 32];
        let err = chain_into(&hash, 16, &x, 8, 8, Address::ots(0, 0, 0), &mut out).unwrap_err();
        assert!(matches!(err, Error::ChainIndexOutOfRange { .. }));
    }

    #[test]
    fn test_digit_expansion_covers_len() {
        let ctx = test_ctx();
        let digest = [0xA5u8; 32];
        let mut digits = vec![0u32; ctx.wots_len() as usize];
        chain_lengths(&ctx, &digest, &mut digits);

        assert!(digits.iter().all(|&d| d < 16));
        // Re-expanding reproduces the same digits.
        let mut again = vec![0u32; ctx.wots_len() as usize];
        chain_lengths(&ctx, &digest, &mut again);
        assert_eq!(digits, again);
    }

    #[test]
    fn test_sign_then_recover_pk() {
        let (ctx, hash, keygen) = fixtures();
        let addr = Address::ots(1, 3, 7);
        let digest = [0x42u8; 32];

        let mut pk = vec![0u8; ctx.wots_sig_bytes()];
        pk_gen_into(&ctx, &hash, &keygen, addr, &mut pk).unwrap();

        let mut digits = vec![0u32; ctx.wots_len() as usize];
        let mut sig = vec![0u8; ctx.wots_sig_bytes()];
        sign_into(&ctx, &hash, &keygen, &digest, addr, &mut digits, &mut sig).unwrap();

        let mut recovered = vec![0u8; ctx.wots_sig_bytes()];
        pk_from_sig_into(&ctx, &hash, &sig, &digest, addr, &mut digits, &mut recovered).unwrap();

        assert_eq!(pk, recovered);
    }

    #[test]
    fn test_wrong_digest_recovers_wrong_pk() {
        let (ctx, hash, keygen) = fixtures();
        let addr = Address::ots(1, 3, 7);

        let mut pk = vec![0u8; ctx.wots_sig_bytes()];
        pk_gen_into(&ctx, &hash, &keygen, addr, &mut pk).unwrap();

        let mut digits = vec![0u32; ctx.wots_len() as usize];
        let mut sig = vec![0u8; ctx.wots_sig_bytes()];
        sign_into(&ctx, &hash, &keygen, &[0x42u8; 32], addr, &mut digits, &mut sig).unwrap();

        let mut recovered = vec![0u8; ctx.wots_sig_bytes()];
        pk_from_sig_into(
            &ctx,
            &hash,
            &sig,
            &[0x43u8; 32],
            addr,
            &mut digits,
            &mut recovered,
        )
        .unwrap();

        assert_ne!(pk, recovered);
    }

    #[test]
    fn test_distinct_addresses_distinct_keys() {
        let (ctx, hash, keygen) = fixtures();

        let mut pk1 = vec![0u8; ctx.wots_sig_bytes()];
        let mut pk2 = vec![0u8; ctx.wots_sig_bytes()];
        pk_gen_into(&ctx, &hash, &keygen, Address::ots(0, 0, 0), &mut pk1).unwrap();
        pk_gen_into(&ctx, &hash, &keygen, Address::ots(0, 0, 1), &mut pk2).unwrap();

        assert_ne!(pk1, pk2);
    }
}

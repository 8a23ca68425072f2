//! Scheme parameters and the derived signing context.

use tessera_core::{Error, Result};

use crate::utils::{to_byte, to_int};

/// Length in bytes of an encoded [`Params`] value.
pub const PARAMS_BYTES: usize = 18;

/// The tunable parameters of a key pair.
///
/// All parameters are fixed at key generation and shared between signer and
/// verifier; the public key carries them on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Params {
    /// Security parameter in bytes: 32 selects SHA-256, 64 selects SHA-512.
    pub n: u32,
    /// Winternitz parameter: 4, 16, or 256.
    pub w: u32,
    /// Height of the root tree; the key pair supports `2^root_height`
    /// channel-root signatures.
    pub root_height: u32,
    /// Height of a channel's first chain tree.
    pub chan_height: u32,
    /// Growth increment: the chain tree at 1-based layer `L` has height
    /// `chan_height + growth * (L - 1)`.
    pub growth: u32,
}

impl Params {
    /// Create a parameter set, validating every construction constraint.
    pub fn new(n: u32, w: u32, root_height: u32, chan_height: u32, growth: u32) -> Result<Self> {
        let params = Self {
            n,
            w,
            root_height,
            chan_height,
            growth,
        };
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<()> {
        if self.n != 32 && self.n != 64 {
            return Err(Error::InvalidParams {
                reason: "n must be 32 or 64",
            });
        }
        if self.w != 4 && self.w != 16 && self.w != 256 {
            return Err(Error::InvalidParams {
                reason: "w must be 4, 16, or 256",
            });
        }
        if self.root_height == 0 || self.root_height >= 20 {
            return Err(Error::InvalidParams {
                reason: "root tree height must be in 1..20",
            });
        }
        if self.chan_height == 0 {
            return Err(Error::InvalidParams {
                reason: "chain tree height must be positive",
            });
        }
        if self.growth == 0 {
            return Err(Error::InvalidParams {
                reason: "growth increment must be positive",
            });
        }
        if u64::from(self.chan_height) + u64::from(self.growth) >= 1 << 32 {
            return Err(Error::InvalidParams {
                reason: "chain height plus growth must stay below 2^32",
            });
        }
        Ok(())
    }

    /// log2 of the Winternitz parameter.
    #[must_use]
    pub(crate) fn lg_w(&self) -> u32 {
        self.w.trailing_zeros()
    }

    /// Encode as `n(4) | w(2) | rootH(4) | chanH(4) | ge(4)`.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; PARAMS_BYTES] {
        let mut out = [0u8; PARAMS_BYTES];
        to_byte(&mut out[0..4], u64::from(self.n));
        to_byte(&mut out[4..6], u64::from(self.w));
        to_byte(&mut out[6..10], u64::from(self.root_height));
        to_byte(&mut out[10..14], u64::from(self.chan_height));
        to_byte(&mut out[14..18], u64::from(self.growth));
        out
    }

    /// Decode and validate a parameter set.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PARAMS_BYTES {
            return Err(Error::InvalidKeyLength {
                expected: PARAMS_BYTES,
                actual: bytes.len(),
            });
        }
        Self::new(
            to_int(&bytes[0..4]) as u32,
            to_int(&bytes[4..6]) as u32,
            to_int(&bytes[6..10]) as u32,
            to_int(&bytes[10..14]) as u32,
            to_int(&bytes[14..18]) as u32,
        )
    }
}

/// Derived, immutable description of a parameter set.
///
/// Carries the WOTS+ chain counts and the thread policy for tree
/// construction. Constructing a context validates the parameters once; all
/// later operations rely on the derived values.
#[derive(Clone, Debug)]
pub struct Context {
    params: Params,
    wots_len1: u32,
    wots_len2: u32,
    wots_len: u32,
    /// Worker count for leaf generation. 0 means all available cores,
    /// 1 forces the sequential path.
    threads: usize,
}

impl Context {
    /// Build a context from a parameter set.
    pub fn new(params: Params) -> Result<Self> {
        params.validate()?;

        let lg_w = params.lg_w();
        let wots_len1 = (8 * params.n).div_ceil(lg_w);

        // len2 = floor(log_w(len1 * (w - 1))) + 1, i.e. the number of
        // base-w digits of the maximum checksum value.
        let mut v = wots_len1 * (params.w - 1);
        let mut wots_len2 = 0;
        while v > 0 {
            v /= params.w;
            wots_len2 += 1;
        }

        Ok(Self {
            params,
            wots_len1,
            wots_len2,
            wots_len: wots_len1 + wots_len2,
            threads: 0,
        })
    }

    /// Override the worker count used for leaf generation.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// The underlying parameter set.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Security parameter as a byte count.
    #[must_use]
    pub(crate) fn n(&self) -> usize {
        self.params.n as usize
    }

    /// Number of WOTS+ message chains.
    #[must_use]
    pub(crate) fn wots_len1(&self) -> u32 {
        self.wots_len1
    }

    /// Number of WOTS+ checksum chains.
    #[must_use]
    pub(crate) fn wots_len2(&self) -> u32 {
        self.wots_len2
    }

    /// Total number of WOTS+ chains.
    #[must_use]
    pub(crate) fn wots_len(&self) -> u32 {
        self.wots_len
    }

    /// Size of a WOTS+ signature or public key in bytes.
    #[must_use]
    pub(crate) fn wots_sig_bytes(&self) -> usize {
        self.wots_len as usize * self.n()
    }

    /// Height of the chain tree at the given 1-based layer.
    #[must_use]
    pub fn chain_height(&self, layer: u32) -> u32 {
        let height = u64::from(self.params.chan_height)
            + u64::from(self.params.growth) * u64::from(layer - 1);
        height.min(u64::from(u32::MAX)) as u32
    }

    /// Number of root-tree leaves, i.e. the channel-root signing capacity.
    #[must_use]
    pub(crate) fn root_capacity(&self) -> u32 {
        1 << self.params.root_height
    }

    /// Configured worker count (0 = all available cores).
    #[must_use]
    pub(crate) fn threads(&self) -> usize {
        self.threads
    }
}

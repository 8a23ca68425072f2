//! Error types for Tessera cryptographic operations.

use core::fmt;

/// Result type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The parameter set violates a construction constraint.
    InvalidParams {
        /// Which constraint was violated.
        reason: &'static str,
    },

    /// The operating system randomness source failed.
    RandomnessFailure,

    /// Every leaf of the root tree has been consumed; no further channels
    /// or channel roots can be signed under this key pair.
    OutOfRootKeys,

    /// The channel index is zero or does not name an existing channel.
    UnknownChannel {
        /// The rejected channel index.
        idx: u32,
    },

    /// The current chain tree has only its reserved key left; the channel
    /// must be grown before further messages can be signed.
    MustGrowFirst {
        /// The affected channel index.
        idx: u32,
    },

    /// The channel still has unused message keys, so growing it now would
    /// skip usable one-time keys.
    ChannelNotGrowable {
        /// The affected channel index.
        idx: u32,
    },

    /// A Winternitz chain was asked to step past `w - 1`. Signals an
    /// internal logic error, not bad caller input.
    ChainIndexOutOfRange {
        /// Requested start position.
        start: u32,
        /// Requested number of steps.
        steps: u32,
    },

    /// A signature failed verification. Verifier entry points report this
    /// as `false`; the variant exists for callers that want a descriptor.
    InvalidSignature,

    /// Invalid key length provided.
    InvalidKeyLength {
        /// Expected length in bytes.
        expected: usize,
        /// Actual length provided.
        actual: usize,
    },

    /// Invalid signature length.
    InvalidSignatureLength {
        /// Expected length in bytes.
        expected: usize,
        /// Actual length provided.
        actual: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidParams { reason } => {
                write!(f, "invalid parameters: {reason}")
            }
            Error::RandomnessFailure => write!(f, "system randomness source failed"),
            Error::OutOfRootKeys => write!(f, "root tree exhausted: no one-time keys left"),
            Error::UnknownChannel { idx } => write!(f, "unknown channel index {idx}"),
            Error::MustGrowFirst { idx } => {
                write!(f, "channel {idx} is out of message keys and must be grown")
            }
            Error::ChannelNotGrowable { idx } => {
                write!(f, "channel {idx} still has unused message keys")
            }
            Error::ChainIndexOutOfRange { start, steps } => {
                write!(f, "chain step out of range: start {start}, steps {steps}")
            }
            Error::InvalidSignature => write!(f, "signature verification failed"),
            Error::InvalidKeyLength { expected, actual } => {
                write!(f, "invalid key length: expected {expected}, got {actual}")
            }
            Error::InvalidSignatureLength { expected, actual } => {
                write!(
                    f,
                    "invalid signature length: expected {expected}, got {actual}"
                )
            }
        }
    }
}

impl std::error::Error for Error {}

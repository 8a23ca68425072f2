//! # Tessera
//!
//! A post-quantum signature toolkit for private and consortium
//! blockchains.
//!
//! ## Features
//!
//! - `mcs` (default): the stateful multi-channel hash-based signature
//!   scheme
//! - `parallel`: multi-threaded tree construction
//!
//! ## Example
//!
//! ```ignore
//! use tessera::mcs::{ChannelVerifier, Context, Params, PrivateKey};
//!
//! let ctx = Context::new(Params::new(32, 16, 10, 64, 4)?)?;
//! let (sk, pk) = PrivateKey::generate_os(ctx)?;
//!
//! let (chan, root_sig) = sk.create_channel()?;
//! let sig = sk.sign_channel_msg(chan, b"block 1", false)?;
//!
//! let mut verifier = ChannelVerifier::new(pk, chan, &root_sig)?;
//! assert!(verifier.verify_msg(&sig, b"block 1"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub use tessera_core::{Error, Result};

/// Multi-channel stateful hash-based signatures.
#[cfg(feature = "mcs")]
pub mod mcs {
    pub use tessera_mcs::*;
}

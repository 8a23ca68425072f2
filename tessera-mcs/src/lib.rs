//! MCS: stateful multi-channel hash-based signatures.
//!
//! This crate implements a stateful, hash-based, post-quantum signature
//! scheme for private and consortium blockchains in which a small set of
//! orderers sign blocks across many segregated channels. One long-lived key
//! pair authenticates an unbounded stream of messages per channel, across
//! many channels, under hash-function security assumptions only.
//!
//! # Architecture
//!
//! - **WOTS+**: one-time signatures over n-byte digests, with
//!   multi-target-resistant tweakable hashing
//! - **L-tree**: compresses a WOTS+ public key to a single tree leaf
//! - **Root tree**: a balanced Merkle tree whose leaves authenticate
//!   channel roots; its root is the public key
//! - **Chain trees**: per-channel asymmetric trees that amortise one
//!   authentication path across many message signatures and extend
//!   without bound via grow signatures
//!
//! # Statefulness
//!
//! Reusing a one-time key is catastrophic, so the signing key carries
//! counters that must never regress. The key serialises its complete
//! counter state ([`PrivateKey::to_bytes`]); callers that must survive
//! restarts persist it after every signature.
//!
//! # Example
//!
//! ```no_run
//! use tessera_mcs::{ChannelVerifier, Context, Params, PrivateKey};
//!
//! # fn main() -> tessera_core::Result<()> {
//! let ctx = Context::new(Params::new(32, 16, 10, 64, 4)?)?;
//! let (sk, pk) = PrivateKey::generate_os(ctx)?;
//!
//! let (chan, root_sig) = sk.create_channel()?;
//! let sig = sk.sign_channel_msg(chan, b"block 1", false)?;
//!
//! let mut verifier = ChannelVerifier::new(pk, chan, &root_sig)?;
//! assert!(verifier.verify_msg(&sig, b"block 1"));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
// Clippy allowances for cryptographic code patterns
#![allow(
    clippy::many_single_char_names,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::cast_possible_truncation,
    clippy::cast_lossless,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::doc_markdown,
    clippy::needless_range_loop
)]

// Core building blocks
mod address;
mod chain_tree;
mod hash;
mod ltree;
mod params;
mod root_tree;
mod utils;
mod wots;

// Leaf generation worker pool
mod parallel;

// Signer and verifier
mod signature;
mod signer;
mod verify;

pub use address::{AddrType, Address};
pub use params::{Context, Params, PARAMS_BYTES};
pub use signature::{GrowSignature, MsgSignature, RootSignature};
pub use signer::PrivateKey;
pub use verify::{ChannelVerifier, PublicKey};

// Re-export core types
pub use tessera_core::{Error, Result};

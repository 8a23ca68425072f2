//! # Tessera Core
//!
//! Core types shared by the Tessera post-quantum signature crates.
//!
//! This crate provides:
//! - Common error types
//! - Secure memory handling with zeroize integration
//! - Constant-time comparison helpers via subtle

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;

pub use error::{Error, Result};

/// Re-export zeroize for convenience.
pub use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Re-export subtle for constant-time operations.
pub use subtle;

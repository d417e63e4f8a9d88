//! VELA Store - Configuration persistence shared between processes
//!
//! This crate implements the Configuration Store:
//! - Named blobs written by temp file + atomic rename
//! - Checksummed, self-describing envelopes
//! - Default-on-corruption loads
//! - Change notification after every save
//! - Typed accessors for the display, rotation and usage blobs

pub mod blob;
pub mod config;
pub mod configs;
pub mod error;

pub use blob::*;
pub use config::*;
pub use configs::*;
pub use error::*;

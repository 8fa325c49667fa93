//! Identifiers and codecs for Turnforge.
//!
//! This crate defines the two things every other layer agrees on:
//!
//! - **Identity** ([`Id`]): the globally unique, time-sortable identifier
//!   used for game sessions and participants.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how a session envelope is
//!   turned into bytes for the store and the cache, and back.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing so.
//!
//! # Architecture
//!
//! ```text
//! Session (envelope + payload) → Protocol (bytes) → Store / Cache
//! ```
//!
//! The protocol layer knows nothing about games or transactions. It only
//! guarantees that an in-memory value and its bytes round-trip exactly.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::Id;

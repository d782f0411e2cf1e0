//! Shared types for the MeloTech change-notification service.
//!
//! - [`objects`] holds every JSON document that crosses the wire.
//! - [`signature`] implements webhook body signing and verification.
//! - [`client`] (feature `client`) talks to a running server.

#![forbid(unsafe_code)]

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
pub mod signature;

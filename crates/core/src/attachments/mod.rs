//! Attachment handling that does not talk to a transport.
//!
//! - [`identifier`] encodes the server ids of downscaled variants into resource identifiers
//! - [`hoist`] moves base64 payloads out of a resource before encryption and back afterwards

pub mod hoist;
pub mod identifier;

//! Shared wire types for the Coursepay API, plus an optional typed HTTP
//! client behind the `client` cargo feature.
//!
//! The [`objects`] module is the single source of truth for every request
//! and response body the server speaks; the server crate and any Rust
//! consumer deserialize/serialize through these types so the two sides
//! cannot drift apart.

pub mod objects;

#[cfg(feature = "client")]
pub mod client;

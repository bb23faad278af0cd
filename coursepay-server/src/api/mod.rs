//! HTTP API surface.
//!
//! Three groups of routes share the [`AppState`]:
//! - learner endpoints (`/payments/*`, `/enrollments`, `/purchases`),
//!   authenticated by bearer session token;
//! - the gateway webhook (`/webhooks/paystack`), authenticated by HMAC
//!   signature;
//! - operator endpoints (`/admin/*`), authenticated by the admin secret
//!   header.

pub mod admin;
pub mod enrollments;
pub mod extractors;
pub mod payments;
pub mod webhooks;

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod checkout;
pub mod config;
pub mod entities;
pub mod framework;
pub mod gateway;
pub mod ledger;
pub mod pricing;
pub mod reconciler;
pub mod reference;

#[cfg(test)]
pub(crate) mod testing;

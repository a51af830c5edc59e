//! # Fund Common
//!
//! Types shared by the share ledger, fund controller and fund manager contracts:
//!
//! - [`FundError`]: the error codes every fund contract returns
//! - [`AccessControl`]: the owner/rebalancer role pair each governed contract stores
//! - [`types`]: the currency and pool registries, migration payloads and static bounds
//! - [`math`]: fixed-point conversions between raw balances, USD and shares
//! - [`interfaces`]: clients for the price oracle, pool adapters and sibling contracts
//!
//! ## Units
//!
//! USD values and share amounts both carry [`types::USD_DECIMALS`] decimal places,
//! so `10_000_000` is one dollar or one share. Oracle prices are quoted in USD per
//! whole unit of a currency, with the same 7 decimals.

#![no_std]

pub mod access;
pub mod error;
pub mod interfaces;
pub mod math;
pub mod types;

#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

pub use access::AccessControl;
pub use error::FundError;
pub use types::{Currency, FundControllerData, FundManagerData, Pool};

#![doc(test(attr(deny(warnings))))]

//! Debt Rollup turns flat debt-ledger records into filtered, two-level
//! rollups (station, then a chosen business dimension) with subtotals,
//! grand totals and percentage-of-total figures.

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod storage;
pub mod utils;

use std::sync::Once;

pub use crate::core::{RollupEngine, RollupResponse, RollupResult};
pub use crate::core::services::{ListingPage, ListingRequest, RollupRequest};
pub use errors::{Result, RollupError};

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Debt rollup tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}

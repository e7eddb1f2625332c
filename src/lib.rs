#![doc(test(attr(deny(warnings))))]

//! Inventory Core tracks stocked items and the sales recorded against them.
//!
//! Sales are written through optimistic store transactions so stock can never
//! be oversold, and reporting is a pure function of the current inventory and
//! ledger snapshots.

pub mod cli;
pub mod config;
pub mod core;
pub mod currency;
pub mod domain;
pub mod errors;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Inventory Core tracing initialized.");
    });
}

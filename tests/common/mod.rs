#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use inventory_core::{
    config::Config,
    core::{clock::FixedClock, InventoryManager},
    domain::InventoryItem,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Reserves a fresh directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// 2024-04-15 10:00 UTC, a mid-month Monday.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 15, 10, 0, 0).unwrap()
}

/// Creates a manager over a JSON store in an isolated directory.
pub fn setup_test_env() -> (InventoryManager, PathBuf) {
    let base = temp_base();
    let manager = open_at(&base, Config::default());
    (manager, base)
}

pub fn open_at(base: &std::path::Path, config: Config) -> InventoryManager {
    InventoryManager::open(base, config, Box::new(FixedClock(fixed_now())))
        .expect("open inventory manager")
}

pub fn stock(manager: &InventoryManager, name: &str, cost: f64, quantity: u32) -> InventoryItem {
    let item = InventoryItem::new(name, cost, quantity).expect("valid item");
    manager.create_item(item.clone()).expect("create item");
    item
}

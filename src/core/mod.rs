pub mod calendar;
pub mod clock;
pub mod inventory_manager;
pub mod live;
pub mod services;

pub use inventory_manager::{BackupBackend, InventoryManager};

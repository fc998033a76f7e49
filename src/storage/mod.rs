//! Storage sinks for event batches.

pub mod database;
pub mod json;
pub mod manager;

use crate::error::Result;
use crate::event::Data;

pub use database::DatabaseStorage;
pub use json::JsonStorage;
pub use manager::StorageManager;

/// A sink that stores event batches.
pub trait Store: Send + Sync {
    /// Store the event data.
    fn store_event(&self, events: Data) -> Result<()>;
}

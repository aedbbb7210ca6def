// In crates/storage/src/lib.rs

//! Draft persistence: a volatile tier for today's entries, a durable
//! key-value tier for everything else, and the `ReportStore` that routes
//! between them.

pub mod clock;
pub mod error;
pub mod kv;
pub mod report_store;
pub mod tier;

// Re-export the most important types for easy access.
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, Result};
pub use kv::{FileKvStore, KeyValueStore, MemoryKvStore, keys};
pub use report_store::ReportStore;
pub use tier::{DraftTier, DurableDrafts, VolatileTodayStore};

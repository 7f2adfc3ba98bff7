//! Durable storage abstraction and implementations
//!
//! The session core only ever talks to [`DurableStore`]. Records are addressed
//! by key and never shared by reference; the snapshot, the offline queue and
//! the identity token are independent records.

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{DurableStore, load_json, save_json};

/// Keys of the records the core persists
pub mod keys {
    /// Per-install identity token
    pub const IDENTITY: &str = "swiper-device-id";
    /// Today's session snapshot
    pub const SNAPSHOT: &str = "swiper-deck";
    /// Offline action queue
    pub const QUEUE: &str = "swiper-swipe-queue";
}

pub mod history;
pub mod sqlite_store;
pub mod store;

pub use history::{push_bounded, DEFAULT_HISTORY_CAPACITY};
pub use sqlite_store::SqliteStore;
pub use store::InMemoryStore;

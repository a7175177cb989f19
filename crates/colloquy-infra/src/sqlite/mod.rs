//! SQLite persistence.

pub mod conversation;
pub mod pool;

pub use conversation::SqliteConversationStore;
pub use pool::DatabasePool;

//! Local durable store for Rifa

mod connection;
mod migrations;
mod store;

pub use connection::Database;
pub use store::{keys, KeyValueStore, MemoryStore, SqliteStore};

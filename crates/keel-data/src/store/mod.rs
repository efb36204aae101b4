//! Persistent storage for facts, prices, metrics and valuations.

pub mod sqlite;

pub use sqlite::{SqliteStore, StoreStats};

//! # Storage
//!
//! The redb-backed document store.

mod redb_store;

pub use redb_store::{Store, StoreCounts};

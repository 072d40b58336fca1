//! # kondate-memory
//!
//! Per-user ingredient store for Kondate (SQLite-backed).

pub mod store;

pub use store::Store;

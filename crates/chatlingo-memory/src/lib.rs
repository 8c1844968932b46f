//! # chatlingo-memory
//!
//! Persistent conversation store for Chatlingo (SQLite-backed).

pub mod store;

pub use store::Store;

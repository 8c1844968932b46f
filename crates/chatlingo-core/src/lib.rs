//! # chatlingo-core
//!
//! Core types, traits, configuration, and error handling for Chatlingo.

pub mod config;
pub mod context;
pub mod curriculum;
pub mod error;
pub mod identity;
pub mod message;
pub mod model;
pub mod scenarios;
pub mod traits;

pub use config::shellexpand;

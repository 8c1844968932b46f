//! # chatlingo-providers
//!
//! LLM provider implementations and the gateway the engine talks to.

pub mod gateway;
pub mod openai;
pub mod openrouter;

pub use gateway::{build_provider, LlmGateway};

//! Gateway: the conversation engine connecting transports, the store, and the LLM.
//!
//! Includes: allow-list enforcement, mode-first routing, per-user turn
//! serialization, the menu/scenario/chat/lesson flows, and the daily nudge.

mod auth;
mod chat;
mod keywords;
mod locks;
mod menu;
mod pipeline;
mod routing;
mod scenario;
mod scheduler;

pub use scheduler::parse_nudge_time;

use chatlingo_core::{
    config::{AuthConfig, ChannelConfig, Config, CurriculumConfig, MemoryConfig, Prompts},
    curriculum::Curriculum,
    error::ChatlingoError,
    model::Platform,
    traits::PlatformAdapter,
};
use chatlingo_memory::Store;
use chatlingo_providers::LlmGateway;
use locks::UserLocks;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// The conversation engine. Built once at startup and shared behind an `Arc`.
pub struct Gateway {
    pub(super) store: Store,
    pub(super) llm: LlmGateway,
    pub(super) curriculum: Curriculum,
    pub(super) prompts: Prompts,
    pub(super) adapters: HashMap<Platform, Arc<dyn PlatformAdapter>>,
    pub(super) auth_config: AuthConfig,
    pub(super) channel_config: ChannelConfig,
    pub(super) memory_config: MemoryConfig,
    pub(super) curriculum_config: CurriculumConfig,
    /// One async mutex per user key; turns for the same user never interleave.
    pub(super) locks: UserLocks,
}

impl Gateway {
    /// Create a new gateway.
    pub fn new(
        config: &Config,
        store: Store,
        llm: LlmGateway,
        curriculum: Curriculum,
        prompts: Prompts,
        adapters: Vec<Arc<dyn PlatformAdapter>>,
    ) -> Self {
        let adapters: HashMap<Platform, Arc<dyn PlatformAdapter>> =
            adapters.into_iter().map(|a| (a.platform(), a)).collect();

        info!(
            "Chatlingo gateway ready | provider: {} | transports: {} | auth: {} | days: {}",
            llm.provider_name(),
            adapters
                .keys()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            if config.auth.enabled {
                "enforced"
            } else {
                "disabled"
            },
            curriculum.len(),
        );

        Self {
            store,
            llm,
            curriculum,
            prompts,
            adapters,
            auth_config: config.auth.clone(),
            channel_config: config.channel.clone(),
            memory_config: config.memory.clone(),
            curriculum_config: config.curriculum.clone(),
            locks: UserLocks::new(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The adapter delivering to `platform`.
    pub(super) fn adapter(
        &self,
        platform: Platform,
    ) -> Result<Arc<dyn PlatformAdapter>, ChatlingoError> {
        self.adapters
            .get(&platform)
            .cloned()
            .ok_or_else(|| ChatlingoError::Channel(format!("no adapter for {platform}")))
    }
}

/// First 12 hex chars of a user key, for log lines.
pub(super) fn short_key(user_key: &str) -> &str {
    user_key.get(..12).unwrap_or(user_key)
}

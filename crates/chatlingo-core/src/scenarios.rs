//! Scenario seed: the roleplay catalogue written into the store at startup.

use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use crate::{error::ChatlingoError, model::Scenario};

const BUNDLED_SCENARIOS: &str = include_str!("../../../prompts/scenarios.toml");

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    scenarios: Vec<SeedEntry>,
}

#[derive(Debug, Deserialize)]
struct SeedEntry {
    id: i64,
    title: String,
    bot_persona: String,
    situation_seed: String,
    opening_line: String,
}

/// Parse a scenario seed document.
pub fn parse_seed(content: &str) -> Result<Vec<Scenario>, ChatlingoError> {
    let file: SeedFile = toml::from_str(content)
        .map_err(|e| ChatlingoError::Config(format!("invalid scenario seed: {e}")))?;
    Ok(file
        .scenarios
        .into_iter()
        .map(|s| Scenario {
            id: s.id,
            title: s.title,
            bot_persona: s.bot_persona,
            situation_seed: s.situation_seed,
            opening_line: s.opening_line,
        })
        .collect())
}

/// Load the seed from `path`, or the bundled catalogue when no path is given.
///
/// A configured file that fails to parse is an error.
pub fn load_seed(path: Option<&str>) -> Result<Vec<Scenario>, ChatlingoError> {
    match path {
        Some(p) => {
            let expanded = crate::shellexpand(p);
            if !Path::new(&expanded).exists() {
                warn!("scenarios: seed file {expanded} not found, seeding nothing");
                return Ok(Vec::new());
            }
            let content = std::fs::read_to_string(&expanded)?;
            let scenarios = parse_seed(&content)?;
            info!("scenarios: {} loaded from {expanded}", scenarios.len());
            Ok(scenarios)
        }
        None => parse_seed(BUNDLED_SCENARIOS),
    }
}

//! Curriculum provider: maps a day number to lesson content.
//!
//! Loaded once at startup from `curriculum.toml` (bundled default when the
//! configured file is missing). Read-only afterwards.

use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use crate::error::ChatlingoError;

/// Bundled curriculum: 30 day titles and the lesson prompt template.
const BUNDLED_CURRICULUM: &str = include_str!("../../../prompts/curriculum.toml");

/// One lesson day.
#[derive(Debug, Clone, PartialEq)]
pub struct CurriculumDay {
    pub number: i64,
    pub title: String,
}

#[derive(Debug, Deserialize)]
struct CurriculumFile {
    template: String,
    days: Vec<DayEntry>,
}

#[derive(Debug, Deserialize)]
struct DayEntry {
    day: i64,
    title: String,
}

/// The full lesson plan.
#[derive(Debug, Clone)]
pub struct Curriculum {
    /// Prompt template with `{day_number}` and `{scenario_title}` placeholders.
    template: String,
    /// Titles indexed by `day - 1`.
    titles: Vec<String>,
}

impl Curriculum {
    /// Parse a curriculum document.
    ///
    /// Days must be numbered contiguously from 1.
    pub fn parse(content: &str) -> Result<Self, ChatlingoError> {
        let file: CurriculumFile = toml::from_str(content)
            .map_err(|e| ChatlingoError::Config(format!("invalid curriculum: {e}")))?;

        if file.days.is_empty() {
            return Err(ChatlingoError::Config("curriculum has no days".into()));
        }

        let mut days = file.days;
        days.sort_by_key(|d| d.day);
        for (i, d) in days.iter().enumerate() {
            if d.day != i as i64 + 1 {
                return Err(ChatlingoError::Config(format!(
                    "curriculum days must run 1..{} without gaps (found day {})",
                    days.len(),
                    d.day
                )));
            }
        }

        Ok(Self {
            template: file.template,
            titles: days.into_iter().map(|d| d.title).collect(),
        })
    }

    /// Load from `path`, falling back to the bundled curriculum if the file
    /// does not exist or fails to parse.
    pub fn load(path: Option<&str>) -> Self {
        if let Some(p) = path {
            let expanded = crate::shellexpand(p);
            if Path::new(&expanded).exists() {
                match std::fs::read_to_string(&expanded)
                    .map_err(ChatlingoError::from)
                    .and_then(|c| Self::parse(&c))
                {
                    Ok(c) => {
                        info!("curriculum: loaded {} days from {expanded}", c.len());
                        return c;
                    }
                    Err(e) => warn!("curriculum: {expanded} unusable ({e}), using bundled"),
                }
            }
        }
        Self::bundled()
    }

    /// The curriculum compiled into the binary.
    pub fn bundled() -> Self {
        match Self::parse(BUNDLED_CURRICULUM) {
            Ok(c) => c,
            Err(e) => {
                // The bundled file is covered by tests; this only guards edits.
                warn!("curriculum: bundled file invalid ({e})");
                Self {
                    template: "Today is day {day_number}: {scenario_title}.".into(),
                    titles: vec!["Greetings".into()],
                }
            }
        }
    }

    /// Number of days.
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Last valid day number.
    pub fn last_day(&self) -> i64 {
        self.titles.len() as i64
    }

    /// Whether `day` is inside the curriculum range.
    pub fn contains(&self, day: i64) -> bool {
        day >= 1 && day <= self.last_day()
    }

    /// Resolve a day number.
    pub fn day(&self, day: i64) -> Result<CurriculumDay, ChatlingoError> {
        if !self.contains(day) {
            return Err(ChatlingoError::Validation(format!(
                "day {day} is outside the curriculum (1-{})",
                self.last_day()
            )));
        }
        Ok(CurriculumDay {
            number: day,
            title: self.titles[(day - 1) as usize].clone(),
        })
    }

    /// Render the lesson prompt for a day.
    pub fn render_prompt(&self, day: i64) -> Result<String, ChatlingoError> {
        let entry = self.day(day)?;
        Ok(self
            .template
            .replace("{day_number}", &entry.number.to_string())
            .replace("{scenario_title}", &entry.title))
    }
}

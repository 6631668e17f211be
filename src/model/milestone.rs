use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::date_math::DateMath;

use super::task::{generate_id, TaskId};

/// A milestone as handed to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilestoneInput {
    pub id: Option<String>,
    pub name: String,
    pub date: Option<String>,
}

impl MilestoneInput {
    pub fn new(name: impl Into<String>, date: &str) -> Self {
        Self {
            id: None,
            name: name.into(),
            date: Some(date.to_string()),
        }
    }
}

/// A single point in time drawn as a flag across every row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: TaskId,
    pub name: String,
    pub date: NaiveDateTime,
    pub row_index: usize,
    /// The date was missing and defaulted to today.
    pub invalid: bool,
}

impl Milestone {
    pub fn ingest(input: MilestoneInput, row_index: usize, dates: &impl DateMath) -> Self {
        let parsed = input.date.as_deref().and_then(|raw| {
            let parsed = dates.parse(raw);
            if parsed.is_none() {
                warn!(value = raw, "ignoring unparseable milestone date");
            }
            parsed
        });
        let id = input
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| generate_id(&input.name));

        Self {
            id,
            name: input.name,
            date: parsed.unwrap_or_else(|| dates.today()),
            row_index,
            invalid: parsed.is_none(),
        }
    }
}

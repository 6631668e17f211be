//! Reading charts from disk. Task data is never written back.

pub mod csv_import;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::date_math::DateMath;
use crate::error::GanttResult;
use crate::gantt::Gantt;
use crate::model::{GanttOptions, MilestoneInput, TaskInput};

pub use csv_import::{import_csv, import_csv_str, CsvImport};

/// A chart file: `{"tasks": [...], "milestones": [...], "options": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartFile {
    pub tasks: Vec<TaskInput>,
    pub milestones: Vec<MilestoneInput>,
    pub options: GanttOptions,
}

impl ChartFile {
    pub fn from_json(json: &str) -> GanttResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn into_gantt<D: DateMath>(self, dates: D) -> GanttResult<Gantt<D>> {
        Gantt::with_date_math(self.tasks, self.milestones, self.options, dates)
    }
}

impl From<CsvImport> for ChartFile {
    fn from(import: CsvImport) -> Self {
        Self {
            tasks: import.tasks,
            milestones: import.milestones,
            options: GanttOptions::default(),
        }
    }
}

pub fn load_chart(path: impl AsRef<Path>) -> GanttResult<ChartFile> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let chart = ChartFile::from_json(&json)?;
    debug!(
        path = %path.display(),
        tasks = chart.tasks.len(),
        milestones = chart.milestones.len(),
        "loaded chart file"
    );
    Ok(chart)
}

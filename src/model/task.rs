use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::date_math::{DateMath, DateUnit};

pub type TaskId = String;

/// Span given to tasks that are missing one or both dates.
const DEFAULT_SPAN_DAYS: i64 = 2;
/// Longer tasks are treated as if their end date were missing.
const MAX_SPAN_YEARS: i64 = 10;

/// Raw `{start, end}` pair as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateWindowInput {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Which overdue rule applies to a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueFlags {
    /// The task has not started although its start date has passed.
    #[serde(default, rename = "tostart", alias = "to_start")]
    pub to_start: bool,
    /// The task is in progress past its end date.
    #[serde(default)]
    pub wip: bool,
}

/// Dependencies as a list of ids or a single comma-separated string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyList {
    Csv(String),
    List(Vec<String>),
}

impl DependencyList {
    /// Trimmed, non-empty ids in input order.
    pub fn ids(&self) -> Vec<TaskId> {
        let raw: Vec<&str> = match self {
            DependencyList::Csv(s) => s.split(',').collect(),
            DependencyList::List(list) => list.iter().map(String::as_str).collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// A task as handed to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskInput {
    pub id: Option<String>,
    pub name: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub delay: Option<DateWindowInput>,
    pub overdue: Option<DateWindowInput>,
    pub has_overdue: OverdueFlags,
    pub dependencies: Option<DependencyList>,
    pub progress: Option<f64>,
    pub completion: Option<f64>,
    pub custom_class: Option<String>,
    pub status: Option<String>,
    pub info: Option<String>,
}

impl TaskInput {
    pub fn new(id: impl Into<String>, start: &str, end: &str) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id: Some(id),
            start: Some(start.to_string()),
            end: Some(end.to_string()),
            ..Default::default()
        }
    }

    pub fn with_dependencies(mut self, deps: &str) -> Self {
        self.dependencies = Some(DependencyList::Csv(deps.to_string()));
        self
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.custom_class = Some(class.to_string());
        self
    }
}

/// Behavior bucket of a task, resolved once from its class name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskKind {
    #[default]
    Standard,
    /// Renders start/end activity cursors.
    Activity,
    /// An activity whose start or work has run past its dates.
    ActivityOverdue,
    /// Any other class; only used to group bars for cascading moves.
    Custom(String),
}

impl TaskKind {
    pub fn resolve(class: Option<&str>, flags: OverdueFlags) -> Self {
        match class.map(str::trim) {
            None | Some("") => TaskKind::Standard,
            Some("bar-activity") if flags.to_start || flags.wip => TaskKind::ActivityOverdue,
            Some("bar-activity") => TaskKind::Activity,
            Some("bar-activity-overdue") => TaskKind::ActivityOverdue,
            Some(other) => TaskKind::Custom(other.to_string()),
        }
    }

    pub fn has_activity_cursors(&self) -> bool {
        matches!(self, TaskKind::Activity | TaskKind::ActivityOverdue)
    }
}

/// Optional start/end pair after parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl DateWindow {
    pub fn span(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }
}

/// A task after ingestion: dates defaulted, dependencies parsed, kind resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub delay: DateWindow,
    pub overdue: DateWindow,
    pub has_overdue: OverdueFlags,
    pub dependencies: Vec<TaskId>,
    /// Percent, 0 to 100.
    pub progress: f64,
    /// Percent, 0 to 100.
    pub completion: f64,
    pub row_index: usize,
    /// Set when a date had to be invented; invalid tasks do not accept interaction.
    pub invalid: bool,
    pub kind: TaskKind,
    pub status: Option<String>,
    pub info: Option<String>,
}

impl Task {
    /// Applies the date defaulting policy and resolves derived fields.
    pub fn ingest(input: TaskInput, row_index: usize, dates: &impl DateMath) -> Self {
        let parse = |field: &str, value: Option<&String>| -> Option<NaiveDateTime> {
            let value = value?;
            let parsed = dates.parse(value);
            if parsed.is_none() {
                warn!(field, value = %value, "ignoring unparseable task date");
            }
            parsed
        };

        let start = parse("start", input.start.as_ref());
        let mut end = parse("end", input.end.as_ref());
        let delay_input = input.delay.clone().unwrap_or_default();
        let overdue_input = input.overdue.clone().unwrap_or_default();
        let mut delay = DateWindow {
            start: parse("delay.start", delay_input.start.as_ref()),
            end: parse("delay.end", delay_input.end.as_ref()),
        };
        let mut overdue = DateWindow {
            start: parse("overdue.start", overdue_input.start.as_ref()),
            end: parse("overdue.end", overdue_input.end.as_ref()),
        };

        if let (Some(s), Some(e)) = (start, end) {
            if e < s || dates.diff(e, s, DateUnit::Year) > MAX_SPAN_YEARS {
                warn!(task = ?input.id, "discarding end date outside the accepted span");
                end = None;
            }
        }

        let invalid = start.is_none() || end.is_none();
        let (start, end) = match (start, end) {
            (Some(s), Some(e)) => (s, e),
            (None, None) => {
                let today = dates.today();
                let end = dates.add(today, DEFAULT_SPAN_DAYS, DateUnit::Day);
                delay = DateWindow::span(today, end);
                overdue = DateWindow::span(today, end);
                (today, end)
            }
            (None, Some(e)) => {
                let s = dates.add(e, -DEFAULT_SPAN_DAYS, DateUnit::Day);
                delay.start = Some(s);
                overdue.start = Some(s);
                (s, e)
            }
            (Some(s), None) => {
                let e = dates.add(s, DEFAULT_SPAN_DAYS, DateUnit::Day);
                delay.end = Some(e);
                overdue.end = Some(e);
                (s, e)
            }
        };

        let id = input
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| generate_id(&input.name));
        let kind = TaskKind::resolve(input.custom_class.as_deref(), input.has_overdue);

        Self {
            id,
            name: input.name,
            start,
            end,
            delay,
            overdue,
            has_overdue: input.has_overdue,
            dependencies: input
                .dependencies
                .as_ref()
                .map(DependencyList::ids)
                .unwrap_or_default(),
            progress: clamp_percent(input.progress),
            completion: clamp_percent(input.completion),
            row_index,
            invalid,
            kind,
            status: input.status,
            info: input.info,
        }
    }
}

fn clamp_percent(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.clamp(0.0, 100.0),
        _ => 0.0,
    }
}

/// `<name>_<10 random chars>`.
pub(crate) fn generate_id(name: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}_{}", name, &random[..10])
}

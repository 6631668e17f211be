use thiserror::Error;

pub type GanttResult<T> = Result<T, GanttError>;

#[derive(Debug, Error)]
pub enum GanttError {
    #[error("a chart needs at least one task")]
    EmptyTaskSet,

    #[error("invalid option `{name}`: {value}")]
    InvalidOption { name: &'static str, value: f64 },

    #[error("viewport width {width} is too narrow for the Max view (needs more than 200px)")]
    ViewportTooNarrow { width: f64 },

    #[error("unknown view mode `{0}`")]
    UnknownViewMode(String),

    #[error("invalid import data: {0}")]
    InvalidImport(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid chart json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid csv: {0}")]
    Csv(#[from] csv::Error),
}

//! gantt-timeline: layout and interaction engine for Gantt timelines.
//!
//! Tasks and milestones are projected onto a time grid under one of seven
//! view modes; bars can be dragged and resized subject to their dependencies.
//! Drawing is left to a [`Renderer`] implementation.

pub mod date_math;
pub mod error;
pub mod gantt;
pub mod graph;
pub mod interaction;
pub mod io;
pub mod layout;
pub mod model;
pub mod render;
pub mod telemetry;

pub use date_math::{DateMath, DateUnit, FixedDateMath, SystemDateMath};
pub use error::{GanttError, GanttResult};
pub use gantt::{Gantt, GanttEvent};
pub use graph::DependencyGraph;
pub use interaction::{DragMode, HitRegion, MoveOutcome};
pub use model::{GanttOptions, MilestoneInput, TaskInput, ViewMode};
pub use render::{Point, Rect, RecordingRenderer, Renderer};

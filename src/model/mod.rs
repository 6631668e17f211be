pub mod milestone;
pub mod options;
pub mod project;
pub mod task;

pub use milestone::{Milestone, MilestoneInput};
pub use options::{GanttOptions, ViewMode};
pub use project::Project;
pub use task::{DateWindow, DependencyList, OverdueFlags, Task, TaskId, TaskInput, TaskKind};

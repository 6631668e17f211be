use std::collections::HashMap;

use tracing::{debug, warn};

use crate::date_math::DateMath;

use super::milestone::{Milestone, MilestoneInput};
use super::task::{Task, TaskId, TaskInput};

/// The ingested task set: tasks in row order plus milestones.
#[derive(Debug, Clone, Default)]
pub struct Project {
    pub tasks: Vec<Task>,
    pub milestones: Vec<Milestone>,
    index: HashMap<TaskId, usize>,
}

impl Project {
    /// Ingests tasks and milestones; row indices follow input order.
    pub fn ingest(
        tasks: Vec<TaskInput>,
        milestones: Vec<MilestoneInput>,
        dates: &impl DateMath,
    ) -> Self {
        let tasks: Vec<Task> = tasks
            .into_iter()
            .enumerate()
            .map(|(row, input)| Task::ingest(input, row, dates))
            .collect();
        let milestones: Vec<Milestone> = milestones
            .into_iter()
            .enumerate()
            .map(|(row, input)| Milestone::ingest(input, row, dates))
            .collect();

        let mut index = HashMap::with_capacity(tasks.len());
        for (i, task) in tasks.iter().enumerate() {
            if index.insert(task.id.clone(), i).is_some() {
                warn!(id = %task.id, "duplicate task id, later task wins lookups");
            }
        }

        debug!(
            tasks = tasks.len(),
            invalid = tasks.iter().filter(|t| t.invalid).count(),
            milestones = milestones.len(),
            "ingested task set"
        );

        Self {
            tasks,
            milestones,
            index,
        }
    }

    pub fn task_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.task_index(id).map(|i| &self.tasks[i])
    }

    /// Row indices of a task's dependencies that resolve to known tasks.
    pub fn resolved_dependencies(&self, task: &Task) -> Vec<usize> {
        task.dependencies
            .iter()
            .filter_map(|dep| self.task_index(dep))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_math::SystemDateMath;

    #[test]
    fn ingest_assigns_rows_and_resolves_dependencies() {
        let project = Project::ingest(
            vec![
                TaskInput::new("a", "2024-01-01", "2024-01-02"),
                TaskInput::new("b", "2024-01-03", "2024-01-04").with_dependencies("a, ghost"),
            ],
            vec![MilestoneInput::new("Go live", "2024-01-05")],
            &SystemDateMath,
        );
        assert_eq!(project.tasks[1].row_index, 1);
        assert_eq!(project.task_index("b"), Some(1));
        let b = project.task("b").unwrap();
        assert_eq!(project.resolved_dependencies(b), vec![0]);
        assert_eq!(project.milestones.len(), 1);
    }
}

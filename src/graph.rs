//! Forward dependency map: dependency id → ids of the tasks that depend on it.

use indexmap::{IndexMap, IndexSet};

use crate::model::{Task, TaskId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    dependents: IndexMap<TaskId, Vec<TaskId>>,
}

impl DependencyGraph {
    /// Builds the map from every task's dependency list.
    ///
    /// Ids that match no task still get an entry; nothing is validated here.
    pub fn build<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut dependents: IndexMap<TaskId, Vec<TaskId>> = IndexMap::new();
        for task in tasks {
            for dep in &task.dependencies {
                dependents
                    .entry(dep.clone())
                    .or_default()
                    .push(task.id.clone());
            }
        }
        Self { dependents }
    }

    /// Direct dependents of `id`.
    pub fn dependents(&self, id: &str) -> &[TaskId] {
        self.dependents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every task that depends on `id` directly or through other tasks,
    /// in breadth-first discovery order, without duplicates or `id` itself.
    pub fn all_transitive_dependents(&self, id: &str) -> Vec<TaskId> {
        let mut visited: IndexSet<&str> = IndexSet::new();
        visited.insert(id);
        let mut frontier: Vec<&str> = vec![id];

        while !frontier.is_empty() {
            let mut next = Vec::new();
            for current in frontier {
                for dependent in self.dependents(current) {
                    if visited.insert(dependent.as_str()) {
                        next.push(dependent.as_str());
                    }
                }
            }
            frontier = next;
        }

        visited
            .into_iter()
            .skip(1)
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.dependents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TaskId, &Vec<TaskId>)> {
        self.dependents.iter()
    }
}

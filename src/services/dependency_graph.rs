//! Dependency graph construction.
//!
//! Builds successor lists (the inverse of declared dependencies) from a task
//! collection. Unknown dependency ids are treated as externally satisfied:
//! they produce no edge, but they are surfaced to the caller rather than
//! silently dropped.

use std::collections::{HashMap, HashSet};

use tracing::{instrument, warn};
use uuid::Uuid;

use crate::domain::models::Task;

/// A dependency reference to a task id not present in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingDependency {
    /// Task that declared the dependency
    pub task_id: Uuid,
    /// The unknown dependency id
    pub dependency_id: Uuid,
}

/// Directed dependency graph over a task collection.
///
/// Edges point from a dependency to its dependents. `build` is idempotent:
/// the same task set always produces an identical graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    /// All task ids in the collection
    nodes: HashSet<Uuid>,
    /// task id -> tasks that depend on it
    successors: HashMap<Uuid, Vec<Uuid>>,
    /// task id -> count of dependencies present in the collection
    in_degree: HashMap<Uuid, usize>,
    /// Dependency references that point outside the collection
    missing: Vec<MissingDependency>,
}

impl DependencyGraph {
    /// Build the graph from a task collection.
    ///
    /// A dependency id that references no task in the collection is treated
    /// as externally satisfied: it contributes no edge and no in-degree, and
    /// is recorded in `missing_dependencies`.
    #[instrument(skip(tasks), fields(task_count = tasks.len()))]
    pub fn build(tasks: &[Task]) -> Self {
        let nodes: HashSet<Uuid> = tasks.iter().map(|t| t.id).collect();
        let mut successors: HashMap<Uuid, Vec<Uuid>> =
            tasks.iter().map(|t| (t.id, Vec::new())).collect();
        let mut in_degree: HashMap<Uuid, usize> = tasks.iter().map(|t| (t.id, 0)).collect();
        let mut missing = Vec::new();

        for task in tasks {
            for &dep_id in &task.dependencies {
                if dep_id == task.id {
                    continue;
                }
                if nodes.contains(&dep_id) {
                    successors.entry(dep_id).or_default().push(task.id);
                    *in_degree.entry(task.id).or_insert(0) += 1;
                } else {
                    warn!(
                        task_id = %task.id,
                        dependency_id = %dep_id,
                        "dependency references unknown task; treated as externally satisfied"
                    );
                    missing.push(MissingDependency {
                        task_id: task.id,
                        dependency_id: dep_id,
                    });
                }
            }
        }

        Self {
            nodes,
            successors,
            in_degree,
            missing,
        }
    }

    /// Tasks that depend on the given task.
    pub fn successors(&self, id: Uuid) -> &[Uuid] {
        self.successors.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Count of dependencies the given task has inside the collection.
    pub fn in_degree(&self, id: Uuid) -> usize {
        self.in_degree.get(&id).copied().unwrap_or(0)
    }

    /// Copy of the in-degree table, for consumers that reduce it.
    pub fn in_degrees(&self) -> HashMap<Uuid, usize> {
        self.in_degree.clone()
    }

    /// All task ids in the graph.
    pub fn node_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.nodes.iter().copied()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.nodes.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Dependency references pointing outside the collection.
    pub fn missing_dependencies(&self) -> &[MissingDependency] {
        &self.missing
    }
}

/// Detect a circular dependency in a set of tasks.
///
/// Returns the cycle path when one exists.
pub fn detect_cycle(tasks: &[Task]) -> Option<Vec<Uuid>> {
    let known: HashSet<Uuid> = tasks.iter().map(|t| t.id).collect();
    let mut graph: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for task in tasks {
        graph.entry(task.id).or_default().extend(
            task.dependencies
                .iter()
                .filter(|dep| known.contains(dep))
                .copied(),
        );
    }

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    for &task_id in graph.keys() {
        if !visited.contains(&task_id)
            && detect_cycle_util(task_id, &graph, &mut visited, &mut rec_stack, &mut path)
        {
            return Some(path);
        }
    }

    None
}

// Standalone DFS helper for cycle detection
fn detect_cycle_util(
    node: Uuid,
    graph: &HashMap<Uuid, Vec<Uuid>>,
    visited: &mut HashSet<Uuid>,
    rec_stack: &mut HashSet<Uuid>,
    path: &mut Vec<Uuid>,
) -> bool {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(neighbors) = graph.get(&node) {
        for &neighbor in neighbors {
            if !visited.contains(&neighbor) {
                if detect_cycle_util(neighbor, graph, visited, rec_stack, path) {
                    return true;
                }
            } else if rec_stack.contains(&neighbor) {
                if let Some(cycle_start) = path.iter().position(|&id| id == neighbor) {
                    path.drain(0..cycle_start);
                    return true;
                }
            }
        }
    }

    rec_stack.remove(&node);
    path.pop();
    false
}

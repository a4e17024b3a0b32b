// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, info};

use crate::dag::task::{RunnableTask, TaskId, TaskNode, TaskSpec, TaskState};
use crate::errors::{BatchdagError, Result};

/// All tasks of one job, keyed by id, plus reverse adjacency.
///
/// Construction is fail-fast: duplicate ids and references to unknown tasks
/// are rejected when the task is added. Cycles can only be formed through
/// [`TaskGraph::add_tasks`] and are caught by [`TaskGraph::validate`].
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    nodes: HashMap<TaskId, TaskNode>,
    /// Direct dependents: tasks that list the key among their deps.
    dependents: HashMap<TaskId, Vec<TaskId>>,
    /// Insertion order, for deterministic iteration.
    order: Vec<TaskId>,
    validated: bool,
    sealed: bool,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single task whose dependencies are already in the graph.
    pub fn add_task(&mut self, spec: TaskSpec) -> Result<()> {
        self.ensure_not_sealed()?;

        if self.nodes.contains_key(&spec.id) {
            return Err(BatchdagError::DuplicateTaskId(spec.id));
        }

        let deps = resolve_dependencies(&spec, |id| self.nodes.contains_key(id))?;
        self.insert(spec, deps);
        Ok(())
    }

    /// Add a collection of tasks atomically.
    ///
    /// Dependencies may reference tasks already in the graph or tasks in the
    /// same batch. On any error nothing is added.
    pub fn add_tasks(&mut self, specs: impl IntoIterator<Item = TaskSpec>) -> Result<()> {
        self.ensure_not_sealed()?;

        let specs: Vec<TaskSpec> = specs.into_iter().collect();

        let mut batch_ids: HashSet<&str> = HashSet::with_capacity(specs.len());
        for spec in &specs {
            if self.nodes.contains_key(&spec.id) || !batch_ids.insert(spec.id.as_str()) {
                return Err(BatchdagError::DuplicateTaskId(spec.id.clone()));
            }
        }

        let mut resolved = Vec::with_capacity(specs.len());
        for spec in &specs {
            let deps = resolve_dependencies(spec, |id| {
                self.nodes.contains_key(id) || batch_ids.contains(id)
            })?;
            resolved.push(deps);
        }
        drop(batch_ids);

        for (spec, deps) in specs.into_iter().zip(resolved) {
            self.insert(spec, deps);
        }
        Ok(())
    }

    /// Check that the graph is acyclic.
    ///
    /// Must succeed before any execution activity. On failure the error
    /// names one task that takes part in a cycle.
    pub fn validate(&mut self) -> Result<()> {
        // Edge direction: dep -> task.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for id in &self.order {
            graph.add_node(id.as_str());
        }

        for node in self.nodes.values() {
            for dep in &node.deps {
                graph.add_edge(dep.as_str(), node.id.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => {
                self.validated = true;
                debug!(tasks = self.order.len(), "task graph validated");
                Ok(())
            }
            Err(cycle) => Err(BatchdagError::CyclicDependency(cycle.node_id().to_string())),
        }
    }

    /// Transition every task without dependencies to `Runnable` and return
    /// them.
    ///
    /// Seals the graph against further additions. A repeated call returns no
    /// tasks, since nothing new transitions.
    pub fn initial_runnable_set(&mut self) -> Result<Vec<RunnableTask>> {
        if !self.validated {
            return Err(BatchdagError::NotValidated);
        }
        self.sealed = true;

        let mut runnable = Vec::new();
        for id in &self.order {
            if let Some(node) = self.nodes.get_mut(id) {
                if node.deps.is_empty() && node.state == TaskState::Pending {
                    node.state = TaskState::Runnable;
                    runnable.push(RunnableTask::from_node(node));
                }
            }
        }

        info!(count = runnable.len(), "initial runnable set computed");
        Ok(runnable)
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Task ids in insertion order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &TaskNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn get(&self, id: &str) -> Option<&TaskNode> {
        self.nodes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut TaskNode> {
        self.nodes.get_mut(id)
    }

    /// Immediate dependencies of a task.
    pub fn dependencies_of(&self, id: &str) -> &[TaskId] {
        self.nodes
            .get(id)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, id: &str) -> &[TaskId] {
        self.dependents
            .get(id)
            .map(|d| d.as_slice())
            .unwrap_or(&[])
    }

    fn ensure_not_sealed(&self) -> Result<()> {
        if self.sealed {
            return Err(BatchdagError::GraphSealed);
        }
        Ok(())
    }

    fn insert(&mut self, spec: TaskSpec, deps: Vec<TaskId>) {
        let id = spec.id.clone();
        for dep in &deps {
            self.dependents
                .entry(dep.clone())
                .or_default()
                .push(id.clone());
        }
        debug!(task = %id, deps = ?deps, "task added to graph");
        self.nodes.insert(id.clone(), TaskNode::new(spec, deps));
        self.order.push(id);
        self.validated = false;
    }
}

/// Merge explicit ids and expanded ranges into a de-duplicated dependency
/// list, checking each against `is_known`.
fn resolve_dependencies(
    spec: &TaskSpec,
    is_known: impl Fn(&str) -> bool,
) -> Result<Vec<TaskId>> {
    let mut seen: HashSet<TaskId> = HashSet::new();
    let mut deps = Vec::new();

    let mut push = |dep: TaskId| -> Result<()> {
        if !is_known(&dep) {
            return Err(BatchdagError::UnknownDependency {
                task: spec.id.clone(),
                dependency: dep,
            });
        }
        if seen.insert(dep.clone()) {
            deps.push(dep);
        }
        Ok(())
    };

    for dep in &spec.depends_on {
        push(dep.clone())?;
    }

    for range in &spec.depends_on_ranges {
        if range.start > range.end {
            return Err(BatchdagError::InvalidRange {
                task: spec.id.clone(),
                start: range.start,
                end: range.end,
            });
        }
        // Expansion stops at the first unknown id, so huge ranges fail fast.
        for dep in range.ids() {
            push(dep)?;
        }
    }

    Ok(deps)
}

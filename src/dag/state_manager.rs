// src/dag/state_manager.rs

//! Applies a resolved dependency action to the direct dependents of a
//! finished task.

use tracing::{debug, warn};

use crate::dag::graph::TaskGraph;
use crate::dag::task::{TaskId, TaskState};
use crate::types::ExitAction;

/// Tasks whose state changed while applying one action.
#[derive(Debug, Default)]
pub struct Propagation {
    pub newly_runnable: Vec<TaskId>,
    pub newly_blocked: Vec<TaskId>,
}

/// Borrowing helper that mutates dependents' counters and states.
pub struct StateManager<'a> {
    graph: &'a mut TaskGraph,
}

impl<'a> StateManager<'a> {
    pub fn new(graph: &'a mut TaskGraph) -> Self {
        Self { graph }
    }

    /// Apply `action` from `finished` to each of its direct dependents.
    ///
    /// - `Block` moves a non-terminal dependent straight to `Blocked`.
    /// - `Satisfy` decrements the dependent's unresolved count; at zero a
    ///   `Pending` dependent becomes `Runnable`.
    ///
    /// Only one hop is visited. Descendants of a blocked task stay
    /// `Pending`.
    pub fn apply(&mut self, finished: &str, action: ExitAction) -> Propagation {
        let dependents: Vec<TaskId> = self.graph.dependents_of(finished).to_vec();
        let mut out = Propagation::default();

        for name in dependents {
            let Some(node) = self.graph.get_mut(&name) else {
                warn!(task = %name, "dependent missing from graph");
                continue;
            };

            match action {
                ExitAction::Block => {
                    if node.state.is_terminal() {
                        continue;
                    }
                    debug!(
                        task = %node.id,
                        upstream = %finished,
                        "predecessor resolved to block; marking Blocked"
                    );
                    node.state = TaskState::Blocked;
                    out.newly_blocked.push(node.id.clone());
                }
                ExitAction::Satisfy => {
                    node.unresolved_deps = node.unresolved_deps.saturating_sub(1);
                    if node.unresolved_deps == 0 && node.state == TaskState::Pending {
                        debug!(
                            task = %node.id,
                            upstream = %finished,
                            "all predecessors satisfied; marking Runnable"
                        );
                        node.state = TaskState::Runnable;
                        out.newly_runnable.push(node.id.clone());
                    }
                }
            }
        }

        out
    }
}

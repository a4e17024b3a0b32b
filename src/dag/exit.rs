// src/dag/exit.rs

//! Exit policies and the resolver that turns a task's terminal status into
//! the dependency action applied to its dependents.

use std::collections::BTreeMap;

use crate::types::{ExitAction, ExitStatus};

/// Inclusive exit-code range mapped to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCodeRange {
    pub start: i32,
    pub end: i32,
    pub action: ExitAction,
}

impl ExitCodeRange {
    pub fn contains(&self, code: i32) -> bool {
        self.start <= code && code <= self.end
    }
}

/// Per-task mapping from exit status to [`ExitAction`].
///
/// Immutable once the owning task has been added to a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExitPolicy {
    codes: BTreeMap<i32, ExitAction>,
    ranges: Vec<ExitCodeRange>,
    pre_processing_error: Option<ExitAction>,
    default: Option<ExitAction>,
}

impl ExitPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy whose only entry is a default action.
    pub fn with_default(action: ExitAction) -> Self {
        Self {
            default: Some(action),
            ..Self::default()
        }
    }

    pub fn on_exit_code(mut self, code: i32, action: ExitAction) -> Self {
        self.codes.insert(code, action);
        self
    }

    pub fn on_exit_code_range(mut self, start: i32, end: i32, action: ExitAction) -> Self {
        self.ranges.push(ExitCodeRange { start, end, action });
        self
    }

    pub fn on_pre_processing_error(mut self, action: ExitAction) -> Self {
        self.pre_processing_error = Some(action);
        self
    }

    pub fn on_default(mut self, action: ExitAction) -> Self {
        self.default = Some(action);
        self
    }

    pub fn codes(&self) -> &BTreeMap<i32, ExitAction> {
        &self.codes
    }

    pub fn ranges(&self) -> &[ExitCodeRange] {
        &self.ranges
    }

    pub fn pre_processing_error(&self) -> Option<ExitAction> {
        self.pre_processing_error
    }

    pub fn default_action(&self) -> Option<ExitAction> {
        self.default
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
            && self.ranges.is_empty()
            && self.pre_processing_error.is_none()
            && self.default.is_none()
    }
}

/// Resolve the dependency action for `status` under `policy`.
///
/// Lookup order:
/// 1. exact exit code (`Success` counts as code 0)
/// 2. exit-code ranges, first match in declaration order
/// 3. the `PreProcessingError` category
/// 4. the policy default
///
/// With nothing matching and no default, success satisfies and everything
/// else blocks.
pub fn resolve(policy: &ExitPolicy, status: ExitStatus) -> ExitAction {
    if let Some(code) = status.exit_code() {
        if let Some(action) = policy.codes.get(&code) {
            return *action;
        }
        if let Some(range) = policy.ranges.iter().find(|r| r.contains(code)) {
            return range.action;
        }
    }

    if status == ExitStatus::PreProcessingError {
        if let Some(action) = policy.pre_processing_error {
            return action;
        }
    }

    match policy.default {
        Some(action) => action,
        None if status.is_success() => ExitAction::Satisfy,
        None => ExitAction::Block,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_policy_satisfies_only_on_success() {
        let policy = ExitPolicy::new();
        assert_eq!(resolve(&policy, ExitStatus::Success), ExitAction::Satisfy);
        assert_eq!(resolve(&policy, ExitStatus::Failure(1)), ExitAction::Block);
        assert_eq!(
            resolve(&policy, ExitStatus::PreProcessingError),
            ExitAction::Block
        );
    }

    #[test]
    fn exact_codes_win_over_default() {
        let policy = ExitPolicy::with_default(ExitAction::Satisfy)
            .on_exit_code(10, ExitAction::Block)
            .on_exit_code(20, ExitAction::Block);

        assert_eq!(resolve(&policy, ExitStatus::Failure(10)), ExitAction::Block);
        assert_eq!(resolve(&policy, ExitStatus::Failure(20)), ExitAction::Block);
        assert_eq!(resolve(&policy, ExitStatus::Failure(30)), ExitAction::Satisfy);
        assert_eq!(resolve(&policy, ExitStatus::Success), ExitAction::Satisfy);
    }

    #[test]
    fn exact_code_beats_range_and_first_range_wins() {
        let policy = ExitPolicy::with_default(ExitAction::Block)
            .on_exit_code(150, ExitAction::Block)
            .on_exit_code_range(100, 199, ExitAction::Satisfy)
            .on_exit_code_range(120, 130, ExitAction::Block);

        assert_eq!(resolve(&policy, ExitStatus::Failure(150)), ExitAction::Block);
        assert_eq!(resolve(&policy, ExitStatus::Failure(125)), ExitAction::Satisfy);
        assert_eq!(resolve(&policy, ExitStatus::Failure(200)), ExitAction::Block);
    }

    #[test]
    fn success_can_be_mapped_through_code_zero() {
        let policy = ExitPolicy::new().on_exit_code(0, ExitAction::Block);
        assert_eq!(resolve(&policy, ExitStatus::Success), ExitAction::Block);
    }

    #[test]
    fn pre_processing_category_falls_back_to_default() {
        let policy = ExitPolicy::with_default(ExitAction::Satisfy);
        assert_eq!(
            resolve(&policy, ExitStatus::PreProcessingError),
            ExitAction::Satisfy
        );

        let policy = policy.on_pre_processing_error(ExitAction::Block);
        assert_eq!(
            resolve(&policy, ExitStatus::PreProcessingError),
            ExitAction::Block
        );
    }
}

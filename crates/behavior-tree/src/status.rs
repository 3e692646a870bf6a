//! Node statuses and leaf results.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a tree node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, Default,
)]
pub enum NodeStatus {
    /// Not yet visited, or reset for another pass.
    #[default]
    Init,
    /// Visited and currently executing.
    Started,
    Success,
    Failure,
    /// Skipped because a sibling already decided the parent's outcome.
    Omitted,
}

impl NodeStatus {
    /// Terminal statuses never execute again in the current pass.
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeStatus::Success | NodeStatus::Failure | NodeStatus::Omitted)
    }

    /// Whether the node is still eligible to be visited.
    pub fn is_executable(self) -> bool {
        self == NodeStatus::Init
    }
}

/// Result reported by a leaf execution or propagated by a finished child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum BehaviorResult {
    Success,
    Failure,
    /// The work is not done. Sequence and Selector drop this notification,
    /// leaving the pass stalled with an overall `Running` result; only Until
    /// keeps driving past it.
    Running,
}

impl BehaviorResult {
    /// The status a leaf settles into when this result finishes it. Only
    /// `Success` settles as success; a `Running` leaf settles as `Failure`
    /// while the raw result still travels to the parent.
    pub fn into_status(self) -> NodeStatus {
        match self {
            BehaviorResult::Success => NodeStatus::Success,
            BehaviorResult::Failure | BehaviorResult::Running => NodeStatus::Failure,
        }
    }

    pub fn is_failure(self) -> bool {
        self == BehaviorResult::Failure
    }
}

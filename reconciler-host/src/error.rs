use reconciler::{UpdateCmd, UpdateError, UpdateOp};
use thiserror::Error;

/// The first inconsistency found while driving a [`crate::Scenario`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error("{cmd:?}({position_start},{item_count}) does not fit a list of {len} items")]
    OutOfBounds {
        cmd: UpdateCmd,
        position_start: usize,
        item_count: usize,
        len: usize,
    },

    #[error(
        "bound item at {position} maps to {actual:?} through the pending ops, but is now at {expected:?}"
    )]
    StalePosition {
        position: isize,
        expected: Option<usize>,
        actual: Option<usize>,
    },

    #[error("first pass op {op} covers a bound item")]
    FirstPassConflict { op: UpdateOp },

    #[error("pre-layout position {position} maps to {actual:?}, expected {expected:?}")]
    PreLayoutMismatch {
        position: usize,
        expected: Option<usize>,
        actual: Option<usize>,
    },

    #[error("bound item #{index} has layout position {actual}, expected {expected}")]
    Discontinuous {
        index: usize,
        expected: isize,
        actual: isize,
    },

    #[error("replaying both passes diverges from the data source at {position}")]
    ReplayMismatch { position: usize },
}

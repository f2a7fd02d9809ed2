//! Engine error types.
//!
//! Two caller-facing classes: bad arguments (unknown ids, malformed
//! requests) are rejected before any state is touched, and failed action
//! preconditions (`InvalidAction`) likewise leave the world unchanged.
//! Pathfinding dead-ends and player death are *not* errors.

use crate::components::EntityId;
use crate::persistence::SnapshotError;

#[derive(Debug)]
pub enum EngineError {
    /// No live or remembered entity carries this id.
    UnknownEntity(EntityId),
    /// The id does not name an item usable for this call.
    UnknownItem(EntityId),
    /// The request itself is malformed (wrong entity class, zero rewind).
    InvalidArgument(String),
    /// The request is well-formed but its preconditions do not hold.
    InvalidAction(String),
    /// Snapshot encode/decode failure.
    Snapshot(SnapshotError),
}

impl From<SnapshotError> for EngineError {
    fn from(e: SnapshotError) -> Self {
        EngineError::Snapshot(e)
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::UnknownEntity(id) => write!(f, "unknown entity id {}", id),
            EngineError::UnknownItem(id) => write!(f, "unknown item id {}", id),
            EngineError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            EngineError::InvalidAction(msg) => write!(f, "invalid action: {}", msg),
            EngineError::Snapshot(e) => write!(f, "snapshot error: {}", e),
        }
    }
}

impl std::error::Error for EngineError {}

pub type EngineResult<T> = Result<T, EngineError>;

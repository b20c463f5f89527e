use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("task not found: {0}")]
    UnknownTask(Uuid),

    /// The host started a second inline edit while one is open.
    #[error("an inline edit of task {editing} is already in progress")]
    EditInProgress { editing: Uuid },
}

use tracing::debug;
use uuid::Uuid;

use crate::error::ControllerError;

/// Identifies the row whose completion toggle is hidden while its label is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowAnchor {
    pub task: Uuid,
}

/// Outcome of a confirmed edit. The anchor must be restored before `text` is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub task: Uuid,
    pub anchor: RowAnchor,
    pub text: String,
}

/// Inline edit state. `Committed` and `Canceled` are transitions back to
/// `Idle`, reported through the return values of [`EditSession::commit`] and
/// [`EditSession::cancel`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditSession {
    #[default]
    Idle,
    Editing {
        task: Uuid,
        anchor: RowAnchor,
    },
}

impl EditSession {
    pub fn begin(&mut self, task: Uuid, anchor: RowAnchor) -> Result<(), ControllerError> {
        if let EditSession::Editing { task: editing, .. } = self {
            return Err(ControllerError::EditInProgress { editing: *editing });
        }
        debug!(task = %task, "edit session started");
        *self = EditSession::Editing { task, anchor };
        Ok(())
    }

    pub fn cancel(&mut self) -> Option<RowAnchor> {
        match std::mem::take(self) {
            EditSession::Idle => None,
            EditSession::Editing { task, anchor } => {
                debug!(task = %task, "edit session canceled");
                Some(anchor)
            }
        }
    }

    pub fn commit(&mut self, text: &str) -> Option<Commit> {
        match std::mem::take(self) {
            EditSession::Idle => None,
            EditSession::Editing { task, anchor } => {
                debug!(task = %task, "edit session committed");
                Some(Commit {
                    task,
                    anchor,
                    text: text.to_string(),
                })
            }
        }
    }

    pub fn editing(&self) -> Option<Uuid> {
        match self {
            EditSession::Idle => None,
            EditSession::Editing { task, .. } => Some(*task),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing().is_some()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{EditSession, RowAnchor};
    use crate::error::ControllerError;

    #[test]
    fn begin_then_cancel_returns_anchor() {
        let task = Uuid::new_v4();
        let mut session = EditSession::default();

        session.begin(task, RowAnchor { task }).unwrap();
        assert_eq!(session.editing(), Some(task));

        assert_eq!(session.cancel(), Some(RowAnchor { task }));
        assert_eq!(session, EditSession::Idle);
    }

    #[test]
    fn commit_carries_raw_text() {
        let task = Uuid::new_v4();
        let mut session = EditSession::default();
        session.begin(task, RowAnchor { task }).unwrap();

        let commit = session.commit("  new text ").unwrap();

        assert_eq!(commit.task, task);
        assert_eq!(commit.anchor, RowAnchor { task });
        assert_eq!(commit.text, "  new text ");
        assert!(!session.is_editing());
    }

    #[test]
    fn second_begin_is_rejected() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let mut session = EditSession::default();
        session.begin(first, RowAnchor { task: first }).unwrap();

        let err = session
            .begin(second, RowAnchor { task: second })
            .unwrap_err();

        assert_eq!(err, ControllerError::EditInProgress { editing: first });
        assert_eq!(session.editing(), Some(first));
    }

    #[test]
    fn idle_transitions_are_noops() {
        let mut session = EditSession::default();
        assert_eq!(session.cancel(), None);
        assert_eq!(session.commit("x"), None);
    }
}

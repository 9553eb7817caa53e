//! Status handle for one batch delete

use std::fmt;

use tokio::sync::watch;

/// Lifecycle of one batch delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteState {
    /// Submitted, transaction not yet open
    Accepted,
    /// Transaction open, chunks being applied
    Streaming,
    /// Every chunk applied, commit in flight
    Committing,
    /// Committed; `rows` is the number of rows flagged deleted
    Committed { rows: u64 },
    /// Rolled back, nothing applied
    Aborted { reason: String },
}

impl DeleteState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeleteState::Committed { .. } | DeleteState::Aborted { .. }
        )
    }
}

impl fmt::Display for DeleteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteState::Accepted => f.write_str("accepted"),
            DeleteState::Streaming => f.write_str("streaming"),
            DeleteState::Committing => f.write_str("committing"),
            DeleteState::Committed { rows } => write!(f, "committed ({} rows)", rows),
            DeleteState::Aborted { reason } => write!(f, "aborted: {}", reason),
        }
    }
}

/// Observes a submitted batch delete. Dropping it does not cancel the work.
#[derive(Debug, Clone)]
pub struct DeleteTicket {
    rx: watch::Receiver<DeleteState>,
}

impl DeleteTicket {
    pub(crate) fn new(rx: watch::Receiver<DeleteState>) -> Self {
        Self { rx }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> DeleteState {
        self.rx.borrow().clone()
    }

    /// Resolve once the batch has committed or aborted
    pub async fn wait(mut self) -> DeleteState {
        loop {
            {
                let current = self.rx.borrow_and_update();
                if current.is_terminal() {
                    return current.clone();
                }
            }
            if self.rx.changed().await.is_err() {
                let last = self.rx.borrow().clone();
                if last.is_terminal() {
                    return last;
                }
                return DeleteState::Aborted {
                    reason: "delete pipeline stopped without reporting".to_string(),
                };
            }
        }
    }
}

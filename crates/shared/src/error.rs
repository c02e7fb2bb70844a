use thiserror::Error;

use crate::domain::{TableStatus, TeamId};

/// Failures decoding or interpreting a store envelope.
#[derive(Debug, Error)]
pub enum WireError {
    /// `ok:false`; the message is the store's, untouched.
    #[error("{0}")]
    Rejected(String),
    #[error("malformed store payload: {0}")]
    Malformed(String),
    #[error("invalid store json: {0}")]
    Json(#[from] serde_json::Error),
}

/// A table operation whose precondition does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("table is {status}, not correcting")]
    NotCorrecting { status: TableStatus },
    #[error("table is already correcting")]
    AlreadyCorrecting,
    #[error("table is {status}, not calling")]
    NotCalling { status: TableStatus },
    #[error("team {team} is not in queue")]
    TeamNotInQueue { team: TeamId },
    #[error("team {team} is already in queue")]
    TeamAlreadyInQueue { team: TeamId },
    #[error("team {team} is being corrected at this table")]
    TeamBeingCorrected { team: TeamId },
    #[error("queue is empty")]
    EmptyQueue,
}

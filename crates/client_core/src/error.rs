use shared::{domain::TableName, error::TransitionError, error::WireError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    /// The store answered `ok:false`; the message is shown as received.
    #[error("{0}")]
    Rejected(String),
    #[error("invalid store response: {0}")]
    Decode(String),
    #[error("an operation on table {table} is already in flight")]
    InFlight { table: TableName },
    #[error("table {table}: {source}")]
    Precondition {
        table: TableName,
        #[source]
        source: TransitionError,
    },
    #[error("correction ends before it starts ({start_time} > {end_time})")]
    InvalidCorrection { start_time: i64, end_time: i64 },
    #[error("invalid store url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("store url cannot be used as a base: {0}")]
    CannotBeBase(String),
}

impl BoardError {
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Rejected(_) | Self::Precondition { .. } | Self::InFlight { .. }
        )
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<WireError> for BoardError {
    fn from(value: WireError) -> Self {
        match value {
            WireError::Rejected(message) => Self::Rejected(message),
            other => Self::Decode(other.to_string()),
        }
    }
}

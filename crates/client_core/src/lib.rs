//! Client side of the coordination board: talks to the authoritative store,
//! keeps the last known snapshot of every table, and issues table mutations.

use shared::domain::TableName;

pub mod controller;
pub mod error;
pub mod history;
pub mod snapshot;
pub mod sync;
pub mod transport;

pub use controller::CoordinationController;
pub use error::BoardError;
pub use history::HistoryClient;
pub use snapshot::{BoardSnapshot, ProblemGroup, RefreshOutcome, INITIAL_WATERMARK};
pub use sync::SyncClient;
pub use transport::{HttpStore, StoreTransport};

/// Notifications for whoever renders the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    SnapshotUpdated { last_update: i64 },
    TableUpdated { table: TableName },
    RefreshFailed(String),
    ActionRejected { table: TableName, message: String },
}

/// Seconds since the epoch, the unit every timestamp on the board uses.
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

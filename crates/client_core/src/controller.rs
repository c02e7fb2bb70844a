use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use shared::{
    domain::{TableName, TeamId},
    protocol::TableAction,
};
use tracing::{info, warn};

use crate::{error::BoardError, sync::SyncClient, transport::StoreTransport, unix_now, BoardEvent};

type Result<T> = std::result::Result<T, BoardError>;

/// Mutation surface for tables.
///
/// At most one operation per table is in flight; a second attempt fails
/// with [`BoardError::InFlight`] instead of queueing. Requests already known
/// to break a transition rule are refused before reaching the store. After
/// the store accepts an operation the board is refreshed.
pub struct CoordinationController {
    transport: Arc<dyn StoreTransport>,
    sync: Arc<SyncClient>,
    pending: Mutex<HashSet<TableName>>,
}

struct PendingToken<'a> {
    pending: &'a Mutex<HashSet<TableName>>,
    table: TableName,
}

impl Drop for PendingToken<'_> {
    fn drop(&mut self) {
        lock(self.pending).remove(&self.table);
    }
}

fn lock(pending: &Mutex<HashSet<TableName>>) -> MutexGuard<'_, HashSet<TableName>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CoordinationController {
    pub fn new(sync: Arc<SyncClient>) -> Self {
        Self {
            transport: sync.transport(),
            sync,
            pending: Mutex::new(HashSet::new()),
        }
    }

    pub fn sync(&self) -> &Arc<SyncClient> {
        &self.sync
    }

    pub fn is_pending(&self, table: &TableName) -> bool {
        lock(&self.pending).contains(table)
    }

    pub async fn start_coordination(&self, table: &TableName, team: TeamId) -> Result<()> {
        self.perform(table, TableAction::StartCoordination { team })
            .await
    }

    /// Finishes the current correction. With `call_next` the table switches
    /// straight to calling, within the same in-flight slot. Once the finish
    /// is accepted the board is refreshed even if the switch fails.
    pub async fn finish_coordination(&self, table: &TableName, call_next: bool) -> Result<()> {
        let _token = self.acquire(table)?;
        self.submit(table, &TableAction::FinishCoordination).await?;
        let outcome = if call_next {
            self.submit(table, &TableAction::SwitchToCalling).await
        } else {
            Ok(())
        };
        self.refresh_after(table).await;
        outcome
    }

    pub async fn pause_coordination(&self, table: &TableName) -> Result<()> {
        self.perform(table, TableAction::PauseCoordination).await
    }

    pub async fn switch_to_calling(&self, table: &TableName) -> Result<()> {
        self.perform(table, TableAction::SwitchToCalling).await
    }

    pub async fn switch_to_busy(&self, table: &TableName) -> Result<()> {
        self.perform(table, TableAction::SwitchToBusy).await
    }

    pub async fn call_team(&self, table: &TableName, team: TeamId) -> Result<()> {
        self.perform(table, TableAction::CallTeam { team }).await
    }

    pub async fn skip_to_next(&self, table: &TableName) -> Result<()> {
        self.perform(table, TableAction::SkipToNext).await
    }

    pub async fn add_to_queue(
        &self,
        table: &TableName,
        team: TeamId,
        pos: Option<usize>,
    ) -> Result<()> {
        self.perform(table, TableAction::AddToQueue { team, pos })
            .await
    }

    pub async fn remove_from_queue(&self, table: &TableName, team: TeamId) -> Result<()> {
        self.perform(table, TableAction::RemoveFromQueue { team })
            .await
    }

    pub async fn swap_teams_in_queue(
        &self,
        table: &TableName,
        first: TeamId,
        second: TeamId,
    ) -> Result<()> {
        self.perform(table, TableAction::SwapTeamsInQueue { first, second })
            .await
    }

    pub async fn perform(&self, table: &TableName, action: TableAction) -> Result<()> {
        let _token = self.acquire(table)?;
        self.submit(table, &action).await?;
        self.refresh_after(table).await;
        Ok(())
    }

    fn acquire(&self, table: &TableName) -> Result<PendingToken<'_>> {
        if !lock(&self.pending).insert(table.clone()) {
            return Err(BoardError::InFlight {
                table: table.clone(),
            });
        }
        Ok(PendingToken {
            pending: &self.pending,
            table: table.clone(),
        })
    }

    async fn submit(&self, table: &TableName, action: &TableAction) -> Result<()> {
        {
            let snapshot = self.sync.snapshot_handle();
            let snapshot = snapshot.read().await;
            snapshot
                .validate(table, action, unix_now())
                .map_err(|source| BoardError::Precondition {
                    table: table.clone(),
                    source,
                })?;
        }

        match self.transport.submit(table, action).await {
            Ok(()) => {
                info!(table = %table, action = action.endpoint(), "table action accepted");
                Ok(())
            }
            Err(BoardError::Rejected(message)) => {
                info!(
                    table = %table,
                    action = action.endpoint(),
                    %message,
                    "table action rejected by store"
                );
                self.sync.emit(BoardEvent::ActionRejected {
                    table: table.clone(),
                    message: message.clone(),
                });
                Err(BoardError::Rejected(message))
            }
            Err(err) => {
                warn!(table = %table, action = action.endpoint(), error = %err, "table action failed");
                Err(err)
            }
        }
    }

    async fn refresh_after(&self, table: &TableName) {
        if let Err(err) = self.sync.refresh().await {
            warn!(table = %table, error = %err, "refresh after table action failed");
        }
    }
}

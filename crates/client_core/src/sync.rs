use std::{sync::Arc, time::Duration};

use shared::domain::{Table, TableName};
use tokio::{
    sync::{broadcast, Mutex, RwLock},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, warn};

use crate::{
    error::BoardError,
    snapshot::{BoardSnapshot, RefreshOutcome},
    transport::StoreTransport,
    BoardEvent,
};

/// Keeps a [`BoardSnapshot`] in step with the store.
///
/// Refreshes are serialized through a gate: [`SyncClient::refresh`] waits
/// its turn, [`SyncClient::try_refresh`] gives up when one is in flight.
pub struct SyncClient {
    transport: Arc<dyn StoreTransport>,
    snapshot: Arc<RwLock<BoardSnapshot>>,
    pub(crate) refresh_gate: Mutex<()>,
    events: broadcast::Sender<BoardEvent>,
}

impl SyncClient {
    pub fn new(transport: Arc<dyn StoreTransport>) -> Arc<Self> {
        Self::with_snapshot(transport, Arc::new(RwLock::new(BoardSnapshot::default())))
    }

    pub fn with_snapshot(
        transport: Arc<dyn StoreTransport>,
        snapshot: Arc<RwLock<BoardSnapshot>>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            transport,
            snapshot,
            refresh_gate: Mutex::new(()),
            events,
        })
    }

    pub fn transport(&self) -> Arc<dyn StoreTransport> {
        Arc::clone(&self.transport)
    }

    pub fn snapshot_handle(&self) -> Arc<RwLock<BoardSnapshot>> {
        Arc::clone(&self.snapshot)
    }

    pub async fn snapshot(&self) -> BoardSnapshot {
        self.snapshot.read().await.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: BoardEvent) {
        let _ = self.events.send(event);
    }

    pub async fn refresh(&self) -> Result<RefreshOutcome, BoardError> {
        let _gate = self.refresh_gate.lock().await;
        self.refresh_locked().await
    }

    pub async fn try_refresh(&self) -> Result<RefreshOutcome, BoardError> {
        let Ok(_gate) = self.refresh_gate.try_lock() else {
            debug!("refresh already in flight; dropping tick");
            return Ok(RefreshOutcome::Skipped);
        };
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<RefreshOutcome, BoardError> {
        let watermark = self.snapshot.read().await.last_update();
        let response = self.transport.fetch_tables(watermark).await?;
        let outcome = self.snapshot.write().await.apply_tables_response(&response)?;

        match outcome {
            RefreshOutcome::Applied { last_update } => {
                debug!(last_update, "board snapshot replaced");
                self.emit(BoardEvent::SnapshotUpdated { last_update });
            }
            RefreshOutcome::Stale { received, current } => {
                debug!(received, current, "discarding out-of-order tables response");
            }
            RefreshOutcome::Unchanged | RefreshOutcome::Skipped => {}
        }
        Ok(outcome)
    }

    /// Re-reads a single table and merges it into the snapshot.
    pub async fn refresh_table(&self, table: &TableName) -> Result<Table, BoardError> {
        let fresh = self.transport.fetch_table(table).await?;
        self.snapshot.write().await.replace_table(fresh.clone());
        self.emit(BoardEvent::TableUpdated {
            table: table.clone(),
        });
        Ok(fresh)
    }

    /// Polls every `period` until the handle is aborted. Failures keep the
    /// last known snapshot and wait for the next tick.
    pub fn spawn_polling(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(err) = client.try_refresh().await {
                    warn!(error = %err, "board refresh failed; keeping last known state");
                    client.emit(BoardEvent::RefreshFailed(err.to_string()));
                }
            }
        })
    }
}

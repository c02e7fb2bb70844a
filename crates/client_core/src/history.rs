use std::sync::Arc;

use schedule::expected_duration;
use shared::{
    domain::{TableName, TeamId},
    protocol::{Correction, CorrectionFilter, NewCorrection},
};
use tracing::info;

use crate::{error::BoardError, transport::StoreTransport};

type Result<T> = std::result::Result<T, BoardError>;

/// Access to the store's record of finished corrections.
pub struct HistoryClient {
    transport: Arc<dyn StoreTransport>,
}

impl HistoryClient {
    pub fn new(transport: Arc<dyn StoreTransport>) -> Self {
        Self { transport }
    }

    /// Corrections matching `filter`. The store applies the filter too, but
    /// older stores ignore the keys they do not know, so results are narrowed
    /// again here.
    pub async fn corrections(&self, filter: &CorrectionFilter) -> Result<Vec<Correction>> {
        let mut corrections = self.transport.corrections(filter).await?;
        corrections.retain(|correction| filter.matches(correction));
        Ok(corrections)
    }

    pub async fn corrections_for_table(&self, table: &TableName) -> Result<Vec<Correction>> {
        self.corrections(&CorrectionFilter {
            table: Some(table.as_str().to_string()),
            ..CorrectionFilter::default()
        })
        .await
    }

    pub async fn add(
        &self,
        team: TeamId,
        table: &TableName,
        start_time: i64,
        end_time: i64,
    ) -> Result<()> {
        if start_time > end_time {
            return Err(BoardError::InvalidCorrection {
                start_time,
                end_time,
            });
        }
        self.transport
            .add_correction(&NewCorrection {
                team,
                table: table.as_str().to_string(),
                start_time,
                end_time,
            })
            .await?;
        info!(table = %table, start_time, end_time, "correction recorded");
        Ok(())
    }

    pub async fn delete(&self, correction_id: &str) -> Result<()> {
        self.transport.delete_correction(correction_id).await?;
        info!(correction_id, "correction deleted");
        Ok(())
    }

    /// Expected duration of the next correction at `table`, from its history.
    pub async fn expected_duration(
        &self,
        table: &TableName,
        num_significant: usize,
        apriori: i64,
    ) -> Result<i64> {
        let corrections = self.corrections_for_table(table).await?;
        Ok(expected_duration(&corrections, num_significant, apriori))
    }
}

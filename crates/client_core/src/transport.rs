use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{Table, TableName},
    protocol::{
        ActionResponse, Correction, CorrectionFilter, CorrectionsQuery, CorrectionsResponse,
        DeleteCorrection, NewCorrection, TableAction, TableDataResponse, TablesResponse,
    },
};
use tracing::debug;
use url::Url;

use crate::error::BoardError;

type Result<T> = std::result::Result<T, BoardError>;

/// Request/response contract of the authoritative coordination store.
///
/// Every method maps an `ok:false` envelope to [`BoardError::Rejected`];
/// anything that fails before an envelope is read is a transport error.
#[async_trait]
pub trait StoreTransport: Send + Sync {
    /// `GET tables/get_all?last_update=<watermark>`. The returned envelope is
    /// known to be `ok`; `changed` is left for the caller to interpret.
    async fn fetch_tables(&self, last_update: i64) -> Result<TablesResponse>;
    async fn fetch_table(&self, table: &TableName) -> Result<Table>;
    async fn submit(&self, table: &TableName, action: &TableAction) -> Result<()>;
    async fn corrections(&self, filter: &CorrectionFilter) -> Result<Vec<Correction>>;
    async fn add_correction(&self, correction: &NewCorrection) -> Result<()>;
    async fn delete_correction(&self, correction_id: &str) -> Result<()>;
}

pub struct HttpStore {
    http: Client,
    base: Url,
}

impl HttpStore {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        let mut raw = base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw)?;
        if base.cannot_be_a_base() {
            return Err(BoardError::CannotBeBase(raw));
        }
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| BoardError::CannotBeBase(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl StoreTransport for HttpStore {
    async fn fetch_tables(&self, last_update: i64) -> Result<TablesResponse> {
        let url = self.endpoint(&["tables", "get_all"])?;
        let response: TablesResponse = self
            .http
            .get(url)
            .query(&[("last_update", last_update)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(
            changed = response.changed,
            last_update = response.last_update,
            "fetched tables"
        );
        Ok(response.into_result()?)
    }

    async fn fetch_table(&self, table: &TableName) -> Result<Table> {
        let url = self.endpoint(&["table", table.as_str(), "get_all"])?;
        let response: TableDataResponse = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.into_table()?)
    }

    async fn submit(&self, table: &TableName, action: &TableAction) -> Result<()> {
        let url = self.endpoint(&["table", table.as_str(), action.endpoint()])?;
        let mut request = self.http.post(url);
        if let Some(body) = action.body() {
            request = request.json(&body);
        }
        let response: ActionResponse = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.into_result()?)
    }

    async fn corrections(&self, filter: &CorrectionFilter) -> Result<Vec<Correction>> {
        let url = self.endpoint(&["history", "get_corrections"])?;
        let response: CorrectionsResponse = self
            .http
            .get(url)
            .json(&CorrectionsQuery {
                filters: filter.clone(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.into_corrections()?)
    }

    async fn add_correction(&self, correction: &NewCorrection) -> Result<()> {
        let url = self.endpoint(&["history", "add"])?;
        let response: ActionResponse = self
            .http
            .post(url)
            .json(correction)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.into_result()?)
    }

    async fn delete_correction(&self, correction_id: &str) -> Result<()> {
        let url = self.endpoint(&["history", "delete"])?;
        let response: ActionResponse = self
            .http
            .post(url)
            .json(&DeleteCorrection {
                correction_id: correction_id.to_string(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.into_result()?)
    }
}

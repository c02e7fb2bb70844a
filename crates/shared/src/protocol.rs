use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{Table, TeamId},
    error::WireError,
};

pub const DEFAULT_REJECTION: &str = "request rejected by the coordination store";

/// Mutation intents understood by `POST table/<name>/<endpoint>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableAction {
    StartCoordination { team: TeamId },
    FinishCoordination,
    PauseCoordination,
    SwitchToCalling,
    SwitchToBusy,
    CallTeam { team: TeamId },
    SkipToNext,
    AddToQueue { team: TeamId, pos: Option<usize> },
    RemoveFromQueue { team: TeamId },
    SwapTeamsInQueue { first: TeamId, second: TeamId },
}

#[derive(Debug, Serialize)]
struct TeamBody<'a> {
    team: &'a TeamId,
}

#[derive(Debug, Serialize)]
struct AddToQueueBody<'a> {
    team: &'a TeamId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pos: Option<usize>,
}

#[derive(Debug, Serialize)]
struct SwapBody<'a> {
    teams: [&'a TeamId; 2],
}

impl TableAction {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::StartCoordination { .. } => "start_coordination",
            Self::FinishCoordination => "finish_coordination",
            Self::PauseCoordination => "pause_coordination",
            Self::SwitchToCalling => "switch_to_calling",
            Self::SwitchToBusy => "switch_to_busy",
            Self::CallTeam { .. } => "call_team",
            Self::SkipToNext => "skip_to_next",
            Self::AddToQueue { .. } => "add_to_queue",
            Self::RemoveFromQueue { .. } => "remove_from_queue",
            Self::SwapTeamsInQueue { .. } => "swap_teams_in_queue",
        }
    }

    /// JSON body sent with the request, `None` for bodiless endpoints.
    pub fn body(&self) -> Option<Value> {
        let body = match self {
            Self::StartCoordination { team }
            | Self::CallTeam { team }
            | Self::RemoveFromQueue { team } => serde_json::to_value(TeamBody { team }),
            Self::AddToQueue { team, pos } => {
                serde_json::to_value(AddToQueueBody { team, pos: *pos })
            }
            Self::SwapTeamsInQueue { first, second } => serde_json::to_value(SwapBody {
                teams: [first, second],
            }),
            Self::FinishCoordination
            | Self::PauseCoordination
            | Self::SwitchToCalling
            | Self::SwitchToBusy
            | Self::SkipToNext => return None,
        };
        body.ok()
    }
}

fn rejection(message: Option<String>) -> String {
    message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REJECTION.to_string())
}

/// Reply to `GET tables/get_all?last_update=<watermark>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesResponse {
    pub ok: bool,
    #[serde(default)]
    pub changed: bool,
    #[serde(default)]
    pub last_update: i64,
    #[serde(default)]
    pub tables: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TablesResponse {
    pub fn into_result(self) -> Result<Self, WireError> {
        if self.ok {
            Ok(self)
        } else {
            Err(WireError::Rejected(rejection(self.message)))
        }
    }

    /// Tables in store order. The store double-encodes the payload as a JSON
    /// string holding either a name-keyed map or a sequence.
    pub fn decode_tables(&self) -> Result<Vec<Table>, WireError> {
        decode_table_collection(&self.tables)
    }
}

fn decode_table_collection(raw: &Value) -> Result<Vec<Table>, WireError> {
    match raw {
        Value::String(encoded) => {
            let inner: Value = serde_json::from_str(encoded)?;
            decode_table_collection(&inner)
        }
        Value::Object(map) => map
            .values()
            .map(|table| Ok(Table::deserialize(table)?))
            .collect(),
        Value::Array(items) => items
            .iter()
            .map(|table| Ok(Table::deserialize(table)?))
            .collect(),
        Value::Null => Ok(Vec::new()),
        other => Err(WireError::Malformed(format!(
            "expected a table collection, got {other}"
        ))),
    }
}

/// Reply to `GET table/<name>/get_all`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDataResponse {
    pub ok: bool,
    #[serde(default)]
    pub table_data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TableDataResponse {
    pub fn into_table(self) -> Result<Table, WireError> {
        if !self.ok {
            return Err(WireError::Rejected(rejection(self.message)));
        }
        match self.table_data {
            Value::String(encoded) => Ok(serde_json::from_str(&encoded)?),
            Value::Null => Err(WireError::Malformed("missing table_data".to_string())),
            other => Ok(Table::deserialize(&other)?),
        }
    }
}

/// Reply to every mutation endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ActionResponse {
    pub fn accepted() -> Self {
        Self {
            ok: true,
            message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: Some(message.into()),
        }
    }

    pub fn into_result(self) -> Result<(), WireError> {
        if self.ok {
            Ok(())
        } else {
            Err(WireError::Rejected(rejection(self.message)))
        }
    }
}

/// A finished coordination as recorded in the store's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub team: TeamId,
    pub table: String,
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default)]
    pub id: String,
}

impl Correction {
    pub fn duration(&self) -> i64 {
        self.end_time - self.start_time
    }
}

/// History query. Every set field must match; ranges are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<(i64, i64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<(i64, i64)>,
}

impl CorrectionFilter {
    pub fn matches(&self, correction: &Correction) -> bool {
        let in_range = |range: Option<(i64, i64)>, value: i64| {
            range.map_or(true, |(low, high)| low <= value && value <= high)
        };
        self.identifier
            .as_ref()
            .map_or(true, |id| *id == correction.id)
            && self
                .table
                .as_ref()
                .map_or(true, |table| *table == correction.table)
            && self.team.as_ref().map_or(true, |team| *team == correction.team)
            && in_range(self.start_time, correction.start_time)
            && in_range(self.end_time, correction.end_time)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionsQuery {
    pub filters: CorrectionFilter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionsResponse {
    pub ok: bool,
    #[serde(default)]
    pub corrections: Vec<Correction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CorrectionsResponse {
    pub fn into_corrections(self) -> Result<Vec<Correction>, WireError> {
        if self.ok {
            Ok(self.corrections)
        } else {
            Err(WireError::Rejected(rejection(self.message)))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCorrection {
    pub team: TeamId,
    pub table: String,
    pub start_time: i64,
    pub end_time: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCorrection {
    pub correction_id: String,
}

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

macro_rules! name_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

name_newtype!(TableName);
name_newtype!(TeamId);

/// Coordination state of a table.
///
/// The store encodes it as a small integer; names are accepted too so that
/// table files and older payloads decode. `idle` and `nothing` are earlier
/// names of [`TableStatus::Busy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawStatus", into = "u8")]
pub enum TableStatus {
    Calling,
    Correcting,
    Busy,
}

impl TableStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Calling => 0,
            Self::Correcting => 1,
            Self::Busy => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Calling),
            1 => Some(Self::Correcting),
            2 => Some(Self::Busy),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "calling" => Some(Self::Calling),
            "correcting" | "coordination" => Some(Self::Correcting),
            "busy" | "idle" | "nothing" => Some(Self::Busy),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Calling => "calling",
            Self::Correcting => "correcting",
            Self::Busy => "busy",
        }
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<TableStatus> for u8 {
    fn from(value: TableStatus) -> Self {
        value.code()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStatus {
    Code(u8),
    Name(String),
}

impl TryFrom<RawStatus> for TableStatus {
    type Error = String;

    fn try_from(value: RawStatus) -> Result<Self, Self::Error> {
        match value {
            RawStatus::Code(code) => {
                Self::from_code(code).ok_or_else(|| format!("unknown table status code {code}"))
            }
            RawStatus::Name(name) => {
                Self::from_name(&name).ok_or_else(|| format!("unknown table status '{name}'"))
            }
        }
    }
}

/// One physical coordination station and its queue of teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: TableName,
    #[serde(default)]
    pub problem: String,
    #[serde(default, deserialize_with = "list_or_csv")]
    pub coordinators: Vec<String>,
    pub status: TableStatus,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub current_coordination_team: Option<TeamId>,
    #[serde(default)]
    pub current_coordination_start_time: Option<i64>,
    /// Seconds a single correction is expected to occupy the table.
    #[serde(default, deserialize_with = "rounded_seconds")]
    pub expected_duration: i64,
    #[serde(default)]
    pub queue: Vec<TeamId>,
}

impl Table {
    pub fn new(name: impl Into<String>, status: TableStatus, expected_duration: i64) -> Self {
        Self {
            name: TableName::new(name),
            problem: String::new(),
            coordinators: Vec::new(),
            status,
            current_coordination_team: None,
            current_coordination_start_time: None,
            expected_duration,
            queue: Vec::new(),
        }
    }

    pub fn with_queue<I, T>(mut self, teams: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TeamId>,
    {
        self.queue = teams.into_iter().map(Into::into).collect();
        self
    }

    pub fn position_of(&self, team: &TeamId) -> Option<usize> {
        self.queue.iter().position(|queued| queued == team)
    }

    pub fn contains(&self, team: &TeamId) -> bool {
        self.position_of(team).is_some()
    }

    pub fn head(&self) -> Option<&TeamId> {
        self.queue.first()
    }
}

fn list_or_csv<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrCsv {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match Option::<ListOrCsv>::deserialize(deserializer)? {
        Some(ListOrCsv::List(items)) => items,
        Some(ListOrCsv::Csv(raw)) => raw
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    })
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<TeamId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|team| team.trim().to_string())
        .filter(|team| !team.is_empty())
        .map(TeamId))
}

fn rounded_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw.map(|secs| secs.round() as i64).unwrap_or_default())
}

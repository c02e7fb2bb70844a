use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use schedule::{
    estimator::{DEFAULT_GRACE_SECS, DEFAULT_SLOT_INTERVAL_SECS, DEFAULT_TAIL_BUFFER_SECS},
    BreakCalendar, BreakInterval, EstimatorConfig,
};
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "board.toml";
const ENV_PREFIX: &str = "BOARD__";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub store_url: String,
    pub update_interval_secs: u64,
    pub grace_secs: i64,
    pub tail_buffer_secs: i64,
    pub slot_interval_secs: i64,
    pub utc_offset_hours: i32,
    /// Competition start; the board clock never reads earlier.
    pub start_time: Option<i64>,
    /// Switch a table to calling right after finishing a correction.
    pub call_next: bool,
    pub break_times: Vec<BreakInterval>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_url: "http://127.0.0.1:5000".into(),
            update_interval_secs: 10,
            grace_secs: DEFAULT_GRACE_SECS,
            tail_buffer_secs: DEFAULT_TAIL_BUFFER_SECS,
            slot_interval_secs: DEFAULT_SLOT_INTERVAL_SECS,
            utc_offset_hours: 2,
            start_time: None,
            call_next: true,
            break_times: Vec::new(),
        }
    }
}

/// `board.toml` as written by hand; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    store_url: Option<String>,
    update_interval_secs: Option<u64>,
    grace_secs: Option<i64>,
    tail_buffer_secs: Option<i64>,
    slot_interval_secs: Option<i64>,
    utc_offset_hours: Option<i32>,
    start_time: Option<i64>,
    call_next: Option<bool>,
    break_times: Option<Vec<BreakInterval>>,
}

impl Settings {
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs.max(1))
    }

    pub fn estimator_config(&self) -> EstimatorConfig {
        EstimatorConfig {
            grace: self.grace_secs,
            tail_buffer: self.tail_buffer_secs,
            slot_interval: self.slot_interval_secs,
            utc_offset_secs: self.utc_offset_hours * 3600,
            ..EstimatorConfig::default()
        }
    }

    pub fn calendar(&self) -> BreakCalendar {
        BreakCalendar::new(self.break_times.iter().copied())
    }

    /// Label offsets must name a clock reading, so strictly under a day.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(-23..=23).contains(&self.utc_offset_hours) {
            bail!(
                "utc_offset_hours must be between -23 and 23, got {}",
                self.utc_offset_hours
            );
        }
        Ok(())
    }

    fn merge_file(&mut self, file: FileSettings) {
        if let Some(v) = file.store_url {
            self.store_url = v;
        }
        if let Some(v) = file.update_interval_secs {
            self.update_interval_secs = v;
        }
        if let Some(v) = file.grace_secs {
            self.grace_secs = v;
        }
        if let Some(v) = file.tail_buffer_secs {
            self.tail_buffer_secs = v;
        }
        if let Some(v) = file.slot_interval_secs {
            self.slot_interval_secs = v;
        }
        if let Some(v) = file.utc_offset_hours {
            self.utc_offset_hours = v;
        }
        if file.start_time.is_some() {
            self.start_time = file.start_time;
        }
        if let Some(v) = file.call_next {
            self.call_next = v;
        }
        if let Some(v) = file.break_times {
            self.break_times = v;
        }
    }

    fn merge_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(&format!("{ENV_PREFIX}{key}"));

        if let Some(v) = var("STORE_URL") {
            self.store_url = v;
        }
        if let Some(v) = var("UPDATE_INTERVAL_SECS") {
            self.update_interval_secs = parse_env("UPDATE_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = var("GRACE_SECS") {
            self.grace_secs = parse_env("GRACE_SECS", &v)?;
        }
        if let Some(v) = var("TAIL_BUFFER_SECS") {
            self.tail_buffer_secs = parse_env("TAIL_BUFFER_SECS", &v)?;
        }
        if let Some(v) = var("SLOT_INTERVAL_SECS") {
            self.slot_interval_secs = parse_env("SLOT_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = var("UTC_OFFSET_HOURS") {
            self.utc_offset_hours = parse_env("UTC_OFFSET_HOURS", &v)?;
        }
        if let Some(v) = var("START_TIME") {
            self.start_time = Some(parse_env("START_TIME", &v)?);
        }
        if let Some(v) = var("CALL_NEXT") {
            self.call_next = parse_env("CALL_NEXT", &v)?;
        }
        Ok(())
    }
}

fn parse_env<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("invalid value '{raw}' for {ENV_PREFIX}{key}"))
}

/// Defaults, then the config file, then `BOARD__*` variables.
///
/// An explicit path must exist; the default `board.toml` is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let explicit = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("BOARD_CONFIG").map(PathBuf::from));
    let mut settings = Settings::default();

    match &explicit {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config '{}'", path.display()))?;
            settings.merge_file(parse_file(&raw, path)?);
        }
        None => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            if let Ok(raw) = fs::read_to_string(path) {
                settings.merge_file(parse_file(&raw, path)?);
            }
        }
    }

    settings.merge_env(|key| std::env::var(key).ok())?;
    settings.validate()?;
    Ok(settings)
}

fn parse_file(raw: &str, path: &Path) -> anyhow::Result<FileSettings> {
    toml::from_str(raw).with_context(|| format!("failed to parse config '{}'", path.display()))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

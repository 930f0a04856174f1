use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use rinse_clean::{FinalizerSet, RuleSet};
use rinse_core::{AccountConfig, DateRange};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// The whole application configuration, one TOML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncSection,
    #[serde(default)]
    pub timespan: TimespanSection,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub replacements: RuleSet,
    #[serde(default, rename = "pre-replacements")]
    pub pre_replacements: RuleSet,
    #[serde(default)]
    pub finalizer: FinalizerSet,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSection {
    /// Accounts processed in parallel; clamped to at least 1.
    pub concurrency: usize,
    /// Directory holding one `<iban>.json` per account.
    pub source_dir: PathBuf,
    /// Log every field value the cleaner changed.
    pub verbose: bool,
}

impl Default for SyncSection {
    fn default() -> Self {
        SyncSection {
            concurrency: 1,
            source_dir: PathBuf::from("transactions"),
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimespanSection {
    /// Hard floor for the fetch window, e.g. the account opening date.
    pub earliest_date: NaiveDate,
    /// How far back from today a run may look.
    pub maximum_days: u32,
}

impl Default for TimespanSection {
    fn default() -> Self {
        TimespanSection {
            earliest_date: NaiveDate::from_ymd_opt(2000, 1, 1).expect("valid date"),
            maximum_days: 30,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn window(&self, today: NaiveDate) -> DateRange {
        DateRange::sync_window(today, self.timespan.earliest_date, self.timespan.maximum_days)
    }
}

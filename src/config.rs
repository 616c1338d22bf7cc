//! `callfreq.toml` config loading.

use serde::{Deserialize, Serialize};

use std::path::Path;

use crate::{CallfreqError, CallfreqResult, DEFAULT_TICK_LABEL_PREFIX};

pub const DEFAULT_CONFIG_FILE: &str = "callfreq.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reporter {
    Pretty,
    Json,
}

impl clap::ValueEnum for Reporter {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Pretty, Self::Json]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Pretty => clap::builder::PossibleValue::new("pretty"),
            Self::Json => clap::builder::PossibleValue::new("json"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Tick labels render as `"{prefix} {tick}"`.
    #[serde(default = "default_tick_label_prefix")]
    pub tick_label_prefix: String,

    /// Memoize catalogs and series per report.
    #[serde(default = "default_memoize")]
    pub memoize: bool,

    /// Default reporter for CLI commands.
    #[serde(default = "default_reporter")]
    pub reporter: Reporter,

    /// Widest terminal chart, in columns.
    #[serde(default = "default_sparkline_width")]
    pub sparkline_width: usize,
}

fn default_tick_label_prefix() -> String {
    DEFAULT_TICK_LABEL_PREFIX.to_string()
}

fn default_memoize() -> bool {
    true
}

fn default_reporter() -> Reporter {
    Reporter::Pretty
}

fn default_sparkline_width() -> usize {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_label_prefix: default_tick_label_prefix(),
            memoize: default_memoize(),
            reporter: default_reporter(),
            sparkline_width: default_sparkline_width(),
        }
    }
}

impl Config {
    /// Loads `path`, falling back to defaults when it is missing or broken.
    pub fn load_optional(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(s) => match Self::parse(&s) {
                Ok(cfg) => cfg,
                Err(err) => {
                    tracing::warn!("failed to parse config {}: {err}", path.display());
                    Self::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                tracing::warn!("failed to read config {}: {err}", path.display());
                Self::default()
            }
        }
    }

    /// Loads an explicitly requested config; every failure is an error.
    pub fn load(path: &Path) -> CallfreqResult<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::parse(&s)
    }

    pub fn parse(s: &str) -> CallfreqResult<Self> {
        let cfg: Config = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> CallfreqResult<()> {
        if self.sparkline_width == 0 {
            return Err(CallfreqError::Config(
                "sparkline_width must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

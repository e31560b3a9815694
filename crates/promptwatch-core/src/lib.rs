use chrono::NaiveDate;
use thiserror::Error;

pub mod app_config;
pub mod breakdown;
pub mod config;
pub mod merge;
pub mod platforms;
pub mod series;
pub mod trend;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use breakdown::{compose_breakdown, percentage, CompetitorRef, EntityRoster, EntityShare};
pub use config::{load_app_config, load_app_config_from_env};
pub use merge::{merge_rows, total_counts};
pub use platforms::{load_platforms, PlatformConfig, PlatformSet, UnknownPlatform};
pub use series::{zero_filled_series, SeriesPoint};
pub use trend::{previous_period, share_trend};
pub use types::{AggRow, Counts, DateRange, DimensionFilters, EntityKey, RollupCutoff};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unsupported platform code: {0}")]
    UnsupportedPlatform(String),
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("invalid rollup cutoff time {hour:02}:{minute:02}")]
    InvalidCutoff { hour: u32, minute: u32 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read platforms file {path}: {source}")]
    PlatformsFileIo {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse platforms file: {0}")]
    PlatformsFileParse(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Validation(String),
}

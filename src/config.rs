//! Startup configuration: command-line flags with environment fallbacks.

use chrono::NaiveDate;
use clap::Parser;
use serde::Serialize;
use thiserror::Error;

use crate::demo::FailureMode;

pub const MAX_PAGE_SIZE: usize = 500;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Page size outside `1..=MAX_PAGE_SIZE` or not a number.
    #[error("page size must be a whole number in 1..=500, got {0:?}")]
    PageSize(String),

    #[error("date must be YYYY-MM-DD, got {0:?}")]
    Date(String),

    #[error("defaulter threshold must be a non-negative number of days, got {0:?}")]
    Threshold(String),
}

/// School fee desk sidecar: JSON requests on stdin, JSON responses on stdout.
#[derive(Debug, Clone, Parser, Serialize)]
#[command(name = "feedeskd", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Rows per page for list screens that do not set their own
    #[arg(long, env = "FEEDESK_PAGE_SIZE", default_value = "50", value_parser = parse_page_size)]
    pub page_size: usize,

    /// Days an overdue balance must age before the student counts as a defaulter
    #[arg(
        long,
        env = "FEEDESK_DEFAULTER_THRESHOLD_DAYS",
        default_value = "30",
        value_parser = parse_threshold
    )]
    pub defaulter_threshold_days: i64,

    /// Pin the reference date used for due-date checks (YYYY-MM-DD)
    #[arg(long, env = "FEEDESK_TODAY", value_parser = parse_date)]
    pub today: Option<NaiveDate>,

    /// Log filter directive, e.g. `debug` or `feedeskd=trace`; RUST_LOG wins when set
    #[arg(long, env = "FEEDESK_LOG")]
    pub log: Option<String>,

    /// Start the demo data source in a failing state
    #[arg(long, value_enum)]
    pub demo_failure: Option<FailureMode>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: 50,
            defaulter_threshold_days: 30,
            today: None,
            log: None,
            demo_failure: None,
        }
    }
}

impl Config {
    /// The pinned date, or the local calendar date.
    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

pub fn parse_page_size(raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if (1..=MAX_PAGE_SIZE).contains(&n) => Ok(n),
        _ => Err(ConfigError::PageSize(raw.to_string())),
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ConfigError::Date(raw.to_string()))
}

fn parse_threshold(raw: &str) -> Result<i64, ConfigError> {
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 0 => Ok(n),
        _ => Err(ConfigError::Threshold(raw.to_string())),
    }
}

//! Environment-driven application configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

const DEFAULT_DATABASE_URL: &str = "sqlite:tubeshift.db?mode=rwc";
const DEFAULT_OUTPUT_DIR: &str = "downloads";
const DEFAULT_SCAN_LIMIT: i64 = 10;
const DEFAULT_SYNC_LIMIT: i64 = 5;
const DEFAULT_SCAN_TICK_SECS: u64 = 10 * 60;
const DEFAULT_BILIUP_LIMIT: u32 = 3;

/// Application configuration, read from the environment (a `.env` file is
/// honored when present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub output_dir: PathBuf,
    /// Per-channel scan limit.
    pub scan_limit: i64,
    /// Run the rule engine over freshly scanned candidates.
    pub auto_filter: bool,
    /// Transfer filtered candidates after each scheduled sweep.
    pub auto_sync: bool,
    /// Per-sweep transfer limit when auto-sync is on.
    pub sync_limit: i64,
    /// Scheduler tick interval.
    pub scan_tick: Duration,

    pub ytdlp_binary: String,
    pub ytdlp_sleep_secs: u64,
    pub ytdlp_format: Option<String>,

    pub biliup_binary: String,
    pub biliup_cookie: PathBuf,
    pub biliup_line: Option<String>,
    pub biliup_limit: u32,
    pub biliup_title_prefix: String,
    pub biliup_tags: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env_string("DATABASE_URL", DEFAULT_DATABASE_URL),
            output_dir: PathBuf::from(env_string("TUBESHIFT_OUTPUT_DIR", DEFAULT_OUTPUT_DIR)),
            scan_limit: env_parse("TUBESHIFT_SCAN_LIMIT", DEFAULT_SCAN_LIMIT)?,
            auto_filter: env_bool("TUBESHIFT_AUTO_FILTER", true)?,
            auto_sync: env_bool("TUBESHIFT_AUTO_SYNC", false)?,
            sync_limit: env_parse("TUBESHIFT_SYNC_LIMIT", DEFAULT_SYNC_LIMIT)?,
            scan_tick: Duration::from_secs(env_parse(
                "TUBESHIFT_SCAN_TICK_SECS",
                DEFAULT_SCAN_TICK_SECS,
            )?),
            ytdlp_binary: env_string("YTDLP_BINARY", "yt-dlp"),
            ytdlp_sleep_secs: env_parse("YTDLP_SLEEP_SECS", 0)?,
            ytdlp_format: env_opt("YTDLP_FORMAT"),
            biliup_binary: env_string("BILIUP_BINARY", "biliup"),
            biliup_cookie: PathBuf::from(env_string("BILIUP_COOKIE", "cookies.json")),
            biliup_line: env_opt("BILIUP_LINE"),
            biliup_limit: env_parse("BILIUP_LIMIT", DEFAULT_BILIUP_LIMIT)?,
            biliup_title_prefix: env_string("BILIUP_TITLE_PREFIX", ""),
            biliup_tags: split_tags(&env_string("BILIUP_TAGS", "")),
        })
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::config(format!("invalid {key}={raw}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn env_bool(key: &str, default: bool) -> Result<bool> {
    match std::env::var(key) {
        Ok(raw) => parse_bool(&raw).ok_or_else(|| Error::config(format!("invalid {key}={raw}"))),
        Err(_) => Ok(default),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

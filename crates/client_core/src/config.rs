use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const SETTINGS_FILE: &str = "leaderboard.toml";
/// How often the view controller re-fetches the top list.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub base_url: String,
    pub request_timeout: Duration,
    pub refresh_interval: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            refresh_interval: REFRESH_INTERVAL,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    refresh_interval_secs: Option<u64>,
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the settings file (if present), then the environment.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.base_url {
                    settings.base_url = v;
                }
                if let Some(v) = file_cfg.request_timeout_secs.and_then(positive_secs) {
                    settings.request_timeout = v;
                }
                if let Some(v) = file_cfg.refresh_interval_secs.and_then(positive_secs) {
                    settings.refresh_interval = v;
                }
            }
            Err(err) => warn!(
                path = %path.display(),
                error = %err,
                "ignoring unreadable leaderboard settings file"
            ),
        }
    }

    if let Some(v) = env("LEADERBOARD_BASE_URL") {
        settings.base_url = v;
    }

    if let Some(v) = env("LEADERBOARD_TIMEOUT_SECS").and_then(|v| parse_secs(&v)) {
        settings.request_timeout = v;
    }
    if let Some(v) = env("LEADERBOARD_REFRESH_SECS").and_then(|v| parse_secs(&v)) {
        settings.refresh_interval = v;
    }

    settings
}

fn parse_secs(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().and_then(positive_secs)
}

// A zero period would make the refresh timer spin.
fn positive_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

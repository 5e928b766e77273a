//! Client configuration.
//!
//! Values are layered: built-in defaults, then `config.json` in the OS config
//! directory, then `TASKBOARD_*` environment variables (a `.env` file in the
//! working directory is loaded first by `main`).
//!
//! | Env Var                    | Default                 |
//! |----------------------------|-------------------------|
//! | `TASKBOARD_BASE_URL`       | `http://127.0.0.1:5000` |
//! | `TASKBOARD_PROJECT_ID`     | none                    |
//! | `TASKBOARD_TIMEOUT_SECS`   | `30`                    |
//! | `TASKBOARD_ZOOM`           | `week`                  |
//! | `TASKBOARD_SESSION_COOKIE` | none                    |
//! | `TASKBOARD_PROJECT_START`  | none (`DD.MM.YYYY`)     |
//! | `TASKBOARD_PROJECT_END`    | none (`DD.MM.YYYY`)     |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::date;
use crate::model::{RangeSource, ZoomLevel};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub project_id: Option<String>,
    pub request_timeout_secs: u64,
    pub default_zoom: ZoomLevel,
    /// Raw `Cookie` header value reused from an existing browser session.
    pub session_cookie: Option<String>,
    pub project_start: Option<String>,
    pub project_end: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: None,
            request_timeout_secs: 30,
            default_zoom: ZoomLevel::default(),
            session_cookie: None,
            project_start: None,
            project_end: None,
        }
    }
}

impl AppConfig {
    /// Load from the config file (if any) and the process environment.
    /// Problems are logged and the affected values keep their defaults.
    pub fn load() -> Self {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::from_file(&path).unwrap_or_else(|err| {
                tracing::warn!(%err, "ignoring config file");
                Self::default()
            }),
            _ => Self::default(),
        };
        for err in config.apply_overrides(|key| std::env::var(key).ok()) {
            tracing::warn!(%err, "ignoring environment override");
        }
        tracing::debug!(base_url = %config.base_url, project = ?config.project_id, "configuration loaded");
        config
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `TASKBOARD_*` overrides from `lookup`. Invalid values are skipped
    /// and returned.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Vec<ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut rejected = Vec::new();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get("TASKBOARD_BASE_URL") {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(id) = get("TASKBOARD_PROJECT_ID") {
            self.project_id = Some(id);
        }
        if let Some(raw) = get("TASKBOARD_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => rejected.push(ConfigError::InvalidValue {
                    key: "TASKBOARD_TIMEOUT_SECS",
                    value: raw,
                }),
            }
        }
        if let Some(raw) = get("TASKBOARD_ZOOM") {
            match raw.parse::<ZoomLevel>() {
                Ok(zoom) => self.default_zoom = zoom,
                Err(_) => rejected.push(ConfigError::InvalidValue {
                    key: "TASKBOARD_ZOOM",
                    value: raw,
                }),
            }
        }
        if let Some(cookie) = get("TASKBOARD_SESSION_COOKIE") {
            self.session_cookie = Some(cookie);
        }
        for (key, slot) in [
            ("TASKBOARD_PROJECT_START", &mut self.project_start),
            ("TASKBOARD_PROJECT_END", &mut self.project_end),
        ] {
            if let Some(raw) = get(key) {
                if date::parse_str(&raw).valid().is_some() {
                    *slot = Some(raw);
                } else {
                    rejected.push(ConfigError::InvalidValue { key, value: raw });
                }
            }
        }
        rejected
    }

    /// Project bounds when both ends are configured and parse, otherwise task-derived.
    pub fn range_source(&self) -> RangeSource {
        let start = date::parse(self.project_start.as_deref()).valid();
        let end = date::parse(self.project_end.as_deref()).valid();
        match (start, end) {
            (Some(start), Some(end)) => RangeSource::Project { start, end },
            _ => RangeSource::Tasks,
        }
    }
}

/// `config.json` inside the platform config directory.
pub fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "TaskboardGantt")
        .map(|dirs| dirs.config_dir().join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config: AppConfig =
            serde_json::from_str(r#"{"base_url": "http://files:8000", "default_zoom": "day"}"#).unwrap();
        assert_eq!(config.request_timeout_secs, 30);
        let rejected = config.apply_overrides(lookup(&[
            ("TASKBOARD_BASE_URL", "http://env:9000/"),
            ("TASKBOARD_PROJECT_ID", "42"),
            ("TASKBOARD_ZOOM", "year"),
        ]));
        assert!(rejected.is_empty());
        assert_eq!(config.base_url, "http://env:9000");
        assert_eq!(config.project_id.as_deref(), Some("42"));
        assert_eq!(config.default_zoom, ZoomLevel::Year);
    }

    #[test]
    fn invalid_overrides_keep_previous_values() {
        let mut config = AppConfig::default();
        let rejected = config.apply_overrides(lookup(&[
            ("TASKBOARD_TIMEOUT_SECS", "soon"),
            ("TASKBOARD_ZOOM", "decade"),
            ("TASKBOARD_PROJECT_START", "31.02.2024"),
        ]));
        assert_eq!(rejected.len(), 3);
        assert_matches!(&rejected[0], ConfigError::InvalidValue { key: "TASKBOARD_TIMEOUT_SECS", .. });
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn blank_values_are_ignored() {
        let mut config = AppConfig::default();
        let rejected = config.apply_overrides(lookup(&[("TASKBOARD_PROJECT_ID", "  ")]));
        assert!(rejected.is_empty());
        assert_eq!(config.project_id, None);
    }

    #[test]
    fn range_source_needs_both_bounds() {
        let mut config = AppConfig {
            project_start: Some("01.03.2024".into()),
            ..Default::default()
        };
        assert_eq!(config.range_source(), RangeSource::Tasks);
        config.project_end = Some("2024-06-30".into());
        assert_eq!(
            config.range_source(),
            RangeSource::Project {
                start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            }
        );
    }

    #[test]
    fn unreadable_file_reports_path() {
        let path = Path::new("/definitely/not/here/config.json");
        assert_matches!(AppConfig::from_file(path), Err(ConfigError::Io { .. }));
    }
}

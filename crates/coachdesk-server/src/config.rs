//! Server configuration loaded from `COACHDESK_*` environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use coachdesk_booking::SchedulingConfig;
use coachdesk_db::DbConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db: DbConfig,
    pub scheduling: SchedulingConfig,
    /// Seconds between attendance sweeps (default: 300).
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db: DbConfig::default(),
            scheduling: SchedulingConfig::default(),
            sweep_interval_secs: 300,
        }
    }
}

impl ServerConfig {
    /// Read the configuration from the process environment.
    ///
    /// # Environment Variables
    /// - `COACHDESK_DB_URL` (default: `127.0.0.1:8000`)
    /// - `COACHDESK_DB_NAMESPACE` (default: `coachdesk`)
    /// - `COACHDESK_DB_DATABASE` (default: `main`)
    /// - `COACHDESK_DB_USERNAME` / `COACHDESK_DB_PASSWORD` (default: `root`)
    /// - `COACHDESK_INVITE_LIFETIME_SECS` (default: 604800)
    /// - `COACHDESK_CANCELLATION_NOTICE_SECS` (default: 0)
    /// - `COACHDESK_ATTENDANCE_GRACE_SECS` (default: 86400)
    /// - `COACHDESK_SWEEP_INTERVAL_SECS` (default: 300)
    ///
    /// # Errors
    /// Returns an error if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let text = |key: &str, default: String| lookup(key).unwrap_or(default);

        let db = DbConfig {
            url: text("COACHDESK_DB_URL", defaults.db.url),
            namespace: text("COACHDESK_DB_NAMESPACE", defaults.db.namespace),
            database: text("COACHDESK_DB_DATABASE", defaults.db.database),
            username: text("COACHDESK_DB_USERNAME", defaults.db.username),
            password: text("COACHDESK_DB_PASSWORD", defaults.db.password),
        };

        let scheduling = SchedulingConfig {
            invite_lifetime_secs: number(
                &lookup,
                "COACHDESK_INVITE_LIFETIME_SECS",
                defaults.scheduling.invite_lifetime_secs,
            )?,
            cancellation_notice_secs: number(
                &lookup,
                "COACHDESK_CANCELLATION_NOTICE_SECS",
                defaults.scheduling.cancellation_notice_secs,
            )?,
            attendance_grace_secs: number(
                &lookup,
                "COACHDESK_ATTENDANCE_GRACE_SECS",
                defaults.scheduling.attendance_grace_secs,
            )?,
            ..defaults.scheduling
        };

        Ok(Self {
            db,
            scheduling,
            sweep_interval_secs: number(
                &lookup,
                "COACHDESK_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval_secs,
            )?,
        })
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

fn number<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn unset_variables_fall_back_to_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.db.namespace, "coachdesk");
        assert_eq!(config.scheduling.attendance_grace_secs, 86_400);
        assert_eq!(config.sweep_interval(), Duration::from_secs(300));
    }

    #[test]
    fn variables_override_defaults() {
        let config = from_pairs(&[
            ("COACHDESK_DB_URL", "db.internal:8000"),
            ("COACHDESK_CANCELLATION_NOTICE_SECS", "3600"),
            ("COACHDESK_SWEEP_INTERVAL_SECS", " 60 "),
        ])
        .unwrap();
        assert_eq!(config.db.url, "db.internal:8000");
        assert_eq!(config.scheduling.cancellation_notice_secs, 3600);
        assert_eq!(config.sweep_interval_secs, 60);
    }

    #[test]
    fn unparsable_numbers_are_errors() {
        let err = from_pairs(&[("COACHDESK_ATTENDANCE_GRACE_SECS", "a day")]).unwrap_err();
        assert!(err.to_string().contains("COACHDESK_ATTENDANCE_GRACE_SECS"));
    }
}

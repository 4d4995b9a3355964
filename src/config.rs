// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Environment-sourced settings for the logging subsystem.
//!
//! [`resolve`] reads the process environment (after loading a `.env` file, if one exists) and
//! validates every value once. Only an invalid global level is fatal; every other problem falls
//! back to a documented default and reports a warning through the [`Trap`].
//!
//! # Examples
//!
//! ```
//! use std::collections::HashMap;
//!
//! use fxlog::config;
//! use fxlog::config::RotationStrategy;
//! use fxlog::trap::CollectingTrap;
//!
//! let env = HashMap::from([("LOG_LEVEL", "debug"), ("LOG_ROTATION_STRATEGY", "weekly")]);
//! let trap = CollectingTrap::default();
//! let settings = config::resolve_with(|key| env.get(key).map(|v| v.to_string()), &trap).unwrap();
//!
//! assert_eq!(settings.rotation_strategy, RotationStrategy::Size);
//! assert!(trap.contains("LOG_ROTATION_STRATEGY"));
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::ConfigError;
use crate::Level;
use crate::append::rolling_file::Rotation;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

pub const LOG_LEVEL: &str = "LOG_LEVEL";
pub const LOG_ROTATION_STRATEGY: &str = "LOG_ROTATION_STRATEGY";
pub const LOG_ROTATION_SIZE_MB: &str = "LOG_ROTATION_SIZE_MB";
pub const LOG_ROTATION_TIME: &str = "LOG_ROTATION_TIME";
pub const LOG_BACKUP_COUNT: &str = "LOG_BACKUP_COUNT";
pub const LOG_FILE: &str = "LOG_FILE";
pub const DISCORD_WEBHOOK_URL: &str = "DISCORD_WEBHOOK_URL";
pub const LOG_ALERT_LEVEL: &str = "LOG_ALERT_LEVEL";
pub const LOG_ALERT_TIMEOUT_SECS: &str = "LOG_ALERT_TIMEOUT_SECS";

const DEFAULT_LOG_FILE: &str = "logs/converter.log";
const DEFAULT_SIZE_MB: u64 = 5;
const DEFAULT_BACKUP_COUNT: usize = 5;
const DEFAULT_ALERT_TIMEOUT_SECS: u64 = 5;
const BYTES_PER_MB: u64 = 1024 * 1024;

/// Webhook URLs shorter than this are rejected as malformed.
pub const MIN_WEBHOOK_URL_LEN: usize = 60;

/// How the log file rolls over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStrategy {
    /// Roll over once the active file reaches a size threshold.
    Size,
    /// Roll over at a time boundary.
    Time,
}

impl FromStr for RotationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SIZE" => Ok(RotationStrategy::Size),
            "TIME" => Ok(RotationStrategy::Time),
            _ => Err(s.to_string()),
        }
    }
}

impl fmt::Display for RotationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationStrategy::Size => f.write_str("SIZE"),
            RotationStrategy::Time => f.write_str("TIME"),
        }
    }
}

/// The time boundary of a time-based rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBoundary {
    /// Every second (`S`).
    Second,
    /// Every minute (`M`).
    Minute,
    /// Every hour (`H`).
    Hour,
    /// Every 24 hours from the start of the current file (`D`).
    Day,
    /// At local midnight (`midnight`).
    Midnight,
    /// At the local midnight that starts the given weekday, Monday being 0 (`W0`..`W6`).
    Weekday(u8),
}

impl FromStr for TimeBoundary {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_uppercase();
        match value.as_str() {
            "S" => Ok(TimeBoundary::Second),
            "M" => Ok(TimeBoundary::Minute),
            "H" => Ok(TimeBoundary::Hour),
            "D" => Ok(TimeBoundary::Day),
            "MIDNIGHT" => Ok(TimeBoundary::Midnight),
            _ => match value.strip_prefix('W').map(u8::from_str) {
                Some(Ok(day)) if day <= 6 => Ok(TimeBoundary::Weekday(day)),
                _ => Err(s.to_string()),
            },
        }
    }
}

impl fmt::Display for TimeBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeBoundary::Second => f.write_str("S"),
            TimeBoundary::Minute => f.write_str("M"),
            TimeBoundary::Hour => f.write_str("H"),
            TimeBoundary::Day => f.write_str("D"),
            TimeBoundary::Midnight => f.write_str("midnight"),
            TimeBoundary::Weekday(day) => write!(f, "W{day}"),
        }
    }
}

/// Why a webhook endpoint was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidEndpoint {
    #[error("webhook URL must use https://")]
    Scheme,
    #[error("webhook URL is too short ({len} < 60 characters)")]
    TooShort { len: usize },
    #[error("webhook URL is malformed: {0}")]
    Malformed(String),
}

/// A webhook endpoint that passed validation.
///
/// The only way to obtain one is [`WebhookUrl::parse`], so holding a `WebhookUrl` proves the
/// endpoint is eligible for the alert sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookUrl(url::Url);

impl WebhookUrl {
    /// Validate a raw endpoint.
    ///
    /// # Examples
    ///
    /// ```
    /// use fxlog::config::WebhookUrl;
    ///
    /// assert!(WebhookUrl::parse("http://short").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<WebhookUrl, InvalidEndpoint> {
        let raw = raw.trim();
        if !raw.starts_with("https://") {
            return Err(InvalidEndpoint::Scheme);
        }
        let len = raw.chars().count();
        if len < MIN_WEBHOOK_URL_LEN {
            return Err(InvalidEndpoint::TooShort { len });
        }
        url::Url::parse(raw)
            .map(WebhookUrl)
            .map_err(|err| InvalidEndpoint::Malformed(err.to_string()))
    }

    /// The validated URL.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for WebhookUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated settings, produced once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// The global minimum level.
    pub level: Level,
    pub rotation_strategy: RotationStrategy,
    /// Size threshold in bytes; only honored by [`RotationStrategy::Size`].
    pub max_bytes: u64,
    /// Only honored by [`RotationStrategy::Time`].
    pub time_boundary: TimeBoundary,
    pub backup_count: usize,
    pub log_file: PathBuf,
    /// `None` disables the alert sink.
    pub webhook: Option<WebhookUrl>,
    pub alert_level: Level,
    pub alert_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            level: Level::Info,
            rotation_strategy: RotationStrategy::Size,
            max_bytes: DEFAULT_SIZE_MB * BYTES_PER_MB,
            time_boundary: TimeBoundary::Midnight,
            backup_count: DEFAULT_BACKUP_COUNT,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            webhook: None,
            alert_level: Level::Error,
            alert_timeout: Duration::from_secs(DEFAULT_ALERT_TIMEOUT_SECS),
        }
    }
}

impl Settings {
    /// The rotation policy of the log file.
    pub fn rotation(&self) -> Rotation {
        match self.rotation_strategy {
            RotationStrategy::Size => Rotation::Size {
                max_bytes: self.max_bytes,
            },
            RotationStrategy::Time => Rotation::Time {
                boundary: self.time_boundary,
            },
        }
    }
}

/// Resolve [`Settings`] from a `.env` file and the process environment.
///
/// Warnings are written to standard error.
///
/// # Errors
///
/// Return [`ConfigError::InvalidLevel`] if `LOG_LEVEL` is set to an unsupported level.
pub fn resolve() -> Result<Settings, ConfigError> {
    // a missing .env file is the common case
    let _ = dotenvy::dotenv();
    resolve_with(|key| std::env::var(key).ok(), &DefaultTrap::default())
}

/// Resolve [`Settings`] from an arbitrary variable lookup, reporting warnings to `trap`.
///
/// # Errors
///
/// Return [`ConfigError::InvalidLevel`] if `LOG_LEVEL` is set to an unsupported level.
pub fn resolve_with<F>(lookup: F, trap: &dyn Trap) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Settings::default();

    let level = match lookup(LOG_LEVEL) {
        None => defaults.level,
        Some(value) => value
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLevel { value })?,
    };

    let rotation_strategy = match non_empty(lookup(LOG_ROTATION_STRATEGY)) {
        None => RotationStrategy::Size,
        Some(value) => value.parse().unwrap_or_else(|value| {
            trap.warn(&format!(
                "invalid {LOG_ROTATION_STRATEGY} '{value}', defaulting to 'SIZE'"
            ));
            RotationStrategy::Size
        }),
    };

    let raw_size = lookup(LOG_ROTATION_SIZE_MB);
    let raw_time = lookup(LOG_ROTATION_TIME);
    if raw_size.is_some() && raw_time.is_some() {
        let honored = match rotation_strategy {
            RotationStrategy::Size => LOG_ROTATION_SIZE_MB,
            RotationStrategy::Time => LOG_ROTATION_TIME,
        };
        trap.warn(&format!(
            "both {LOG_ROTATION_SIZE_MB} and {LOG_ROTATION_TIME} are set; \
             only {honored} is honored for rotation strategy {rotation_strategy}"
        ));
    }

    let size_mb = parse_number(raw_size, LOG_ROTATION_SIZE_MB, DEFAULT_SIZE_MB, trap);
    let max_bytes = match size_mb.checked_mul(BYTES_PER_MB) {
        Some(bytes) if bytes > 0 => bytes,
        _ => {
            trap.warn(&format!(
                "{LOG_ROTATION_SIZE_MB} '{size_mb}' is out of range, defaulting to {DEFAULT_SIZE_MB}"
            ));
            defaults.max_bytes
        }
    };

    let time_boundary = match non_empty(raw_time) {
        None => defaults.time_boundary,
        Some(value) => value.parse().unwrap_or_else(|value| {
            trap.warn(&format!(
                "invalid {LOG_ROTATION_TIME} '{value}', defaulting to 'midnight'"
            ));
            TimeBoundary::Midnight
        }),
    };

    let backup_count = parse_number(
        lookup(LOG_BACKUP_COUNT),
        LOG_BACKUP_COUNT,
        DEFAULT_BACKUP_COUNT,
        trap,
    );

    let log_file = non_empty(lookup(LOG_FILE))
        .map(PathBuf::from)
        .unwrap_or(defaults.log_file);

    let webhook = match non_empty(lookup(DISCORD_WEBHOOK_URL)) {
        None => {
            trap.warn(&format!(
                "no {DISCORD_WEBHOOK_URL} provided, webhook alerts are disabled"
            ));
            None
        }
        Some(raw) => match WebhookUrl::parse(&raw) {
            Ok(url) => Some(url),
            Err(err) => {
                trap.warn(&format!(
                    "{DISCORD_WEBHOOK_URL} appears invalid ({err}), webhook alerts are disabled"
                ));
                None
            }
        },
    };

    let alert_level = match non_empty(lookup(LOG_ALERT_LEVEL)) {
        None => defaults.alert_level,
        Some(value) => value.parse().unwrap_or_else(|_| {
            trap.warn(&format!(
                "invalid {LOG_ALERT_LEVEL} '{value}', defaulting to 'ERROR'"
            ));
            Level::Error
        }),
    };

    let timeout_secs = match parse_number(
        lookup(LOG_ALERT_TIMEOUT_SECS),
        LOG_ALERT_TIMEOUT_SECS,
        DEFAULT_ALERT_TIMEOUT_SECS,
        trap,
    ) {
        0 => {
            trap.warn(&format!(
                "{LOG_ALERT_TIMEOUT_SECS} must be positive, defaulting to {DEFAULT_ALERT_TIMEOUT_SECS}"
            ));
            DEFAULT_ALERT_TIMEOUT_SECS
        }
        n => n,
    };

    Ok(Settings {
        level,
        rotation_strategy,
        max_bytes,
        time_boundary,
        backup_count,
        log_file,
        webhook,
        alert_level,
        alert_timeout: Duration::from_secs(timeout_secs),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_number<T>(value: Option<String>, key: &str, default: T, trap: &dyn Trap) -> T
where
    T: FromStr + fmt::Display,
    T::Err: fmt::Display,
{
    match value {
        None => default,
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|err| {
            trap.warn(&format!(
                "invalid {key} '{raw}' ({err}), defaulting to {default}"
            ));
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::trap::CollectingTrap;

    const VALID_WEBHOOK: &str =
        "https://discord.com/api/webhooks/123456789012345678/abcdefghijklmnopqrstuvwxyz";

    fn resolve_env(pairs: &[(&str, &str)]) -> (Result<Settings, ConfigError>, CollectingTrap) {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let trap = CollectingTrap::default();
        let settings = resolve_with(|key| env.get(key).cloned(), &trap);
        (settings, trap)
    }

    #[test]
    fn test_defaults() {
        let (settings, trap) = resolve_env(&[]);
        let settings = settings.unwrap();
        assert_eq!(settings.level, Level::Info);
        assert_eq!(settings.rotation_strategy, RotationStrategy::Size);
        assert_eq!(settings.max_bytes, 5 * 1_048_576);
        assert_eq!(settings.time_boundary, TimeBoundary::Midnight);
        assert_eq!(settings.backup_count, 5);
        assert_eq!(settings.log_file, PathBuf::from("logs/converter.log"));
        assert_eq!(settings.webhook, None);
        assert_eq!(settings.alert_level, Level::Error);
        assert_eq!(settings.alert_timeout, Duration::from_secs(5));
        assert!(trap.contains("webhook alerts are disabled"));
    }

    #[test]
    fn test_valid_levels_are_accepted() {
        for level in Level::ALL {
            let (settings, _) = resolve_env(&[(LOG_LEVEL, level.as_str())]);
            assert_eq!(settings.unwrap().level, level);
        }
    }

    #[test]
    fn test_unsupported_level_is_fatal() {
        for value in ["TRACE", "verbose", "", "WARN"] {
            let (settings, _) = resolve_env(&[(LOG_LEVEL, value)]);
            match settings {
                Err(ConfigError::InvalidLevel { value: got }) => assert_eq!(got, value),
                other => panic!("expected InvalidLevel for {value:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_unknown_strategy_falls_back_to_size() {
        for value in ["weekly", "sized", "TIMES", "0"] {
            let (settings, trap) = resolve_env(&[(LOG_ROTATION_STRATEGY, value)]);
            assert_eq!(settings.unwrap().rotation_strategy, RotationStrategy::Size);
            assert!(trap.contains("invalid LOG_ROTATION_STRATEGY"));
        }

        let (settings, trap) = resolve_env(&[(LOG_ROTATION_STRATEGY, "time")]);
        assert_eq!(settings.unwrap().rotation_strategy, RotationStrategy::Time);
        assert!(!trap.contains("invalid LOG_ROTATION_STRATEGY"));
    }

    #[test]
    fn test_both_rotation_parameters_warn() {
        let (settings, trap) = resolve_env(&[
            (LOG_ROTATION_STRATEGY, "TIME"),
            (LOG_ROTATION_SIZE_MB, "10"),
            (LOG_ROTATION_TIME, "H"),
        ]);
        let settings = settings.unwrap();
        assert_eq!(settings.time_boundary, TimeBoundary::Hour);
        assert!(trap.contains("only LOG_ROTATION_TIME is honored"));
        assert_eq!(
            settings.rotation(),
            Rotation::Time {
                boundary: TimeBoundary::Hour
            }
        );
    }

    #[test]
    fn test_unparsable_numbers_fall_back() {
        let (settings, trap) = resolve_env(&[
            (LOG_BACKUP_COUNT, "many"),
            (LOG_ROTATION_SIZE_MB, "-3"),
            (LOG_ALERT_TIMEOUT_SECS, "0"),
        ]);
        let settings = settings.unwrap();
        assert_eq!(settings.backup_count, 5);
        assert_eq!(settings.max_bytes, 5 * 1_048_576);
        assert_eq!(settings.alert_timeout, Duration::from_secs(5));
        assert!(trap.contains("invalid LOG_BACKUP_COUNT 'many'"));
        assert!(trap.contains("invalid LOG_ROTATION_SIZE_MB '-3'"));
        assert!(trap.contains("LOG_ALERT_TIMEOUT_SECS must be positive"));
    }

    #[test]
    fn test_oversized_backup_count_falls_back() {
        let (settings, trap) = resolve_env(&[(LOG_BACKUP_COUNT, "184467440737095516160")]);
        assert_eq!(settings.unwrap().backup_count, DEFAULT_BACKUP_COUNT);
        assert!(trap.contains("invalid LOG_BACKUP_COUNT '184467440737095516160'"));
    }

    #[test]
    fn test_size_threshold_in_bytes() {
        let (settings, _) = resolve_env(&[(LOG_ROTATION_SIZE_MB, "2"), (LOG_BACKUP_COUNT, "0")]);
        let settings = settings.unwrap();
        assert_eq!(settings.max_bytes, 2 * 1_048_576);
        assert_eq!(settings.backup_count, 0);
    }

    #[test]
    fn test_time_boundaries() {
        assert_eq!("midnight".parse::<TimeBoundary>(), Ok(TimeBoundary::Midnight));
        assert_eq!("s".parse::<TimeBoundary>(), Ok(TimeBoundary::Second));
        assert_eq!("M".parse::<TimeBoundary>(), Ok(TimeBoundary::Minute));
        assert_eq!("D".parse::<TimeBoundary>(), Ok(TimeBoundary::Day));
        assert_eq!("w6".parse::<TimeBoundary>(), Ok(TimeBoundary::Weekday(6)));
        assert!("W7".parse::<TimeBoundary>().is_err());
        assert!("fortnight".parse::<TimeBoundary>().is_err());

        let (settings, trap) = resolve_env(&[(LOG_ROTATION_TIME, "fortnight")]);
        assert_eq!(settings.unwrap().time_boundary, TimeBoundary::Midnight);
        assert!(trap.contains("invalid LOG_ROTATION_TIME 'fortnight'"));
    }

    #[test]
    fn test_webhook_validation() {
        assert_eq!(WebhookUrl::parse("http://short"), Err(InvalidEndpoint::Scheme));
        assert_eq!(
            WebhookUrl::parse("https://short"),
            Err(InvalidEndpoint::TooShort { len: 13 })
        );
        assert_eq!(WebhookUrl::parse(VALID_WEBHOOK).unwrap().as_str(), VALID_WEBHOOK);

        let (settings, trap) = resolve_env(&[(DISCORD_WEBHOOK_URL, "http://short")]);
        assert_eq!(settings.unwrap().webhook, None);
        assert!(trap.contains("DISCORD_WEBHOOK_URL appears invalid"));

        let padded = format!("  {VALID_WEBHOOK}  ");
        let (settings, _) = resolve_env(&[(DISCORD_WEBHOOK_URL, padded.as_str())]);
        assert!(settings.unwrap().webhook.is_some());
    }

    #[test]
    fn test_alert_level_is_configurable() {
        let (settings, _) = resolve_env(&[(LOG_ALERT_LEVEL, "critical")]);
        assert_eq!(settings.unwrap().alert_level, Level::Critical);

        let (settings, trap) = resolve_env(&[(LOG_ALERT_LEVEL, "loud")]);
        assert_eq!(settings.unwrap().alert_level, Level::Error);
        assert!(trap.contains("invalid LOG_ALERT_LEVEL"));
    }
}

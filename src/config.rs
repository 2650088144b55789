//! Application-level configuration loading for the ledger server and the scorer.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the binaries look for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SEVEN_SECONDS_CONFIG_PATH";
/// Environment variable overriding [`AppConfig::api_base`].
const API_BASE_ENV: &str = "API_BASE";
/// Environment variable overriding [`AppConfig::port`].
const PORT_ENV: &str = "PORT";

const DEFAULT_API_BASE: &str = "http://localhost:3001";
const DEFAULT_PORT: u16 = 3001;
/// Seconds in one countdown period.
pub const DEFAULT_PERIOD: u32 = 7;
const DEFAULT_TICK: Duration = Duration::from_secs(1);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_CONVERSION_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_POINTS_PER_ACTION_POINT: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Base URL the scorer uses to reach the ledger server.
    pub api_base: String,
    /// Port the ledger server listens on.
    pub port: u16,
    /// Client-side timing of the scoring core.
    pub timing: CoreTiming,
    /// Server-side conversion clock.
    pub conversion: ConversionPolicy,
}

/// Cadences of the countdown and the reconciliation poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreTiming {
    /// Number of ticks in one countdown period.
    pub period: u32,
    /// Duration of a single countdown tick.
    pub tick: Duration,
    /// Interval between two reconciliation polls.
    pub poll_interval: Duration,
}

impl Default for CoreTiming {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            tick: DEFAULT_TICK,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// How often and at which rate the ledger turns points into action points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionPolicy {
    pub interval: Duration,
    /// Points consumed per minted action point; zero disables conversion.
    pub points_per_action_point: u64,
}

impl Default for ConversionPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_CONVERSION_INTERVAL,
            points_per_action_point: DEFAULT_POINTS_PER_ACTION_POINT,
        }
    }
}

impl AppConfig {
    /// Load the configuration from disk and the environment, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        config.with_env_overrides(env::var(API_BASE_ENV).ok(), env::var(PORT_ENV).ok())
    }

    fn with_env_overrides(mut self, api_base: Option<String>, port: Option<String>) -> Self {
        if let Some(api_base) = api_base.filter(|value| !value.trim().is_empty()) {
            self.api_base = api_base;
        }
        match port.map(|value| value.parse::<u16>()) {
            Some(Ok(port)) => self.port = port,
            Some(Err(err)) => warn!(error = %err, "ignoring invalid {PORT_ENV} override"),
            None => {}
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            port: DEFAULT_PORT,
            timing: CoreTiming::default(),
            conversion: ConversionPolicy::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    api_base: Option<String>,
    port: Option<u16>,
    countdown_period: Option<u32>,
    tick_ms: Option<u64>,
    poll_interval_ms: Option<u64>,
    conversion_interval_secs: Option<u64>,
    points_per_action_point: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            api_base: value.api_base.unwrap_or(defaults.api_base),
            port: value.port.unwrap_or(defaults.port),
            timing: CoreTiming {
                // A zero period would never let the countdown expire.
                period: value
                    .countdown_period
                    .filter(|period| *period > 0)
                    .unwrap_or(defaults.timing.period),
                tick: positive_millis(value.tick_ms).unwrap_or(defaults.timing.tick),
                poll_interval: positive_millis(value.poll_interval_ms)
                    .unwrap_or(defaults.timing.poll_interval),
            },
            conversion: ConversionPolicy {
                interval: value
                    .conversion_interval_secs
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.conversion.interval),
                points_per_action_point: value
                    .points_per_action_point
                    .unwrap_or(defaults.conversion.points_per_action_point),
            },
        }
    }
}

fn positive_millis(value: Option<u64>) -> Option<Duration> {
    value.filter(|ms| *ms > 0).map(Duration::from_millis)
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

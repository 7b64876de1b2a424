use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::monitoring::tracker::{MAX_NOTIFICATIONS, REMINDER_INTERVAL};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub monitor: MonitorConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = MonitorConfig::default();
        let monitor = MonitorConfig {
            term: env::var("SEATWATCH_TERM").unwrap_or(defaults.term),
            ntfy_topic: env::var("SEATWATCH_NTFY_TOPIC").unwrap_or(defaults.ntfy_topic),
            ntfy_url: env::var("SEATWATCH_NTFY_URL").unwrap_or(defaults.ntfy_url),
            source_url: env::var("SEATWATCH_SOURCE_URL").unwrap_or(defaults.source_url),
            reconcile_interval: seconds_var(
                "SEATWATCH_RECONCILE_SECS",
                defaults.reconcile_interval,
            )?,
            reminder_tick: seconds_var("SEATWATCH_REMINDER_TICK_SECS", defaults.reminder_tick)?,
            fetch_timeout: seconds_var("SEATWATCH_FETCH_TIMEOUT_SECS", defaults.fetch_timeout)?,
            delivery_timeout: seconds_var(
                "SEATWATCH_DELIVERY_TIMEOUT_SECS",
                defaults.delivery_timeout,
            )?,
            ..defaults
        };
        monitor.validate()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            monitor,
        })
    }
}

fn seconds_var(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(ConfigError::InvalidInterval { name }),
        },
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Seat monitor cadences, limits, and external endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub term: String,
    pub ntfy_topic: String,
    pub ntfy_url: String,
    pub source_url: String,
    pub reconcile_interval: Duration,
    pub reminder_tick: Duration,
    pub fetch_timeout: Duration,
    pub delivery_timeout: Duration,
    pub max_notifications: u32,
    pub reminder_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            term: "2257".to_string(),
            ntfy_topic: String::new(),
            ntfy_url: "https://ntfy.sh".to_string(),
            source_url: "http://127.0.0.1:8080/classes".to_string(),
            reconcile_interval: Duration::from_secs(8 * 60),
            reminder_tick: Duration::from_secs(5 * 60),
            fetch_timeout: Duration::from_secs(20),
            delivery_timeout: Duration::from_secs(10),
            max_notifications: MAX_NOTIFICATIONS,
            reminder_interval: REMINDER_INTERVAL,
        }
    }
}

impl MonitorConfig {
    /// Reminder ticks must run at least once per reminder window or reminders drift late.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reminder_tick.is_zero() || self.reminder_tick > self.reminder_interval {
            return Err(ConfigError::ReminderTickTooSlow {
                tick: self.reminder_tick,
                window: self.reminder_interval,
            });
        }
        if self.reconcile_interval.is_zero() {
            return Err(ConfigError::InvalidInterval {
                name: "SEATWATCH_RECONCILE_SECS",
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidInterval { name: &'static str },
    ReminderTickTooSlow { tick: Duration, window: Duration },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidInterval { name } => {
                write!(f, "{name} must be a positive number of seconds")
            }
            ConfigError::ReminderTickTooSlow { tick, window } => write!(
                f,
                "reminder tick ({}s) must be non-zero and no longer than the reminder window ({}s)",
                tick.as_secs(),
                window.as_secs()
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidInterval { .. }
            | ConfigError::ReminderTickTooSlow { .. } => None,
        }
    }
}

/// Serializes tests that read or mutate process environment variables.
#[cfg(test)]
pub(crate) fn env_guard() -> &'static std::sync::Mutex<()> {
    static GUARD: std::sync::OnceLock<std::sync::Mutex<()>> = std::sync::OnceLock::new();
    GUARD.get_or_init(|| std::sync::Mutex::new(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn reset_env() {
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "SEATWATCH_TERM",
            "SEATWATCH_NTFY_TOPIC",
            "SEATWATCH_NTFY_URL",
            "SEATWATCH_SOURCE_URL",
            "SEATWATCH_RECONCILE_SECS",
            "SEATWATCH_REMINDER_TICK_SECS",
            "SEATWATCH_FETCH_TIMEOUT_SECS",
            "SEATWATCH_DELIVERY_TIMEOUT_SECS",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.monitor.term, "2257");
        assert_eq!(config.monitor.reconcile_interval, Duration::from_secs(480));
        assert_eq!(config.monitor.reminder_tick, Duration::from_secs(300));
        assert_eq!(config.monitor.max_notifications, 10);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 5000));
        reset_env();
    }

    #[test]
    fn rejects_reminder_tick_longer_than_window() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SEATWATCH_REMINDER_TICK_SECS", "7200");
        let err = AppConfig::load().expect_err("tick longer than an hour is rejected");
        assert!(matches!(err, ConfigError::ReminderTickTooSlow { .. }));
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_intervals() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SEATWATCH_RECONCILE_SECS", "soon");
        let err = AppConfig::load().expect_err("interval must be numeric");
        assert!(matches!(
            err,
            ConfigError::InvalidInterval {
                name: "SEATWATCH_RECONCILE_SECS"
            }
        ));
        reset_env();
    }
}

use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::workflows::gazette::VolumeMode;
use crate::workflows::reconcile::{ThresholdError, Thresholds, DEFAULT_ACCEPT_THRESHOLD};

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
    pub reconcile: ReconcileConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            reconcile: ReconcileConfig::from_env()?,
        })
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

/// Matching, persistence, and run budget settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileConfig {
    pub accept_threshold: f64,
    pub batch_size: usize,
    pub run_timeout: Duration,
    pub volume_mode: VolumeMode,
    pub snapshot_path: Option<PathBuf>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            accept_threshold: DEFAULT_ACCEPT_THRESHOLD,
            batch_size: 500,
            run_timeout: Duration::from_secs(30),
            volume_mode: VolumeMode::Global,
            snapshot_path: None,
        }
    }
}

impl ReconcileConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let accept_threshold = match env::var("RECON_ACCEPT_THRESHOLD") {
            Ok(value) => value
                .trim()
                .parse::<f64>()
                .map_err(|_| ConfigError::invalid("RECON_ACCEPT_THRESHOLD", &value))?,
            Err(_) => defaults.accept_threshold,
        };
        Thresholds::with_accept(accept_threshold)
            .map_err(|source| ConfigError::InvalidThreshold { source })?;

        let batch_size = match env::var("RECON_BATCH_SIZE") {
            Ok(value) => value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| ConfigError::invalid("RECON_BATCH_SIZE", &value))?,
            Err(_) => defaults.batch_size,
        };

        let run_timeout = match env::var("RECON_RUN_TIMEOUT_SECS") {
            Ok(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| ConfigError::invalid("RECON_RUN_TIMEOUT_SECS", &value))?,
            Err(_) => defaults.run_timeout,
        };

        let volume_mode = match env::var("RECON_VOLUME_MODE") {
            Ok(value) => VolumeMode::parse(&value)
                .ok_or_else(|| ConfigError::invalid("RECON_VOLUME_MODE", &value))?,
            Err(_) => defaults.volume_mode,
        };

        let snapshot_path = env::var("RECON_SNAPSHOT_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            accept_threshold,
            batch_size,
            run_timeout,
            volume_mode,
            snapshot_path,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { variable: &'static str, value: String },
    InvalidThreshold { source: ThresholdError },
}

impl ConfigError {
    fn invalid(variable: &'static str, value: &str) -> Self {
        Self::InvalidValue {
            variable,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { variable, value } => {
                write!(f, "{variable} has an invalid value '{value}'")
            }
            ConfigError::InvalidThreshold { source } => {
                write!(f, "RECON_ACCEPT_THRESHOLD is unusable: {source}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidValue { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidThreshold { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for variable in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "RECON_ACCEPT_THRESHOLD",
            "RECON_BATCH_SIZE",
            "RECON_RUN_TIMEOUT_SECS",
            "RECON_VOLUME_MODE",
            "RECON_SNAPSHOT_PATH",
        ] {
            env::remove_var(variable);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.reconcile, ReconcileConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn reads_reconcile_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RECON_ACCEPT_THRESHOLD", "0.9");
        env::set_var("RECON_BATCH_SIZE", "50");
        env::set_var("RECON_RUN_TIMEOUT_SECS", "5");
        env::set_var("RECON_VOLUME_MODE", "block");
        env::set_var("RECON_SNAPSHOT_PATH", "/tmp/matches.json");
        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.reconcile.accept_threshold, 0.9);
        assert_eq!(config.reconcile.batch_size, 50);
        assert_eq!(config.reconcile.run_timeout, Duration::from_secs(5));
        assert_eq!(config.reconcile.volume_mode, VolumeMode::BlockLocal);
        assert_eq!(
            config.reconcile.snapshot_path,
            Some(PathBuf::from("/tmp/matches.json"))
        );
    }

    #[test]
    fn threshold_below_review_is_a_configuration_error() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RECON_ACCEPT_THRESHOLD", "0.3");
        let error = AppConfig::load().expect_err("inverted thresholds");
        reset_env();
        assert!(matches!(error, ConfigError::InvalidThreshold { .. }));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RECON_BATCH_SIZE", "0");
        let error = AppConfig::load().expect_err("zero batch size");
        reset_env();
        assert_eq!(
            error.to_string(),
            "RECON_BATCH_SIZE has an invalid value '0'"
        );
    }
}

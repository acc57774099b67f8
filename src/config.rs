//! Configuration using Figment.
//!
//! Configuration is layered, later sources overriding earlier ones:
//! 1. built-in defaults ([`PlotConfig::default`])
//! 2. a TOML file (default `config/plot.toml`; a missing file is not an error)
//! 3. environment variables prefixed with `REMOTE_PLOT_`, nested with `__`
//!
//! # Example
//! ```no_run
//! use remote_plot::config::PlotConfig;
//!
//! // REMOTE_PLOT_SERVER__PORT=6000 overrides [server] port
//! let config = PlotConfig::load()?;
//! config.validate()?;
//! println!("Listening on {}", config.server.address());
//! # Ok::<(), remote_plot::error::PlotError>(())
//! ```

use crate::data::palette::{Palette, DEFAULT_PALETTE};
use crate::error::{PlotError, PlotResult};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/plot.toml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "REMOTE_PLOT_";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Application settings
    pub application: ApplicationConfig,
    /// gRPC listener and worker pool
    pub server: ServerConfig,
    /// Producer → consumer queue
    pub bridge: BridgeConfig,
    /// Plot defaults
    pub plot: PlotSettings,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Application name
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "Remote Plot".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// gRPC server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// TCP port
    pub port: u16,
    /// Maximum concurrent calls (unary and streaming)
    pub max_workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 50051,
            max_workers: 10,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for parsing into a socket address.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Dispatch bridge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Maximum queued events
    pub capacity: usize,
    /// How long a producer waits for queue space before failing the call
    pub send_timeout_ms: u64,
    /// How long a call waits for a worker slot or for the consumer's answer
    pub reply_timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            send_timeout_ms: 50,
            reply_timeout_ms: 2000,
        }
    }
}

impl BridgeConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

/// Plot defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSettings {
    /// Window length for axes registered with a non-positive sample count
    pub default_capacity: usize,
    /// Largest window an axis may request; larger requests are clamped
    pub max_capacity: usize,
    /// Native window title
    pub window_title: String,
    /// Colors handed out to signals without a usable color
    pub palette: Vec<String>,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            default_capacity: 100,
            max_capacity: 100_000,
            window_title: "gRPC Remote Plotter".to_string(),
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl PlotSettings {
    /// Builds the configured palette.
    pub fn palette(&self) -> PlotResult<Palette> {
        Palette::from_tokens(&self.palette)
    }

    /// Default capacity as a non-zero value.
    pub fn default_capacity(&self) -> PlotResult<NonZeroUsize> {
        NonZeroUsize::new(self.default_capacity).ok_or_else(|| {
            PlotError::Configuration("plot.default_capacity must be at least 1".to_string())
        })
    }
}

impl PlotSettings {
    /// Upper bound on axis windows as a non-zero value.
    pub fn max_capacity(&self) -> PlotResult<NonZeroUsize> {
        NonZeroUsize::new(self.max_capacity).ok_or_else(|| {
            PlotError::Configuration("plot.max_capacity must be at least 1".to_string())
        })
    }
}

impl PlotConfig {
    /// Load configuration from `config/plot.toml` and environment variables.
    pub fn load() -> PlotResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path.
    pub fn load_from<P: AsRef<Path>>(path: P) -> PlotResult<Self> {
        Self::figment(path.as_ref()).extract().map_err(PlotError::from)
    }

    /// The layered provider stack, exposed for tests and tooling.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(PlotConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> PlotResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(PlotError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.server.max_workers == 0 {
            return Err(PlotError::Configuration(
                "server.max_workers must be at least 1".to_string(),
            ));
        }

        if self.bridge.capacity == 0 {
            return Err(PlotError::Configuration(
                "bridge.capacity must be at least 1".to_string(),
            ));
        }

        if self.plot.default_capacity()? > self.plot.max_capacity()? {
            return Err(PlotError::Configuration(format!(
                "plot.default_capacity ({}) exceeds plot.max_capacity ({})",
                self.plot.default_capacity, self.plot.max_capacity
            )));
        }
        self.plot.palette().map_err(|e| {
            PlotError::Configuration(format!("plot.palette is invalid: {e}"))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = PlotConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 50051);
        assert_eq!(config.server.max_workers, 10);
        assert_eq!(config.plot.default_capacity, 100);
        assert_eq!(config.plot.max_capacity, 100_000);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlotConfig::figment(&dir.path().join("absent.toml"))
            .extract::<PlotConfig>()
            .unwrap();
        assert_eq!(config, PlotConfig::default());
    }

    #[test]
    fn file_overrides_defaults_partially() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r##"
[server]
port = 6001

[bridge]
capacity = 16

[plot]
palette = ["#ff8800", "k"]
"##
        )
        .unwrap();

        let config: PlotConfig = Figment::from(Serialized::defaults(PlotConfig::default()))
            .merge(Toml::file(file.path()))
            .extract()
            .unwrap();
        assert_eq!(config.server.port, 6001);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.bridge.capacity, 16);
        assert_eq!(config.bridge.send_timeout_ms, 50);
        assert_eq!(config.plot.palette, vec!["#ff8800", "k"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("plot.toml", "[server]\nport = 7000\n")?;
            jail.set_env("REMOTE_PLOT_SERVER__PORT", "7100");
            jail.set_env("REMOTE_PLOT_APPLICATION__LOG_LEVEL", "debug");
            let config = PlotConfig::load_from("plot.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.server.port, 7100);
            assert_eq!(config.application.log_level, "debug");
            Ok(())
        });
    }

    #[test]
    fn rejects_invalid_settings() {
        let mut config = PlotConfig::default();
        config.application.log_level = "loud".into();
        assert!(config.validate().is_err());

        let mut config = PlotConfig::default();
        config.server.max_workers = 0;
        assert!(config.validate().is_err());

        let mut config = PlotConfig::default();
        config.bridge.capacity = 0;
        assert!(config.validate().is_err());

        let mut config = PlotConfig::default();
        config.plot.default_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = PlotConfig::default();
        config.plot.max_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = PlotConfig::default();
        config.plot.max_capacity = 50;
        assert!(config.validate().is_err());

        let mut config = PlotConfig::default();
        config.plot.palette = vec!["r".into(), "chartreuse-ish".into()];
        assert!(config.validate().is_err());

        let mut config = PlotConfig::default();
        config.plot.palette.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn address_brackets_ipv6() {
        let mut server = ServerConfig::default();
        assert_eq!(server.address(), "0.0.0.0:50051");
        server.host = "::".into();
        assert_eq!(server.address(), "[::]:50051");
    }
}

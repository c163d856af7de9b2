//! Daemon configuration

use doccontrol_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Engine tunables
    #[serde(default)]
    pub engine: EngineConfig,

    /// Effectivity sweep trigger
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Signature service
    #[serde(default)]
    pub signing: SigningConfig,

    /// Role table used for RBAC decisions
    #[serde(default)]
    pub access: AccessConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sweep trigger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between effectivity sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Run one sweep immediately at startup, catching up on missed windows
    #[serde(default = "default_true")]
    pub run_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            run_on_start: true,
        }
    }
}

/// Signature service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Hex-encoded 32 byte Ed25519 seed. A fresh key is generated when unset.
    #[serde(default)]
    pub key_seed_hex: Option<String>,
}

/// RBAC configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Grant every permission to every actor
    #[serde(default)]
    pub allow_all: bool,

    /// Role name -> actors holding it.
    /// Known roles: author, reviewer, approver, document_controller.
    #[serde(default)]
    pub roles: HashMap<String, Vec<String>>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration from file
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // DOCCONTROL__SCHEDULER__SWEEP_INTERVAL_SECS=60
        builder = builder.add_source(
            config::Environment::with_prefix("DOCCONTROL")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

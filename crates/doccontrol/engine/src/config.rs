//! Engine configuration

use serde::{Deserialize, Serialize};

/// Tunables for the document control engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long a due effectivity event may stay pending before it is
    /// reported as a missed window
    #[serde(default = "default_grace_window_hours")]
    pub grace_window_hours: i64,

    /// Consecutive audit delivery failures before escalating to an error
    #[serde(default = "default_audit_failure_alert_threshold")]
    pub audit_failure_alert_threshold: u32,

    /// Zero-padded width of the numeric part of document numbers
    #[serde(default = "default_document_number_width")]
    pub document_number_width: usize,

    /// Actor recorded on steps the engine performs itself
    #[serde(default = "default_system_actor")]
    pub system_actor: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grace_window_hours: default_grace_window_hours(),
            audit_failure_alert_threshold: default_audit_failure_alert_threshold(),
            document_number_width: default_document_number_width(),
            system_actor: default_system_actor(),
        }
    }
}

impl EngineConfig {
    pub fn grace_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.grace_window_hours)
    }
}

fn default_grace_window_hours() -> i64 {
    24
}

fn default_audit_failure_alert_threshold() -> u32 {
    3
}

fn default_document_number_width() -> usize {
    6
}

fn default_system_actor() -> String {
    "system".to_string()
}

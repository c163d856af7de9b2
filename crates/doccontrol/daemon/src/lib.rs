//! Host process for the document control engine.
//!
//! Wires the engine to concrete collaborators (Ed25519 signing, a
//! role-table RBAC, log-backed audit and notification sinks) and drives
//! the effectivity sweep on a timer.

#![deny(unsafe_code)]

pub mod access;
pub mod config;
pub mod error;
pub mod signing;
pub mod sinks;
pub mod trigger;

pub use access::RoleTableAccessControl;
pub use config::DaemonConfig;
pub use error::{DaemonError, DaemonResult};
pub use signing::Ed25519SignatureService;
pub use sinks::{LogNotifier, TracingAuditSink};
pub use trigger::{SweepReport, SweepTrigger};

use doccontrol_engine::{Collaborators, DocumentControl, InMemoryContentStore};
use std::sync::Arc;

/// Build the engine described by `config`
pub fn build_engine(config: &DaemonConfig) -> DaemonResult<DocumentControl> {
    let signer = match config.signing.key_seed_hex.as_deref() {
        Some(seed) => Ed25519SignatureService::from_seed_hex(seed)?,
        None => {
            tracing::warn!("No signing key configured, generated an ephemeral key");
            Ed25519SignatureService::generate()
        }
    };
    tracing::info!(public_key = %signer.public_key_hex(), "Signature service ready");

    let collaborators = Collaborators {
        content: Arc::new(InMemoryContentStore::new()),
        access: Arc::new(RoleTableAccessControl::from_config(&config.access)),
        signer: Arc::new(signer),
        audit: Arc::new(TracingAuditSink::new()),
        notifier: Arc::new(LogNotifier::new()),
    };
    Ok(DocumentControl::new(config.engine.clone(), collaborators))
}

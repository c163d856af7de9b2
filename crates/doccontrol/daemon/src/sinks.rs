//! Audit and notification sinks that write to the log stream

use doccontrol_engine::{AuditSink, CollaboratorError, Notifier};
use doccontrol_types::{ActorId, AuditEvent, NotificationEvent};
use std::sync::atomic::{AtomicU64, Ordering};

/// Writes every audit event as one structured record on the `audit` target
#[derive(Default)]
pub struct TracingAuditSink {
    recorded: AtomicU64,
}

impl TracingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> u64 {
        self.recorded.load(Ordering::Relaxed)
    }
}

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) -> Result<(), CollaboratorError> {
        let kind = serde_json::to_string(&event.kind)
            .map_err(|e| CollaboratorError::Rejected(e.to_string()))?;
        tracing::info!(
            target: "audit",
            audit_id = %event.id,
            kind = %kind,
            document_id = %event.document_id,
            version_id = ?event.version_id.as_ref().map(|v| v.as_str()),
            workflow_id = ?event.workflow_id.as_ref().map(|w| w.as_str()),
            actor = %event.actor,
            occurred_at = %event.occurred_at,
            "{}",
            event.description
        );
        self.recorded.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Logs notifications instead of delivering them
#[derive(Default)]
pub struct LogNotifier {
    sent: AtomicU64,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

impl Notifier for LogNotifier {
    fn notify(
        &self,
        recipients: &[ActorId],
        event: &NotificationEvent,
    ) -> Result<(), CollaboratorError> {
        if recipients.is_empty() {
            return Err(CollaboratorError::Rejected("no recipients".into()));
        }
        let recipients: Vec<&str> = recipients.iter().map(|r| r.as_str()).collect();
        tracing::info!(
            target: "notify",
            document = %event.document_number,
            kind = ?event.kind,
            recipients = ?recipients,
            "Notification"
        );
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

//! Audit dispatch
//!
//! Audit events are handed to the sink after the state change they
//! describe has been committed. Delivery failures never roll a change
//! back: they are logged and counted, and escalate to `error!` once the
//! sink has failed `alert_threshold` times in a row.

use crate::collaborators::AuditSink;
use doccontrol_types::AuditEvent;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

pub struct AuditDispatcher {
    sink: Arc<dyn AuditSink>,
    alert_threshold: u32,
    consecutive_failures: AtomicU32,
    total_failures: AtomicU64,
}

impl AuditDispatcher {
    pub fn new(sink: Arc<dyn AuditSink>, alert_threshold: u32) -> Self {
        Self {
            sink,
            alert_threshold,
            consecutive_failures: AtomicU32::new(0),
            total_failures: AtomicU64::new(0),
        }
    }

    pub fn dispatch(&self, event: &AuditEvent) {
        match self.sink.record(event) {
            Ok(()) => {
                self.consecutive_failures.store(0, Ordering::SeqCst);
            }
            Err(e) => {
                let consecutive = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                self.total_failures.fetch_add(1, Ordering::SeqCst);
                if consecutive >= self.alert_threshold {
                    tracing::error!(
                        event_id = %event.id,
                        document_id = %event.document_id,
                        consecutive,
                        error = %e,
                        "Audit sink failing persistently"
                    );
                } else {
                    tracing::warn!(
                        event_id = %event.id,
                        document_id = %event.document_id,
                        consecutive,
                        error = %e,
                        "Audit delivery failed"
                    );
                }
            }
        }
    }

    pub fn dispatch_all(&self, events: &[AuditEvent]) {
        for event in events {
            self.dispatch(event);
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::SeqCst)
    }

    pub fn total_failures(&self) -> u64 {
        self.total_failures.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::RecordingAuditSink;
    use doccontrol_types::{ActorId, AuditEventKind, DocumentId};

    fn event() -> AuditEvent {
        AuditEvent::new(
            AuditEventKind::DocumentCreated,
            DocumentId::new("doc"),
            ActorId::new("alice"),
            "created",
        )
    }

    #[test]
    fn failures_are_counted_and_reset() {
        let sink = Arc::new(RecordingAuditSink::new());
        let dispatcher = AuditDispatcher::new(sink.clone(), 2);

        sink.set_failing(true);
        dispatcher.dispatch(&event());
        dispatcher.dispatch(&event());
        dispatcher.dispatch(&event());
        assert_eq!(dispatcher.consecutive_failures(), 3);
        assert_eq!(sink.len(), 0);

        sink.set_failing(false);
        dispatcher.dispatch(&event());
        assert_eq!(dispatcher.consecutive_failures(), 0);
        assert_eq!(dispatcher.total_failures(), 3);
        assert_eq!(sink.len(), 1);
    }
}

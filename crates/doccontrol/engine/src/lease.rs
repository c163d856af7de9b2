//! Per-document workflow leases
//!
//! A document may carry at most one active workflow. The lease is taken
//! when a workflow starts and released when it completes or terminates.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use doccontrol_types::{DocControlError, DocControlResult, DocumentId, WorkflowInstanceId};

#[derive(Debug, Default)]
pub struct LeaseTable {
    leases: DashMap<DocumentId, WorkflowInstanceId>,
}

impl LeaseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lease on `document_id` for `workflow_id`
    pub fn acquire(
        &self,
        document_id: &DocumentId,
        workflow_id: &WorkflowInstanceId,
    ) -> DocControlResult<()> {
        match self.leases.entry(document_id.clone()) {
            Entry::Occupied(holder) => Err(DocControlError::StateTransition(format!(
                "workflow already active on document {}: {}",
                document_id,
                holder.get()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(workflow_id.clone());
                Ok(())
            }
        }
    }

    /// Release the lease if `workflow_id` holds it; returns whether it did
    pub fn release(&self, document_id: &DocumentId, workflow_id: &WorkflowInstanceId) -> bool {
        self.leases
            .remove_if(document_id, |_, holder| holder == workflow_id)
            .is_some()
    }

    pub fn holder(&self, document_id: &DocumentId) -> Option<WorkflowInstanceId> {
        self.leases.get(document_id).map(|h| h.value().clone())
    }

    pub fn is_held_by(&self, document_id: &DocumentId, workflow_id: &WorkflowInstanceId) -> bool {
        self.leases
            .get(document_id)
            .map(|h| h.value() == workflow_id)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.leases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leases.is_empty()
    }
}

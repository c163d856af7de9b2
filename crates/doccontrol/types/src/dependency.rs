//! Dependency edges between documents

use crate::{ActorId, DocumentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `from` depends on `to`: `from`'s validity presumes `to` is effective
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from_document_id: DocumentId,
    pub to_document_id: DocumentId,
    pub created_by: ActorId,
    pub created_at: DateTime<Utc>,
}

impl DependencyEdge {
    pub fn new(from: DocumentId, to: DocumentId, created_by: ActorId) -> Self {
        Self {
            from_document_id: from,
            to_document_id: to,
            created_by,
            created_at: Utc::now(),
        }
    }

    pub fn connects(&self, from: &DocumentId, to: &DocumentId) -> bool {
        &self.from_document_id == from && &self.to_document_id == to
    }
}

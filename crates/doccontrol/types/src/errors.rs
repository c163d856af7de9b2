//! Error taxonomy for the document control core

use crate::{ActorId, DocumentId, EffectivityEventId, Permission, VersionId, WorkflowInstanceId};
use chrono::{DateTime, Utc};

/// Errors returned by document control operations.
///
/// Except for `SchedulerMissedWindow`, which is an operational alert,
/// every error means no state was changed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocControlError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Illegal transition: {0}")]
    StateTransition(String),

    #[error("Document {document_id} is blocked by active dependents: {}", join_ids(.dependents))]
    DependencyBlocked {
        document_id: DocumentId,
        dependents: Vec<DocumentId>,
    },

    #[error("Concurrent modification of document {document_id}: expected stamp {expected}, found {actual}")]
    ConcurrencyConflict {
        document_id: DocumentId,
        expected: u64,
        actual: u64,
    },

    #[error("Signing failed: {0}")]
    Signature(String),

    #[error("Actor {actor} lacks permission {permission}{}", on_document(.document_id))]
    Authorization {
        actor: ActorId,
        permission: Permission,
        document_id: Option<DocumentId>,
    },

    #[error("Effectivity event {event_id} for version {version_id} was due at {due} and is still pending at {detected_at}")]
    SchedulerMissedWindow {
        event_id: EffectivityEventId,
        version_id: VersionId,
        due: DateTime<Utc>,
        detected_at: DateTime<Utc>,
    },

    #[error("Document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error("Version not found: {0}")]
    VersionNotFound(VersionId),

    #[error("Workflow not found: {0}")]
    WorkflowNotFound(WorkflowInstanceId),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal lock poisoned")]
    LockError,
}

/// Coarse error class, for callers that map errors to responses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    StateTransition,
    DependencyBlocked,
    ConcurrencyConflict,
    Signature,
    Authorization,
    SchedulerMissedWindow,
    NotFound,
    Internal,
}

impl DocControlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::StateTransition(_) => ErrorKind::StateTransition,
            Self::DependencyBlocked { .. } => ErrorKind::DependencyBlocked,
            Self::ConcurrencyConflict { .. } => ErrorKind::ConcurrencyConflict,
            Self::Signature(_) => ErrorKind::Signature,
            Self::Authorization { .. } => ErrorKind::Authorization,
            Self::SchedulerMissedWindow { .. } => ErrorKind::SchedulerMissedWindow,
            Self::DocumentNotFound(_) | Self::VersionNotFound(_) | Self::WorkflowNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Storage(_) | Self::LockError => ErrorKind::Internal,
        }
    }

    /// Whether the caller may retry the same request after re-reading state
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrencyConflict { .. } | Self::Signature(_)
        )
    }
}

fn join_ids(ids: &[DocumentId]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn on_document(document_id: &Option<DocumentId>) -> String {
    match document_id {
        Some(id) => format!(" on document {}", id),
        None => String::new(),
    }
}

/// Result type alias for document control operations
pub type DocControlResult<T> = Result<T, DocControlError>;

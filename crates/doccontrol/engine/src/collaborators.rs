//! Contracts for the collaborators that live outside the core
//!
//! The engine never stores file content, evaluates roles, produces
//! signatures, persists audit records or delivers messages itself. It
//! talks to those services through the narrow traits below.

use doccontrol_types::{
    ActorId, AuditEvent, ContentRef, DocumentId, NotificationEvent, Permission, SignatureRef,
};
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("not found: {0}")]
    NotFound(String),
}

/// Blob storage for document content
pub trait ContentStore: Send + Sync {
    fn put(&self, bytes: Vec<u8>) -> Result<ContentRef, CollaboratorError>;

    fn get(&self, content_ref: &ContentRef) -> Result<Vec<u8>, CollaboratorError>;
}

/// Role-based access control.
///
/// `document_id` is `None` for actions that are not yet bound to a
/// document (registering a new one).
pub trait AccessControl: Send + Sync {
    fn can_perform(
        &self,
        actor: &ActorId,
        permission: Permission,
        document_id: Option<&DocumentId>,
    ) -> bool;
}

/// Electronic signature provider
pub trait SignatureService: Send + Sync {
    fn sign(&self, payload: &[u8]) -> Result<SignatureRef, CollaboratorError>;

    fn verify(&self, signature_ref: &SignatureRef) -> bool;
}

/// Immutable audit trail
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent) -> Result<(), CollaboratorError>;
}

/// User notification delivery
pub trait Notifier: Send + Sync {
    fn notify(
        &self,
        recipients: &[ActorId],
        event: &NotificationEvent,
    ) -> Result<(), CollaboratorError>;
}

/// The full set of collaborators an engine is wired with
#[derive(Clone)]
pub struct Collaborators {
    pub content: Arc<dyn ContentStore>,
    pub access: Arc<dyn AccessControl>,
    pub signer: Arc<dyn SignatureService>,
    pub audit: Arc<dyn AuditSink>,
    pub notifier: Arc<dyn Notifier>,
}

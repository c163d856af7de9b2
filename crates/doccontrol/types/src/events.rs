//! Outbound events: audit records and user notifications

use crate::{ActorId, DocumentId, VersionId, VersionNumber, WorkflowInstanceId, WorkflowState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Audit ────────────────────────────────────────────────────────────

/// What a committed change did
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AuditEventKind {
    DocumentCreated,
    WorkflowStarted,
    Transition {
        from: WorkflowState,
        to: WorkflowState,
    },
    VersionEffective,
    VersionSuperseded,
    VersionObsoleted,
    WorkflowTerminated,
    DependencyLinked { to: DocumentId },
    DependencyUnlinked { to: DocumentId },
}

/// One immutable audit record, emitted once per committed change
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: String,
    pub kind: AuditEventKind,
    pub document_id: DocumentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<VersionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<WorkflowInstanceId>,
    pub actor: ActorId,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        kind: AuditEventKind,
        document_id: DocumentId,
        actor: ActorId,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            document_id,
            version_id: None,
            workflow_id: None,
            actor,
            description: description.into(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_version(mut self, version_id: VersionId) -> Self {
        self.version_id = Some(version_id);
        self
    }

    pub fn with_workflow(mut self, workflow_id: WorkflowInstanceId) -> Self {
        self.workflow_id = Some(workflow_id);
        self
    }
}

// ── Notifications ────────────────────────────────────────────────────

/// Why a set of users is being notified
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NotificationKind {
    ReviewRequested,
    ApprovalRequested,
    Rejected { comment: String },
    /// A document this one depends on has a new effective version
    DependencyUpdated {
        dependency: DocumentId,
        version: VersionNumber,
    },
    ObsolescenceAborted { reason: String },
}

/// Payload handed to the notification collaborator
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub document_id: DocumentId,
    pub document_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<WorkflowInstanceId>,
    pub created_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(
        kind: NotificationKind,
        document_id: DocumentId,
        document_number: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            document_id,
            document_number: document_number.into(),
            workflow_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn for_workflow(mut self, workflow_id: WorkflowInstanceId) -> Self {
        self.workflow_id = Some(workflow_id);
        self
    }
}

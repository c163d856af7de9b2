//! Workflow instances and their append-only decision history
//!
//! A [`WorkflowInstance`] is one run of a Review, Up-version or
//! Obsolescence workflow against a single document version. The
//! `history` is append-only: entries are added through
//! [`WorkflowInstance::record_step`] and there is no API to edit or
//! remove them.

use crate::{ActorId, DocumentId, SignatureRef, VersionBump, VersionId, WorkflowInstanceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Workflow Type ────────────────────────────────────────────────────

/// The three workflow configurations driven by the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowType {
    Review,
    UpVersion,
    Obsolete,
}

impl std::fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Review => "Review",
            Self::UpVersion => "Up-version",
            Self::Obsolete => "Obsolescence",
        };
        f.write_str(name)
    }
}

// ── Workflow State ───────────────────────────────────────────────────

/// Position of a workflow instance on its route
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowState {
    Draft,
    PendingReview,
    Reviewed,
    PendingApproval,
    /// Approved; waiting for the scheduler to make the version effective
    PendingEffective,
    /// Approved; waiting for the scheduler to obsolete the version
    PendingObsolescence,
    Completed,
    Terminated,
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Terminated)
    }

    /// Whose move it is in this state
    pub fn awaiting(&self) -> Option<StepRole> {
        match self {
            Self::Draft | Self::Reviewed => Some(StepRole::Author),
            Self::PendingReview => Some(StepRole::Reviewer),
            Self::PendingApproval => Some(StepRole::Approver),
            Self::PendingEffective | Self::PendingObsolescence => Some(StepRole::Scheduler),
            Self::Completed | Self::Terminated => None,
        }
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

// ── Steps, Actions, Decisions ────────────────────────────────────────

/// The role a step is performed in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepRole {
    Author,
    Reviewer,
    Approver,
    /// The effectivity scheduler (or the engine acting on its behalf)
    Scheduler,
}

impl std::fmt::Display for StepRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// An action requested against a workflow instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    SubmitForReview,
    SubmitForApproval,
    Approve,
    Reject,
    Terminate,
    /// Scheduler fires once the effective / obsolescence date is reached
    Fire,
}

impl Action {
    /// The decision recorded in the step history for this action
    pub fn decision(&self) -> Decision {
        match self {
            Self::SubmitForReview | Self::SubmitForApproval => Decision::Submit,
            Self::Approve => Decision::Approve,
            Self::Reject => Decision::Reject,
            Self::Terminate => Decision::Terminate,
            Self::Fire => Decision::Fire,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Decision recorded on a [`StepRecord`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Submit,
    Approve,
    Reject,
    Terminate,
    Fire,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

// ── Step Record ──────────────────────────────────────────────────────

/// One append-only entry in a workflow's history
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Position in the history, starting at 0
    pub sequence: u64,
    pub step_type: StepRole,
    pub actor_id: ActorId,
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub from: WorkflowState,
    pub to: WorkflowState,
    pub timestamp: DateTime<Utc>,
    /// Present on Reviewer / Approver approvals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_ref: Option<SignatureRef>,
}

// ── Workflow Instance ────────────────────────────────────────────────

/// One active or historical run of a workflow against a document version
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowInstance {
    pub id: WorkflowInstanceId,
    pub document_id: DocumentId,
    pub document_version_id: VersionId,
    pub workflow_type: WorkflowType,
    pub state: WorkflowState,
    pub current_step: Option<StepRole>,
    /// The author who started the workflow
    pub author: ActorId,
    /// Effective version being replaced (up-version only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_version_id: Option<VersionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bump: Option<VersionBump>,
    /// Obsolescence reason, or the termination reason once terminated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Actors routed to each step
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub assignees: HashMap<StepRole, Vec<ActorId>>,
    history: Vec<StepRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowInstance {
    pub fn new(
        workflow_type: WorkflowType,
        document_id: DocumentId,
        document_version_id: VersionId,
        author: ActorId,
    ) -> Self {
        let now = Utc::now();
        let state = WorkflowState::Draft;
        Self {
            id: WorkflowInstanceId::generate(),
            document_id,
            document_version_id,
            workflow_type,
            state,
            current_step: state.awaiting(),
            author,
            base_version_id: None,
            bump: None,
            reason: None,
            assignees: HashMap::new(),
            history: Vec::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn with_base(mut self, base: VersionId, bump: VersionBump) -> Self {
        self.base_version_id = Some(base);
        self.bump = Some(bump);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Move to a new state and keep `current_step` in sync
    pub fn enter(&mut self, state: WorkflowState) {
        let now = Utc::now();
        self.state = state;
        self.current_step = state.awaiting();
        self.updated_at = now;
        if state.is_terminal() {
            self.completed_at = Some(now);
        }
    }

    /// Replace the actors routed to a step
    pub fn assign(&mut self, role: StepRole, actors: Vec<ActorId>) {
        self.assignees.insert(role, actors);
    }

    pub fn assigned_to(&self, role: StepRole) -> &[ActorId] {
        self.assignees
            .get(&role)
            .map(|actors| actors.as_slice())
            .unwrap_or(&[])
    }

    /// Append a step to the history, assigning its sequence number
    pub fn record_step(&mut self, mut step: StepRecord) -> &StepRecord {
        step.sequence = self.history.len() as u64;
        self.history.push(step);
        &self.history[self.history.len() - 1]
    }

    pub fn history(&self) -> &[StepRecord] {
        &self.history
    }

    pub fn last_step(&self) -> Option<&StepRecord> {
        self.history.last()
    }

    pub fn is_active(&self) -> bool {
        !self.state.is_terminal()
    }
}

//! Shared fixtures for the engine integration tests

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use doccontrol_engine::mocks::{MockAccessControl, MockCollaborators};
use doccontrol_engine::{DocumentControl, EngineConfig, StepInput};
use doccontrol_types::*;

pub fn alice() -> ActorId {
    ActorId::new("alice")
}

pub fn bob() -> ActorId {
    ActorId::new("bob")
}

pub fn carol() -> ActorId {
    ActorId::new("carol")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub struct Harness {
    pub engine: DocumentControl,
    pub mocks: MockCollaborators,
}

impl Harness {
    pub fn new() -> Self {
        Self::wired(MockCollaborators::permissive())
    }

    pub fn with_access(access: MockAccessControl) -> Self {
        Self::wired(MockCollaborators::with_access(access))
    }

    fn wired(mocks: MockCollaborators) -> Self {
        let engine = DocumentControl::new(EngineConfig::default(), mocks.collaborators());
        Self { engine, mocks }
    }

    pub fn document(&self, title: &str) -> Document {
        self.engine
            .create_document(NewDocument::new(
                DocumentType::Procedure,
                DocumentSource::OriginalDigitalDraft,
                title,
                alice(),
            ))
            .unwrap()
    }

    pub fn start_review(&self, document_id: &DocumentId) -> WorkflowInstance {
        let content = self.engine.store_content(b"draft".to_vec()).unwrap();
        self.engine
            .start_review(document_id, &alice(), content)
            .unwrap()
    }

    pub fn act(
        &self,
        workflow_id: &WorkflowInstanceId,
        action: Action,
        actor: ActorId,
        input: StepInput,
        now: DateTime<Utc>,
    ) -> DocControlResult<WorkflowInstance> {
        self.engine.perform_at(workflow_id, action, &actor, input, now)
    }

    /// Author submits, bob reviews, carol is routed the approval
    pub fn to_pending_approval(&self, workflow_id: &WorkflowInstanceId, now: DateTime<Utc>) {
        self.act(
            workflow_id,
            Action::SubmitForReview,
            alice(),
            StepInput::new().with_assignees(vec![bob()]),
            now,
        )
        .unwrap();
        self.act(workflow_id, Action::Approve, bob(), StepInput::new(), now)
            .unwrap();
        self.act(
            workflow_id,
            Action::SubmitForApproval,
            alice(),
            StepInput::new().with_assignees(vec![carol()]),
            now,
        )
        .unwrap();
    }

    /// Drive a Review or Up-version workflow to Approved, Pending Effective
    pub fn approve_through(
        &self,
        workflow_id: &WorkflowInstanceId,
        effective: NaiveDate,
        now: DateTime<Utc>,
    ) -> WorkflowInstance {
        self.to_pending_approval(workflow_id, now);
        self.act(
            workflow_id,
            Action::Approve,
            carol(),
            StepInput::new().with_effective_date(effective),
            now,
        )
        .unwrap()
    }

    /// A document whose first version became effective on 2025-01-10
    pub fn effective_document(&self, title: &str) -> Document {
        let doc = self.document(title);
        let wf = self.start_review(&doc.id);
        self.approve_through(&wf.id, date(2025, 1, 10), at(2025, 1, 6, 9));
        self.engine.sweep(at(2025, 1, 10, 1)).unwrap();
        self.engine.document(&doc.id).unwrap()
    }

    pub fn effective_count(&self, document_id: &DocumentId) -> usize {
        self.engine
            .versions_of(document_id)
            .unwrap()
            .iter()
            .filter(|v| v.status == VersionStatus::ApprovedEffective)
            .count()
    }
}

//! End-to-end Review and Up-version lifecycles through `DocumentControl`

mod common;

use common::*;
use doccontrol_engine::mocks::MockAccessControl;
use doccontrol_engine::StepInput;
use doccontrol_types::*;

#[test]
fn effectivity_waits_for_the_effective_date() {
    let h = Harness::new();
    let doc = h.document("Gowning procedure");
    let wf = h.start_review(&doc.id);
    let wf = h.approve_through(&wf.id, date(2025, 1, 10), at(2025, 1, 6, 9));
    assert_eq!(wf.state, WorkflowState::PendingEffective);

    let version = h.engine.version(&wf.document_version_id).unwrap();
    assert_eq!(version.status, VersionStatus::ApprovedPendingEffective);
    assert_eq!(version.effective_date, Some(date(2025, 1, 10)));

    // The day before: nothing happens
    let results = h.engine.sweep(at(2025, 1, 9, 23)).unwrap();
    assert!(results.is_empty());
    assert_eq!(
        h.engine.version(&version.id).unwrap().status,
        VersionStatus::ApprovedPendingEffective
    );
    assert!(h.engine.document(&doc.id).unwrap().current_version_id.is_none());

    let results = h.engine.sweep(at(2025, 1, 10, 0)).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].outcome,
        PromotionOutcome::Promoted { superseded: None }
    );

    let version = h.engine.version(&version.id).unwrap();
    assert_eq!(version.status, VersionStatus::ApprovedEffective);
    assert_eq!(version.version_number, VersionNumber::new(0, 1));
    assert_eq!(
        h.engine.document(&doc.id).unwrap().current_version_id,
        Some(version.id.clone())
    );

    let wf = h.engine.workflow(&wf.id).unwrap();
    assert_eq!(wf.state, WorkflowState::Completed);
    let last = wf.last_step().unwrap();
    assert_eq!(last.step_type, StepRole::Scheduler);
    assert_eq!(last.decision, Decision::Fire);
    assert_eq!(last.actor_id, ActorId::new("system"));
    assert!(h.engine.active_workflow(&doc.id).unwrap().is_none());
}

#[test]
fn approvals_are_signed_and_verifiable() {
    let h = Harness::new();
    let doc = h.document("Deviation handling");
    let wf = h.start_review(&doc.id);
    let wf = h.approve_through(&wf.id, date(2025, 1, 10), at(2025, 1, 6, 9));

    let history = wf.history();
    assert_eq!(history.len(), 4);
    let signed: Vec<u64> = history
        .iter()
        .filter(|s| s.signature_ref.is_some())
        .map(|s| s.sequence)
        .collect();
    assert_eq!(signed, vec![1, 3]);
    assert!(h.engine.verify_step(&wf.id, 1).unwrap());
    assert!(h.engine.verify_step(&wf.id, 3).unwrap());
    assert_eq!(h.mocks.signer.signed_count(), 2);
}

#[test]
fn up_version_supersedes_prior_in_one_step() {
    let h = Harness::new();
    let doc = h.effective_document("Equipment cleaning");
    let v1 = h.engine.effective_version(&doc.id).unwrap().unwrap();

    let content = h.engine.store_content(b"v2".to_vec()).unwrap();
    let wf = h
        .engine
        .start_up_version(&doc.id, &alice(), content, VersionBump::Minor, None)
        .unwrap();
    assert_eq!(wf.base_version_id.as_ref(), Some(&v1.id));
    let v2 = h.engine.version(&wf.document_version_id).unwrap();
    assert_eq!(v2.version_number, VersionNumber::new(0, 2));

    // The prior version stays effective and visible throughout
    h.approve_through(&wf.id, date(2025, 2, 1), at(2025, 1, 20, 9));
    assert_eq!(
        h.engine.effective_version(&doc.id).unwrap().unwrap().id,
        v1.id
    );
    assert_eq!(h.effective_count(&doc.id), 1);

    let results = h.engine.sweep(at(2025, 2, 1, 6)).unwrap();
    assert_eq!(
        results[0].outcome,
        PromotionOutcome::Promoted {
            superseded: Some(v1.id.clone())
        }
    );
    assert_eq!(
        h.engine.version(&v1.id).unwrap().status,
        VersionStatus::Superseded
    );
    assert_eq!(
        h.engine.effective_version(&doc.id).unwrap().unwrap().id,
        v2.id
    );
    assert_eq!(h.effective_count(&doc.id), 1);
}

#[test]
fn major_bump_and_second_workflow_refused() {
    let h = Harness::new();
    let doc = h.effective_document("Batch record review");

    let content = h.engine.store_content(b"v1.0".to_vec()).unwrap();
    let wf = h
        .engine
        .start_up_version(&doc.id, &alice(), content.clone(), VersionBump::Major, None)
        .unwrap();
    assert_eq!(
        h.engine.version(&wf.document_version_id).unwrap().version_number,
        VersionNumber::new(1, 0)
    );

    let err = h
        .engine
        .start_up_version(&doc.id, &alice(), content, VersionBump::Minor, None)
        .unwrap_err();
    assert!(matches!(err, DocControlError::StateTransition(_)));
    assert!(err.to_string().contains("workflow already active"));

    let err = h
        .engine
        .start_obsolescence(&doc.id, &alice(), "replaced", None)
        .unwrap_err();
    assert!(err.to_string().contains("workflow already active"));
}

#[test]
fn reviewer_rejection_loops_back_to_draft() {
    let h = Harness::new();
    let doc = h.document("Label reconciliation");
    let wf = h.start_review(&doc.id);
    let now = at(2025, 1, 6, 9);

    h.act(
        &wf.id,
        Action::SubmitForReview,
        alice(),
        StepInput::new().with_assignees(vec![bob()]),
        now,
    )
    .unwrap();
    let wf = h
        .act(
            &wf.id,
            Action::Reject,
            bob(),
            StepInput::new().with_comment("section 4 is ambiguous"),
            now,
        )
        .unwrap();

    assert_eq!(wf.state, WorkflowState::Draft);
    assert_eq!(
        h.engine.version(&wf.document_version_id).unwrap().status,
        VersionStatus::Draft
    );
    let rejects: Vec<&StepRecord> = wf
        .history()
        .iter()
        .filter(|s| s.decision == Decision::Reject)
        .collect();
    assert_eq!(rejects.len(), 1);
    assert!(rejects[0].signature_ref.is_none());
    assert_eq!(rejects[0].comment.as_deref(), Some("section 4 is ambiguous"));

    let to_author = h.mocks.notifier.received_by(&alice());
    assert!(to_author.iter().any(|n| matches!(
        &n.kind,
        NotificationKind::Rejected { comment } if comment == "section 4 is ambiguous"
    )));

    // A fresh submission restarts the route
    let wf = h
        .act(
            &wf.id,
            Action::SubmitForReview,
            alice(),
            StepInput::new().with_assignees(vec![bob()]),
            now,
        )
        .unwrap();
    assert_eq!(wf.state, WorkflowState::PendingReview);
    assert_eq!(wf.history().len(), 3);
}

#[test]
fn approver_rejection_returns_to_draft() {
    let h = Harness::new();
    let doc = h.document("Change control");
    let wf = h.start_review(&doc.id);
    h.to_pending_approval(&wf.id, at(2025, 1, 6, 9));

    let wf = h.engine.reject(&wf.id, &carol(), "missing risk assessment").unwrap();
    assert_eq!(wf.state, WorkflowState::Draft);
    assert_eq!(h.mocks.signer.signed_count(), 1);
    assert!(h.engine.pending_events().unwrap().is_empty());
}

#[test]
fn termination_releases_the_document() {
    let h = Harness::new();
    let doc = h.document("Pest control");
    let wf = h.start_review(&doc.id);
    h.engine.submit_for_review(&wf.id, &alice(), vec![bob()]).unwrap();

    let wf = h.engine.terminate(&wf.id, &alice(), "duplicate").unwrap();
    assert_eq!(wf.state, WorkflowState::Terminated);
    assert_eq!(wf.reason.as_deref(), Some("duplicate"));
    assert!(h.engine.document(&doc.id).unwrap().current_version_id.is_none());
    assert_eq!(
        h.engine.version(&wf.document_version_id).unwrap().status,
        VersionStatus::Discarded
    );
    assert!(h.engine.active_workflow(&doc.id).unwrap().is_none());

    // Terminated workflows accept nothing further
    assert!(h.engine.submit_for_review(&wf.id, &alice(), vec![bob()]).is_err());

    // A new workflow can start at once; numbering moves past the discarded draft
    let next = h.start_review(&doc.id);
    assert_eq!(
        h.engine.version(&next.document_version_id).unwrap().version_number,
        VersionNumber::new(0, 2)
    );
    assert_eq!(h.engine.versions_of(&doc.id).unwrap().len(), 2);
}

#[test]
fn only_the_author_may_terminate_and_not_after_approval() {
    let h = Harness::new();
    let doc = h.document("Water system sampling");
    let wf = h.start_review(&doc.id);

    let err = h.engine.terminate(&wf.id, &bob(), "not mine").unwrap_err();
    assert!(err.to_string().contains("only the workflow author"));

    h.approve_through(&wf.id, date(2025, 1, 10), at(2025, 1, 6, 9));
    let err = h.engine.terminate(&wf.id, &alice(), "too late").unwrap_err();
    assert!(matches!(err, DocControlError::StateTransition(_)));
}

#[test]
fn sweep_is_idempotent() {
    let h = Harness::new();
    let doc = h.document("Temperature mapping");
    let wf = h.start_review(&doc.id);
    h.approve_through(&wf.id, date(2025, 1, 10), at(2025, 1, 6, 9));

    let now = at(2025, 1, 10, 2);
    let first = h.engine.sweep(now).unwrap();
    let history_after_first = h.engine.history(&wf.id).unwrap();
    let stamp_after_first = h.engine.document(&doc.id).unwrap().stamp;

    let second = h.engine.sweep(now).unwrap();
    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
    assert_eq!(h.engine.history(&wf.id).unwrap(), history_after_first);
    assert_eq!(h.engine.document(&doc.id).unwrap().stamp, stamp_after_first);
    assert!(h.engine.pending_events().unwrap().is_empty());
}

#[test]
fn signature_failure_changes_nothing() {
    let h = Harness::new();
    let doc = h.document("Supplier qualification");
    let wf = h.start_review(&doc.id);
    let now = at(2025, 1, 6, 9);
    h.to_pending_approval(&wf.id, now);
    let before = h.engine.workflow(&wf.id).unwrap();
    let stamp = h.engine.document(&doc.id).unwrap().stamp;

    h.mocks.signer.set_failing(true);
    let err = h
        .act(
            &wf.id,
            Action::Approve,
            carol(),
            StepInput::new().with_effective_date(date(2025, 1, 10)),
            now,
        )
        .unwrap_err();
    assert!(matches!(err, DocControlError::Signature(_)));
    assert!(err.is_retryable());

    let after = h.engine.workflow(&wf.id).unwrap();
    assert_eq!(after.state, WorkflowState::PendingApproval);
    assert_eq!(after.history(), before.history());
    assert_eq!(
        h.engine.version(&wf.document_version_id).unwrap().status,
        VersionStatus::PendingApproval
    );
    assert!(h.engine.pending_events().unwrap().is_empty());
    assert_eq!(h.engine.document(&doc.id).unwrap().stamp, stamp);

    // Retry once the signer is back
    h.mocks.signer.set_failing(false);
    let wf = h
        .act(
            &wf.id,
            Action::Approve,
            carol(),
            StepInput::new().with_effective_date(date(2025, 1, 10)),
            now,
        )
        .unwrap();
    assert_eq!(wf.state, WorkflowState::PendingEffective);
}

#[test]
fn access_control_denial_changes_nothing() {
    let access = MockAccessControl::deny_all();
    access.grant("alice", Permission::CreateDocument);
    access.grant("alice", Permission::AuthorDocument);
    let h = Harness::with_access(access);

    let doc = h.document("Sterility testing");
    let wf = h.start_review(&doc.id);
    h.engine.submit_for_review(&wf.id, &alice(), vec![bob()]).unwrap();

    let err = h.engine.approve(&wf.id, &bob(), None).unwrap_err();
    assert_eq!(
        err,
        DocControlError::Authorization {
            actor: bob(),
            permission: Permission::ReviewDocument,
            document_id: Some(doc.id.clone()),
        }
    );
    assert_eq!(
        h.engine.workflow(&wf.id).unwrap().state,
        WorkflowState::PendingReview
    );

    // No grant to terminate either
    let err = h.engine.terminate(&wf.id, &alice(), "abandon").unwrap_err();
    assert!(matches!(err, DocControlError::Authorization { .. }));

    let err = h
        .engine
        .create_document(NewDocument::new(
            DocumentType::Form,
            DocumentSource::ScannedOriginal,
            "Logbook",
            bob(),
        ))
        .unwrap_err();
    assert!(matches!(err, DocControlError::Authorization { .. }));
}

#[test]
fn audit_failures_never_block_transitions() {
    let h = Harness::new();
    let doc = h.document("Calibration");
    let recorded = h.mocks.audit.len();

    h.mocks.audit.set_failing(true);
    let wf = h.start_review(&doc.id);
    h.engine.submit_for_review(&wf.id, &alice(), vec![bob()]).unwrap();
    assert_eq!(
        h.engine.workflow(&wf.id).unwrap().state,
        WorkflowState::PendingReview
    );
    assert_eq!(h.mocks.audit.len(), recorded);
    assert_eq!(h.engine.audit_dispatcher().consecutive_failures(), 2);

    h.mocks.audit.set_failing(false);
    h.engine.approve(&wf.id, &bob(), None).unwrap();
    assert_eq!(h.engine.audit_dispatcher().consecutive_failures(), 0);
    assert!(h
        .mocks
        .audit
        .events()
        .iter()
        .any(|e| e.kind
            == AuditEventKind::Transition {
                from: WorkflowState::PendingReview,
                to: WorkflowState::Reviewed,
            }));
}

#[test]
fn each_commit_has_one_transition_record() {
    let h = Harness::new();
    let doc = h.effective_document("Hold time study");
    let content = h.engine.store_content(b"v2".to_vec()).unwrap();
    let wf = h
        .engine
        .start_up_version(&doc.id, &alice(), content, VersionBump::Minor, None)
        .unwrap();
    h.approve_through(&wf.id, date(2025, 2, 1), at(2025, 1, 20, 9));

    let before = h.mocks.audit.len();
    h.engine.sweep(at(2025, 2, 1, 1)).unwrap();
    let promotion: Vec<AuditEventKind> = h.mocks.audit.events()[before..]
        .iter()
        .map(|e| e.kind.clone())
        .collect();
    assert_eq!(
        promotion,
        vec![
            AuditEventKind::VersionSuperseded,
            AuditEventKind::VersionEffective,
            AuditEventKind::Transition {
                from: WorkflowState::PendingEffective,
                to: WorkflowState::Completed,
            },
        ]
    );

    let other = h.document("Hold time protocol");
    let wf = h.start_review(&other.id);
    let before = h.mocks.audit.len();
    h.engine.terminate(&wf.id, &alice(), "duplicate").unwrap();
    let termination: Vec<AuditEventKind> = h.mocks.audit.events()[before..]
        .iter()
        .map(|e| e.kind.clone())
        .collect();
    assert_eq!(
        termination,
        vec![
            AuditEventKind::WorkflowTerminated,
            AuditEventKind::Transition {
                from: WorkflowState::Draft,
                to: WorkflowState::Terminated,
            },
        ]
    );
}

#[test]
fn dependents_hear_about_new_effective_versions() {
    let h = Harness::new();
    let parent = h.effective_document("Master validation plan");
    let child = h.effective_document("Cleaning validation");
    h.engine
        .link_dependency(&alice(), &child.id, &parent.id, None)
        .unwrap();

    let content = h.engine.store_content(b"mvp v2".to_vec()).unwrap();
    let wf = h
        .engine
        .start_up_version(&parent.id, &alice(), content, VersionBump::Minor, None)
        .unwrap();
    h.approve_through(&wf.id, date(2025, 3, 1), at(2025, 2, 20, 9));
    h.engine.sweep(at(2025, 3, 1, 0)).unwrap();

    let notices = h.mocks.notifier.received_by(&alice());
    assert!(notices.iter().any(|n| n.document_id == child.id
        && n.kind
            == NotificationKind::DependencyUpdated {
                dependency: parent.id.clone(),
                version: VersionNumber::new(0, 2),
            }));
}

#[test]
fn stale_stamp_loses_to_scheduler() {
    let h = Harness::new();
    let doc = h.effective_document("Environmental monitoring");
    let seen = h.engine.document(&doc.id).unwrap().stamp;

    let content = h.engine.store_content(b"v2".to_vec()).unwrap();
    let wf = h
        .engine
        .start_up_version(&doc.id, &alice(), content, VersionBump::Minor, None)
        .unwrap();

    let err = h
        .engine
        .perform(
            &wf.id,
            Action::SubmitForReview,
            &alice(),
            StepInput::new()
                .with_assignees(vec![bob()])
                .expecting(seen),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        DocControlError::ConcurrencyConflict { expected, .. } if expected == seen
    ));

    let fresh = h.engine.document(&doc.id).unwrap().stamp;
    h.engine
        .perform(
            &wf.id,
            Action::SubmitForReview,
            &alice(),
            StepInput::new()
                .with_assignees(vec![bob()])
                .expecting(fresh),
        )
        .unwrap();
}

#[test]
fn missed_windows_are_reported_until_swept() {
    let h = Harness::new();
    let doc = h.document("Visual inspection");
    let wf = h.start_review(&doc.id);
    h.approve_through(&wf.id, date(2025, 1, 10), at(2025, 1, 6, 9));

    assert!(h.engine.overdue_events(at(2025, 1, 10, 12)).unwrap().is_empty());
    let missed = h.engine.overdue_events(at(2025, 1, 12, 0)).unwrap();
    assert_eq!(missed.len(), 1);
    assert!(matches!(
        &missed[0],
        DocControlError::SchedulerMissedWindow { version_id, .. } if version_id == &wf.document_version_id
    ));

    h.engine.sweep(at(2025, 1, 12, 0)).unwrap();
    assert!(h.engine.overdue_events(at(2025, 1, 12, 0)).unwrap().is_empty());
    assert_eq!(h.effective_count(&doc.id), 1);
}

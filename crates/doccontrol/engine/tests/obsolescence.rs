//! Obsolescence workflows and the dependency guard

mod common;

use common::*;
use doccontrol_engine::StepInput;
use doccontrol_types::*;

fn approve_obsolescence(h: &Harness, workflow_id: &WorkflowInstanceId, on: chrono::NaiveDate) {
    let now = at(2025, 1, 20, 9);
    h.act(
        workflow_id,
        Action::SubmitForApproval,
        alice(),
        StepInput::new().with_assignees(vec![carol()]),
        now,
    )
    .unwrap();
    h.act(
        workflow_id,
        Action::Approve,
        carol(),
        StepInput::new().with_effective_date(on),
        now,
    )
    .unwrap();
}

#[test]
fn live_dependent_blocks_obsolescence() {
    let h = Harness::new();
    let a = h.effective_document("Quality manual");
    let b = h.effective_document("Internal audits");
    h.engine.link_dependency(&alice(), &b.id, &a.id, None).unwrap();

    let err = h
        .engine
        .start_obsolescence(&a.id, &alice(), "merged into QM-2", None)
        .unwrap_err();
    assert_eq!(
        err,
        DocControlError::DependencyBlocked {
            document_id: a.id.clone(),
            dependents: vec![b.id.clone()],
        }
    );
    assert!(err.to_string().contains(b.id.as_str()));

    let version = h.engine.effective_version(&a.id).unwrap().unwrap();
    assert_eq!(version.status, VersionStatus::ApprovedEffective);
    assert!(h.engine.active_workflow(&a.id).unwrap().is_none());

    // Once unlinked the retirement may proceed
    h.engine.unlink_dependency(&alice(), &b.id, &a.id, None).unwrap();
    h.engine
        .start_obsolescence(&a.id, &alice(), "merged into QM-2", None)
        .unwrap();
}

#[test]
fn obsolescence_runs_to_obsolete() {
    let h = Harness::new();
    let doc = h.effective_document("Legacy form");
    let wf = h
        .engine
        .start_obsolescence(&doc.id, &alice(), "form retired", None)
        .unwrap();
    assert_eq!(wf.workflow_type, WorkflowType::Obsolete);
    assert_eq!(wf.reason.as_deref(), Some("form retired"));
    assert_eq!(
        h.engine.available_actions(&wf.id).unwrap(),
        vec![Action::SubmitForApproval, Action::Terminate]
    );

    approve_obsolescence(&h, &wf.id, date(2025, 2, 1));
    let version = h.engine.version(&wf.document_version_id).unwrap();
    assert_eq!(version.status, VersionStatus::PendingObsolescence);
    assert!(h.engine.effective_version(&doc.id).unwrap().is_none());

    // Pending obsolescence blocks new edges and new up-versions
    let other = h.effective_document("New form");
    let err = h
        .engine
        .link_dependency(&alice(), &other.id, &doc.id, None)
        .unwrap_err();
    assert!(matches!(err, DocControlError::Validation(_)));
    let content = h.engine.store_content(b"x".to_vec()).unwrap();
    let err = h
        .engine
        .start_up_version(&doc.id, &alice(), content, VersionBump::Minor, None)
        .unwrap_err();
    assert!(err.to_string().contains("pending obsolescence"));

    let results = h.engine.sweep(at(2025, 2, 1, 3)).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].outcome, PromotionOutcome::Obsoleted);
    assert_eq!(
        h.engine.version(&version.id).unwrap().status,
        VersionStatus::Obsolete
    );
    assert_eq!(
        h.engine.workflow(&wf.id).unwrap().state,
        WorkflowState::Completed
    );
    assert!(h.engine.active_workflow(&doc.id).unwrap().is_none());
}

#[test]
fn approver_rejection_keeps_version_effective() {
    let h = Harness::new();
    let doc = h.effective_document("Spill response");
    let wf = h
        .engine
        .start_obsolescence(&doc.id, &alice(), "superseded by site SOP", None)
        .unwrap();
    h.engine
        .submit_for_approval(&wf.id, &alice(), vec![carol()])
        .unwrap();
    let wf = h
        .engine
        .reject(&wf.id, &carol(), "still referenced by training")
        .unwrap();

    assert_eq!(wf.state, WorkflowState::Draft);
    assert_eq!(
        h.engine.version(&wf.document_version_id).unwrap().status,
        VersionStatus::ApprovedEffective
    );

    let wf = h.engine.terminate(&wf.id, &alice(), "keep it").unwrap();
    assert_eq!(wf.state, WorkflowState::Terminated);
    assert_eq!(
        h.engine.effective_version(&doc.id).unwrap().unwrap().id,
        wf.document_version_id
    );
}

#[test]
fn dependent_going_live_forces_termination() {
    let h = Harness::new();
    let target = h.effective_document("Sampling plan");

    // A drafting dependent does not block the start
    let dependent = h.document("Sampling worksheet");
    h.engine
        .link_dependency(&alice(), &dependent.id, &target.id, None)
        .unwrap();
    let dep_wf = h.start_review(&dependent.id);

    let wf = h
        .engine
        .start_obsolescence(&target.id, &alice(), "plan withdrawn", None)
        .unwrap();
    approve_obsolescence(&h, &wf.id, date(2025, 2, 5));

    // The dependent becomes effective first
    h.approve_through(&dep_wf.id, date(2025, 2, 1), at(2025, 1, 21, 9));
    let results = h.engine.sweep(at(2025, 2, 5, 1)).unwrap();
    assert_eq!(results.len(), 2);
    assert!(matches!(
        results[0].outcome,
        PromotionOutcome::Promoted { .. }
    ));
    let reason = "dependent attached during pending obsolescence".to_string();
    assert_eq!(
        results[1].outcome,
        PromotionOutcome::ForcedTermination {
            reason: reason.clone()
        }
    );

    let wf = h.engine.workflow(&wf.id).unwrap();
    assert_eq!(wf.state, WorkflowState::Terminated);
    assert_eq!(wf.reason.as_deref(), Some(reason.as_str()));
    let last = wf.last_step().unwrap();
    assert_eq!(last.step_type, StepRole::Scheduler);
    assert_eq!(last.decision, Decision::Terminate);

    assert_eq!(
        h.engine.effective_version(&target.id).unwrap().unwrap().id,
        wf.document_version_id
    );
    assert!(h.engine.active_workflow(&target.id).unwrap().is_none());
    assert!(h
        .mocks
        .notifier
        .received_by(&alice())
        .iter()
        .any(|n| matches!(n.kind, NotificationKind::ObsolescenceAborted { .. })));
}

#[test]
fn obsolescence_needs_reason_and_effective_version() {
    let h = Harness::new();
    let doc = h.effective_document("Pallet labelling");
    assert!(matches!(
        h.engine.start_obsolescence(&doc.id, &alice(), " ", None).unwrap_err(),
        DocControlError::Validation(_)
    ));

    let draft_only = h.document("Never approved");
    h.start_review(&draft_only.id);
    let err = h
        .engine
        .start_obsolescence(&draft_only.id, &alice(), "abandon", None)
        .unwrap_err();
    assert!(matches!(err, DocControlError::StateTransition(_)));
}

#[test]
fn dependency_cycles_are_rejected() {
    let h = Harness::new();
    let a = h.effective_document("A");
    let b = h.effective_document("B");

    h.engine.link_dependency(&alice(), &a.id, &b.id, None).unwrap();
    let err = h.engine.link_dependency(&alice(), &b.id, &a.id, None).unwrap_err();
    assert!(matches!(err, DocControlError::Validation(_)));
    assert!(err.to_string().contains("cycle"));

    assert_eq!(h.engine.dependencies_of(&b.id).unwrap(), Vec::<DocumentId>::new());
    assert_eq!(h.engine.dependents_of(&b.id).unwrap(), vec![a.id.clone()]);
}

#[test]
fn stale_stamp_refuses_retirement_after_promotion() {
    let h = Harness::new();
    let doc = h.effective_document("Deviation handling");
    let seen = h.engine.document(&doc.id).unwrap().stamp;
    let seen_version = h.engine.effective_version(&doc.id).unwrap().unwrap();

    // A newer version goes live between the caller's read and its write
    let content = h.engine.store_content(b"v2".to_vec()).unwrap();
    let up = h
        .engine
        .start_up_version(&doc.id, &alice(), content, VersionBump::Minor, Some(seen))
        .unwrap();
    h.approve_through(&up.id, date(2025, 2, 1), at(2025, 1, 20, 9));
    h.engine.sweep(at(2025, 2, 1, 1)).unwrap();
    let current = h.engine.document(&doc.id).unwrap().stamp;
    assert!(current > seen);

    let err = h
        .engine
        .start_obsolescence(&doc.id, &alice(), "replaced by DEV-2", Some(seen))
        .unwrap_err();
    assert_eq!(
        err,
        DocControlError::ConcurrencyConflict {
            document_id: doc.id.clone(),
            expected: seen,
            actual: current,
        }
    );
    assert!(err.is_retryable());
    assert!(h.engine.active_workflow(&doc.id).unwrap().is_none());
    assert_ne!(
        h.engine.effective_version(&doc.id).unwrap().unwrap().id,
        seen_version.id
    );

    // Re-read, then retry
    let wf = h
        .engine
        .start_obsolescence(&doc.id, &alice(), "replaced by DEV-2", Some(current))
        .unwrap();
    assert_eq!(wf.workflow_type, WorkflowType::Obsolete);
}

#[test]
fn stale_stamp_refuses_dependency_changes() {
    let h = Harness::new();
    let a = h.effective_document("Calibration policy");
    let b = h.effective_document("Balance calibration");
    let seen = h.engine.document(&b.id).unwrap().stamp;

    h.engine
        .link_dependency(&alice(), &b.id, &a.id, Some(seen))
        .unwrap();
    let err = h
        .engine
        .unlink_dependency(&alice(), &b.id, &a.id, Some(seen))
        .unwrap_err();
    assert!(matches!(err, DocControlError::ConcurrencyConflict { .. }));
    assert_eq!(h.engine.dependencies_of(&b.id).unwrap(), vec![a.id.clone()]);

    let c = h.effective_document("Pipette calibration");
    let err = h
        .engine
        .link_dependency(&alice(), &b.id, &c.id, Some(seen))
        .unwrap_err();
    assert!(matches!(err, DocControlError::ConcurrencyConflict { .. }));
    assert_eq!(h.engine.dependencies_of(&b.id).unwrap(), vec![a.id.clone()]);
}

//! Route tables for the three workflow configurations
//!
//! Each workflow type is a static list of [`RouteRule`]s. A rule names the
//! state it applies in, the action that triggers it, the role that may
//! perform it, the state it leads to and the status the version takes on.
//! One executor drives every type by looking rules up here.

use doccontrol_types::{Action, Permission, StepRole, VersionStatus, WorkflowState, WorkflowType};

/// One legal transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteRule {
    pub from: WorkflowState,
    pub action: Action,
    pub role: StepRole,
    pub to: WorkflowState,
    /// Version status after the transition; `None` leaves it unchanged
    pub status: Option<VersionStatus>,
}

const fn rule(
    from: WorkflowState,
    action: Action,
    role: StepRole,
    to: WorkflowState,
    status: Option<VersionStatus>,
) -> RouteRule {
    RouteRule {
        from,
        action,
        role,
        to,
        status,
    }
}

use Action::*;
use StepRole::{Approver, Author, Reviewer, Scheduler};
use WorkflowState as S;

// ── Review / Up-version ──────────────────────────────────────────────

const AUTHORING_RULES: &[RouteRule] = &[
    rule(S::Draft, SubmitForReview, Author, S::PendingReview, Some(VersionStatus::PendingReview)),
    rule(S::PendingReview, Reject, Reviewer, S::Draft, Some(VersionStatus::Draft)),
    rule(S::PendingReview, Approve, Reviewer, S::Reviewed, Some(VersionStatus::Reviewed)),
    rule(S::Reviewed, SubmitForApproval, Author, S::PendingApproval, Some(VersionStatus::PendingApproval)),
    rule(S::PendingApproval, Reject, Approver, S::Draft, Some(VersionStatus::Draft)),
    rule(
        S::PendingApproval,
        Approve,
        Approver,
        S::PendingEffective,
        Some(VersionStatus::ApprovedPendingEffective),
    ),
    rule(S::PendingEffective, Fire, Scheduler, S::Completed, Some(VersionStatus::ApprovedEffective)),
    rule(S::Draft, Terminate, Author, S::Terminated, Some(VersionStatus::Discarded)),
    rule(S::PendingReview, Terminate, Author, S::Terminated, Some(VersionStatus::Discarded)),
    rule(S::Reviewed, Terminate, Author, S::Terminated, Some(VersionStatus::Discarded)),
    rule(S::PendingApproval, Terminate, Author, S::Terminated, Some(VersionStatus::Discarded)),
];

// ── Obsolescence ─────────────────────────────────────────────────────

const OBSOLETE_RULES: &[RouteRule] = &[
    rule(S::Draft, SubmitForApproval, Author, S::PendingApproval, None),
    rule(S::PendingApproval, Reject, Approver, S::Draft, None),
    rule(
        S::PendingApproval,
        Approve,
        Approver,
        S::PendingObsolescence,
        Some(VersionStatus::PendingObsolescence),
    ),
    rule(S::PendingObsolescence, Fire, Scheduler, S::Completed, Some(VersionStatus::Obsolete)),
    rule(S::Draft, Terminate, Author, S::Terminated, None),
    rule(S::PendingApproval, Terminate, Author, S::Terminated, None),
    // Final dependent re-check failed at the obsolescence date
    rule(
        S::PendingObsolescence,
        Terminate,
        Scheduler,
        S::Terminated,
        Some(VersionStatus::ApprovedEffective),
    ),
];

/// The route of one workflow type
#[derive(Clone, Copy, Debug)]
pub struct Route {
    pub workflow_type: WorkflowType,
    rules: &'static [RouteRule],
}

impl Route {
    pub fn for_type(workflow_type: WorkflowType) -> Self {
        let rules = match workflow_type {
            WorkflowType::Review | WorkflowType::UpVersion => AUTHORING_RULES,
            WorkflowType::Obsolete => OBSOLETE_RULES,
        };
        Self {
            workflow_type,
            rules,
        }
    }

    /// Find the rule for `action` in state `from`.
    ///
    /// Scheduler-only rules are invisible unless `by_scheduler` is set, so
    /// a user can never reach them.
    pub fn find(
        &self,
        from: WorkflowState,
        action: Action,
        by_scheduler: bool,
    ) -> Option<&'static RouteRule> {
        self.rules.iter().find(|r| {
            r.from == from && r.action == action && ((r.role == Scheduler) == by_scheduler)
        })
    }

    /// Actions a user may take in `state`
    pub fn available(&self, state: WorkflowState) -> Vec<Action> {
        self.rules
            .iter()
            .filter(|r| r.from == state && r.role != Scheduler)
            .map(|r| r.action)
            .collect()
    }

    pub fn rules(&self) -> &'static [RouteRule] {
        self.rules
    }

    /// Permission the RBAC collaborator is asked for on a rule
    pub fn permission(&self, rule: &RouteRule) -> Permission {
        match (rule.action, rule.role) {
            (Terminate, _) => Permission::TerminateWorkflow,
            (_, Reviewer) => Permission::ReviewDocument,
            (_, Approver) => Permission::ApproveDocument,
            _ => match self.workflow_type {
                WorkflowType::Obsolete => Permission::RetireDocument,
                WorkflowType::Review | WorkflowType::UpVersion => Permission::AuthorDocument,
            },
        }
    }
}

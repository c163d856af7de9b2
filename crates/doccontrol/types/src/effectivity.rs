//! Effectivity scheduling records and sweep outcomes

use crate::{DocumentId, EffectivityEventId, VersionId, WorkflowInstanceId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// What the scheduler does when an event fires
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectivityKind {
    /// Approved, Pending Effective -> Approved and Effective
    Effective,
    /// Pending Obsolescence -> Obsolete
    Obsolescence,
}

/// A scheduling record created when an Approver selects a date.
///
/// Consumed exactly once: `triggered` flips to true on the first sweep
/// that processes it, whatever the outcome.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EffectivityEvent {
    pub id: EffectivityEventId,
    pub document_id: DocumentId,
    pub document_version_id: VersionId,
    pub workflow_id: WorkflowInstanceId,
    pub kind: EffectivityKind,
    pub effective_date: NaiveDate,
    pub triggered: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggered_at: Option<DateTime<Utc>>,
}

impl EffectivityEvent {
    pub fn new(
        kind: EffectivityKind,
        document_id: DocumentId,
        document_version_id: VersionId,
        workflow_id: WorkflowInstanceId,
        effective_date: NaiveDate,
    ) -> Self {
        Self {
            id: EffectivityEventId::generate(),
            document_id,
            document_version_id,
            workflow_id,
            kind,
            effective_date,
            triggered: false,
            created_at: Utc::now(),
            triggered_at: None,
        }
    }

    /// Due on or after its date, and not yet consumed
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.triggered && self.effective_date <= now.date_naive()
    }

    /// Start of the effective day, used to measure lateness
    pub fn due_at(&self) -> DateTime<Utc> {
        self.effective_date
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .unwrap_or(self.created_at)
    }
}

/// Outcome of processing one due event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PromotionOutcome {
    /// The version became Approved and Effective
    Promoted {
        #[serde(skip_serializing_if = "Option::is_none")]
        superseded: Option<VersionId>,
    },
    /// The version became Obsolete
    Obsoleted,
    /// The final dependent re-check failed; the workflow was terminated
    ForcedTermination { reason: String },
    /// Not applied: either the workflow was no longer waiting on this
    /// event, or applying it failed and it was left pending
    Skipped { reason: String },
}

/// Per-event result returned by a sweep
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PromotionResult {
    pub event_id: EffectivityEventId,
    pub document_id: DocumentId,
    pub version_id: VersionId,
    pub workflow_id: WorkflowInstanceId,
    pub outcome: PromotionOutcome,
}

//! Effectivity Scheduler
//!
//! Approver decisions leave an [`EffectivityEvent`] in the queue. A sweep
//! consumes every due event exactly once: each is processed under its own
//! write guard and flagged `triggered` once it has been applied or found
//! stale. An event whose application fails is rolled back and left pending.

use crate::engine::{Books, DocumentControl, Outbox};
use crate::route::{Route, RouteRule};
use chrono::{DateTime, Duration, Utc};
use doccontrol_types::*;

const FORCED_TERMINATION_REASON: &str = "dependent attached during pending obsolescence";

// ── Queue ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct EffectivityQueue {
    events: Vec<EffectivityEvent>,
}

impl EffectivityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, event: EffectivityEvent) {
        self.events.push(event);
    }

    pub fn get(&self, id: &EffectivityEventId) -> Option<&EffectivityEvent> {
        self.events.iter().find(|e| &e.id == id)
    }

    /// Due events in processing order: by date, then by scheduling time
    pub fn due(&self, now: DateTime<Utc>) -> Vec<EffectivityEventId> {
        let mut due: Vec<&EffectivityEvent> = self.events.iter().filter(|e| e.is_due(now)).collect();
        due.sort_by_key(|e| (e.effective_date, e.created_at));
        due.into_iter().map(|e| e.id.clone()).collect()
    }

    /// Flag an event consumed; returns false if it already was
    pub fn mark_triggered(&mut self, id: &EffectivityEventId, at: DateTime<Utc>) -> bool {
        match self.events.iter_mut().find(|e| &e.id == id) {
            Some(event) if !event.triggered => {
                event.triggered = true;
                event.triggered_at = Some(at);
                true
            }
            _ => false,
        }
    }

    pub fn pending(&self) -> Vec<&EffectivityEvent> {
        self.events.iter().filter(|e| !e.triggered).collect()
    }

    /// Untriggered events whose due time lies more than `grace` before `now`
    pub fn overdue(&self, now: DateTime<Utc>, grace: Duration) -> Vec<&EffectivityEvent> {
        self.events
            .iter()
            .filter(|e| !e.triggered && now - e.due_at() > grace)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

// ── Sweep ────────────────────────────────────────────────────────────

impl DocumentControl {
    /// Process every due effectivity event.
    ///
    /// Safe to re-run: consumed events are never processed twice.
    pub fn sweep(&self, now: DateTime<Utc>) -> DocControlResult<Vec<PromotionResult>> {
        let due = self.read()?.queue.due(now);
        tracing::debug!(due = due.len(), now = %now, "Effectivity sweep started");

        let mut results = Vec::with_capacity(due.len());
        for event_id in due {
            let mut outbox = Outbox::default();
            let result = {
                let mut guard = self.write()?;
                self.process_event(&mut guard, &event_id, now, &mut outbox)
            };
            self.flush(outbox);
            if let Some(result) = result {
                results.push(result);
            }
        }

        if !results.is_empty() {
            tracing::info!(processed = results.len(), "Effectivity sweep finished");
        }
        Ok(results)
    }

    /// Report due events that have waited longer than the grace window
    pub fn overdue_events(&self, now: DateTime<Utc>) -> DocControlResult<Vec<DocControlError>> {
        let books = self.read()?;
        let missed = books
            .queue
            .overdue(now, self.config.grace_window())
            .into_iter()
            .map(|event| {
                tracing::warn!(
                    event_id = %event.id,
                    document_id = %event.document_id,
                    due = %event.due_at(),
                    "Effectivity event missed its window"
                );
                DocControlError::SchedulerMissedWindow {
                    event_id: event.id.clone(),
                    version_id: event.document_version_id.clone(),
                    due: event.due_at(),
                    detected_at: now,
                }
            })
            .collect();
        Ok(missed)
    }

    fn process_event(
        &self,
        books: &mut Books,
        event_id: &EffectivityEventId,
        now: DateTime<Utc>,
        outbox: &mut Outbox,
    ) -> Option<PromotionResult> {
        // Another sweep may have consumed it between listing and locking
        let event = books.queue.get(event_id).filter(|e| !e.triggered)?.clone();

        let snapshot = books.clone();
        let applied = match event.kind {
            EffectivityKind::Effective => self.promote(books, &event, now, outbox),
            EffectivityKind::Obsolescence => self.retire(books, &event, now, outbox),
        };
        // A failed application stays pending so a later sweep retries it
        let outcome = match applied {
            Ok(outcome) => {
                books.queue.mark_triggered(event_id, now);
                outcome
            }
            Err(e) => {
                *books = snapshot;
                *outbox = Outbox::default();
                tracing::warn!(
                    event_id = %event.id,
                    error = %e,
                    "Effectivity event could not be applied, left pending"
                );
                PromotionOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
        };

        tracing::debug!(event_id = %event.id, outcome = ?outcome, "Effectivity event processed");
        Some(PromotionResult {
            event_id: event.id,
            document_id: event.document_id,
            version_id: event.document_version_id,
            workflow_id: event.workflow_id,
            outcome,
        })
    }

    /// Checks shared by both kinds: the workflow is still parked in
    /// `state`, the version still has `status`, and the workflow still
    /// holds the document lease.
    fn waiting_workflow(
        &self,
        books: &Books,
        event: &EffectivityEvent,
        state: WorkflowState,
        status: VersionStatus,
    ) -> DocControlResult<Result<WorkflowInstance, String>> {
        let Some(instance) = books.workflows.get(&event.workflow_id) else {
            return Ok(Err(format!("workflow {} not found", event.workflow_id)));
        };
        if instance.state != state {
            return Ok(Err(format!("workflow is {}, not {}", instance.state, state)));
        }
        let version = books.versions.get(&event.document_version_id)?;
        if version.status != status {
            return Ok(Err(format!("version {} is {}", version.version_number, version.status)));
        }
        if !self.leases.is_held_by(&event.document_id, &instance.id) {
            return Ok(Err("workflow no longer holds the document lease".to_string()));
        }
        Ok(Ok(instance.clone()))
    }

    fn promote(
        &self,
        books: &mut Books,
        event: &EffectivityEvent,
        now: DateTime<Utc>,
        outbox: &mut Outbox,
    ) -> DocControlResult<PromotionOutcome> {
        let instance = match self.waiting_workflow(
            books,
            event,
            WorkflowState::PendingEffective,
            VersionStatus::ApprovedPendingEffective,
        )? {
            Ok(instance) => instance,
            Err(reason) => return Ok(PromotionOutcome::Skipped { reason }),
        };
        let rule = scheduler_rule(&instance, Action::Fire)?;
        let document_id = &event.document_id;
        let version_id = &event.document_version_id;

        let prior = books
            .versions
            .effective_version(document_id)
            .map(|v| v.id.clone())
            .filter(|id| id != version_id);
        let stamp = books.registry.get(document_id)?.stamp;
        books
            .registry
            .set_current_version(document_id, version_id, stamp)?;

        if let Some(prior) = &prior {
            books.versions.supersede(prior)?;
            outbox.audit(
                AuditEvent::new(
                    AuditEventKind::VersionSuperseded,
                    document_id.clone(),
                    self.system_actor(),
                    "superseded by a newer effective version",
                )
                .with_version(prior.clone())
                .with_workflow(instance.id.clone()),
            );
        }
        books
            .versions
            .set_status(version_id, VersionStatus::ApprovedEffective)?;
        let number = books.versions.get(version_id)?.version_number;

        tracing::info!(
            document_id = %document_id,
            version = %number,
            superseded = ?prior.as_ref().map(|p| p.as_str()),
            "Version became effective"
        );
        outbox.audit(
            AuditEvent::new(
                AuditEventKind::VersionEffective,
                document_id.clone(),
                self.system_actor(),
                format!("version {} effective from {}", number, event.effective_date),
            )
            .with_version(version_id.clone())
            .with_workflow(instance.id.clone()),
        );

        if instance.workflow_type == WorkflowType::UpVersion {
            let notices =
                books
                    .graph
                    .notify_dependents(document_id, number, &books.registry, &books.versions);
            outbox.extend_notices(notices);
        }

        self.finish(books, instance, rule, None, now, outbox)?;
        Ok(PromotionOutcome::Promoted { superseded: prior })
    }

    fn retire(
        &self,
        books: &mut Books,
        event: &EffectivityEvent,
        now: DateTime<Utc>,
        outbox: &mut Outbox,
    ) -> DocControlResult<PromotionOutcome> {
        let mut instance = match self.waiting_workflow(
            books,
            event,
            WorkflowState::PendingObsolescence,
            VersionStatus::PendingObsolescence,
        )? {
            Ok(instance) => instance,
            Err(reason) => return Ok(PromotionOutcome::Skipped { reason }),
        };
        let document_id = &event.document_id;
        let version_id = &event.document_version_id;

        let dependents = books.graph.active_dependents(document_id, &books.versions);
        if !dependents.is_empty() {
            let rule = scheduler_rule(&instance, Action::Terminate)?;
            let reason = FORCED_TERMINATION_REASON.to_string();
            books
                .versions
                .set_status(version_id, VersionStatus::ApprovedEffective)?;
            instance.reason = Some(reason.clone());

            tracing::warn!(
                document_id = %document_id,
                workflow_id = %instance.id,
                dependents = dependents.len(),
                "Obsolescence aborted at final dependency check"
            );
            outbox.audit(
                AuditEvent::new(
                    AuditEventKind::WorkflowTerminated,
                    document_id.clone(),
                    self.system_actor(),
                    reason.clone(),
                )
                .with_version(version_id.clone())
                .with_workflow(instance.id.clone()),
            );
            let document = books.registry.get(document_id)?;
            let mut recipients = vec![instance.author.clone()];
            if document.owner != instance.author {
                recipients.push(document.owner.clone());
            }
            outbox.notify(
                recipients,
                NotificationEvent::new(
                    NotificationKind::ObsolescenceAborted {
                        reason: reason.clone(),
                    },
                    document_id.clone(),
                    document.document_number.clone(),
                )
                .for_workflow(instance.id.clone()),
            );

            self.finish(books, instance, rule, Some(reason.clone()), now, outbox)?;
            return Ok(PromotionOutcome::ForcedTermination { reason });
        }

        let rule = scheduler_rule(&instance, Action::Fire)?;
        books.versions.mark_obsolete(version_id)?;
        let number = books.versions.get(version_id)?.version_number;
        tracing::info!(document_id = %document_id, version = %number, "Version obsoleted");
        outbox.audit(
            AuditEvent::new(
                AuditEventKind::VersionObsoleted,
                document_id.clone(),
                self.system_actor(),
                format!("version {} obsolete from {}", number, event.effective_date),
            )
            .with_version(version_id.clone())
            .with_workflow(instance.id.clone()),
        );

        self.finish(books, instance, rule, None, now, outbox)?;
        Ok(PromotionOutcome::Obsoleted)
    }

    /// Record the scheduler's step, close the workflow and free the lease
    fn finish(
        &self,
        books: &mut Books,
        mut instance: WorkflowInstance,
        rule: &RouteRule,
        comment: Option<String>,
        now: DateTime<Utc>,
        outbox: &mut Outbox,
    ) -> DocControlResult<()> {
        let from = instance.state;
        let actor = self.system_actor();
        instance.enter(rule.to);
        instance.record_step(StepRecord {
            sequence: 0,
            step_type: StepRole::Scheduler,
            actor_id: actor.clone(),
            decision: rule.action.decision(),
            comment,
            from,
            to: rule.to,
            timestamp: now,
            signature_ref: None,
        });
        books.registry.touch(&instance.document_id)?;
        self.leases.release(&instance.document_id, &instance.id);

        tracing::info!(
            document_id = %instance.document_id,
            workflow_id = %instance.id,
            from = %from,
            to = %rule.to,
            "Workflow transition"
        );
        outbox.audit(
            AuditEvent::new(
                AuditEventKind::Transition { from, to: rule.to },
                instance.document_id.clone(),
                actor,
                format!("{} by scheduler ({} -> {})", rule.action, from, rule.to),
            )
            .with_version(instance.document_version_id.clone())
            .with_workflow(instance.id.clone()),
        );
        books.workflows.insert(instance.id.clone(), instance);
        Ok(())
    }
}

fn scheduler_rule(instance: &WorkflowInstance, action: Action) -> DocControlResult<&'static RouteRule> {
    Route::for_type(instance.workflow_type)
        .find(instance.state, action, true)
        .ok_or_else(|| {
            DocControlError::StateTransition(format!(
                "no scheduler {} from {} in a {} workflow",
                action, instance.state, instance.workflow_type
            ))
        })
}

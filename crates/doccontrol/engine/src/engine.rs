//! Workflow Engine: the `DocumentControl` façade
//!
//! Every mutating call follows the same shape: take the write guard,
//! validate everything (state, stamp, route, RBAC, actor, input), bind
//! the signature if the step needs one, then apply. Audit events and
//! notifications are collected while the guard is held and dispatched
//! after it is dropped, so a slow or failing collaborator never holds
//! the lock or rolls back a committed change.

use crate::audit::AuditDispatcher;
use crate::collaborators::{AccessControl, Collaborators, ContentStore, Notifier};
use crate::config::EngineConfig;
use crate::graph::{DependencyGraph, Notice};
use crate::lease::LeaseTable;
use crate::registry::DocumentRegistry;
use crate::route::{Route, RouteRule};
use crate::scheduler::EffectivityQueue;
use crate::signature::{SignatureBinder, SigningPayload};
use crate::versions::VersionManager;
use chrono::{DateTime, NaiveDate, Utc};
use doccontrol_types::*;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

// ── Inputs ───────────────────────────────────────────────────────────

/// Caller-supplied data accompanying an action
#[derive(Clone, Debug, Default)]
pub struct StepInput {
    /// Rejection comment or termination reason
    pub comment: Option<String>,
    /// Reviewers or approvers routed to on submit
    pub assignees: Vec<ActorId>,
    /// Effective (or obsolescence) date chosen by the Approver
    pub effective_date: Option<NaiveDate>,
    /// Last `Document.stamp` the caller saw
    pub expected_stamp: Option<u64>,
}

impl StepInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_assignees(mut self, assignees: Vec<ActorId>) -> Self {
        self.assignees = assignees;
        self
    }

    pub fn with_effective_date(mut self, date: NaiveDate) -> Self {
        self.effective_date = Some(date);
        self
    }

    pub fn expecting(mut self, stamp: u64) -> Self {
        self.expected_stamp = Some(stamp);
        self
    }

    fn comment(&self) -> Option<&str> {
        self.comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

// ── Internal state ───────────────────────────────────────────────────

/// Everything guarded by the engine lock
#[derive(Clone, Default)]
pub(crate) struct Books {
    pub(crate) registry: DocumentRegistry,
    pub(crate) versions: VersionManager,
    pub(crate) graph: DependencyGraph,
    pub(crate) workflows: HashMap<WorkflowInstanceId, WorkflowInstance>,
    pub(crate) queue: EffectivityQueue,
}

/// Side effects collected under the lock, delivered after it is released
#[derive(Default)]
pub(crate) struct Outbox {
    audit: Vec<AuditEvent>,
    notices: Vec<Notice>,
}

impl Outbox {
    pub(crate) fn audit(&mut self, event: AuditEvent) {
        self.audit.push(event);
    }

    pub(crate) fn notify(&mut self, recipients: Vec<ActorId>, event: NotificationEvent) {
        if !recipients.is_empty() {
            self.notices.push(Notice { recipients, event });
        }
    }

    pub(crate) fn extend_notices(&mut self, notices: Vec<Notice>) {
        self.notices.extend(notices);
    }
}

// ── Engine ───────────────────────────────────────────────────────────

/// The document control engine
pub struct DocumentControl {
    pub(crate) config: EngineConfig,
    pub(crate) books: RwLock<Books>,
    pub(crate) leases: LeaseTable,
    content: Arc<dyn ContentStore>,
    access: Arc<dyn AccessControl>,
    binder: SignatureBinder,
    audit: AuditDispatcher,
    notifier: Arc<dyn Notifier>,
}

impl DocumentControl {
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Self {
        let books = Books {
            registry: DocumentRegistry::new(config.document_number_width),
            ..Books::default()
        };
        Self {
            audit: AuditDispatcher::new(collaborators.audit, config.audit_failure_alert_threshold),
            binder: SignatureBinder::new(collaborators.signer),
            content: collaborators.content,
            access: collaborators.access,
            notifier: collaborators.notifier,
            books: RwLock::new(books),
            leases: LeaseTable::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn audit_dispatcher(&self) -> &AuditDispatcher {
        &self.audit
    }

    pub(crate) fn read(&self) -> DocControlResult<RwLockReadGuard<'_, Books>> {
        self.books.read().map_err(|_| DocControlError::LockError)
    }

    pub(crate) fn write(&self) -> DocControlResult<RwLockWriteGuard<'_, Books>> {
        self.books.write().map_err(|_| DocControlError::LockError)
    }

    pub(crate) fn system_actor(&self) -> ActorId {
        ActorId::new(self.config.system_actor.clone())
    }

    fn authorize(
        &self,
        actor: &ActorId,
        permission: Permission,
        document_id: Option<&DocumentId>,
    ) -> DocControlResult<()> {
        if self.access.can_perform(actor, permission, document_id) {
            return Ok(());
        }
        tracing::warn!(
            actor = %actor,
            permission = %permission,
            document_id = ?document_id.map(|d| d.as_str()),
            "Action denied by access control"
        );
        Err(DocControlError::Authorization {
            actor: actor.clone(),
            permission,
            document_id: document_id.cloned(),
        })
    }

    /// Deliver collected side effects. Must be called without the guard held.
    pub(crate) fn flush(&self, outbox: Outbox) {
        self.audit.dispatch_all(&outbox.audit);
        for notice in outbox.notices {
            if let Err(e) = self.notifier.notify(&notice.recipients, &notice.event) {
                tracing::warn!(
                    document_id = %notice.event.document_id,
                    recipients = notice.recipients.len(),
                    error = %e,
                    "Notification delivery failed"
                );
            }
        }
    }

    // ── Documents and content ────────────────────────────────────────

    /// Register a new document with no versions
    pub fn create_document(&self, request: NewDocument) -> DocControlResult<Document> {
        self.authorize(&request.author, Permission::CreateDocument, None)?;
        let mut outbox = Outbox::default();
        let document = {
            let mut books = self.write()?;
            let document = books.registry.create(request)?;
            outbox.audit(AuditEvent::new(
                AuditEventKind::DocumentCreated,
                document.id.clone(),
                document.owner.clone(),
                format!("{} '{}' registered", document.document_number, document.title),
            ));
            document
        };
        self.flush(outbox);
        Ok(document)
    }

    pub fn store_content(&self, bytes: Vec<u8>) -> DocControlResult<ContentRef> {
        self.content
            .put(bytes)
            .map_err(|e| DocControlError::Storage(e.to_string()))
    }

    pub fn content_of(&self, version_id: &VersionId) -> DocControlResult<Vec<u8>> {
        let content_ref = self.read()?.versions.get(version_id)?.content_ref.clone();
        self.content
            .get(&content_ref)
            .map_err(|e| DocControlError::Storage(e.to_string()))
    }

    // ── Workflow entry points ────────────────────────────────────────

    /// Start the first Review of a document: creates version 0.1 in Draft
    pub fn start_review(
        &self,
        document_id: &DocumentId,
        author: &ActorId,
        content_ref: ContentRef,
    ) -> DocControlResult<WorkflowInstance> {
        self.authorize(author, Permission::AuthorDocument, Some(document_id))?;
        let mut outbox = Outbox::default();
        let instance = {
            let mut guard = self.write()?;
            let books = &mut *guard;
            let document = books.registry.get(document_id)?;
            self.ensure_unleased(document_id)?;
            if books.versions.has_undiscarded(document_id) {
                return Err(DocControlError::StateTransition(format!(
                    "document {} already has versions; start an up-version instead",
                    document.document_number
                )));
            }

            let version = books.versions.start_new_version(
                document_id,
                None,
                VersionBump::Minor,
                author.clone(),
                content_ref,
            )?;
            let instance = WorkflowInstance::new(
                WorkflowType::Review,
                document_id.clone(),
                version.id,
                author.clone(),
            );
            self.open(books, instance, &mut outbox)?
        };
        self.flush(outbox);
        Ok(instance)
    }

    /// Start an up-version from the current `ApprovedEffective` version
    pub fn start_up_version(
        &self,
        document_id: &DocumentId,
        author: &ActorId,
        content_ref: ContentRef,
        bump: VersionBump,
        expected_stamp: Option<u64>,
    ) -> DocControlResult<WorkflowInstance> {
        self.authorize(author, Permission::AuthorDocument, Some(document_id))?;
        let mut outbox = Outbox::default();
        let instance = {
            let mut guard = self.write()?;
            let books = &mut *guard;
            let document = books.registry.get(document_id)?;
            check_expected_stamp(books, document_id, expected_stamp)?;
            if books
                .versions
                .with_status(document_id, VersionStatus::PendingObsolescence)
                .is_some()
            {
                return Err(DocControlError::StateTransition(format!(
                    "document {} is pending obsolescence",
                    document.document_number
                )));
            }
            let base = books
                .versions
                .effective_version(document_id)
                .map(|v| v.id.clone())
                .ok_or_else(|| {
                    DocControlError::StateTransition(format!(
                        "document {} has no Approved and Effective version to up-version",
                        document.document_number
                    ))
                })?;
            self.ensure_unleased(document_id)?;

            let version = books.versions.start_new_version(
                document_id,
                Some(&base),
                bump,
                author.clone(),
                content_ref,
            )?;
            let instance = WorkflowInstance::new(
                WorkflowType::UpVersion,
                document_id.clone(),
                version.id,
                author.clone(),
            )
            .with_base(base, bump);
            self.open(books, instance, &mut outbox)?
        };
        self.flush(outbox);
        Ok(instance)
    }

    /// Start retiring the current `ApprovedEffective` version.
    ///
    /// Fails with `DependencyBlocked` while any live document depends on
    /// this one.
    pub fn start_obsolescence(
        &self,
        document_id: &DocumentId,
        author: &ActorId,
        reason: &str,
        expected_stamp: Option<u64>,
    ) -> DocControlResult<WorkflowInstance> {
        self.authorize(author, Permission::RetireDocument, Some(document_id))?;
        if reason.trim().is_empty() {
            return Err(DocControlError::Validation(
                "an obsolescence reason is required".into(),
            ));
        }
        let mut outbox = Outbox::default();
        let instance = {
            let mut guard = self.write()?;
            let books = &mut *guard;
            let document = books.registry.get(document_id)?;
            check_expected_stamp(books, document_id, expected_stamp)?;
            let effective = books
                .versions
                .effective_version(document_id)
                .map(|v| v.id.clone())
                .ok_or_else(|| {
                    DocControlError::StateTransition(format!(
                        "document {} has no Approved and Effective version to retire",
                        document.document_number
                    ))
                })?;

            let dependents = books.graph.active_dependents(document_id, &books.versions);
            if !dependents.is_empty() {
                tracing::warn!(
                    document_id = %document_id,
                    dependents = dependents.len(),
                    "Obsolescence blocked by active dependents"
                );
                return Err(DocControlError::DependencyBlocked {
                    document_id: document_id.clone(),
                    dependents,
                });
            }
            self.ensure_unleased(document_id)?;

            let instance = WorkflowInstance::new(
                WorkflowType::Obsolete,
                document_id.clone(),
                effective,
                author.clone(),
            )
            .with_reason(reason.trim());
            self.open(books, instance, &mut outbox)?
        };
        self.flush(outbox);
        Ok(instance)
    }

    fn ensure_unleased(&self, document_id: &DocumentId) -> DocControlResult<()> {
        match self.leases.holder(document_id) {
            Some(holder) => Err(DocControlError::StateTransition(format!(
                "workflow already active on document {}: {}",
                document_id, holder
            ))),
            None => Ok(()),
        }
    }

    /// Take the lease and record a freshly started workflow.
    ///
    /// Leases are only taken while the write guard is held.
    fn open(
        &self,
        books: &mut Books,
        instance: WorkflowInstance,
        outbox: &mut Outbox,
    ) -> DocControlResult<WorkflowInstance> {
        self.leases.acquire(&instance.document_id, &instance.id)?;
        books.registry.touch(&instance.document_id)?;

        let version = books.versions.get(&instance.document_version_id)?;
        tracing::info!(
            document_id = %instance.document_id,
            version = %version.version_number,
            workflow_id = %instance.id,
            workflow_type = %instance.workflow_type,
            "Workflow started"
        );
        outbox.audit(
            AuditEvent::new(
                AuditEventKind::WorkflowStarted,
                instance.document_id.clone(),
                instance.author.clone(),
                format!(
                    "{} workflow started on version {}",
                    instance.workflow_type, version.version_number
                ),
            )
            .with_version(version.id.clone())
            .with_workflow(instance.id.clone()),
        );

        books.workflows.insert(instance.id.clone(), instance.clone());
        Ok(instance)
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Perform a user action on an active workflow
    pub fn perform(
        &self,
        workflow_id: &WorkflowInstanceId,
        action: Action,
        actor: &ActorId,
        input: StepInput,
    ) -> DocControlResult<WorkflowInstance> {
        self.perform_at(workflow_id, action, actor, input, Utc::now())
    }

    /// [`perform`](Self::perform) with an explicit clock reading
    pub fn perform_at(
        &self,
        workflow_id: &WorkflowInstanceId,
        action: Action,
        actor: &ActorId,
        input: StepInput,
        now: DateTime<Utc>,
    ) -> DocControlResult<WorkflowInstance> {
        if action == Action::Fire {
            return Err(DocControlError::StateTransition(
                "Fire is reserved for the effectivity scheduler".into(),
            ));
        }

        let mut outbox = Outbox::default();
        let result = {
            let mut guard = self.write()?;
            let books = &mut *guard;
            let instance = books
                .workflows
                .get(workflow_id)
                .cloned()
                .ok_or_else(|| DocControlError::WorkflowNotFound(workflow_id.clone()))?;
            if !instance.is_active() {
                return Err(DocControlError::StateTransition(format!(
                    "workflow {} is already {}",
                    workflow_id, instance.state
                )));
            }
            check_expected_stamp(books, &instance.document_id, input.expected_stamp)?;

            let route = Route::for_type(instance.workflow_type);
            let rule = route.find(instance.state, action, false).ok_or_else(|| {
                DocControlError::StateTransition(format!(
                    "{} is not allowed in state {} of a {} workflow",
                    action, instance.state, instance.workflow_type
                ))
            })?;
            self.authorize(actor, route.permission(rule), Some(&instance.document_id))?;
            check_actor(&instance, rule, actor)?;
            check_input(&instance, rule, &input, now)?;

            let signature_ref = if action == Action::Approve {
                let document = books.registry.get(&instance.document_id)?;
                let version = books.versions.get(&instance.document_version_id)?;
                let payload = SigningPayload {
                    document_id: document.id.clone(),
                    document_number: document.document_number.clone(),
                    version_id: version.id.clone(),
                    version_number: version.version_number,
                    workflow_id: instance.id.clone(),
                    step: rule.role,
                    decision: action.decision(),
                    actor: actor.clone(),
                    timestamp: now,
                };
                Some(self.binder.bind(&payload)?)
            } else {
                None
            };

            self.apply(books, instance, rule, actor, input, signature_ref, now, &mut outbox)
        };
        self.flush(outbox);
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn apply(
        &self,
        books: &mut Books,
        mut instance: WorkflowInstance,
        rule: &RouteRule,
        actor: &ActorId,
        input: StepInput,
        signature_ref: Option<SignatureRef>,
        now: DateTime<Utc>,
        outbox: &mut Outbox,
    ) -> DocControlResult<WorkflowInstance> {
        let document = books.registry.get(&instance.document_id)?.clone();
        let version_id = instance.document_version_id.clone();
        let comment = input.comment().map(str::to_string);
        let from = instance.state;

        if let Some(status) = rule.status {
            books.versions.set_status(&version_id, status)?;
        }

        let workflow_id = instance.id.clone();
        let notification = |kind: NotificationKind| {
            NotificationEvent::new(kind, document.id.clone(), document.document_number.clone())
                .for_workflow(workflow_id.clone())
        };

        match (rule.action, rule.role) {
            (Action::SubmitForReview, _) => {
                outbox.notify(
                    input.assignees.clone(),
                    notification(NotificationKind::ReviewRequested),
                );
                instance.assign(StepRole::Reviewer, input.assignees);
            }
            (Action::SubmitForApproval, _) => {
                outbox.notify(
                    input.assignees.clone(),
                    notification(NotificationKind::ApprovalRequested),
                );
                instance.assign(StepRole::Approver, input.assignees);
            }
            (Action::Reject, _) => {
                outbox.notify(
                    vec![instance.author.clone()],
                    notification(NotificationKind::Rejected {
                        comment: comment.clone().unwrap_or_default(),
                    }),
                );
            }
            (Action::Approve, StepRole::Approver) => {
                let date = input.effective_date.unwrap_or_else(|| now.date_naive());
                let kind = match instance.workflow_type {
                    WorkflowType::Obsolete => EffectivityKind::Obsolescence,
                    WorkflowType::Review | WorkflowType::UpVersion => {
                        books.versions.set_effective_date(&version_id, date)?;
                        EffectivityKind::Effective
                    }
                };
                let event = EffectivityEvent::new(
                    kind,
                    document.id.clone(),
                    version_id.clone(),
                    instance.id.clone(),
                    date,
                );
                tracing::debug!(
                    event_id = %event.id,
                    document_id = %document.id,
                    effective_date = %date,
                    "Effectivity event scheduled"
                );
                books.queue.schedule(event);
            }
            (Action::Terminate, _) => {
                instance.reason = comment.clone();
                self.leases.release(&document.id, &instance.id);
                outbox.audit(
                    AuditEvent::new(
                        AuditEventKind::WorkflowTerminated,
                        document.id.clone(),
                        actor.clone(),
                        format!("terminated: {}", comment.clone().unwrap_or_default()),
                    )
                    .with_version(version_id.clone())
                    .with_workflow(instance.id.clone()),
                );
            }
            _ => {}
        }

        instance.enter(rule.to);
        instance.record_step(StepRecord {
            sequence: 0,
            step_type: rule.role,
            actor_id: actor.clone(),
            decision: rule.action.decision(),
            comment,
            from,
            to: rule.to,
            timestamp: now,
            signature_ref,
        });
        books.registry.touch(&document.id)?;

        let version_number = books.versions.get(&version_id)?.version_number;
        tracing::info!(
            document_id = %document.id,
            version = %version_number,
            workflow_id = %instance.id,
            from = %from,
            to = %rule.to,
            actor = %actor,
            "Workflow transition"
        );
        outbox.audit(
            AuditEvent::new(
                AuditEventKind::Transition { from, to: rule.to },
                document.id.clone(),
                actor.clone(),
                format!("{} by {} ({} -> {})", rule.action, actor, from, rule.to),
            )
            .with_version(version_id)
            .with_workflow(instance.id.clone()),
        );

        books.workflows.insert(instance.id.clone(), instance.clone());
        Ok(instance)
    }

    // ── Convenience actions ──────────────────────────────────────────

    pub fn submit_for_review(
        &self,
        workflow_id: &WorkflowInstanceId,
        author: &ActorId,
        reviewers: Vec<ActorId>,
    ) -> DocControlResult<WorkflowInstance> {
        self.perform(
            workflow_id,
            Action::SubmitForReview,
            author,
            StepInput::new().with_assignees(reviewers),
        )
    }

    pub fn submit_for_approval(
        &self,
        workflow_id: &WorkflowInstanceId,
        author: &ActorId,
        approvers: Vec<ActorId>,
    ) -> DocControlResult<WorkflowInstance> {
        self.perform(
            workflow_id,
            Action::SubmitForApproval,
            author,
            StepInput::new().with_assignees(approvers),
        )
    }

    /// Approve the current step; Approvers must supply the date
    pub fn approve(
        &self,
        workflow_id: &WorkflowInstanceId,
        actor: &ActorId,
        effective_date: Option<NaiveDate>,
    ) -> DocControlResult<WorkflowInstance> {
        let mut input = StepInput::new();
        input.effective_date = effective_date;
        self.perform(workflow_id, Action::Approve, actor, input)
    }

    pub fn reject(
        &self,
        workflow_id: &WorkflowInstanceId,
        actor: &ActorId,
        comment: &str,
    ) -> DocControlResult<WorkflowInstance> {
        self.perform(
            workflow_id,
            Action::Reject,
            actor,
            StepInput::new().with_comment(comment),
        )
    }

    pub fn terminate(
        &self,
        workflow_id: &WorkflowInstanceId,
        author: &ActorId,
        reason: &str,
    ) -> DocControlResult<WorkflowInstance> {
        self.perform(
            workflow_id,
            Action::Terminate,
            author,
            StepInput::new().with_comment(reason),
        )
    }

    // ── Dependencies ─────────────────────────────────────────────────

    /// Record that `from` depends on `to`.
    ///
    /// `expected_stamp` is checked against `from`, the document that changes.
    pub fn link_dependency(
        &self,
        actor: &ActorId,
        from: &DocumentId,
        to: &DocumentId,
        expected_stamp: Option<u64>,
    ) -> DocControlResult<DependencyEdge> {
        self.authorize(actor, Permission::LinkDependency, Some(from))?;
        let mut outbox = Outbox::default();
        let edge = {
            let mut guard = self.write()?;
            let books = &mut *guard;
            check_expected_stamp(books, from, expected_stamp)?;
            let edge = books
                .graph
                .add_edge(from, to, actor.clone(), &books.registry, &books.versions)?;
            books.registry.touch(from)?;
            tracing::info!(from = %from, to = %to, "Dependency linked");
            outbox.audit(AuditEvent::new(
                AuditEventKind::DependencyLinked { to: to.clone() },
                from.clone(),
                actor.clone(),
                format!("{} now depends on {}", from, to),
            ));
            edge
        };
        self.flush(outbox);
        Ok(edge)
    }

    pub fn unlink_dependency(
        &self,
        actor: &ActorId,
        from: &DocumentId,
        to: &DocumentId,
        expected_stamp: Option<u64>,
    ) -> DocControlResult<()> {
        self.authorize(actor, Permission::LinkDependency, Some(from))?;
        let mut outbox = Outbox::default();
        {
            let mut books = self.write()?;
            check_expected_stamp(&books, from, expected_stamp)?;
            books.graph.remove_edge(from, to)?;
            books.registry.touch(from)?;
            tracing::info!(from = %from, to = %to, "Dependency unlinked");
            outbox.audit(AuditEvent::new(
                AuditEventKind::DependencyUnlinked { to: to.clone() },
                from.clone(),
                actor.clone(),
                format!("{} no longer depends on {}", from, to),
            ));
        }
        self.flush(outbox);
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn document(&self, id: &DocumentId) -> DocControlResult<Document> {
        Ok(self.read()?.registry.get(id)?.clone())
    }

    pub fn documents(&self) -> DocControlResult<Vec<Document>> {
        Ok(self.read()?.registry.list().into_iter().cloned().collect())
    }

    pub fn version(&self, id: &VersionId) -> DocControlResult<DocumentVersion> {
        Ok(self.read()?.versions.get(id)?.clone())
    }

    pub fn versions_of(&self, document_id: &DocumentId) -> DocControlResult<Vec<DocumentVersion>> {
        let books = self.read()?;
        books.registry.get(document_id)?;
        Ok(books
            .versions
            .versions_of(document_id)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn effective_version(
        &self,
        document_id: &DocumentId,
    ) -> DocControlResult<Option<DocumentVersion>> {
        let books = self.read()?;
        Ok(books
            .registry
            .effective_version(document_id, &books.versions)?
            .cloned())
    }

    pub fn workflow(&self, id: &WorkflowInstanceId) -> DocControlResult<WorkflowInstance> {
        self.read()?
            .workflows
            .get(id)
            .cloned()
            .ok_or_else(|| DocControlError::WorkflowNotFound(id.clone()))
    }

    /// The workflow currently holding the document's lease
    pub fn active_workflow(
        &self,
        document_id: &DocumentId,
    ) -> DocControlResult<Option<WorkflowInstance>> {
        let books = self.read()?;
        books.registry.get(document_id)?;
        Ok(self
            .leases
            .holder(document_id)
            .and_then(|id| books.workflows.get(&id).cloned()))
    }

    pub fn workflows_of(
        &self,
        document_id: &DocumentId,
    ) -> DocControlResult<Vec<WorkflowInstance>> {
        let books = self.read()?;
        let mut workflows: Vec<WorkflowInstance> = books
            .workflows
            .values()
            .filter(|w| &w.document_id == document_id)
            .cloned()
            .collect();
        workflows.sort_by_key(|w| w.created_at);
        Ok(workflows)
    }

    pub fn history(&self, workflow_id: &WorkflowInstanceId) -> DocControlResult<Vec<StepRecord>> {
        Ok(self.workflow(workflow_id)?.history().to_vec())
    }

    /// Actions a user may take next on a workflow
    pub fn available_actions(
        &self,
        workflow_id: &WorkflowInstanceId,
    ) -> DocControlResult<Vec<Action>> {
        let instance = self.workflow(workflow_id)?;
        Ok(Route::for_type(instance.workflow_type).available(instance.state))
    }

    pub fn dependents_of(&self, document_id: &DocumentId) -> DocControlResult<Vec<DocumentId>> {
        let books = self.read()?;
        books.registry.get(document_id)?;
        Ok(books.graph.dependents_of(document_id))
    }

    pub fn dependencies_of(&self, document_id: &DocumentId) -> DocControlResult<Vec<DocumentId>> {
        let books = self.read()?;
        books.registry.get(document_id)?;
        Ok(books.graph.dependencies_of(document_id))
    }

    /// Effectivity events not yet consumed by a sweep
    pub fn pending_events(&self) -> DocControlResult<Vec<EffectivityEvent>> {
        Ok(self.read()?.queue.pending().into_iter().cloned().collect())
    }

    /// Check the signature on one step of a workflow's history.
    ///
    /// Steps without a signature verify as `false`.
    pub fn verify_step(
        &self,
        workflow_id: &WorkflowInstanceId,
        sequence: u64,
    ) -> DocControlResult<bool> {
        let instance = self.workflow(workflow_id)?;
        let step = instance
            .history()
            .iter()
            .find(|s| s.sequence == sequence)
            .ok_or_else(|| {
                DocControlError::Validation(format!(
                    "workflow {} has no step {}",
                    workflow_id, sequence
                ))
            })?;
        Ok(step
            .signature_ref
            .as_ref()
            .map(|sig| self.binder.verify(sig))
            .unwrap_or(false))
    }
}

// ── Checks ───────────────────────────────────────────────────────────

/// The caller's last-seen stamp must still be current
fn check_expected_stamp(
    books: &Books,
    document_id: &DocumentId,
    expected: Option<u64>,
) -> DocControlResult<()> {
    match expected {
        Some(expected) => books.registry.check_stamp(document_id, expected),
        None => Ok(()),
    }
}

fn check_actor(
    instance: &WorkflowInstance,
    rule: &RouteRule,
    actor: &ActorId,
) -> DocControlResult<()> {
    match rule.role {
        StepRole::Author => {
            if actor != &instance.author {
                return Err(DocControlError::StateTransition(format!(
                    "only the workflow author {} may {}",
                    instance.author, rule.action
                )));
            }
        }
        StepRole::Reviewer | StepRole::Approver => {
            if actor == &instance.author {
                return Err(DocControlError::StateTransition(format!(
                    "conflicting actor: {} authored this workflow and cannot act as {}",
                    actor, rule.role
                )));
            }
            if !instance.assigned_to(rule.role).contains(actor) {
                return Err(DocControlError::StateTransition(format!(
                    "{} is not assigned to the {} step",
                    actor, rule.role
                )));
            }
        }
        StepRole::Scheduler => {
            return Err(DocControlError::StateTransition(
                "scheduler steps cannot be performed by users".into(),
            ));
        }
    }
    Ok(())
}

fn check_input(
    instance: &WorkflowInstance,
    rule: &RouteRule,
    input: &StepInput,
    now: DateTime<Utc>,
) -> DocControlResult<()> {
    match rule.action {
        Action::Reject if input.comment().is_none() => Err(DocControlError::Validation(
            "a comment is required to reject".into(),
        )),
        Action::Terminate if input.comment().is_none() => Err(DocControlError::Validation(
            "a reason is required to terminate".into(),
        )),
        Action::SubmitForReview | Action::SubmitForApproval => {
            if input.assignees.is_empty() {
                return Err(DocControlError::Validation(format!(
                    "{} requires at least one assignee",
                    rule.action
                )));
            }
            if input.assignees.contains(&instance.author) {
                return Err(DocControlError::Validation(format!(
                    "conflicting actor: author {} cannot be assigned to review or approve",
                    instance.author
                )));
            }
            Ok(())
        }
        Action::Approve if rule.role == StepRole::Approver => {
            let date = input.effective_date.ok_or_else(|| {
                DocControlError::Validation(match instance.workflow_type {
                    WorkflowType::Obsolete => "an obsolescence date is required to approve".into(),
                    _ => "an effective date is required to approve".into(),
                })
            })?;
            let today = now.date_naive();
            if date < today {
                return Err(DocControlError::Validation(format!(
                    "date {} lies before the approval day {}",
                    date, today
                )));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

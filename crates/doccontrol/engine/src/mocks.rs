//! Test doubles for the collaborator traits

use crate::collaborators::*;
use crate::memory::InMemoryContentStore;
use doccontrol_types::*;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

// ── Access control ───────────────────────────────────────────────────

/// Mock RBAC collaborator.
///
/// Either allows everything, or only what was explicitly granted.
pub struct MockAccessControl {
    allow_all: bool,
    grants: Mutex<HashMap<ActorId, HashSet<Permission>>>,
}

impl MockAccessControl {
    pub fn allow_all() -> Self {
        Self {
            allow_all: true,
            grants: Mutex::new(HashMap::new()),
        }
    }

    pub fn deny_all() -> Self {
        Self {
            allow_all: false,
            grants: Mutex::new(HashMap::new()),
        }
    }

    /// Grant a permission to an actor (on every document)
    pub fn grant(&self, actor: impl Into<ActorId>, permission: Permission) {
        if let Ok(mut grants) = self.grants.lock() {
            grants.entry(actor.into()).or_default().insert(permission);
        }
    }
}

impl AccessControl for MockAccessControl {
    fn can_perform(
        &self,
        actor: &ActorId,
        permission: Permission,
        _document_id: Option<&DocumentId>,
    ) -> bool {
        if self.allow_all {
            return true;
        }
        self.grants
            .lock()
            .map(|grants| {
                grants
                    .get(actor)
                    .map(|perms| perms.contains(&permission))
                    .unwrap_or(false)
            })
            .unwrap_or(false)
    }
}

// ── Signatures ───────────────────────────────────────────────────────

/// Mock signer that issues `mock-sig-<n>` references
pub struct MockSignatureService {
    failing: AtomicBool,
    counter: AtomicU64,
    issued: Mutex<HashSet<SignatureRef>>,
}

impl MockSignatureService {
    pub fn new() -> Self {
        Self {
            failing: AtomicBool::new(false),
            counter: AtomicU64::new(0),
            issued: Mutex::new(HashSet::new()),
        }
    }

    /// A signer whose every call fails
    pub fn failing() -> Self {
        let signer = Self::new();
        signer.set_failing(true);
        signer
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn signed_count(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

impl Default for MockSignatureService {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureService for MockSignatureService {
    fn sign(&self, _payload: &[u8]) -> Result<SignatureRef, CollaboratorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Unavailable("mock signer offline".into()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let sig = SignatureRef::new(format!("mock-sig-{}", n));
        if let Ok(mut issued) = self.issued.lock() {
            issued.insert(sig.clone());
        }
        Ok(sig)
    }

    fn verify(&self, signature_ref: &SignatureRef) -> bool {
        self.issued
            .lock()
            .map(|issued| issued.contains(signature_ref))
            .unwrap_or(false)
    }
}

// ── Audit ────────────────────────────────────────────────────────────

/// Audit sink that keeps every event in memory
pub struct RecordingAuditSink {
    events: Mutex<Vec<AuditEvent>>,
    failing: AtomicBool,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RecordingAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: &AuditEvent) -> Result<(), CollaboratorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Unavailable("mock audit store offline".into()));
        }
        self.events
            .lock()
            .map_err(|_| CollaboratorError::Unavailable("poisoned".into()))?
            .push(event.clone());
        Ok(())
    }
}

// ── Notifications ────────────────────────────────────────────────────

/// Notifier that keeps every delivery in memory
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(Vec<ActorId>, NotificationEvent)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(Vec<ActorId>, NotificationEvent)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Deliveries that reached `actor`
    pub fn received_by(&self, actor: &ActorId) -> Vec<NotificationEvent> {
        self.sent()
            .into_iter()
            .filter(|(to, _)| to.contains(actor))
            .map(|(_, event)| event)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(
        &self,
        recipients: &[ActorId],
        event: &NotificationEvent,
    ) -> Result<(), CollaboratorError> {
        self.sent
            .lock()
            .map_err(|_| CollaboratorError::Unavailable("poisoned".into()))?
            .push((recipients.to_vec(), event.clone()));
        Ok(())
    }
}

// ── Bundle ───────────────────────────────────────────────────────────

/// Typed handles on a full set of mocks, for assertions after wiring
#[derive(Clone)]
pub struct MockCollaborators {
    pub content: Arc<InMemoryContentStore>,
    pub access: Arc<MockAccessControl>,
    pub signer: Arc<MockSignatureService>,
    pub audit: Arc<RecordingAuditSink>,
    pub notifier: Arc<RecordingNotifier>,
}

impl MockCollaborators {
    /// Everything permitted, everything succeeds
    pub fn permissive() -> Self {
        Self::with_access(MockAccessControl::allow_all())
    }

    pub fn with_access(access: MockAccessControl) -> Self {
        Self {
            content: Arc::new(InMemoryContentStore::new()),
            access: Arc::new(access),
            signer: Arc::new(MockSignatureService::new()),
            audit: Arc::new(RecordingAuditSink::new()),
            notifier: Arc::new(RecordingNotifier::new()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            content: self.content.clone(),
            access: self.access.clone(),
            signer: self.signer.clone(),
            audit: self.audit.clone(),
            notifier: self.notifier.clone(),
        }
    }
}

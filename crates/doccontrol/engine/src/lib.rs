//! Document Control Engine
//!
//! The lifecycle core of a regulated document management system. It
//! moves controlled documents through review, approval, scheduled
//! effectivity, up-versioning and obsolescence, and keeps the regulatory
//! invariants: one effective version per document, append-only history,
//! signed approvals, and no retirement while live dependents exist.
//!
//! # Architecture
//!
//! [`DocumentControl`] composes the components and owns the one lock they
//! share:
//!
//! - [`DocumentRegistry`]: document numbers and the current-version pointer
//! - [`VersionManager`]: version numbering and status bookkeeping
//! - [`DependencyGraph`]: the acyclic "depends on" graph
//! - [`Route`]: transition tables for Review, Up-version and Obsolescence
//! - [`EffectivityQueue`] and [`DocumentControl::sweep`]: dated promotions
//! - [`SignatureBinder`]: signing of approval steps
//! - [`AuditDispatcher`]: fire-and-forget audit delivery
//!
//! Storage, RBAC, signing, audit persistence and notification delivery
//! are collaborators behind the traits in [`collaborators`].
//!
//! # Example
//!
//! ```rust
//! use chrono::{NaiveDate, TimeZone, Utc};
//! use doccontrol_engine::mocks::MockCollaborators;
//! use doccontrol_engine::{DocumentControl, EngineConfig, StepInput};
//! use doccontrol_types::*;
//!
//! let mocks = MockCollaborators::permissive();
//! let engine = DocumentControl::new(EngineConfig::default(), mocks.collaborators());
//!
//! let author = ActorId::new("alice");
//! let doc = engine
//!     .create_document(NewDocument::new(
//!         DocumentType::Procedure,
//!         DocumentSource::OriginalDigitalDraft,
//!         "Cleaning of Line 3",
//!         author.clone(),
//!     ))
//!     .unwrap();
//! let content = engine.store_content(b"...".to_vec()).unwrap();
//! let wf = engine.start_review(&doc.id, &author, content).unwrap();
//!
//! let approved_on = Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap();
//! let effective = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
//! let steps = [
//!     (Action::SubmitForReview, "alice", StepInput::new().with_assignees(vec!["bob".into()])),
//!     (Action::Approve, "bob", StepInput::new()),
//!     (Action::SubmitForApproval, "alice", StepInput::new().with_assignees(vec!["carol".into()])),
//!     (Action::Approve, "carol", StepInput::new().with_effective_date(effective)),
//! ];
//! for (action, actor, input) in steps {
//!     engine
//!         .perform_at(&wf.id, action, &ActorId::new(actor), input, approved_on)
//!         .unwrap();
//! }
//!
//! let results = engine
//!     .sweep(Utc.with_ymd_and_hms(2025, 1, 10, 0, 5, 0).unwrap())
//!     .unwrap();
//! assert_eq!(results.len(), 1);
//! assert_eq!(
//!     engine.effective_version(&doc.id).unwrap().unwrap().status,
//!     VersionStatus::ApprovedEffective
//! );
//! ```

#![deny(unsafe_code)]

pub mod audit;
pub mod collaborators;
pub mod config;
pub mod engine;
pub mod graph;
pub mod lease;
pub mod memory;
pub mod mocks;
pub mod registry;
pub mod route;
pub mod scheduler;
pub mod signature;
pub mod versions;

pub use audit::AuditDispatcher;
pub use collaborators::{
    AccessControl, AuditSink, CollaboratorError, Collaborators, ContentStore, Notifier,
    SignatureService,
};
pub use config::EngineConfig;
pub use engine::{DocumentControl, StepInput};
pub use graph::{DependencyGraph, Notice};
pub use lease::LeaseTable;
pub use memory::InMemoryContentStore;
pub use registry::DocumentRegistry;
pub use route::{Route, RouteRule};
pub use scheduler::EffectivityQueue;
pub use signature::{SignatureBinder, SigningPayload};
pub use versions::VersionManager;

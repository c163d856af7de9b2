//! Document Control Domain Types
//!
//! Types for the regulated-document lifecycle core: controlled
//! documents, their versions, the workflows that move versions through
//! review, approval and effectivity, and the records those workflows
//! leave behind.
//!
//! # Key Concepts
//!
//! - **Document**: identity and classification, plus a weak pointer to
//!   the version that last completed a workflow.
//! - **DocumentVersion**: one immutable content snapshot; only its
//!   status and effective date ever change.
//! - **WorkflowInstance**: one Review, Up-version or Obsolescence run,
//!   with an append-only [`StepRecord`] history.
//! - **DependencyEdge**: "from depends on to"; the graph is a DAG.
//! - **EffectivityEvent**: a dated promotion or obsolescence, consumed
//!   exactly once by the scheduler sweep.
//!
//! # Invariants
//!
//! 1. At most one `ApprovedEffective` version per document.
//! 2. A document cannot be retired while a live dependent points at it.
//! 3. Workflow history is append-only.
//! 4. Version numbers strictly increase within a document.
//! 5. The dependency graph is acyclic.

#![deny(unsafe_code)]

mod dependency;
mod document;
mod effectivity;
mod errors;
mod events;
mod ids;
mod permission;
mod version;
mod workflow;

pub use dependency::*;
pub use document::*;
pub use effectivity::*;
pub use errors::*;
pub use events::*;
pub use ids::*;
pub use permission::*;
pub use version::*;
pub use workflow::*;

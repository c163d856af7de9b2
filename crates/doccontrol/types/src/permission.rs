//! Permissions checked with the RBAC collaborator before any mutation

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    CreateDocument,
    /// Start and drive Author steps of Review / Up-version workflows
    AuthorDocument,
    ReviewDocument,
    ApproveDocument,
    /// Start and drive Author steps of Obsolescence workflows
    RetireDocument,
    TerminateWorkflow,
    LinkDependency,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CreateDocument => "create_document",
            Self::AuthorDocument => "author_document",
            Self::ReviewDocument => "review_document",
            Self::ApproveDocument => "approve_document",
            Self::RetireDocument => "retire_document",
            Self::TerminateWorkflow => "terminate_workflow",
            Self::LinkDependency => "link_dependency",
        };
        f.write_str(name)
    }
}

//! Identifiers used across the document control core
//!
//! All identifiers are opaque string newtypes. Generated identifiers are
//! UUID v4; callers may also supply their own (tests, imports).

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn short(&self) -> &str {
                &self.0[..8.min(self.0.len())]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Unique identifier for a controlled document
    DocumentId
);

string_id!(
    /// Unique identifier for one content snapshot of a document
    VersionId
);

string_id!(
    /// Unique identifier for a workflow run
    WorkflowInstanceId
);

string_id!(
    /// Unique identifier for a scheduled effectivity event
    EffectivityEventId
);

string_id!(
    /// Identity of a human (or system) actor, as known to the RBAC collaborator
    ActorId
);

string_id!(
    /// Opaque handle into the storage collaborator
    ContentRef
);

string_id!(
    /// Opaque reference returned by the signature collaborator, stored verbatim
    SignatureRef
);

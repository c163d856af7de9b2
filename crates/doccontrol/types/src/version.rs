//! Document versions: immutable content snapshots and their lifecycle status

use crate::{ActorId, ContentRef, DocumentId, VersionId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ── Version Number ───────────────────────────────────────────────────

/// `major.minor` version number, ordered lexicographically by (major, minor)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionNumber {
    pub major: u32,
    pub minor: u32,
}

impl VersionNumber {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Number given to the first draft of a brand-new document
    pub const fn initial() -> Self {
        Self::new(0, 1)
    }

    /// The next number after `self` for the given bump
    pub fn bumped(&self, bump: VersionBump) -> Self {
        match bump {
            VersionBump::Minor => Self::new(self.major, self.minor + 1),
            VersionBump::Major => Self::new(self.major + 1, 0),
        }
    }
}

impl std::fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl std::str::FromStr for VersionNumber {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .split_once('.')
            .ok_or_else(|| format!("version '{}' is not of the form major.minor", s))?;
        let major = major
            .parse()
            .map_err(|_| format!("invalid major component in '{}'", s))?;
        let minor = minor
            .parse()
            .map_err(|_| format!("invalid minor component in '{}'", s))?;
        Ok(Self::new(major, minor))
    }
}

/// Which component an up-version increments
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VersionBump {
    #[default]
    Minor,
    Major,
}

// ── Version Status ───────────────────────────────────────────────────

/// Lifecycle status of a document version
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionStatus {
    Draft,
    PendingReview,
    Reviewed,
    PendingApproval,
    /// Approved, waiting for its effective date
    ApprovedPendingEffective,
    ApprovedEffective,
    Superseded,
    PendingObsolescence,
    Obsolete,
    /// The workflow that created this version was terminated
    Discarded,
}

impl VersionStatus {
    /// Statuses that make a version count as a live dependent
    pub fn is_live(&self) -> bool {
        matches!(self, Self::ApprovedEffective | Self::ApprovedPendingEffective)
    }

    /// Statuses from which an Author may still terminate the workflow
    pub fn is_pre_approval(&self) -> bool {
        matches!(
            self,
            Self::Draft | Self::PendingReview | Self::Reviewed | Self::PendingApproval
        )
    }

    /// Statuses that never change again
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Superseded | Self::Obsolete | Self::Discarded)
    }
}

impl std::fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Draft => "Draft",
            Self::PendingReview => "Pending Review",
            Self::Reviewed => "Reviewed",
            Self::PendingApproval => "Pending Approval",
            Self::ApprovedPendingEffective => "Approved, Pending Effective",
            Self::ApprovedEffective => "Approved and Effective",
            Self::Superseded => "Superseded",
            Self::PendingObsolescence => "Pending Obsolescence",
            Self::Obsolete => "Obsolete",
            Self::Discarded => "Discarded",
        };
        f.write_str(name)
    }
}

// ── Document Version ─────────────────────────────────────────────────

/// One immutable content snapshot of a document.
///
/// Only `status` and `effective_date` change after creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub id: VersionId,
    pub document_id: DocumentId,
    pub version_number: VersionNumber,
    pub content_ref: ContentRef,
    pub author_id: ActorId,
    pub status: VersionStatus,
    /// The version this one was up-versioned from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_version_id: Option<VersionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl DocumentVersion {
    pub fn new(
        document_id: DocumentId,
        version_number: VersionNumber,
        content_ref: ContentRef,
        author_id: ActorId,
    ) -> Self {
        Self {
            id: VersionId::generate(),
            document_id,
            version_number,
            content_ref,
            author_id,
            status: VersionStatus::Draft,
            base_version_id: None,
            effective_date: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_base(mut self, base: VersionId) -> Self {
        self.base_version_id = Some(base);
        self
    }

    pub fn is_effective(&self) -> bool {
        self.status == VersionStatus::ApprovedEffective
    }
}

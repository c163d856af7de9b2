//! Controlled documents: identity, classification and the current-version pointer
//!
//! A [`Document`] is never deleted. Its lifecycle is carried entirely by
//! its versions; the document row only holds identity metadata and a weak
//! pointer to the version that last completed a workflow.

use crate::{ActorId, DocumentId, VersionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Classification ───────────────────────────────────────────────────

/// Kind of controlled document
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    Policy,
    Manual,
    Procedure,
    WorkInstruction,
    Form,
    Record,
}

impl DocumentType {
    /// Prefix used when allocating document numbers
    pub fn number_prefix(&self) -> &'static str {
        match self {
            Self::Policy => "POL",
            Self::Manual => "MAN",
            Self::Procedure => "SOP",
            Self::WorkInstruction => "WI",
            Self::Form => "FRM",
            Self::Record => "REC",
        }
    }

    pub fn all() -> [DocumentType; 6] {
        [
            Self::Policy,
            Self::Manual,
            Self::Procedure,
            Self::WorkInstruction,
            Self::Form,
            Self::Record,
        ]
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Policy => "Policy",
            Self::Manual => "Manual",
            Self::Procedure => "Procedure",
            Self::WorkInstruction => "Work Instruction",
            Self::Form => "Form",
            Self::Record => "Record",
        };
        f.write_str(name)
    }
}

/// Where the document's content originated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentSource {
    OriginalDigitalDraft,
    ScannedOriginal,
    ScannedCopy,
}

// ── Document ─────────────────────────────────────────────────────────

/// Identity entity for a controlled document
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Assigned once at creation, never changed or reused
    pub document_number: String,
    pub title: String,
    pub document_type: DocumentType,
    pub source: DocumentSource,
    /// The author who registered the document
    pub owner: ActorId,
    /// Version that last completed a workflow (weak reference)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_version_id: Option<VersionId>,
    /// Optimistic concurrency stamp, bumped on every committed write
    pub stamp: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(document_number: impl Into<String>, request: NewDocument) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::generate(),
            document_number: document_number.into(),
            title: request.title,
            document_type: request.document_type,
            source: request.source,
            owner: request.author,
            current_version_id: None,
            stamp: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a committed write against this row
    pub fn touch(&mut self) {
        self.stamp += 1;
        self.updated_at = Utc::now();
    }
}

/// Metadata required to register a new document
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewDocument {
    pub document_type: DocumentType,
    pub source: DocumentSource,
    pub title: String,
    pub author: ActorId,
}

impl NewDocument {
    pub fn new(
        document_type: DocumentType,
        source: DocumentSource,
        title: impl Into<String>,
        author: ActorId,
    ) -> Self {
        Self {
            document_type,
            source,
            title: title.into(),
            author,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_prefixes_are_distinct() {
        let mut prefixes: Vec<_> = DocumentType::all()
            .iter()
            .map(|t| t.number_prefix())
            .collect();
        prefixes.sort();
        prefixes.dedup();
        assert_eq!(prefixes.len(), 6);
    }

    #[test]
    fn touch_bumps_stamp() {
        let mut doc = Document::new(
            "SOP-000001",
            NewDocument::new(
                DocumentType::Procedure,
                DocumentSource::OriginalDigitalDraft,
                "Cleaning of Line 3",
                ActorId::new("alice"),
            ),
        );
        assert_eq!(doc.stamp, 0);
        assert!(doc.current_version_id.is_none());
        doc.touch();
        doc.touch();
        assert_eq!(doc.stamp, 2);
    }
}

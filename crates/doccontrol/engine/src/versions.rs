//! Version Manager: version numbering and status bookkeeping

use doccontrol_types::*;
use std::collections::HashMap;

/// Owns every [`DocumentVersion`].
///
/// Versions are never deleted. Numbers are computed from the highest
/// number ever issued for a document, discarded versions included, so
/// numbering stays strictly increasing after terminations.
#[derive(Clone, Debug, Default)]
pub struct VersionManager {
    versions: HashMap<VersionId, DocumentVersion>,
    /// Versions per document, in creation order
    by_document: HashMap<DocumentId, Vec<VersionId>>,
}

impl VersionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number the next version of `document_id` would receive.
    ///
    /// With no prior versions this is 0.1 regardless of `bump`.
    pub fn next_number(&self, document_id: &DocumentId, bump: VersionBump) -> VersionNumber {
        match self.highest_number(document_id) {
            Some(highest) => highest.bumped(bump),
            None => VersionNumber::initial(),
        }
    }

    pub fn highest_number(&self, document_id: &DocumentId) -> Option<VersionNumber> {
        self.iter_of(document_id).map(|v| v.version_number).max()
    }

    /// Create a `Draft` version, optionally based on an effective one
    pub fn start_new_version(
        &mut self,
        document_id: &DocumentId,
        base: Option<&VersionId>,
        bump: VersionBump,
        author: ActorId,
        content_ref: ContentRef,
    ) -> DocControlResult<DocumentVersion> {
        if let Some(base_id) = base {
            let base_version = self.get(base_id)?;
            if &base_version.document_id != document_id {
                return Err(DocControlError::Validation(format!(
                    "base version {} belongs to another document",
                    base_id
                )));
            }
            if !base_version.is_effective() {
                return Err(DocControlError::StateTransition(format!(
                    "base version {} is {}, not Approved and Effective",
                    base_version.version_number, base_version.status
                )));
            }
        }

        let number = self.next_number(document_id, bump);
        let mut version = DocumentVersion::new(document_id.clone(), number, content_ref, author);
        if let Some(base_id) = base {
            version = version.with_base(base_id.clone());
        }

        tracing::debug!(
            document_id = %document_id,
            version = %number,
            "Draft version created"
        );

        self.by_document
            .entry(document_id.clone())
            .or_default()
            .push(version.id.clone());
        self.versions.insert(version.id.clone(), version.clone());
        Ok(version)
    }

    pub fn get(&self, id: &VersionId) -> DocControlResult<&DocumentVersion> {
        self.versions
            .get(id)
            .ok_or_else(|| DocControlError::VersionNotFound(id.clone()))
    }

    /// All versions of a document, oldest first
    pub fn versions_of(&self, document_id: &DocumentId) -> Vec<&DocumentVersion> {
        self.iter_of(document_id).collect()
    }

    pub fn effective_version(&self, document_id: &DocumentId) -> Option<&DocumentVersion> {
        self.iter_of(document_id).find(|v| v.is_effective())
    }

    /// A version that makes the document count as a live dependent
    pub fn has_live_version(&self, document_id: &DocumentId) -> bool {
        self.iter_of(document_id).any(|v| v.status.is_live())
    }

    /// Whether any version of the document has not been discarded
    pub fn has_undiscarded(&self, document_id: &DocumentId) -> bool {
        self.iter_of(document_id)
            .any(|v| v.status != VersionStatus::Discarded)
    }

    pub fn with_status(
        &self,
        document_id: &DocumentId,
        status: VersionStatus,
    ) -> Option<&DocumentVersion> {
        self.iter_of(document_id).find(|v| v.status == status)
    }

    pub fn set_status(&mut self, id: &VersionId, status: VersionStatus) -> DocControlResult<()> {
        let version = self.get_mut(id)?;
        if version.status.is_final() {
            return Err(DocControlError::StateTransition(format!(
                "version {} is {} and can no longer change",
                version.version_number, version.status
            )));
        }
        version.status = status;
        Ok(())
    }

    pub fn set_effective_date(
        &mut self,
        id: &VersionId,
        date: chrono::NaiveDate,
    ) -> DocControlResult<()> {
        self.get_mut(id)?.effective_date = Some(date);
        Ok(())
    }

    pub fn supersede(&mut self, id: &VersionId) -> DocControlResult<()> {
        self.set_status(id, VersionStatus::Superseded)
    }

    pub fn mark_obsolete(&mut self, id: &VersionId) -> DocControlResult<()> {
        self.set_status(id, VersionStatus::Obsolete)
    }

    /// Terminated work is kept, flagged as discarded
    pub fn discard(&mut self, id: &VersionId) -> DocControlResult<()> {
        self.set_status(id, VersionStatus::Discarded)
    }

    pub fn count(&self) -> usize {
        self.versions.len()
    }

    fn get_mut(&mut self, id: &VersionId) -> DocControlResult<&mut DocumentVersion> {
        self.versions
            .get_mut(id)
            .ok_or_else(|| DocControlError::VersionNotFound(id.clone()))
    }

    fn iter_of<'a>(
        &'a self,
        document_id: &DocumentId,
    ) -> impl Iterator<Item = &'a DocumentVersion> + 'a {
        self.by_document
            .get(document_id)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.versions.get(id))
    }
}

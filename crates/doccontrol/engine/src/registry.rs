//! Document Registry: document identity, numbering and the current-version pointer

use crate::versions::VersionManager;
use doccontrol_types::*;
use std::collections::HashMap;

/// Owns every [`Document`] row.
///
/// Document numbers are allocated per document type and never reused.
/// `current_version_id` is only written through
/// [`DocumentRegistry::set_current_version`], a compare-and-swap on the
/// row's stamp.
#[derive(Clone, Debug)]
pub struct DocumentRegistry {
    documents: HashMap<DocumentId, Document>,
    /// Last sequence number issued per type
    sequences: HashMap<DocumentType, u64>,
    number_width: usize,
}

impl DocumentRegistry {
    pub fn new(number_width: usize) -> Self {
        Self {
            documents: HashMap::new(),
            sequences: HashMap::new(),
            number_width,
        }
    }

    /// Register a new document with no current version
    pub fn create(&mut self, request: NewDocument) -> DocControlResult<Document> {
        if request.title.trim().is_empty() {
            return Err(DocControlError::Validation(
                "document title is required".into(),
            ));
        }
        if request.author.as_str().trim().is_empty() {
            return Err(DocControlError::Validation(
                "document author is required".into(),
            ));
        }

        let number = self.allocate_number(request.document_type);
        let document = Document::new(number, request);

        tracing::info!(
            document_id = %document.id,
            number = %document.document_number,
            doc_type = %document.document_type,
            "Document registered"
        );

        self.documents.insert(document.id.clone(), document.clone());
        Ok(document)
    }

    pub fn get(&self, id: &DocumentId) -> DocControlResult<&Document> {
        self.documents
            .get(id)
            .ok_or_else(|| DocControlError::DocumentNotFound(id.clone()))
    }

    pub fn find_by_number(&self, number: &str) -> Option<&Document> {
        self.documents
            .values()
            .find(|d| d.document_number == number)
    }

    pub fn list(&self) -> Vec<&Document> {
        let mut docs: Vec<&Document> = self.documents.values().collect();
        docs.sort_by(|a, b| a.document_number.cmp(&b.document_number));
        docs
    }

    pub fn count(&self) -> usize {
        self.documents.len()
    }

    /// The single `ApprovedEffective` version of a document, if any
    pub fn effective_version<'a>(
        &self,
        id: &DocumentId,
        versions: &'a VersionManager,
    ) -> DocControlResult<Option<&'a DocumentVersion>> {
        self.get(id)?;
        Ok(versions.effective_version(id))
    }

    /// Fail with `ConcurrencyConflict` unless the row is still at `expected`
    pub fn check_stamp(&self, id: &DocumentId, expected: u64) -> DocControlResult<()> {
        let document = self.get(id)?;
        if document.stamp != expected {
            return Err(DocControlError::ConcurrencyConflict {
                document_id: id.clone(),
                expected,
                actual: document.stamp,
            });
        }
        Ok(())
    }

    /// Compare-and-swap the current version pointer.
    ///
    /// Returns the new stamp.
    pub fn set_current_version(
        &mut self,
        id: &DocumentId,
        version_id: &VersionId,
        expected_stamp: u64,
    ) -> DocControlResult<u64> {
        self.check_stamp(id, expected_stamp)?;
        let document = self.get_mut(id)?;
        document.current_version_id = Some(version_id.clone());
        document.touch();
        Ok(document.stamp)
    }

    /// Record a committed write that does not move the pointer
    pub fn touch(&mut self, id: &DocumentId) -> DocControlResult<u64> {
        let document = self.get_mut(id)?;
        document.touch();
        Ok(document.stamp)
    }

    fn get_mut(&mut self, id: &DocumentId) -> DocControlResult<&mut Document> {
        self.documents
            .get_mut(id)
            .ok_or_else(|| DocControlError::DocumentNotFound(id.clone()))
    }

    fn allocate_number(&mut self, document_type: DocumentType) -> String {
        let seq = self.sequences.entry(document_type).or_insert(0);
        *seq += 1;
        format!(
            "{}-{:0width$}",
            document_type.number_prefix(),
            seq,
            width = self.number_width
        )
    }
}

impl Default for DocumentRegistry {
    fn default() -> Self {
        Self::new(6)
    }
}

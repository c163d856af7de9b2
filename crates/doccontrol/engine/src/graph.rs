//! Dependency Graph: directed edges between documents
//!
//! An edge `from -> to` means `from` depends on `to`. The graph is kept
//! acyclic: every insertion runs a reachability check from `to` back to
//! `from` before it is accepted.

use crate::registry::DocumentRegistry;
use crate::versions::VersionManager;
use doccontrol_types::*;
use std::collections::HashSet;

/// A notification addressed to a set of actors
#[derive(Clone, Debug)]
pub struct Notice {
    pub recipients: Vec<ActorId>,
    pub event: NotificationEvent,
}

#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    edges: Vec<DependencyEdge>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert `from -> to`.
    ///
    /// The target must currently have an `ApprovedEffective` version and
    /// must not be on its way out.
    pub fn add_edge(
        &mut self,
        from: &DocumentId,
        to: &DocumentId,
        created_by: ActorId,
        registry: &DocumentRegistry,
        versions: &VersionManager,
    ) -> DocControlResult<DependencyEdge> {
        self.check_edge(from, to, registry, versions)?;
        let edge = DependencyEdge::new(from.clone(), to.clone(), created_by);
        self.edges.push(edge.clone());
        Ok(edge)
    }

    /// Every rule `add_edge` enforces, without mutating
    pub fn check_edge(
        &self,
        from: &DocumentId,
        to: &DocumentId,
        registry: &DocumentRegistry,
        versions: &VersionManager,
    ) -> DocControlResult<()> {
        if from == to {
            return Err(DocControlError::Validation(format!(
                "document {} cannot depend on itself",
                from
            )));
        }
        registry.get(from)?;
        let target = registry.get(to)?;

        if self.contains(from, to) {
            return Err(DocControlError::Validation(format!(
                "dependency {} -> {} already exists",
                from, to
            )));
        }

        let retiring = versions.versions_of(to).iter().any(|v| {
            matches!(
                v.status,
                VersionStatus::PendingObsolescence | VersionStatus::Obsolete
            )
        });
        if retiring {
            return Err(DocControlError::Validation(format!(
                "target {} is pending obsolescence or obsolete",
                target.document_number
            )));
        }
        if versions.effective_version(to).is_none() {
            return Err(DocControlError::Validation(format!(
                "target {} has no Approved and Effective version",
                target.document_number
            )));
        }

        if self.reaches(to, from) {
            return Err(DocControlError::Validation(format!(
                "dependency {} -> {} would create a cycle",
                from, to
            )));
        }
        Ok(())
    }

    pub fn remove_edge(&mut self, from: &DocumentId, to: &DocumentId) -> DocControlResult<()> {
        let before = self.edges.len();
        self.edges.retain(|e| !e.connects(from, to));
        if self.edges.len() == before {
            return Err(DocControlError::Validation(format!(
                "no dependency {} -> {}",
                from, to
            )));
        }
        Ok(())
    }

    pub fn contains(&self, from: &DocumentId, to: &DocumentId) -> bool {
        self.edges.iter().any(|e| e.connects(from, to))
    }

    /// Documents that depend on `document_id`
    pub fn dependents_of(&self, document_id: &DocumentId) -> Vec<DocumentId> {
        self.edges
            .iter()
            .filter(|e| &e.to_document_id == document_id)
            .map(|e| e.from_document_id.clone())
            .collect()
    }

    /// Documents `document_id` depends on
    pub fn dependencies_of(&self, document_id: &DocumentId) -> Vec<DocumentId> {
        self.edges
            .iter()
            .filter(|e| &e.from_document_id == document_id)
            .map(|e| e.to_document_id.clone())
            .collect()
    }

    /// Dependents that currently have a live version
    pub fn active_dependents(
        &self,
        document_id: &DocumentId,
        versions: &VersionManager,
    ) -> Vec<DocumentId> {
        self.dependents_of(document_id)
            .into_iter()
            .filter(|dependent| versions.has_live_version(dependent))
            .collect()
    }

    pub fn has_active_dependents(
        &self,
        document_id: &DocumentId,
        versions: &VersionManager,
    ) -> bool {
        !self.active_dependents(document_id, versions).is_empty()
    }

    /// Notices for the owners and current authors of every dependent of
    /// `document_id`, after it gained effective version `version`.
    pub fn notify_dependents(
        &self,
        document_id: &DocumentId,
        version: VersionNumber,
        registry: &DocumentRegistry,
        versions: &VersionManager,
    ) -> Vec<Notice> {
        self.dependents_of(document_id)
            .into_iter()
            .filter_map(|dependent| {
                let doc = registry.get(&dependent).ok()?;
                let mut recipients = vec![doc.owner.clone()];
                if let Some(current) = doc
                    .current_version_id
                    .as_ref()
                    .and_then(|id| versions.get(id).ok())
                {
                    if !recipients.contains(&current.author_id) {
                        recipients.push(current.author_id.clone());
                    }
                }
                let event = NotificationEvent::new(
                    NotificationKind::DependencyUpdated {
                        dependency: document_id.clone(),
                        version,
                    },
                    dependent,
                    doc.document_number.clone(),
                );
                Some(Notice { recipients, event })
            })
            .collect()
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Depth-first reachability over dependency edges
    fn reaches(&self, start: &DocumentId, goal: &DocumentId) -> bool {
        let mut stack = vec![start];
        let mut seen: HashSet<&DocumentId> = HashSet::new();
        while let Some(node) = stack.pop() {
            if node == goal {
                return true;
            }
            if !seen.insert(node) {
                continue;
            }
            stack.extend(
                self.edges
                    .iter()
                    .filter(|e| &e.from_document_id == node)
                    .map(|e| &e.to_document_id),
            );
        }
        false
    }
}

//! Role-table RBAC
//!
//! Actors are mapped to roles in configuration; each role grants a fixed
//! set of permissions. Decisions are global, not per document.

use crate::config::AccessConfig;
use doccontrol_engine::AccessControl;
use doccontrol_types::{ActorId, DocumentId, Permission};
use std::collections::{HashMap, HashSet};

/// Permissions granted by a named role
pub fn role_permissions(role: &str) -> &'static [Permission] {
    match role {
        "author" => &[
            Permission::CreateDocument,
            Permission::AuthorDocument,
            Permission::LinkDependency,
            Permission::TerminateWorkflow,
        ],
        "reviewer" => &[Permission::ReviewDocument],
        "approver" => &[Permission::ApproveDocument],
        "document_controller" => &[
            Permission::CreateDocument,
            Permission::AuthorDocument,
            Permission::LinkDependency,
            Permission::TerminateWorkflow,
            Permission::RetireDocument,
        ],
        _ => &[],
    }
}

pub struct RoleTableAccessControl {
    allow_all: bool,
    grants: HashMap<ActorId, HashSet<Permission>>,
}

impl RoleTableAccessControl {
    pub fn from_config(config: &AccessConfig) -> Self {
        let mut grants: HashMap<ActorId, HashSet<Permission>> = HashMap::new();
        for (role, actors) in &config.roles {
            let permissions = role_permissions(role);
            if permissions.is_empty() {
                tracing::warn!(role = %role, "Unknown role in access table, ignoring");
                continue;
            }
            for actor in actors {
                grants
                    .entry(ActorId::new(actor.as_str()))
                    .or_default()
                    .extend(permissions.iter().copied());
            }
        }

        tracing::info!(
            actors = grants.len(),
            allow_all = config.allow_all,
            "Access table loaded"
        );
        Self {
            allow_all: config.allow_all,
            grants,
        }
    }

    pub fn permissions_of(&self, actor: &ActorId) -> Vec<Permission> {
        let mut permissions: Vec<Permission> = self
            .grants
            .get(actor)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        permissions.sort_by_key(|p| p.to_string());
        permissions
    }
}

impl AccessControl for RoleTableAccessControl {
    fn can_perform(
        &self,
        actor: &ActorId,
        permission: Permission,
        _document_id: Option<&DocumentId>,
    ) -> bool {
        self.allow_all
            || self
                .grants
                .get(actor)
                .is_some_and(|set| set.contains(&permission))
    }
}

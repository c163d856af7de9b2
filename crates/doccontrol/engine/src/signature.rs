//! Signature Binder
//!
//! Builds the canonical payload for a signed step and hands it to the
//! signature collaborator. The returned reference is stored verbatim on
//! the [`StepRecord`](doccontrol_types::StepRecord). A signing failure
//! aborts the transition before anything is applied.

use crate::collaborators::SignatureService;
use chrono::{DateTime, Utc};
use doccontrol_types::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What an actor signs when approving a step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SigningPayload {
    pub document_id: DocumentId,
    pub document_number: String,
    pub version_id: VersionId,
    pub version_number: VersionNumber,
    pub workflow_id: WorkflowInstanceId,
    pub step: StepRole,
    pub decision: Decision,
    pub actor: ActorId,
    pub timestamp: DateTime<Utc>,
}

impl SigningPayload {
    /// Canonical byte form handed to the signer
    pub fn to_bytes(&self) -> DocControlResult<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| DocControlError::Signature(format!("payload encoding failed: {}", e)))
    }
}

pub struct SignatureBinder {
    signer: Arc<dyn SignatureService>,
}

impl SignatureBinder {
    pub fn new(signer: Arc<dyn SignatureService>) -> Self {
        Self { signer }
    }

    pub fn bind(&self, payload: &SigningPayload) -> DocControlResult<SignatureRef> {
        let bytes = payload.to_bytes()?;
        self.signer.sign(&bytes).map_err(|e| {
            tracing::warn!(
                document_id = %payload.document_id,
                workflow_id = %payload.workflow_id,
                actor = %payload.actor,
                error = %e,
                "Signature binding failed"
            );
            DocControlError::Signature(e.to_string())
        })
    }

    pub fn verify(&self, signature_ref: &SignatureRef) -> bool {
        self.signer.verify(signature_ref)
    }
}

//! Ed25519 signature service
//!
//! Each approval payload is hashed with blake3 and the digest is signed.
//! The returned reference is `ed25519:<hex signature>`; the service keeps
//! the digest of every signature it issued so references can be verified.

use crate::error::{DaemonError, DaemonResult};
use dashmap::DashMap;
use doccontrol_engine::{CollaboratorError, SignatureService};
use doccontrol_types::SignatureRef;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::RngCore;

const REF_PREFIX: &str = "ed25519:";

pub struct Ed25519SignatureService {
    signing_key: SigningKey,
    issued: DashMap<String, [u8; 32]>,
}

impl Ed25519SignatureService {
    pub fn new(signing_key: SigningKey) -> Self {
        Self {
            signing_key,
            issued: DashMap::new(),
        }
    }

    /// Key from a hex-encoded 32 byte seed
    pub fn from_seed_hex(seed_hex: &str) -> DaemonResult<Self> {
        let bytes =
            hex::decode(seed_hex.trim()).map_err(|e| DaemonError::SigningKey(e.to_string()))?;
        let seed: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            DaemonError::SigningKey(format!("seed must be 32 bytes, got {}", b.len()))
        })?;
        Ok(Self::new(SigningKey::from_bytes(&seed)))
    }

    /// Fresh random key; signatures do not survive a restart
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut seed);
        Self::new(SigningKey::from_bytes(&seed))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key().as_bytes())
    }

    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }

    fn decode_ref(signature_ref: &SignatureRef) -> Option<Signature> {
        let sig_hex = signature_ref.as_str().strip_prefix(REF_PREFIX)?;
        let bytes: [u8; 64] = hex::decode(sig_hex).ok()?.try_into().ok()?;
        Some(Signature::from_bytes(&bytes))
    }
}

impl SignatureService for Ed25519SignatureService {
    fn sign(&self, payload: &[u8]) -> Result<SignatureRef, CollaboratorError> {
        if payload.is_empty() {
            return Err(CollaboratorError::Rejected("empty signing payload".into()));
        }
        let digest = *blake3::hash(payload).as_bytes();
        let signature = self.signing_key.sign(&digest);
        let reference = format!("{}{}", REF_PREFIX, hex::encode(signature.to_bytes()));
        self.issued.insert(reference.clone(), digest);

        tracing::debug!(signature = %reference, "Signed approval payload");
        Ok(SignatureRef::new(reference))
    }

    fn verify(&self, signature_ref: &SignatureRef) -> bool {
        let Some(digest) = self.issued.get(signature_ref.as_str()).map(|d| *d) else {
            return false;
        };
        let Some(signature) = Self::decode_ref(signature_ref) else {
            return false;
        };
        self.verifying_key().verify(&digest, &signature).is_ok()
    }
}

//! # DID Envelope
//!
//! An envelope pairs one instruction with one document and is the unit that
//! gets validated and persisted. Validation runs one of three fixed
//! pipelines (creation, modification, deletion). Each pipeline stops at the
//! first failing check, so the order of checks below is part of the contract.

use std::collections::HashSet;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::did::FRAGMENT_DELIMITER;
use crate::document::{DidDocument, QualifiedPublicKey};
use crate::error::ValidationFailure;
use crate::instruction::{Action, DidInstruction, QualifiedSignature};
use crate::{reject, verify};

static DEFAULT_CONFIG: LazyLock<Config> = LazyLock::new(Config::default);

/// Outcome of validating an envelope: `Ok(())` when approved, otherwise the
/// first failing check.
pub type Validation = Result<(), ValidationFailure>;

/// An instruction and the document it applies to, both held as raw text.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct DidEnvelope {
    instruction: DidInstruction,
    document: DidDocument,
}

impl DidEnvelope {
    /// Create an envelope from raw instruction and document text.
    #[must_use]
    pub fn new(instruction: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            instruction: DidInstruction::new(instruction),
            document: DidDocument::new(document),
        }
    }

    /// The instruction.
    #[must_use]
    pub const fn instruction(&self) -> &DidInstruction {
        &self.instruction
    }

    /// The document.
    #[must_use]
    pub const fn document(&self) -> &DidDocument {
        &self.document
    }

    /// Validate the envelope as the first document for a new DID.
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate_creation(&self) -> Validation {
        self.validate_creation_with(&DEFAULT_CONFIG)
    }

    /// [`Self::validate_creation`] with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate_creation_with(&self, config: &Config) -> Validation {
        self.expect_action(&[Action::Create])
            .and_then(|()| self.validate_with(config))
            .inspect_err(|failure| log_rejection("create", failure))
    }

    /// Validate the envelope as a revision of `precursor`, the latest approved
    /// document for the DID.
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate_modification(&self, precursor: &DidDocument) -> Validation {
        self.validate_modification_with(precursor, &DEFAULT_CONFIG)
    }

    /// [`Self::validate_modification`] with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate_modification_with(&self, precursor: &DidDocument, config: &Config) -> Validation {
        self.expect_action(&[Action::Update, Action::Delete])
            .and_then(|()| self.validate_with(config))
            .and_then(|()| self.check_temporal(precursor))
            .and_then(|()| self.check_resigned(precursor))
            .inspect_err(|failure| log_rejection("update", failure))
    }

    /// Validate the envelope as the deletion of the DID whose latest approved
    /// document is `precursor`.
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate_deletion(&self, precursor: &DidDocument) -> Validation {
        self.validate_deletion_with(precursor, &DEFAULT_CONFIG)
    }

    /// [`Self::validate_deletion`] with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate_deletion_with(&self, precursor: &DidDocument, config: &Config) -> Validation {
        self.expect_action(&[Action::Delete])
            .and_then(|()| self.validate_with(config))
            .and_then(|()| self.check_resigned(precursor))
            .inspect_err(|failure| log_rejection("delete", failure))
    }

    /// Structural and cryptographic checks shared by every protocol.
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate(&self) -> Validation {
        self.validate_with(&DEFAULT_CONFIG)
    }

    /// [`Self::validate`] with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate_with(&self, config: &Config) -> Validation {
        let document = &self.document;

        let context = document.context().map_err(|e| ValidationFailure::malformed_document(&e))?;
        if !config.accepts_context(&context) {
            reject!(ValidationFailure::MalformedDocument {
                reason: format!("unsupported @context {context}"),
            });
        }

        let created = document.created().map_err(|e| ValidationFailure::malformed_document(&e))?;
        let updated = document.updated().map_err(|e| ValidationFailure::malformed_document(&e))?;
        if let (Some(created), Some(updated)) = (created, updated) {
            if updated <= created {
                reject!(ValidationFailure::InvalidTemporalRelation, "updated {updated} is not after created {created}");
            }
        }

        let signatures =
            self.instruction.signatures().map_err(|e| ValidationFailure::malformed_instruction(&e))?;
        let mut targets = HashSet::new();
        for signature in &signatures {
            if !targets.insert(signature.target.as_str()) {
                reject!(ValidationFailure::SignatureTarget {
                    target: signature.target.clone(),
                });
            }
        }

        let keys = document.public_keys().map_err(|e| ValidationFailure::malformed_document(&e))?;
        let mut key_ids = HashSet::new();
        for key in &keys {
            if !key_ids.insert(key.id.as_str()) {
                reject!(ValidationFailure::DuplicatePublicKeyId { key_id: key.id.clone() });
            }
        }
        if keys.is_empty() {
            reject!(ValidationFailure::NoKeys);
        }
        if signatures.len() < keys.len() {
            reject!(
                ValidationFailure::SignatureCount,
                "{} signatures for {} public keys",
                signatures.len(),
                keys.len()
            );
        }

        let pairs = pair(&keys, &signatures)
            .map_err(|key| ValidationFailure::UntargetedPublicKey { key_id: key.id.clone() })?;

        let did = document.id().map_err(|e| ValidationFailure::malformed_document(&e))?;
        let prefix = format!("{did}{FRAGMENT_DELIMITER}");
        for key in &keys {
            // the fragment naming the key must not be empty
            if key.id.strip_prefix(&prefix).map_or(true, str::is_empty) {
                reject!(ValidationFailure::InvalidPublicKeyId { key_id: key.id.clone() });
            }
        }

        for (key, signature) in &pairs {
            if key.suite != signature.suite {
                reject!(
                    ValidationFailure::CryptoSuiteMismatch { key_id: key.id.clone() },
                    "key is {} but signature is {}",
                    key.suite,
                    signature.suite
                );
            }
        }

        let message = document.raw().as_bytes();
        for (key, signature) in &pairs {
            if !verify::verify(message, &signature.value, &key.value, key.suite) {
                reject!(ValidationFailure::InvalidSignature { key_id: key.id.clone() });
            }
        }

        tracing::debug!(%did, keys = keys.len(), "envelope passed base validation");
        Ok(())
    }

    fn expect_action(&self, allowed: &[Action]) -> Validation {
        let action =
            self.instruction.action().map_err(|e| ValidationFailure::malformed_instruction(&e))?;
        if !allowed.contains(&action) {
            reject!(ValidationFailure::MalformedInstruction {
                reason: format!("action {action} is not permitted here"),
            });
        }
        Ok(())
    }

    // `created` is immutable once set and `updated` must advance.
    fn check_temporal(&self, precursor: &DidDocument) -> Validation {
        let malformed = |e| ValidationFailure::malformed_document(&e);
        let prior_created = precursor.created().map_err(malformed)?;
        let prior_updated = precursor.updated().map_err(malformed)?;
        let created = self.document.created().map_err(malformed)?;
        let updated = self.document.updated().map_err(malformed)?;

        if prior_created != created {
            reject!(ValidationFailure::InvalidTemporalRelation, "created changed from {prior_created:?} to {created:?}");
        }
        let Some(updated) = updated else {
            reject!(ValidationFailure::MissingTemporalInformation);
        };
        if let Some(prior_updated) = prior_updated {
            if updated <= prior_updated {
                reject!(
                    ValidationFailure::InvalidTemporalRelation,
                    "updated {updated} is not after previous update {prior_updated}"
                );
            }
        }
        Ok(())
    }

    // Every key registered on the precursor must sign the new document.
    fn check_resigned(&self, precursor: &DidDocument) -> Validation {
        let prior_keys =
            precursor.public_keys().map_err(|e| ValidationFailure::malformed_document(&e))?;
        let signatures =
            self.instruction.signatures().map_err(|e| ValidationFailure::malformed_instruction(&e))?;

        let pairs = pair(&prior_keys, &signatures)
            .map_err(|key| ValidationFailure::MissingSignature { key_id: key.id.clone() })?;

        let message = self.document.raw().as_bytes();
        for (key, signature) in &pairs {
            if !verify::verify(message, &signature.value, &key.value, key.suite) {
                reject!(ValidationFailure::InvalidSignature { key_id: key.id.clone() });
            }
        }
        Ok(())
    }
}

/// Match every key with the signature targeting it, or return the first key
/// without one.
fn pair<'a>(
    keys: &'a [QualifiedPublicKey], signatures: &'a [QualifiedSignature],
) -> Result<Vec<(&'a QualifiedPublicKey, &'a QualifiedSignature)>, &'a QualifiedPublicKey> {
    keys.iter()
        .map(|key| {
            signatures.iter().find(|signature| signature.target == key.id).map(|s| (key, s)).ok_or(key)
        })
        .collect()
}

fn log_rejection(protocol: &str, failure: &ValidationFailure) {
    tracing::warn!(protocol, code = failure.code(), "envelope rejected: {failure}");
}

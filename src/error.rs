//! # Errors
//!
//! Validation failures are a closed set of typed reasons, one per check in the
//! envelope validation pipeline. Parse failures are kept distinct from
//! validation failures, and registry (storage collaborator) errors wrap both.

use serde::Serialize;
use thiserror::Error;

/// Trace a validation failure and return it from the enclosing function.
///
/// # Example
/// ```ignore
/// reject!(ValidationFailure::NoKeys);
/// reject!(ValidationFailure::NoKeys, "document {} has no keys", id);
/// ```
#[macro_export]
macro_rules! reject {
    // with context
    ($failure:expr, $($msg:tt)*) => {
        {
        let failure = $failure;
        tracing::debug!(code = failure.code(), $($msg)*);
        return Err(failure);
        }
    };
    // no context
    ($failure:expr) => {
        {
        let failure = $failure;
        tracing::debug!(code = failure.code(), "{failure}");
        return Err(failure);
        }
    };
}

/// The reason an envelope was rejected.
///
/// Exactly one reason is reported per validation call: the first check to fail
/// in the fixed pipeline order.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "failure", rename_all = "camelCase")]
pub enum ValidationFailure {
    /// The document text is not valid JSON, lacks a mandatory field, or a
    /// field has the wrong shape.
    #[error("malformed document: {reason}")]
    MalformedDocument {
        /// What was wrong with the document.
        reason: String,
    },

    /// The instruction text is not valid JSON, lacks a mandatory field, or
    /// requests an action the protocol does not accept.
    #[error("malformed instruction: {reason}")]
    MalformedInstruction {
        /// What was wrong with the instruction.
        reason: String,
    },

    /// A key or signature type identifier does not name a supported suite.
    #[error("unsupported crypto suite: {suite}")]
    UnsupportedCryptoSuite {
        /// The unrecognized type identifier.
        suite: String,
    },

    /// Timestamps are out of order, either within the document or relative
    /// to the precursor.
    #[error("invalid temporal relation")]
    InvalidTemporalRelation,

    /// A modified document does not carry an `updated` timestamp.
    #[error("missing temporal information")]
    MissingTemporalInformation,

    /// Two signatures name the same target.
    #[error("multiple signatures target {target}")]
    SignatureTarget {
        /// The shared target.
        target: String,
    },

    /// Two public keys share an identifier.
    #[error("duplicate public key id {key_id}")]
    DuplicatePublicKeyId {
        /// The repeated key id.
        key_id: String,
    },

    /// The document declares no public keys.
    #[error("document has no public keys")]
    NoKeys,

    /// There are fewer signatures than public keys.
    #[error("fewer signatures than public keys")]
    SignatureCount,

    /// A public key has no signature targeting it.
    #[error("no signature targets public key {key_id}")]
    UntargetedPublicKey {
        /// The key lacking a signature.
        key_id: String,
    },

    /// A public key id is not a fragment of the document's DID.
    #[error("public key id {key_id} is not prefixed by the document id")]
    InvalidPublicKeyId {
        /// The offending key id.
        key_id: String,
    },

    /// A key and the signature targeting it declare different suites.
    #[error("crypto suite of signature does not match public key {key_id}")]
    CryptoSuiteMismatch {
        /// The key whose signature declares another suite.
        key_id: String,
    },

    /// A signature does not verify against the raw document.
    #[error("invalid signature for public key {key_id}")]
    InvalidSignature {
        /// The key the signature was checked against.
        key_id: String,
    },

    /// A precursor key was not re-signed by the current instruction.
    #[error("missing signature for precursor key {key_id}")]
    MissingSignature {
        /// The precursor key lacking a signature.
        key_id: String,
    },
}

impl ValidationFailure {
    /// Stable, externally visible error code. Each variant maps to exactly
    /// one code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MalformedDocument { .. } => "malformed_document_failure",
            Self::MalformedInstruction { .. } => "malformed_instruction_failure",
            Self::UnsupportedCryptoSuite { .. } => "unsupported_crypto_suite",
            Self::InvalidTemporalRelation => "invalid_temporal_relation_failure",
            Self::MissingTemporalInformation => "missing_temporal_information_failure",
            Self::SignatureTarget { .. } => "signature_target_failure",
            Self::DuplicatePublicKeyId { .. } => "duplicate_public_key_id_failure",
            Self::NoKeys => "no_keys_failure",
            Self::SignatureCount => "signature_count_failure",
            Self::UntargetedPublicKey { .. } => "untargeted_public_key_failure",
            Self::InvalidPublicKeyId { .. } => "invalid_public_key_id",
            Self::CryptoSuiteMismatch { .. } => "crypto_suite_mismatch_failure",
            Self::InvalidSignature { .. } => "invalid_signature_failure",
            Self::MissingSignature { .. } => "missing_signature_failure",
        }
    }

    /// Render the failure in `OAuth2`-style error format.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.code(),
            "error_description": self.to_string(),
        })
    }

    pub(crate) fn malformed_document(err: &ParseError) -> Self {
        match err {
            ParseError::UnsupportedSuite(suite) => Self::UnsupportedCryptoSuite {
                suite: suite.clone(),
            },
            ParseError::Malformed(reason) => Self::MalformedDocument {
                reason: reason.clone(),
            },
        }
    }

    pub(crate) fn malformed_instruction(err: &ParseError) -> Self {
        match err {
            ParseError::UnsupportedSuite(suite) => Self::UnsupportedCryptoSuite {
                suite: suite.clone(),
            },
            ParseError::Malformed(reason) => Self::MalformedInstruction {
                reason: reason.clone(),
            },
        }
    }
}

/// Failure to turn raw JSON text into a typed view.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Syntax error, missing mandatory field, or wrongly shaped field.
    #[error("{0}")]
    Malformed(String),

    /// A well-formed type identifier that names no supported crypto suite.
    #[error("unsupported crypto suite: {0}")]
    UnsupportedSuite(String),
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Errors surfaced by registry operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The envelope failed validation.
    #[error(transparent)]
    Rejected(#[from] ValidationFailure),

    /// The document's identifier is not a well-formed DID.
    #[error("invalid DID: {0}")]
    InvalidDid(String),

    /// The DID method or network is not served by this registry.
    #[error("unsupported DID method or network: {0}")]
    UnsupportedNetwork(String),

    /// No document is recorded for the DID.
    #[error("DID not found: {0}")]
    NotFound(String),

    /// A document is already recorded for the DID.
    #[error("DID already exists: {0}")]
    AlreadyExists(String),

    /// The DID has been deleted and accepts no further operations.
    #[error("DID has been deactivated: {0}")]
    Deactivated(String),

    /// Another write for the same DID was committed first.
    #[error("concurrent modification of DID: {0}")]
    Conflict(String),

    /// The storage collaborator failed.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl Error {
    /// Stable, externally visible error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Rejected(failure) => failure.code(),
            Self::InvalidDid(_) => "invalid_did",
            Self::UnsupportedNetwork(_) => "unsupported_network",
            Self::NotFound(_) => "not_found",
            Self::AlreadyExists(_) => "already_exists",
            Self::Deactivated(_) => "deactivated",
            Self::Conflict(_) => "conflict",
            Self::Store(_) => "store_error",
        }
    }

    /// Render the error in `OAuth2`-style error format.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.code(),
            "error_description": self.to_string(),
        })
    }
}

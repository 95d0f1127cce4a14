//! # Crypto Suites
//!
//! The closed set of signature suites the registry accepts, and lookup from
//! the `type` identifiers used in documents and instructions.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Supported key and signature algorithm families.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum CryptoSuite {
    /// `EdDSA` over Curve25519.
    Ed25519,

    /// RSA PKCS#1 v1.5 with SHA-256.
    Rsa,

    /// ECDSA over secp256k1 with SHA-256.
    EcdsaSecp256k1,
}

impl CryptoSuite {
    /// All supported suites.
    pub const ALL: [Self; 3] = [Self::Ed25519, Self::Rsa, Self::EcdsaSecp256k1];

    /// Public key `type` identifier for the suite.
    #[must_use]
    pub const fn key_id(&self) -> &'static str {
        match self {
            Self::Ed25519 => "Ed25519VerificationKey2018",
            Self::Rsa => "RsaVerificationKey2018",
            Self::EcdsaSecp256k1 => "EcdsaSecp256k1VerificationKey2019",
        }
    }

    /// Signature `type` identifier for the suite.
    #[must_use]
    pub const fn signature_id(&self) -> &'static str {
        match self {
            Self::Ed25519 => "Ed25519Signature2018",
            Self::Rsa => "RsaSignature2018",
            Self::EcdsaSecp256k1 => "EcdsaSecp256k1Signature2019",
        }
    }

    /// Resolve a public key `type` identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnsupportedSuite`] if no suite registers the
    /// identifier.
    pub fn from_key_id(id: &str) -> Result<Self, ParseError> {
        Self::ALL
            .into_iter()
            .find(|suite| suite.key_id() == id)
            .ok_or_else(|| ParseError::UnsupportedSuite(id.to_string()))
    }

    /// Resolve a signature `type` identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnsupportedSuite`] if no suite registers the
    /// identifier.
    pub fn from_signature_id(id: &str) -> Result<Self, ParseError> {
        Self::ALL
            .into_iter()
            .find(|suite| suite.signature_id() == id)
            .ok_or_else(|| ParseError::UnsupportedSuite(id.to_string()))
    }
}

impl Display for CryptoSuite {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ed25519 => write!(f, "Ed25519"),
            Self::Rsa => write!(f, "RSA"),
            Self::EcdsaSecp256k1 => write!(f, "ECDSA-secp256k1"),
        }
    }
}

//! Key management for tests.
//!
//! A [`Keyring`] holds named signing keys for every supported crypto suite.
//! Ed25519 and secp256k1 keys are generated on demand. RSA keys are loaded
//! from fixed fixtures since generating them is slow.

use std::collections::HashMap;

use anyhow::anyhow;
use did_registry::{CryptoSuite, Signer};
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey};
use sha2::Sha256;

const RSA_FIXTURES: [&str; 2] = [include_str!("../fixtures/rsa-1.pem"), include_str!("../fixtures/rsa-2.pem")];

/// Named signing keys.
#[derive(Clone, Debug, Default)]
pub struct Keyring {
    keys: HashMap<String, Key>,
    next_rsa: usize,
}

impl Keyring {
    /// Create an empty keyring.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key for `suite` under `id`, replacing any existing key with
    /// that id.
    ///
    /// # Errors
    ///
    /// Fails if an RSA fixture cannot be loaded.
    pub fn add(&mut self, id: impl Into<String>, suite: CryptoSuite) -> anyhow::Result<&Key> {
        let key = match suite {
            CryptoSuite::Ed25519 => Key::Ed25519(ed25519_dalek::SigningKey::generate(&mut OsRng)),
            CryptoSuite::EcdsaSecp256k1 => Key::Secp256k1(k256::ecdsa::SigningKey::random(&mut OsRng)),
            CryptoSuite::Rsa => {
                // cycle through fixtures so a replaced key always differs
                let pem = RSA_FIXTURES[self.next_rsa % RSA_FIXTURES.len()];
                self.next_rsa += 1;
                let key = rsa::RsaPrivateKey::from_pkcs8_pem(pem)
                    .map_err(|e| anyhow!("invalid RSA fixture: {e}"))?;
                Key::Rsa(Box::new(key))
            }
        };

        let id = id.into();
        self.keys.insert(id.clone(), key);
        self.get(&id)
    }

    /// The key stored under `id`.
    ///
    /// # Errors
    ///
    /// Fails if there is no such key.
    pub fn get(&self, id: &str) -> anyhow::Result<&Key> {
        self.keys.get(id).ok_or_else(|| anyhow!("key {id} not found"))
    }

    /// Replace the key under `id` with a new key for the same suite.
    ///
    /// # Errors
    ///
    /// Fails if there is no such key.
    pub fn rotate(&mut self, id: &str) -> anyhow::Result<&Key> {
        let suite = self.get(id)?.suite();
        self.add(id, suite)
    }
}

/// A signing key for one of the supported suites.
#[derive(Clone, Debug)]
pub enum Key {
    /// Ed25519 signing key. Publishes the raw 32-byte public key.
    Ed25519(ed25519_dalek::SigningKey),

    /// secp256k1 ECDSA signing key. Publishes the compressed SEC1 point and
    /// signs with DER-encoded signatures.
    Secp256k1(k256::ecdsa::SigningKey),

    /// RSA private key. Publishes `SubjectPublicKeyInfo` DER and signs with
    /// PKCS#1 v1.5 over SHA-256.
    Rsa(Box<rsa::RsaPrivateKey>),
}

impl Signer for Key {
    fn suite(&self) -> CryptoSuite {
        match self {
            Self::Ed25519(_) => CryptoSuite::Ed25519,
            Self::Secp256k1(_) => CryptoSuite::EcdsaSecp256k1,
            Self::Rsa(_) => CryptoSuite::Rsa,
        }
    }

    fn public_key(&self) -> anyhow::Result<Vec<u8>> {
        match self {
            Self::Ed25519(key) => Ok(key.verifying_key().to_bytes().to_vec()),
            Self::Secp256k1(key) => Ok(key.verifying_key().to_encoded_point(true).as_bytes().to_vec()),
            Self::Rsa(key) => {
                let der = key
                    .to_public_key()
                    .to_public_key_der()
                    .map_err(|e| anyhow!("issue encoding RSA key: {e}"))?;
                Ok(der.as_bytes().to_vec())
            }
        }
    }

    fn try_sign(&self, msg: &[u8]) -> anyhow::Result<Vec<u8>> {
        match self {
            Self::Ed25519(key) => {
                use ed25519_dalek::Signer as _;
                Ok(key.sign(msg).to_bytes().to_vec())
            }
            Self::Secp256k1(key) => {
                use k256::ecdsa::signature::Signer as _;
                let signature: k256::ecdsa::Signature =
                    key.try_sign(msg).map_err(|e| anyhow!("issue signing: {e}"))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            Self::Rsa(key) => {
                use rsa::signature::{SignatureEncoding as _, Signer as _};
                let signing_key = rsa::pkcs1v15::SigningKey::<Sha256>::new(key.as_ref().clone());
                let signature = signing_key.try_sign(msg).map_err(|e| anyhow!("issue signing: {e}"))?;
                Ok(signature.to_vec())
            }
        }
    }
}

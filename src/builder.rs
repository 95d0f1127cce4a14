//! # Builders
//!
//! Produce raw document and instruction text for submitting to the registry.
//! Builders only emit text: the registry validates exactly what was emitted,
//! so a document must be built before it is signed.
//!
//! ```rust,ignore
//! let document = DocumentBuilder::new(&did)
//!     .created(Utc::now())
//!     .public_key(did.key_id("keys-1"), CryptoSuite::Ed25519, &public_key)
//!     .build()?;
//! let instruction = InstructionBuilder::new(Action::Create)
//!     .sign(&did.key_id("keys-1"), &document, &signer)?
//!     .build()?;
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::DEFAULT_CONTEXTS;
use crate::did::Did;
use crate::document::PUBLIC_KEY_FIELD;
use crate::encoding::Encoding;
use crate::instruction::{Action, SIGNATURE_FIELD};
use crate::provider::Signer;
use crate::suite::CryptoSuite;

/// Builds the raw text of a DID document.
#[derive(Clone, Debug)]
pub struct DocumentBuilder {
    did: Did,
    context: String,
    created: Option<DateTime<Utc>>,
    updated: Option<DateTime<Utc>>,
    keys: Vec<(String, CryptoSuite, Vec<u8>)>,
    encoding: Encoding,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentText<'a> {
    #[serde(rename = "@context")]
    context: &'a str,
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated: Option<String>,
    public_key: Vec<Map<String, Value>>,
}

impl DocumentBuilder {
    /// Start a document for `did` using the default DID context.
    #[must_use]
    pub fn new(did: &Did) -> Self {
        Self {
            did: did.clone(),
            context: DEFAULT_CONTEXTS[0].to_string(),
            created: None,
            updated: None,
            keys: Vec::new(),
            encoding: Encoding::default(),
        }
    }

    /// Override the document context.
    #[must_use]
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Set the `created` timestamp.
    #[must_use]
    pub const fn created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    /// Set the `updated` timestamp.
    #[must_use]
    pub const fn updated(mut self, updated: DateTime<Utc>) -> Self {
        self.updated = Some(updated);
        self
    }

    /// Add a public key. `id` is the full key id, usually from
    /// [`Did::key_id`].
    #[must_use]
    pub fn public_key(mut self, id: impl Into<String>, suite: CryptoSuite, value: &[u8]) -> Self {
        self.keys.push((id.into(), suite, value.to_vec()));
        self
    }

    /// Encoding for key values. Defaults to Base58.
    #[must_use]
    pub const fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Emit the document text.
    ///
    /// # Errors
    ///
    /// Fails if the document cannot be serialized.
    pub fn build(self) -> anyhow::Result<String> {
        let controller = self.did.to_string();
        let public_key = self
            .keys
            .iter()
            .map(|(id, suite, value)| {
                let mut entry = Map::new();
                entry.insert("id".into(), Value::String(id.clone()));
                entry.insert("type".into(), Value::String(suite.key_id().into()));
                entry.insert("controller".into(), Value::String(controller.clone()));
                entry.insert(
                    self.encoding.field(PUBLIC_KEY_FIELD),
                    Value::String(self.encoding.encode(value)),
                );
                entry
            })
            .collect();

        let text = DocumentText {
            context: &self.context,
            id: controller.clone(),
            created: self.created.map(timestamp),
            updated: self.updated.map(timestamp),
            public_key,
        };
        Ok(serde_json::to_string_pretty(&text)?)
    }
}

/// Builds the raw text of a DID instruction.
#[derive(Clone, Debug)]
pub struct InstructionBuilder {
    action: Action,
    signatures: Vec<(String, CryptoSuite, Vec<u8>)>,
    encoding: Encoding,
}

#[derive(Serialize)]
struct InstructionText {
    action: Action,
    signatures: Vec<Map<String, Value>>,
}

impl InstructionBuilder {
    /// Start an instruction requesting `action`.
    #[must_use]
    pub const fn new(action: Action) -> Self {
        Self {
            action,
            signatures: Vec::new(),
            encoding: Encoding::Base58,
        }
    }

    /// Add a precomputed signature.
    #[must_use]
    pub fn signature(mut self, target: impl Into<String>, suite: CryptoSuite, value: &[u8]) -> Self {
        self.signatures.push((target.into(), suite, value.to_vec()));
        self
    }

    /// Sign the raw `document` text with `signer` and add the signature,
    /// targeting the key `target`.
    ///
    /// # Errors
    ///
    /// Fails if the signer fails.
    pub fn sign(self, target: impl Into<String>, document: &str, signer: &impl Signer) -> anyhow::Result<Self> {
        let signature = signer.try_sign(document.as_bytes())?;
        Ok(self.signature(target, signer.suite(), &signature))
    }

    /// Encoding for signature values. Defaults to Base58.
    #[must_use]
    pub const fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Emit the instruction text.
    ///
    /// # Errors
    ///
    /// Fails if the instruction cannot be serialized.
    pub fn build(self) -> anyhow::Result<String> {
        let signatures = self
            .signatures
            .iter()
            .map(|(target, suite, value)| {
                let mut entry = Map::new();
                entry.insert("id".into(), Value::String(target.clone()));
                entry.insert("type".into(), Value::String(suite.signature_id().into()));
                entry.insert(
                    self.encoding.field(SIGNATURE_FIELD),
                    Value::String(self.encoding.encode(value)),
                );
                entry
            })
            .collect();

        let text = InstructionText {
            action: self.action,
            signatures,
        };
        Ok(serde_json::to_string_pretty(&text)?)
    }
}

fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

//! # DID Document
//!
//! A DID document describes the public keys controlling a DID. The raw JSON
//! text is the source of truth: signatures are computed over its exact bytes,
//! so typed views are derived from the text on every access and the document
//! is never re-serialized.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::did::Did;
use crate::encoding;
use crate::error::ParseError;
use crate::suite::CryptoSuite;

/// JSON field holding the document context.
pub const CONTEXT_FIELD: &str = "@context";

/// JSON field holding the public key list.
pub const PUBLIC_KEY_FIELD: &str = "publicKey";

/// A public key tagged with its identifier and crypto suite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QualifiedPublicKey {
    /// DID URL identifying the key, e.g. `did:corda:tcn:<uuid>#keys-1`.
    pub id: String,

    /// Suite the key is declared for.
    pub suite: CryptoSuite,

    /// Decoded key material.
    pub value: Vec<u8>,
}

/// A DID document held as raw JSON text.
///
/// Serializes as the raw text itself, so persisting and reloading keeps the
/// signed bytes intact.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DidDocument {
    raw: String,
}

impl DidDocument {
    /// Wrap raw document text. No parsing happens until a field is accessed.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The exact text the document was created from.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The primary context: the `@context` string, or the first entry when
    /// `@context` is an array.
    ///
    /// # Errors
    ///
    /// Fails if the text is not a JSON object or `@context` is missing, empty
    /// or not led by a string.
    pub fn context(&self) -> Result<String, ParseError> {
        let object = self.object()?;
        let context = match object.get(CONTEXT_FIELD) {
            Some(Value::String(context)) => Some(context),
            Some(Value::Array(contexts)) => match contexts.first() {
                Some(Value::String(context)) => Some(context),
                _ => None,
            },
            _ => None,
        };
        context
            .cloned()
            .ok_or_else(|| ParseError::Malformed("missing or malformed @context".into()))
    }

    /// The document's DID.
    ///
    /// # Errors
    ///
    /// Fails if `id` is missing or is not a well-formed DID.
    pub fn id(&self) -> Result<Did, ParseError> {
        let object = self.object()?;
        let Some(Value::String(id)) = object.get("id") else {
            return Err(ParseError::Malformed("missing or malformed id".into()));
        };
        Did::from_str(id)
    }

    /// The `created` timestamp, if present.
    ///
    /// # Errors
    ///
    /// Fails if `created` is present but not an RFC 3339 timestamp.
    pub fn created(&self) -> Result<Option<DateTime<Utc>>, ParseError> {
        timestamp(&self.object()?, "created")
    }

    /// The `updated` timestamp, if present.
    ///
    /// # Errors
    ///
    /// Fails if `updated` is present but not an RFC 3339 timestamp.
    pub fn updated(&self) -> Result<Option<DateTime<Utc>>, ParseError> {
        timestamp(&self.object()?, "updated")
    }

    /// The document's public keys, in document order.
    ///
    /// Keys are read from `publicKey`, falling back to `publicKeys`.
    ///
    /// # Errors
    ///
    /// Fails with [`ParseError::Malformed`] if the key list is missing or an
    /// entry is malformed, or with [`ParseError::UnsupportedSuite`] if a key
    /// `type` names no supported suite.
    pub fn public_keys(&self) -> Result<Vec<QualifiedPublicKey>, ParseError> {
        let mut object = self.object()?;
        let Some(keys) =
            object.remove(PUBLIC_KEY_FIELD).or_else(|| object.remove("publicKeys"))
        else {
            return Err(ParseError::Malformed(format!("missing {PUBLIC_KEY_FIELD}")));
        };

        let entries: Vec<PublicKeyEntry> = serde_json::from_value(keys)?;
        entries.into_iter().map(PublicKeyEntry::qualify).collect()
    }

    fn object(&self) -> Result<Map<String, Value>, ParseError> {
        match serde_json::from_str::<Value>(&self.raw)? {
            Value::Object(object) => Ok(object),
            _ => Err(ParseError::Malformed("document is not a JSON object".into())),
        }
    }
}

impl From<String> for DidDocument {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for DidDocument {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

#[derive(Deserialize)]
struct PublicKeyEntry {
    id: String,
    #[serde(rename = "type")]
    type_: String,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl PublicKeyEntry {
    fn qualify(self) -> Result<QualifiedPublicKey, ParseError> {
        url::Url::parse(&self.id)
            .map_err(|e| ParseError::Malformed(format!("public key id {} is not a URI: {e}", self.id)))?;
        let suite = CryptoSuite::from_key_id(&self.type_)?;
        let value = encoding::decode_field(&self.rest, PUBLIC_KEY_FIELD)?;
        Ok(QualifiedPublicKey {
            id: self.id,
            suite,
            value,
        })
    }
}

fn timestamp(object: &Map<String, Value>, field: &str) -> Result<Option<DateTime<Utc>>, ParseError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => DateTime::parse_from_rfc3339(text)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| ParseError::Malformed(format!("invalid {field} timestamp: {e}"))),
        Some(_) => Err(ParseError::Malformed(format!("{field} must be a string"))),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const DOCUMENT: &str = r#"{
        "@context": "https://w3id.org/did/v1",
        "id": "did:corda:tcn:77ccbf5e-4ddd-4092-b813-ac06084a3eb0",
        "created": "2019-07-11T10:27:27.326Z",
        "publicKey": [
            {
                "id": "did:corda:tcn:77ccbf5e-4ddd-4092-b813-ac06084a3eb0#keys-1",
                "type": "Ed25519VerificationKey2018",
                "controller": "did:corda:tcn:77ccbf5e-4ddd-4092-b813-ac06084a3eb0",
                "publicKeyHex": "00ff"
            }
        ]
    }"#;

    #[test]
    fn fields() {
        let doc = DidDocument::new(DOCUMENT);
        assert_eq!(doc.raw(), DOCUMENT);
        assert_eq!(doc.context().expect("should have context"), "https://w3id.org/did/v1");
        assert_eq!(
            doc.id().expect("should have id").to_string(),
            "did:corda:tcn:77ccbf5e-4ddd-4092-b813-ac06084a3eb0"
        );
        assert_eq!(
            doc.created().expect("should parse"),
            Some(Utc.with_ymd_and_hms(2019, 7, 11, 10, 27, 27).unwrap()
                + chrono::Duration::milliseconds(326))
        );
        assert_eq!(doc.updated().expect("should parse"), None);

        let keys = doc.public_keys().expect("should parse keys");
        assert_eq!(
            keys,
            vec![QualifiedPublicKey {
                id: "did:corda:tcn:77ccbf5e-4ddd-4092-b813-ac06084a3eb0#keys-1".into(),
                suite: CryptoSuite::Ed25519,
                value: vec![0x00, 0xff],
            }]
        );
    }

    #[test]
    fn context_array() {
        let doc = DidDocument::new(r#"{"@context": ["https://www.w3.org/ns/did/v1", {"@base": "x"}]}"#);
        assert_eq!(doc.context().expect("should have context"), "https://www.w3.org/ns/did/v1");

        let doc = DidDocument::new(r#"{"@context": []}"#);
        assert!(doc.context().is_err());

        let doc = DidDocument::new(r#"{"id": "did:corda:tcn:77ccbf5e-4ddd-4092-b813-ac06084a3eb0"}"#);
        assert!(doc.context().is_err());
    }

    #[test]
    fn not_json() {
        let doc = DidDocument::new("{\"@context\": ");
        assert!(matches!(doc.context(), Err(ParseError::Malformed(_))));

        let doc = DidDocument::new("[]");
        assert!(matches!(doc.id(), Err(ParseError::Malformed(_))));
    }

    #[test]
    fn bad_timestamp() {
        let doc = DidDocument::new(r#"{"created": "yesterday", "updated": 1}"#);
        assert!(doc.created().is_err());
        assert!(doc.updated().is_err());
    }

    #[test]
    fn unsupported_key_type() {
        let doc = DidDocument::new(
            r#"{"publicKey": [{"id": "did:corda:tcn:x#k", "type": "X25519KeyAgreementKey2019", "publicKeyHex": "00"}]}"#,
        );
        assert_eq!(
            doc.public_keys(),
            Err(ParseError::UnsupportedSuite("X25519KeyAgreementKey2019".into()))
        );
    }

    #[test]
    fn key_list_required() {
        let doc = DidDocument::new(r#"{"@context": "https://w3id.org/did/v1"}"#);
        assert!(matches!(doc.public_keys(), Err(ParseError::Malformed(_))));

        let doc = DidDocument::new(r#"{"publicKeys": []}"#);
        assert_eq!(doc.public_keys(), Ok(vec![]));
    }

    #[test]
    fn key_missing_value() {
        let doc = DidDocument::new(
            r#"{"publicKey": [{"id": "did:corda:tcn:x#k", "type": "Ed25519VerificationKey2018"}]}"#,
        );
        assert!(matches!(doc.public_keys(), Err(ParseError::Malformed(_))));
    }
}

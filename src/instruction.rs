//! # DID Instruction
//!
//! An instruction travels alongside a DID document and names the requested
//! action together with the signatures proving control of the document's
//! keys.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::encoding;
use crate::error::ParseError;
use crate::suite::CryptoSuite;

/// JSON field prefix for encoded signature values.
pub const SIGNATURE_FIELD: &str = "signature";

/// Operation requested by an instruction.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Fetch a document.
    Read,

    /// Register a new DID.
    Create,

    /// Replace the document for an existing DID.
    Update,

    /// Deactivate an existing DID.
    Delete,
}

impl FromStr for Action {
    type Err = ParseError;

    /// Parse an action name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Read, Self::Create, Self::Update, Self::Delete]
            .into_iter()
            .find(|action| action.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::Malformed(format!("unknown action: {s}")))
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A signature tagged with the key it targets and its crypto suite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QualifiedSignature {
    /// Id of the public key the signature was made with.
    pub target: String,

    /// Suite the signature is declared for.
    pub suite: CryptoSuite,

    /// Decoded signature bytes.
    pub value: Vec<u8>,
}

/// A DID instruction held as raw JSON text.
///
/// Serializes as the raw text itself, so persisting and reloading keeps the
/// signed bytes intact.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DidInstruction {
    raw: String,
}

impl DidInstruction {
    /// Wrap raw instruction text.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The exact text the instruction was created from.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The requested action.
    ///
    /// # Errors
    ///
    /// Fails if `action` is missing, not a string, or not a known action.
    pub fn action(&self) -> Result<Action, ParseError> {
        let object = self.object()?;
        let Some(Value::String(action)) = object.get("action") else {
            return Err(ParseError::Malformed("missing or malformed action".into()));
        };
        Action::from_str(action)
    }

    /// The instruction's signatures, in instruction order.
    ///
    /// # Errors
    ///
    /// Fails with [`ParseError::Malformed`] if `signatures` is missing or an
    /// entry is malformed (including zero or several encoded values), or with
    /// [`ParseError::UnsupportedSuite`] if a signature `type` names no
    /// supported suite.
    pub fn signatures(&self) -> Result<Vec<QualifiedSignature>, ParseError> {
        let mut object = self.object()?;
        let Some(signatures) = object.remove("signatures") else {
            return Err(ParseError::Malformed("missing signatures".into()));
        };
        let entries: Vec<SignatureEntry> = serde_json::from_value(signatures)?;
        entries.into_iter().map(SignatureEntry::qualify).collect()
    }

    fn object(&self) -> Result<Map<String, Value>, ParseError> {
        match serde_json::from_str::<Value>(&self.raw)? {
            Value::Object(object) => Ok(object),
            _ => Err(ParseError::Malformed("instruction is not a JSON object".into())),
        }
    }
}

impl From<String> for DidInstruction {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for DidInstruction {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

#[derive(Deserialize)]
struct SignatureEntry {
    id: String,
    #[serde(rename = "type")]
    type_: String,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl SignatureEntry {
    fn qualify(self) -> Result<QualifiedSignature, ParseError> {
        url::Url::parse(&self.id).map_err(|e| {
            ParseError::Malformed(format!("signature target {} is not a URI: {e}", self.id))
        })?;
        let suite = CryptoSuite::from_signature_id(&self.type_)?;
        let value = encoding::decode_field(&self.rest, SIGNATURE_FIELD)?;
        Ok(QualifiedSignature {
            target: self.id,
            suite,
            value,
        })
    }
}

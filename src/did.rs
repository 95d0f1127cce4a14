//! # Decentralized Identifiers
//!
//! Registry DIDs take the form `did:<method>[:<network>]:<uuid>`, where the
//! UUID is the ledger-wide unique key for the document.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use uuid::Uuid;

use crate::error::ParseError;

/// Delimiter between a DID and the fragment naming one of its keys.
pub const FRAGMENT_DELIMITER: char = '#';

/// A parsed registry DID.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Did {
    /// DID method, e.g. `corda`.
    pub method: String,

    /// Optional network qualifier, e.g. `tcn`.
    pub network: Option<String>,

    /// Method-specific unique identifier.
    pub uuid: Uuid,
}

impl Did {
    /// Generate a new, random DID for the method and network.
    #[must_use]
    pub fn generate(method: impl Into<String>, network: Option<&str>) -> Self {
        Self {
            method: method.into(),
            network: network.map(ToString::to_string),
            uuid: Uuid::new_v4(),
        }
    }

    /// The DID URL for a key fragment: `<did>#<fragment>`.
    #[must_use]
    pub fn key_id(&self, fragment: &str) -> String {
        format!("{self}{FRAGMENT_DELIMITER}{fragment}")
    }
}

impl FromStr for Did {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseError::Malformed(format!("invalid DID: {s}"));

        let parts = s.split(':').collect::<Vec<_>>();
        let (method, network, uuid) = match parts.as_slice() {
            ["did", method, uuid] => (*method, None, *uuid),
            ["did", method, network, uuid] => (*method, Some(*network), *uuid),
            _ => return Err(malformed()),
        };

        let valid_segment =
            |seg: &str| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid_segment(method) || !network.map_or(true, valid_segment) {
            return Err(malformed());
        }

        // only the canonical form is accepted so that `Display` round-trips
        let parsed = Uuid::parse_str(uuid).map_err(|_| malformed())?;
        if parsed.hyphenated().to_string() != uuid {
            return Err(malformed());
        }

        Ok(Self {
            method: method.to_string(),
            network: network.map(ToString::to_string),
            uuid: parsed,
        })
    }
}

impl Display for Did {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.network {
            Some(network) => write!(f, "did:{}:{network}:{}", self.method, self.uuid.hyphenated()),
            None => write!(f, "did:{}:{}", self.method, self.uuid.hyphenated()),
        }
    }
}

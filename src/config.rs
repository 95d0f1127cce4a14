//! # Configuration
//!
//! Settings a host supplies when embedding the registry. The crate reads no
//! environment variables or files: hosts deserialize a [`Config`] from
//! whatever source they use and pass it in.

use serde::{Deserialize, Serialize};

use crate::did::Did;

/// Default DID method served by the registry.
pub const DEFAULT_METHOD: &str = "corda";

/// Default networks served by the registry.
pub const DEFAULT_NETWORKS: [&str; 2] = ["tcn", "tcn-uat"];

/// DID document contexts accepted by default.
pub const DEFAULT_CONTEXTS: [&str; 2] = ["https://w3id.org/did/v1", "https://www.w3.org/ns/did/v1"];

/// Registry and validation settings.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// DID method the registry serves.
    pub method: String,

    /// Networks the registry serves. A DID without a network qualifier is
    /// accepted only when this list is empty.
    pub networks: Vec<String>,

    /// Accepted values for the first (or only) entry of a document's
    /// `@context`.
    pub contexts: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            method: DEFAULT_METHOD.to_string(),
            networks: DEFAULT_NETWORKS.iter().map(ToString::to_string).collect(),
            contexts: DEFAULT_CONTEXTS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl Config {
    /// Whether the DID's method and network are served.
    #[must_use]
    pub fn serves(&self, did: &Did) -> bool {
        if did.method != self.method {
            return false;
        }
        match &did.network {
            Some(network) => self.networks.iter().any(|n| n == network),
            None => self.networks.is_empty(),
        }
    }

    /// Whether `context` is an accepted DID document context.
    #[must_use]
    pub fn accepts_context(&self, context: &str) -> bool {
        self.contexts.iter().any(|c| c == context)
    }
}

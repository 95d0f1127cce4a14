//! # Provider Traits
//!
//! Collaborators the registry relies on but does not implement itself: a
//! store for approved envelopes and, for clients, a signer.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::envelope::DidEnvelope;
use crate::suite::CryptoSuite;

/// [`Signer`] is used by clients to sign a raw document before submitting it.
pub trait Signer: Send + Sync {
    /// The suite the signer produces signatures for.
    fn suite(&self) -> CryptoSuite;

    /// Public key bytes in the form published in a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be encoded.
    fn public_key(&self) -> Result<Vec<u8>>;

    /// Sign `msg`, returning the signature bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    fn try_sign(&self, msg: &[u8]) -> Result<Vec<u8>>;
}

/// Lifecycle state of a registered DID.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The DID accepts updates.
    #[default]
    Active,

    /// The DID was deleted. Its last envelope is kept.
    Deactivated,
}

/// The latest approved envelope for a DID.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct DidRecord {
    /// The approved envelope. Its document is the precursor for the next
    /// modification.
    pub envelope: DidEnvelope,

    /// Lifecycle state.
    pub status: Status,

    /// Number of approved modifications since creation.
    pub revision: u64,
}

/// Result of a conditional write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Commit {
    /// The record was written.
    Committed,

    /// The stored revision did not match the expected revision.
    Conflict,
}

/// [`DidStore`] persists approved envelopes keyed by the DID's UUID.
///
/// Writes are conditional so that two modifications racing from the same
/// precursor cannot both be committed.
pub trait DidStore: Send + Sync {
    /// Fetch the record for `uuid`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get(&self, uuid: &Uuid) -> impl Future<Output = Result<Option<DidRecord>>> + Send;

    /// Write `record` for `uuid` provided the stored revision equals
    /// `expected`. `None` expects no record to exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn put(
        &self, uuid: &Uuid, record: DidRecord, expected: Option<u64>,
    ) -> impl Future<Output = Result<Commit>> + Send;
}

/// In-process [`DidStore`].
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: Arc<DashMap<Uuid, DidRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of DIDs recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no DIDs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl DidStore for MemoryStore {
    async fn get(&self, uuid: &Uuid) -> Result<Option<DidRecord>> {
        Ok(self.records.get(uuid).map(|r| r.value().clone()))
    }

    async fn put(&self, uuid: &Uuid, record: DidRecord, expected: Option<u64>) -> Result<Commit> {
        let commit = match self.records.entry(*uuid) {
            Entry::Occupied(mut stored) if Some(stored.get().revision) == expected => {
                stored.insert(record);
                Commit::Committed
            }
            Entry::Vacant(vacant) if expected.is_none() => {
                vacant.insert(record);
                Commit::Committed
            }
            _ => Commit::Conflict,
        };
        Ok(commit)
    }
}

//! # Registry
//!
//! Applies validated envelopes to a [`DidStore`]. The registry looks up the
//! precursor, runs the matching validation pipeline and commits the result
//! with a conditional write, so concurrent modifications of the same DID
//! cannot both succeed.

use std::str::FromStr;

use anyhow::anyhow;
use tracing::instrument;

use crate::config::Config;
use crate::did::Did;
use crate::envelope::DidEnvelope;
use crate::error::{Error, ValidationFailure};
use crate::instruction::Action;
use crate::provider::{Commit, DidRecord, DidStore, Status};
use crate::Result;

/// A DID registry over a store.
#[derive(Clone, Debug)]
pub struct Registry<S> {
    store: S,
    config: Config,
}

impl<S: DidStore> Registry<S> {
    /// Create a registry with default settings.
    pub fn new(store: S) -> Self {
        Self::with_config(store, Config::default())
    }

    /// Create a registry with explicit settings.
    pub const fn with_config(store: S, config: Config) -> Self {
        Self { store, config }
    }

    /// The registry settings.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Dispatch an envelope on its instruction's action.
    ///
    /// # Errors
    ///
    /// Returns the error from the dispatched operation, or
    /// [`ValidationFailure::MalformedInstruction`] if the action is unreadable.
    #[instrument(level = "debug", skip_all)]
    pub async fn submit(&self, envelope: DidEnvelope) -> Result<DidRecord> {
        let action = envelope
            .instruction()
            .action()
            .map_err(|e| ValidationFailure::malformed_instruction(&e))?;
        match action {
            Action::Create => self.create(envelope).await,
            Action::Update => self.update(envelope).await,
            Action::Delete => self.delete(envelope).await,
            Action::Read => {
                let did = self.did(&envelope)?;
                self.read(&did.to_string()).await
            }
        }
    }

    /// Register a new DID.
    ///
    /// # Errors
    ///
    /// Fails if the DID is not served here, already exists, or the envelope
    /// fails creation validation.
    #[instrument(level = "debug", skip_all)]
    pub async fn create(&self, envelope: DidEnvelope) -> Result<DidRecord> {
        let did = self.did(&envelope)?;
        if self.store.get(&did.uuid).await?.is_some() {
            return Err(Error::AlreadyExists(did.to_string()));
        }

        envelope.validate_creation_with(&self.config)?;

        let record = DidRecord {
            envelope,
            status: Status::Active,
            revision: 0,
        };
        self.commit(&did, record, None).await
    }

    /// Replace the document of an active DID.
    ///
    /// # Errors
    ///
    /// Fails if the DID is unknown or deactivated, or the envelope fails
    /// modification validation against the current document.
    #[instrument(level = "debug", skip_all)]
    pub async fn update(&self, envelope: DidEnvelope) -> Result<DidRecord> {
        let did = self.did(&envelope)?;
        let current = self.active(&did, Error::InvalidDid).await?;

        envelope.validate_modification_with(current.envelope.document(), &self.config)?;

        let record = DidRecord {
            envelope,
            status: Status::Active,
            revision: current.revision + 1,
        };
        self.commit(&did, record, Some(current.revision)).await
    }

    /// Deactivate an active DID.
    ///
    /// # Errors
    ///
    /// Fails if the DID is unknown or already deactivated, or the envelope
    /// fails deletion validation against the current document.
    #[instrument(level = "debug", skip_all)]
    pub async fn delete(&self, envelope: DidEnvelope) -> Result<DidRecord> {
        let did = self.did(&envelope)?;
        let current = self.active(&did, Error::InvalidDid).await?;

        envelope.validate_deletion_with(current.envelope.document(), &self.config)?;

        let record = DidRecord {
            envelope,
            status: Status::Deactivated,
            revision: current.revision + 1,
        };
        self.commit(&did, record, Some(current.revision)).await
    }

    /// Fetch the current record of an active DID.
    ///
    /// # Errors
    ///
    /// Fails if `did` is malformed or not served here, or the DID is unknown
    /// or deactivated.
    #[instrument(level = "debug", skip(self))]
    pub async fn read(&self, did: &str) -> Result<DidRecord> {
        let did = Did::from_str(did).map_err(|e| Error::InvalidDid(e.to_string()))?;
        self.serves(&did)?;
        self.active(&did, |_| Error::NotFound(did.to_string())).await
    }

    // Parse the document's DID and check this registry serves it.
    fn did(&self, envelope: &DidEnvelope) -> Result<Did> {
        let did = envelope.document().id().map_err(|e| Error::InvalidDid(e.to_string()))?;
        self.serves(&did)?;
        Ok(did)
    }

    fn serves(&self, did: &Did) -> Result<()> {
        if !self.config.serves(did) {
            return Err(Error::UnsupportedNetwork(did.to_string()));
        }
        Ok(())
    }

    // Records are keyed by UUID alone, so a record found for `did` must also
    // have been registered under `did`. Otherwise `mismatch` builds the error.
    async fn active(&self, did: &Did, mismatch: impl FnOnce(String) -> Error) -> Result<DidRecord> {
        let Some(record) = self.store.get(&did.uuid).await? else {
            return Err(Error::NotFound(did.to_string()));
        };
        let registered = record
            .envelope
            .document()
            .id()
            .map_err(|e| anyhow!("stored document for {did} has an invalid id: {e}"))?;
        if registered != *did {
            return Err(mismatch(format!("{did} is registered as {registered}")));
        }
        if record.status == Status::Deactivated {
            return Err(Error::Deactivated(did.to_string()));
        }
        Ok(record)
    }

    async fn commit(&self, did: &Did, record: DidRecord, expected: Option<u64>) -> Result<DidRecord> {
        match self.store.put(&did.uuid, record.clone(), expected).await? {
            Commit::Committed => {
                tracing::info!(%did, revision = record.revision, status = ?record.status, "DID committed");
                Ok(record)
            }
            Commit::Conflict if expected.is_none() => Err(Error::AlreadyExists(did.to_string())),
            Commit::Conflict => Err(Error::Conflict(did.to_string())),
        }
    }
}

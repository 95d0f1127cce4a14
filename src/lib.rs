//! # DID Registry
//!
//! Validation engine for a registry of ledger-backed Decentralized
//! Identifiers (DIDs).
//!
//! Clients submit a [`DidEnvelope`]: a signed instruction (create, update or
//! delete) together with the raw JSON text of the DID document it applies to.
//! The engine decides whether the envelope may be committed. Each validation
//! pipeline returns either approval or the first [`ValidationFailure`] found,
//! checking in order:
//!
//! * document structure and `@context`,
//! * timestamp ordering, within the document and against its precursor,
//! * signature and key bookkeeping (duplicates, counts, targets, key ids),
//! * crypto suite agreement between each key and its signature,
//! * every signature over the exact document bytes,
//! * for updates and deletes, re-signing by every precursor key.
//!
//! Signatures are verified over the document text exactly as submitted, so
//! documents are never re-serialized between submission and verification.
//!
//! [`Registry`] applies approved envelopes to a [`DidStore`].

pub mod builder;
pub mod config;
pub mod did;
pub mod document;
pub mod encoding;
pub mod envelope;
pub mod error;
pub mod instruction;
pub mod provider;
pub mod registry;
pub mod suite;
pub mod verify;

pub use self::builder::{DocumentBuilder, InstructionBuilder};
pub use self::config::Config;
pub use self::did::Did;
pub use self::document::{DidDocument, QualifiedPublicKey};
pub use self::encoding::Encoding;
pub use self::envelope::{DidEnvelope, Validation};
pub use self::error::{Error, ParseError, ValidationFailure};
pub use self::instruction::{Action, DidInstruction, QualifiedSignature};
pub use self::provider::{Commit, DidRecord, DidStore, MemoryStore, Signer, Status};
pub use self::registry::Registry;
pub use self::suite::CryptoSuite;

/// Result type for registry operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

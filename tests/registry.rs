//! Tests for applying envelopes to a registry backed by the in-memory store.

use chrono::{DateTime, TimeZone, Utc};
use did_registry::{
    Action, Config, CryptoSuite, Did, DidEnvelope, DocumentBuilder, Error, InstructionBuilder,
    MemoryStore, Registry, Signer, Status,
};
use kms::Keyring;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 8, 14, hour, 0, 0).unwrap()
}

fn envelope(
    action: Action, did: &Did, keyring: &Keyring, keys: &[&str], signers: &[&str], updated: Option<DateTime<Utc>>,
) -> DidEnvelope {
    let mut builder = DocumentBuilder::new(did).created(at(1));
    if let Some(updated) = updated {
        builder = builder.updated(updated);
    }
    for id in keys {
        let key = keyring.get(id).expect("should get key");
        builder = builder.public_key(*id, key.suite(), &key.public_key().expect("should get public key"));
    }
    let document = builder.build().expect("should build document");

    let mut builder = InstructionBuilder::new(action);
    for id in signers {
        builder = builder.sign(*id, &document, keyring.get(id).expect("should get key")).expect("should sign");
    }
    let instruction = builder.build().expect("should build instruction");

    DidEnvelope::new(instruction, document)
}

fn subject(network: &str) -> (Did, Keyring, String) {
    let did = Did::generate("corda", Some(network));
    let k1 = did.key_id("keys-1");
    let mut keyring = Keyring::new();
    keyring.add(&k1, CryptoSuite::EcdsaSecp256k1).expect("should add key");
    (did, keyring, k1)
}

// Test the happy path through a DID's full lifecycle.
#[tokio::test]
async fn lifecycle() {
    init_tracing();
    let registry = Registry::new(MemoryStore::new());
    let (did, mut keyring, k1) = subject("tcn");
    let k2 = did.key_id("keys-2");
    keyring.add(&k2, CryptoSuite::Ed25519).expect("should add key");

    // --- Create --------------------------------------------------------------

    let create = envelope(Action::Create, &did, &keyring, &[&k1], &[&k1], None);
    let record = registry.create(create.clone()).await.expect("should create");
    assert_eq!(record.revision, 0);
    assert_eq!(record.status, Status::Active);

    let read = registry.read(&did.to_string()).await.expect("should read");
    assert_eq!(read.envelope, create);

    // --- Update --------------------------------------------------------------

    let update = envelope(Action::Update, &did, &keyring, &[&k1, &k2], &[&k1, &k2], Some(at(2)));
    let record = registry.update(update).await.expect("should update");
    assert_eq!(record.revision, 1);

    // k2 is now registered so must sign too
    let update = envelope(Action::Update, &did, &keyring, &[&k1], &[&k1], Some(at(3)));
    let err = registry.update(update).await.expect_err("should reject");
    assert_eq!(err.code(), "missing_signature_failure");

    // --- Delete --------------------------------------------------------------

    let delete = envelope(Action::Delete, &did, &keyring, &[&k1, &k2], &[&k1, &k2], Some(at(2)));
    let record = registry.delete(delete).await.expect("should delete");
    assert_eq!(record.revision, 2);
    assert_eq!(record.status, Status::Deactivated);

    let err = registry.read(&did.to_string()).await.expect_err("should be deactivated");
    assert!(matches!(err, Error::Deactivated(_)));

    let update = envelope(Action::Update, &did, &keyring, &[&k1, &k2], &[&k1, &k2], Some(at(4)));
    let err = registry.update(update).await.expect_err("should be deactivated");
    assert!(matches!(err, Error::Deactivated(_)));
}

#[tokio::test]
async fn create_twice() {
    let registry = Registry::new(MemoryStore::new());
    let (did, keyring, k1) = subject("tcn");

    let create = envelope(Action::Create, &did, &keyring, &[&k1], &[&k1], None);
    registry.create(create.clone()).await.expect("should create");

    let err = registry.create(create).await.expect_err("should exist");
    assert!(matches!(err, Error::AlreadyExists(_)));
}

#[tokio::test]
async fn rejected_create_is_not_stored() {
    init_tracing();
    let store = MemoryStore::new();
    let registry = Registry::new(store.clone());
    let (did, keyring, k1) = subject("tcn");

    let create = envelope(Action::Create, &did, &keyring, &[&k1], &[], None);
    let err = registry.create(create).await.expect_err("should reject");
    insta::assert_json_snapshot!(err.to_json(), @r#"
    {
      "error": "signature_count_failure",
      "error_description": "fewer signatures than public keys"
    }
    "#);
    assert!(store.is_empty());
}

#[tokio::test]
async fn unknown_did() {
    let registry = Registry::new(MemoryStore::new());
    let (did, keyring, k1) = subject("tcn");

    let update = envelope(Action::Update, &did, &keyring, &[&k1], &[&k1], Some(at(2)));
    let err = registry.update(update).await.expect_err("should not exist");
    assert!(matches!(err, Error::NotFound(_)));

    let err = registry.read("did:corda:tcn:not-a-uuid").await.expect_err("should be invalid");
    assert!(matches!(err, Error::InvalidDid(_)));
}

#[tokio::test]
async fn unsupported_network() {
    let registry = Registry::new(MemoryStore::new());
    let (did, keyring, k1) = subject("mainnet");

    let create = envelope(Action::Create, &did, &keyring, &[&k1], &[&k1], None);
    let err = registry.create(create.clone()).await.expect_err("should not be served");
    assert_eq!(err.code(), "unsupported_network");

    let config = Config {
        networks: vec!["mainnet".into()],
        ..Config::default()
    };
    let registry = Registry::with_config(MemoryStore::new(), config);
    assert_eq!(registry.config().networks, vec!["mainnet".to_string()]);
    registry.create(create).await.expect("should create");
}

// A UUID registered on one network is not visible under another.
#[tokio::test]
async fn read_other_network() {
    let registry = Registry::new(MemoryStore::new());
    let (did, keyring, k1) = subject("tcn");

    let create = envelope(Action::Create, &did, &keyring, &[&k1], &[&k1], None);
    registry.create(create).await.expect("should create");

    let other = Did {
        network: Some("tcn-uat".into()),
        ..did.clone()
    };
    let err = registry.read(&other.to_string()).await.expect_err("should not be found");
    assert!(matches!(err, Error::NotFound(_)));
}

// An update cannot move a registered DID to another network, even when the
// registered keys sign it.
#[tokio::test]
async fn update_cannot_change_did() {
    let registry = Registry::new(MemoryStore::new());
    let (did, mut keyring, k1) = subject("tcn");

    let create = envelope(Action::Create, &did, &keyring, &[&k1], &[&k1], None);
    registry.create(create.clone()).await.expect("should create");

    let moved = Did {
        network: Some("tcn-uat".into()),
        ..did.clone()
    };
    let moved_k1 = moved.key_id("keys-1");
    keyring.add(&moved_k1, CryptoSuite::Ed25519).expect("should add key");

    let update = envelope(Action::Update, &moved, &keyring, &[&moved_k1], &[&moved_k1, &k1], Some(at(2)));
    let err = registry.update(update).await.expect_err("should reject");
    assert!(matches!(err, Error::InvalidDid(_)));

    let delete = envelope(Action::Delete, &moved, &keyring, &[&moved_k1], &[&moved_k1, &k1], None);
    let err = registry.delete(delete).await.expect_err("should reject");
    assert!(matches!(err, Error::InvalidDid(_)));

    let record = registry.read(&did.to_string()).await.expect("should read");
    assert_eq!(record.revision, 0);
    assert_eq!(record.envelope, create);
}

// Envelopes are routed by their instruction's action.
#[tokio::test]
async fn submit() {
    let registry = Registry::new(MemoryStore::new());
    let (did, keyring, k1) = subject("tcn-uat");

    let create = envelope(Action::Create, &did, &keyring, &[&k1], &[&k1], None);
    let record = registry.submit(create.clone()).await.expect("should create");
    assert_eq!(record.revision, 0);

    let read = envelope(Action::Read, &did, &keyring, &[&k1], &[], None);
    let record = registry.submit(read).await.expect("should read");
    assert_eq!(record.envelope, create);

    let update = envelope(Action::Update, &did, &keyring, &[&k1], &[&k1], Some(at(5)));
    let record = registry.submit(update).await.expect("should update");
    assert_eq!(record.revision, 1);

    let delete = envelope(Action::Delete, &did, &keyring, &[&k1], &[&k1], None);
    let record = registry.submit(delete).await.expect("should delete");
    assert_eq!(record.status, Status::Deactivated);
}

// Records survive a serialization round trip with their signed bytes intact.
#[tokio::test]
async fn persisted_envelope_revalidates() {
    let registry = Registry::new(MemoryStore::new());
    let (did, keyring, k1) = subject("tcn");

    let create = envelope(Action::Create, &did, &keyring, &[&k1], &[&k1], None);
    let record = registry.create(create).await.expect("should create");

    let json = serde_json::to_string(&record).expect("should serialize");
    let restored: did_registry::DidRecord = serde_json::from_str(&json).expect("should deserialize");
    assert_eq!(restored.envelope.validate_creation(), Ok(()));
}

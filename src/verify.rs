//! # Signature Verification
//!
//! Verify a signature over a message for one of the supported crypto suites.
//!
//! Key material is accepted in the raw form native to each algorithm and as
//! X.509 `SubjectPublicKeyInfo` DER, the form most ledger clients export.

use anyhow::anyhow;
use ed25519_dalek::pkcs8::DecodePublicKey as _;
use k256::pkcs8::DecodePublicKey as _;
use rsa::pkcs1::DecodeRsaPublicKey as _;
use rsa::pkcs8::DecodePublicKey as _;
use sha2::Sha256;

use crate::suite::CryptoSuite;

/// Verify `signature` over `message` with `public_key`, using the algorithm
/// named by `suite`.
///
/// Key or signature bytes that cannot be decoded for the suite never verify.
#[must_use]
pub fn verify(message: &[u8], signature: &[u8], public_key: &[u8], suite: CryptoSuite) -> bool {
    let verified = match suite {
        CryptoSuite::Ed25519 => verify_ed25519(message, signature, public_key),
        CryptoSuite::Rsa => verify_rsa(message, signature, public_key),
        CryptoSuite::EcdsaSecp256k1 => verify_secp256k1(message, signature, public_key),
    };
    if let Err(e) = &verified {
        tracing::debug!(%suite, "signature did not verify: {e}");
    }
    verified.is_ok()
}

fn verify_ed25519(message: &[u8], signature: &[u8], public_key: &[u8]) -> anyhow::Result<()> {
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    let key = if public_key.len() == ed25519_dalek::PUBLIC_KEY_LENGTH {
        VerifyingKey::try_from(public_key).map_err(|e| anyhow!("invalid key: {e}"))?
    } else {
        VerifyingKey::from_public_key_der(public_key).map_err(|e| anyhow!("invalid key: {e}"))?
    };
    let signature = Signature::from_slice(signature).map_err(|e| anyhow!("invalid signature: {e}"))?;
    key.verify(message, &signature).map_err(|e| anyhow!("{e}"))
}

fn verify_rsa(message: &[u8], signature: &[u8], public_key: &[u8]) -> anyhow::Result<()> {
    use rsa::pkcs1v15::{Signature, VerifyingKey};
    use rsa::signature::Verifier;
    use rsa::RsaPublicKey;

    let key = match RsaPublicKey::from_public_key_der(public_key) {
        Ok(key) => key,
        Err(_) => RsaPublicKey::from_pkcs1_der(public_key).map_err(|e| anyhow!("invalid key: {e}"))?,
    };
    let signature = Signature::try_from(signature).map_err(|e| anyhow!("invalid signature: {e}"))?;
    VerifyingKey::<Sha256>::new(key).verify(message, &signature).map_err(|e| anyhow!("{e}"))
}

fn verify_secp256k1(message: &[u8], signature: &[u8], public_key: &[u8]) -> anyhow::Result<()> {
    use k256::ecdsa::signature::Verifier;
    use k256::ecdsa::{Signature, VerifyingKey};

    let key = match VerifyingKey::from_sec1_bytes(public_key) {
        Ok(key) => key,
        Err(_) => VerifyingKey::from_public_key_der(public_key).map_err(|e| anyhow!("invalid key: {e}"))?,
    };
    let signature = match Signature::from_der(signature) {
        Ok(signature) => signature,
        Err(_) => Signature::from_slice(signature).map_err(|e| anyhow!("invalid signature: {e}"))?,
    };
    // signers outside RustCrypto do not always emit low-S signatures
    let signature = signature.normalize_s().unwrap_or(signature);
    key.verify(message, &signature).map_err(|e| anyhow!("{e}"))
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::pkcs8::EncodePublicKey as _;
    use ed25519_dalek::{Signer as _, SigningKey};
    use k256::ecdsa::signature::Signer as _;
    use rand::rngs::OsRng;

    use super::*;

    const MESSAGE: &[u8] = br#"{"@context":"https://w3id.org/did/v1"}"#;

    #[test]
    fn ed25519_raw_and_der() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let signature = signing_key.sign(MESSAGE).to_bytes();

        let raw = signing_key.verifying_key().to_bytes();
        assert!(verify(MESSAGE, &signature, &raw, CryptoSuite::Ed25519));

        let der = signing_key.verifying_key().to_public_key_der().expect("should encode");
        assert!(verify(MESSAGE, &signature, der.as_bytes(), CryptoSuite::Ed25519));

        assert!(!verify(b"tampered", &signature, &raw, CryptoSuite::Ed25519));
    }

    #[test]
    fn secp256k1_der_and_fixed() {
        let signing_key = k256::ecdsa::SigningKey::random(&mut OsRng);
        let public_key = signing_key.verifying_key().to_sec1_bytes();
        let signature: k256::ecdsa::Signature = signing_key.sign(MESSAGE);

        assert!(verify(MESSAGE, &signature.to_bytes(), &public_key, CryptoSuite::EcdsaSecp256k1));
        assert!(verify(
            MESSAGE,
            signature.to_der().as_bytes(),
            &public_key,
            CryptoSuite::EcdsaSecp256k1
        ));
        assert!(!verify(b"tampered", &signature.to_bytes(), &public_key, CryptoSuite::EcdsaSecp256k1));
    }

    #[test]
    fn suite_dispatch() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let signature = signing_key.sign(MESSAGE).to_bytes();
        let raw = signing_key.verifying_key().to_bytes();

        assert!(!verify(MESSAGE, &signature, &raw, CryptoSuite::EcdsaSecp256k1));
        assert!(!verify(MESSAGE, &signature, &raw, CryptoSuite::Rsa));
    }

    #[test]
    fn garbage() {
        for suite in CryptoSuite::ALL {
            assert!(!verify(MESSAGE, &[], &[], suite));
            assert!(!verify(MESSAGE, &[0u8; 64], &[1u8; 32], suite));
        }
    }
}

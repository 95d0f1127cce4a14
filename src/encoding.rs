//! # Binary Encodings
//!
//! Key material and signature values are carried in one of four text
//! encodings. The encoding is signalled by the JSON field name, e.g.
//! `signatureBase58` or `publicKeyHex`, and exactly one such field must be
//! present on each object.

use base64ct::{Base64, Encoding as _};
use multibase::Base;
use serde_json::{Map, Value};

use crate::error::ParseError;

/// Text encodings for binary values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Encoding {
    /// Bitcoin-alphabet Base58.
    #[default]
    Base58,

    /// Self-describing multibase string.
    Multibase,

    /// Standard padded Base64.
    Base64,

    /// Lower or upper case hexadecimal.
    Hex,
}

impl Encoding {
    /// All supported encodings.
    pub const ALL: [Self; 4] = [Self::Base58, Self::Multibase, Self::Base64, Self::Hex];

    /// Field name suffix for the encoding.
    #[must_use]
    pub const fn suffix(&self) -> &'static str {
        match self {
            Self::Base58 => "Base58",
            Self::Multibase => "Multibase",
            Self::Base64 => "Base64",
            Self::Hex => "Hex",
        }
    }

    /// The JSON field name carrying a value in this encoding, e.g.
    /// `field("signature")` is `signatureBase58`.
    #[must_use]
    pub fn field(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.suffix())
    }

    /// Decode a value.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Malformed`] if the text is not valid in this
    /// encoding.
    pub fn decode(&self, value: &str) -> Result<Vec<u8>, ParseError> {
        let decoded = match self {
            Self::Base58 => bs58::decode(value).into_vec().map_err(|e| e.to_string()),
            Self::Multibase => multibase::decode(value).map(|(_, bytes)| bytes).map_err(|e| e.to_string()),
            Self::Base64 => Base64::decode_vec(value).map_err(|e| e.to_string()),
            Self::Hex => hex::decode(value).map_err(|e| e.to_string()),
        };
        decoded.map_err(|e| ParseError::Malformed(format!("invalid {} value: {e}", self.suffix())))
    }

    /// Encode a value.
    #[must_use]
    pub fn encode(&self, bytes: &[u8]) -> String {
        match self {
            Self::Base58 => bs58::encode(bytes).into_string(),
            Self::Multibase => multibase::encode(Base::Base58Btc, bytes),
            Self::Base64 => Base64::encode_string(bytes),
            Self::Hex => hex::encode(bytes),
        }
    }
}

/// Find the single encoded value on `object` whose field name starts with
/// `prefix`, and decode it.
///
/// # Errors
///
/// Returns [`ParseError::Malformed`] if no encoded field or more than one is
/// present, if the field is not a string, or if decoding fails.
pub fn decode_field(object: &Map<String, Value>, prefix: &str) -> Result<Vec<u8>, ParseError> {
    let mut present = Encoding::ALL.into_iter().filter_map(|encoding| {
        object.get(&encoding.field(prefix)).map(|value| (encoding, value))
    });

    let Some((encoding, value)) = present.next() else {
        return Err(ParseError::Malformed(format!("no {prefix} value present")));
    };
    if let Some((other, _)) = present.next() {
        return Err(ParseError::Malformed(format!(
            "ambiguous {prefix} value: both {} and {} present",
            encoding.field(prefix),
            other.field(prefix)
        )));
    }

    let Value::String(text) = value else {
        return Err(ParseError::Malformed(format!("{} must be a string", encoding.field(prefix))));
    };
    encoding.decode(text)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        let Value::Object(map) = value else {
            panic!("should be an object");
        };
        map
    }

    #[test]
    fn each_encoding() {
        let bytes = b"proof of control".to_vec();
        for encoding in Encoding::ALL {
            let map = object(json!({ encoding.field("signature"): encoding.encode(&bytes) }));
            assert_eq!(decode_field(&map, "signature").expect("should decode"), bytes);
        }
    }

    #[test]
    fn none_present() {
        let map = object(json!({"id": "did:corda:tcn:x#keys-1"}));
        let err = decode_field(&map, "signature").expect_err("should fail");
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[test]
    fn two_present() {
        let map = object(json!({
            "signatureHex": "00ff",
            "signatureBase64": "AP8=",
        }));
        let err = decode_field(&map, "signature").expect_err("should fail");
        assert!(matches!(err, ParseError::Malformed(msg) if msg.contains("ambiguous")));
    }

    #[test]
    fn bad_text() {
        let map = object(json!({"publicKeyBase58": "0OIl"}));
        assert!(decode_field(&map, "publicKey").is_err());

        let map = object(json!({"publicKeyHex": 42}));
        assert!(decode_field(&map, "publicKey").is_err());
    }

    #[test]
    fn multibase_any_base() {
        let map = object(json!({"signatureMultibase": "f00ff"}));
        assert_eq!(decode_field(&map, "signature").expect("should decode"), vec![0x00, 0xff]);
    }
}

//! Capability interfaces for cryptographic keys.
//!
//! The core never implements a cipher or a signature scheme itself. It talks
//! to keys through the small traits in this module, and turns serialized key
//! material into live key objects through per-algorithm factories resolved
//! from the [registry][crate::registry::Registries]. The default providers
//! live next door in this crate's crypto modules, but nothing here knows
//! that.

use crate::{
    error::Result,
    registry::Registries,
};
use rand_core::CryptoRngCore;
use serde_derive::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// Things common to every key: which algorithm it belongs to and its raw
/// (public-facing) byte representation.
pub trait CryptoKey: Debug + Send + Sync {
    /// The algorithm tag this key belongs to, eg "ed25519".
    fn algorithm(&self) -> &str;

    /// The raw bytes of the key material this key carries on the wire: the
    /// public bytes for a verifying/encrypting key, the secret bytes for a
    /// signing/symmetric key.
    fn data(&self) -> &[u8];
}

/// A key that can verify signatures.
pub trait VerifyKey: CryptoKey {
    /// Verify a detached signature over `data`. A `false` here is an
    /// expected, recoverable outcome, not an error.
    fn verify(&self, data: &[u8], signature: &[u8]) -> bool;
}

/// A key that can produce signatures.
pub trait SignKey: CryptoKey {
    /// Sign `data`, returning the detached signature bytes.
    fn sign(&self, data: &[u8]) -> Vec<u8>;

    /// The verifying key paired with this signing key.
    fn verify_key(&self) -> Arc<dyn VerifyKey>;
}

/// A key that can encrypt.
pub trait EncryptKey: CryptoKey {
    /// Encrypt `plaintext`, returning a self-contained ciphertext.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;
}

/// A key that can decrypt.
pub trait DecryptKey: CryptoKey {
    /// Decrypt a ciphertext produced by the matching [`EncryptKey`]. Returns
    /// `None` when the ciphertext doesn't open under this key; that is an
    /// answer, not an error.
    fn decrypt(&self, ciphertext: &[u8]) -> Option<Vec<u8>>;
}

/// A symmetric key encrypts and decrypts with the same material.
pub trait SymmetricKey: EncryptKey + DecryptKey {}

/// The wire form of a key: an algorithm tag plus the raw key bytes, carried
/// as base64 inside JSON. This is the `algorithm`/`data` contract shared
/// with every other implementation of the protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
pub struct KeyRecord {
    /// Algorithm tag, eg "ed25519".
    algorithm: String,
    /// Raw key bytes.
    #[serde(with = "crate::util::ser::human_bytes")]
    data: Vec<u8>,
}

impl KeyRecord {
    /// Create a new key record.
    pub fn new<S: Into<String>>(algorithm: S, data: Vec<u8>) -> Self {
        Self {
            algorithm: algorithm.into(),
            data,
        }
    }

    /// Build the wire record for any live key.
    pub fn from_key<K: CryptoKey + ?Sized>(key: &K) -> Self {
        Self::new(key.algorithm(), key.data().to_vec())
    }
}

/// Builds [`VerifyKey`]s for one algorithm family.
pub trait PublicKeyFactory: Send + Sync {
    /// Parse a wire record into a live verifying key. `None` means the
    /// record is malformed for this algorithm (wrong length, bad point).
    fn parse(&self, record: &KeyRecord) -> Option<Arc<dyn VerifyKey>>;
}

/// Builds [`SignKey`]s for one algorithm family.
pub trait PrivateKeyFactory: Send + Sync {
    /// Generate a fresh signing key.
    fn generate(&self, rng: &mut dyn CryptoRngCore) -> Arc<dyn SignKey>;

    /// Parse a wire record holding private key material into a live signing
    /// key. `None` on malformed input.
    fn parse(&self, record: &KeyRecord) -> Option<Arc<dyn SignKey>>;
}

/// Builds [`SymmetricKey`]s for one algorithm family.
pub trait SymmetricKeyFactory: Send + Sync {
    /// Generate a fresh symmetric key.
    fn generate(&self, rng: &mut dyn CryptoRngCore) -> Arc<dyn SymmetricKey>;

    /// Parse a wire record into a live symmetric key. `None` on malformed
    /// input.
    fn parse(&self, record: &KeyRecord) -> Option<Arc<dyn SymmetricKey>>;
}

impl Registries {
    /// Parse a public key record through the registered factory for its
    /// algorithm. `Err` when no factory (and no wildcard) is registered,
    /// `Ok(None)` when the record is malformed.
    pub fn parse_public_key(&self, record: &KeyRecord) -> Result<Option<Arc<dyn VerifyKey>>> {
        let factory = self.public_keys().require(record.algorithm())?;
        Ok(factory.parse(record))
    }

    /// Parse a private key record through the registered factory for its
    /// algorithm.
    pub fn parse_private_key(&self, record: &KeyRecord) -> Result<Option<Arc<dyn SignKey>>> {
        let factory = self.private_keys().require(record.algorithm())?;
        Ok(factory.parse(record))
    }

    /// Parse a symmetric key record through the registered factory for its
    /// algorithm.
    pub fn parse_symmetric_key(&self, record: &KeyRecord) -> Result<Option<Arc<dyn SymmetricKey>>> {
        let factory = self.symmetric_keys().require(record.algorithm())?;
        Ok(factory.parse(record))
    }

    /// Generate a fresh signing key for the given algorithm.
    pub fn generate_private_key(&self, algorithm: &str, rng: &mut dyn CryptoRngCore) -> Result<Arc<dyn SignKey>> {
        let factory = self.private_keys().require(algorithm)?;
        Ok(factory.generate(rng))
    }

    /// Generate a fresh symmetric key for the given algorithm.
    pub fn generate_symmetric_key(&self, algorithm: &str, rng: &mut dyn CryptoRngCore) -> Result<Arc<dyn SymmetricKey>> {
        let factory = self.symmetric_keys().require(algorithm)?;
        Ok(factory.generate(rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_record_json_shape() {
        let record = KeyRecord::new("ed25519", vec![1, 2, 3, 4]);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["algorithm"], "ed25519");
        assert_eq!(json["data"], "AQIDBA==");
        let back: KeyRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn key_record_bad_base64_rejected() {
        let res: std::result::Result<KeyRecord, _> =
            serde_json::from_str(r#"{"algorithm":"ed25519","data":"%%%"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn registries_key_parse_no_factory() {
        let registries = Registries::new();
        let record = KeyRecord::new("ed25519", vec![0; 32]);
        let err = registries.parse_public_key(&record).unwrap_err();
        assert!(matches!(err, crate::error::Error::FactoryNotRegistered { .. }));
    }
}

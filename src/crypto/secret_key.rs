//! The default symmetric provider: XChaCha20Poly1305.

use crate::{
    crypto::key::{CryptoKey, DecryptKey, EncryptKey, KeyRecord, SymmetricKey, SymmetricKeyFactory},
    error::{Error, Result},
};
use chacha20poly1305::aead::{Aead, KeyInit};
use rand::{rngs::OsRng, RngCore};
use rand_core::CryptoRngCore;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Algorithm tag for XChaCha20Poly1305 keys.
pub const XCHACHA20POLY1305: &str = "xchacha20poly1305";

const NONCE_LEN: usize = 24;

/// A symmetric encryption key. Ciphertexts are self-contained: a random
/// 24-byte nonce rides in front of the AEAD output.
#[derive(Clone)]
pub struct SecretKey {
    key: Zeroizing<[u8; 32]>,
}

impl SecretKey {
    /// Create a new xchacha20poly1305 key.
    pub fn new(rng: &mut dyn CryptoRngCore) -> Self {
        let mut randbuf = [0u8; 32];
        rng.fill_bytes(&mut randbuf);
        Self::from_bytes(randbuf)
    }

    /// Build a key from 32 raw bytes.
    pub fn from_bytes(key: [u8; 32]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    fn cipher(&self) -> chacha20poly1305::XChaCha20Poly1305 {
        chacha20poly1305::XChaCha20Poly1305::new(chacha20poly1305::Key::from_slice(
            self.key.as_slice(),
        ))
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey({})", XCHACHA20POLY1305)
    }
}

impl CryptoKey for SecretKey {
    fn algorithm(&self) -> &str {
        XCHACHA20POLY1305
    }

    fn data(&self) -> &[u8] {
        self.key.as_ref()
    }
}

impl EncryptKey for SecretKey {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = self
            .cipher()
            .encrypt(chacha20poly1305::XNonce::from_slice(&nonce), plaintext)
            .map_err(|_| Error::CryptoSealFailed)?;
        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }
}

impl DecryptKey for SecretKey {
    fn decrypt(&self, ciphertext: &[u8]) -> Option<Vec<u8>> {
        if ciphertext.len() < NONCE_LEN {
            return None;
        }
        let (nonce, body) = ciphertext.split_at(NONCE_LEN);
        self.cipher()
            .decrypt(chacha20poly1305::XNonce::from_slice(nonce), body)
            .ok()
    }
}

impl SymmetricKey for SecretKey {}

/// Factory for XChaCha20Poly1305 keys, registered under
/// [`XCHACHA20POLY1305`] in the symmetric key registry.
#[derive(Debug, Default)]
pub struct SecretKeyFactory;

impl SymmetricKeyFactory for SecretKeyFactory {
    fn generate(&self, rng: &mut dyn CryptoRngCore) -> Arc<dyn SymmetricKey> {
        Arc::new(SecretKey::new(rng))
    }

    fn parse(&self, record: &KeyRecord) -> Option<Arc<dyn SymmetricKey>> {
        let bytes: [u8; 32] = record.data().as_slice().try_into().ok()?;
        Some(Arc::new(SecretKey::from_bytes(bytes)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[test]
    fn secretkey_enc_dec() {
        let mut rng = crate::util::test::rng();
        let key = SecretKey::new(&mut rng);
        let sealed = key.encrypt(b"get a job").unwrap();
        let opened = key.decrypt(&sealed).unwrap();
        assert_eq!(opened.as_slice(), b"get a job");
    }

    #[test]
    fn secretkey_wrong_key_fails() {
        let mut rng = crate::util::test::rng();
        let key1 = SecretKey::new(&mut rng);
        let key2 = SecretKey::new(&mut rng);
        let sealed = key1.encrypt(b"need to know basis").unwrap();
        assert!(key2.decrypt(&sealed).is_none());
    }

    #[test]
    fn secretkey_tampered_ciphertext_fails() {
        let mut rng = crate::util::test::rng();
        let key = SecretKey::new(&mut rng);
        let mut sealed = key.encrypt(b"hands off").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(key.decrypt(&sealed).is_none());
    }

    #[test]
    fn secretkey_short_ciphertext_fails() {
        let mut rng = crate::util::test::rng();
        let key = SecretKey::new(&mut rng);
        assert!(key.decrypt(&[0u8; 10]).is_none());
    }

    #[test]
    fn secretkey_factory_parse_same_material() {
        let mut rng = crate::util::test::rng();
        let factory = SecretKeyFactory;
        let key = factory.generate(&mut rng);
        let record = KeyRecord::from_key(key.as_ref());
        let reparsed = factory.parse(&record).unwrap();
        let sealed = key.encrypt(b"round and round").unwrap();
        assert_eq!(reparsed.decrypt(&sealed).unwrap().as_slice(), b"round and round");
    }
}

//! The default asymmetric encryption provider: Curve25519 +
//! XChaCha20Poly1305, sealed-box style.
//!
//! Every encryption generates an ephemeral keypair. The ephemeral public key
//! rides in front of the ciphertext, and the nonce is derived from the two
//! public keys, so the recipient needs nothing but the ciphertext and their
//! own secret to open it.

use crate::{
    crypto::key::{CryptoKey, DecryptKey, EncryptKey, KeyRecord},
    error::{Error, Result},
};
use crypto_box::aead::Aead;
use rand::rngs::OsRng;
use rand_core::{CryptoRngCore, RngCore};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Algorithm tag for Curve25519XChaCha20Poly1305 keys.
pub const CURVE25519XCHACHA20POLY1305: &str = "curve25519-xchacha20poly1305";

/// Derive the sealed-box nonce from the ephemeral and recipient public keys.
/// Both sides can compute this independently, so it never rides the wire.
fn sealed_nonce(ephemeral_public: &[u8; 32], recipient_public: &[u8; 32]) -> crypto_box::Nonce {
    let mut hasher = blake3::Hasher::new();
    hasher.update(ephemeral_public);
    hasher.update(recipient_public);
    let digest = hasher.finalize();
    let mut nonce = [0u8; 24];
    nonce.copy_from_slice(&digest.as_bytes()[0..24]);
    crypto_box::Nonce::from(nonce)
}

/// The public (encrypting) half of a Curve25519 encryption keypair.
#[derive(Debug, Clone, PartialEq)]
pub struct EncryptionPublicKey {
    public: [u8; 32],
}

impl EncryptionPublicKey {
    /// Build an encrypting key from its raw 32 bytes.
    pub fn from_bytes(public: [u8; 32]) -> Self {
        Self { public }
    }

    /// Build an encrypting key from a wire record. `None` on wrong length.
    pub fn from_record(record: &KeyRecord) -> Option<Self> {
        let bytes: [u8; 32] = record.data().as_slice().try_into().ok()?;
        Some(Self::from_bytes(bytes))
    }
}

impl CryptoKey for EncryptionPublicKey {
    fn algorithm(&self) -> &str {
        CURVE25519XCHACHA20POLY1305
    }

    fn data(&self) -> &[u8] {
        &self.public
    }
}

impl EncryptKey for EncryptionPublicKey {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let ephemeral_secret = crypto_box::SecretKey::generate(&mut OsRng);
        let ephemeral_public = ephemeral_secret.public_key();
        let recipient = crypto_box::PublicKey::from(self.public);
        let cardboard_box = crypto_box::ChaChaBox::new(&recipient, &ephemeral_secret);
        let nonce = sealed_nonce(ephemeral_public.as_bytes(), &self.public);
        let enc = cardboard_box
            .encrypt(&nonce, plaintext)
            .map_err(|_| Error::CryptoSealFailed)?;
        let mut out = Vec::with_capacity(32 + enc.len());
        out.extend_from_slice(ephemeral_public.as_bytes());
        out.extend_from_slice(&enc);
        Ok(out)
    }
}

/// The private (decrypting) half of a Curve25519 encryption keypair.
#[derive(Clone)]
pub struct EncryptionPrivateKey {
    secret: Zeroizing<[u8; 32]>,
    public: [u8; 32],
}

impl EncryptionPrivateKey {
    /// Generate a new encryption keypair, returning the private half.
    pub fn new(rng: &mut dyn CryptoRngCore) -> Self {
        let mut randbuf = [0u8; 32];
        rng.fill_bytes(&mut randbuf);
        Self::from_bytes(randbuf)
    }

    /// Build a decrypting key from 32 secret bytes.
    pub fn from_bytes(secret: [u8; 32]) -> Self {
        let boxed = crypto_box::SecretKey::from(secret);
        let public = *boxed.public_key().as_bytes();
        Self {
            secret: Zeroizing::new(secret),
            public,
        }
    }

    /// The encrypting key paired with this decrypting key.
    pub fn encrypt_key(&self) -> EncryptionPublicKey {
        EncryptionPublicKey { public: self.public }
    }
}

impl std::fmt::Debug for EncryptionPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionPrivateKey")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

impl CryptoKey for EncryptionPrivateKey {
    fn algorithm(&self) -> &str {
        CURVE25519XCHACHA20POLY1305
    }

    fn data(&self) -> &[u8] {
        self.secret.as_ref()
    }
}

impl DecryptKey for EncryptionPrivateKey {
    fn decrypt(&self, ciphertext: &[u8]) -> Option<Vec<u8>> {
        if ciphertext.len() < 32 {
            return None;
        }
        let ephemeral_bytes: [u8; 32] = ciphertext[0..32].try_into().ok()?;
        let body = &ciphertext[32..];
        let secret = crypto_box::SecretKey::from(*self.secret);
        let ephemeral_public = crypto_box::PublicKey::from(ephemeral_bytes);
        let cardboard_box = crypto_box::ChaChaBox::new(&ephemeral_public, &secret);
        let nonce = sealed_nonce(&ephemeral_bytes, &self.public);
        cardboard_box.decrypt(&nonce, body).ok()
    }
}

/// Convenience: an `Arc`ed keypair split for callers that want both halves.
pub fn new_encryption_keypair(
    rng: &mut dyn CryptoRngCore,
) -> (Arc<EncryptionPrivateKey>, Arc<EncryptionPublicKey>) {
    let private = EncryptionPrivateKey::new(rng);
    let public = private.encrypt_key();
    (Arc::new(private), Arc::new(public))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[test]
    fn encryption_seal_open() {
        let mut rng = crate::util::test::rng();
        let (private, public) = new_encryption_keypair(&mut rng);
        let sealed = public.encrypt(b"meet me at the usual place").unwrap();
        let opened = private.decrypt(&sealed).unwrap();
        assert_eq!(opened.as_slice(), b"meet me at the usual place");
    }

    #[test]
    fn encryption_wrong_recipient_fails() {
        let mut rng = crate::util::test::rng();
        let (_, public) = new_encryption_keypair(&mut rng);
        let (other_private, _) = new_encryption_keypair(&mut rng);
        let sealed = public.encrypt(b"not for you").unwrap();
        assert!(other_private.decrypt(&sealed).is_none());
    }

    #[test]
    fn encryption_tampered_ciphertext_fails() {
        let mut rng = crate::util::test::rng();
        let (private, public) = new_encryption_keypair(&mut rng);
        let mut sealed = public.encrypt(b"fragile, do not bend").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x80;
        assert!(private.decrypt(&sealed).is_none());
    }

    #[test]
    fn encryption_short_ciphertext_fails() {
        let mut rng = crate::util::test::rng();
        let (private, _) = new_encryption_keypair(&mut rng);
        assert!(private.decrypt(&[1u8; 16]).is_none());
    }

    #[test]
    fn encryption_public_derived_deterministically() {
        let secret = [7u8; 32];
        let key1 = EncryptionPrivateKey::from_bytes(secret);
        let key2 = EncryptionPrivateKey::from_bytes(secret);
        assert_eq!(key1.encrypt_key(), key2.encrypt_key());
    }
}

//! The default signing provider: Ed25519.

use crate::crypto::key::{
    CryptoKey, KeyRecord, PrivateKeyFactory, PublicKeyFactory, SignKey, VerifyKey,
};
use rand_core::{CryptoRngCore, RngCore};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Algorithm tag for Ed25519 keys.
pub const ED25519: &str = "ed25519";

/// An Ed25519 verifying key.
#[derive(Debug, Clone, PartialEq)]
pub struct Ed25519PublicKey {
    public: [u8; 32],
}

impl Ed25519PublicKey {
    /// Build a verifying key from its raw 32 bytes. Returns `None` if the
    /// bytes don't decode to a valid curve point.
    pub fn from_bytes(public: [u8; 32]) -> Option<Self> {
        ed25519_consensus::VerificationKey::try_from(public).ok()?;
        Some(Self { public })
    }
}

impl CryptoKey for Ed25519PublicKey {
    fn algorithm(&self) -> &str {
        ED25519
    }

    fn data(&self) -> &[u8] {
        &self.public
    }
}

impl VerifyKey for Ed25519PublicKey {
    fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let verify_key = match ed25519_consensus::VerificationKey::try_from(self.public) {
            Ok(verify_key) => verify_key,
            Err(_) => return false,
        };
        let sig_arr: [u8; 64] = match signature.try_into() {
            Ok(arr) => arr,
            Err(_) => return false,
        };
        let sig = ed25519_consensus::Signature::from(sig_arr);
        verify_key.verify(&sig, data).is_ok()
    }
}

/// An Ed25519 signing key. The secret bytes are zeroized on drop and never
/// show up in debug output.
#[derive(Clone)]
pub struct Ed25519PrivateKey {
    secret: Zeroizing<[u8; 32]>,
    public: [u8; 32],
}

impl Ed25519PrivateKey {
    /// Generate a new signing key.
    pub fn new(rng: &mut dyn CryptoRngCore) -> Self {
        let mut randbuf = [0u8; 32];
        rng.fill_bytes(&mut randbuf);
        Self::from_bytes(randbuf)
    }

    /// Build a signing key from 32 secret bytes. Any 32 bytes make a valid
    /// Ed25519 signing key, so this cannot fail.
    pub fn from_bytes(secret: [u8; 32]) -> Self {
        let signing_key = ed25519_consensus::SigningKey::from(secret);
        let public = signing_key.verification_key().to_bytes();
        Self {
            secret: Zeroizing::new(secret),
            public,
        }
    }
}

impl std::fmt::Debug for Ed25519PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // secret bytes stay out of logs, always
        f.debug_struct("Ed25519PrivateKey")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

impl CryptoKey for Ed25519PrivateKey {
    fn algorithm(&self) -> &str {
        ED25519
    }

    fn data(&self) -> &[u8] {
        self.secret.as_ref()
    }
}

impl SignKey for Ed25519PrivateKey {
    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let signing_key = ed25519_consensus::SigningKey::from(*self.secret);
        signing_key.sign(data).to_bytes().to_vec()
    }

    fn verify_key(&self) -> Arc<dyn VerifyKey> {
        Arc::new(Ed25519PublicKey { public: self.public })
    }
}

/// Factory for Ed25519 keys, registered under [`ED25519`] in both the public
/// and private key registries.
#[derive(Debug, Default)]
pub struct Ed25519KeyFactory;

impl PublicKeyFactory for Ed25519KeyFactory {
    fn parse(&self, record: &KeyRecord) -> Option<Arc<dyn VerifyKey>> {
        let bytes: [u8; 32] = record.data().as_slice().try_into().ok()?;
        let key = Ed25519PublicKey::from_bytes(bytes)?;
        Some(Arc::new(key))
    }
}

impl PrivateKeyFactory for Ed25519KeyFactory {
    fn generate(&self, rng: &mut dyn CryptoRngCore) -> Arc<dyn SignKey> {
        Arc::new(Ed25519PrivateKey::new(rng))
    }

    fn parse(&self, record: &KeyRecord) -> Option<Arc<dyn SignKey>> {
        let bytes: [u8; 32] = record.data().as_slice().try_into().ok()?;
        Some(Arc::new(Ed25519PrivateKey::from_bytes(bytes)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[test]
    fn ed25519_sign_verify() {
        let mut rng = crate::util::test::rng();
        let our_keypair = Ed25519PrivateKey::new(&mut rng);
        let public = our_keypair.verify_key();

        let msg_real = String::from("station eleven broadcasting on all frequencies, please respond");
        let msg_fake = String::from("station eleven broadcasting on SOME frequencies, please respond");
        let sig = our_keypair.sign(msg_real.as_bytes());
        assert!(public.verify(msg_real.as_bytes(), &sig));
        assert!(!public.verify(msg_fake.as_bytes(), &sig));
    }

    #[test]
    fn ed25519_deterministic_from_seed() {
        let seed = [
            233, 229, 76, 13, 231, 38, 253, 27, 53, 2, 235, 174, 151, 186, 192, 33, 16, 2, 57, 32,
            170, 23, 13, 47, 44, 234, 231, 35, 38, 107, 93, 198,
        ];
        let key1 = Ed25519PrivateKey::from_bytes(seed);
        let key2 = Ed25519PrivateKey::from_bytes(seed);
        assert_eq!(key1.verify_key().data(), key2.verify_key().data());
        let sig1 = key1.sign(b"probe");
        let sig2 = key2.sign(b"probe");
        // ed25519 signatures are deterministic, no k-value roulette
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn ed25519_tampered_signature_fails() {
        let mut rng = crate::util::test::rng();
        let keypair = Ed25519PrivateKey::new(&mut rng);
        let mut sig = keypair.sign(b"a perfectly ordinary message");
        sig[4] ^= 0x20;
        assert!(!keypair.verify_key().verify(b"a perfectly ordinary message", &sig));
    }

    #[test]
    fn ed25519_factory_parse_roundtrip() {
        let mut rng = crate::util::test::rng();
        let factory = Ed25519KeyFactory;
        let keypair = PrivateKeyFactory::generate(&factory, &mut rng);
        let public = keypair.verify_key();

        let record = KeyRecord::from_key(public.as_ref());
        let parsed = PublicKeyFactory::parse(&factory, &record).unwrap();
        assert_eq!(parsed.data(), public.data());

        let private_record = KeyRecord::from_key(keypair.as_ref());
        let reparsed = PrivateKeyFactory::parse(&factory, &private_record).unwrap();
        let sig = reparsed.sign(b"same key, same ink");
        assert!(public.verify(b"same key, same ink", &sig));
    }

    #[test]
    fn ed25519_factory_rejects_bad_length() {
        let factory = Ed25519KeyFactory;
        let record = KeyRecord::new(ED25519, vec![0; 31]);
        assert!(PublicKeyFactory::parse(&factory, &record).is_none());
        assert!(PrivateKeyFactory::parse(&factory, &record).is_none());
    }

    #[test]
    fn ed25519_verify_wrong_length_signature() {
        let mut rng = crate::util::test::rng();
        let keypair = Ed25519PrivateKey::new(&mut rng);
        assert!(!keypair.verify_key().verify(b"msg", &[0u8; 63]));
    }
}

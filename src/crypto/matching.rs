//! The key-matching protocol: prove two key objects belong together without
//! ever comparing private material directly.
//!
//! Asymmetric pairs are checked by signing a probe message with the private
//! key and verifying it with the candidate public key. Symmetric keys are
//! checked by encrypting the probe with one and decrypting with the other.
//! The probe is a fixed, public constant (a test vector, not a secret) so
//! that independent implementations arrive at the same bytes.

use crate::crypto::key::{CryptoKey, DecryptKey, EncryptKey, SignKey, SymmetricKey, VerifyKey};
use subtle::ConstantTimeEq;

/// The fixed probe message every implementation signs/encrypts when checking
/// whether two keys are a pair.
pub const PROBE_MESSAGE: &[u8] = b"the quick brown fox jumps over the lazy dog";

/// Check whether a signing key and a verifying key form a pair.
///
/// If the private key's derived public key is structurally identical to the
/// candidate we're done; otherwise fall back to the sign/verify probe, which
/// also covers verify-key objects that are equivalent without being
/// byte-identical.
pub fn keys_match(sign_key: &dyn SignKey, verify_key: &dyn VerifyKey) -> bool {
    let derived = sign_key.verify_key();
    if derived.algorithm().eq_ignore_ascii_case(verify_key.algorithm())
        && bool::from(derived.data().ct_eq(verify_key.data()))
    {
        return true;
    }
    verify_key.verify(PROBE_MESSAGE, &sign_key.sign(PROBE_MESSAGE))
}

/// Check whether two symmetric keys hold the same material, by round-tripping
/// the probe instead of comparing bytes.
pub fn symmetric_keys_match(key_a: &dyn SymmetricKey, key_b: &dyn SymmetricKey) -> bool {
    let sealed = match key_a.encrypt(PROBE_MESSAGE) {
        Ok(sealed) => sealed,
        Err(_) => return false,
    };
    match key_b.decrypt(&sealed) {
        Some(opened) => bool::from(opened.as_slice().ct_eq(PROBE_MESSAGE)),
        None => false,
    }
}

/// Check whether a decrypting key and an encrypting key form a pair.
pub fn encryption_keys_match(decrypt_key: &dyn DecryptKey, encrypt_key: &dyn EncryptKey) -> bool {
    let sealed = match encrypt_key.encrypt(PROBE_MESSAGE) {
        Ok(sealed) => sealed,
        Err(_) => return false,
    };
    match decrypt_key.decrypt(&sealed) {
        Some(opened) => bool::from(opened.as_slice().ct_eq(PROBE_MESSAGE)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{
        crypto_key::new_encryption_keypair,
        secret_key::SecretKey,
        sign_key::Ed25519PrivateKey,
    };
    use crate::crypto::key::CryptoKey;

    #[test]
    fn asymmetric_pair_matches() {
        let mut rng = crate::util::test::rng();
        let private = Ed25519PrivateKey::new(&mut rng);
        let public = private.verify_key();
        assert!(keys_match(&private, public.as_ref()));
    }

    #[test]
    fn asymmetric_foreign_key_rejected() {
        let mut rng = crate::util::test::rng();
        let private = Ed25519PrivateKey::new(&mut rng);
        let stranger = Ed25519PrivateKey::new(&mut rng).verify_key();
        assert!(!keys_match(&private, stranger.as_ref()));
    }

    #[test]
    fn symmetric_same_material_matches() {
        let key_a = SecretKey::from_bytes([9u8; 32]);
        let key_b = SecretKey::from_bytes([9u8; 32]);
        assert_eq!(key_a.data(), key_b.data());
        assert!(symmetric_keys_match(&key_a, &key_b));
    }

    #[test]
    fn symmetric_different_material_rejected() {
        let key_a = SecretKey::from_bytes([9u8; 32]);
        let key_b = SecretKey::from_bytes([10u8; 32]);
        assert!(!symmetric_keys_match(&key_a, &key_b));
    }

    #[test]
    fn encryption_pair_matches() {
        let mut rng = crate::util::test::rng();
        let (private, public) = new_encryption_keypair(&mut rng);
        assert!(encryption_keys_match(private.as_ref(), public.as_ref()));
    }

    #[test]
    fn encryption_foreign_key_rejected() {
        let mut rng = crate::util::test::rng();
        let (private, _) = new_encryption_keypair(&mut rng);
        let (_, foreign_public) = new_encryption_keypair(&mut rng);
        assert!(!encryption_keys_match(private.as_ref(), foreign_public.as_ref()));
    }
}

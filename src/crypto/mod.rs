//! The crypto layer wraps a set of algorithms for encryption and decryption
//! (both symmetric and asymmetric) as well as cryptographic signing of data.
//!
//! The idea here is that specific algorithms hide behind descriptive
//! capability traits ([`SignKey`][key::SignKey], [`VerifyKey`][key::VerifyKey]
//! and friends), and the rest of the crate only ever sees those traits. New
//! algorithms plug in by registering a factory under their tag; nothing else
//! changes.

use crate::registry::Registries;
use rand::{rngs::OsRng, RngCore, SeedableRng};
use std::sync::Arc;

pub mod key;
pub mod matching;

mod crypto_key;
mod secret_key;
pub(crate) mod sign_key;

pub use crypto_key::*;
pub use secret_key::*;
pub use sign_key::*;

/// A convenience function that returns a ChaCha20 CSRNG seeded with OS random
/// bytes. Use this if you want a nice, strong random number generator, you
/// don't want to wire one up yourself, and your platform provides good
/// entropy.
pub fn rng_chacha20() -> rand_chacha::ChaCha20Rng {
    let mut seed_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut seed_bytes);
    rand_chacha::ChaCha20Rng::from_seed(seed_bytes)
}

/// Register the built-in key providers: Ed25519 for signing/verifying and
/// XChaCha20Poly1305 for symmetric encryption.
pub fn register_default_providers(registries: &Registries) {
    let ed25519 = Arc::new(Ed25519KeyFactory);
    registries
        .public_keys()
        .register(ED25519, ed25519.clone() as Arc<dyn key::PublicKeyFactory>);
    registries
        .private_keys()
        .register(ED25519, ed25519 as Arc<dyn key::PrivateKeyFactory>);
    registries.symmetric_keys().register(
        XCHACHA20POLY1305,
        Arc::new(SecretKeyFactory) as Arc<dyn key::SymmetricKeyFactory>,
    );
}

use rand::SeedableRng;

/// Create a deterministic rng for tests. Every test that needs randomness
/// pulls from here, so failures reproduce instead of haunting us.
pub(crate) fn rng() -> rand_chacha::ChaCha20Rng {
    rand_chacha::ChaCha20Rng::from_seed(*b"sigil-core deterministic test rn")
}

/// A seeded rng that produces a different stream than [`rng`], for tests
/// that need two independent sets of key material.
pub(crate) fn rng_alt() -> rand_chacha::ChaCha20Rng {
    rand_chacha::ChaCha20Rng::from_seed(*b"sigil-core second stream test rn")
}

//! The main error enum for the project lives here, and documents the various
//! conditions that can arise while interacting with the system.
//!
//! Note that most "failures" in this crate are not errors at all: a string
//! that doesn't parse into an ID comes back as `None`, and a signature that
//! doesn't verify comes back as `false`. The variants here are reserved for
//! conditions that genuinely need to interrupt the caller, chief among them
//! missing provider wiring.

use thiserror::Error;

/// This is our error enum. It contains an entry for any part of the system in
/// which an expectation is not met or a problem occurs.
#[derive(Error, Debug)]
pub enum Error {
    /// An error while decoding base64 data.
    #[error("base64 decoding error")]
    Base64(#[from] base64::DecodeError),

    /// Failed to encrypt a value.
    #[error("failed to seal a value")]
    CryptoSealFailed,

    /// No factory is registered for the given tag, and the registry has no
    /// wildcard entry either. This means the process was wired up wrong, not
    /// that the input was bad, so it surfaces loudly instead of hiding in a
    /// `None`.
    #[error("no {kind} factory registered under {tag:?} (and no wildcard)")]
    FactoryNotRegistered {
        /// Which artifact kind the registry serves (eg "meta", "document").
        kind: &'static str,
        /// The tag we looked for.
        tag: String,
    },

    /// An error while engaging in JSON serialization or deserialization.
    #[error("json serialization error")]
    Json(#[from] serde_json::Error),

    /// We need a signature on a value, but it's missing.
    #[error("signature missing on a value")]
    SignatureMissing,
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        // serde_json's error type isn't comparable, so we compare the debug
        // renderings instead. Good enough for test assertions.
        format!("{:?}", self) == format!("{:?}", other)
    }
}

/// Wraps `std::result::Result` around our `Error` enum
pub type Result<T> = std::result::Result<T, Error>;

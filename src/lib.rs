//! Welcome to the sigil core, the identity layer of a decentralized
//! messaging protocol.
//!
//! In a network with no central account server, an identity has to certify
//! itself. The way that works here: a participant generates a keypair and
//! binds it into a [`Meta`][identity::meta::Meta], a small, immutable
//! record carrying the public key and, for seed-based versions, a seed
//! string plus a *fingerprint* (the owner's signature over the seed). From a
//! valid meta, an [`Address`][identity::address::Address] and a full
//! [`Id`][identity::id::Id] (`name@address/terminal`) are derived
//! deterministically, so any two parties holding the meta agree on the
//! identity's name and location without ever talking to each other. Mutable
//! profile data (display name, avatar, group membership) rides separately
//! in a signed [`Document`][identity::document::Document] that anyone can
//! check against the meta's key.
//!
//! The goals of this layer are as follows:
//!
//! 1. To bind every identity to a public key in a way any stranger can
//!    verify offline.
//! 1. To keep identity records immutable and freely shareable, with all
//!    mutability pushed into tamper-evident documents.
//! 1. To stay agnostic about cryptography: algorithms plug in through
//!    [registries][registry::Registries], and the core only ever talks to
//!    [capability traits][crypto::key].
//! 1. To make bad input boring: malformed strings come back as `None`,
//!    failed verifications as `false`, and only missing provider wiring is
//!    ever an error.
//!
//! A quick tour:
//!
//! ```rust
//! use sigil_core::{
//!     crypto::{rng_chacha20, Ed25519PrivateKey},
//!     identity::{address::NetworkType, meta::MetaType},
//!     registry::Registries,
//! };
//!
//! let registries = Registries::with_defaults();
//! let mut rng = rng_chacha20();
//! let sk = Ed25519PrivateKey::new(&mut rng);
//!
//! // generate a self-certifying meta for the seed "alice"
//! let meta = registries
//!     .generate_meta(MetaType::Mkm, &sk, Some("alice"))
//!     .unwrap()
//!     .unwrap();
//! assert!(meta.is_valid());
//!
//! // derive alice's ID on the person network; anyone else with the meta
//! // computes the same one
//! let id = registries
//!     .generate_id(&meta, NetworkType::Main, None)
//!     .unwrap()
//!     .unwrap();
//! assert!(registries.match_id(&meta, &id).unwrap());
//! ```

pub mod error;
pub mod util;
pub mod registry;
pub mod crypto;
pub mod identity;

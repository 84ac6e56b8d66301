//! The identity module defines the value types that make up an identity:
//! where it lives ([`Address`][address::Address]), how it's referred to
//! ([`Id`][id::Id]), the self-certifying record binding it to a key
//! ([`Meta`][meta::Meta]), and the signed property bag describing it
//! ([`Document`][document::Document]).
//!
//! Everything here leans on the [crypto](crate::crypto) capability traits
//! for the actual signing and verification, and on the
//! [registry](crate::registry) for resolving algorithm implementations.

pub mod address;
pub mod document;
pub mod id;
pub mod meta;

pub use address::*;
pub use document::*;
pub use id::*;
pub use meta::*;

//! The algorithm registry: a name→factory table with a wildcard fallback,
//! and the process-wide [`Registries`] context that owns one table per
//! artifact kind.
//!
//! Nothing in the core knows how to build a concrete meta, document, address,
//! or key. Algorithm providers register factories here once at process start,
//! and the create/parse/generate operations resolve through these tables. A
//! missing factory is a wiring mistake (a [Configuration
//! error][crate::error::Error::FactoryNotRegistered]), never a data error, so
//! it surfaces as a loud `Err` instead of a quiet `None`.

use crate::{
    crypto::{
        key::{PrivateKeyFactory, PublicKeyFactory, SymmetricKeyFactory},
        register_default_providers,
    },
    error::{Error, Result},
    identity::{
        address::{register_default_schemes, Address, AddressScheme},
        document::{register_document_factories, DocumentFactory},
        id::Id,
        meta::{register_meta_factories, MetaFactory},
    },
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// The tag that matches any lookup that found no exact entry.
pub const WILDCARD: &str = "*";

/// A name→value table for one artifact kind.
///
/// Registration is explicit and happens up-front; `lookup` never constructs
/// anything lazily. Lookups fall back to the [`WILDCARD`] entry when no exact
/// match exists. All access is behind one lock, so concurrent registration
/// and lookup are safe.
pub struct Registry<T: Clone> {
    /// What this registry hands out (eg "meta", "document"). Used in error
    /// reporting so a missing factory names the table it was missing from.
    kind: &'static str,
    table: RwLock<HashMap<String, T>>,
}

impl<T: Clone> Registry<T> {
    /// Create an empty registry for the named artifact kind.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            table: RwLock::new(HashMap::new()),
        }
    }

    /// Register a value under a tag, replacing any previous entry. Tags are
    /// matched case-insensitively, so register and look up in any case you
    /// like.
    pub fn register<S: AsRef<str>>(&self, tag: S, value: T) {
        let tag = tag.as_ref().to_ascii_lowercase();
        debug!(kind = self.kind, tag = %tag, "registry: register");
        self.table.write().insert(tag, value);
    }

    /// Find the entry for a tag: exact match first, then the wildcard entry,
    /// then nothing.
    pub fn lookup(&self, tag: &str) -> Option<T> {
        let tag = tag.to_ascii_lowercase();
        let table = self.table.read();
        table.get(&tag).or_else(|| table.get(WILDCARD)).cloned()
    }

    /// Like [`lookup`][Registry::lookup], but a miss is a hard
    /// [`Error::FactoryNotRegistered`]: the operation that needed this entry
    /// cannot meaningfully continue without it.
    pub fn require(&self, tag: &str) -> Result<T> {
        self.lookup(tag).ok_or_else(|| {
            warn!(kind = self.kind, tag = %tag, "registry: no factory and no wildcard");
            Error::FactoryNotRegistered {
                kind: self.kind,
                tag: tag.into(),
            }
        })
    }

    /// All registered tags, wildcard included, in no particular order.
    pub fn tags(&self) -> Vec<String> {
        self.table.read().keys().cloned().collect()
    }

    /// All registered values in tag order, each paired with its tag. Used by
    /// operations that dispatch by trying every provider (eg sniffing an
    /// address string's encoding).
    pub fn entries(&self) -> Vec<(String, T)> {
        let mut entries: Vec<(String, T)> = self
            .table
            .read()
            .iter()
            .map(|(tag, val)| (tag.clone(), val.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

/// The process-wide registry context: one [`Registry`] per artifact kind,
/// plus the Address/ID memoization caches.
///
/// This is deliberately an explicit, injectable object rather than a set of
/// hidden singletons. Construct one (usually via
/// [`with_defaults`][Registries::with_defaults]), share it by reference, and
/// every create/parse/generate operation in the crate runs against it.
#[derive(getset::Getters)]
#[getset(get = "pub")]
pub struct Registries {
    /// Meta factories, keyed by version tag ("1", "2", ...).
    metas: Registry<Arc<dyn MetaFactory>>,
    /// Document factories, keyed by document type ("visa", "bulletin", ...).
    documents: Registry<Arc<dyn DocumentFactory>>,
    /// Address schemes, keyed by scheme name.
    addresses: Registry<Arc<dyn AddressScheme>>,
    /// Symmetric key factories, keyed by algorithm.
    symmetric_keys: Registry<Arc<dyn SymmetricKeyFactory>>,
    /// Public (verifying) key factories, keyed by algorithm.
    public_keys: Registry<Arc<dyn PublicKeyFactory>>,
    /// Private (signing) key factories, keyed by algorithm.
    private_keys: Registry<Arc<dyn PrivateKeyFactory>>,
    /// Memoization cache for parsed/generated addresses, keyed by the exact
    /// canonical string. Seeded with the broadcast addresses.
    #[getset(skip)]
    pub(crate) address_cache: RwLock<HashMap<String, Address>>,
    /// Memoization cache for parsed/generated IDs, keyed by the full
    /// canonical string. Seeded with the broadcast IDs.
    #[getset(skip)]
    pub(crate) id_cache: RwLock<HashMap<String, Id>>,
}

impl Registries {
    /// Create a bare context with every table empty. Nothing works until
    /// providers are registered; most callers want
    /// [`with_defaults`][Registries::with_defaults].
    pub fn new() -> Self {
        Self {
            metas: Registry::new("meta"),
            documents: Registry::new("document"),
            addresses: Registry::new("address scheme"),
            symmetric_keys: Registry::new("symmetric key"),
            public_keys: Registry::new("public key"),
            private_keys: Registry::new("private key"),
            address_cache: RwLock::new(HashMap::new()),
            id_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Create a context with the built-in providers wired up: both address
    /// schemes, meta factories for every known version, the standard document
    /// factory, and the default key algorithms. Also seeds the broadcast
    /// address/ID cache entries, so "anywhere"/"anyone" and friends resolve
    /// without ever hitting a parser.
    pub fn with_defaults() -> Self {
        let registries = Self::new();
        register_default_providers(&registries);
        register_default_schemes(&registries);
        register_meta_factories(&registries);
        register_document_factories(&registries);
        registries.seed_broadcast_entries();
        registries
    }

    fn seed_broadcast_entries(&self) {
        let mut addresses = self.address_cache.write();
        for addr in [Address::anywhere(), Address::everywhere()] {
            addresses.insert(addr.to_string(), addr);
        }
        drop(addresses);
        let mut ids = self.id_cache.write();
        for id in [Id::anyone(), Id::everyone()] {
            ids.insert(id.to_string(), id);
        }
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_register_lookup() {
        let reg: Registry<u32> = Registry::new("number");
        assert_eq!(reg.lookup("one"), None);
        reg.register("one", 1);
        reg.register("two", 2);
        assert_eq!(reg.lookup("one"), Some(1));
        assert_eq!(reg.lookup("ONE"), Some(1));
        assert_eq!(reg.lookup("three"), None);
        let mut tags = reg.tags();
        tags.sort();
        assert_eq!(tags, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn registry_wildcard_fallback() {
        let reg: Registry<u32> = Registry::new("number");
        reg.register("one", 1);
        assert_eq!(reg.lookup("three"), None);
        reg.register(WILDCARD, 99);
        assert_eq!(reg.lookup("three"), Some(99));
        assert_eq!(reg.lookup("one"), Some(1));
    }

    #[test]
    fn registry_require_is_loud() {
        let reg: Registry<u32> = Registry::new("number");
        let err = reg.require("seven").unwrap_err();
        assert_eq!(
            err,
            crate::error::Error::FactoryNotRegistered {
                kind: "number",
                tag: "seven".into(),
            }
        );
        reg.register("seven", 7);
        assert_eq!(reg.require("seven").unwrap(), 7);
    }

    #[test]
    fn registry_replace_entry() {
        let reg: Registry<u32> = Registry::new("number");
        reg.register("one", 1);
        reg.register("one", 11);
        assert_eq!(reg.lookup("one"), Some(11));
    }

    #[test]
    fn registries_broadcast_seeded() {
        let registries = Registries::with_defaults();
        let anywhere = registries.parse_address("anywhere").unwrap();
        assert_eq!(anywhere, Address::anywhere());
        let everyone = registries.parse_id("everyone@everywhere").unwrap();
        assert_eq!(everyone, Id::everyone());
    }

    #[test]
    fn registries_bare_context_has_nothing() {
        let registries = Registries::new();
        assert!(registries.parse_address("anywhere").is_none());
        assert!(registries.metas().require("1").is_err());
    }
}

//! IDs: the full reference to an identity.
//!
//! An ID is `name@address/terminal`, where the name and terminal are
//! optional. The address is the part that actually identifies anyone; the
//! name is the meta seed it was generated from (when there is one), and the
//! terminal is a login/device qualifier. Two IDs are the same identity when
//! their name and address agree; the terminal never participates in
//! equality, so "alice@.../desktop" and "alice@.../phone" are the same
//! person.

use crate::{
    identity::address::{Address, NetworkType},
    registry::Registries,
};
use std::fmt;

/// A parsed, validated identity reference. Immutable once constructed.
#[derive(Debug, Clone, getset::Getters)]
pub struct Id {
    /// The name segment, when present. For generated IDs this is the meta
    /// seed.
    #[getset(get = "pub")]
    name: Option<String>,
    /// The address segment. Never empty.
    #[getset(get = "pub")]
    address: Address,
    /// The terminal segment, when present.
    #[getset(get = "pub")]
    terminal: Option<String>,
}

impl Id {
    /// Compose an ID from parts. Empty name/terminal strings are normalized
    /// to absent.
    pub fn new(name: Option<String>, address: Address, terminal: Option<String>) -> Self {
        Self {
            name: name.filter(|n| !n.is_empty()),
            address,
            terminal: terminal.filter(|t| !t.is_empty()),
        }
    }

    /// The fixed broadcast ID reaching any person: "anyone@anywhere".
    pub fn anyone() -> Self {
        Self::new(Some("anyone".into()), Address::anywhere(), None)
    }

    /// The fixed broadcast ID reaching any group: "everyone@everywhere".
    pub fn everyone() -> Self {
        Self::new(Some("everyone".into()), Address::everywhere(), None)
    }

    /// The network type of this ID's address.
    pub fn network(&self) -> NetworkType {
        self.address.network()
    }

    /// Is this one of the fixed broadcast IDs?
    pub fn is_broadcast(&self) -> bool {
        self.address.is_broadcast()
    }
}

impl PartialEq for Id {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.address == other.address
    }
}

impl Eq for Id {}

impl std::hash::Hash for Id {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.address.hash(state);
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.name.as_ref() {
            write!(f, "{}@", name)?;
        }
        write!(f, "{}", self.address)?;
        if let Some(terminal) = self.terminal.as_ref() {
            write!(f, "/{}", terminal)?;
        }
        Ok(())
    }
}

impl Registries {
    /// Parse an ID string, memoizing successes by the exact input string.
    /// The address segment must resolve through a registered address scheme
    /// (or the seeded broadcast entries). `None` on malformed input; failed
    /// parses are never cached.
    pub fn parse_id(&self, string: &str) -> Option<Id> {
        let mut cache = self.id_cache.write();
        if let Some(hit) = cache.get(string) {
            return Some(hit.clone());
        }
        let id = self.parse_id_uncached(string)?;
        cache.insert(string.to_string(), id.clone());
        Some(id)
    }

    fn parse_id_uncached(&self, string: &str) -> Option<Id> {
        let (main, terminal) = match string.split_once('/') {
            Some((main, terminal)) => {
                if terminal.is_empty() || terminal.contains('/') {
                    return None;
                }
                (main, Some(terminal))
            }
            None => (string, None),
        };
        let (name, address_str) = match main.split_once('@') {
            Some((name, address_str)) => {
                if name.is_empty() {
                    return None;
                }
                (Some(name), address_str)
            }
            None => (None, main),
        };
        if address_str.is_empty() {
            return None;
        }
        let address = self.parse_address(address_str)?;
        Some(Id::new(
            name.map(|n| n.to_string()),
            address,
            terminal.map(|t| t.to_string()),
        ))
    }
}

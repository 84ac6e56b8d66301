//! Addresses: where an identity lives.
//!
//! An address is an opaque canonical string plus a network-type tag telling
//! you what kind of entity sits behind it (a person, a group, a station...).
//! Address strings are produced by per-algorithm schemes (a Base58Check
//! style encoding with an embedded checksum, and a flat hex form), and each
//! scheme recognizes its own output when parsing, so no separate tag is
//! needed on the wire.

use crate::registry::Registries;
use std::fmt;
use std::sync::Arc;

/// Tag distinguishing the identity classes an address can refer to. The
/// numeric values are part of the wire format (they lead the payload of
/// checksummed addresses) and must never be reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NetworkType {
    /// Bitcoin-compatible main network.
    BtcMain = 0x00,
    /// A person.
    Main = 0x08,
    /// A group of people.
    Group = 0x10,
    /// A large, open group.
    Chatroom = 0x30,
    /// A service provider.
    Provider = 0x76,
    /// A device or other non-human thing.
    Thing = 0x80,
    /// A message relay station.
    Station = 0x88,
    /// An automated participant.
    Bot = 0xC8,
}

impl NetworkType {
    /// The wire byte for this network type.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Map a wire byte back to a network type.
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::BtcMain),
            0x08 => Some(Self::Main),
            0x10 => Some(Self::Group),
            0x30 => Some(Self::Chatroom),
            0x76 => Some(Self::Provider),
            0x80 => Some(Self::Thing),
            0x88 => Some(Self::Station),
            0xC8 => Some(Self::Bot),
            _ => None,
        }
    }

    /// Is this a group-shaped network (multiple members behind one address)?
    pub fn is_group(self) -> bool {
        matches!(self, Self::Group | Self::Chatroom)
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            Self::BtcMain => "btcmain",
            Self::Main => "main",
            Self::Group => "group",
            Self::Chatroom => "chatroom",
            Self::Provider => "provider",
            Self::Thing => "thing",
            Self::Station => "station",
            Self::Bot => "bot",
        };
        write!(f, "{}", word)
    }
}

/// The canonical string name of the person-network broadcast address.
const ANYWHERE: &str = "anywhere";
/// The canonical string name of the group-network broadcast address.
const EVERYWHERE: &str = "everywhere";

/// A validated address: the canonical string plus its network type.
///
/// Two addresses are the same iff their canonical strings are the same; the
/// network tag is derived information and never participates in equality.
/// Immutable once constructed.
#[derive(Debug, Clone, getset::Getters, getset::CopyGetters)]
pub struct Address {
    /// The canonical string form.
    #[getset(get = "pub")]
    string: String,
    /// What kind of entity this address refers to.
    #[getset(get_copy = "pub")]
    network: NetworkType,
}

impl Address {
    /// Construct an address from an already-validated canonical string.
    /// Normally only address schemes call this; everyone else goes through
    /// parsing or generation.
    pub fn new<S: Into<String>>(string: S, network: NetworkType) -> Self {
        Self {
            string: string.into(),
            network,
        }
    }

    /// The fixed broadcast address reaching any person: "anywhere".
    pub fn anywhere() -> Self {
        Self::new(ANYWHERE, NetworkType::Main)
    }

    /// The fixed broadcast address reaching any group: "everywhere".
    pub fn everywhere() -> Self {
        Self::new(EVERYWHERE, NetworkType::Group)
    }

    /// Is this one of the fixed broadcast addresses?
    pub fn is_broadcast(&self) -> bool {
        self.string == ANYWHERE || self.string == EVERYWHERE
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.string == other.string
    }
}

impl Eq for Address {}

impl std::hash::Hash for Address {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.string.hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.string)
    }
}

/// One address encoding family. `parse` must recognize this scheme's own
/// output and decline (with `None`) anything else; `derive` turns key
/// material into an address deterministically, so two parties computing
/// independently agree.
pub trait AddressScheme: Send + Sync {
    /// Parse and validate an address string belonging to this scheme.
    fn parse(&self, string: &str) -> Option<Address>;

    /// Derive an address from raw key material for the given network type.
    /// `None` when this scheme cannot serve the requested network.
    fn derive(&self, material: &[u8], network: NetworkType) -> Option<Address>;
}

/// Scheme tag for checksummed base58 addresses.
pub const SCHEME_BASE58_CHECK: &str = "base58check";
/// Scheme tag for flat hex addresses.
pub const SCHEME_HEX: &str = "hex";

/// Base58Check-style addresses: `base58(network || blake3(material)[..20] ||
/// checksum)` where the checksum is the first four bytes of the blake3 hash
/// of the 21-byte payload.
#[derive(Debug, Default)]
pub struct Base58CheckScheme;

impl AddressScheme for Base58CheckScheme {
    fn parse(&self, string: &str) -> Option<Address> {
        let bytes = bs58::decode(string).into_vec().ok()?;
        if bytes.len() != 25 {
            return None;
        }
        let (payload, check) = bytes.split_at(21);
        let expected = blake3::hash(payload);
        if &expected.as_bytes()[0..4] != check {
            return None;
        }
        let network = NetworkType::from_u8(payload[0])?;
        Some(Address::new(string, network))
    }

    fn derive(&self, material: &[u8], network: NetworkType) -> Option<Address> {
        let digest = blake3::hash(material);
        let mut payload = Vec::with_capacity(25);
        payload.push(network.as_u8());
        payload.extend_from_slice(&digest.as_bytes()[0..20]);
        let check = blake3::hash(&payload);
        payload.extend_from_slice(&check.as_bytes()[0..4]);
        Some(Address::new(bs58::encode(payload).into_string(), network))
    }
}

/// Flat hex addresses: `0x` followed by the last twenty bytes of the blake3
/// hash of the key material. No checksum, person network only.
#[derive(Debug, Default)]
pub struct HexScheme;

impl AddressScheme for HexScheme {
    fn parse(&self, string: &str) -> Option<Address> {
        let body = string.strip_prefix("0x")?;
        if body.len() != 40 {
            return None;
        }
        let bytes = hex::decode(body).ok()?;
        debug_assert_eq!(bytes.len(), 20);
        Some(Address::new(format!("0x{}", body.to_ascii_lowercase()), NetworkType::Main))
    }

    fn derive(&self, material: &[u8], network: NetworkType) -> Option<Address> {
        if network != NetworkType::Main {
            return None;
        }
        let digest = blake3::hash(material);
        let body = hex::encode(&digest.as_bytes()[12..32]);
        Some(Address::new(format!("0x{}", body), network))
    }
}

/// Register the built-in address schemes.
pub fn register_default_schemes(registries: &Registries) {
    registries
        .addresses()
        .register(SCHEME_BASE58_CHECK, Arc::new(Base58CheckScheme) as Arc<dyn AddressScheme>);
    registries
        .addresses()
        .register(SCHEME_HEX, Arc::new(HexScheme) as Arc<dyn AddressScheme>);
}

impl Registries {
    /// Parse an address string through whichever registered scheme
    /// recognizes it, memoizing successes by the exact input string. Failed
    /// parses are never cached. `None` on malformed input.
    pub fn parse_address(&self, string: &str) -> Option<Address> {
        let mut cache = self.address_cache.write();
        if let Some(hit) = cache.get(string) {
            return Some(hit.clone());
        }
        for (_tag, scheme) in self.addresses().entries() {
            if let Some(address) = scheme.parse(string) {
                cache.insert(string.to_string(), address.clone());
                return Some(address);
            }
        }
        None
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[test]
    fn network_type_wire_bytes_roundtrip() {
        for network in [
            NetworkType::BtcMain,
            NetworkType::Main,
            NetworkType::Group,
            NetworkType::Chatroom,
            NetworkType::Provider,
            NetworkType::Thing,
            NetworkType::Station,
            NetworkType::Bot,
        ] {
            assert_eq!(NetworkType::from_u8(network.as_u8()), Some(network));
        }
        assert_eq!(NetworkType::from_u8(0x42), None);
    }

    #[test]
    fn base58check_derive_parse_roundtrip() {
        let scheme = Base58CheckScheme;
        let addr = scheme.derive(b"some fingerprint bytes", NetworkType::Group).unwrap();
        assert_eq!(addr.network(), NetworkType::Group);
        let parsed = scheme.parse(addr.string()).unwrap();
        assert_eq!(parsed, addr);
        assert_eq!(parsed.network(), NetworkType::Group);
    }

    #[test]
    fn base58check_deterministic() {
        let scheme = Base58CheckScheme;
        let addr1 = scheme.derive(b"stable material", NetworkType::Main).unwrap();
        let addr2 = scheme.derive(b"stable material", NetworkType::Main).unwrap();
        assert_eq!(addr1, addr2);
        let addr3 = scheme.derive(b"other material", NetworkType::Main).unwrap();
        assert_ne!(addr1, addr3);
    }

    #[test]
    fn base58check_network_changes_address() {
        let scheme = Base58CheckScheme;
        let person = scheme.derive(b"material", NetworkType::Main).unwrap();
        let group = scheme.derive(b"material", NetworkType::Group).unwrap();
        assert_ne!(person, group);
    }

    #[test]
    fn base58check_corruption_rejected() {
        let scheme = Base58CheckScheme;
        let addr = scheme.derive(b"material", NetworkType::Main).unwrap();
        let mut corrupted: String = addr.string().clone();
        // swap the middle character for a different base58 character
        let mid = corrupted.len() / 2;
        let original = corrupted.as_bytes()[mid];
        let replacement = if original == b'2' { b'3' } else { b'2' };
        // SAFETY: both bytes are ascii
        unsafe {
            corrupted.as_bytes_mut()[mid] = replacement;
        }
        assert!(scheme.parse(&corrupted).is_none());
    }

    #[test]
    fn hex_derive_parse_roundtrip() {
        let scheme = HexScheme;
        let addr = scheme.derive(b"raw public key bytes", NetworkType::Main).unwrap();
        assert!(addr.string().starts_with("0x"));
        assert_eq!(addr.string().len(), 42);
        let parsed = scheme.parse(addr.string()).unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn hex_rejects_non_person_networks() {
        let scheme = HexScheme;
        assert!(scheme.derive(b"material", NetworkType::Group).is_none());
        assert!(scheme.derive(b"material", NetworkType::Station).is_none());
    }

    #[test]
    fn hex_parse_rejects_garbage() {
        let scheme = HexScheme;
        assert!(scheme.parse("0xnothexatall").is_none());
        assert!(scheme.parse("0x1234").is_none());
        assert!(scheme.parse("plainwords").is_none());
    }

    #[test]
    fn schemes_decline_each_others_output() {
        let base58 = Base58CheckScheme;
        let hexs = HexScheme;
        let b58_addr = base58.derive(b"material", NetworkType::Main).unwrap();
        let hex_addr = hexs.derive(b"material", NetworkType::Main).unwrap();
        assert!(hexs.parse(b58_addr.string()).is_none());
        assert!(base58.parse(hex_addr.string()).is_none());
    }

    #[test]
    fn broadcast_addresses_fixed() {
        assert_eq!(Address::anywhere().string(), "anywhere");
        assert_eq!(Address::everywhere().string(), "everywhere");
        assert!(Address::anywhere().is_broadcast());
        assert!(Address::everywhere().is_broadcast());
        assert_eq!(Address::anywhere().network(), NetworkType::Main);
        assert_eq!(Address::everywhere().network(), NetworkType::Group);
    }

    #[test]
    fn address_equality_is_by_string() {
        let a = Address::new("samestring", NetworkType::Main);
        let b = Address::new("samestring", NetworkType::Group);
        assert_eq!(a, b);
    }

    #[test]
    fn registries_parse_address_memoizes() {
        let registries = Registries::with_defaults();
        let scheme = Base58CheckScheme;
        let derived = scheme.derive(b"cache me", NetworkType::Main).unwrap();
        let first = registries.parse_address(derived.string()).unwrap();
        let second = registries.parse_address(derived.string()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, derived);
        // failures are not cached, and stay failures
        assert!(registries.parse_address("!!definitely not an address!!").is_none());
        assert!(registries.parse_address("!!definitely not an address!!").is_none());
    }
}

//! Metas: the immutable, self-certifying root of an identity.
//!
//! A meta binds a public key to the identity that owns it. Seed-based
//! versions additionally carry a seed string (which becomes the ID's name)
//! and a fingerprint, the owner's signature over the seed, so anyone can
//! check the seed/key pairing without asking a third party. From a valid
//! meta, addresses and IDs are derived deterministically: two strangers
//! holding the same meta will always compute the same address.
//!
//! A meta never changes after construction. Its validity is computed exactly
//! once, when it is built, and carried as a plain field from then on.

use crate::{
    crypto::key::{CryptoKey, KeyRecord, SignKey, VerifyKey},
    error::Result,
    identity::{
        address::{Address, NetworkType, SCHEME_BASE58_CHECK, SCHEME_HEX},
        id::Id,
    },
    registry::{Registries, WILDCARD},
};
use serde_derive::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::trace;

/// The meta versions this crate knows about. Bit 0 of the wire byte marks a
/// seed-based scheme: those versions carry a seed and fingerprint, and their
/// addresses are derived from the fingerprint rather than the raw key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MetaType {
    /// The default seed-based version.
    Mkm = 0x01,
    /// Bitcoin-style: checksummed address derived straight from the key.
    Btc = 0x02,
    /// Bitcoin-style address plus a seed/fingerprint binding.
    ExBtc = 0x03,
    /// Ethereum-style: flat hex address derived straight from the key.
    Eth = 0x04,
    /// Ethereum-style address plus a seed/fingerprint binding.
    ExEth = 0x05,
}

impl MetaType {
    /// Every version this crate ships a factory for.
    pub const ALL: [MetaType; 5] = [
        MetaType::Mkm,
        MetaType::Btc,
        MetaType::ExBtc,
        MetaType::Eth,
        MetaType::ExEth,
    ];

    /// The wire byte for this version.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Map a wire byte back to a version.
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Mkm),
            0x02 => Some(Self::Btc),
            0x03 => Some(Self::ExBtc),
            0x04 => Some(Self::Eth),
            0x05 => Some(Self::ExEth),
            _ => None,
        }
    }

    /// Does this version carry a seed and fingerprint?
    pub fn has_seed(self) -> bool {
        self.as_u8() & 0x01 != 0
    }

    /// The registry tag this version resolves under.
    pub fn tag(self) -> String {
        self.as_u8().to_string()
    }

    /// Which address scheme this version derives addresses with.
    pub fn address_scheme(self) -> &'static str {
        match self {
            Self::Mkm | Self::Btc | Self::ExBtc => SCHEME_BASE58_CHECK,
            Self::Eth | Self::ExEth => SCHEME_HEX,
        }
    }
}

/// The wire form of a meta. Field names are the cross-implementation
/// contract: `type`, `key`, `seed`, `fingerprint`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::CopyGetters)]
pub struct MetaRecord {
    /// Version byte.
    #[serde(rename = "type")]
    #[getset(get_copy = "pub")]
    version: u8,
    /// The public key record.
    #[getset(get = "pub")]
    key: KeyRecord,
    /// The seed string, for seed-based versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[getset(get = "pub")]
    seed: Option<String>,
    /// The signature over the seed, for seed-based versions.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::util::ser::human_bytes_opt"
    )]
    #[getset(get = "pub")]
    fingerprint: Option<Vec<u8>>,
}

impl MetaRecord {
    /// Create a new meta record.
    pub fn new(version: u8, key: KeyRecord, seed: Option<String>, fingerprint: Option<Vec<u8>>) -> Self {
        Self {
            version,
            key,
            seed,
            fingerprint,
        }
    }
}

/// A validated meta. The `valid` flag is computed when the meta is built and
/// never again; everything else is immutable, so the answer cannot drift
/// between calls.
#[derive(Debug, Clone, getset::Getters, getset::CopyGetters)]
pub struct Meta {
    /// Which version (and therefore which address scheme) this meta uses.
    #[getset(get_copy = "pub")]
    version: MetaType,
    /// The identity's public key.
    #[getset(get = "pub")]
    key: Arc<dyn VerifyKey>,
    /// The seed string, present on seed-based versions.
    #[getset(get = "pub")]
    seed: Option<String>,
    /// The owner's signature over the seed, present on seed-based versions.
    #[getset(get = "pub")]
    fingerprint: Option<Vec<u8>>,
    #[getset(skip)]
    valid: bool,
}

impl Meta {
    /// Assemble a meta and compute its validity, once.
    fn assemble(
        version: MetaType,
        key: Arc<dyn VerifyKey>,
        seed: Option<String>,
        fingerprint: Option<Vec<u8>>,
    ) -> Self {
        let valid = if version.has_seed() {
            match (seed.as_deref(), fingerprint.as_deref()) {
                (Some(seed), Some(fingerprint)) if !seed.is_empty() && !fingerprint.is_empty() => {
                    key.verify(seed.as_bytes(), fingerprint)
                }
                _ => false,
            }
        } else {
            // key presence is the whole requirement; the address comes
            // straight from the key bytes
            true
        };
        Self {
            version,
            key,
            seed,
            fingerprint,
            valid,
        }
    }

    /// Whether this meta's key/seed/fingerprint binding holds. Fixed at
    /// construction.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Check whether `key` is this meta's key. Structural equality wins
    /// immediately; for seed-based versions a different-but-equivalent key
    /// object can still match by verifying the fingerprint. Non-seed
    /// versions have nothing to re-derive from, so only structural equality
    /// can match them.
    pub fn match_key(&self, key: &dyn VerifyKey) -> bool {
        if !self.valid {
            return false;
        }
        if self.key.algorithm().eq_ignore_ascii_case(key.algorithm())
            && bool::from(self.key.data().ct_eq(key.data()))
        {
            return true;
        }
        if self.version.has_seed() {
            if let (Some(seed), Some(fingerprint)) = (self.seed.as_deref(), self.fingerprint.as_deref()) {
                return key.verify(seed.as_bytes(), fingerprint);
            }
        }
        false
    }

    /// The bytes addresses are derived from: the fingerprint for seed-based
    /// versions, the raw key bytes otherwise.
    pub(crate) fn derivation_material(&self) -> Option<&[u8]> {
        if self.version.has_seed() {
            self.fingerprint.as_deref()
        } else {
            Some(self.key.data())
        }
    }

    /// The wire record for this meta.
    pub fn to_record(&self) -> MetaRecord {
        MetaRecord::new(
            self.version.as_u8(),
            KeyRecord::from_key(self.key.as_ref()),
            self.seed.clone(),
            self.fingerprint.clone(),
        )
    }
}

impl PartialEq for Meta {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.key.algorithm() == other.key.algorithm()
            && self.key.data() == other.key.data()
            && self.seed == other.seed
            && self.fingerprint == other.fingerprint
    }
}

/// Builds [`Meta`]s for one version family.
pub trait MetaFactory: Send + Sync {
    /// Build a meta from untrusted wire parts. `Err` when the key's
    /// algorithm has no registered factory; `Ok(None)` when the record is
    /// malformed (unknown version, bad key bytes, missing seed/fingerprint
    /// on a seed-based version). A record whose fingerprint simply fails to
    /// verify still builds, as an *invalid* meta.
    fn create(&self, registries: &Registries, record: &MetaRecord) -> Result<Option<Meta>>;

    /// Generate a fresh meta from a private key, signing the seed to
    /// produce the fingerprint. `None` when a seed-based version is asked
    /// for without a seed.
    fn generate(&self, version: MetaType, sign_key: &dyn SignKey, seed: Option<&str>) -> Option<Meta>;
}

/// The factory for every built-in meta version.
#[derive(Debug, Default)]
pub struct StandardMetaFactory;

impl MetaFactory for StandardMetaFactory {
    fn create(&self, registries: &Registries, record: &MetaRecord) -> Result<Option<Meta>> {
        let version = match MetaType::from_u8(record.version()) {
            Some(version) => version,
            None => return Ok(None),
        };
        let key = match registries.parse_public_key(record.key())? {
            Some(key) => key,
            None => return Ok(None),
        };
        let (seed, fingerprint) = if version.has_seed() {
            let seed = match record.seed().as_deref() {
                Some(seed) if !seed.is_empty() => seed.to_string(),
                _ => return Ok(None),
            };
            let fingerprint = match record.fingerprint().as_deref() {
                Some(fingerprint) if !fingerprint.is_empty() => fingerprint.to_vec(),
                _ => return Ok(None),
            };
            (Some(seed), Some(fingerprint))
        } else {
            (None, None)
        };
        Ok(Some(Meta::assemble(version, key, seed, fingerprint)))
    }

    fn generate(&self, version: MetaType, sign_key: &dyn SignKey, seed: Option<&str>) -> Option<Meta> {
        let key = sign_key.verify_key();
        if version.has_seed() {
            let seed = match seed {
                Some(seed) if !seed.is_empty() => seed.to_string(),
                _ => return None,
            };
            let fingerprint = sign_key.sign(seed.as_bytes());
            Some(Meta::assemble(version, key, Some(seed), Some(fingerprint)))
        } else {
            Some(Meta::assemble(version, key, None, None))
        }
    }
}

/// Register the standard factory under every built-in version tag, plus the
/// wildcard so foreign version bytes at least get a well-defined "malformed"
/// answer instead of a wiring error.
pub fn register_meta_factories(registries: &Registries) {
    let factory = Arc::new(StandardMetaFactory) as Arc<dyn MetaFactory>;
    for version in MetaType::ALL {
        registries.metas().register(version.tag(), factory.clone());
    }
    registries.metas().register(WILDCARD, factory);
}

impl Registries {
    /// Build a meta from a wire record via the factory registered for its
    /// version. `Err` on missing factories, `Ok(None)` on malformed input.
    pub fn create_meta(&self, record: &MetaRecord) -> Result<Option<Meta>> {
        let factory = self.metas().require(&record.version().to_string())?;
        factory.create(self, record)
    }

    /// Generate a fresh meta from a private key via the factory registered
    /// for `version`.
    pub fn generate_meta(
        &self,
        version: MetaType,
        sign_key: &dyn SignKey,
        seed: Option<&str>,
    ) -> Result<Option<Meta>> {
        let factory = self.metas().require(&version.tag())?;
        Ok(factory.generate(version, sign_key, seed))
    }

    /// Derive the address of `meta` on the given network. Deterministic:
    /// the same meta and network always produce the same address. `Ok(None)`
    /// when the meta is invalid or its scheme cannot serve the network.
    pub fn generate_address(&self, meta: &Meta, network: NetworkType) -> Result<Option<Address>> {
        if !meta.is_valid() {
            return Ok(None);
        }
        let scheme = self.addresses().require(meta.version().address_scheme())?;
        let material = match meta.derivation_material() {
            Some(material) => material,
            None => return Ok(None),
        };
        let address = match scheme.derive(material, network) {
            Some(address) => address,
            None => return Ok(None),
        };
        // memoize under the canonical string so a later parse of this
        // address hits the cache
        self.address_cache
            .write()
            .insert(address.string().clone(), address.clone());
        Ok(Some(address))
    }

    /// Derive the full ID of `meta` on the given network: the meta's seed
    /// becomes the name, the derived address the location.
    pub fn generate_id(
        &self,
        meta: &Meta,
        network: NetworkType,
        terminal: Option<&str>,
    ) -> Result<Option<Id>> {
        let address = match self.generate_address(meta, network)? {
            Some(address) => address,
            None => return Ok(None),
        };
        let id = Id::new(meta.seed().clone(), address, terminal.map(|t| t.to_string()));
        self.id_cache.write().insert(id.to_string(), id.clone());
        Ok(Some(id))
    }

    /// Check whether `id` belongs to `meta`: the name must equal the seed
    /// (both absent counts as equal), and the address must re-derive from
    /// the meta on the ID's own network.
    pub fn match_id(&self, meta: &Meta, id: &Id) -> Result<bool> {
        if !meta.is_valid() {
            return Ok(false);
        }
        if id.name().as_deref().unwrap_or("") != meta.seed().as_deref().unwrap_or("") {
            trace!(id = %id, "match_id: name/seed mismatch");
            return Ok(false);
        }
        let derived = match self.generate_address(meta, id.network())? {
            Some(address) => address,
            None => return Ok(false),
        };
        Ok(&derived == id.address())
    }
}

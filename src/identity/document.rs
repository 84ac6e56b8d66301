//! Documents (TAI, tamper-evident additional information): the signed,
//! mutable property bag attached to an ID.
//!
//! A document carries whatever an identity wants the world to know about
//! it (display name, avatar, profile keys, group membership) as a JSON
//! property map, together with a signature over the serialized map. Anyone
//! holding the right public key can check that the properties haven't been
//! touched since signing.
//!
//! A document tracks a three-way verification status. Freshly built or
//! loaded documents are `Unverified`; a successful verification moves them
//! to `Valid`; structural damage (data without a signature or vice versa) or
//! a failed check against the authoritative key moves them to `Invalid`.
//! Mutating any property drops the cached data/signature pair and resets the
//! status, so a stale signature can never masquerade as a fresh one.
//!
//! Documents are single-writer objects: the owning entity serializes
//! mutation and sign/verify calls. Reading properties from a settled
//! document is fine from anywhere.

use crate::{
    crypto::key::{KeyRecord, SignKey, VerifyKey},
    error::{Error, Result},
    identity::id::Id,
    registry::{Registries, WILDCARD},
};
use serde_derive::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::trace;

/// Well-known document type: a user's visa (profile + communication key).
pub const DOCUMENT_VISA: &str = "visa";
/// Well-known document type: a general profile.
pub const DOCUMENT_PROFILE: &str = "profile";
/// Well-known document type: a group bulletin.
pub const DOCUMENT_BULLETIN: &str = "bulletin";

/// Where a document stands with respect to its signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    /// Not yet verified. Not an error: this is the state of every freshly
    /// built or freshly loaded document.
    Unverified,
    /// The current (data, signature) pair verified against some public key.
    Valid,
    /// The document is structurally broken or failed verification against
    /// its authoritative key. Its properties must not be trusted.
    Invalid,
}

impl DocumentStatus {
    /// The signed-integer form other implementations use: 0, 1, -1.
    pub fn as_i8(self) -> i8 {
        match self {
            Self::Unverified => 0,
            Self::Valid => 1,
            Self::Invalid => -1,
        }
    }
}

/// The wire form of a document. Field names are the cross-implementation
/// contract: `ID`, `type`, `data`, `signature`. The `data` field is the
/// exact serialized text that was signed and must survive byte-for-byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
pub struct DocumentRecord {
    /// The ID this document belongs to.
    #[serde(rename = "ID")]
    id: String,
    /// The document type, when the producer tagged it.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    doc_type: Option<String>,
    /// The serialized property map, exactly as signed.
    data: String,
    /// The signature over `data`.
    #[serde(with = "crate::util::ser::human_bytes")]
    signature: Vec<u8>,
}

impl DocumentRecord {
    /// Create a new document record.
    pub fn new(id: String, doc_type: Option<String>, data: String, signature: Vec<u8>) -> Self {
        Self {
            id,
            doc_type,
            data,
            signature,
        }
    }
}

/// A document bound to one ID.
#[derive(Debug, Clone, getset::Getters, getset::CopyGetters)]
pub struct Document {
    /// The ID this document describes.
    #[getset(get = "pub")]
    id: Id,
    /// The document type ("visa", "bulletin", ...).
    #[getset(get = "pub")]
    doc_type: String,
    #[getset(skip)]
    properties: Map<String, Value>,
    /// The cached serialized form of the properties, being the exact bytes
    /// that were signed. Cleared on mutation.
    #[getset(get = "pub")]
    data: Option<String>,
    /// The cached signature over `data`. Cleared on mutation.
    #[getset(get = "pub")]
    signature: Option<Vec<u8>>,
    /// Verification status.
    #[getset(get_copy = "pub")]
    status: DocumentStatus,
}

impl Document {
    /// Create an empty, unsigned document for an ID.
    pub fn new<S: Into<String>>(id: Id, doc_type: S) -> Self {
        Self {
            id,
            doc_type: doc_type.into(),
            properties: Map::new(),
            data: None,
            signature: None,
            status: DocumentStatus::Unverified,
        }
    }

    pub(crate) fn from_parts(
        id: Id,
        doc_type: String,
        properties: Map<String, Value>,
        data: Option<String>,
        signature: Option<Vec<u8>>,
    ) -> Self {
        Self {
            id,
            doc_type,
            properties,
            data,
            signature,
            status: DocumentStatus::Unverified,
        }
    }

    /// The property map. Unless the document is known to be tampered, in
    /// which case you get `None` and should not be reading it anyway.
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        match self.status {
            DocumentStatus::Invalid => None,
            _ => Some(&self.properties),
        }
    }

    /// One property by name. `None` when absent or when the document is
    /// invalid.
    pub fn get_property(&self, name: &str) -> Option<&Value> {
        self.properties()?.get(name)
    }

    /// Set (or, with `None`, delete) a property. Any cached data/signature
    /// pair is dropped and the status returns to `Unverified`.
    pub fn set_property(&mut self, name: &str, value: Option<Value>) {
        match value {
            Some(value) => {
                self.properties.insert(name.to_string(), value);
            }
            None => {
                self.properties.remove(name);
            }
        }
        self.data = None;
        self.signature = None;
        if self.status != DocumentStatus::Unverified {
            trace!(id = %self.id, "document: property changed, status reset");
            self.status = DocumentStatus::Unverified;
        }
    }

    /// Verify this document with a *candidate* public key.
    ///
    /// Already-`Valid` documents return `true` immediately. A failed
    /// signature check leaves the status at `Unverified`: one wrong
    /// candidate doesn't condemn the document, because callers often hold
    /// several plausible keys (a profile key and a meta key, say) and get
    /// to retry. Only structural damage (data without a signature, or the
    /// reverse) moves the document to `Invalid` here. See
    /// [`verify_authoritative`][Document::verify_authoritative] for the
    /// stricter flavor.
    pub fn verify(&mut self, key: &dyn VerifyKey) -> bool {
        self.verify_inner(key, false)
    }

    /// Verify this document with the key that *must* have signed it (the
    /// meta key of the owning identity). Identical to
    /// [`verify`][Document::verify], except a failed signature check is
    /// conclusive: the document transitions to `Invalid` and its properties
    /// become unreadable.
    pub fn verify_authoritative(&mut self, key: &dyn VerifyKey) -> bool {
        self.verify_inner(key, true)
    }

    fn verify_inner(&mut self, key: &dyn VerifyKey, authoritative: bool) -> bool {
        if self.status == DocumentStatus::Valid {
            return true;
        }
        let data = self.data.clone().or_else(|| {
            if self.properties.is_empty() {
                None
            } else {
                serde_json::to_string(&self.properties).ok()
            }
        });
        match (data, self.signature.as_ref()) {
            // a brand-new, never-signed document; nothing to verify and
            // nothing wrong either
            (None, None) => false,
            (Some(data), Some(signature)) => {
                if key.verify(data.as_bytes(), signature) {
                    self.status = DocumentStatus::Valid;
                    true
                } else {
                    if authoritative {
                        trace!(id = %self.id, "document: authoritative verification failed");
                        self.status = DocumentStatus::Invalid;
                    }
                    false
                }
            }
            _ => {
                trace!(id = %self.id, "document: one-sided data/signature pair");
                self.status = DocumentStatus::Invalid;
                false
            }
        }
    }

    /// Sign the current properties.
    ///
    /// An already-`Valid` document hands back its cached signature without
    /// re-signing. Otherwise the properties are serialized, signed, cached,
    /// and the document becomes `Valid`.
    pub fn sign(&mut self, key: &dyn SignKey) -> Result<Vec<u8>> {
        if self.status == DocumentStatus::Valid {
            return self.signature.clone().ok_or(Error::SignatureMissing);
        }
        let data = serde_json::to_string(&self.properties)?;
        let signature = key.sign(data.as_bytes());
        self.data = Some(data);
        self.signature = Some(signature.clone());
        self.status = DocumentStatus::Valid;
        Ok(signature)
    }

    /// The wire record for this document. Requires a signed document; an
    /// unsigned one has nothing worth shipping.
    pub fn to_record(&self) -> Result<DocumentRecord> {
        let data = self.data.clone().ok_or(Error::SignatureMissing)?;
        let signature = self.signature.clone().ok_or(Error::SignatureMissing)?;
        Ok(DocumentRecord::new(
            self.id.to_string(),
            Some(self.doc_type.clone()),
            data,
            signature,
        ))
    }

    /// The display name property.
    pub fn name(&self) -> Option<&str> {
        self.get_property("name")?.as_str()
    }

    /// Set the display name property.
    pub fn set_name(&mut self, name: &str) {
        self.set_property("name", Some(Value::String(name.to_string())));
    }

    /// The communication key a visa document carries in its "key" property,
    /// parsed through the key registry. `Ok(None)` when absent or
    /// malformed.
    pub fn public_key(&self, registries: &Registries) -> Result<Option<Arc<dyn VerifyKey>>> {
        let value = match self.get_property("key") {
            Some(value) => value.clone(),
            None => return Ok(None),
        };
        let record: KeyRecord = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(_) => return Ok(None),
        };
        registries.parse_public_key(&record)
    }

    /// Set the communication key property.
    pub fn set_public_key(&mut self, record: &KeyRecord) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.set_property("key", Some(value));
        Ok(())
    }

    /// The assistant bot IDs a bulletin document lists.
    pub fn assistants(&self, registries: &Registries) -> Option<Vec<Id>> {
        let list = self.get_property("assistants")?.as_array()?;
        let mut out = Vec::with_capacity(list.len());
        for value in list {
            out.push(registries.parse_id(value.as_str()?)?);
        }
        Some(out)
    }

    /// Set the assistant bot IDs.
    pub fn set_assistants(&mut self, assistants: &[Id]) {
        let list = assistants.iter().map(|id| Value::String(id.to_string())).collect();
        self.set_property("assistants", Some(Value::Array(list)));
    }
}

/// Builds [`Document`]s for one document type family.
pub trait DocumentFactory: Send + Sync {
    /// Create an empty document of the given type for an ID.
    fn new_document(&self, id: Id, doc_type: &str) -> Document;

    /// Rebuild a document from its wire record. `None` on malformed input
    /// (unparseable ID, no payload, data that isn't a JSON map).
    fn parse(&self, registries: &Registries, record: &DocumentRecord) -> Option<Document>;
}

/// The factory for every built-in document type.
#[derive(Debug, Default)]
pub struct StandardDocumentFactory;

impl DocumentFactory for StandardDocumentFactory {
    fn new_document(&self, id: Id, doc_type: &str) -> Document {
        Document::new(id, doc_type)
    }

    fn parse(&self, registries: &Registries, record: &DocumentRecord) -> Option<Document> {
        let id = registries.parse_id(record.id())?;
        if record.data().is_empty() && record.signature().is_empty() {
            return None;
        }
        let properties: Map<String, Value> = if record.data().is_empty() {
            Map::new()
        } else {
            serde_json::from_str(record.data()).ok()?
        };
        let doc_type = record
            .doc_type()
            .clone()
            .or_else(|| properties.get("type").and_then(|v| v.as_str()).map(|s| s.to_string()))
            .unwrap_or_default();
        let data = Some(record.data().clone()).filter(|d| !d.is_empty());
        let signature = Some(record.signature().clone()).filter(|s| !s.is_empty());
        Some(Document::from_parts(id, doc_type, properties, data, signature))
    }
}

/// Register the standard factory under the well-known document types, plus
/// the wildcard for types coined by applications.
pub fn register_document_factories(registries: &Registries) {
    let factory = Arc::new(StandardDocumentFactory) as Arc<dyn DocumentFactory>;
    for doc_type in [DOCUMENT_VISA, DOCUMENT_PROFILE, DOCUMENT_BULLETIN] {
        registries.documents().register(doc_type, factory.clone());
    }
    registries.documents().register(WILDCARD, factory);
}

impl Registries {
    /// Create an empty document of the given type via its registered
    /// factory.
    pub fn new_document(&self, doc_type: &str, id: Id) -> Result<Document> {
        let factory = self.documents().require(doc_type)?;
        Ok(factory.new_document(id, doc_type))
    }

    /// Rebuild a document from a wire record via the factory registered for
    /// its type. `Err` on missing factories, `Ok(None)` on malformed input.
    pub fn parse_document(&self, record: &DocumentRecord) -> Result<Option<Document>> {
        let tag = record.doc_type().as_deref().unwrap_or("");
        let factory = self.documents().require(tag)?;
        Ok(factory.parse(self, record))
    }
}

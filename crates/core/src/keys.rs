//! Key material and key caches.
//!
//! Every record carries a data key (body encryption) and, once it has attachments, an
//! attachment key. Both are stored wrapped under a *common key* that is shared across the
//! user's records and identified by id. Common keys are looked up in a [`CommonKeyStore`] first
//! and only fetched through the crypto collaborator on a miss.

use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

/// Purpose of a symmetric key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyType {
    Common,
    Data,
    Attachment,
    Tag,
}

/// A symmetric key and what it is used for.
#[derive(Clone, PartialEq, Eq)]
pub struct GcKey {
    key_type: KeyType,
    material: Vec<u8>,
}

impl GcKey {
    pub fn new(key_type: KeyType, material: impl Into<Vec<u8>>) -> Self {
        Self {
            key_type,
            material: material.into(),
        }
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn material(&self) -> &[u8] {
        &self.material
    }
}

impl std::fmt::Debug for GcKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcKey")
            .field("key_type", &self.key_type)
            .finish_non_exhaustive()
    }
}

/// Cache of common keys by id.
pub trait CommonKeyStore: Send + Sync {
    fn get(&self, common_key_id: &str) -> Option<GcKey>;
    fn put(&self, common_key_id: &str, key: GcKey);
}

/// Process-local [`CommonKeyStore`].
#[derive(Debug, Default)]
pub struct InMemoryCommonKeyStore {
    keys: RwLock<HashMap<String, GcKey>>,
}

impl InMemoryCommonKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CommonKeyStore for InMemoryCommonKeyStore {
    fn get(&self, common_key_id: &str) -> Option<GcKey> {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(common_key_id)
            .cloned()
    }

    fn put(&self, common_key_id: &str, key: GcKey) {
        self.keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(common_key_id.to_owned(), key);
    }
}

/// The attachment key of one record: absent until first needed, then fixed.
#[derive(Clone, Default)]
pub struct AttachmentKeyCell {
    key: OnceLock<GcKey>,
}

impl AttachmentKeyCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(key: GcKey) -> Self {
        Self {
            key: OnceLock::from(key),
        }
    }

    pub fn get(&self) -> Option<&GcKey> {
        self.key.get()
    }

    /// Returns the key, generating it with `generate` on first use.
    ///
    /// # Errors
    ///
    /// Propagates the error of `generate`; the cell stays empty in that case.
    pub fn get_or_generate<E>(
        &self,
        generate: impl FnOnce() -> Result<GcKey, E>,
    ) -> Result<&GcKey, E> {
        if let Some(key) = self.key.get() {
            return Ok(key);
        }
        let key = generate()?;
        Ok(self.key.get_or_init(|| key))
    }
}

impl std::fmt::Debug for AttachmentKeyCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentKeyCell")
            .field("is_set", &self.key.get().is_some())
            .finish()
    }
}

//! Crypto collaborator.
//!
//! The record core never implements ciphers itself. Symmetric encryption, key wrapping and key
//! provisioning are delegated to a [`CryptoService`] supplied by the host SDK.

use crate::error::BoxError;
use crate::keys::{GcKey, KeyType};
use async_trait::async_trait;
use sha1::{Digest, Sha1};

#[async_trait]
pub trait CryptoService: Send + Sync {
    /// Generate a fresh symmetric key.
    fn generate_key(&self, key_type: KeyType) -> Result<GcKey, BoxError>;

    fn encrypt_symmetric(&self, key: &GcKey, plaintext: &[u8]) -> Result<Vec<u8>, BoxError>;

    fn decrypt_symmetric(&self, key: &GcKey, ciphertext: &[u8]) -> Result<Vec<u8>, BoxError>;

    /// Wrap `key` under `common_key`.
    fn encrypt_key(&self, common_key: &GcKey, key: &GcKey) -> Result<Vec<u8>, BoxError>;

    /// Unwrap a key previously wrapped with [`Self::encrypt_key`].
    fn decrypt_key(
        &self,
        common_key: &GcKey,
        encrypted_key: &[u8],
        key_type: KeyType,
    ) -> Result<GcKey, BoxError>;

    /// Digest used for `Attachment.hash` (SHA-1).
    fn hash(&self, data: &[u8]) -> Vec<u8> {
        Sha1::digest(data).to_vec()
    }

    /// Id of the common key new record keys are wrapped with.
    fn current_common_key_id(&self) -> String;

    async fn fetch_common_key(&self, common_key_id: &str) -> Result<GcKey, BoxError>;

    /// Key used to encrypt tags and annotations. Must encrypt deterministically.
    async fn fetch_tag_encryption_key(&self) -> Result<GcKey, BoxError>;
}

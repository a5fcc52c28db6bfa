//! Record orchestration.
//!
//! [`RecordService`] sequences every record operation against the crypto, record and
//! attachment collaborators:
//!
//! 1. resolve keys (common key by id through the cache, then data and attachment keys)
//! 2. validate, upload or download attachments
//! 3. move payloads out of the resource body, encrypt, store
//! 4. decrypt what the store returned and hand the caller a typed [`Record`]
//!
//! The service holds no per-record state. The only state shared between operations is the
//! injected [`CommonKeyStore`].
//!
//! [`Record`]: crate::record::Record

mod attachments;
mod records;


pub use records::RecordQuery;

use crate::config::SdkConfig;
use crate::constants::MODEL_VERSION;
use crate::crypto::CryptoService;
use crate::keys::{AttachmentKeyCell, CommonKeyStore, GcKey, KeyType};
use crate::record::DecryptedRecord;
use crate::resource::{DataResource, Fhir3Resource, Fhir4Resource, Resource, ResourceFamily};
use crate::tags::{family_from_tags, TagCodec, TaggingService};
use crate::transport::{AttachmentTransport, EncryptedRecord, RecordTransport};
use crate::{CoreError, CoreResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use fhir::FhirResource;
use std::sync::Arc;

/// Orchestrates encrypted record operations for one SDK instance.
#[derive(Clone)]
pub struct RecordService {
    cfg: Arc<SdkConfig>,
    crypto: Arc<dyn CryptoService>,
    records: Arc<dyn RecordTransport>,
    attachments: Arc<dyn AttachmentTransport>,
    common_keys: Arc<dyn CommonKeyStore>,
    tagging: TaggingService,
}

impl RecordService {
    /// Creates a new `RecordService`.
    ///
    /// # Arguments
    ///
    /// * `cfg` - SDK configuration resolved at startup.
    /// * `crypto` - Cipher and key provisioning collaborator.
    /// * `records` - Record store.
    /// * `attachments` - Attachment store.
    /// * `common_keys` - Common key cache shared by all operations.
    pub fn new(
        cfg: Arc<SdkConfig>,
        crypto: Arc<dyn CryptoService>,
        records: Arc<dyn RecordTransport>,
        attachments: Arc<dyn AttachmentTransport>,
        common_keys: Arc<dyn CommonKeyStore>,
    ) -> Self {
        let tagging = TaggingService::new(cfg.client_id().clone());
        Self {
            cfg,
            crypto,
            records,
            attachments,
            common_keys,
            tagging,
        }
    }

    fn alias(&self) -> &str {
        self.cfg.alias()
    }

    /// Tag codec for one logical operation; fetches the tag key.
    async fn tag_codec(&self) -> CoreResult<TagCodec<'_>> {
        TagCodec::fetch(self.crypto.as_ref()).await
    }

    /// Common key by id, from the cache or fetched and cached.
    async fn common_key(&self, common_key_id: &str) -> CoreResult<GcKey> {
        if let Some(key) = self.common_keys.get(common_key_id) {
            return Ok(key);
        }

        tracing::debug!(common_key_id, "common key not cached, fetching");
        let key = self
            .crypto
            .fetch_common_key(common_key_id)
            .await
            .map_err(CoreError::Crypto)?;
        self.common_keys.put(common_key_id, key.clone());
        Ok(key)
    }

    fn generate_key(&self, key_type: KeyType) -> CoreResult<GcKey> {
        self.crypto.generate_key(key_type).map_err(CoreError::Crypto)
    }

    fn encrypt_key(&self, common_key: &GcKey, key: &GcKey) -> CoreResult<String> {
        let wrapped = self
            .crypto
            .encrypt_key(common_key, key)
            .map_err(CoreError::Crypto)?;
        Ok(STANDARD.encode(wrapped))
    }

    fn decrypt_key(
        &self,
        common_key: &GcKey,
        encrypted_key: &str,
        key_type: KeyType,
    ) -> CoreResult<GcKey> {
        let wrapped = STANDARD.decode(encrypted_key)?;
        self.crypto
            .decrypt_key(common_key, &wrapped, key_type)
            .map_err(CoreError::Crypto)
    }

    /// Encrypt a record for the record store.
    ///
    /// Keys are always wrapped with the current common key, so an update migrates a record
    /// written under an older common key.
    async fn encrypt_record(
        &self,
        record: &DecryptedRecord,
        codec: &TagCodec<'_>,
    ) -> CoreResult<EncryptedRecord> {
        let body = match &record.resource {
            Resource::Fhir3(Fhir3Resource(r)) | Resource::Fhir4(Fhir4Resource(r)) => {
                r.render_json().map_err(CoreError::Serialization)?
            }
            Resource::Data(DataResource(bytes)) => bytes.clone(),
        };
        let encrypted_body = self
            .crypto
            .encrypt_symmetric(&record.data_key, &body)
            .map_err(CoreError::Crypto)?;

        let common_key_id = self.crypto.current_common_key_id();
        let common_key = self.common_key(&common_key_id).await?;
        let encrypted_attachment_key = record
            .attachment_key
            .get()
            .map(|key| self.encrypt_key(&common_key, key))
            .transpose()?;

        Ok(EncryptedRecord {
            identifier: record.id.clone(),
            encrypted_tags: codec.encrypt_tags(&record.tags, &record.annotations)?,
            encrypted_body: STANDARD.encode(encrypted_body),
            encrypted_data_key: self.encrypt_key(&common_key, &record.data_key)?,
            encrypted_attachment_key,
            common_key_id,
            creation_date: record.creation_date,
            update_date: record.update_date,
            model_version: MODEL_VERSION,
        })
    }

    /// Decrypt a record returned by the record store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ModelVersionNotSupported`] for envelopes newer than this crate,
    /// [`CoreError::UnsupportedFhirVersion`] for unknown version tags and
    /// [`CoreError::BodyDecoding`] when the body is not a FHIR resource or does not match its
    /// modelled shape.
    async fn decrypt_record(
        &self,
        encrypted: EncryptedRecord,
        codec: &TagCodec<'_>,
    ) -> CoreResult<DecryptedRecord> {
        if encrypted.model_version > MODEL_VERSION {
            return Err(CoreError::ModelVersionNotSupported(encrypted.model_version));
        }

        let (tags, annotations) = codec.decrypt(&encrypted.encrypted_tags)?;
        let family = family_from_tags(&tags)?;

        let common_key = self.common_key(&encrypted.common_key_id).await?;
        let data_key = self.decrypt_key(&common_key, &encrypted.encrypted_data_key, KeyType::Data)?;
        let attachment_key = match encrypted.encrypted_attachment_key.as_deref() {
            Some(wrapped) => AttachmentKeyCell::with_key(self.decrypt_key(
                &common_key,
                wrapped,
                KeyType::Attachment,
            )?),
            None => AttachmentKeyCell::new(),
        };

        let ciphertext = STANDARD.decode(&encrypted.encrypted_body)?;
        let body = self
            .crypto
            .decrypt_symmetric(&data_key, &ciphertext)
            .map_err(CoreError::Crypto)?;
        let resource = match family {
            ResourceFamily::Fhir3 => Resource::Fhir3(Fhir3Resource(parse_body(&body)?)),
            ResourceFamily::Fhir4 => Resource::Fhir4(Fhir4Resource(parse_body(&body)?)),
            ResourceFamily::Data => Resource::Data(DataResource(body)),
        };

        Ok(DecryptedRecord {
            id: encrypted.identifier,
            resource,
            tags,
            annotations,
            creation_date: encrypted.creation_date,
            update_date: encrypted.update_date,
            data_key,
            attachment_key,
            model_version: encrypted.model_version,
        })
    }
}

fn parse_body(body: &[u8]) -> CoreResult<FhirResource> {
    FhirResource::parse_json(body).map_err(CoreError::BodyDecoding)
}

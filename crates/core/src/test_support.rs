//! In-memory collaborators for tests.
//!
//! The fake crypto is a reversible XOR keyed by the key material. It is deterministic, so
//! encrypted tags compare equal the way they do with the real tag cipher.

use crate::config::SdkConfig;
use crate::crypto::CryptoService;
use crate::error::BoxError;
use crate::keys::{GcKey, InMemoryCommonKeyStore, KeyType};
use crate::service::RecordService;
use crate::transport::{
    AttachmentTransport, EncryptedRecord, RecordTransport, SearchQuery, UploadedAttachment,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use fhir::Attachment;
use indexmap::IndexMap;
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const USER_ID: &str = "user-1";

pub const PDF: &[u8] = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n1 0 obj\n<< /Type /Catalog >>\nendobj\n";

const TAG_KEY: &[u8] = b"tag-key";

fn xor(key: &[u8], data: &[u8]) -> Vec<u8> {
    data.iter()
        .zip(key.iter().cycle())
        .map(|(d, k)| d ^ k)
        .collect()
}

pub struct FakeCrypto {
    generated: AtomicUsize,
    tag_key_fetches: AtomicUsize,
    common_key_fetches: AtomicUsize,
    common_key_id: Mutex<String>,
}

impl FakeCrypto {
    pub fn new() -> Self {
        Self {
            generated: AtomicUsize::new(0),
            tag_key_fetches: AtomicUsize::new(0),
            common_key_fetches: AtomicUsize::new(0),
            common_key_id: Mutex::new("common-1".into()),
        }
    }

    pub fn tag_key_fetches(&self) -> usize {
        self.tag_key_fetches.load(Ordering::SeqCst)
    }

    pub fn common_key_fetches(&self) -> usize {
        self.common_key_fetches.load(Ordering::SeqCst)
    }

    pub fn generated_keys(&self) -> usize {
        self.generated.load(Ordering::SeqCst)
    }

    pub fn rotate_common_key(&self, common_key_id: &str) {
        *self.common_key_id.lock().unwrap() = common_key_id.to_owned();
    }

    /// Encrypted form of a plaintext tag, as an older client would have written it.
    pub fn encrypt_tag_plaintext(&self, plaintext: &str) -> String {
        STANDARD.encode(xor(TAG_KEY, plaintext.as_bytes()))
    }
}

#[async_trait]
impl CryptoService for FakeCrypto {
    fn generate_key(&self, key_type: KeyType) -> Result<GcKey, BoxError> {
        let n = self.generated.fetch_add(1, Ordering::SeqCst);
        Ok(GcKey::new(key_type, format!("{key_type:?}-key-{n}").into_bytes()))
    }

    fn encrypt_symmetric(&self, key: &GcKey, plaintext: &[u8]) -> Result<Vec<u8>, BoxError> {
        Ok(xor(key.material(), plaintext))
    }

    fn decrypt_symmetric(&self, key: &GcKey, ciphertext: &[u8]) -> Result<Vec<u8>, BoxError> {
        Ok(xor(key.material(), ciphertext))
    }

    fn encrypt_key(&self, common_key: &GcKey, key: &GcKey) -> Result<Vec<u8>, BoxError> {
        Ok(xor(common_key.material(), key.material()))
    }

    fn decrypt_key(
        &self,
        common_key: &GcKey,
        encrypted_key: &[u8],
        key_type: KeyType,
    ) -> Result<GcKey, BoxError> {
        Ok(GcKey::new(key_type, xor(common_key.material(), encrypted_key)))
    }

    fn current_common_key_id(&self) -> String {
        self.common_key_id.lock().unwrap().clone()
    }

    async fn fetch_common_key(&self, common_key_id: &str) -> Result<GcKey, BoxError> {
        self.common_key_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(GcKey::new(
            KeyType::Common,
            format!("common-material-{common_key_id}").into_bytes(),
        ))
    }

    async fn fetch_tag_encryption_key(&self) -> Result<GcKey, BoxError> {
        self.tag_key_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(GcKey::new(KeyType::Tag, TAG_KEY.to_vec()))
    }
}

/// Record store that evaluates tag groups and creation date ranges like the server does.
#[derive(Default)]
pub struct InMemoryRecordTransport {
    records: Mutex<IndexMap<String, EncryptedRecord>>,
}

impl InMemoryRecordTransport {
    pub fn stored(&self, record_id: &str) -> EncryptedRecord {
        self.records.lock().unwrap()[record_id].clone()
    }

    /// Store an envelope directly, bypassing the SDK.
    pub fn insert(&self, mut record: EncryptedRecord) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        record.identifier = Some(id.clone());
        self.records.lock().unwrap().insert(id.clone(), record);
        id
    }

    fn matching(&self, query: &SearchQuery) -> Vec<EncryptedRecord> {
        self.records
            .lock()
            .unwrap()
            .values()
            .filter(|r| query.tag_groups.matches(&r.encrypted_tags))
            .filter(|r| query.start_date.map_or(true, |d| r.creation_date >= d))
            .filter(|r| query.end_date.map_or(true, |d| r.creation_date <= d))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RecordTransport for InMemoryRecordTransport {
    async fn create_record(
        &self,
        _alias: &str,
        _user_id: &str,
        record: EncryptedRecord,
    ) -> Result<EncryptedRecord, BoxError> {
        let id = self.insert(record);
        Ok(self.stored(&id))
    }

    async fn fetch_record(
        &self,
        _alias: &str,
        _user_id: &str,
        record_id: &str,
    ) -> Result<EncryptedRecord, BoxError> {
        self.records
            .lock()
            .unwrap()
            .get(record_id)
            .cloned()
            .ok_or_else(|| format!("record {record_id} not found").into())
    }

    async fn update_record(
        &self,
        _alias: &str,
        _user_id: &str,
        record_id: &str,
        mut record: EncryptedRecord,
    ) -> Result<EncryptedRecord, BoxError> {
        let mut records = self.records.lock().unwrap();
        if !records.contains_key(record_id) {
            return Err(format!("record {record_id} not found").into());
        }
        record.identifier = Some(record_id.to_owned());
        record.update_date = Some(Utc::now());
        records.insert(record_id.to_owned(), record.clone());
        Ok(record)
    }

    async fn search_records(
        &self,
        _alias: &str,
        _user_id: &str,
        query: &SearchQuery,
    ) -> Result<Vec<EncryptedRecord>, BoxError> {
        Ok(self
            .matching(query)
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn count_records(
        &self,
        _alias: &str,
        _user_id: &str,
        query: &SearchQuery,
    ) -> Result<usize, BoxError> {
        Ok(self.matching(query).len())
    }

    async fn delete_record(
        &self,
        _alias: &str,
        _user_id: &str,
        record_id: &str,
    ) -> Result<(), BoxError> {
        self.records
            .lock()
            .unwrap()
            .shift_remove(record_id)
            .map(|_| ())
            .ok_or_else(|| format!("record {record_id} not found").into())
    }
}

/// Attachment store that records every call and keeps payloads by id.
#[derive(Default)]
pub struct RecordingAttachmentTransport {
    downscale: bool,
    uploads: Mutex<Vec<Attachment>>,
    downloads: Mutex<Vec<String>>,
    payloads: Mutex<HashMap<String, Option<String>>>,
}

impl RecordingAttachmentTransport {
    /// Produce preview and thumbnail ids for every upload.
    pub fn with_downscaling() -> Self {
        Self {
            downscale: true,
            ..Default::default()
        }
    }

    pub fn uploads(&self) -> Vec<Attachment> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn downloaded_ids(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl AttachmentTransport for RecordingAttachmentTransport {
    async fn upload(
        &self,
        attachments: Vec<Attachment>,
        _attachment_key: &GcKey,
        _user_id: &str,
    ) -> Result<Vec<UploadedAttachment>, BoxError> {
        let mut uploaded = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            self.uploads.lock().unwrap().push(attachment.clone());

            let id = uuid::Uuid::new_v4().simple().to_string();
            let mut payloads = self.payloads.lock().unwrap();
            payloads.insert(id.clone(), attachment.data.clone());
            let downscaled_ids = if self.downscale {
                let ids = vec![format!("{id}-preview"), format!("{id}-thumb")];
                for variant in &ids {
                    payloads.insert(format!("{id}#{variant}"), Some(format!("{variant}-data")));
                }
                ids
            } else {
                Vec::new()
            };

            uploaded.push(UploadedAttachment {
                attachment: Attachment {
                    id: Some(id),
                    ..attachment
                },
                downscaled_ids,
            });
        }
        Ok(uploaded)
    }

    async fn download(
        &self,
        attachments: Vec<Attachment>,
        _attachment_key: &GcKey,
        _user_id: &str,
    ) -> Result<Vec<Attachment>, BoxError> {
        let payloads = self.payloads.lock().unwrap();
        attachments
            .into_iter()
            .map(|attachment| -> Result<Attachment, BoxError> {
                let id = attachment.id.clone().unwrap_or_default();
                self.downloads.lock().unwrap().push(id.clone());
                let data = payloads
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| format!("attachment {id} not found"))?;
                Ok(Attachment { data, ..attachment })
            })
            .collect()
    }

    async fn delete(&self, attachment_id: &str, _user_id: &str) -> Result<bool, BoxError> {
        Ok(self.payloads.lock().unwrap().remove(attachment_id).is_some())
    }
}

/// Attachment with `hash` and `size` filled in for `bytes`.
pub fn attachment_for(bytes: &[u8]) -> Attachment {
    Attachment {
        content_type: Some("application/pdf".into()),
        data: Some(STANDARD.encode(bytes)),
        size: Some(bytes.len() as u64),
        hash: Some(STANDARD.encode(Sha1::digest(bytes))),
        ..Default::default()
    }
}

/// A record service wired to in-memory collaborators.
pub struct Harness {
    pub service: RecordService,
    pub crypto: Arc<FakeCrypto>,
    pub records: Arc<InMemoryRecordTransport>,
    pub attachments: Arc<RecordingAttachmentTransport>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(1024 * 1024, RecordingAttachmentTransport::default())
    }

    pub fn with_max_attachment_size(max_attachment_size_bytes: u64) -> Self {
        Self::build(max_attachment_size_bytes, RecordingAttachmentTransport::default())
    }

    pub fn with_downscaling() -> Self {
        Self::build(1024 * 1024, RecordingAttachmentTransport::with_downscaling())
    }

    fn build(max_attachment_size_bytes: u64, attachments: RecordingAttachmentTransport) -> Self {
        let cfg = Arc::new(
            SdkConfig::new("test", "acme#android", max_attachment_size_bytes).unwrap(),
        );
        let crypto = Arc::new(FakeCrypto::new());
        let records = Arc::new(InMemoryRecordTransport::default());
        let attachments = Arc::new(attachments);
        let service = RecordService::new(
            cfg,
            crypto.clone(),
            records.clone(),
            attachments.clone(),
            Arc::new(InMemoryCommonKeyStore::new()),
        );
        Self {
            service,
            crypto,
            records,
            attachments,
        }
    }
}

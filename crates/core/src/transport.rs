//! Transport collaborators.
//!
//! The record core sequences calls to two stores it does not implement: the record store,
//! which persists [`EncryptedRecord`] envelopes and evaluates searches, and the attachment
//! store, which holds encrypted payloads and produces downscaled image variants.

use crate::error::BoxError;
use crate::keys::GcKey;
use crate::tags::TagGroups;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use fhir::Attachment;
use serde::{Deserialize, Serialize};

/// A record as persisted by the record store.
///
/// Binary fields are standard base64.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub common_key_id: String,
    pub encrypted_tags: Vec<String>,
    pub encrypted_body: String,
    pub encrypted_data_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_attachment_key: Option<String>,
    pub creation_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_date: Option<DateTime<Utc>>,
    pub model_version: u32,
}

/// Search parameters sent to the record store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
    pub tag_groups: TagGroups,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: usize,
    pub offset: usize,
}

#[async_trait]
pub trait RecordTransport: Send + Sync {
    async fn create_record(
        &self,
        alias: &str,
        user_id: &str,
        record: EncryptedRecord,
    ) -> Result<EncryptedRecord, BoxError>;

    async fn fetch_record(
        &self,
        alias: &str,
        user_id: &str,
        record_id: &str,
    ) -> Result<EncryptedRecord, BoxError>;

    async fn update_record(
        &self,
        alias: &str,
        user_id: &str,
        record_id: &str,
        record: EncryptedRecord,
    ) -> Result<EncryptedRecord, BoxError>;

    async fn search_records(
        &self,
        alias: &str,
        user_id: &str,
        query: &SearchQuery,
    ) -> Result<Vec<EncryptedRecord>, BoxError>;

    async fn count_records(
        &self,
        alias: &str,
        user_id: &str,
        query: &SearchQuery,
    ) -> Result<usize, BoxError>;

    async fn delete_record(
        &self,
        alias: &str,
        user_id: &str,
        record_id: &str,
    ) -> Result<(), BoxError>;
}

/// An attachment accepted by the attachment store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedAttachment {
    /// The attachment with its server id set.
    pub attachment: Attachment,
    /// Ids of the preview and thumbnail, empty when no variants were produced.
    pub downscaled_ids: Vec<String>,
}

#[async_trait]
pub trait AttachmentTransport: Send + Sync {
    async fn upload(
        &self,
        attachments: Vec<Attachment>,
        attachment_key: &GcKey,
        user_id: &str,
    ) -> Result<Vec<UploadedAttachment>, BoxError>;

    /// Download payloads; ids may address a variant as `<attachmentId>#<variantId>`.
    async fn download(
        &self,
        attachments: Vec<Attachment>,
        attachment_key: &GcKey,
        user_id: &str,
    ) -> Result<Vec<Attachment>, BoxError>;

    async fn delete(&self, attachment_id: &str, user_id: &str) -> Result<bool, BoxError>;
}

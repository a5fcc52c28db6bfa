//! Attachment sequencing: restriction checks, upload, update diffing and download.

use super::RecordService;
use crate::attachments::identifier::{
    additional_identifier, primary_attachment_id, set_attachment_id_for_download_type,
    DownloadType,
};
use crate::capability;
use crate::constants::{
    MSG_ATTACHMENT_DATA_EXPECTED, MSG_ATTACHMENT_HASH_AND_SIZE_EXPECTED,
    MSG_ATTACHMENT_HASH_EXPECTED, MSG_ATTACHMENT_HASH_NOT_VALID, MSG_ATTACHMENT_ID_EXPECTED,
    MSG_ATTACHMENT_ID_SHOULD_BE_NULL, MSG_INVALID_ATTACHMENT_IDS, MSG_VALID_ATTACHMENT_ID_EXPECTED,
};
use crate::keys::{GcKey, KeyType};
use crate::record::DecryptedRecord;
use crate::resource::Resource;
use crate::transport::UploadedAttachment;
use crate::{CoreError, CoreResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use fhir::{Attachment, Identifier};
use futures_util::future::try_join_all;
use hc_files::AttachmentPayload;

/// An attachment queued for upload with the slot it came from.
type PendingUpload = (usize, Attachment);

impl RecordService {
    /// Check every attachment payload against the upload restrictions.
    ///
    /// Resources without attachments and attachments without payload pass.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidPayloadEncoding`] if a payload is not base64
    /// - [`CoreError::UnsupportedFileType`] if a payload is not JPEG, PNG, TIFF, DICOM or PDF
    /// - [`CoreError::MaxDataSizeViolation`] if a decoded payload exceeds the configured limit
    pub fn check_data_restrictions(&self, resource: &Resource) -> CoreResult<()> {
        let Some(slots) = capability::attachments(resource) else {
            return Ok(());
        };

        for attachment in slots.into_iter().flatten() {
            let Some(data) = attachment.data.as_deref().filter(|d| !d.is_empty()) else {
                continue;
            };
            let metadata = AttachmentPayload::from_base64(data)?
                .inspect(self.cfg.max_attachment_size_bytes())?;
            tracing::debug!(
                media_type = metadata.media_type.mime_type(),
                size = metadata.size_bytes,
                "attachment payload accepted"
            );
        }
        Ok(())
    }

    /// Upload every attachment of a new record.
    pub(super) async fn upload_data(
        &self,
        mut record: DecryptedRecord,
        user_id: &str,
    ) -> CoreResult<DecryptedRecord> {
        if !capability::has_attachments(&record.resource) {
            return Ok(record);
        }

        let mut pending = Vec::new();
        let slots = capability::attachments(&record.resource).unwrap_or_default();
        for (slot, attachment) in slots.into_iter().enumerate() {
            let Some(attachment) = attachment else {
                continue;
            };
            if attachment.id.is_some() {
                return Err(CoreError::IdUsageViolation(
                    MSG_ATTACHMENT_ID_SHOULD_BE_NULL.into(),
                ));
            }
            self.validate_payload_hash(attachment)?;
            pending.push((slot, attachment.clone()));
        }

        self.upload_pending(&mut record, pending, user_id).await?;
        Ok(record)
    }

    /// Carry attachments over from a stored record to its new resource.
    ///
    /// Attachments with an id must match a stored attachment. They are uploaded again only when
    /// their hash changed; attachments without an id are uploaded as new.
    pub(super) async fn update_data(
        &self,
        stored: DecryptedRecord,
        resource: Resource,
        user_id: &str,
    ) -> CoreResult<DecryptedRecord> {
        let stored_attachments: Vec<Attachment> = capability::attachments(&stored.resource)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .cloned()
            .collect();

        let mut record = DecryptedRecord { resource, ..stored };
        if let Some(slots) = capability::attachments_mut(&mut record.resource) {
            // Ids returned by a preview download address a variant; only the bare id is stored.
            for attachment in slots.into_iter().flatten() {
                if let Some(id) = attachment.id.as_deref() {
                    let primary = primary_attachment_id(id).to_owned();
                    attachment.id = Some(primary);
                }
            }
        }

        let mut pending = Vec::new();
        let slots = capability::attachments(&record.resource).unwrap_or_default();
        for (slot, attachment) in slots.into_iter().enumerate() {
            let Some(attachment) = attachment else {
                continue;
            };
            let Some(id) = attachment.id.as_deref() else {
                self.validate_payload_hash(attachment)?;
                pending.push((slot, attachment.clone()));
                continue;
            };

            let previous = stored_attachments
                .iter()
                .find(|old| old.id.as_deref() == Some(id))
                .ok_or_else(|| {
                    CoreError::IdUsageViolation(MSG_VALID_ATTACHMENT_ID_EXPECTED.into())
                })?;
            let (Some(previous_hash), Some(hash)) =
                (previous.hash.as_deref(), attachment.hash.as_deref())
            else {
                return Err(CoreError::ExpectedFieldViolation(
                    MSG_ATTACHMENT_HASH_EXPECTED.into(),
                ));
            };
            if previous_hash != hash {
                self.validate_payload_hash(attachment)?;
                pending.push((slot, attachment.clone()));
            }
        }

        self.upload_pending(&mut record, pending, user_id).await?;
        Ok(record)
    }

    /// `hash` and `size` must be present and `hash` must match the payload.
    fn validate_payload_hash(&self, attachment: &Attachment) -> CoreResult<()> {
        let (Some(hash), Some(_)) = (attachment.hash.as_deref(), attachment.size) else {
            return Err(CoreError::ExpectedFieldViolation(
                MSG_ATTACHMENT_HASH_AND_SIZE_EXPECTED.into(),
            ));
        };
        let data = attachment.data.as_deref().ok_or_else(|| {
            CoreError::ExpectedFieldViolation(MSG_ATTACHMENT_DATA_EXPECTED.into())
        })?;

        let payload = AttachmentPayload::from_base64(data)?;
        if STANDARD.encode(self.crypto.hash(payload.as_bytes())) != hash {
            return Err(CoreError::InvalidAttachmentPayloadHash(
                MSG_ATTACHMENT_HASH_NOT_VALID.into(),
            ));
        }
        Ok(())
    }

    /// Upload queued attachments concurrently and record the results on the resource.
    ///
    /// The attachment key is generated here on first need and then stays on the record.
    async fn upload_pending(
        &self,
        record: &mut DecryptedRecord,
        pending: Vec<PendingUpload>,
        user_id: &str,
    ) -> CoreResult<()> {
        if pending.is_empty() {
            return Ok(());
        }

        let key = record
            .attachment_key
            .get_or_generate(|| self.generate_key(KeyType::Attachment))?
            .clone();

        tracing::debug!(count = pending.len(), "uploading attachments");
        let key = &key;
        let uploads = pending.into_iter().map(|(slot, attachment)| async move {
            let mut uploaded = self
                .attachments
                .upload(vec![attachment], key, user_id)
                .await
                .map_err(CoreError::Transport)?;
            let uploaded = uploaded
                .pop()
                .ok_or_else(|| CoreError::Transport("attachment upload returned no result".into()))?;
            Ok::<_, CoreError>((slot, uploaded))
        });
        let uploaded = try_join_all(uploads).await?;

        self.apply_uploads(&mut record.resource, uploaded)
    }

    /// Write server ids onto their slots and append identifiers for downscaled variants.
    fn apply_uploads(
        &self,
        resource: &mut Resource,
        uploaded: Vec<(usize, UploadedAttachment)>,
    ) -> CoreResult<()> {
        let mut new_identifiers = Vec::new();
        if let Some(mut slots) = capability::attachments_mut(resource) {
            for (slot, upload) in uploaded {
                let attachment_id = upload.attachment.id.ok_or_else(|| {
                    CoreError::IdUsageViolation(MSG_ATTACHMENT_ID_EXPECTED.into())
                })?;
                if !upload.downscaled_ids.is_empty() {
                    new_identifiers.push(additional_identifier(
                        &attachment_id,
                        &upload.downscaled_ids,
                        self.cfg.partner_id(),
                    )?);
                }
                if let Some(Some(target)) = slots.get_mut(slot) {
                    target.id = Some(attachment_id);
                }
            }
        }

        if !new_identifiers.is_empty() {
            let mut identifiers = capability::identifiers(resource)
                .map(<[Identifier]>::to_vec)
                .unwrap_or_default();
            identifiers.extend(new_identifiers);
            capability::set_identifiers(resource, identifiers);
        }
        Ok(())
    }

    /// Replace every attachment of the record by its downloaded version.
    pub(super) async fn download_data(
        &self,
        mut record: DecryptedRecord,
        user_id: &str,
        download_type: DownloadType,
    ) -> CoreResult<DecryptedRecord> {
        let mut positions = Vec::new();
        let mut requested = Vec::new();
        let slots = capability::attachments(&record.resource).unwrap_or_default();
        for (slot, attachment) in slots.into_iter().enumerate() {
            let Some(attachment) = attachment else {
                continue;
            };
            if attachment.id.is_none() {
                return Err(CoreError::IdUsageViolation(MSG_ATTACHMENT_ID_EXPECTED.into()));
            }
            positions.push(slot);
            requested.push(attachment.clone());
        }
        if requested.is_empty() {
            return Ok(record);
        }

        let identifiers = capability::identifiers(&record.resource)
            .map(<[Identifier]>::to_vec)
            .unwrap_or_default();
        let key = record
            .attachment_key
            .get()
            .ok_or(CoreError::MissingAttachmentKey)?;
        let downloaded = self
            .fetch_attachments(requested, &identifiers, key, download_type, user_id)
            .await?;

        if let Some(mut slots) = capability::attachments_mut(&mut record.resource) {
            for (slot, attachment) in positions.into_iter().zip(downloaded) {
                if let Some(Some(target)) = slots.get_mut(slot) {
                    **target = attachment;
                }
            }
        }
        Ok(record)
    }

    async fn fetch_attachments(
        &self,
        mut attachments: Vec<Attachment>,
        identifiers: &[Identifier],
        key: &GcKey,
        download_type: DownloadType,
        user_id: &str,
    ) -> CoreResult<Vec<Attachment>> {
        set_attachment_id_for_download_type(&mut attachments, identifiers, download_type)?;
        let requested = attachments.len();
        let downloaded = self
            .attachments
            .download(attachments, key, user_id)
            .await
            .map_err(CoreError::Transport)?;
        if downloaded.len() != requested {
            return Err(CoreError::Transport(
                format!("requested {requested} attachments, received {}", downloaded.len()).into(),
            ));
        }
        Ok(downloaded)
    }

    /// Download selected attachments of a record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IdUsageViolation`] with "Please provide correct attachment ids!"
    /// if any requested id is not an attachment of the record.
    pub async fn download_attachments(
        &self,
        user_id: &str,
        record_id: &str,
        attachment_ids: &[String],
        download_type: DownloadType,
    ) -> CoreResult<Vec<Attachment>> {
        let codec = self.tag_codec().await?;
        let encrypted = self
            .records
            .fetch_record(self.alias(), user_id, record_id)
            .await
            .map_err(CoreError::Transport)?;
        let record = self.decrypt_record(encrypted, &codec).await?;

        let selected: Vec<Attachment> = capability::attachments(&record.resource)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter(|a| {
                a.id
                    .as_ref()
                    .is_some_and(|id| attachment_ids.contains(id))
            })
            .cloned()
            .collect();
        if attachment_ids.is_empty() || selected.len() != attachment_ids.len() {
            return Err(CoreError::IdUsageViolation(MSG_INVALID_ATTACHMENT_IDS.into()));
        }

        let identifiers = capability::identifiers(&record.resource).unwrap_or_default();
        let key = record
            .attachment_key
            .get()
            .ok_or(CoreError::MissingAttachmentKey)?;
        self.fetch_attachments(selected, identifiers, key, download_type, user_id)
            .await
    }

    /// Download one attachment of a record.
    pub async fn download_attachment(
        &self,
        user_id: &str,
        record_id: &str,
        attachment_id: &str,
        download_type: DownloadType,
    ) -> CoreResult<Attachment> {
        let ids = [attachment_id.to_owned()];
        self.download_attachments(user_id, record_id, &ids, download_type)
            .await?
            .pop()
            .ok_or_else(|| CoreError::IdUsageViolation(MSG_INVALID_ATTACHMENT_IDS.into()))
    }

    /// Delete an attachment payload from the attachment store.
    ///
    /// The record referencing it is not changed.
    pub async fn delete_attachment(&self, user_id: &str, attachment_id: &str) -> CoreResult<bool> {
        let deleted = self
            .attachments
            .delete(attachment_id, user_id)
            .await
            .map_err(CoreError::Transport)?;
        tracing::info!(attachment_id, deleted, "attachment delete requested");
        Ok(deleted)
    }
}

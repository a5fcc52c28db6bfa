//! Record operations: create, fetch, search, count, update, delete and full download.

use super::RecordService;
use crate::attachments::hoist::{extract_upload_data, remove_upload_data, restore_upload_data};
use crate::attachments::identifier::{clean_obsolete_additional_identifiers, DownloadType};
use crate::constants::DEFAULT_PAGE_SIZE;
use crate::keys::KeyType;
use crate::record::{DecryptedRecord, Record};
use crate::resource::{ResourceFamily, ResourceKind};
use crate::tags::{validate_annotations, TaggingService};
use crate::transport::SearchQuery;
use crate::{CoreError, CoreResult};
use chrono::{NaiveDate, Utc};

/// Filters for [`RecordService::fetch_records`] and [`RecordService::count_records`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordQuery {
    /// FHIR `resourceType` to restrict to; ignored for opaque data.
    pub resource_type: Option<String>,
    pub annotations: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page_size: usize,
    pub offset: usize,
}

impl Default for RecordQuery {
    fn default() -> Self {
        Self {
            resource_type: None,
            annotations: Vec::new(),
            start_date: None,
            end_date: None,
            page_size: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl RecordService {
    /// Store a new record.
    ///
    /// Attachment payloads are checked against the upload restrictions, uploaded and replaced
    /// by their server ids before the resource is encrypted. The returned record carries the
    /// payloads again.
    ///
    /// # Errors
    ///
    /// Returns a validation or restriction error if an attachment is not uploadable, and
    /// [`CoreError::AnnotationViolation`] for blank annotations.
    pub async fn create_record<R: ResourceKind>(
        &self,
        user_id: &str,
        resource: R,
        annotations: Vec<String>,
    ) -> CoreResult<Record<R>> {
        let resource = resource.into_resource();
        let annotations = validate_annotations(&annotations)?;
        self.check_data_restrictions(&resource)?;

        let data_key = self.generate_key(KeyType::Data)?;
        let tags = self.tagging.tags_for(&resource);
        let payloads = extract_upload_data(&resource);
        let record = DecryptedRecord::new(
            resource,
            tags,
            annotations,
            Utc::now().date_naive(),
            data_key,
        );

        let record = remove_upload_data(self.upload_data(record, user_id).await?);
        let sent_resource = record.resource.clone();

        let codec = self.tag_codec().await?;
        let encrypted = self.encrypt_record(&record, &codec).await?;
        let created = self
            .records
            .create_record(self.alias(), user_id, encrypted)
            .await
            .map_err(CoreError::Transport)?;
        let decrypted = self.decrypt_record(created, &codec).await?;

        let family = R::FAMILY;
        tracing::info!(record_id = ?decrypted.id, %family, "record created");
        restore_upload_data(decrypted, sent_resource, payloads.as_ref()).into_record()
    }

    /// Fetch one record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ResourceFamilyMismatch`] if the stored record is not of family `R`.
    pub async fn fetch_record<R: ResourceKind>(
        &self,
        user_id: &str,
        record_id: &str,
    ) -> CoreResult<Record<R>> {
        let codec = self.tag_codec().await?;
        let encrypted = self
            .records
            .fetch_record(self.alias(), user_id, record_id)
            .await
            .map_err(CoreError::Transport)?;
        self.decrypt_record(encrypted, &codec).await?.into_record()
    }

    /// Search records of family `R`.
    pub async fn fetch_records<R: ResourceKind>(
        &self,
        user_id: &str,
        query: &RecordQuery,
    ) -> CoreResult<Vec<Record<R>>> {
        let codec = self.tag_codec().await?;
        let search = self.search_query::<R>(&codec, query)?;
        let found = self
            .records
            .search_records(self.alias(), user_id, &search)
            .await
            .map_err(CoreError::Transport)?;

        tracing::debug!(count = found.len(), "records found");
        let mut records = Vec::with_capacity(found.len());
        for encrypted in found {
            records.push(self.decrypt_record(encrypted, &codec).await?.into_record()?);
        }
        Ok(records)
    }

    /// Count records of family `R`; paging fields of `query` are ignored.
    pub async fn count_records<R: ResourceKind>(
        &self,
        user_id: &str,
        query: &RecordQuery,
    ) -> CoreResult<usize> {
        let codec = self.tag_codec().await?;
        let search = self.search_query::<R>(&codec, query)?;
        self.records
            .count_records(self.alias(), user_id, &search)
            .await
            .map_err(CoreError::Transport)
    }

    fn search_query<R: ResourceKind>(
        &self,
        codec: &crate::tags::TagCodec<'_>,
        query: &RecordQuery,
    ) -> CoreResult<SearchQuery> {
        let annotations = validate_annotations(&query.annotations)?;
        let tags = TaggingService::search_tags(R::FAMILY, query.resource_type.as_deref());
        Ok(SearchQuery {
            tag_groups: codec.build_search_tag_groups(&tags, &annotations)?,
            start_date: query.start_date,
            end_date: query.end_date,
            limit: query.page_size,
            offset: query.offset,
        })
    }

    /// Replace the resource and annotations of a stored record.
    ///
    /// Stored tags are kept except the ones derived from the resource, which are recomputed.
    /// Attachments whose id and hash match the stored version are not uploaded again.
    /// Additional identifiers of attachments that are gone are dropped, unless the resource no
    /// longer holds any attachment at all, in which case its identifiers are kept as sent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedOperation`] when updating between opaque data and FHIR,
    /// [`CoreError::ResourceFamilyMismatch`] between FHIR releases, and the attachment
    /// validation errors of [`RecordService::create_record`].
    pub async fn update_record<R: ResourceKind>(
        &self,
        user_id: &str,
        record_id: &str,
        resource: R,
        annotations: Vec<String>,
    ) -> CoreResult<Record<R>> {
        let resource = resource.into_resource();
        let annotations = validate_annotations(&annotations)?;
        self.check_data_restrictions(&resource)?;

        let codec = self.tag_codec().await?;
        let stored = self
            .records
            .fetch_record(self.alias(), user_id, record_id)
            .await
            .map_err(CoreError::Transport)?;
        let stored = self.decrypt_record(stored, &codec).await?;
        ensure_same_family(stored.resource.family(), resource.family())?;

        let payloads = extract_upload_data(&resource);
        let mut record = self.update_data(stored, resource, user_id).await?;
        clean_obsolete_additional_identifiers(&mut record.resource)?;
        record
            .tags
            .extend(TaggingService::resource_tags(&record.resource));
        record.annotations = annotations;
        record.update_date = Some(Utc::now());

        let record = remove_upload_data(record);
        let sent_resource = record.resource.clone();
        let encrypted = self.encrypt_record(&record, &codec).await?;
        let updated = self
            .records
            .update_record(self.alias(), user_id, record_id, encrypted)
            .await
            .map_err(CoreError::Transport)?;
        let decrypted = self.decrypt_record(updated, &codec).await?;

        tracing::info!(record_id, "record updated");
        restore_upload_data(decrypted, sent_resource, payloads.as_ref()).into_record()
    }

    pub async fn delete_record(&self, user_id: &str, record_id: &str) -> CoreResult<()> {
        self.records
            .delete_record(self.alias(), user_id, record_id)
            .await
            .map_err(CoreError::Transport)?;
        tracing::info!(record_id, "record deleted");
        Ok(())
    }

    /// Fetch a record with the payloads of all its attachments.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IdUsageViolation`] if a stored attachment has no id and
    /// [`CoreError::MissingAttachmentKey`] if the record has attachments but no key.
    pub async fn download_record<R: ResourceKind>(
        &self,
        user_id: &str,
        record_id: &str,
        download_type: DownloadType,
    ) -> CoreResult<Record<R>> {
        let codec = self.tag_codec().await?;
        let encrypted = self
            .records
            .fetch_record(self.alias(), user_id, record_id)
            .await
            .map_err(CoreError::Transport)?;
        let record = self.decrypt_record(encrypted, &codec).await?;
        self.download_data(record, user_id, download_type)
            .await?
            .into_record()
    }
}

fn ensure_same_family(stored: ResourceFamily, updated: ResourceFamily) -> CoreResult<()> {
    match (stored, updated) {
        (a, b) if a == b => Ok(()),
        (ResourceFamily::Data, _) | (_, ResourceFamily::Data) => Err(
            CoreError::UnsupportedOperation(format!("cannot update a {stored} record with {updated}")),
        ),
        _ => Err(CoreError::ResourceFamilyMismatch {
            expected: stored,
            actual: updated,
        }),
    }
}

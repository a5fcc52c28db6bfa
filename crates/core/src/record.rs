//! Decrypted records and the caller-facing [`Record`].

use crate::constants::MODEL_VERSION;
use crate::keys::{AttachmentKeyCell, GcKey};
use crate::resource::{Resource, ResourceKind};
use crate::tags::Tags;
use crate::{CoreError, CoreResult};
use chrono::{DateTime, NaiveDate, Utc};
use hc_types::Annotation;

/// A record after decryption, with its keys.
#[derive(Clone, Debug)]
pub struct DecryptedRecord {
    pub id: Option<String>,
    pub resource: Resource,
    pub tags: Tags,
    pub annotations: Vec<Annotation>,
    pub creation_date: NaiveDate,
    pub update_date: Option<DateTime<Utc>>,
    pub data_key: GcKey,
    pub attachment_key: AttachmentKeyCell,
    pub model_version: u32,
}

impl DecryptedRecord {
    /// A record that has not been stored yet.
    pub fn new(
        resource: Resource,
        tags: Tags,
        annotations: Vec<Annotation>,
        creation_date: NaiveDate,
        data_key: GcKey,
    ) -> Self {
        Self {
            id: None,
            resource,
            tags,
            annotations,
            creation_date,
            update_date: None,
            data_key,
            attachment_key: AttachmentKeyCell::new(),
            model_version: MODEL_VERSION,
        }
    }

    /// Convert into the caller-facing record of family `R`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ResourceFamilyMismatch`] if the resource is not of family `R`, and
    /// [`CoreError::ExpectedFieldViolation`] if the record was never stored.
    pub fn into_record<R: ResourceKind>(self) -> CoreResult<Record<R>> {
        let id = self
            .id
            .ok_or_else(|| CoreError::ExpectedFieldViolation("Record.id expected".into()))?;
        Ok(Record {
            id,
            resource: R::try_from_resource(self.resource)?,
            annotations: self
                .annotations
                .into_iter()
                .map(|a| a.as_str().to_owned())
                .collect(),
            meta: Meta {
                created_date: self.creation_date,
                updated_date: self.update_date,
            },
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Meta {
    pub created_date: NaiveDate,
    pub updated_date: Option<DateTime<Utc>>,
}

/// A stored record as returned to applications.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record<R> {
    pub id: String,
    pub resource: R,
    pub annotations: Vec<String>,
    pub meta: Meta,
}

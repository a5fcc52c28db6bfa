//! Additional attachment identifiers.
//!
//! When the attachment store produces downscaled variants of an image, their server ids are
//! recorded as a resource identifier whose value is
//!
//! ```text
//! d4l_f_p_t#<attachmentId>#<previewId>#<thumbnailId>
//! ```
//!
//! and whose assigner is the partner id of the client. Identifiers without the marker belong to
//! the application and are never touched.
//!
//! Variant ids only ever appear on read: a download of a preview or thumbnail sends
//! `<attachmentId>#<variantId>` to the attachment store. Stored attachments always carry the
//! bare attachment id.

use crate::capability;
use crate::constants::{
    ATTACHMENT_ID_SPLIT_CHAR, DOWNSCALED_ATTACHMENT_IDS_FMT, DOWNSCALED_ATTACHMENT_ID_PARTS,
};
use crate::resource::Resource;
use crate::{CoreError, CoreResult};
use fhir::{Attachment, Identifier};

const PREVIEW_ID_POS: usize = 2;
const THUMBNAIL_ID_POS: usize = 3;

/// Which rendition of an attachment to download.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DownloadType {
    #[default]
    Full,
    Medium,
    Small,
}

impl DownloadType {
    fn variant_position(self) -> Option<usize> {
        match self {
            DownloadType::Full => None,
            DownloadType::Medium => Some(PREVIEW_ID_POS),
            DownloadType::Small => Some(THUMBNAIL_ID_POS),
        }
    }
}

/// Split an additional attachment identifier value into its four parts.
///
/// Returns `Ok(None)` for values that are absent or do not carry the marker.
///
/// # Errors
///
/// Returns [`CoreError::IdUsageViolation`] carrying the raw value when it carries the marker
/// but does not have exactly four parts.
pub fn split_additional_attachment_id(value: Option<&str>) -> CoreResult<Option<Vec<String>>> {
    let Some(value) = value else {
        return Ok(None);
    };
    if !value.starts_with(DOWNSCALED_ATTACHMENT_IDS_FMT) {
        return Ok(None);
    }

    let parts: Vec<String> = value
        .split(ATTACHMENT_ID_SPLIT_CHAR)
        .map(str::to_owned)
        .collect();
    if parts.len() != DOWNSCALED_ATTACHMENT_ID_PARTS {
        return Err(CoreError::IdUsageViolation(value.to_owned()));
    }
    Ok(Some(parts))
}

/// Parts of the additional identifier that belongs to `attachment_id`, if any.
pub fn extract_additional_attachment_ids(
    identifiers: &[Identifier],
    attachment_id: &str,
) -> CoreResult<Option<Vec<String>>> {
    for identifier in identifiers {
        if let Some(parts) = split_additional_attachment_id(identifier.value.as_deref())? {
            if parts[1] == attachment_id {
                return Ok(Some(parts));
            }
        }
    }
    Ok(None)
}

/// Point each attachment id at the rendition selected by `download_type`.
///
/// Attachments without a recorded variant keep their id and are downloaded in full.
pub fn set_attachment_id_for_download_type(
    attachments: &mut [Attachment],
    identifiers: &[Identifier],
    download_type: DownloadType,
) -> CoreResult<()> {
    let Some(position) = download_type.variant_position() else {
        return Ok(());
    };

    for attachment in attachments.iter_mut() {
        let Some(id) = attachment.id.as_deref() else {
            continue;
        };
        if let Some(parts) = extract_additional_attachment_ids(identifiers, id)? {
            let variant_id = format!("{id}{ATTACHMENT_ID_SPLIT_CHAR}{}", parts[position]);
            attachment.id = Some(variant_id);
        }
    }
    Ok(())
}

/// Attachment id without a variant suffix.
pub fn primary_attachment_id(id: &str) -> &str {
    id.split(ATTACHMENT_ID_SPLIT_CHAR).next().unwrap_or(id)
}

/// Drop additional identifiers whose attachment is no longer part of the resource.
///
/// Identifiers without the marker are kept untouched. Resources without attachment slots, or
/// whose slots are all empty, are left as they are.
pub fn clean_obsolete_additional_identifiers(resource: &mut Resource) -> CoreResult<()> {
    let Some(attachments) = capability::attachments(resource) else {
        return Ok(());
    };
    let attachments: Vec<&Attachment> = attachments.into_iter().flatten().collect();
    if attachments.is_empty() {
        return Ok(());
    }
    let Some(identifiers) = capability::identifiers(resource) else {
        return Ok(());
    };
    let attachment_ids: Vec<&str> = attachments
        .iter()
        .filter_map(|a| a.id.as_deref())
        .collect();

    let mut kept = Vec::with_capacity(identifiers.len());
    for identifier in identifiers {
        match split_additional_attachment_id(identifier.value.as_deref())? {
            Some(parts) if !attachment_ids.contains(&parts[1].as_str()) => {}
            _ => kept.push(identifier.clone()),
        }
    }

    if kept.len() != identifiers.len() {
        tracing::debug!(
            removed = identifiers.len() - kept.len(),
            "dropping obsolete attachment identifiers"
        );
        capability::set_identifiers(resource, kept);
    }
    Ok(())
}

/// Build the additional identifier for an uploaded attachment.
///
/// # Errors
///
/// Returns [`CoreError::IdUsageViolation`] unless exactly two downscaled ids (preview,
/// thumbnail) are supplied.
pub fn additional_identifier(
    attachment_id: &str,
    downscaled_ids: &[String],
    partner_id: &str,
) -> CoreResult<Identifier> {
    let [preview_id, thumbnail_id] = downscaled_ids else {
        return Err(CoreError::IdUsageViolation(format!(
            "expected 2 downscaled ids for attachment {attachment_id}, got {}",
            downscaled_ids.len()
        )));
    };
    let value = format!(
        "{DOWNSCALED_ATTACHMENT_IDS_FMT}{sep}{attachment_id}{sep}{preview_id}{sep}{thumbnail_id}",
        sep = ATTACHMENT_ID_SPLIT_CHAR
    );
    Ok(Identifier::assigned(value, partner_id))
}

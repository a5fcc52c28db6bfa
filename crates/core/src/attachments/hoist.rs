//! Moving attachment payloads out of a resource and back.
//!
//! Payloads are uploaded separately and must never end up inside the encrypted resource body.
//! Before encryption the payloads are captured with [`extract_upload_data`] and stripped with
//! [`remove_upload_data`]; once the stored record has been decrypted again,
//! [`restore_upload_data`] puts the resource as sent back into the record, payloads included.
//!
//! Attachments are identified by their slot position, which is stable for a given resource
//! value and does not depend on attachment contents.

use crate::capability;
use crate::record::DecryptedRecord;
use crate::resource::Resource;
use std::collections::BTreeMap;

/// Slot position of an attachment within one resource value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttachmentRef(usize);

impl AttachmentRef {
    pub fn slot(self) -> usize {
        self.0
    }
}

/// Captured payloads by slot.
pub type UploadData = BTreeMap<AttachmentRef, String>;

/// Capture the payload of every attachment that carries one. The resource is left untouched.
///
/// Returns `None` for resources without attachment capability or without any payload.
pub fn extract_upload_data(resource: &Resource) -> Option<UploadData> {
    let data: UploadData = capability::attachments(resource)?
        .into_iter()
        .enumerate()
        .filter_map(|(slot, attachment)| {
            let data = attachment?.data.clone()?;
            Some((AttachmentRef(slot), data))
        })
        .collect();
    (!data.is_empty()).then_some(data)
}

/// Clear the payload of every attachment.
pub fn remove_upload_data(mut record: DecryptedRecord) -> DecryptedRecord {
    strip_payloads(&mut record.resource);
    record
}

fn strip_payloads(resource: &mut Resource) {
    if let Some(slots) = capability::attachments_mut(resource) {
        for attachment in slots.into_iter().flatten() {
            attachment.data = None;
        }
    }
}

/// Replace the record's resource with `original` and write captured payloads back into it.
///
/// `original` must be the resource the payloads were extracted from, or one derived from it
/// without reordering its attachment slots.
pub fn restore_upload_data(
    mut record: DecryptedRecord,
    original: Resource,
    payloads: Option<&UploadData>,
) -> DecryptedRecord {
    record.resource = original;
    let Some(payloads) = payloads else {
        return record;
    };

    if let Some(slots) = capability::attachments_mut(&mut record.resource) {
        for (slot, attachment) in slots.into_iter().enumerate() {
            if let (Some(attachment), Some(data)) =
                (attachment, payloads.get(&AttachmentRef(slot)))
            {
                attachment.data = Some(data.clone());
            }
        }
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{GcKey, KeyType};
    use crate::resource::{DataResource, Fhir3Resource};
    use crate::tags::Tags;
    use chrono::NaiveDate;
    use fhir::{Attachment, DocumentReference, DocumentReferenceContent, FhirResource};

    fn attachment(data: Option<&str>) -> Attachment {
        Attachment {
            data: data.map(str::to_owned),
            hash: Some("aGFzaA==".into()),
            ..Default::default()
        }
    }

    fn document(slots: Vec<Option<Attachment>>) -> Resource {
        Resource::Fhir3(Fhir3Resource(FhirResource::DocumentReference(
            DocumentReference {
                content: slots
                    .into_iter()
                    .map(DocumentReferenceContent::new)
                    .collect(),
                ..Default::default()
            },
        )))
    }

    fn record(resource: Resource) -> DecryptedRecord {
        DecryptedRecord::new(
            resource,
            Tags::new(),
            Vec::new(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            GcKey::new(KeyType::Data, b"k".to_vec()),
        )
    }

    fn payloads_of(resource: &Resource) -> Vec<Option<String>> {
        capability::attachments(resource)
            .unwrap()
            .into_iter()
            .map(|a| a.and_then(|a| a.data.clone()))
            .collect()
    }

    #[test]
    fn extract_captures_payload_bearing_slots_only() {
        let resource = document(vec![
            Some(attachment(Some("AAAA"))),
            None,
            Some(attachment(None)),
            Some(attachment(Some("BBBB"))),
        ]);
        let data = extract_upload_data(&resource).unwrap();

        assert_eq!(data.len(), 2);
        assert_eq!(data.get(&AttachmentRef(0)).map(String::as_str), Some("AAAA"));
        assert_eq!(data.get(&AttachmentRef(3)).map(String::as_str), Some("BBBB"));
        assert_eq!(
            payloads_of(&resource)[0].as_deref(),
            Some("AAAA"),
            "extraction leaves the resource untouched"
        );
    }

    #[test]
    fn extract_is_none_without_payloads() {
        assert!(extract_upload_data(&document(vec![])).is_none());
        assert!(extract_upload_data(&document(vec![None, Some(attachment(None))])).is_none());
        assert!(extract_upload_data(&Resource::Data(DataResource(vec![1]))).is_none());
    }

    #[test]
    fn remove_clears_every_payload() {
        let resource = document(vec![Some(attachment(Some("AAAA"))), None]);
        let stripped = remove_upload_data(record(resource));
        assert_eq!(payloads_of(&stripped.resource), vec![None, None]);
    }

    #[test]
    fn remove_passes_incapable_resources_through() {
        let data = Resource::Data(DataResource(b"opaque".to_vec()));
        assert_eq!(remove_upload_data(record(data.clone())).resource, data);
    }

    #[test]
    fn extract_then_restore_round_trips() {
        let resource = document(vec![
            Some(attachment(Some("AAAA"))),
            None,
            Some(attachment(Some("BBBB"))),
        ]);
        let payloads = extract_upload_data(&resource);
        let stripped = remove_upload_data(record(resource.clone()));
        let sent = stripped.resource.clone();

        let restored = restore_upload_data(stripped, sent, payloads.as_ref());
        assert_eq!(restored.resource, resource);
    }

    #[test]
    fn identical_attachments_restore_by_position() {
        let resource = document(vec![
            Some(attachment(Some("SAME"))),
            Some(attachment(Some("SAME"))),
        ]);
        let payloads = extract_upload_data(&resource);
        let stripped = remove_upload_data(record(resource.clone()));
        let sent = stripped.resource.clone();

        let restored = restore_upload_data(stripped, sent, payloads.as_ref());
        assert_eq!(
            payloads_of(&restored.resource),
            vec![Some("SAME".to_string()), Some("SAME".to_string())]
        );
    }

    #[test]
    fn restore_without_payloads_only_swaps_resource() {
        let stripped = remove_upload_data(record(document(vec![Some(attachment(Some("AAAA")))])));
        let original = document(vec![Some(attachment(None)), None]);

        let restored = restore_upload_data(stripped, original.clone(), None);
        assert_eq!(restored.resource, original);
    }
}

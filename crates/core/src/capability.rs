//! Resource capability adapter.
//!
//! Uniform access to the attachments and identifiers of a [`Resource`], whatever its family
//! and shape. Opaque data and FHIR shapes without attachment slots report no capability
//! (`None`/`false`) instead of failing, so callers can treat every resource the same way.

use crate::resource::Resource;
use fhir::{Attachment, Identifier};

/// `true` only for shapes that embed attachment slots.
pub fn has_attachments(resource: &Resource) -> bool {
    resource
        .as_fhir()
        .is_some_and(|r| r.attachment_holder().is_some())
}

/// Attachment slots in document order; `None` when the shape has no slots.
pub fn attachments(resource: &Resource) -> Option<Vec<Option<&Attachment>>> {
    resource
        .as_fhir()?
        .attachment_holder()
        .map(|holder| holder.attachments())
}

/// Mutable attachment slots, same order as [`attachments`].
pub fn attachments_mut(resource: &mut Resource) -> Option<Vec<Option<&mut Attachment>>> {
    resource
        .as_fhir_mut()?
        .attachment_holder_mut()
        .map(|holder| holder.attachments_mut())
}

/// Replace the attachments positionally; a no-op for shapes without slots.
pub fn set_attachments(resource: &mut Resource, attachments: Vec<Option<Attachment>>) {
    if let Some(holder) = resource
        .as_fhir_mut()
        .and_then(|r| r.attachment_holder_mut())
    {
        holder.set_attachments(attachments);
    }
}

/// Identifiers of a FHIR resource; `None` for opaque data.
pub fn identifiers(resource: &Resource) -> Option<&[Identifier]> {
    resource.as_fhir().map(|r| r.identifiers())
}

/// Replace the identifiers of a FHIR resource; a no-op for opaque data.
pub fn set_identifiers(resource: &mut Resource, identifiers: Vec<Identifier>) {
    if let Some(r) = resource.as_fhir_mut() {
        r.set_identifiers(identifiers);
    }
}

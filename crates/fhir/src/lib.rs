//! FHIR-shaped resource model for the encrypted record SDK.
//!
//! This crate provides a deliberately small **wire model** of the FHIR resources the record
//! core needs to look inside:
//! - the resource shapes that embed binary attachments (documents, photos, observations,
//!   media, reports, questionnaires and their responses),
//! - the shared data types (`Attachment`, `Identifier`, `Reference`),
//! - the [`AttachmentHolder`] capability, implemented once per shape.
//!
//! FHIR grammar validation is out of scope. Fields the core does not use are not modelled but
//! are carried through a parse/render round trip unchanged, and resource types without a
//! modelled shape are kept as raw JSON.
//!
//! Unlike the record core, this crate is version-agnostic: STU3 and R4 resources share one
//! model, and the version is carried by the caller as [`FhirVersion`].

pub mod attachments;
pub mod data_types;
pub mod resources;

// Re-export the capability trait
pub use attachments::AttachmentHolder;

// Re-export public data types
pub use data_types::{
    Attachment, CodeableConcept, FhirVersion, Identifier, IdentifierList, Reference,
};

// Re-export resource shapes
pub use resources::{
    CarePlan, DiagnosticReport, DocumentReference, DocumentReferenceContent, FhirResource, Media,
    Observation, ObservationComponent, Patient, Questionnaire, QuestionnaireItem,
    QuestionnaireItemInitial, QuestionnaireResponse, QuestionnaireResponseAnswer,
    QuestionnaireResponseItem,
};

/// Errors returned by the `fhir` crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;

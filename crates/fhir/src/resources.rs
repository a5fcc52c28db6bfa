//! FHIR resource shapes and the [`FhirResource`] tagged union.
//!
//! Responsibilities:
//! - Define the wire structs for every resource shape the record core handles
//! - Provide JSON parse/render helpers with path-aware error reporting
//! - Dispatch identifier and attachment access by exhaustive match
//!
//! Notes:
//! - Unmodelled JSON fields are carried in `extra` and rendered back unchanged; the SDK is not a
//!   FHIR validator
//! - Resource types without a modelled shape are kept as raw JSON in [`FhirResource::Other`]
//! - `CarePlan` is the representative modelled shape without attachment slots

use crate::attachments::AttachmentHolder;
use crate::data_types::{Attachment, CodeableConcept, Identifier, IdentifierList};
use crate::{FhirError, FhirResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

// ============================================================================
// Resource shapes
// ============================================================================

/// A reference to a document of any kind.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<DocumentReferenceContent>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One content entry of a [`DocumentReference`].
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReferenceContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DocumentReferenceContent {
    pub fn new(attachment: Option<Attachment>) -> Self {
        Self {
            attachment,
            ..Default::default()
        }
    }
}

/// Demographics about a patient; attachments live in `photo`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photo: Vec<Attachment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Measurement or assertion; attachments in the value and in each component value.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_attachment: Option<Attachment>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub component: Vec<ObservationComponent>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObservationComponent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_attachment: Option<Attachment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Photo, video or audio recording (STU3 Media).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Attachment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Diagnostic report with its rendered forms.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub presented_form: Vec<Attachment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A structured set of questions.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Questionnaire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item: Vec<QuestionnaireItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A question or group; carries both the STU3 and the R4 initial value layout.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// STU3 layout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_attachment: Option<Attachment>,

    /// R4 layout.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub initial: Vec<QuestionnaireItemInitial>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item: Vec<QuestionnaireItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireItemInitial {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_attachment: Option<Attachment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A structured set of answers.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// STU3 declares a single identifier, R4 a list.
    #[serde(default, skip_serializing_if = "IdentifierList::is_empty")]
    pub identifier: IdentifierList,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item: Vec<QuestionnaireResponseItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireResponseItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub answer: Vec<QuestionnaireResponseAnswer>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item: Vec<QuestionnaireResponseItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireResponseAnswer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_attachment: Option<Attachment>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item: Vec<QuestionnaireResponseItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Care plan; has identifiers but no attachment slots.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CarePlan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Tagged union
// ============================================================================

/// Every FHIR resource shape the SDK understands, tagged by `resourceType`.
///
/// Resource types without a modelled shape are kept as raw JSON in `Other`. They have no
/// attachment capability and their identifiers are neither read nor written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FhirResource {
    DocumentReference(DocumentReference),
    Patient(Patient),
    Observation(Observation),
    Media(Media),
    DiagnosticReport(DiagnosticReport),
    Questionnaire(Questionnaire),
    QuestionnaireResponse(QuestionnaireResponse),
    CarePlan(CarePlan),
    Other(Value),
}

const MODELLED_TYPES: [&str; 8] = [
    "DocumentReference",
    "Patient",
    "Observation",
    "Media",
    "DiagnosticReport",
    "Questionnaire",
    "QuestionnaireResponse",
    "CarePlan",
];

#[derive(Deserialize)]
#[serde(tag = "resourceType")]
enum ModelledResource {
    DocumentReference(DocumentReference),
    Patient(Patient),
    Observation(Observation),
    Media(Media),
    DiagnosticReport(DiagnosticReport),
    Questionnaire(Questionnaire),
    QuestionnaireResponse(QuestionnaireResponse),
    CarePlan(CarePlan),
}

#[derive(Serialize)]
#[serde(tag = "resourceType")]
enum ModelledResourceRef<'a> {
    DocumentReference(&'a DocumentReference),
    Patient(&'a Patient),
    Observation(&'a Observation),
    Media(&'a Media),
    DiagnosticReport(&'a DiagnosticReport),
    Questionnaire(&'a Questionnaire),
    QuestionnaireResponse(&'a QuestionnaireResponse),
    CarePlan(&'a CarePlan),
}

impl From<ModelledResource> for FhirResource {
    fn from(resource: ModelledResource) -> Self {
        match resource {
            ModelledResource::DocumentReference(r) => FhirResource::DocumentReference(r),
            ModelledResource::Patient(r) => FhirResource::Patient(r),
            ModelledResource::Observation(r) => FhirResource::Observation(r),
            ModelledResource::Media(r) => FhirResource::Media(r),
            ModelledResource::DiagnosticReport(r) => FhirResource::DiagnosticReport(r),
            ModelledResource::Questionnaire(r) => FhirResource::Questionnaire(r),
            ModelledResource::QuestionnaireResponse(r) => FhirResource::QuestionnaireResponse(r),
            ModelledResource::CarePlan(r) => FhirResource::CarePlan(r),
        }
    }
}

impl Serialize for FhirResource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let modelled = match self {
            FhirResource::DocumentReference(r) => ModelledResourceRef::DocumentReference(r),
            FhirResource::Patient(r) => ModelledResourceRef::Patient(r),
            FhirResource::Observation(r) => ModelledResourceRef::Observation(r),
            FhirResource::Media(r) => ModelledResourceRef::Media(r),
            FhirResource::DiagnosticReport(r) => ModelledResourceRef::DiagnosticReport(r),
            FhirResource::Questionnaire(r) => ModelledResourceRef::Questionnaire(r),
            FhirResource::QuestionnaireResponse(r) => {
                ModelledResourceRef::QuestionnaireResponse(r)
            }
            FhirResource::CarePlan(r) => ModelledResourceRef::CarePlan(r),
            FhirResource::Other(value) => return value.serialize(serializer),
        };
        modelled.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FhirResource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

fn translation_error(err: serde_path_to_error::Error<serde_json::Error>) -> FhirError {
    let path = err.path().to_string();
    let source = err.into_inner();
    let path = if path.is_empty() || path == "." {
        "<root>"
    } else {
        path.as_str()
    };
    FhirError::Translation(format!("resource schema mismatch at {path}: {source}"))
}

impl FhirResource {
    /// Parse a resource from JSON bytes.
    ///
    /// This uses `serde_path_to_error` to surface the path (e.g. `content.0.attachment.size`)
    /// of the failing field.
    ///
    /// # Errors
    ///
    /// Returns `FhirError` if:
    /// - the bytes are not JSON
    /// - `resourceType` is missing or not a string
    /// - a modelled resource type does not match its shape
    pub fn parse_json(bytes: &[u8]) -> FhirResult<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    fn from_value(value: Value) -> FhirResult<Self> {
        let Some(resource_type) = value.get("resourceType").and_then(Value::as_str) else {
            return Err(FhirError::Translation(
                "resource schema mismatch at <root>: missing string field `resourceType`".into(),
            ));
        };
        if !MODELLED_TYPES.contains(&resource_type) {
            return Ok(FhirResource::Other(value));
        }
        serde_path_to_error::deserialize::<_, ModelledResource>(value)
            .map(FhirResource::from)
            .map_err(translation_error)
    }

    /// Render the resource as JSON bytes.
    pub fn render_json(&self) -> FhirResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(FhirError::from)
    }

    /// The FHIR `resourceType` of this resource.
    pub fn resource_type(&self) -> &str {
        match self {
            FhirResource::DocumentReference(_) => "DocumentReference",
            FhirResource::Patient(_) => "Patient",
            FhirResource::Observation(_) => "Observation",
            FhirResource::Media(_) => "Media",
            FhirResource::DiagnosticReport(_) => "DiagnosticReport",
            FhirResource::Questionnaire(_) => "Questionnaire",
            FhirResource::QuestionnaireResponse(_) => "QuestionnaireResponse",
            FhirResource::CarePlan(_) => "CarePlan",
            FhirResource::Other(value) => value
                .get("resourceType")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            FhirResource::DocumentReference(r) => r.id.as_deref(),
            FhirResource::Patient(r) => r.id.as_deref(),
            FhirResource::Observation(r) => r.id.as_deref(),
            FhirResource::Media(r) => r.id.as_deref(),
            FhirResource::DiagnosticReport(r) => r.id.as_deref(),
            FhirResource::Questionnaire(r) => r.id.as_deref(),
            FhirResource::QuestionnaireResponse(r) => r.id.as_deref(),
            FhirResource::CarePlan(r) => r.id.as_deref(),
            FhirResource::Other(value) => value.get("id").and_then(Value::as_str),
        }
    }

    /// Identifiers of a modelled shape; always empty for [`FhirResource::Other`].
    pub fn identifiers(&self) -> &[Identifier] {
        match self {
            FhirResource::DocumentReference(r) => &r.identifier,
            FhirResource::Patient(r) => &r.identifier,
            FhirResource::Observation(r) => &r.identifier,
            FhirResource::Media(r) => &r.identifier,
            FhirResource::DiagnosticReport(r) => &r.identifier,
            FhirResource::Questionnaire(r) => &r.identifier,
            FhirResource::QuestionnaireResponse(r) => r.identifier.as_slice(),
            FhirResource::CarePlan(r) => &r.identifier,
            FhirResource::Other(_) => &[],
        }
    }

    /// Replace the identifiers of a modelled shape; a no-op for [`FhirResource::Other`].
    pub fn set_identifiers(&mut self, identifiers: Vec<Identifier>) {
        let slot = match self {
            FhirResource::DocumentReference(r) => &mut r.identifier,
            FhirResource::Patient(r) => &mut r.identifier,
            FhirResource::Observation(r) => &mut r.identifier,
            FhirResource::Media(r) => &mut r.identifier,
            FhirResource::DiagnosticReport(r) => &mut r.identifier,
            FhirResource::Questionnaire(r) => &mut r.identifier,
            FhirResource::QuestionnaireResponse(r) => return r.identifier.replace(identifiers),
            FhirResource::CarePlan(r) => &mut r.identifier,
            FhirResource::Other(_) => return,
        };
        *slot = identifiers;
    }

    /// The attachment capability of this shape, `None` for shapes without attachment slots.
    pub fn attachment_holder(&self) -> Option<&dyn AttachmentHolder> {
        let holder: &dyn AttachmentHolder = match self {
            FhirResource::DocumentReference(r) => r,
            FhirResource::Patient(r) => r,
            FhirResource::Observation(r) => r,
            FhirResource::Media(r) => r,
            FhirResource::DiagnosticReport(r) => r,
            FhirResource::Questionnaire(r) => r,
            FhirResource::QuestionnaireResponse(r) => r,
            FhirResource::CarePlan(_) | FhirResource::Other(_) => return None,
        };
        Some(holder)
    }

    pub fn attachment_holder_mut(&mut self) -> Option<&mut dyn AttachmentHolder> {
        let holder: &mut dyn AttachmentHolder = match self {
            FhirResource::DocumentReference(r) => r,
            FhirResource::Patient(r) => r,
            FhirResource::Observation(r) => r,
            FhirResource::Media(r) => r,
            FhirResource::DiagnosticReport(r) => r,
            FhirResource::Questionnaire(r) => r,
            FhirResource::QuestionnaireResponse(r) => r,
            FhirResource::CarePlan(_) | FhirResource::Other(_) => return None,
        };
        Some(holder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_document_reference_with_attachment() {
        let input = br#"{
            "resourceType": "DocumentReference",
            "id": "doc-1",
            "status": "current",
            "content": [
                {"attachment": {"contentType": "application/pdf", "id": "att-1", "size": 12}}
            ]
        }"#;

        let resource = FhirResource::parse_json(input).expect("parse document reference");
        assert_eq!(resource.resource_type(), "DocumentReference");
        assert_eq!(resource.id(), Some("doc-1"));

        let FhirResource::DocumentReference(doc) = resource else {
            panic!("expected DocumentReference");
        };
        let attachment = doc.content[0].attachment.as_ref().unwrap();
        assert_eq!(attachment.id.as_deref(), Some("att-1"));
        assert_eq!(attachment.size, Some(12));
    }

    #[test]
    fn render_then_parse_preserves_resource() {
        let resource = FhirResource::Observation(Observation {
            id: Some("obs-1".into()),
            status: Some("final".into()),
            value_attachment: Some(Attachment {
                id: Some("a".into()),
                ..Default::default()
            }),
            ..Default::default()
        });

        let bytes = resource.render_json().expect("render");
        let reparsed = FhirResource::parse_json(&bytes).expect("reparse");
        assert_eq!(reparsed, resource);
    }

    #[test]
    fn render_writes_resource_type_tag() {
        let resource = FhirResource::CarePlan(CarePlan::default());
        let json = String::from_utf8(resource.render_json().unwrap()).unwrap();
        assert_eq!(json, r#"{"resourceType":"CarePlan"}"#);
    }

    #[test]
    fn unmodelled_resource_type_is_kept_as_json() {
        let input = br#"{"resourceType":"Medication","id":"med-1","identifier":[{"value":"x"}]}"#;
        let resource = FhirResource::parse_json(input).expect("parse medication");

        assert!(matches!(resource, FhirResource::Other(_)));
        assert_eq!(resource.resource_type(), "Medication");
        assert_eq!(resource.id(), Some("med-1"));
        assert!(resource.identifiers().is_empty());
        assert!(resource.attachment_holder().is_none());

        let rendered: Value = serde_json::from_slice(&resource.render_json().unwrap()).unwrap();
        assert_eq!(rendered, serde_json::from_slice::<Value>(input).unwrap());
    }

    #[test]
    fn parse_requires_resource_type() {
        let err = FhirResource::parse_json(br#"{"id": "x"}"#).expect_err("no resource type");
        assert!(matches!(err, FhirError::Translation(_)));

        let err = FhirResource::parse_json(b"not json").expect_err("not json");
        assert!(matches!(err, FhirError::InvalidJson(_)));
    }

    #[test]
    fn unmodelled_fields_survive_a_round_trip() {
        let input = br#"{
            "resourceType": "DocumentReference",
            "subject": {"reference": "Patient/1"},
            "type": {"coding": [{"code": "11502-2"}]},
            "date": "2024-01-01",
            "content": [{"attachment": {"id": "a", "extension": [{"url": "x"}]}, "format": {"code": "f"}}]
        }"#;

        let resource = FhirResource::parse_json(input).expect("parse");
        let rendered: Value = serde_json::from_slice(&resource.render_json().unwrap()).unwrap();
        assert_eq!(rendered, serde_json::from_slice::<Value>(input).unwrap());
    }

    #[test]
    fn stu3_questionnaire_response_keeps_single_identifier() {
        let input = br#"{"resourceType":"QuestionnaireResponse","identifier":{"value":"x"},"status":"completed"}"#;
        let resource = FhirResource::parse_json(input).expect("parse questionnaire response");
        assert_eq!(resource.identifiers()[0].value.as_deref(), Some("x"));

        let rendered: Value = serde_json::from_slice(&resource.render_json().unwrap()).unwrap();
        assert_eq!(rendered["identifier"], serde_json::json!({"value": "x"}));
    }

    #[test]
    fn other_resource_ignores_identifier_updates() {
        let mut resource = FhirResource::Other(serde_json::json!({"resourceType": "Goal"}));
        resource.set_identifiers(vec![Identifier::assigned("x", "acme")]);
        assert_eq!(resource.render_json().unwrap(), br#"{"resourceType":"Goal"}"#.to_vec());
    }

    #[test]
    fn parse_reports_wrong_field_type() {
        let input = br#"{"resourceType": "Patient", "photo": "not-a-list"}"#;
        let err = FhirResource::parse_json(input).expect_err("wrong type");
        match err {
            FhirError::Translation(msg) => assert!(msg.contains("schema mismatch")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn set_identifiers_replaces_list() {
        let mut resource = FhirResource::CarePlan(CarePlan {
            identifier: vec![Identifier::assigned("old", "partner")],
            ..Default::default()
        });

        resource.set_identifiers(vec![Identifier::assigned("new", "partner")]);

        assert_eq!(resource.identifiers().len(), 1);
        assert_eq!(resource.identifiers()[0].value.as_deref(), Some("new"));
    }

    #[test]
    fn care_plan_has_no_attachment_capability() {
        let resource = FhirResource::CarePlan(CarePlan::default());
        assert!(resource.attachment_holder().is_none());

        let resource = FhirResource::Media(Media::default());
        assert!(resource.attachment_holder().is_some());
    }
}

//! Shared FHIR data types.
//!
//! Only the fields the record core reads or writes are modelled. Everything else is kept
//! verbatim in a flattened `extra` map, so a parse/render round trip never loses data written
//! by other clients.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// FHIR release a resource was authored against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FhirVersion {
    /// FHIR STU3 (3.0.1).
    Stu3,
    /// FHIR R4 (4.0.1).
    R4,
}

impl FhirVersion {
    /// Version string as written into record tags.
    pub fn to_wire(self) -> &'static str {
        match self {
            FhirVersion::Stu3 => "3.0.1",
            FhirVersion::R4 => "4.0.1",
        }
    }

    /// Parse from the tag wire format.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "3.0.1" => Some(FhirVersion::Stu3),
            "4.0.1" => Some(FhirVersion::R4),
            _ => None,
        }
    }
}

impl std::fmt::Display for FhirVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_wire())
    }
}

/// Content in a format defined elsewhere, embedded in a resource.
///
/// `data` holds the base64 payload while it travels between the application and the SDK. It is
/// never part of the encrypted resource body: the payload is uploaded separately and only the
/// metadata (`id`, `hash`, `size`, ...) stays in the resource.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Server identity of the uploaded payload, `<id>` or `<id>#<variantId>` on read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Base64 encoded payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Number of bytes of the decoded payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Base64 encoded SHA-1 of the decoded payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A reference from one resource to another.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Reference {
    pub fn to(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Default::default()
        }
    }
}

/// An identifier intended for computation.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Organisation that issued the identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigner: Option<Reference>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identifier {
    /// Identifier with a value and an assigner reference.
    pub fn assigned(value: impl Into<String>, assigner: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            assigner: Some(Reference::to(assigner)),
            ..Default::default()
        }
    }
}

/// Concept reduced to its text representation.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CodeableConcept {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Identifier element that STU3 declares as a single object on some resources and R4 as a
/// list.
///
/// Both forms are read. A list is always written back as a list; a single object is written
/// back as an object as long as it still holds exactly one identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentifierList {
    items: Vec<Identifier>,
    single: bool,
}

impl IdentifierList {
    pub fn as_slice(&self) -> &[Identifier] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace the identifiers, keeping the form that was read.
    pub fn replace(&mut self, items: Vec<Identifier>) {
        self.items = items;
    }
}

impl From<Vec<Identifier>> for IdentifierList {
    fn from(items: Vec<Identifier>) -> Self {
        Self {
            items,
            single: false,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdentifierForm {
    Many(Vec<Identifier>),
    One(Identifier),
}

impl<'de> Deserialize<'de> for IdentifierList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match IdentifierForm::deserialize(deserializer)? {
            IdentifierForm::Many(items) => Self {
                items,
                single: false,
            },
            IdentifierForm::One(item) => Self {
                items: vec![item],
                single: true,
            },
        })
    }
}

impl Serialize for IdentifierList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (self.single, self.items.as_slice()) {
            (true, [one]) => one.serialize(serializer),
            _ => self.items.serialize(serializer),
        }
    }
}

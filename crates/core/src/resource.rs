//! Resource families handled by the record core.
//!
//! A record holds exactly one of three families: an STU3 FHIR resource, an R4 FHIR resource,
//! or an opaque byte payload. The family is fixed when the record is created. Typed operations
//! pick the family through [`ResourceKind`] and fail with
//! [`CoreError::ResourceFamilyMismatch`] when a stored record belongs to another one.

use crate::{CoreError, CoreResult};
use fhir::{FhirResource, FhirVersion};

/// Discriminant of the three resource families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceFamily {
    Fhir3,
    Fhir4,
    Data,
}

impl ResourceFamily {
    /// FHIR release of the family, `None` for opaque data.
    pub fn fhir_version(self) -> Option<FhirVersion> {
        match self {
            ResourceFamily::Fhir3 => Some(FhirVersion::Stu3),
            ResourceFamily::Fhir4 => Some(FhirVersion::R4),
            ResourceFamily::Data => None,
        }
    }
}

impl std::fmt::Display for ResourceFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceFamily::Fhir3 => "FHIR 3",
            ResourceFamily::Fhir4 => "FHIR 4",
            ResourceFamily::Data => "data",
        };
        f.write_str(name)
    }
}

/// A FHIR STU3 resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fhir3Resource(pub FhirResource);

/// A FHIR R4 resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fhir4Resource(pub FhirResource);

/// Application data the SDK stores without looking inside.
#[derive(Clone, PartialEq, Eq)]
pub struct DataResource(pub Vec<u8>);

impl std::fmt::Debug for DataResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataResource")
            .field("len", &self.0.len())
            .finish()
    }
}

/// A resource of any family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resource {
    Fhir3(Fhir3Resource),
    Fhir4(Fhir4Resource),
    Data(DataResource),
}

impl Resource {
    pub fn family(&self) -> ResourceFamily {
        match self {
            Resource::Fhir3(_) => ResourceFamily::Fhir3,
            Resource::Fhir4(_) => ResourceFamily::Fhir4,
            Resource::Data(_) => ResourceFamily::Data,
        }
    }

    /// The FHIR body, `None` for opaque data.
    pub fn as_fhir(&self) -> Option<&FhirResource> {
        match self {
            Resource::Fhir3(Fhir3Resource(r)) | Resource::Fhir4(Fhir4Resource(r)) => Some(r),
            Resource::Data(_) => None,
        }
    }

    pub fn as_fhir_mut(&mut self) -> Option<&mut FhirResource> {
        match self {
            Resource::Fhir3(Fhir3Resource(r)) | Resource::Fhir4(Fhir4Resource(r)) => Some(r),
            Resource::Data(_) => None,
        }
    }

    /// The FHIR `resourceType`, `None` for opaque data.
    pub fn resource_type(&self) -> Option<&str> {
        self.as_fhir().map(FhirResource::resource_type)
    }
}

/// A resource family usable as the type parameter of record operations.
pub trait ResourceKind: Sized + Send + 'static {
    const FAMILY: ResourceFamily;

    fn into_resource(self) -> Resource;

    /// Narrow a resource to this family.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ResourceFamilyMismatch`] if `resource` belongs to another family.
    fn try_from_resource(resource: Resource) -> CoreResult<Self>;
}

fn mismatch(expected: ResourceFamily, resource: &Resource) -> CoreError {
    CoreError::ResourceFamilyMismatch {
        expected,
        actual: resource.family(),
    }
}

impl ResourceKind for Fhir3Resource {
    const FAMILY: ResourceFamily = ResourceFamily::Fhir3;

    fn into_resource(self) -> Resource {
        Resource::Fhir3(self)
    }

    fn try_from_resource(resource: Resource) -> CoreResult<Self> {
        match resource {
            Resource::Fhir3(r) => Ok(r),
            other => Err(mismatch(Self::FAMILY, &other)),
        }
    }
}

impl ResourceKind for Fhir4Resource {
    const FAMILY: ResourceFamily = ResourceFamily::Fhir4;

    fn into_resource(self) -> Resource {
        Resource::Fhir4(self)
    }

    fn try_from_resource(resource: Resource) -> CoreResult<Self> {
        match resource {
            Resource::Fhir4(r) => Ok(r),
            other => Err(mismatch(Self::FAMILY, &other)),
        }
    }
}

impl ResourceKind for DataResource {
    const FAMILY: ResourceFamily = ResourceFamily::Data;

    fn into_resource(self) -> Resource {
        Resource::Data(self)
    }

    fn try_from_resource(resource: Resource) -> CoreResult<Self> {
        match resource {
            Resource::Data(r) => Ok(r),
            other => Err(mismatch(Self::FAMILY, &other)),
        }
    }
}

use crate::resource::ResourceFamily;

/// Error type returned by collaborators (crypto, transports).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    IdUsageViolation(String),
    #[error("{0}")]
    ExpectedFieldViolation(String),
    #[error("{0}")]
    InvalidAttachmentPayloadHash(String),
    #[error("invalid annotation: {0}")]
    AnnotationViolation(String),

    #[error("unsupported file type")]
    UnsupportedFileType,
    #[error("attachment of {size} bytes exceeds the maximum of {max} bytes")]
    MaxDataSizeViolation { size: u64, max: u64 },

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("resource family mismatch: expected {expected}, found {actual}")]
    ResourceFamilyMismatch {
        expected: ResourceFamily,
        actual: ResourceFamily,
    },
    #[error("unsupported FHIR version: {0}")]
    UnsupportedFhirVersion(String),
    #[error("record model version {0} is not supported")]
    ModelVersionNotSupported(u32),
    #[error("record has attachments but no attachment key")]
    MissingAttachmentKey,

    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid base64 encoding: {0}")]
    InvalidPayloadEncoding(#[from] base64::DecodeError),
    #[error("failed to decode resource body: {0}")]
    BodyDecoding(fhir::FhirError),
    #[error("failed to serialize resource body: {0}")]
    Serialization(fhir::FhirError),
    #[error("failed to decode tag: {0}")]
    TagDecoding(String),

    #[error(transparent)]
    Crypto(BoxError),
    #[error(transparent)]
    Transport(BoxError),
}

impl From<hc_files::FilesError> for CoreError {
    fn from(err: hc_files::FilesError) -> Self {
        match err {
            hc_files::FilesError::InvalidEncoding(source) => CoreError::InvalidPayloadEncoding(source),
            hc_files::FilesError::UnsupportedMediaType => CoreError::UnsupportedFileType,
            hc_files::FilesError::TooLarge { size, max } => {
                CoreError::MaxDataSizeViolation { size, max }
            }
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

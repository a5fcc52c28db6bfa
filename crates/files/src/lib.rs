//! Attachment payload inspection
//!
//! This crate inspects the binary payloads that travel inside FHIR attachments before they are
//! encrypted and uploaded.
//!
//! ## Design Principles
//!
//! - Payload bytes are classified by their binary signature, never by the declared
//!   `contentType`
//! - Only a closed set of media types is accepted for upload
//! - Size limits apply to the decoded payload, not to its base64 form
//!
//! ## Example Usage
//!
//! ```no_run
//! use hc_files::{AttachmentPayload, DEFAULT_MAX_PAYLOAD_BYTES};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let payload = AttachmentPayload::from_base64("JVBERi0xLjQK")?;
//! let metadata = payload.inspect(DEFAULT_MAX_PAYLOAD_BYTES)?;
//! assert_eq!(metadata.media_type.mime_type(), "application/pdf");
//! # Ok(())
//! # }
//! ```

mod constants;
mod payload;

pub use constants::DEFAULT_MAX_PAYLOAD_BYTES;
pub use payload::{AttachmentPayload, MediaType, PayloadMetadata};

/// Errors that can occur during payload inspection
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// The payload is not valid base64
    #[error("invalid payload encoding: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    /// The payload signature does not belong to a supported media type
    #[error("unsupported media type")]
    UnsupportedMediaType,

    /// The decoded payload exceeds the configured ceiling
    #[error("payload of {size} bytes exceeds the limit of {max} bytes")]
    TooLarge { size: u64, max: u64 },
}

//! Attachment payload decoding and classification
//!
//! An [`AttachmentPayload`] owns the decoded bytes of one attachment. Inspection answers the
//! two questions the upload path needs before anything is encrypted:
//!
//! - **What is it?** The binary signature is matched with `infer` against the closed set of
//!   [`MediaType`]s the record store accepts.
//! - **How big is it?** The decoded length is compared with a caller-supplied ceiling.
//!
//! The media type check runs first, so an oversized payload of an unknown type reports the
//! unsupported type.

use crate::FilesError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Media types accepted as attachment payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Jpeg,
    Png,
    Tiff,
    Dicom,
    Pdf,
}

impl MediaType {
    pub fn mime_type(self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Tiff => "image/tiff",
            MediaType::Dicom => "application/dicom",
            MediaType::Pdf => "application/pdf",
        }
    }

    fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" => Some(MediaType::Jpeg),
            "image/png" => Some(MediaType::Png),
            "image/tiff" => Some(MediaType::Tiff),
            "application/dicom" => Some(MediaType::Dicom),
            "application/pdf" => Some(MediaType::Pdf),
            _ => None,
        }
    }

    /// Classify raw bytes by their signature (best-effort, via `infer`).
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        infer::get(bytes).and_then(|kind| Self::from_mime(kind.mime_type()))
    }
}

/// Result of a successful payload inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PayloadMetadata {
    pub media_type: MediaType,
    pub size_bytes: u64,
}

/// Decoded attachment payload.
#[derive(Clone, PartialEq, Eq)]
pub struct AttachmentPayload {
    bytes: Vec<u8>,
}

impl std::fmt::Debug for AttachmentPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Payloads are health data; never print the bytes.
        f.debug_struct("AttachmentPayload")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl AttachmentPayload {
    /// Decodes a standard base64 payload as carried in `Attachment.data`.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidEncoding`] if `encoded` is not valid base64.
    pub fn from_base64(encoded: &str) -> Result<Self, FilesError> {
        Ok(Self {
            bytes: STANDARD.decode(encoded)?,
        })
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn media_type(&self) -> Option<MediaType> {
        MediaType::detect(&self.bytes)
    }

    /// Classifies the payload and checks it against `max_size_bytes`.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - the signature is not one of the supported [`MediaType`]s
    /// - the decoded length exceeds `max_size_bytes`
    pub fn inspect(&self, max_size_bytes: u64) -> Result<PayloadMetadata, FilesError> {
        let media_type = self.media_type().ok_or(FilesError::UnsupportedMediaType)?;

        let size_bytes = self.len();
        if size_bytes > max_size_bytes {
            return Err(FilesError::TooLarge {
                size: size_bytes,
                max: max_size_bytes,
            });
        }

        Ok(PayloadMetadata {
            media_type,
            size_bytes,
        })
    }
}

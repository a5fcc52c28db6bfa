//! Constants used throughout the record core.
//!
//! Wire formats (tags, attachment identifiers) are shared with other SDK platforms and must not
//! change.

/// Newest record envelope model version this crate can read.
pub const MODEL_VERSION: u32 = 1;

/// Default page size for record searches.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Marker in the first part of an additional attachment identifier.
pub const DOWNSCALED_ATTACHMENT_IDS_FMT: &str = "d4l_f_p_t";

/// Separator between the parts of an additional attachment identifier.
pub const ATTACHMENT_ID_SPLIT_CHAR: char = '#';

/// Parts of an additional attachment identifier: marker, attachment, preview, thumbnail.
pub const DOWNSCALED_ATTACHMENT_ID_PARTS: usize = 4;

pub const TAG_PARTNER: &str = "partner";
pub const TAG_CLIENT: &str = "client";
pub const TAG_FHIR_VERSION: &str = "fhirversion";
pub const TAG_RESOURCE_TYPE: &str = "resourcetype";
pub const TAG_FLAG: &str = "flag";

/// Tag key carrying a user annotation.
pub const TAG_ANNOTATION: &str = "custom";

/// `flag` value marking an opaque data record.
pub const TAG_FLAG_APPDATA: &str = "appdata";

/// Separator between tag key and value in the plaintext form.
pub const TAG_DELIMITER: char = '=';

// Validation messages surfaced to applications.
pub const MSG_ATTACHMENT_ID_SHOULD_BE_NULL: &str = "Attachment.id should be null";
pub const MSG_ATTACHMENT_ID_EXPECTED: &str = "Attachment.id expected";
pub const MSG_VALID_ATTACHMENT_ID_EXPECTED: &str = "Valid Attachment.id expected";
pub const MSG_ATTACHMENT_HASH_EXPECTED: &str = "Attachment.hash expected";
pub const MSG_ATTACHMENT_HASH_AND_SIZE_EXPECTED: &str = "Attachment.hash and Attachment.size expected";
pub const MSG_ATTACHMENT_DATA_EXPECTED: &str = "Attachment.data expected";
pub const MSG_ATTACHMENT_HASH_NOT_VALID: &str = "Attachment.hash is not valid";
pub const MSG_INVALID_ATTACHMENT_IDS: &str = "Please provide correct attachment ids!";

//! # Health Record Core
//!
//! Client-side orchestration of end-to-end encrypted health records.
//!
//! This crate sits between an application and the record and attachment stores:
//! - resources (FHIR STU3, FHIR R4 or opaque data) are encrypted with a per-record data key
//! - attachment payloads are validated, uploaded separately under a per-record attachment key
//!   and never stored inside the encrypted body
//! - search metadata is written as deterministically encrypted tags, readable across every tag
//!   encoding earlier clients used
//!
//! **No transport or cipher implementations**: network access, ciphers and key provisioning are
//! collaborators injected as the [`CryptoService`], [`RecordTransport`] and
//! [`AttachmentTransport`] traits.
//!
//! ## Example Usage
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use hc_core::{CoreResult, CryptoService, RecordTransport, AttachmentTransport};
//! use hc_core::{Fhir4Resource, InMemoryCommonKeyStore, RecordService, SdkConfig};
//!
//! # async fn run(
//! #     crypto: Arc<dyn CryptoService>,
//! #     records: Arc<dyn RecordTransport>,
//! #     attachments: Arc<dyn AttachmentTransport>,
//! #     resource: Fhir4Resource,
//! # ) -> CoreResult<()> {
//! let cfg = Arc::new(SdkConfig::new("production", "acme#web", 20 * 1024 * 1024)?);
//! let service = RecordService::new(
//!     cfg,
//!     crypto,
//!     records,
//!     attachments,
//!     Arc::new(InMemoryCommonKeyStore::new()),
//! );
//!
//! let record = service
//!     .create_record("user-1", resource, vec!["lab results".into()])
//!     .await?;
//! println!("stored record {}", record.id);
//! # Ok(())
//! # }
//! ```

pub mod attachments;
pub mod capability;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod keys;
pub mod record;
pub mod resource;
pub mod service;
pub mod tags;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use attachments::identifier::DownloadType;
pub use config::{max_attachment_size_from_env_value, SdkConfig};
pub use crypto::CryptoService;
pub use error::{BoxError, CoreError, CoreResult};
pub use keys::{AttachmentKeyCell, CommonKeyStore, GcKey, InMemoryCommonKeyStore, KeyType};
pub use record::{DecryptedRecord, Meta, Record};
pub use resource::{
    DataResource, Fhir3Resource, Fhir4Resource, Resource, ResourceFamily, ResourceKind,
};
pub use service::{RecordQuery, RecordService};
pub use transport::{
    AttachmentTransport, EncryptedRecord, RecordTransport, SearchQuery, UploadedAttachment,
};

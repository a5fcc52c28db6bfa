//! SDK runtime configuration.
//!
//! Configuration is resolved once when the SDK is set up and then passed into the record
//! service as `Arc<SdkConfig>`. Nothing in the request path reads process-wide environment
//! variables.

use crate::{CoreError, CoreResult};
use hc_files::DEFAULT_MAX_PAYLOAD_BYTES;
use hc_types::{ClientId, NonEmptyText};

/// SDK configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct SdkConfig {
    alias: NonEmptyText,
    client_id: ClientId,
    max_attachment_size_bytes: u64,
}

impl SdkConfig {
    /// Create a new `SdkConfig`.
    ///
    /// # Arguments
    ///
    /// * `alias` - Name of the record store instance the SDK talks to.
    /// * `client_id` - Client identity in the form `<partnerId>#<platform>`.
    /// * `max_attachment_size_bytes` - Upper bound for one decoded attachment payload.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if the alias or client id is blank, or if the size
    /// limit is zero.
    pub fn new(
        alias: &str,
        client_id: &str,
        max_attachment_size_bytes: u64,
    ) -> CoreResult<Self> {
        let alias = NonEmptyText::new(alias)
            .map_err(|_| CoreError::InvalidInput("alias cannot be empty".into()))?;
        let client_id = ClientId::parse(client_id)
            .map_err(|err| CoreError::InvalidInput(format!("client id: {err}")))?;
        if max_attachment_size_bytes == 0 {
            return Err(CoreError::InvalidInput(
                "max_attachment_size_bytes must be greater than zero".into(),
            ));
        }

        Ok(Self {
            alias,
            client_id,
            max_attachment_size_bytes,
        })
    }

    pub fn alias(&self) -> &str {
        self.alias.as_str()
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn partner_id(&self) -> &str {
        self.client_id.partner_id()
    }

    pub fn max_attachment_size_bytes(&self) -> u64 {
        self.max_attachment_size_bytes
    }
}

/// Parse the attachment size limit from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default of 20 MiB.
pub fn max_attachment_size_from_env_value(value: Option<String>) -> CoreResult<u64> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value
        .map(|v| {
            v.parse::<u64>().map_err(|_| {
                CoreError::InvalidInput(format!("invalid attachment size limit: {v}"))
            })
        })
        .transpose()?;

    Ok(parsed.unwrap_or(DEFAULT_MAX_PAYLOAD_BYTES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_exposes_partner_of_client_id() {
        let cfg = SdkConfig::new("staging", "acme#android", 1024).unwrap();
        assert_eq!(cfg.alias(), "staging");
        assert_eq!(cfg.client_id().as_str(), "acme#android");
        assert_eq!(cfg.partner_id(), "acme");
        assert_eq!(cfg.max_attachment_size_bytes(), 1024);
    }

    #[test]
    fn new_rejects_blank_alias() {
        let err = SdkConfig::new("  ", "acme#android", 1024).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn new_rejects_client_id_without_partner() {
        let err = SdkConfig::new("staging", "#android", 1024).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn new_rejects_zero_size_limit() {
        assert!(SdkConfig::new("staging", "acme#android", 0).is_err());
    }

    #[test]
    fn size_limit_defaults_when_unset() {
        assert_eq!(
            max_attachment_size_from_env_value(None).unwrap(),
            20 * 1024 * 1024
        );
        assert_eq!(
            max_attachment_size_from_env_value(Some("   ".into())).unwrap(),
            20 * 1024 * 1024
        );
    }

    #[test]
    fn size_limit_parses_value() {
        assert_eq!(
            max_attachment_size_from_env_value(Some(" 4096 ".into())).unwrap(),
            4096
        );
        assert!(max_attachment_size_from_env_value(Some("lots".into())).is_err());
    }
}

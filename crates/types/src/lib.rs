//! Validated text primitives shared across the health-record SDK crates.
//!
//! These wrappers guarantee their invariants once constructed, so the orchestration core can
//! take them by value without re-checking.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,

    /// The client id has no partner segment before the `#` separator
    #[error("client id '{0}' has no partner segment")]
    MissingPartner(String),
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Separator between the partner and platform segments of a client id.
pub const CLIENT_ID_SEPARATOR: char = '#';

/// An SDK client identity of the form `<partnerId>#<platform>`.
///
/// The partner segment is used as the assigner of attachment identifiers and as the
/// `partner` search tag. A client id without a platform segment is accepted and the
/// whole value is taken as the partner id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId {
    value: NonEmptyText,
    partner_len: usize,
}

impl ClientId {
    /// Parses a client id.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] for blank input and [`TextError::MissingPartner`] when the
    /// value starts with the separator.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let value = NonEmptyText::new(input)?;
        let partner_len = value
            .as_str()
            .find(CLIENT_ID_SEPARATOR)
            .unwrap_or(value.as_str().len());
        if partner_len == 0 {
            return Err(TextError::MissingPartner(value.into_inner()));
        }
        Ok(Self { value, partner_len })
    }

    pub fn as_str(&self) -> &str {
        self.value.as_str()
    }

    /// The partner segment of the client id.
    pub fn partner_id(&self) -> &str {
        &self.value.as_str()[..self.partner_len]
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}

/// A free-form search annotation attached to a record.
///
/// Annotations must contain at least one non-whitespace character; surrounding whitespace is
/// dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Annotation(NonEmptyText);

impl Annotation {
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        NonEmptyText::new(input).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for Annotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for Annotation {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  hello ").unwrap();
        assert_eq!(text.as_str(), "hello");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new(" \t\n"), Err(TextError::Empty));
    }

    #[test]
    fn non_empty_text_deserialize_rejects_empty() {
        let result = serde_json::from_str::<NonEmptyText>("\"   \"");
        assert!(result.is_err());
    }

    #[test]
    fn client_id_exposes_partner_segment() {
        let client = ClientId::parse("1e9a3f#android").unwrap();
        assert_eq!(client.partner_id(), "1e9a3f");
        assert_eq!(client.as_str(), "1e9a3f#android");
    }

    #[test]
    fn client_id_without_platform_is_its_own_partner() {
        let client = ClientId::parse("partner").unwrap();
        assert_eq!(client.partner_id(), "partner");
    }

    #[test]
    fn client_id_requires_partner_segment() {
        assert!(matches!(
            ClientId::parse("#web"),
            Err(TextError::MissingPartner(_))
        ));
    }

    #[test]
    fn annotation_round_trips_through_json() {
        let annotation = Annotation::new("blood pressure").unwrap();
        let json = serde_json::to_string(&annotation).unwrap();
        assert_eq!(json, "\"blood pressure\"");
        let back: Annotation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, annotation);
    }
}

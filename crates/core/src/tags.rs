//! Tag and annotation codec.
//!
//! Records are searchable through encrypted tags. A tag is the plaintext `key=value`, where the
//! value is lowercased and percent-encoded, then encrypted deterministically with the tag key
//! and base64 encoded. Annotations are tags with the key `custom`.
//!
//! Older clients wrote values with other encodings, so a search sends one group of tags per
//! known encoding and the server matches a record when all tags of any one group are present.
//!
//! | encoding            | value written                                     |
//! |---------------------|---------------------------------------------------|
//! | current             | lowercased, percent-encoded (RFC 3986 unreserved) |
//! | legacy unencoded    | lowercased                                        |
//! | legacy JS           | `encodeURIComponent`, then the result lowercased  |
//! | legacy form         | lowercased, form-urlencoded (space as `+`)        |
//!
//! Decoding accepts all of them: `+` is read as a space and percent escapes in either case.

use crate::constants::{
    TAG_ANNOTATION, TAG_CLIENT, TAG_DELIMITER, TAG_FHIR_VERSION, TAG_FLAG, TAG_FLAG_APPDATA,
    TAG_PARTNER, TAG_RESOURCE_TYPE,
};
use crate::crypto::CryptoService;
use crate::keys::GcKey;
use crate::resource::{Resource, ResourceFamily};
use crate::{CoreError, CoreResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use fhir::FhirVersion;
use hc_types::{Annotation, ClientId};
use indexmap::{IndexMap, IndexSet};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Plaintext tags of a record, in insertion order.
pub type Tags = IndexMap<String, String>;

/// Value encodings written by current and earlier clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagEncoding {
    Current,
    LegacyUnencoded,
    LegacyJs,
    LegacyForm,
}

impl TagEncoding {
    pub const ALL: [TagEncoding; 4] = [
        TagEncoding::Current,
        TagEncoding::LegacyUnencoded,
        TagEncoding::LegacyJs,
        TagEncoding::LegacyForm,
    ];

    pub fn encode(self, value: &str) -> String {
        let lowered = value.to_lowercase();
        match self {
            TagEncoding::Current => urlencoding::encode(&lowered).into_owned(),
            TagEncoding::LegacyUnencoded => lowered,
            // The JS client lowercased after encoding, so escapes end up lowercase too.
            TagEncoding::LegacyJs => encode_uri_component(value).to_lowercase(),
            TagEncoding::LegacyForm => form_urlencode(&lowered),
        }
    }
}

/// Characters `encodeURIComponent` leaves as they are.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

fn form_urlencode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Decode a tag value written with any [`TagEncoding`].
pub fn decode_value(value: &str) -> CoreResult<String> {
    let spaced = value.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|err| CoreError::TagDecoding(err.to_string()))
}

fn plaintext_tag(key: &str, value: &str, encoding: TagEncoding) -> String {
    format!("{key}{TAG_DELIMITER}{}", encoding.encode(value))
}

/// Plaintext tags plus annotations under one encoding, duplicates removed.
fn plaintext_tags(tags: &Tags, annotations: &[Annotation], encoding: TagEncoding) -> Vec<String> {
    let entries = tags
        .iter()
        .map(|(key, value)| plaintext_tag(key, value, encoding))
        .chain(
            annotations
                .iter()
                .map(|a| plaintext_tag(TAG_ANNOTATION, a.as_str(), encoding)),
        );
    entries.collect::<IndexSet<_>>().into_iter().collect()
}

/// Alternative tag groups of a search; a record matches when it carries every tag of any group.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TagGroups {
    groups: Vec<Vec<String>>,
}

impl TagGroups {
    pub fn new(groups: Vec<Vec<String>>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[Vec<String>] {
        &self.groups
    }

    pub fn matches(&self, record_tags: &[String]) -> bool {
        self.groups
            .iter()
            .any(|group| group.iter().all(|tag| record_tags.contains(tag)))
    }
}

/// Builds the plaintext tags a record is written with.
#[derive(Clone, Debug)]
pub struct TaggingService {
    client_id: ClientId,
}

impl TaggingService {
    pub fn new(client_id: ClientId) -> Self {
        Self { client_id }
    }

    /// Tags for a new record: client identity plus [`Self::resource_tags`].
    pub fn tags_for(&self, resource: &Resource) -> Tags {
        let mut tags = Tags::new();
        tags.insert(TAG_CLIENT.into(), self.client_id.as_str().into());
        tags.insert(TAG_PARTNER.into(), self.client_id.partner_id().into());
        tags.extend(Self::resource_tags(resource));
        tags
    }

    /// Tags derived from the resource itself; recomputed on every update.
    pub fn resource_tags(resource: &Resource) -> Tags {
        Self::search_tags(resource.family(), resource.resource_type())
    }

    /// Tags selecting a resource family and, optionally, one resource type.
    pub fn search_tags(family: ResourceFamily, resource_type: Option<&str>) -> Tags {
        let mut tags = Tags::new();
        match family.fhir_version() {
            Some(version) => {
                tags.insert(TAG_FHIR_VERSION.into(), version.to_wire().into());
                if let Some(resource_type) = resource_type {
                    tags.insert(TAG_RESOURCE_TYPE.into(), resource_type.into());
                }
            }
            None => {
                tags.insert(TAG_FLAG.into(), TAG_FLAG_APPDATA.into());
            }
        }
        tags
    }
}

/// Resource family recorded in decrypted tags.
///
/// Records written before the version tag existed carry no `fhirversion` and are STU3.
///
/// # Errors
///
/// Returns [`CoreError::UnsupportedFhirVersion`] for any other version.
pub fn family_from_tags(tags: &Tags) -> CoreResult<ResourceFamily> {
    if tags.get(TAG_FLAG).is_some_and(|flag| flag == TAG_FLAG_APPDATA) {
        return Ok(ResourceFamily::Data);
    }
    match tags.get(TAG_FHIR_VERSION) {
        None => Ok(ResourceFamily::Fhir3),
        Some(version) => match FhirVersion::from_wire(version) {
            Some(FhirVersion::Stu3) => Ok(ResourceFamily::Fhir3),
            Some(FhirVersion::R4) => Ok(ResourceFamily::Fhir4),
            None => Err(CoreError::UnsupportedFhirVersion(version.clone())),
        },
    }
}

/// Tag encryption bound to one logical operation.
///
/// The tag key is fetched once when the codec is created and reused for every tag the
/// operation encrypts or decrypts.
pub struct TagCodec<'a> {
    crypto: &'a dyn CryptoService,
    key: GcKey,
}

impl<'a> TagCodec<'a> {
    /// Fetch the tag key for one operation.
    pub async fn fetch(crypto: &'a dyn CryptoService) -> CoreResult<TagCodec<'a>> {
        let key = crypto
            .fetch_tag_encryption_key()
            .await
            .map_err(CoreError::Crypto)?;
        Ok(Self { crypto, key })
    }

    fn encrypt(&self, plaintext: &str) -> CoreResult<String> {
        let ciphertext = self
            .crypto
            .encrypt_symmetric(&self.key, plaintext.as_bytes())
            .map_err(CoreError::Crypto)?;
        Ok(STANDARD.encode(ciphertext))
    }

    /// Encrypted tags to store with a record, current encoding only.
    pub fn encrypt_tags(&self, tags: &Tags, annotations: &[Annotation]) -> CoreResult<Vec<String>> {
        plaintext_tags(tags, annotations, TagEncoding::Current)
            .iter()
            .map(|tag| self.encrypt(tag))
            .collect()
    }

    /// One encrypted group per distinct encoding of `tags` and `annotations`.
    pub fn build_search_tag_groups(
        &self,
        tags: &Tags,
        annotations: &[Annotation],
    ) -> CoreResult<TagGroups> {
        let plaintext_groups: IndexSet<Vec<String>> = TagEncoding::ALL
            .iter()
            .map(|encoding| plaintext_tags(tags, annotations, *encoding))
            .collect();

        let groups = plaintext_groups
            .iter()
            .map(|group| group.iter().map(|tag| self.encrypt(tag)).collect())
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(TagGroups::new(groups))
    }

    /// Decrypt stored tags into plaintext tags and annotations.
    ///
    /// Entries with an unknown key are kept as annotations holding the whole decoded entry.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPayloadEncoding`] for non-base64 entries and
    /// [`CoreError::TagDecoding`] when a decrypted entry is not valid UTF-8 text.
    pub fn decrypt(&self, encrypted: &[String]) -> CoreResult<(Tags, Vec<Annotation>)> {
        let mut tags = Tags::new();
        let mut annotations = Vec::new();

        for entry in encrypted {
            let ciphertext = STANDARD.decode(entry)?;
            let plaintext = self
                .crypto
                .decrypt_symmetric(&self.key, &ciphertext)
                .map_err(CoreError::Crypto)?;
            let plaintext = String::from_utf8(plaintext)
                .map_err(|err| CoreError::TagDecoding(err.to_string()))?;

            match plaintext.split_once(TAG_DELIMITER) {
                Some((TAG_ANNOTATION, value)) => {
                    annotations.extend(stored_annotation(&decode_value(value)?));
                }
                Some((key, value)) if is_known_tag(key) => {
                    tags.insert(key.to_owned(), decode_value(value)?);
                }
                _ => {
                    tracing::warn!("unknown tag key, keeping entry as annotation");
                    annotations.extend(stored_annotation(&decode_value(&plaintext)?));
                }
            }
        }

        Ok((tags, annotations))
    }
}

fn is_known_tag(key: &str) -> bool {
    [
        TAG_PARTNER,
        TAG_CLIENT,
        TAG_FHIR_VERSION,
        TAG_RESOURCE_TYPE,
        TAG_FLAG,
    ]
    .contains(&key)
}

/// Annotation read back from storage; blank values written by older clients are skipped.
fn stored_annotation(value: &str) -> Option<Annotation> {
    match Annotation::new(value) {
        Ok(annotation) => Some(annotation),
        Err(err) => {
            tracing::warn!(%err, "skipping blank stored annotation");
            None
        }
    }
}

/// Validate caller supplied annotations.
///
/// # Errors
///
/// Returns [`CoreError::AnnotationViolation`] for an empty or blank annotation.
pub fn validate_annotations(annotations: &[String]) -> CoreResult<Vec<Annotation>> {
    annotations
        .iter()
        .map(|a| Annotation::new(a).map_err(|err| CoreError::AnnotationViolation(err.to_string())))
        .collect()
}

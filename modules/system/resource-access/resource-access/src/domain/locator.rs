//! Href parsing.
//!
//! Turns an absolute URL, a prefixed path or a bare path fragment into a
//! [`ResourceAddress`]. Parsing is total: malformed input yields absent
//! fields, never an error. Validation happens later in the resolver.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use resource_access_sdk::{IdDecoder, ResourceAddress};
use url::Url;

use super::id_codec::CompressedIdDecoder;

static VERSION_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v\d+(?:\.\d+)*(?:-[0-9A-Za-z.]+)?$").expect("Invalid version tag pattern")
});

/// Whether `segment` is a version marker such as `v2`, `v2.1` or `v3.0.0-pre`.
#[must_use]
pub fn is_version_tag(segment: &str) -> bool {
    VERSION_TAG.is_match(segment)
}

/// Parses hrefs relative to a canonical API prefix.
#[derive(Clone)]
pub struct ResourceLocator {
    prefix: String,
    decoder: Arc<dyn IdDecoder>,
}

impl std::fmt::Debug for ResourceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceLocator")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl ResourceLocator {
    /// Locator under `prefix` (e.g. `/api`) decoding ids with `decoder`.
    #[must_use]
    pub fn new(prefix: &str, decoder: Arc<dyn IdDecoder>) -> Self {
        Self {
            prefix: normalize_prefix(prefix),
            decoder,
        }
    }

    /// Locator under `prefix` with the default compressed-id decoder.
    #[must_use]
    pub fn with_default_decoder(prefix: &str) -> Self {
        Self::new(prefix, Arc::new(CompressedIdDecoder::new()))
    }

    /// Canonical prefix, always starting with `/` and without a trailing one.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Parse `raw` into an address.
    #[must_use]
    pub fn parse(&self, raw: &str) -> ResourceAddress {
        let path = extract_path(raw.trim());
        let path = strip_query(&path);
        let path = self.ensure_prefix(path);
        let path = path.trim_end_matches('/');

        let remainder = path.get(self.prefix.len()..).unwrap_or_default();
        let mut segments = remainder.split('/').filter(|s| !s.is_empty()).peekable();

        let version = segments
            .next_if(|s| is_version_tag(s))
            .map(ToOwned::to_owned);
        let collection = segments.next().map(ToOwned::to_owned);
        let collection_id = segments.next().map(|s| self.decode_id(s));
        let subcollection = segments.next().map(ToOwned::to_owned);
        let subcollection_id = segments.next().map(|s| self.decode_id(s));

        ResourceAddress {
            collection,
            collection_id,
            subcollection,
            subcollection_id,
            version,
        }
    }

    /// Canonical href of `address` under this locator's prefix.
    #[must_use]
    pub fn href(&self, address: &ResourceAddress) -> String {
        address.href(&self.prefix)
    }

    /// Canonical form of an id token, decoding compressed ids.
    #[must_use]
    pub fn decode_id(&self, segment: &str) -> String {
        if self.decoder.is_encoded(segment) {
            self.decoder.decode(segment)
        } else {
            segment.to_owned()
        }
    }

    /// `path` rooted under the prefix; a leading `/` is optional on input.
    fn ensure_prefix(&self, path: &str) -> String {
        let fragment = path.trim_start_matches('/');
        let rest = fragment.strip_prefix(self.prefix.trim_start_matches('/'));
        if rest.is_some_and(|r| r.is_empty() || r.starts_with('/')) {
            return format!("/{fragment}");
        }
        if fragment.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}/{fragment}", self.prefix)
        }
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    format!("/{trimmed}")
        .trim_end_matches('/')
        .to_owned()
}

/// Path component of an absolute URL, or the input itself for fragments.
fn extract_path(raw: &str) -> String {
    if raw.contains("://")
        && let Ok(url) = Url::parse(raw)
    {
        return url.path().to_owned();
    }
    raw.to_owned()
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or_default()
}

//! Compressed record ids.
//!
//! Ids are unique across regions: `id = region * REGION_FACTOR + short_id`.
//! The compressed form spells this as `<region>r<short_id>`, e.g. `2r45`.

use std::sync::LazyLock;

use regex::Regex;
use resource_access_sdk::IdDecoder;

/// Width of one region's id range.
pub const REGION_FACTOR: u64 = 1_000_000_000_000;

static COMPRESSED_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)r(\d+)$").expect("Invalid compressed id pattern"));

/// Default [`IdDecoder`] for `<region>r<short_id>` tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompressedIdDecoder;

impl CompressedIdDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Compressed form of a canonical numeric id.
    #[must_use]
    pub fn compress(id: u64) -> String {
        format!(
            "{}r{}",
            id.div_euclid(REGION_FACTOR),
            id.rem_euclid(REGION_FACTOR)
        )
    }
}

impl IdDecoder for CompressedIdDecoder {
    fn is_encoded(&self, token: &str) -> bool {
        COMPRESSED_ID.is_match(token)
    }

    fn decode(&self, token: &str) -> String {
        let Some(caps) = COMPRESSED_ID.captures(token) else {
            return token.to_owned();
        };
        let region = caps[1].parse::<u64>().ok();
        let short = caps[2].parse::<u64>().ok();
        region
            .zip(short)
            .and_then(|(region, short)| region.checked_mul(REGION_FACTOR)?.checked_add(short))
            .map_or_else(|| token.to_owned(), |id| id.to_string())
    }
}

/// Whether `token` is a plain decimal id.
#[must_use]
pub fn is_numeric_id(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

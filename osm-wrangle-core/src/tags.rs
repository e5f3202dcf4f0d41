//! Tag flattening.
//!
//! Turns one raw `k`/`v` pair into a `(key, type, value)` row, splitting the
//! namespace prefix off colon keys and routing address fields through the
//! cleaners. Tags that cannot be stored are dropped without error.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::clean::CleaningRules;
use crate::element::{ElementKind, RawTag};
use crate::record::{REGULAR_TAG_TYPE, TagRecord};

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
static PROBLEM_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[=\+/&<>;'"\?%#$@,\.\s]"#).expect("problem character pattern compiles")
});

const STREET_KEY: &str = "addr:street";
const CITY_KEY: &str = "addr:city";
const POSTCODE_KEY: &str = "addr:postcode";

/// Report whether a tag key contains a character that cannot be stored.
#[must_use]
pub fn has_problem_chars(key: &str) -> bool {
    PROBLEM_CHARS.is_match(key)
}

/// Flatten a tag owned by the element `owner_id` of kind `owner`.
///
/// Returns `None` when the key has problem characters, when the local key is
/// empty, or when an `addr:postcode` value is rejected by the cleaner.
///
/// # Examples
/// ```
/// use osm_wrangle_core::{CleaningRules, ElementKind, RawTag, flatten_tag};
///
/// let rules = CleaningRules::default();
/// let tag = RawTag::new("addr:street", "Main St");
/// let record = flatten_tag(&rules, ElementKind::Node, Some("1"), &tag).expect("kept");
/// assert_eq!(record.kind, "addr");
/// assert_eq!(record.key, "street");
/// assert_eq!(record.value, "Main Street");
///
/// let rejected = RawTag::new("addr:postcode", "946ca");
/// assert!(flatten_tag(&rules, ElementKind::Way, Some("2"), &rejected).is_none());
/// ```
#[must_use]
pub fn flatten_tag(
    rules: &CleaningRules,
    owner: ElementKind,
    owner_id: Option<&str>,
    tag: &RawTag,
) -> Option<TagRecord> {
    let raw_key = tag.key.as_str();
    if has_problem_chars(raw_key) {
        debug!("Dropped {owner} tag with problem characters: key={raw_key:?}");
        return None;
    }

    let (kind, key, value) = match raw_key.split_once(':') {
        None => (REGULAR_TAG_TYPE, raw_key, tag.value.clone()),
        Some((prefix, suffix)) => (prefix, suffix, clean_value(rules, raw_key, &tag.value)?),
    };

    if key.is_empty() {
        debug!("Dropped {owner} tag with empty key: key={raw_key:?}");
        return None;
    }

    Some(TagRecord {
        owner_id: owner_id.map(str::to_owned),
        key: key.to_owned(),
        kind: kind.to_owned(),
        value,
    })
}

fn clean_value(rules: &CleaningRules, raw_key: &str, value: &str) -> Option<String> {
    match raw_key {
        STREET_KEY => Some(rules.clean_street(value)),
        CITY_KEY => Some(rules.clean_city(value)),
        POSTCODE_KEY => {
            let cleaned = rules.clean_postcode(value);
            if cleaned.is_none() {
                debug!("Dropped unparseable postcode {value:?}");
            }
            cleaned
        }
        _ => Some(value.to_owned()),
    }
}

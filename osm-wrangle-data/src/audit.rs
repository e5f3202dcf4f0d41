//! Read-only audit of an extract before it is cleaned.
//!
//! The audit reports what the cleaners will have to deal with: tag key
//! shapes, street types and city names outside the expected sets, and raw
//! postcode and amenity frequencies.
#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::io::BufRead;
use std::sync::LazyLock;

use camino::Utf8Path;
use log::info;
use osm_wrangle_core::{RawElement, has_problem_chars};
use regex::Regex;
use serde::Serialize;

use crate::reader::{OsmReadError, OsmXmlReader};

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
static LOWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_]*$").expect("lower-case key pattern compiles"));

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
static LOWER_COLON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z_]*:[a-z_]*$").expect("lower-case colon key pattern compiles")
});

const EXPECTED_STREET_TYPES: &[&str] = &[
    "Street",
    "Avenue",
    "Boulevard",
    "Drive",
    "Court",
    "Center",
    "Place",
    "Square",
    "Lane",
    "Road",
    "Trail",
    "Parkway",
    "Plaza",
    "Commons",
    "Way",
    "Circle",
    "Loop",
];

const EXPECTED_CITIES: &[&str] = &[
    "Berkeley",
    "Piedmont",
    "Oakland",
    "Richmond",
    "Albany",
    "Alameda",
    "El Cerrito",
    "San Leandro",
    "Emeryville",
    "Moraga",
    "Lafayette",
    "Castro Valley",
    "Kensington",
    "Orinda",
    "Canyon",
    "Walnut Creek",
];

/// Street types and city names considered correct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditExpectations {
    street_types: BTreeSet<String>,
    cities: BTreeSet<String>,
}

impl Default for AuditExpectations {
    fn default() -> Self {
        Self::east_bay()
    }
}

impl AuditExpectations {
    /// The East Bay street types and city names.
    #[must_use]
    pub fn east_bay() -> Self {
        Self::new(
            EXPECTED_STREET_TYPES.iter().copied(),
            EXPECTED_CITIES.iter().copied(),
        )
    }

    /// Build expectations from explicit lists.
    pub fn new<S, C>(
        street_types: impl IntoIterator<Item = S>,
        cities: impl IntoIterator<Item = C>,
    ) -> Self
    where
        S: Into<String>,
        C: Into<String>,
    {
        Self {
            street_types: street_types.into_iter().map(Into::into).collect(),
            cities: cities.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `street_type` is an expected trailing word.
    #[must_use]
    pub fn expects_street_type(&self, street_type: &str) -> bool {
        self.street_types.contains(street_type)
    }

    /// Whether `city` is an expected city name.
    #[must_use]
    pub fn expects_city(&self, city: &str) -> bool {
        self.cities.contains(city)
    }
}

/// How tag keys are shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct KeyCategories {
    /// Only lower-case letters and underscores.
    pub lower: u64,
    /// Two lower-case parts joined by one colon.
    pub lower_colon: u64,
    /// Contains a character that cannot be stored.
    pub problem_chars: u64,
    /// Anything else, such as upper-case or digits.
    pub other: u64,
}

impl KeyCategories {
    fn record(&mut self, key: &str) {
        let bucket = if LOWER.is_match(key) {
            &mut self.lower
        } else if LOWER_COLON.is_match(key) {
            &mut self.lower_colon
        } else if has_problem_chars(key) {
            &mut self.problem_chars
        } else {
            &mut self.other
        };
        *bucket += 1;
    }
}

/// Findings of one audit pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AuditReport {
    /// Tag key shapes across nodes and ways.
    pub key_categories: KeyCategories,
    /// Unexpected trailing street words, each with the full names using it.
    pub unexpected_street_types: BTreeMap<String, BTreeSet<String>>,
    /// Unexpected `addr:city` values and how often each occurs.
    pub unexpected_cities: BTreeMap<String, u64>,
    /// Raw `addr:postcode` values and how often each occurs.
    pub postcodes: BTreeMap<String, u64>,
    /// `amenity` values and how often each occurs.
    pub amenities: BTreeMap<String, u64>,
    /// Number of distinct `uid` attributes.
    pub unique_users: usize,
    /// Every XML element name in the document and how often it occurs.
    pub element_counts: BTreeMap<String, u64>,
}

/// Audit every element produced by `reader`.
///
/// # Examples
/// ```
/// use osm_wrangle_data::{AuditExpectations, OsmXmlReader, audit_osm_xml};
///
/// let xml = r#"<osm>
///   <node id="1" uid="7"><tag k="addr:street" v="Grand Ave"/></node>
///   <way id="2" uid="7"><tag k="addr:city" v="oakland"/></way>
/// </osm>"#;
/// let report = audit_osm_xml(OsmXmlReader::new(xml.as_bytes()), &AuditExpectations::default())
///     .expect("audit extract");
/// assert!(report.unexpected_street_types.contains_key("Ave"));
/// assert_eq!(report.unexpected_cities.get("oakland"), Some(&1));
/// assert_eq!(report.unique_users, 1);
/// assert_eq!(report.element_counts.get("tag"), Some(&2));
/// ```
pub fn audit_osm_xml<R: BufRead>(
    reader: OsmXmlReader<R>,
    expectations: &AuditExpectations,
) -> Result<AuditReport, OsmReadError> {
    let mut report = AuditReport::default();
    let mut users = BTreeSet::new();
    let mut counting = reader.counting_names();
    while let Some(element) = counting.next_element()? {
        if let Some(uid) = element.attributes().get("uid") {
            users.insert(uid.clone());
        }
        audit_tags(&mut report, &element, expectations);
    }
    report.unique_users = users.len();
    report.element_counts = counting.name_counts().cloned().unwrap_or_default();
    Ok(report)
}

/// Audit an extract on disk.
pub fn audit_osm_file(
    path: &Utf8Path,
    expectations: &AuditExpectations,
) -> Result<AuditReport, OsmReadError> {
    info!("Auditing OSM extract {path}");
    audit_osm_xml(OsmXmlReader::from_path(path)?, expectations)
}

fn audit_tags(report: &mut AuditReport, element: &RawElement, expectations: &AuditExpectations) {
    for tag in element.tags() {
        report.key_categories.record(&tag.key);
        let value = tag.value.as_str();
        match tag.key.as_str() {
            "addr:street" => {
                if let Some(street_type) = value.split_whitespace().next_back()
                    && !expectations.expects_street_type(street_type)
                {
                    report
                        .unexpected_street_types
                        .entry(street_type.to_owned())
                        .or_default()
                        .insert(value.to_owned());
                }
            }
            "addr:city" => {
                if !expectations.expects_city(value) {
                    *report
                        .unexpected_cities
                        .entry(value.to_owned())
                        .or_default() += 1;
                }
            }
            "addr:postcode" => *report.postcodes.entry(value.to_owned()).or_default() += 1,
            "amenity" => *report.amenities.entry(value.to_owned()).or_default() += 1,
            _ => {}
        }
    }
}

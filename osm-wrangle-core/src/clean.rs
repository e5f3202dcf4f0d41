//! Field cleaners for address tags.
//!
//! The cleaners are pure functions over the static mapping tables carried by
//! [`CleaningRules`]. Rules are plain values: construct them once and pass
//! them to whichever shaper or audit needs them.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// Abbreviation to canonical suffix mappings found in the East Bay extract.
const EAST_BAY_STREET_SUFFIXES: &[(&str, &str)] = &[
    ("St", "Street"),
    ("St.", "Street"),
    ("street", "Street"),
    ("st", "Street"),
    ("Ave", "Avenue"),
    ("Ave.", "Avenue"),
    ("AVE", "Avenue"),
    ("Aveenue", "Avenue"),
    ("Avenie", "Avenue"),
    ("Rd", "Road"),
    ("Rd.", "Road"),
    ("Blvd", "Boulevard"),
    ("Blvd.", "Boulevard"),
    ("blvd", "Boulevard"),
    ("Ct", "Court"),
    ("Ctr", "Center"),
    ("Dr", "Drive"),
    ("Dr.", "Drive"),
    ("Ln.", "Lane"),
    ("square", "Square"),
    ("Pl", "Plaza"),
];

/// Whole street names that cannot be fixed by replacing the trailing word.
const EAST_BAY_STREET_SPECIAL_CASES: &[(&str, &str)] = &[
    ("Washington St 2nd Floor:", "Washington Street, 2nd Floor"),
    ("Telegraph", "Telegraph Avenue"),
    (
        "San Francisco/Oakland Bridge Toll Pl",
        "San Francisco/Oakland Bridge Toll Plaza",
    ),
];

const EAST_BAY_CITY_NAMES: &[(&str, &str)] = &[
    ("Alamda", "Alameda"),
    ("alameda", "Alameda"),
    ("Berkeley, CA", "Berkeley"),
    ("berkeley", "Berkeley"),
    ("Oakland ", "Oakland"),
    ("oakland", "Oakland"),
    ("Oakland CA", "Oakland"),
    ("Oakland, CA", "Oakland"),
    ("Oakland, Ca", "Oakland"),
    ("Okaland", "Oakland"),
    ("OAKLAND", "Oakland"),
    ("Emeyville", "Emeryville"),
];

const EAST_BAY_STATE_CODES: &[&str] = &["CA"];

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
static POSTCODE_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9])([0-9]{5})$").expect("postcode tail pattern compiles")
});

/// Static mapping tables consumed by the field cleaners.
///
/// [`CleaningRules::default`] yields the East Bay tables. Use
/// [`CleaningRules::empty`] with the `with_*` builders to assemble rules for
/// another extract.
///
/// # Examples
/// ```
/// use osm_wrangle_core::CleaningRules;
///
/// let rules = CleaningRules::default();
/// assert_eq!(rules.clean_street("Main St"), "Main Street");
/// assert_eq!(rules.clean_city("oakland"), "Oakland");
/// assert_eq!(rules.clean_postcode("94610-1234").as_deref(), Some("94610"));
/// assert_eq!(rules.clean_postcode("946ca"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleaningRules {
    street_suffixes: BTreeMap<String, String>,
    street_special_cases: BTreeMap<String, String>,
    city_names: BTreeMap<String, String>,
    state_codes: Vec<String>,
}

impl CleaningRules {
    /// Rules with no mappings: every cleaner passes its input through, apart
    /// from the structural postcode checks.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            street_suffixes: BTreeMap::new(),
            street_special_cases: BTreeMap::new(),
            city_names: BTreeMap::new(),
            state_codes: Vec::new(),
        }
    }

    /// The tables derived from auditing the East Bay extract.
    #[must_use]
    pub fn east_bay() -> Self {
        Self {
            street_suffixes: owned_pairs(EAST_BAY_STREET_SUFFIXES),
            street_special_cases: owned_pairs(EAST_BAY_STREET_SPECIAL_CASES),
            city_names: owned_pairs(EAST_BAY_CITY_NAMES),
            state_codes: EAST_BAY_STATE_CODES
                .iter()
                .map(|code| (*code).to_owned())
                .collect(),
        }
    }

    /// Add or replace a trailing-word mapping, matched case-sensitively.
    #[must_use]
    pub fn with_street_suffix(
        mut self,
        abbreviation: impl Into<String>,
        canonical: impl Into<String>,
    ) -> Self {
        self.street_suffixes
            .insert(abbreviation.into(), canonical.into());
        self
    }

    /// Add or replace a verbatim full-name correction.
    #[must_use]
    pub fn with_street_special_case(
        mut self,
        raw: impl Into<String>,
        canonical: impl Into<String>,
    ) -> Self {
        self.street_special_cases
            .insert(raw.into(), canonical.into());
        self
    }

    /// Add or replace a city-name correction.
    #[must_use]
    pub fn with_city_name(mut self, raw: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.city_names.insert(raw.into(), canonical.into());
        self
    }

    /// Add a state code stripped from postcodes, matched case-insensitively.
    #[must_use]
    pub fn with_state_code(mut self, code: impl Into<String>) -> Self {
        let code = code.into();
        if !code.is_empty() && !self.state_codes.contains(&code) {
            self.state_codes.push(code);
        }
        self
    }

    /// Normalise a street name.
    ///
    /// Repeated spaces collapse to one, verbatim special cases are replaced
    /// whole, and otherwise a trailing word found in the suffix table is
    /// swapped for its canonical form. Unknown names pass through.
    #[must_use]
    pub fn clean_street(&self, raw: &str) -> String {
        let collapsed = collapse_spaces(raw);
        let name = self
            .street_special_cases
            .get(&collapsed)
            .cloned()
            .unwrap_or(collapsed);

        let replaced = name.rsplit_once(' ').map_or_else(
            || self.street_suffixes.get(name.as_str()).cloned(),
            |(head, last)| {
                self.street_suffixes
                    .get(last)
                    .map(|canonical| format!("{head} {canonical}"))
            },
        );
        replaced.unwrap_or(name)
    }

    /// Normalise a city name by exact lookup; unknown names pass through.
    #[must_use]
    pub fn clean_city(&self, raw: &str) -> String {
        self.city_names
            .get(raw)
            .cloned()
            .unwrap_or_else(|| raw.to_owned())
    }

    /// Normalise a postcode, returning `None` when it must be rejected.
    ///
    /// Whitespace and state codes are removed, anything from the first hyphen
    /// onwards is discarded, and the remainder must end in exactly five
    /// digits. The five-digit tail is the canonical form.
    #[must_use]
    pub fn clean_postcode(&self, raw: &str) -> Option<String> {
        let mut compact: String = raw.chars().filter(|ch| !ch.is_whitespace()).collect();
        for code in &self.state_codes {
            compact = remove_ignore_ascii_case(&compact, code);
        }
        let head = compact
            .split_once('-')
            .map_or(compact.as_str(), |(before, _)| before);

        POSTCODE_TAIL
            .captures(head)
            .and_then(|captures| captures.get(1))
            .map(|tail| tail.as_str().to_owned())
    }
}

impl Default for CleaningRules {
    fn default() -> Self {
        Self::east_bay()
    }
}

fn owned_pairs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(raw, canonical)| ((*raw).to_owned(), (*canonical).to_owned()))
        .collect()
}

fn collapse_spaces(raw: &str) -> String {
    let mut collapsed = String::with_capacity(raw.len());
    let mut previous_space = false;
    for ch in raw.chars() {
        let is_space = ch == ' ';
        if !(is_space && previous_space) {
            collapsed.push(ch);
        }
        previous_space = is_space;
    }
    collapsed
}

fn remove_ignore_ascii_case(input: &str, token: &str) -> String {
    if token.is_empty() {
        return input.to_owned();
    }
    let mut kept = String::with_capacity(input.len());
    let mut rest = input;
    while !rest.is_empty() {
        let matched = rest
            .get(..token.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(token));
        if matched && let Some(after) = rest.get(token.len()..) {
            rest = after;
            continue;
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            kept.push(ch);
        }
        rest = chars.as_str();
    }
    kept
}

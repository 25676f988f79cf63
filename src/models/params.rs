use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

use super::text::TextReference;

/// Advanced options for a search. Frozen once the search is submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SearchParameters {
    /// Token representation to match on (e.g. `lemmata`, `form`)
    #[validate(length(min = 1))]
    pub feature: String,

    /// Number of high-frequency tokens to exclude
    #[serde(alias = "stoplist")]
    pub stoplist_size: u32,

    pub stoplist_basis: StoplistBasis,

    #[validate(length(min = 1))]
    pub frequency_basis: String,

    #[validate(range(min = 1))]
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub max_distance: i64,

    #[validate(length(min = 1))]
    pub distance_basis: String,

    #[validate(length(min = 1))]
    pub score_basis: String,

    pub unit_type: UnitType,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            feature: "lemmata".to_string(),
            stoplist_size: 10,
            stoplist_basis: StoplistBasis::Corpus,
            frequency_basis: "corpus".to_string(),
            max_distance: 10,
            distance_basis: "frequency".to_string(),
            score_basis: "stem".to_string(),
            unit_type: UnitType::Line,
        }
    }
}

/// Where stoplist frequencies are computed from.
///
/// Any value other than `corpus` (case-insensitive) means the searched texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[strum(serialize_all = "lowercase")]
pub enum StoplistBasis {
    Corpus,
    Texts,
}

impl std::str::FromStr for StoplistBasis {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("corpus") {
            Ok(StoplistBasis::Corpus)
        } else {
            Ok(StoplistBasis::Texts)
        }
    }
}

impl TryFrom<String> for StoplistBasis {
    type Error = std::convert::Infallible;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl StoplistBasis {
    /// Pick the frequency source for a search between `source` and `target`
    pub fn resolve(
        &self,
        language: &str,
        source: &TextReference,
        target: &TextReference,
    ) -> FrequencySource {
        match self {
            StoplistBasis::Corpus => FrequencySource::Language(language.to_string()),
            StoplistBasis::Texts => FrequencySource::Works(vec![
                source.object_id.clone(),
                target.object_id.clone(),
            ]),
        }
    }
}

/// Frequency data backing a stoplist request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrequencySource {
    /// Corpus-wide frequencies for a language code
    Language(String),
    /// Frequencies over specific works
    Works(Vec<String>),
}

impl FrequencySource {
    /// Query pairs naming the basis; works are repeated once per id
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match self {
            FrequencySource::Language(language) => {
                vec![("language".to_string(), language.clone())]
            }
            FrequencySource::Works(works) => works
                .iter()
                .map(|id| ("works".to_string(), id.clone()))
                .collect(),
        }
    }
}

/// Granularity of matched units
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum UnitType {
    Line,
    Phrase,
}

impl TryFrom<String> for UnitType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .trim()
            .parse()
            .map_err(|_| format!("unknown unit type '{}'", value))
    }
}

/// Integer prefix of a string, the way form inputs are usually coerced:
/// leading whitespace, optional sign, then digits. `"12abc"` gives 12.
pub fn parse_int_prefix(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

fn deserialize_lenient_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_json::Value::deserialize(deserializer)?;
    match &value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .ok_or_else(|| D::Error::custom(format!("invalid integer {}", n))),
        serde_json::Value::String(s) => parse_int_prefix(s)
            .ok_or_else(|| D::Error::custom(format!("'{}' does not start with an integer", s))),
        other => Err(D::Error::custom(format!("expected an integer, got {}", other))),
    }
}

use serde::{Deserialize, Deserializer, Serialize};

/// One matched passage pair returned by the search engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parallel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,

    /// Locus of the source unit, e.g. `aeneid 1.1`
    #[serde(default)]
    pub source_tag: String,

    #[serde(default)]
    pub target_tag: String,

    #[serde(default)]
    pub matched_features: Vec<String>,

    #[serde(default)]
    pub source_snippet: String,

    #[serde(default)]
    pub target_snippet: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<serde_json::Value>,

    /// Missing or null scores read as 0
    #[serde(default, deserialize_with = "deserialize_score")]
    pub score: f64,

    /// Secondary corpus matches (multitext view)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub multiresults: Vec<MultitextMatch>,

    /// Fields this client does not interpret, passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Parallel {
    pub fn new(source_tag: impl Into<String>, target_tag: impl Into<String>, score: f64) -> Self {
        Self {
            object_id: None,
            source_tag: source_tag.into(),
            target_tag: target_tag.into(),
            matched_features: Vec::new(),
            source_snippet: String::new(),
            target_snippet: String::new(),
            highlight: None,
            score,
            multiresults: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }
}

/// A single-locus record from a multitext cross-reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultitextMatch {
    pub unit_id: String,

    #[serde(default)]
    pub tag: String,

    #[serde(default)]
    pub snippet: String,

    #[serde(default)]
    pub score: f64,
}

impl MultitextMatch {
    /// Multitext scores are shown truncated, not normalized
    pub fn display_score(&self) -> i64 {
        if self.score.is_finite() {
            self.score.floor() as i64
        } else {
            0
        }
    }
}

/// Body of `GET /parallels/{id}`, also optionally embedded in the submission response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultsBody {
    #[serde(default)]
    pub parallels: Option<Vec<Parallel>>,

    #[serde(default)]
    pub max_score: Option<f64>,

    #[serde(default)]
    pub total_count: Option<u64>,
}

/// One page of normalized results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    pub parallels: Vec<Parallel>,
    pub total_count: u64,
    /// Maximum raw score reported by the server, before flooring
    pub max_score: f64,
}

fn deserialize_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

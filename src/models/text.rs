use serde::{Deserialize, Serialize};
use validator::Validate;

/// A source or target text known to the search backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TextReference {
    /// Database id of the text
    #[validate(length(min = 1))]
    pub object_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Year of composition; negative for BCE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(default)]
    pub is_prose: bool,
}

impl TextReference {
    /// Create a reference carrying only the object id
    pub fn new(object_id: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            author: None,
            title: None,
            year: None,
            is_prose: false,
        }
    }

    /// Attach author and title metadata
    pub fn with_work(mut self, author: impl Into<String>, title: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self.title = Some(title.into());
        self
    }

    pub fn has_id(&self) -> bool {
        !self.object_id.trim().is_empty()
    }

    /// Human-readable label, falling back to the object id
    pub fn label(&self) -> String {
        match (&self.author, &self.title) {
            (Some(author), Some(title)) => format!("{} {}", author, title),
            (None, Some(title)) => title.clone(),
            _ => self.object_id.clone(),
        }
    }
}

/// Texts currently chosen for a search
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchSelection {
    pub source: Option<TextReference>,
    pub target: Option<TextReference>,

    /// Additional texts for multitext cross-referencing
    #[serde(default)]
    pub multitext: Vec<TextReference>,
}

impl SearchSelection {
    pub fn new(source: TextReference, target: TextReference) -> Self {
        Self {
            source: Some(source),
            target: Some(target),
            multitext: Vec::new(),
        }
    }

    /// Both source and target are chosen and carry an object id
    pub fn search_ready(&self) -> bool {
        let has = |text: &Option<TextReference>| text.as_ref().map_or(false, |t| t.has_id());
        has(&self.source) && has(&self.target)
    }

    /// A regular search is possible and at least one extra corpus text is selected
    pub fn multitext_ready(&self) -> bool {
        self.search_ready() && !self.multitext.is_empty()
    }
}

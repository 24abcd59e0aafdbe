use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: i64,
    pub text: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub active: bool,
}

impl Quote {
    pub fn apply(&mut self, update: QuoteUpdate) {
        if let Some(text) = update.text {
            self.text = text;
        }
        if let Some(author) = update.author {
            self.author = author;
        }
        if let Some(source) = update.source {
            self.source = Some(source).filter(|s| !s.is_empty());
        }
        if let Some(active) = update.active {
            self.active = active;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewQuote {
    pub text: String,
    pub author: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteUpdate {
    pub text: Option<String>,
    pub author: Option<String>,
    /// An empty string clears the source.
    pub source: Option<String>,
    pub active: Option<bool>,
}

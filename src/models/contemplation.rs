use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Answer;

/// A daily reflection question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contemplation {
    pub id: i64,
    pub question: String,
    pub active: bool,
    pub featured: bool,
    pub order: i64,
    #[serde(default)]
    pub votes: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<Answer>>,
}

impl Contemplation {
    pub fn apply(&mut self, update: ContemplationUpdate) {
        if let Some(question) = update.question {
            self.question = question;
        }
        if let Some(active) = update.active {
            self.active = active;
        }
        if let Some(featured) = update.featured {
            self.featured = featured;
        }
        if let Some(order) = update.order {
            self.order = order;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewContemplation {
    pub question: String,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContemplationUpdate {
    pub question: Option<String>,
    pub active: Option<bool>,
    pub featured: Option<bool>,
    pub order: Option<i64>,
}

/// One entry of a bulk reorder request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReorderItem {
    pub id: i64,
    pub order: i64,
}

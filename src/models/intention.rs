use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intention {
    pub id: i64,
    pub text: String,
    pub active: bool,
    pub order: i64,
}

impl Intention {
    pub fn apply(&mut self, update: IntentionUpdate) {
        if let Some(text) = update.text {
            self.text = text;
        }
        if let Some(active) = update.active {
            self.active = active;
        }
        if let Some(order) = update.order {
            self.order = order;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewIntention {
    pub text: String,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntentionUpdate {
    pub text: Option<String>,
    pub active: Option<bool>,
    pub order: Option<i64>,
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Paper color of a sticky note on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    Gold,
    Sage,
    Marble,
    Bronze,
    Terracotta,
}

impl NoteColor {
    pub const PALETTE: [NoteColor; 5] = [
        NoteColor::Gold,
        NoteColor::Sage,
        NoteColor::Marble,
        NoteColor::Bronze,
        NoteColor::Terracotta,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteColor::Gold => "gold",
            NoteColor::Sage => "sage",
            NoteColor::Marble => "marble",
            NoteColor::Bronze => "bronze",
            NoteColor::Terracotta => "terracotta",
        }
    }
}

impl fmt::Display for NoteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoteColor::PALETTE
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown note color: {s}"))
    }
}

/// Board coordinates as percentages of the board's width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A visitor's reflection, shown as a sticky note once approved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: i64,
    pub contemplation_id: Option<i64>,
    pub question: String,
    pub answer: String,
    pub author: String,
    pub color: NoteColor,
    pub position: Position,
    pub rotation: f64,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl Answer {
    pub fn apply(&mut self, update: AnswerUpdate) {
        if let Some(approved) = update.approved {
            self.approved = approved;
        }
        if let Some(answer) = update.answer {
            self.answer = answer;
        }
        if let Some(author) = update.author {
            self.author = author;
        }
        if let Some(color) = update.color {
            self.color = color;
        }
    }
}

/// Fully resolved answer ready to be written. Placement is fixed here and
/// never recomputed.
#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub contemplation_id: Option<i64>,
    pub question: String,
    pub answer: String,
    pub author: String,
    pub color: NoteColor,
    pub position: Position,
    pub rotation: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnswerUpdate {
    pub approved: Option<bool>,
    pub answer: Option<String>,
    pub author: Option<String>,
    pub color: Option<NoteColor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerFilter {
    #[default]
    Approved,
    Pending,
    All,
}

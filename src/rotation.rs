//! Deterministic selection of the featured item for the current day or hour.
//!
//! Everything here is pure: callers pass the clock reading in, so the same
//! inputs always give the same pick and the pick moves on at the day (or
//! hour) boundary without any scheduled job.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Contemplation, Intention, Quote};

/// Questions shown when no contemplation is active.
pub const BUILTIN_QUESTIONS: &[&str] = &[
    "What would you do today if you were not afraid?",
    "Which of your beliefs have you never examined?",
    "What is within your control right now, and what is not?",
    "When did you last change your mind about something important?",
    "What does a good life require of you this week?",
    "Whom do you admire, and what does that reveal about you?",
    "What are you pretending not to know?",
];

pub const BUILTIN_INTENTIONS: &[&str] = &[
    "Attend to what is in front of you.",
    "Speak only when it improves on silence.",
    "Choose the harder right over the easier wrong.",
    "Leave one thing better than you found it.",
    "Meet difficulty with curiosity.",
];

/// `(text, author)` pairs shown when no quote is active.
pub const BUILTIN_QUOTES: &[(&str, &str)] = &[
    ("The unexamined life is not worth living.", "Socrates"),
    ("We suffer more often in imagination than in reality.", "Seneca"),
    ("The impediment to action advances action. What stands in the way becomes the way.", "Marcus Aurelius"),
    ("No man ever steps in the same river twice.", "Heraclitus"),
    ("Happiness is the highest good, being a realization and perfect practice of virtue.", "Aristotle"),
    ("He who has a why to live can bear almost any how.", "Friedrich Nietzsche"),
];

/// An item that can take part in rotation.
pub trait Rotatable {
    fn is_active(&self) -> bool;

    fn is_featured(&self) -> bool {
        false
    }
}

impl Rotatable for Contemplation {
    fn is_active(&self) -> bool {
        self.active
    }

    fn is_featured(&self) -> bool {
        self.featured
    }
}

impl Rotatable for Intention {
    fn is_active(&self) -> bool {
        self.active
    }
}

impl Rotatable for Quote {
    fn is_active(&self) -> bool {
        self.active
    }
}

/// Zero-based day of the year in the clock's own time zone.
pub fn day_of_year<Tz: TimeZone>(now: &DateTime<Tz>) -> u32 {
    now.ordinal0()
}

/// Decimal fold of the calendar hour, e.g. 2025-03-14 09h -> 2025031409.
pub fn hourly_seed<Tz: TimeZone>(now: &DateTime<Tz>) -> u64 {
    let year = now.year().max(0) as u64;
    year * 1_000_000 + now.month() as u64 * 10_000 + now.day() as u64 * 100 + now.hour() as u64
}

pub fn daily_index<Tz: TimeZone>(now: &DateTime<Tz>, len: usize, offset: u32) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some((day_of_year(now) as usize + offset as usize) % len)
}

pub fn hourly_index<Tz: TimeZone>(now: &DateTime<Tz>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some((hourly_seed(now) % len as u64) as usize)
}

/// Pick today's item among the active candidates. A featured active
/// candidate wins over the rotation.
pub fn select_daily<'a, T, Tz>(now: &DateTime<Tz>, candidates: &'a [T], offset: u32) -> Option<&'a T>
where
    T: Rotatable,
    Tz: TimeZone,
{
    let pool: Vec<&T> = candidates.iter().filter(|c| c.is_active()).collect();
    if let Some(featured) = pool.iter().find(|c| c.is_featured()) {
        return Some(*featured);
    }
    daily_index(now, pool.len(), offset).map(|i| pool[i])
}

pub fn select_hourly<'a, T, Tz>(now: &DateTime<Tz>, candidates: &'a [T]) -> Option<&'a T>
where
    T: Rotatable,
    Tz: TimeZone,
{
    let pool: Vec<&T> = candidates.iter().filter(|c| c.is_active()).collect();
    if let Some(featured) = pool.iter().find(|c| c.is_featured()) {
        return Some(*featured);
    }
    hourly_index(now, pool.len()).map(|i| pool[i])
}

/// Today's contemplation, falling back to the built-in list. Built-in picks
/// carry id 0, which the store never assigns.
pub fn todays_contemplation<Tz: TimeZone>(
    now: &DateTime<Tz>,
    candidates: &[Contemplation],
    offset: u32,
) -> Contemplation {
    if let Some(pick) = select_daily(now, candidates, offset) {
        return pick.clone();
    }
    let index = daily_index(now, BUILTIN_QUESTIONS.len(), offset).unwrap_or(0);
    Contemplation {
        id: 0,
        question: BUILTIN_QUESTIONS[index].to_string(),
        active: true,
        featured: false,
        order: index as i64,
        votes: 0,
        created_at: Utc::now(),
        answers: None,
    }
}

pub fn todays_intention<Tz: TimeZone>(
    now: &DateTime<Tz>,
    candidates: &[Intention],
    offset: u32,
) -> Intention {
    if let Some(pick) = select_daily(now, candidates, offset) {
        return pick.clone();
    }
    let index = daily_index(now, BUILTIN_INTENTIONS.len(), offset).unwrap_or(0);
    Intention {
        id: 0,
        text: BUILTIN_INTENTIONS[index].to_string(),
        active: true,
        order: index as i64,
    }
}

pub fn current_quote<Tz: TimeZone>(now: &DateTime<Tz>, candidates: &[Quote]) -> Quote {
    if let Some(pick) = select_hourly(now, candidates) {
        return pick.clone();
    }
    let index = hourly_index(now, BUILTIN_QUOTES.len()).unwrap_or(0);
    let (text, author) = BUILTIN_QUOTES[index];
    Quote {
        id: 0,
        text: text.to_string(),
        author: author.to_string(),
        source: None,
        active: true,
    }
}

/// Everything the front page rotates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Today {
    pub contemplation: Contemplation,
    pub intention: Intention,
    pub quote: Quote,
}

impl Today {
    pub fn select<Tz: TimeZone>(
        now: &DateTime<Tz>,
        contemplations: &[Contemplation],
        intentions: &[Intention],
        quotes: &[Quote],
        offset: u32,
    ) -> Self {
        Self {
            contemplation: todays_contemplation(now, contemplations, offset),
            intention: todays_intention(now, intentions, offset),
            quote: current_quote(now, quotes),
        }
    }
}

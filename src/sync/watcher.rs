//! Follows a server's contemplations and reports today's pick.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, FixedOffset, Local};

use crate::models::Contemplation;
use crate::rotation::todays_contemplation;
use crate::votes::{VoteStore, VoteTracker};

use super::PollHandler;

pub type Clock = Arc<dyn Fn() -> DateTime<FixedOffset> + Send + Sync>;

pub struct ContemplationWatcher<S: VoteStore> {
    votes: Mutex<VoteTracker<S>>,
    current: Mutex<Option<Contemplation>>,
    rotation_offset: u32,
    clock: Clock,
}

impl<S: VoteStore> ContemplationWatcher<S> {
    pub fn new(votes: VoteTracker<S>, rotation_offset: u32) -> Self {
        Self::with_clock(votes, rotation_offset, Arc::new(|| Local::now().fixed_offset()))
    }

    pub fn with_clock(votes: VoteTracker<S>, rotation_offset: u32, clock: Clock) -> Self {
        Self {
            votes: Mutex::new(votes),
            current: Mutex::new(None),
            rotation_offset,
            clock,
        }
    }

    /// The last contemplation reported.
    pub fn current(&self) -> Option<Contemplation> {
        self.current.lock().ok().and_then(|c| c.clone())
    }
}

impl<S: VoteStore + 'static> PollHandler<Vec<Contemplation>> for ContemplationWatcher<S> {
    /// Re-selects on every snapshot, changed or not, so the pick follows
    /// the calendar even when the server data stays put.
    fn on_success(&self, contemplations: Vec<Contemplation>, changed: bool) {
        let server: HashMap<i64, i64> = contemplations.iter().map(|c| (c.id, c.votes)).collect();
        let merged = match self.votes.lock() {
            Ok(mut votes) => {
                if changed {
                    let ids: Vec<i64> = contemplations.iter().map(|c| c.id).collect();
                    votes.seed(&server, &ids, &mut rand::rng());
                }
                votes.votes(&server)
            }
            Err(_) => return,
        };

        let pick = todays_contemplation(&(self.clock)(), &contemplations, self.rotation_offset);

        let Ok(mut current) = self.current.lock() else {
            return;
        };
        let same = current
            .as_ref()
            .is_some_and(|c| c.id == pick.id && c.question == pick.question);
        if !same {
            let votes = merged.get(&pick.id).copied().unwrap_or(pick.votes);
            tracing::info!(id = pick.id, votes, "Contemplation: {}", pick.question);
            *current = Some(pick);
        }
    }
}

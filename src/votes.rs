//! Per-device vote bookkeeping.
//!
//! The ledger only stops the same device from voting twice; the server does
//! not check identity. Persistence is best-effort: a store that cannot be
//! read or written just means votes do not survive a restart.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::Mutex;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteLedger {
    #[serde(default)]
    pub counts: BTreeMap<i64, i64>,
    #[serde(default)]
    pub voted: BTreeSet<i64>,
}

/// Where a ledger lives between runs.
pub trait VoteStore: Send + Sync {
    fn load(&self) -> Result<Option<VoteLedger>>;
    fn save(&self, ledger: &VoteLedger) -> Result<()>;
}

pub struct FileVoteStore {
    path: PathBuf,
}

impl FileVoteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl VoteStore for FileVoteStore {
    fn load(&self) -> Result<Option<VoteLedger>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, ledger: &VoteLedger) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(ledger)?)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryVoteStore {
    ledger: Mutex<Option<VoteLedger>>,
}

impl VoteStore for MemoryVoteStore {
    fn load(&self) -> Result<Option<VoteLedger>> {
        Ok(self.ledger.lock().map(|l| l.clone()).unwrap_or_default())
    }

    fn save(&self, ledger: &VoteLedger) -> Result<()> {
        if let Ok(mut slot) = self.ledger.lock() {
            *slot = Some(ledger.clone());
        }
        Ok(())
    }
}

pub struct VoteTracker<S: VoteStore> {
    store: S,
    ledger: VoteLedger,
    baseline: RangeInclusive<i64>,
}

impl<S: VoteStore> VoteTracker<S> {
    pub fn open(store: S, baseline_min: u32, baseline_max: u32) -> Self {
        let ledger = match store.load() {
            Ok(ledger) => ledger.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Could not read vote ledger, starting empty: {}", e);
                VoteLedger::default()
            }
        };
        let (low, high) = (baseline_min.min(baseline_max), baseline_min.max(baseline_max));
        Self {
            store,
            ledger,
            baseline: i64::from(low)..=i64::from(high),
        }
    }

    pub fn ledger(&self) -> &VoteLedger {
        &self.ledger
    }

    pub fn has_voted(&self, id: i64) -> bool {
        self.ledger.voted.contains(&id)
    }

    /// Record a vote from this device. Returns false, changing nothing, when
    /// the device already voted for `id`.
    pub fn vote(&mut self, id: i64) -> bool {
        if !self.ledger.voted.insert(id) {
            return false;
        }
        *self.ledger.counts.entry(id).or_insert(0) += 1;
        self.persist();
        true
    }

    /// Send a vote through `submit` and record it on this device only once
    /// `submit` succeeded, so a failed request can be retried. Returns
    /// `None` without calling `submit` when the device already voted.
    pub async fn vote_with<F, Fut>(&mut self, id: i64, submit: F) -> Result<Option<i64>>
    where
        F: FnOnce(i64) -> Fut,
        Fut: Future<Output = Result<i64>>,
    {
        if self.has_voted(id) {
            return Ok(None);
        }
        let total = submit(id).await?;
        self.vote(id);
        Ok(Some(total))
    }

    /// Give every id without a recorded count a starting value: the server's
    /// count when it has one, otherwise a random baseline.
    pub fn seed<R: Rng + ?Sized>(&mut self, server: &HashMap<i64, i64>, ids: &[i64], rng: &mut R) {
        let mut changed = false;
        for &id in ids {
            if self.ledger.counts.contains_key(&id) {
                continue;
            }
            let count = match server.get(&id) {
                Some(&count) if count > 0 => count,
                _ => rng.random_range(self.baseline.clone()),
            };
            self.ledger.counts.insert(id, count);
            changed = true;
        }
        if changed {
            self.persist();
        }
    }

    /// Server counts overlaid with this device's counts for ids it voted on.
    pub fn votes(&self, server: &HashMap<i64, i64>) -> BTreeMap<i64, i64> {
        let mut merged: BTreeMap<i64, i64> = self.ledger.counts.clone();
        for (&id, &count) in server {
            if !self.ledger.voted.contains(&id) {
                merged.insert(id, count.max(merged.get(&id).copied().unwrap_or(0)));
            }
        }
        merged
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.ledger) {
            tracing::warn!("Could not save vote ledger: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tracker() -> VoteTracker<MemoryVoteStore> {
        VoteTracker::open(MemoryVoteStore::default(), 12, 48)
    }

    #[test]
    fn voting_twice_counts_once() {
        let mut votes = tracker();
        votes.seed(&HashMap::from([(1, 20)]), &[1], &mut StdRng::seed_from_u64(7));

        assert!(votes.vote(1));
        assert!(!votes.vote(1));
        assert_eq!(votes.ledger().counts[&1], 21);
        assert!(votes.has_voted(1));
    }

    #[tokio::test]
    async fn failed_submission_leaves_no_local_vote() {
        let mut votes = tracker();
        votes.seed(&HashMap::from([(7, 20)]), &[7], &mut StdRng::seed_from_u64(7));

        let failed = votes
            .vote_with(7, |_| async { Err::<i64, _>(AppError::Other(anyhow::anyhow!("HTTP 500"))) })
            .await;
        assert!(failed.is_err());
        assert!(!votes.has_voted(7));
        assert_eq!(votes.ledger().counts[&7], 20);

        let retried = votes.vote_with(7, |_| async { Ok::<_, AppError>(21) }).await;
        assert_eq!(retried.unwrap(), Some(21));
        assert!(votes.has_voted(7));
        assert_eq!(votes.ledger().counts[&7], 21);

        let mut sent = 0;
        let again = votes
            .vote_with(7, |_| {
                sent += 1;
                async { Ok::<_, AppError>(22) }
            })
            .await;
        assert_eq!(again.unwrap(), None);
        assert_eq!(sent, 0);
    }

    #[test]
    fn unseen_ids_get_a_baseline_in_range() {
        let mut votes = tracker();
        let mut rng = StdRng::seed_from_u64(42);
        votes.seed(&HashMap::new(), &[1, 2, 3], &mut rng);
        for id in [1, 2, 3] {
            let count = votes.ledger().counts[&id];
            assert!((12..=48).contains(&count), "baseline {count} out of range");
        }

        // Seeding again leaves existing counts alone.
        let before = votes.ledger().clone();
        votes.seed(&HashMap::from([(1, 500)]), &[1, 2, 3], &mut rng);
        assert_eq!(votes.ledger(), &before);
    }

    #[test]
    fn local_counts_win_for_ids_voted_here() {
        let mut votes = tracker();
        votes.seed(&HashMap::from([(1, 10), (2, 10)]), &[1, 2], &mut StdRng::seed_from_u64(1));
        votes.vote(1);

        let server = HashMap::from([(1, 3), (2, 30), (3, 5)]);
        let merged = votes.votes(&server);
        assert_eq!(merged[&1], 11);
        assert_eq!(merged[&2], 30);
        assert_eq!(merged[&3], 5);
    }

    #[test]
    fn ledger_survives_reopen_through_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("votes.json");

        let mut first = VoteTracker::open(FileVoteStore::new(&path), 12, 48);
        first.seed(&HashMap::from([(9, 4)]), &[9], &mut StdRng::seed_from_u64(3));
        assert!(first.vote(9));

        let mut second = VoteTracker::open(FileVoteStore::new(&path), 12, 48);
        assert!(second.has_voted(9));
        assert!(!second.vote(9));
        assert_eq!(second.ledger().counts[&9], 5);
    }

    #[test]
    fn unreadable_store_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("votes.json");
        std::fs::write(&path, "not json").unwrap();

        let mut votes = VoteTracker::open(FileVoteStore::new(&path), 12, 48);
        assert_eq!(votes.ledger(), &VoteLedger::default());
        assert!(votes.vote(1));
    }
}

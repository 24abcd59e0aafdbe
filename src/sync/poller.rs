//! Timer-driven re-fetching of server state.
//!
//! A coordinator fetches once on start and then on every tick. The tick is
//! `interval` while the view is visible and `background_interval` while it is
//! hidden; coming back into view triggers one extra fetch right away.
//!
//! Fetches are spawned, not awaited by the loop, so a slow fetch never delays
//! the next tick and two fetches may be in flight at once. Whichever resolves
//! last is what the handler saw last. Errors go to the handler and the loop
//! carries on with the next tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    pub background_interval: Duration,
}

impl PollOptions {
    pub fn period_for(&self, visibility: Visibility) -> Duration {
        match visibility {
            Visibility::Visible => self.interval,
            Visibility::Hidden => self.background_interval,
        }
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            background_interval: Duration::from_secs(60),
        }
    }
}

/// Receives the outcome of every fetch.
pub trait PollHandler<T>: Send + Sync + 'static {
    /// `changed` is false when the snapshot equals the previous one delivered.
    fn on_success(&self, snapshot: T, changed: bool);

    fn on_error(&self, error: AppError) {
        tracing::warn!("Refresh failed, will retry on next tick: {}", error);
    }
}

struct Shared<T, H> {
    handler: H,
    last: Mutex<Option<T>>,
}

/// Running coordinator. Dropping it stops the timer; fetches already in
/// flight finish but their results are discarded.
pub struct PollHandle {
    task: JoinHandle<()>,
    stopped: Arc<AtomicBool>,
}

impl PollHandle {
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.task.abort();
    }
}

pub struct PollCoordinator;

impl PollCoordinator {
    pub fn start<T, F, H>(
        options: PollOptions,
        fetch: F,
        handler: H,
        mut visibility: watch::Receiver<Visibility>,
    ) -> PollHandle
    where
        T: PartialEq + Clone + Send + 'static,
        F: Fn() -> BoxFuture<'static, Result<T>> + Send + Sync + 'static,
        H: PollHandler<T>,
    {
        let stopped = Arc::new(AtomicBool::new(false));
        let shared = Arc::new(Shared {
            handler,
            last: Mutex::new(None),
        });
        let fetch = Arc::new(fetch);
        let flag = Arc::clone(&stopped);

        let task = tokio::spawn(async move {
            let mut current = *visibility.borrow_and_update();
            let mut period = options.period_for(current);
            let mut watching = true;

            spawn_fetch(&fetch, &shared, &flag);
            let mut next_tick = Instant::now() + period;

            loop {
                tokio::select! {
                    _ = tokio::time::sleep_until(next_tick) => {
                        spawn_fetch(&fetch, &shared, &flag);
                        next_tick = Instant::now() + period;
                    }
                    changed = visibility.changed(), if watching => {
                        if changed.is_err() {
                            // Sender gone: keep polling at the current rate.
                            watching = false;
                            continue;
                        }
                        let next = *visibility.borrow_and_update();
                        if next == current {
                            continue;
                        }
                        tracing::debug!(?current, ?next, "Visibility changed");
                        if current == Visibility::Hidden && next == Visibility::Visible {
                            spawn_fetch(&fetch, &shared, &flag);
                        }
                        current = next;
                        period = options.period_for(current);
                        next_tick = Instant::now() + period;
                    }
                }
            }
        });

        PollHandle { task, stopped }
    }
}

fn spawn_fetch<T, F, H>(fetch: &Arc<F>, shared: &Arc<Shared<T, H>>, stopped: &Arc<AtomicBool>)
where
    T: PartialEq + Clone + Send + 'static,
    F: Fn() -> BoxFuture<'static, Result<T>> + Send + Sync + 'static,
    H: PollHandler<T>,
{
    let future = fetch();
    let shared = Arc::clone(shared);
    let stopped = Arc::clone(stopped);

    tokio::spawn(async move {
        let result = future.await;
        if stopped.load(Ordering::SeqCst) {
            return;
        }
        match result {
            Ok(snapshot) => {
                let changed = {
                    let mut last = shared.last.lock().await;
                    let changed = last.as_ref() != Some(&snapshot);
                    *last = Some(snapshot.clone());
                    changed
                };
                shared.handler.on_success(snapshot, changed);
            }
            Err(e) => shared.handler.on_error(e),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Recorder {
        successes: AtomicUsize,
        changes: AtomicUsize,
        errors: AtomicUsize,
    }

    struct Probe(Arc<Recorder>);

    impl PollHandler<usize> for Probe {
        fn on_success(&self, _snapshot: usize, changed: bool) {
            self.0.successes.fetch_add(1, Ordering::SeqCst);
            if changed {
                self.0.changes.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn on_error(&self, _error: AppError) {
            self.0.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting_fetch(
        calls: Arc<AtomicUsize>,
    ) -> impl Fn() -> BoxFuture<'static, Result<usize>> + Send + Sync + 'static {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok(n) }.boxed()
        }
    }

    fn options() -> PollOptions {
        PollOptions {
            interval: Duration::from_millis(10_000),
            background_interval: Duration::from_millis(60_000),
        }
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn polls_at_the_foreground_interval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let recorder = Arc::new(Recorder::default());
        let (_tx, rx) = watch::channel(Visibility::Visible);

        let _handle = PollCoordinator::start(
            options(),
            counting_fetch(Arc::clone(&calls)),
            Probe(Arc::clone(&recorder)),
            rx,
        );

        sleep_ms(500).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        sleep_ms(10_000).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        sleep_ms(20_000).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(recorder.successes.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn hidden_view_backs_off_and_refetches_on_return() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(Visibility::Hidden);

        let _handle = PollCoordinator::start(
            options(),
            counting_fetch(Arc::clone(&calls)),
            Probe(Arc::new(Recorder::default())),
            rx,
        );

        sleep_ms(500).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        sleep_ms(30_000).await; // t = 30.5s
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        sleep_ms(30_000).await; // t = 60.5s
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        sleep_ms(9_500).await; // t = 70s
        tx.send(Visibility::Visible).unwrap();
        sleep_ms(500).await; // t = 70.5s, immediate fetch
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        sleep_ms(10_000).await; // t = 80.5s, foreground rate again
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn hiding_switches_to_the_background_rate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(Visibility::Visible);

        let _handle = PollCoordinator::start(
            options(),
            counting_fetch(Arc::clone(&calls)),
            Probe(Arc::new(Recorder::default())),
            rx,
        );

        sleep_ms(500).await;
        tx.send(Visibility::Hidden).unwrap();
        sleep_ms(59_000).await; // t = 59.5s
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        sleep_ms(1_500).await; // t = 61s
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_do_not_stop_polling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let recorder = Arc::new(Recorder::default());
        let (_tx, rx) = watch::channel(Visibility::Visible);
        let counter = Arc::clone(&calls);

        let _handle = PollCoordinator::start(
            options(),
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n % 2 == 1 {
                        Err(AppError::Other(anyhow::anyhow!("offline")))
                    } else {
                        Ok(n)
                    }
                }
                .boxed()
            },
            Probe(Arc::clone(&recorder)),
            rx,
        );

        sleep_ms(40_500).await;
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(recorder.errors.load(Ordering::SeqCst), 3);
        assert_eq!(recorder.successes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_snapshots_are_flagged() {
        let recorder = Arc::new(Recorder::default());
        let (_tx, rx) = watch::channel(Visibility::Visible);

        let _handle = PollCoordinator::start(
            options(),
            || async { Ok(42usize) }.boxed(),
            Probe(Arc::clone(&recorder)),
            rx,
        );

        sleep_ms(30_500).await;
        assert_eq!(recorder.successes.load(Ordering::SeqCst), 4);
        assert_eq!(recorder.changes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetches_overlap_instead_of_queueing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let recorder = Arc::new(Recorder::default());
        let (_tx, rx) = watch::channel(Visibility::Visible);
        let counter = Arc::clone(&calls);

        let _handle = PollCoordinator::start(
            options(),
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    tokio::time::sleep(Duration::from_secs(25)).await;
                    Ok(n)
                }
                .boxed()
            },
            Probe(Arc::clone(&recorder)),
            rx,
        );

        sleep_ms(20_500).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(recorder.successes.load(Ordering::SeqCst), 0);
        sleep_ms(10_000).await; // t = 30.5s, only the first fetch has resolved
        assert_eq!(recorder.successes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stopping_discards_in_flight_results() {
        let recorder = Arc::new(Recorder::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let (_tx, rx) = watch::channel(Visibility::Visible);

        let handle = PollCoordinator::start(
            options(),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(1usize)
                }
                .boxed()
            },
            Probe(Arc::clone(&recorder)),
            rx,
        );

        sleep_ms(1_000).await;
        handle.stop();
        sleep_ms(60_000).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.successes.load(Ordering::SeqCst), 0);
    }
}

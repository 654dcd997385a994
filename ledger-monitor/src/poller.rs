//! Fixed-interval poller driving a set of independent async sources.
//!
//! All sources run immediately on [`Poller::start`] and then on every tick of a single
//! shared timer. Each source runs in its own task, so a source that fails, panics or
//! hangs never holds up the others or the timer.

use std::{
    fmt::Debug,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use futures::{FutureExt, future::BoxFuture};
use smol_str::SmolStr;
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::error::FetchError;

/// Default poll period, matching the server's own status cache lifetime.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

pub type SourceFuture = BoxFuture<'static, Result<(), FetchError>>;

/// Named async action invoked once per poll cycle.
#[derive(Clone)]
pub struct PollSource {
    pub name: SmolStr,
    run: Arc<dyn Fn() -> SourceFuture + Send + Sync>,
}

impl Debug for PollSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollSource").field("name", &self.name).finish()
    }
}

impl PollSource {
    pub fn new<F>(name: impl Into<SmolStr>, run: F) -> Self
    where
        F: Fn() -> SourceFuture + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            run: Arc::new(run),
        }
    }

    /// Spawn one invocation of this source, logging any failure.
    fn spawn(&self) -> JoinHandle<()> {
        let name = self.name.clone();
        let future = (self.run)();
        tokio::spawn(async move {
            if let Err(error) = future.await {
                warn!(source = %name, %error, "poll source failed");
            }
        })
    }
}

/// Owner of the single poll timer.
///
/// Dropping the poller stops the timer. Invocations already in flight are left to finish.
#[derive(Debug)]
pub struct Poller {
    interval: Duration,
    sources: Arc<[PollSource]>,
    timer: Option<JoinHandle<()>>,
    cycles: Arc<AtomicU64>,
    started_at: Option<Instant>,
    paused: bool,
}

impl Default for Poller {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            sources: Arc::from(Vec::new()),
            timer: None,
            cycles: Arc::new(AtomicU64::new(0)),
            started_at: None,
            paused: false,
        }
    }
}

impl Poller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every source now and then every `interval`.
    ///
    /// Calling `start` on a running poller replaces the existing timer.
    pub fn start(&mut self, sources: Vec<PollSource>, interval: Duration) {
        self.clear_timer();

        self.sources = Arc::from(sources);
        self.interval = interval;
        self.cycles = Arc::new(AtomicU64::new(0));
        self.started_at = Some(Instant::now());
        self.paused = false;

        info!(
            sources = self.sources.len(),
            interval_ms = interval.as_millis() as u64,
            "poller started"
        );

        fire_cycle(&self.sources, &self.cycles);
        self.timer = Some(self.spawn_timer(Instant::now() + interval));
    }

    /// Stop polling. Sources must be supplied again to restart.
    pub fn stop(&mut self) {
        if self.clear_timer() {
            info!(cycles = self.cycles(), "poller stopped");
        }
        self.paused = false;
        self.started_at = None;
    }

    /// Suspend the timer, keeping sources and cycle count.
    pub fn pause(&mut self) {
        if self.clear_timer() {
            self.paused = true;
            info!(cycles = self.cycles(), "poller paused");
        }
    }

    /// Restart a paused timer. The next cycle runs one full interval from now.
    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        info!("poller resumed");
        self.timer = Some(self.spawn_timer(Instant::now() + self.interval));
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Number of cycles fired since the last [`Poller::start`].
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    fn clear_timer(&mut self) -> bool {
        match self.timer.take() {
            Some(timer) => {
                timer.abort();
                true
            }
            None => false,
        }
    }

    fn spawn_timer(&self, first_tick: Instant) -> JoinHandle<()> {
        let sources = Arc::clone(&self.sources);
        let cycles = Arc::clone(&self.cycles);
        let mut ticker = tokio::time::interval_at(first_tick, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tokio::spawn(async move {
            loop {
                ticker.tick().await;
                fire_cycle(&sources, &cycles);
            }
        })
    }
}

fn fire_cycle(sources: &[PollSource], cycles: &AtomicU64) {
    let cycle = cycles.fetch_add(1, Ordering::Relaxed) + 1;
    debug!(cycle, sources = sources.len(), "poll cycle");
    for source in sources {
        source.spawn();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.clear_timer();
    }
}

/// Run every source once and wait for all of them to settle.
pub async fn run_once(sources: &[PollSource]) {
    futures::future::join_all(sources.iter().map(|source| {
        let name = source.name.clone();
        source.spawn().map(move |result| {
            if let Err(error) = result {
                warn!(source = %name, %error, "poll source aborted");
            }
        })
    }))
    .await;
}

//! Periodic feed refresh

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::server::state::{FeedServer, FeedSource};

/// Decides whether a refresh is due
///
/// The first check is always due; afterwards a refresh is due once
/// `interval` has elapsed since the last recorded one.
#[derive(Debug, Clone)]
pub struct RefreshSchedule {
    interval: Duration,
    last_refresh: Option<Instant>,
}

impl RefreshSchedule {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_refresh: None,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_refresh {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    pub fn record(&mut self, now: Instant) {
        self.last_refresh = Some(now);
    }
}

/// Checks the schedule every `poll` and refreshes `server` when due
///
/// Runs until the task is dropped.
pub async fn run_scheduler<S: FeedSource>(
    server: Arc<FeedServer<S>>,
    poll: Duration,
    refresh: Duration,
) {
    let mut schedule = RefreshSchedule::new(refresh);
    let mut ticker = interval(poll);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let now = Instant::now();
        if !schedule.is_due(now) {
            continue;
        }
        schedule.record(now);
        info!("Refreshing feed");
        server.refresh().await;
        debug!("Next refresh in {:?}", refresh);
    }
}

pub fn spawn_scheduler<S: FeedSource>(
    server: Arc<FeedServer<S>>,
    poll: Duration,
    refresh: Duration,
) -> JoinHandle<()> {
    tokio::spawn(run_scheduler(server, poll, refresh))
}

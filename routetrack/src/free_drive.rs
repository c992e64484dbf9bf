//! Enhanced location updates while no route is being followed.
//!
//! In free drive the engine still matches the vehicle to the road network,
//! but nothing asks it for status. [`FreeDriveUpdater`] polls the navigator
//! on a fixed interval, projects each status onto the latest raw sample and
//! broadcasts the result to subscribers.
//!
//! # Usage
//!
//! ```ignore
//! let updater = FreeDriveUpdater::new(Arc::clone(&navigator));
//! let mut locations = updater.subscribe();
//! updater.start(&tokio::runtime::Handle::current());
//!
//! // Positioning callback
//! updater.on_location(sample);
//!
//! while let Ok(location) = locations.recv().await {
//!     assert_eq!(location.provider, ENHANCED_PROVIDER);
//! }
//!
//! updater.stop();
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::fix::PositionSample;
use crate::navigator::Navigator;
use crate::projection::{project_snapped_location_as, Location, ENHANCED_PROVIDER};

/// Default interval between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Default delay before the first poll.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1500);

/// Default lag compensation applied to each status request (milliseconds).
///
/// The same lag active guidance uses.
pub const DEFAULT_LAG_MILLIS: i64 = 1500;

/// Default number of raw samples kept.
pub const DEFAULT_CACHE_SIZE: usize = 5;

/// Capacity of the enhanced location channel.
const CHANNEL_CAPACITY: usize = 16;

/// Configuration for [`FreeDriveUpdater`].
#[derive(Debug, Clone, PartialEq)]
pub struct FreeDriveConfig {
    pub poll_interval: Duration,
    pub initial_delay: Duration,
    /// Lag compensation passed to `retrieve_status`.
    pub lag_millis: i64,
    /// Raw samples kept; the oldest is evicted first.
    pub cache_size: usize,
}

impl Default for FreeDriveConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            initial_delay: DEFAULT_INITIAL_DELAY,
            lag_millis: DEFAULT_LAG_MILLIS,
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

impl FreeDriveConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_lag_millis(mut self, lag_millis: i64) -> Self {
        self.lag_millis = lag_millis;
        self
    }

    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }
}

/// Latest raw sample plus a short bounded history.
#[derive(Debug)]
struct SampleCache {
    latest: Option<PositionSample>,
    recent: VecDeque<PositionSample>,
    capacity: usize,
}

impl SampleCache {
    fn new(capacity: usize) -> Self {
        Self {
            latest: None,
            recent: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, sample: PositionSample) {
        if self.capacity > 0 {
            while self.recent.len() >= self.capacity {
                self.recent.pop_front();
            }
            self.recent.push_back(sample.clone());
        }
        self.latest = Some(sample);
    }

    fn clear(&mut self) {
        self.latest = None;
        self.recent.clear();
    }
}

struct RunningTask {
    cancellation: CancellationToken,
    handle: JoinHandle<()>,
}

/// Periodic enhanced-location driver for free drive.
pub struct FreeDriveUpdater<E> {
    navigator: Arc<Navigator<E>>,
    config: FreeDriveConfig,
    samples: Arc<Mutex<SampleCache>>,
    location_tx: broadcast::Sender<Location>,
    running: Mutex<Option<RunningTask>>,
}

impl<E: Engine + 'static> FreeDriveUpdater<E> {
    pub fn new(navigator: Arc<Navigator<E>>) -> Self {
        Self::with_config(navigator, FreeDriveConfig::default())
    }

    pub fn with_config(navigator: Arc<Navigator<E>>, config: FreeDriveConfig) -> Self {
        let (location_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            navigator,
            samples: Arc::new(Mutex::new(SampleCache::new(config.cache_size))),
            config,
            location_tx,
            running: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &FreeDriveConfig {
        &self.config
    }

    /// Receive every enhanced location broadcast from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Location> {
        self.location_tx.subscribe()
    }

    /// Record a raw sample and forward it to the navigator.
    pub fn on_location(&self, sample: PositionSample) {
        self.navigator.update_location(&sample);
        self.samples.lock().push(sample);
    }

    /// The most recent raw sample.
    pub fn latest_sample(&self) -> Option<PositionSample> {
        self.samples.lock().latest.clone()
    }

    /// Cached raw samples, oldest first.
    pub fn cached_locations(&self) -> Vec<PositionSample> {
        self.samples.lock().recent.iter().cloned().collect()
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Start polling on `runtime`. Returns `false` if already running.
    pub fn start(&self, runtime: &Handle) -> bool {
        let mut running = self.running.lock();
        if running
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
        {
            return false;
        }

        let cancellation = CancellationToken::new();
        let handle = runtime.spawn(poll_loop(
            Arc::clone(&self.navigator),
            Arc::clone(&self.samples),
            self.location_tx.clone(),
            self.config.clone(),
            cancellation.clone(),
        ));
        *running = Some(RunningTask {
            cancellation,
            handle,
        });
        info!(
            poll_ms = self.config.poll_interval.as_millis() as u64,
            "Free drive updates started"
        );
        true
    }

    /// Stop polling and forget cached samples.
    pub fn stop(&self) {
        if let Some(task) = self.running.lock().take() {
            task.cancellation.cancel();
            info!("Free drive updates stopped");
        }
        self.samples.lock().clear();
    }
}

impl<E> Drop for FreeDriveUpdater<E> {
    fn drop(&mut self) {
        if let Some(task) = self.running.get_mut().take() {
            task.cancellation.cancel();
        }
    }
}

async fn poll_loop<E: Engine + 'static>(
    navigator: Arc<Navigator<E>>,
    samples: Arc<Mutex<SampleCache>>,
    location_tx: broadcast::Sender<Location>,
    config: FreeDriveConfig,
    cancellation: CancellationToken,
) {
    let poll_interval = config.poll_interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval_at(Instant::now() + config.initial_delay, poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // The session lock blocks, so the poll runs off the worker thread
                let navigator = Arc::clone(&navigator);
                let samples = Arc::clone(&samples);
                let location_tx = location_tx.clone();
                let lag_millis = config.lag_millis;
                let poll = tokio::task::spawn_blocking(move || {
                    poll_once(&navigator, &samples, &location_tx, lag_millis)
                });
                if let Err(e) = poll.await {
                    warn!(error = %e, "Free drive poll failed");
                }
            }
            _ = cancellation.cancelled() => {
                debug!("Free drive poll loop stopped");
                break;
            }
        }
    }
}

fn poll_once<E: Engine>(
    navigator: &Navigator<E>,
    samples: &Mutex<SampleCache>,
    location_tx: &broadcast::Sender<Location>,
    lag_millis: i64,
) {
    let Some(raw) = samples.lock().latest.clone() else {
        return;
    };

    let status = navigator.retrieve_status(Utc::now(), lag_millis);
    let location = project_snapped_location_as(&status, &Location::from(&raw), ENHANCED_PROVIDER);
    debug!(
        lat = format!("{:.6}", location.latitude),
        lon = format!("{:.6}", location.longitude),
        state = %status.route_state,
        "Enhanced location"
    );
    // No subscribers is not an error
    let _ = location_tx.send(location);
}

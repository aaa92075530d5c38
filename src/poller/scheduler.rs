//! PollingScheduler: populates the device set once, then refreshes one
//! random device per tick and hands it to the registered observer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock as StdRwLock};
use std::time::Duration;

use rand::Rng;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::models::{Device, SharedDevice};
use crate::snapshot::{RefreshOutcome, SnapshotBuilder};

pub type OnDataFn = Arc<dyn Fn(Device) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Empty,
    Populating,
    Ready,
}

pub struct PollingScheduler {
    builder: Arc<SnapshotBuilder>,
    interval: Duration,
    devices: RwLock<Vec<SharedDevice>>,
    state: StdRwLock<PollerState>,
    /// Set once a population run has completed; devices are never built twice
    populated: AtomicBool,
    on_data: StdRwLock<Option<OnDataFn>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl PollingScheduler {
    pub fn new(builder: Arc<SnapshotBuilder>, interval: Duration) -> Self {
        Self {
            builder,
            interval,
            devices: RwLock::new(Vec::new()),
            state: StdRwLock::new(PollerState::Empty),
            populated: AtomicBool::new(false),
            on_data: StdRwLock::new(None),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Register the observer, replacing any previous one
    pub fn set_on_data<F>(&self, on_data: F)
    where
        F: Fn(Device) + Send + Sync + 'static,
    {
        let mut slot = self.on_data.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::new(on_data));
    }

    /// Spawn the tick timer, plus initial population unless it already ran.
    /// Calling it while running is a no-op.
    pub fn start(self: &Arc<Self>) {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        if !tasks.is_empty() {
            tracing::warn!("[Poller] Already running");
            return;
        }

        tracing::info!(
            "[Poller] Starting (interval: {}ms)",
            self.interval.as_millis()
        );

        if !self.populated.load(Ordering::Acquire) {
            let populator = self.clone();
            tasks.push(tokio::spawn(async move {
                populator.populate().await;
            }));
        }

        let ticker = self.clone();
        tasks.push(tokio::spawn(async move {
            ticker.run_timer().await;
        }));
    }

    /// Cancel the timer and any population still in progress. An interrupted
    /// population starts over on the next `start`.
    pub fn stop(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        for task in tasks.drain(..) {
            task.abort();
        }
        if !self.populated.load(Ordering::Acquire) {
            self.set_state(PollerState::Empty);
        }
        tracing::info!("[Poller] Stopped");
    }

    pub fn is_running(&self) -> bool {
        let tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.iter().any(|t| !t.is_finished())
    }

    pub fn state(&self) -> PollerState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: PollerState) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = state;
    }

    pub async fn device_count(&self) -> usize {
        self.devices.read().await.len()
    }

    /// Point-in-time copies of every device
    pub async fn devices(&self) -> Vec<Device> {
        let handles = self.devices.read().await.clone();
        let mut out = Vec::with_capacity(handles.len());
        for handle in handles {
            out.push(handle.read().await.clone());
        }
        out
    }

    /// List device ids and build one snapshot per id, appending each device
    /// as soon as it is built. A device whose build fails is skipped.
    ///
    /// Runs to completion at most once; later calls return immediately.
    pub async fn populate(&self) {
        if self.populated.load(Ordering::Acquire) {
            tracing::debug!("[Poller] Already populated");
            return;
        }

        self.set_state(PollerState::Populating);
        // Leftovers of an interrupted run
        self.devices.write().await.clear();

        match self.builder.list_device_ids().await {
            Ok(ids) => {
                tracing::info!("[Poller] Populating {} devices", ids.len());
                for id in ids {
                    match self.builder.build_snapshot(&id).await {
                        Ok(device) => {
                            if device.is_shell() {
                                tracing::debug!("[Poller] Device {} added without endpoints", id);
                            }
                            self.devices.write().await.push(device.into_shared());
                        }
                        Err(e) => {
                            tracing::warn!("[Poller] Device {} skipped: {}", id, e);
                        }
                    }
                }
            }
            Err(e) => {
                tracing::error!("[Poller] Device listing failed: {}", e);
            }
        }

        self.populated.store(true, Ordering::Release);
        self.set_state(PollerState::Ready);
        tracing::info!("[Poller] Population done: {} devices", self.device_count().await);
    }

    /// One timer firing. Returns the handle of the refresh it started, if any.
    ///
    /// The refresh is not awaited: the observer receives the device as it is
    /// right now, which may predate the refresh.
    pub async fn tick(&self) -> Option<JoinHandle<()>> {
        let target = {
            let devices = self.devices.read().await;
            if devices.is_empty() {
                return None;
            }
            let idx = rand::thread_rng().gen_range(0..devices.len());
            devices[idx].clone()
        };

        let builder = self.builder.clone();
        let refreshing = target.clone();
        let refresh = tokio::spawn(async move {
            match builder.refresh_snapshot(&refreshing).await {
                Ok(RefreshOutcome::Updated(n)) => {
                    tracing::debug!("[Poller] Refreshed {} endpoints", n);
                }
                Ok(RefreshOutcome::Skipped) => {
                    tracing::debug!("[Poller] Refresh skipped, upstream has no live data");
                }
                Err(e) => {
                    let id = refreshing.read().await.id.clone();
                    tracing::warn!("[Poller] Refresh of device {} failed: {}", id, e);
                }
            }
        });

        let snapshot = target.read().await.clone();
        if let Some(on_data) = self.observer() {
            on_data(snapshot);
        }

        Some(refresh)
    }

    fn observer(&self) -> Option<OnDataFn> {
        self.on_data
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    async fn run_timer(self: Arc<Self>) {
        let mut timer = time::interval_at(Instant::now() + self.interval, self.interval);

        loop {
            timer.tick().await;

            // A panicking observer must not take the timer down with it
            let ticker = self.clone();
            if let Err(e) = tokio::spawn(async move { ticker.tick().await }).await {
                tracing::error!("[Poller] Tick failed: {}", e);
            }
        }
    }
}

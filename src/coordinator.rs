use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, trace, warn};

use crate::client::{ErrorCallback, ThermostatApi, UpdateCallback};
use crate::config::{DEFAULT_SCAN_INTERVAL, DOMAIN};
use crate::journal::{Journal, JournalMode};
use crate::types::{Snapshot, Thermostat};
use crate::{Error, Result};

type Listener = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`Coordinator::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// What happened to a pushed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// The cached record was replaced and listeners were notified.
    Updated,
    /// No cached record has that serial; the notification was dropped.
    UnknownThermostat,
    /// Nothing was cached yet, so a full refresh ran instead.
    Refreshed,
}

pub struct CoordinatorBuilder {
    client: Arc<dyn ThermostatApi>,
    name: String,
    update_interval: Duration,
    listeners: Vec<Listener>,
    log_mode: Option<JournalMode>,
    log_path: Option<PathBuf>,
}

impl CoordinatorBuilder {
    pub fn new(client: Arc<dyn ThermostatApi>) -> Self {
        Self {
            client,
            name: DOMAIN.to_string(),
            update_interval: DEFAULT_SCAN_INTERVAL,
            listeners: Vec::new(),
            log_mode: None,
            log_path: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    pub fn on_update(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.listeners.push(Arc::new(f));
        self
    }

    pub fn message_log(mut self, mode: JournalMode, path: impl Into<PathBuf>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<Coordinator> {
        let journal = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(Mutex::new(Journal::open(mode, &path)?)),
            _ => None,
        };

        let next_id = self.listeners.len() as u64;
        let listeners = self
            .listeners
            .into_iter()
            .enumerate()
            .map(|(i, l)| (ListenerId(i as u64), l))
            .collect();

        Ok(Coordinator {
            inner: Arc::new(Inner {
                name: self.name,
                client: self.client,
                update_interval: self.update_interval,
                state: Mutex::new(State {
                    data: None,
                    last_update_success: true,
                    last_updated: None,
                    last_error: None,
                }),
                listeners: Mutex::new(listeners),
                next_listener_id: AtomicU64::new(next_id),
                monitoring: tokio::sync::Mutex::new(false),
                journal,
            }),
        })
    }
}

struct State {
    data: Option<Snapshot>,
    last_update_success: bool,
    last_updated: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

struct Inner {
    name: String,
    client: Arc<dyn ThermostatApi>,
    update_interval: Duration,
    state: Mutex<State>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_listener_id: AtomicU64,
    monitoring: tokio::sync::Mutex<bool>,
    journal: Option<Mutex<Journal>>,
}

/// Owns the cached snapshot for one account.
///
/// The snapshot is written by refreshes and by push reconciliation only.
/// Entities hold a clone of the coordinator and read through it on every
/// access. After any change to the cached state every listener is called,
/// outside the state lock, so listeners may read the coordinator again.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl Coordinator {
    pub fn builder(client: Arc<dyn ThermostatApi>) -> CoordinatorBuilder {
        CoordinatorBuilder::new(client)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn client(&self) -> &Arc<dyn ThermostatApi> {
        &self.inner.client
    }

    pub fn update_interval(&self) -> Duration {
        self.inner.update_interval
    }

    pub fn data(&self) -> Option<Snapshot> {
        self.state().data.clone()
    }

    pub fn thermostat(&self, serial: &str) -> Option<Thermostat> {
        self.state()
            .data
            .as_ref()
            .and_then(|s| s.thermostat(serial))
            .cloned()
    }

    pub fn thermostats(&self) -> Vec<Thermostat> {
        self.state()
            .data
            .as_ref()
            .map(|s| s.thermostats().cloned().collect())
            .unwrap_or_default()
    }

    pub fn last_update_success(&self) -> bool {
        self.state().last_update_success
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.state().last_updated
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    pub async fn is_monitoring(&self) -> bool {
        *self.inner.monitoring.lock().await
    }

    pub fn add_listener(&self, f: impl Fn() + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.inner.listeners).push((id, Arc::new(f)));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = lock(&self.inner.listeners);
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Refresh used during setup. A failure here aborts setup.
    pub async fn first_refresh(&self) -> Result<()> {
        self.refresh().await
    }

    /// Fetch a full snapshot. Failure is recorded on the coordinator and
    /// returned as [`Error::UpdateFailed`]; listeners are notified either way.
    pub async fn refresh(&self) -> Result<()> {
        trace!(name = %self.inner.name, "refreshing thermostats");
        match self.inner.client.get_thermostats().await {
            Ok(snapshot) => {
                let dups = snapshot.duplicate_serials();
                if !dups.is_empty() {
                    warn!(?dups, "snapshot contains duplicate serial numbers");
                }
                self.journal(|j| j.log_refresh(&snapshot));
                {
                    let mut state = self.state();
                    if !state.last_update_success {
                        info!(name = %self.inner.name, "fetching thermostats recovered");
                    }
                    state.data = Some(snapshot);
                    state.last_update_success = true;
                    state.last_updated = Some(Utc::now());
                    state.last_error = None;
                }
                self.publish();
                Ok(())
            }
            Err(e) => {
                let msg = e.to_string();
                self.journal(|j| j.log_refresh_failed(&msg));
                {
                    let mut state = self.state();
                    if state.last_update_success {
                        warn!(name = %self.inner.name, error = %msg, "error fetching thermostats");
                    } else {
                        debug!(name = %self.inner.name, error = %msg, "fetching thermostats still failing");
                    }
                    state.last_update_success = false;
                    state.last_error = Some(msg.clone());
                }
                self.publish();
                Err(Error::UpdateFailed(msg))
            }
        }
    }

    /// Refresh after a command. Failure is already recorded, so it is not returned.
    pub async fn request_refresh(&self) {
        if let Err(e) = self.refresh().await {
            debug!("requested refresh failed: {e}");
        }
    }

    /// Scheduled refresh loop. Runs until the task is dropped or aborted.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.inner.update_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval.tick().await;
        loop {
            interval.tick().await;
            self.request_refresh().await;
        }
    }

    /// Register push callbacks with the client. A second call while already
    /// monitoring does nothing.
    pub async fn start_monitoring(&self) -> Result<()> {
        let mut monitoring = self.inner.monitoring.lock().await;
        if *monitoring {
            debug!("monitoring already started");
            return Ok(());
        }

        let weak = Arc::downgrade(&self.inner);
        let on_update: UpdateCallback = Box::new(move |record| {
            if let Some(coordinator) = upgrade(&weak) {
                coordinator.on_notification(record);
            }
        });
        let weak = Arc::downgrade(&self.inner);
        let on_error: ErrorCallback = Box::new(move |err| {
            if let Some(coordinator) = upgrade(&weak) {
                coordinator.handle_monitor_error(err);
            }
        });

        self.inner
            .client
            .start_monitoring(on_update, on_error)
            .await
            .map_err(|e| Error::Monitoring(e.to_string()))?;
        *monitoring = true;
        info!(name = %self.inner.name, "started push monitoring");
        Ok(())
    }

    /// Unregister push callbacks. Failures are logged, never returned.
    pub async fn stop_monitoring(&self) {
        let mut monitoring = self.inner.monitoring.lock().await;
        if !*monitoring {
            return;
        }
        if let Err(e) = self.inner.client.stop_monitoring().await {
            warn!("error stopping monitoring: {e}");
        }
        *monitoring = false;
        debug!(name = %self.inner.name, "stopped push monitoring");
    }

    /// Merge a pushed record into the cache, falling back to a full refresh
    /// when nothing is cached yet.
    pub async fn handle_notification(&self, record: Thermostat) -> Reconciled {
        match self.apply_notification(record) {
            None => {
                debug!("notification before first snapshot, refreshing");
                self.request_refresh().await;
                Reconciled::Refreshed
            }
            Some(outcome) => outcome,
        }
    }

    /// A transport failure on the push channel. Marks the coordinator as
    /// failed and notifies listeners.
    pub fn handle_monitor_error(&self, err: Error) {
        let msg = err.to_string();
        warn!(error = %msg, "push monitoring error");
        self.journal(|j| j.log_monitor_error(&msg));
        {
            let mut state = self.state();
            state.last_update_success = false;
            state.last_error = Some(msg);
        }
        self.publish();
    }

    /// Callback path: same as [`Self::handle_notification`] but the fall-back
    /// refresh is spawned on the current runtime.
    fn on_notification(&self, record: Thermostat) {
        if self.apply_notification(record).is_some() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let coordinator = self.clone();
                handle.spawn(async move { coordinator.request_refresh().await });
            }
            Err(_) => warn!("notification before first snapshot and no runtime to refresh on"),
        }
    }

    /// Returns `None` when nothing is cached.
    fn apply_notification(&self, record: Thermostat) -> Option<Reconciled> {
        let serial = record.serial_number.clone();
        let journal_copy = self.inner.journal.as_ref().map(|_| record.clone());

        let outcome = {
            let mut state = self.state();
            let snapshot = state.data.as_mut()?;
            if snapshot.replace(record) {
                Reconciled::Updated
            } else {
                Reconciled::UnknownThermostat
            }
        };

        if let Some(record) = journal_copy {
            let label = match outcome {
                Reconciled::Updated => "updated",
                _ => "unknown",
            };
            self.journal(|j| j.log_notification(&record, label));
        }

        match outcome {
            Reconciled::Updated => {
                debug!(serial = %serial, "applied push update");
                self.publish();
            }
            _ => warn!(serial = %serial, "received update for unknown thermostat"),
        }
        Some(outcome)
    }

    fn publish(&self) {
        let listeners: Vec<Listener> = lock(&self.inner.listeners)
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener();
        }
    }

    fn journal(&self, f: impl FnOnce(&mut Journal)) {
        if let Some(journal) = &self.inner.journal {
            f(&mut lock(journal));
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        lock(&self.inner.state)
    }
}

fn upgrade(weak: &Weak<Inner>) -> Option<Coordinator> {
    weak.upgrade().map(|inner| Coordinator { inner })
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

//! The reconciliation controller.
//!
//! Owns the one [`QueryState`] and every view cache derived from backend
//! data. All mutation happens on the task that drives the controller:
//! actions arrive through [`Controller::dispatch`], fetches run as spawned
//! tasks, and their results come back as settlements that are applied
//! only if they still belong to the latest request of their slot.

mod fetch;
mod slots;

pub use fetch::AppSummary;
pub use slots::{FetchState, Slot};

use crate::config::Config;
use crate::consts::{MONITOR_EVENT_BUFFER, SETTLEMENT_BUFFER, STATUS_MONITORING, STATUS_STOPPED};
use crate::error::GatewayError;
use crate::gateway::{DataGateway, Subscription};
use crate::geometry::{compute_geometry, KeyboardGeometry, LayoutDefinition, LayoutVariant};
use crate::heatmap::{Heatmap, UsageMap};
use crate::keycodes::KeyNameRegistry;
use crate::layouts;
use crate::prefs::{self, MemoryStore, PreferenceStore};
use crate::protocol::RankingEntry;
use crate::query::{AppFilter, Clock, Preset, QueryState, SystemClock};
use crate::ranking::{self, ChartRow};
use chrono::NaiveDate;
use fetch::{Outcome, Settlement};
use slots::SlotTable;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

/// Everything a user can ask the controller to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    EditStartDate(Option<NaiveDate>),
    EditEndDate(Option<NaiveDate>),
    SelectPreset(Preset),
    SelectApp(AppFilter),
    ToggleMonitoring,
    Refresh,
    SelectLayout(LayoutVariant),
}

#[derive(TypedBuilder)]
pub struct ControllerOptions {
    #[builder(default)]
    pub config: Config,
    #[builder(default = Arc::new(SystemClock) as Arc<dyn Clock>)]
    pub clock: Arc<dyn Clock>,
    #[builder(default = Box::new(MemoryStore::default()) as Box<dyn PreferenceStore>)]
    pub preferences: Box<dyn PreferenceStore>,
    #[builder(default = KeyNameRegistry::new_with_defaults())]
    pub key_names: KeyNameRegistry,
    /// Replaces the built-in layouts regardless of the selected variant.
    #[builder(default, setter(strip_option))]
    pub custom_layout: Option<LayoutDefinition>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

pub struct Controller<G: DataGateway> {
    gateway: Arc<G>,
    clock: Arc<dyn Clock>,
    preferences: Box<dyn PreferenceStore>,
    key_names: KeyNameRegistry,
    config: Config,
    custom_layout: Option<LayoutDefinition>,

    query: QueryState,
    layout: LayoutVariant,
    geometry: KeyboardGeometry,

    apps: Vec<AppSummary>,
    all_apps_total: Option<u64>,
    ranking: Vec<RankingEntry>,
    usage: UsageMap,
    chart: Vec<ChartRow>,
    total_count: Option<u64>,
    monitoring: bool,

    slots: SlotTable,
    pending: usize,
    settle_tx: mpsc::Sender<Settlement>,
    settle_rx: mpsc::Receiver<Settlement>,
    monitor_rx: Option<mpsc::Receiver<bool>>,
    subscription: Option<Subscription<G>>,
    started: bool,
}

impl<G: DataGateway> Controller<G> {
    /// Reads the stored layout preference and lays out the keyboard. No
    /// request is made until [`Controller::start`].
    pub fn new(gateway: Arc<G>, options: ControllerOptions) -> Self {
        let ControllerOptions {
            config,
            clock,
            preferences,
            key_names,
            custom_layout,
        } = options;

        let layout = prefs::load_layout(preferences.as_ref());
        let query = QueryState::initial(clock.today(), config.query.default_days);
        let (settle_tx, settle_rx) = mpsc::channel(SETTLEMENT_BUFFER);

        let mut controller = Self {
            gateway,
            clock,
            preferences,
            key_names,
            config,
            custom_layout,
            query,
            layout,
            geometry: KeyboardGeometry::default(),
            apps: Vec::new(),
            all_apps_total: None,
            ranking: Vec::new(),
            usage: UsageMap::default(),
            chart: Vec::new(),
            total_count: None,
            monitoring: false,
            slots: SlotTable::default(),
            pending: 0,
            settle_tx,
            settle_rx,
            monitor_rx: None,
            subscription: None,
            started: false,
        };
        controller.relayout();
        controller
    }

    /// Opens the monitoring subscription and issues the startup fetches.
    /// Must be called from within a Tokio runtime. Later calls do nothing.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        info!(layout = %self.layout, "starting controller");

        let (tx, rx) = mpsc::channel(MONITOR_EVENT_BUFFER);
        match Subscription::open(Arc::clone(&self.gateway), tx) {
            Ok(sub) => {
                self.subscription = Some(sub);
                self.monitor_rx = Some(rx);
            }
            Err(e) => warn!("monitoring subscription failed: {}", e),
        }

        self.issue_apps();
        self.issue_ranking();
        self.issue_status();
    }

    /// Releases the monitoring subscription. In-flight fetches are left to
    /// finish; their results are still applied if the controller is driven.
    pub fn shutdown(&mut self) {
        if let Some(mut sub) = self.subscription.take() {
            sub.release();
        }
        self.monitor_rx = None;
    }

    pub fn dispatch(&mut self, action: Action) {
        debug!(?action, "dispatch");
        match action {
            Action::EditStartDate(date) => {
                self.leave_all_preset();
                self.query.edit_start(date);
                self.issue_ranking();
            }
            Action::EditEndDate(date) => {
                self.leave_all_preset();
                self.query.edit_end(date);
                self.issue_ranking();
            }
            Action::SelectPreset(preset) => self.select_preset(preset),
            Action::SelectApp(app) => {
                self.query.app = app;
                self.issue_ranking();
            }
            Action::ToggleMonitoring => self.issue_toggle(),
            Action::Refresh => {
                self.issue_apps();
                self.issue_ranking();
            }
            Action::SelectLayout(variant) => self.select_layout(variant),
        }
    }

    /// Waits for one settlement or monitoring event and applies it.
    pub async fn step(&mut self) {
        tokio::select! {
            settlement = self.settle_rx.recv() => {
                if let Some(settlement) = settlement {
                    self.apply(settlement);
                }
            }
            event = next_event(&mut self.monitor_rx) => self.on_monitor_channel(event),
        }
    }

    /// Applies settlements until nothing is in flight, then drains any
    /// queued monitoring events.
    pub async fn settle_all(&mut self) {
        while self.pending > 0 {
            match self.settle_rx.recv().await {
                Some(settlement) => self.apply(settlement),
                None => break,
            }
        }
        self.drain_events();
    }

    /// Applies every monitoring event already queued, without waiting.
    pub fn drain_events(&mut self) {
        loop {
            let Some(rx) = self.monitor_rx.as_mut() else {
                return;
            };
            match rx.try_recv() {
                Ok(running) => self.on_monitor_event(running),
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.on_monitor_channel(None);
                    return;
                }
            }
        }
    }

    /// Drives the controller until `actions` closes, then shuts down.
    pub async fn run(&mut self, mut actions: mpsc::Receiver<Action>) {
        self.start();
        loop {
            tokio::select! {
                action = actions.recv() => match action {
                    Some(action) => self.dispatch(action),
                    None => break,
                },
                settlement = self.settle_rx.recv() => {
                    if let Some(settlement) = settlement {
                        self.apply(settlement);
                    }
                }
                event = next_event(&mut self.monitor_rx) => self.on_monitor_channel(event),
            }
        }
        self.shutdown();
    }

    // --- Read-only view ---

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn apps(&self) -> &[AppSummary] {
        &self.apps
    }

    pub fn all_apps_total(&self) -> Option<u64> {
        self.all_apps_total
    }

    pub fn ranking(&self) -> &[RankingEntry] {
        &self.ranking
    }

    pub fn usage(&self) -> &UsageMap {
        &self.usage
    }

    pub fn chart(&self) -> &[ChartRow] {
        &self.chart
    }

    /// Total keystrokes in the current query scope.
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    pub fn monitoring(&self) -> bool {
        self.monitoring
    }

    pub fn status_label(&self) -> &'static str {
        if self.monitoring {
            STATUS_MONITORING
        } else {
            STATUS_STOPPED
        }
    }

    pub fn layout(&self) -> LayoutVariant {
        self.layout
    }

    pub fn geometry(&self) -> &KeyboardGeometry {
        &self.geometry
    }

    pub fn heatmap(&self) -> Heatmap {
        Heatmap::build(&self.geometry, &self.usage)
    }

    pub fn key_names(&self) -> &KeyNameRegistry {
        &self.key_names
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn preferences(&self) -> &dyn PreferenceStore {
        self.preferences.as_ref()
    }

    pub fn fetch_state(&self, slot: Slot) -> FetchState {
        self.slots.state(slot)
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.as_ref().is_some_and(Subscription::is_active)
    }

    /// Number of spawned fetches whose settlement has not been applied.
    pub fn pending(&self) -> usize {
        self.pending
    }

    // --- Transitions ---

    fn select_preset(&mut self, preset: Preset) {
        match preset {
            Preset::All => {
                self.query.preset = Preset::All;
                self.issue_bounds();
            }
            Preset::Manual => {
                self.leave_all_preset();
                self.query.preset = Preset::Manual;
            }
            relative => {
                self.leave_all_preset();
                let today = self.clock.today();
                if self.query.apply_relative(relative, today) {
                    self.issue_ranking();
                }
            }
        }
    }

    /// A pending `All` bounds request must not overwrite dates chosen after it.
    fn leave_all_preset(&mut self) {
        if self.slots.invalidate(Slot::DateBounds) {
            debug!("abandoning in-flight observed range request");
        }
    }

    fn select_layout(&mut self, variant: LayoutVariant) {
        self.layout = variant;
        self.relayout();
        if let Err(e) = prefs::save_layout(self.preferences.as_mut(), variant) {
            warn!(layout = %variant, "failed to persist layout preference: {}", e);
        }
    }

    fn relayout(&mut self) {
        let definition = match &self.custom_layout {
            Some(custom) => custom.clone(),
            None => layouts::builtin(self.layout),
        };
        self.geometry = compute_geometry(&definition, &self.config.geometry);
    }

    // --- Fetch issue ---

    fn issue_apps(&mut self) {
        let gw = Arc::clone(&self.gateway);
        self.spawn_fetch(Slot::Apps, async move {
            Outcome::Apps(fetch::fetch_apps(gw).await)
        });
    }

    fn issue_ranking(&mut self) {
        let offset = self.clock.offset();
        let ranking_query = self
            .query
            .ranking_query(offset, self.config.query.ranking_limit);
        let count_query = self.query.count_query(offset);
        let gw = Arc::clone(&self.gateway);
        self.spawn_fetch(Slot::Ranking, async move {
            Outcome::Ranking(fetch::fetch_ranking(gw, ranking_query, count_query).await)
        });
    }

    fn issue_bounds(&mut self) {
        let gw = Arc::clone(&self.gateway);
        self.spawn_fetch(Slot::DateBounds, async move {
            Outcome::DateBounds(gw.observed_date_range().await)
        });
    }

    fn issue_status(&mut self) {
        let gw = Arc::clone(&self.gateway);
        self.spawn_fetch(Slot::Monitoring, async move {
            Outcome::Monitoring(gw.monitoring_status().await)
        });
    }

    fn issue_toggle(&mut self) {
        let gw = Arc::clone(&self.gateway);
        self.spawn_fetch(Slot::Monitoring, async move {
            Outcome::Monitoring(fetch::toggle_and_requery(gw).await)
        });
    }

    fn spawn_fetch<F>(&mut self, slot: Slot, fut: F)
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        let generation = self.slots.issue(slot);
        self.pending += 1;
        debug!(%slot, generation, "fetch issued");

        let tx = self.settle_tx.clone();
        tokio::spawn(async move {
            // A panicking fetch still settles its slot, or `pending` never drains.
            let outcome = match tokio::spawn(fut).await {
                Ok(outcome) => outcome,
                Err(e) => Outcome::failed(slot, GatewayError::Aborted(e.to_string())),
            };
            // The controller may already be gone.
            let _ = tx
                .send(Settlement {
                    slot,
                    generation,
                    outcome,
                })
                .await;
        });
    }

    // --- Settlement ---

    fn apply(&mut self, settlement: Settlement) {
        self.pending = self.pending.saturating_sub(1);
        let Settlement {
            slot,
            generation,
            outcome,
        } = settlement;

        if !self.slots.is_current(slot, generation) {
            debug!(%slot, generation, "discarding stale result");
            return;
        }
        self.slots.settle(slot, outcome.is_ok());
        debug!(%slot, generation, ok = outcome.is_ok(), "fetch settled");

        match outcome {
            Outcome::Apps(Ok(payload)) => {
                self.apps = payload.apps;
                self.all_apps_total = payload.all_apps_total;
            }
            Outcome::Ranking(Ok(payload)) => {
                self.usage = UsageMap::from_ranking(&payload.ranking);
                self.chart = ranking::project(&payload.ranking, &self.key_names);
                self.ranking = payload.ranking;
                self.total_count = Some(payload.total);
            }
            Outcome::DateBounds(Ok(range)) => {
                self.query.apply_observed(range, self.clock.offset());
                self.issue_ranking();
            }
            Outcome::Monitoring(Ok(running)) => {
                self.monitoring = running;
            }
            Outcome::Apps(Err(e))
            | Outcome::Ranking(Err(e))
            | Outcome::DateBounds(Err(e))
            | Outcome::Monitoring(Err(e)) => {
                warn!(%slot, "fetch failed, keeping last data: {}", e);
            }
        }
    }

    /// A pushed status is newer than any status request still in flight.
    fn on_monitor_event(&mut self, running: bool) {
        if self.slots.invalidate(Slot::Monitoring) {
            debug!("superseding in-flight status request with pushed event");
        }
        if self.monitoring != running {
            info!(running, "monitoring status changed");
        }
        self.monitoring = running;
    }

    fn on_monitor_channel(&mut self, event: Option<bool>) {
        match event {
            Some(running) => self.on_monitor_event(running),
            None => {
                info!("monitoring event stream closed");
                self.monitor_rx = None;
            }
        }
    }
}

async fn next_event(rx: &mut Option<mpsc::Receiver<bool>>) -> Option<bool> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

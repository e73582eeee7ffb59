#![allow(dead_code)] // Not every test binary uses every helper

use keyfit_core::error::{GatewayError, GatewayResult};
use keyfit_core::gateway::{DataGateway, SubscriptionId};
use keyfit_core::geometry::{KeyDefinition, LayoutDefinition, LayoutMeta};
use keyfit_core::protocol::{AppInfo, CountQuery, DateRange, RankingEntry, RankingQuery};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};

/// Builder for a single-row or multi-row layout to keep tests short.
#[derive(Default)]
pub struct LayoutBuilder {
    rows: Vec<Vec<KeyDefinition>>,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, keys: Vec<KeyDefinition>) -> Self {
        self.rows.push(keys);
        self
    }

    pub fn build(self) -> LayoutDefinition {
        LayoutDefinition {
            meta: LayoutMeta::default(),
            rows: self.rows,
        }
    }
}

pub fn app(id: i64, name: &str) -> AppInfo {
    AppInfo {
        id,
        name: name.to_string(),
        bundle_id: format!("com.example.{}", name.to_lowercase()),
    }
}

pub fn entries(pairs: &[(&str, u64)]) -> Vec<RankingEntry> {
    pairs.iter().map(|(c, n)| RankingEntry::new(c, *n)).collect()
}

#[derive(Default)]
struct Script {
    apps: Vec<AppInfo>,
    apps_error: Option<GatewayError>,
    /// Keyed by app id; `None` is the all-apps total.
    totals: HashMap<Option<i64>, u64>,
    /// Keyed by app id filter.
    rankings: HashMap<Option<i64>, Vec<RankingEntry>>,
    ranking_error: Option<GatewayError>,
    running: bool,
    status_error: Option<GatewayError>,
    toggle_error: Option<GatewayError>,
    date_range: DateRange,

    hold_rankings: bool,
    ranking_gates: Vec<(Option<i64>, Option<oneshot::Sender<()>>)>,
    hold_bounds: bool,
    bounds_gates: Vec<Option<oneshot::Sender<()>>>,
    hold_status: bool,
    status_gates: Vec<Option<oneshot::Sender<()>>>,
    panic_rankings: bool,

    ranking_queries: Vec<RankingQuery>,
    count_queries: Vec<CountQuery>,
    bounds_calls: usize,
    status_calls: usize,
    toggle_calls: usize,

    sinks: HashMap<u64, mpsc::Sender<bool>>,
    next_sub: u64,
    unsubscribed: Vec<SubscriptionId>,
}

/// In-memory backend whose answers are configured up front. Ranking and
/// bounds requests can be held open and released in any order.
#[derive(Default)]
pub struct ScriptedGateway {
    script: Mutex<Script>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        f(&mut self.script.lock().unwrap())
    }

    // --- Scripting ---

    pub fn set_apps(&self, apps: Vec<AppInfo>) {
        self.with(|s| s.apps = apps);
    }

    pub fn fail_apps(&self, err: GatewayError) {
        self.with(|s| s.apps_error = Some(err));
    }

    pub fn set_total(&self, app_id: Option<i64>, total: u64) {
        self.with(|s| s.totals.insert(app_id, total));
    }

    pub fn set_ranking(&self, app_id: Option<i64>, ranking: Vec<RankingEntry>) {
        self.with(|s| s.rankings.insert(app_id, ranking));
    }

    pub fn fail_ranking(&self, err: Option<GatewayError>) {
        self.with(|s| s.ranking_error = err);
    }

    pub fn set_running(&self, running: bool) {
        self.with(|s| s.running = running);
    }

    pub fn fail_status(&self, err: Option<GatewayError>) {
        self.with(|s| s.status_error = err);
    }

    pub fn fail_toggle(&self, err: Option<GatewayError>) {
        self.with(|s| s.toggle_error = err);
    }

    pub fn set_date_range(&self, min: i64, max: i64) {
        self.with(|s| s.date_range = DateRange { min, max });
    }

    pub fn hold_rankings(&self) {
        self.with(|s| s.hold_rankings = true);
    }

    pub fn hold_bounds(&self) {
        self.with(|s| s.hold_bounds = true);
    }

    /// Status requests read the flag when called but answer only once released.
    pub fn hold_status(&self) {
        self.with(|s| s.hold_status = true);
    }

    /// Ranking requests panic instead of answering.
    pub fn panic_rankings(&self) {
        self.with(|s| s.panic_rankings = true);
    }

    /// Lets every held ranking request for `app_id` finish.
    pub fn release_ranking_for(&self, app_id: Option<i64>) {
        self.with(|s| {
            for (gate_app, gate) in s.ranking_gates.iter_mut() {
                if *gate_app == app_id {
                    if let Some(tx) = gate.take() {
                        let _ = tx.send(());
                    }
                }
            }
        });
    }

    pub fn release_bounds(&self, index: usize) {
        self.with(|s| {
            if let Some(tx) = s.bounds_gates.get_mut(index).and_then(Option::take) {
                let _ = tx.send(());
            }
        });
    }

    pub fn release_status(&self, index: usize) {
        self.with(|s| {
            if let Some(tx) = s.status_gates.get_mut(index).and_then(Option::take) {
                let _ = tx.send(());
            }
        });
    }

    /// Yields until at least `n` ranking requests have reached the gateway.
    pub async fn wait_for_rankings(&self, n: usize) {
        while self.with(|s| s.ranking_queries.len()) < n {
            tokio::task::yield_now().await;
        }
    }

    pub async fn wait_for_bounds(&self, n: usize) {
        while self.with(|s| s.bounds_calls) < n {
            tokio::task::yield_now().await;
        }
    }

    pub async fn wait_for_status(&self, n: usize) {
        while self.with(|s| s.status_calls) < n {
            tokio::task::yield_now().await;
        }
    }

    /// Pushes a status change to every live subscriber.
    pub async fn push_status(&self, running: bool) {
        let sinks: Vec<_> = self.with(|s| {
            s.running = running;
            s.sinks.values().cloned().collect()
        });
        for sink in sinks {
            let _ = sink.send(running).await;
        }
    }

    // --- Inspection ---

    pub fn ranking_queries(&self) -> Vec<RankingQuery> {
        self.with(|s| s.ranking_queries.clone())
    }

    pub fn count_queries(&self) -> Vec<CountQuery> {
        self.with(|s| s.count_queries.clone())
    }

    pub fn bounds_calls(&self) -> usize {
        self.with(|s| s.bounds_calls)
    }

    pub fn status_calls(&self) -> usize {
        self.with(|s| s.status_calls)
    }

    pub fn toggle_calls(&self) -> usize {
        self.with(|s| s.toggle_calls)
    }

    pub fn live_subscriptions(&self) -> usize {
        self.with(|s| s.sinks.len())
    }

    pub fn unsubscribed(&self) -> Vec<SubscriptionId> {
        self.with(|s| s.unsubscribed.clone())
    }
}

impl DataGateway for ScriptedGateway {
    async fn list_applications(&self) -> GatewayResult<Vec<AppInfo>> {
        self.with(|s| match &s.apps_error {
            Some(e) => Err(e.clone()),
            None => Ok(s.apps.clone()),
        })
    }

    async fn total_key_count(&self, query: CountQuery) -> GatewayResult<u64> {
        self.with(|s| {
            s.count_queries.push(query.clone());
            let scoped = query.start.is_some() || query.end.is_some();
            if scoped {
                // Scoped totals mirror the ranking of the same filter.
                let ranking = s.rankings.get(&query.app_id).cloned().unwrap_or_default();
                return Ok(ranking.iter().map(|e| e.count).sum());
            }
            s.totals
                .get(&query.app_id)
                .copied()
                .ok_or_else(|| GatewayError::Backend(format!("no total for {:?}", query.app_id)))
        })
    }

    async fn key_ranking(&self, query: RankingQuery) -> GatewayResult<Vec<RankingEntry>> {
        if self.with(|s| s.panic_rankings) {
            panic!("scripted ranking failure");
        }
        let (result, gate) = self.with(|s| {
            s.ranking_queries.push(query.clone());
            let result = match &s.ranking_error {
                Some(e) => Err(e.clone()),
                None => Ok(s.rankings.get(&query.app_id).cloned().unwrap_or_default()),
            };
            let gate = if s.hold_rankings {
                let (tx, rx) = oneshot::channel();
                s.ranking_gates.push((query.app_id, Some(tx)));
                Some(rx)
            } else {
                None
            };
            (result, gate)
        });
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        result
    }

    async fn monitoring_status(&self) -> GatewayResult<bool> {
        let (result, gate) = self.with(|s| {
            s.status_calls += 1;
            let result = match &s.status_error {
                Some(e) => Err(e.clone()),
                None => Ok(s.running),
            };
            let gate = if s.hold_status {
                let (tx, rx) = oneshot::channel();
                s.status_gates.push(Some(tx));
                Some(rx)
            } else {
                None
            };
            (result, gate)
        });
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        result
    }

    async fn toggle_monitoring(&self) -> GatewayResult<()> {
        self.with(|s| {
            s.toggle_calls += 1;
            match &s.toggle_error {
                Some(e) => Err(e.clone()),
                None => {
                    s.running = !s.running;
                    Ok(())
                }
            }
        })
    }

    async fn observed_date_range(&self) -> GatewayResult<DateRange> {
        let (range, gate) = self.with(|s| {
            s.bounds_calls += 1;
            let gate = if s.hold_bounds {
                let (tx, rx) = oneshot::channel();
                s.bounds_gates.push(Some(tx));
                Some(rx)
            } else {
                None
            };
            (s.date_range, gate)
        });
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        Ok(range)
    }

    fn subscribe_monitoring(&self, sink: mpsc::Sender<bool>) -> GatewayResult<SubscriptionId> {
        Ok(self.with(|s| {
            s.next_sub += 1;
            s.sinks.insert(s.next_sub, sink);
            SubscriptionId(s.next_sub)
        }))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.with(|s| {
            s.sinks.remove(&id.0);
            s.unsubscribed.push(id);
        });
    }
}

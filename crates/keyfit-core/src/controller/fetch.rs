use super::slots::Slot;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::DataGateway;
use crate::protocol::{AppInfo, CountQuery, DateRange, RankingEntry, RankingQuery};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::warn;

/// An application plus its lifetime key count, if that could be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppSummary {
    pub info: AppInfo,
    pub total_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AppsPayload {
    pub apps: Vec<AppSummary>,
    pub all_apps_total: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RankingPayload {
    pub ranking: Vec<RankingEntry>,
    pub total: u64,
}

#[derive(Debug)]
pub(crate) enum Outcome {
    Apps(GatewayResult<AppsPayload>),
    Ranking(GatewayResult<RankingPayload>),
    DateBounds(GatewayResult<DateRange>),
    Monitoring(GatewayResult<bool>),
}

impl Outcome {
    /// A failed result of the kind `slot` expects.
    pub fn failed(slot: Slot, err: GatewayError) -> Self {
        match slot {
            Slot::Apps => Outcome::Apps(Err(err)),
            Slot::Ranking => Outcome::Ranking(Err(err)),
            Slot::DateBounds => Outcome::DateBounds(Err(err)),
            Slot::Monitoring => Outcome::Monitoring(Err(err)),
        }
    }

    pub fn is_ok(&self) -> bool {
        match self {
            Outcome::Apps(r) => r.is_ok(),
            Outcome::Ranking(r) => r.is_ok(),
            Outcome::DateBounds(r) => r.is_ok(),
            Outcome::Monitoring(r) => r.is_ok(),
        }
    }
}

/// A finished fetch, tagged with the generation it was issued under.
#[derive(Debug)]
pub(crate) struct Settlement {
    pub slot: Slot,
    pub generation: u64,
    pub outcome: Outcome,
}

/// The application list, then every app's lifetime total concurrently,
/// then the all-apps lifetime total. Only the list itself is required.
pub(crate) async fn fetch_apps<G: DataGateway>(gateway: Arc<G>) -> GatewayResult<AppsPayload> {
    let infos = gateway.list_applications().await?;

    let mut totals: Vec<Option<u64>> = vec![None; infos.len()];
    let mut set = JoinSet::new();
    for (idx, info) in infos.iter().enumerate() {
        let gw = Arc::clone(&gateway);
        let query = CountQuery::lifetime(Some(info.id));
        set.spawn(async move { (idx, gw.total_key_count(query).await) });
    }
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((idx, Ok(total))) => totals[idx] = Some(total),
            Ok((idx, Err(e))) => warn!(app_id = infos[idx].id, "app total failed: {}", e),
            Err(e) => warn!("app total task aborted: {}", e),
        }
    }

    let all_apps_total = match gateway.total_key_count(CountQuery::lifetime(None)).await {
        Ok(total) => Some(total),
        Err(e) => {
            warn!("all-apps total failed: {}", e);
            None
        }
    };

    let apps = infos
        .into_iter()
        .zip(totals)
        .map(|(info, total_count)| AppSummary { info, total_count })
        .collect();

    Ok(AppsPayload {
        apps,
        all_apps_total,
    })
}

/// Ranking and the matching scoped total, fetched together. Either
/// failing fails the pair so the view never mixes scopes.
pub(crate) async fn fetch_ranking<G: DataGateway>(
    gateway: Arc<G>,
    ranking: RankingQuery,
    count: CountQuery,
) -> GatewayResult<RankingPayload> {
    let (ranking, total) = tokio::join!(gateway.key_ranking(ranking), gateway.total_key_count(count));
    Ok(RankingPayload {
        ranking: ranking?,
        total: total?,
    })
}

/// Toggles, then asks for the real status in a second round trip.
pub(crate) async fn toggle_and_requery<G: DataGateway>(gateway: Arc<G>) -> GatewayResult<bool> {
    gateway.toggle_monitoring().await?;
    gateway.monitoring_status().await
}

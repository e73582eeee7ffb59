use crate::error::GatewayResult;
use crate::protocol::{AppInfo, CountQuery, DateRange, RankingEntry, RankingQuery};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Handle returned by [`DataGateway::subscribe_monitoring`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// The backend the controller reads from.
///
/// Every operation is a single asynchronous round trip that may fail. The
/// controller never retries; it records the failure against the slot that
/// issued the call and keeps the last good data on screen.
pub trait DataGateway: Send + Sync + 'static {
    fn list_applications(&self) -> impl Future<Output = GatewayResult<Vec<AppInfo>>> + Send;

    /// A `None` app aggregates every application; `None` dates are unbounded.
    fn total_key_count(&self, query: CountQuery) -> impl Future<Output = GatewayResult<u64>> + Send;

    /// Entries arrive ordered by descending count.
    fn key_ranking(
        &self,
        query: RankingQuery,
    ) -> impl Future<Output = GatewayResult<Vec<RankingEntry>>> + Send;

    fn monitoring_status(&self) -> impl Future<Output = GatewayResult<bool>> + Send;

    /// Fire and forget. Callers re-query [`Self::monitoring_status`].
    fn toggle_monitoring(&self) -> impl Future<Output = GatewayResult<()>> + Send;

    fn observed_date_range(&self) -> impl Future<Output = GatewayResult<DateRange>> + Send;

    /// Starts forwarding monitoring status changes into `sink`.
    fn subscribe_monitoring(&self, sink: mpsc::Sender<bool>) -> GatewayResult<SubscriptionId>;

    /// Stops a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Owns a live monitoring subscription and releases it exactly once,
/// either through [`Subscription::release`] or on drop.
pub struct Subscription<G: DataGateway> {
    gateway: Arc<G>,
    id: Option<SubscriptionId>,
}

impl<G: DataGateway> Subscription<G> {
    pub fn open(gateway: Arc<G>, sink: mpsc::Sender<bool>) -> GatewayResult<Self> {
        let id = gateway.subscribe_monitoring(sink)?;
        info!(%id, "monitoring subscription opened");
        Ok(Self {
            gateway,
            id: Some(id),
        })
    }

    pub fn id(&self) -> Option<SubscriptionId> {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }

    pub fn release(&mut self) {
        if let Some(id) = self.id.take() {
            self.gateway.unsubscribe(id);
            info!(%id, "monitoring subscription released");
        }
    }
}

impl<G: DataGateway> Drop for Subscription<G> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<G: DataGateway> fmt::Debug for Subscription<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

use keyfit_core::error::{GatewayError, GatewayResult};
use keyfit_core::gateway::{DataGateway, SubscriptionId};
use keyfit_core::protocol::{
    AppInfo, CountQuery, DateRange, MonitoringStatus, RankingEntry, RankingQuery, TotalCount,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// The monitoring service's JSON API.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    poll_interval: Duration,
    pollers: Mutex<HashMap<u64, JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl HttpGateway {
    pub fn new(base_url: &str, poll_interval: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            poll_interval,
            pollers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> GatewayResult<T> {
        let resp = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(transport)?;
        decode(resp).await
    }
}

fn transport(e: reqwest::Error) -> GatewayError {
    GatewayError::Transport(e.to_string())
}

async fn decode<T: DeserializeOwned>(resp: Response) -> GatewayResult<T> {
    let resp = check(resp).await?;
    resp.json::<T>()
        .await
        .map_err(|e| GatewayError::Decode(e.to_string()))
}

async fn check(resp: Response) -> GatewayResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(GatewayError::Backend(format!("{} {}", status, body.trim())))
}

async fn fetch_status(client: &Client, url: &str) -> GatewayResult<bool> {
    let resp = client.get(url).send().await.map_err(transport)?;
    decode::<MonitoringStatus>(resp).await.map(|s| s.running)
}

impl DataGateway for HttpGateway {
    async fn list_applications(&self) -> GatewayResult<Vec<AppInfo>> {
        self.get("/apps", &()).await
    }

    async fn total_key_count(&self, query: CountQuery) -> GatewayResult<u64> {
        let total: TotalCount = self.get("/keys/total", &query).await?;
        Ok(total.total)
    }

    async fn key_ranking(&self, query: RankingQuery) -> GatewayResult<Vec<RankingEntry>> {
        self.get("/keys/ranking", &query).await
    }

    async fn monitoring_status(&self) -> GatewayResult<bool> {
        fetch_status(&self.client, &self.url("/monitoring/status")).await
    }

    async fn toggle_monitoring(&self) -> GatewayResult<()> {
        let resp = self
            .client
            .post(self.url("/monitoring/toggle"))
            .send()
            .await
            .map_err(transport)?;
        check(resp).await?;
        Ok(())
    }

    async fn observed_date_range(&self) -> GatewayResult<DateRange> {
        self.get("/keys/date-range", &()).await
    }

    /// Polls the status endpoint and forwards every change after the first
    /// reading. Must be called from within a Tokio runtime.
    fn subscribe_monitoring(&self, sink: mpsc::Sender<bool>) -> GatewayResult<SubscriptionId> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let client = self.client.clone();
        let url = self.url("/monitoring/status");
        let period = self.poll_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            let mut last: Option<bool> = None;
            loop {
                ticker.tick().await;
                match fetch_status(&client, &url).await {
                    Ok(running) => {
                        if last.is_some_and(|prev| prev != running) && sink.send(running).await.is_err() {
                            break;
                        }
                        last = Some(running);
                    }
                    Err(e) => debug!("status poll failed: {}", e),
                }
            }
        });

        self.pollers
            .lock()
            .map_err(|_| GatewayError::Closed)?
            .insert(id, handle);
        info!(id, every_ms = period.as_millis() as u64, "polling monitoring status");
        Ok(SubscriptionId(id))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let handle = match self.pollers.lock() {
            Ok(mut pollers) => pollers.remove(&id.0),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl Drop for HttpGateway {
    fn drop(&mut self) {
        if let Ok(pollers) = self.pollers.get_mut() {
            for (_, handle) in pollers.drain() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    async fn serve(app: Router) -> String {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(addr).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://127.0.0.1:{}", port)
    }

    #[tokio::test]
    async fn test_ranking_sends_only_set_params() {
        let app = Router::new().route(
            "/keys/ranking",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("app_id").map(String::as_str), Some("3"));
                assert_eq!(params.get("limit").map(String::as_str), Some("2"));
                assert!(!params.contains_key("start"));
                Json(json!([
                    { "key_code": "KeyA", "count": 10 },
                    { "key_code": "Space", "count": 4 }
                ]))
            }),
        );
        let gw = HttpGateway::new(&serve(app).await, Duration::from_secs(1));

        let ranking = gw
            .key_ranking(RankingQuery {
                app_id: Some(3),
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(ranking, vec![RankingEntry::new("KeyA", 10), RankingEntry::new("Space", 4)]);
    }

    #[tokio::test]
    async fn test_total_and_range_decode() {
        let app = Router::new()
            .route("/keys/total", get(|| async { Json(json!({ "total": 1234 })) }))
            .route(
                "/keys/date-range",
                get(|| async { Json(json!({ "min": 100, "max": 200 })) }),
            );
        let gw = HttpGateway::new(&format!("{}/", serve(app).await), Duration::from_secs(1));

        assert_eq!(gw.total_key_count(CountQuery::lifetime(None)).await.unwrap(), 1234);
        assert_eq!(gw.observed_date_range().await.unwrap(), DateRange { min: 100, max: 200 });
    }

    #[tokio::test]
    async fn test_error_kinds() {
        let app = Router::new()
            .route(
                "/apps",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database is locked") }),
            )
            .route("/monitoring/status", get(|| async { "not json" }));
        let gw = HttpGateway::new(&serve(app).await, Duration::from_secs(1));

        match gw.list_applications().await {
            Err(GatewayError::Backend(msg)) => assert!(msg.contains("database is locked")),
            other => panic!("expected backend error, got {:?}", other),
        }
        assert!(matches!(gw.monitoring_status().await, Err(GatewayError::Decode(_))));

        let dead = HttpGateway::new("http://127.0.0.1:1", Duration::from_secs(1));
        assert!(matches!(dead.monitoring_status().await, Err(GatewayError::Transport(_))));
    }

    #[tokio::test]
    async fn test_toggle_posts() {
        let running = Arc::new(AtomicBool::new(false));
        let flag = running.clone();
        let app = Router::new().route(
            "/monitoring/toggle",
            post(move || {
                let flag = flag.clone();
                async move {
                    flag.fetch_xor(true, Ordering::SeqCst);
                    StatusCode::NO_CONTENT
                }
            }),
        );
        let gw = HttpGateway::new(&serve(app).await, Duration::from_secs(1));

        gw.toggle_monitoring().await.unwrap();
        assert!(running.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_polling_forwards_changes_until_unsubscribed() {
        let running = Arc::new(AtomicBool::new(false));
        let flag = running.clone();
        let app = Router::new().route(
            "/monitoring/status",
            get(move || {
                let flag = flag.clone();
                async move { Json(json!({ "running": flag.load(Ordering::SeqCst) })) }
            }),
        );
        let gw = HttpGateway::new(&serve(app).await, Duration::from_millis(10));
        let (tx, mut rx) = mpsc::channel(4);

        let id = gw.subscribe_monitoring(tx).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        running.store(true, Ordering::SeqCst);

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
        assert_eq!(event, Some(true));

        gw.unsubscribe(id);
        // The poller owned the only sender; aborting it closes the channel.
        let closed = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
        assert_eq!(closed, None);
    }
}

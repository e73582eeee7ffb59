#![allow(dead_code)] // Not every test binary uses every helper

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

pub const SCOPED_TOTAL: u64 = 50;
pub const LIFETIME_TOTAL: u64 = 500;

#[derive(Default)]
struct Backend {
    running: AtomicBool,
}

type Params = Query<HashMap<String, String>>;

async fn apps() -> Json<Value> {
    Json(json!([
        { "id": 1, "name": "Editor", "bundle_id": "com.example.editor" },
        { "id": 2, "name": "Browser", "bundle_id": "com.example.browser" }
    ]))
}

async fn total(Query(params): Params) -> Json<Value> {
    let total = if params.contains_key("start") || params.contains_key("end") {
        SCOPED_TOTAL
    } else if let Some(id) = params.get("app_id") {
        id.parse::<u64>().unwrap_or(0) * 100
    } else {
        LIFETIME_TOTAL
    };
    Json(json!({ "total": total }))
}

async fn ranking() -> Json<Value> {
    Json(json!([
        { "key_code": "Space", "count": 30 },
        { "key_code": "KeyE", "count": 20 }
    ]))
}

async fn status(State(backend): State<Arc<Backend>>) -> Json<Value> {
    Json(json!({ "running": backend.running.load(Ordering::SeqCst) }))
}

async fn toggle(State(backend): State<Arc<Backend>>) -> StatusCode {
    backend.running.fetch_xor(true, Ordering::SeqCst);
    StatusCode::NO_CONTENT
}

async fn date_range() -> Json<Value> {
    Json(json!({ "min": 1_704_844_800, "max": 1_718_388_000 }))
}

/// Serves a fixed monitoring backend on a background thread for the life
/// of the test process. Returns its base URL.
pub fn start_backend() -> String {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let app = Router::new()
                .route("/apps", get(apps))
                .route("/keys/total", get(total))
                .route("/keys/ranking", get(ranking))
                .route("/keys/date-range", get(date_range))
                .route("/monitoring/status", get(status))
                .route("/monitoring/toggle", post(toggle))
                .with_state(Arc::new(Backend::default()));

            let addr = SocketAddr::from(([127, 0, 0, 1], 0));
            let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
            let port = listener.local_addr().unwrap().port();
            tx.send(format!("http://127.0.0.1:{}", port)).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    rx.recv().unwrap()
}

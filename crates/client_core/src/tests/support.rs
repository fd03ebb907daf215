//! In-process stand-in for the leaderboard service: additive totals, top
//! ten by total, full-ordering rank with the `rank: -1` reply for unknown
//! users.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

use crate::config::ClientSettings;

#[derive(Clone, Default)]
pub struct FakeService {
    pub totals: Arc<Mutex<HashMap<i64, i64>>>,
    pub submissions: Arc<Mutex<Vec<Value>>>,
    pub top_requests: Arc<Mutex<u32>>,
    pub rank_requests: Arc<Mutex<Vec<String>>>,
    /// Raw body returned by the top endpoint instead of the computed list.
    pub top_body: Arc<Mutex<Option<Value>>>,
    /// Status every endpoint answers with instead of its normal reply.
    pub status_override: Arc<Mutex<Option<StatusCode>>>,
}

impl FakeService {
    pub async fn set_totals(&self, totals: &[(i64, i64)]) {
        *self.totals.lock().await = totals.iter().copied().collect();
    }

    async fn ordering(&self) -> Vec<(i64, i64)> {
        let mut ordered: Vec<(i64, i64)> = self
            .totals
            .lock()
            .await
            .iter()
            .map(|(user_id, total)| (*user_id, *total))
            .collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ordered
    }
}

pub fn settings_for(base_url: &str) -> ClientSettings {
    ClientSettings {
        base_url: base_url.to_string(),
        ..ClientSettings::default()
    }
}

pub async fn spawn_fake_service() -> (String, FakeService) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = FakeService::default();
    let app = Router::new()
        .route("/api/leaderboard/submit", post(handle_submit))
        .route("/api/leaderboard/top", get(handle_top))
        .route("/api/leaderboard/rank/:user_id", get(handle_rank))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

async fn handle_submit(
    State(state): State<FakeService>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.submissions.lock().await.push(body.clone());
    if let Some(status) = *state.status_override.lock().await {
        return (status, Json(json!({ "detail": "forced failure" })));
    }

    let (Some(user_id), Some(score)) = (body["user_id"].as_i64(), body["score"].as_i64()) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": "user_id and score must be integers" })),
        );
    };
    *state.totals.lock().await.entry(user_id).or_default() += score;
    (
        StatusCode::OK,
        Json(json!({ "message": "Score submitted successfully" })),
    )
}

async fn handle_top(State(state): State<FakeService>) -> (StatusCode, Json<Value>) {
    *state.top_requests.lock().await += 1;
    if let Some(status) = *state.status_override.lock().await {
        return (status, Json(json!({ "detail": "forced failure" })));
    }
    if let Some(body) = state.top_body.lock().await.clone() {
        return (StatusCode::OK, Json(body));
    }

    let top: Vec<Value> = state
        .ordering()
        .await
        .into_iter()
        .take(10)
        .map(|(user_id, total_score)| {
            json!({ "user_id": user_id, "total_score": total_score, "rank": null })
        })
        .collect();
    (StatusCode::OK, Json(Value::Array(top)))
}

async fn handle_rank(
    State(state): State<FakeService>,
    Path(raw_user_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    state.rank_requests.lock().await.push(raw_user_id.clone());
    if let Some(status) = *state.status_override.lock().await {
        return (status, Json(json!({ "detail": "forced failure" })));
    }
    let Ok(user_id) = raw_user_id.parse::<i64>() else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": "user_id must be an integer" })),
        );
    };

    let ordering = state.ordering().await;
    let Some(total_score) = ordering
        .iter()
        .find(|(id, _)| *id == user_id)
        .map(|(_, total)| *total)
    else {
        return (
            StatusCode::OK,
            Json(json!({ "user_id": user_id, "total_score": 0, "rank": -1 })),
        );
    };
    // Competition ranking: tied totals share a rank.
    let rank = ordering
        .iter()
        .filter(|(_, total)| *total > total_score)
        .count()
        + 1;
    (
        StatusCode::OK,
        Json(json!({ "user_id": user_id, "total_score": total_score, "rank": rank })),
    )
}

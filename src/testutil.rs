//! In-process mock of the portal backend for tests.
//!
//! Serves the same contract as the real backend (`/login`, `/me`,
//! `/applications`, `/applications/{id}/access-token`) on an ephemeral
//! port, with call counters and transient-failure injection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

pub(crate) struct MockBackend {
    pub(crate) base_url: String,
    state: Arc<BackendState>,
}

#[derive(Default)]
struct BackendState {
    me_calls: AtomicUsize,
    catalog_calls: AtomicUsize,
    grant_calls: AtomicUsize,
    fail_catalog: AtomicUsize,
}

impl MockBackend {
    pub(crate) const VALID_TOKEN: &'static str = "portal-session-token";

    pub(crate) async fn spawn() -> Self {
        let state = Arc::new(BackendState::default());

        let app = Router::new()
            .route("/login", post(login))
            .route("/me", get(me))
            .route("/applications", get(applications))
            .route("/applications/{id}/access-token", post(access_token))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub(crate) fn me_calls(&self) -> usize {
        self.state.me_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn catalog_calls(&self) -> usize {
        self.state.catalog_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn grant_calls(&self) -> usize {
        self.state.grant_calls.load(Ordering::SeqCst)
    }

    /// Make the next `n` catalog fetches fail with a 500.
    pub(crate) fn fail_next_catalog_fetches(&self, n: usize) {
        self.state.fail_catalog.store(n, Ordering::SeqCst);
    }
}

fn admin_user() -> serde_json::Value {
    json!({
        "id": "user-1",
        "username": "admin",
        "email": "admin@example.com",
        "full_name": "Admin User",
        "is_active": true
    })
}

fn authorized(headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {}", MockBackend::VALID_TOKEN);
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some(expected.as_str())
}

fn unauthorized() -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Could not validate credentials"})),
    )
        .into_response()
}

#[derive(serde::Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(Json(body): Json<LoginBody>) -> axum::response::Response {
    if body.username == "admin" && body.password == "password" {
        Json(json!({
            "access_token": MockBackend::VALID_TOKEN,
            "token_type": "bearer",
            "user": admin_user()
        }))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Incorrect username or password"})),
        )
            .into_response()
    }
}

async fn me(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> axum::response::Response {
    state.me_calls.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(admin_user()).into_response()
}

async fn applications(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> axum::response::Response {
    state.catalog_calls.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return unauthorized();
    }

    if state.fail_catalog.load(Ordering::SeqCst) > 0 {
        state.fail_catalog.fetch_sub(1, Ordering::SeqCst);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "catalog unavailable"})),
        )
            .into_response();
    }

    Json(json!([
        {
            "id": "app1",
            "name": "Wiki",
            "description": "Team knowledge base",
            "icon": "book",
            "category": "native",
            "url": "https://example.com",
            "is_active": true
        },
        {
            "id": "app2",
            "name": "Monitoring",
            "description": "Dashboards and alerts",
            "icon": "chart",
            "category": "native",
            "url": "https://grafana.example.com",
            "is_active": true
        },
        {
            "id": "portal1",
            "name": "Analytics",
            "description": "Usage analytics",
            "icon": "bars",
            "category": "portal",
            "is_active": true
        },
        {
            "id": "portal2",
            "name": "Invoices",
            "description": "Billing and invoicing",
            "icon": "money",
            "category": "portal",
            "is_active": true
        }
    ]))
    .into_response()
}

async fn access_token(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    state.grant_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "access_token": format!("grant-{}", id),
        "app_id": id
    }))
    .into_response()
}

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use sha2::{Digest, Sha256};

use super::response::ApiError;
use super::{decisions, groups, rules};
use crate::error::Result as WardenResult;
use crate::warden::Warden;

pub struct AppState {
    pub warden: Arc<Warden>,
    /// SHA-256 of the shared API token, if one is configured.
    token_digest: Option<Vec<u8>>,
}

impl AppState {
    pub fn new(warden: Arc<Warden>, api_token: Option<&str>) -> Self {
        Self {
            warden,
            token_digest: api_token.map(digest),
        }
    }

    #[must_use]
    pub fn requires_token(&self) -> bool {
        self.token_digest.is_some()
    }

    #[must_use]
    pub fn token_matches(&self, presented: &str) -> bool {
        self.token_digest
            .as_deref()
            .is_some_and(|expected| expected == digest(presented).as_slice())
    }

    /// Runs a warden call on the blocking pool. Store sessions wait on the
    /// connection lock and SQLite's busy handler, which must not stall the
    /// async workers.
    pub async fn run<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Warden) -> WardenResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let warden = Arc::clone(&self.warden);
        tokio::task::spawn_blocking(move || f(&warden))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "warden task failed");
                ApiError::unavailable("Something went wrong, please try again.")
            })?
            .map_err(ApiError::from)
    }
}

fn digest(token: &str) -> Vec<u8> {
    Sha256::digest(token.as_bytes()).to_vec()
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Decisions
        .route("/check/command", get(decisions::check_command))
        .route("/check/manage", get(decisions::check_manage))
        .route("/users/{id}", put(decisions::ensure_user))
        .route("/users/{id}/groups", get(decisions::user_groups))
        .route("/users", get(decisions::find_users))
        // Groups
        .route("/groups", get(groups::list_groups).post(groups::create_group))
        .route(
            "/groups/{name}",
            get(groups::get_group).delete(groups::delete_group),
        )
        .route("/groups/{name}/members", post(groups::add_member))
        .route(
            "/groups/{name}/members/{user_id}",
            delete(groups::remove_member),
        )
        .route("/groups/{name}/commands", post(groups::grant_command))
        .route(
            "/groups/{name}/commands/{command}",
            delete(groups::revoke_command),
        )
        .route("/groups/{name}/manages", post(groups::add_managed))
        .route(
            "/groups/{name}/manages/{managed}",
            delete(groups::remove_managed),
        )
        // Rule tables
        .route(
            "/repositories/{repo}/autolabels/{rule_type}",
            get(rules::list_autolabels),
        )
        .route("/repositories/{repo}/autolabels", post(rules::add_autolabel))
        .route("/repositories/{repo}/labels", get(rules::labels_for))
        .route(
            "/repositories/{repo}/priority",
            get(rules::get_priority).put(rules::set_priority),
        )
        .route("/autolabels/{id}", delete(rules::remove_autolabel))
        .route("/priorities/{priority}", get(rules::repositories_with))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

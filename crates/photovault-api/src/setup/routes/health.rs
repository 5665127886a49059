//! Health check handler and response type.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(serde::Serialize)]
pub(super) struct HealthCheckResponse {
    pub status: String,
    pub private_root: String,
    pub public_roots: usize,
}

/// Liveness plus a cheap look at the private object root.
///
/// An unconfigured or missing root is reported but does not fail the check;
/// the process can still serve public objects.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resolver = state.objects.resolver();

    let private_root = match resolver.private_root() {
        Ok(root) => match tokio::time::timeout(CHECK_TIMEOUT, tokio::fs::metadata(root)).await {
            Ok(Ok(meta)) if meta.is_dir() => "healthy".to_string(),
            Ok(Ok(_)) => "not_a_directory".to_string(),
            Ok(Err(e)) => format!("unavailable: {}", e.kind()),
            Err(_) => "timeout".to_string(),
        },
        Err(_) => "not_configured".to_string(),
    };

    (
        StatusCode::OK,
        Json(HealthCheckResponse {
            status: "healthy".to_string(),
            private_root,
            public_roots: resolver.public_roots().len(),
        }),
    )
}

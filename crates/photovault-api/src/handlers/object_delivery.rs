//! Object delivery: authorized reads and deletes under `/objects/`, plus the
//! unauthenticated public search-path route.
//!
//! Delivery runs in a spawned task writing into a bounded channel; the handler
//! waits for the response head and hands the channel to the body. Anything
//! that fails before the head becomes an ordinary error response.

use crate::auth::RequesterContext;
use crate::constants::{DELIVERY_CHANNEL_CAPACITY, OBJECTS_ROUTE};
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use photovault_core::{AppError, LogicalPath, Permission};
use photovault_storage::{channel_sink, ChannelSink, DeliveryOutcome};
use std::future::Future;
use std::sync::Arc;

async fn stream_delivery<F, Fut>(run: F) -> Result<Response, HttpAppError>
where
    F: FnOnce(ChannelSink) -> Fut,
    Fut: Future<Output = Result<DeliveryOutcome, AppError>> + Send + 'static,
{
    let (sink, head_rx, body) = channel_sink(DELIVERY_CHANNEL_CAPACITY);
    let task = tokio::spawn(run(sink));

    let head = match head_rx.await {
        Ok(head) => head,
        Err(_) => {
            // Head sender dropped: the task ended before streaming started.
            return Err(match task.await {
                Ok(Err(e)) => e.into(),
                Ok(Ok(outcome)) => AppError::Internal(format!(
                    "Delivery ended before the response head: {:?}",
                    outcome
                ))
                .into(),
                Err(e) => {
                    tracing::error!(error = %e, "Delivery task failed");
                    AppError::Internal(format!("Delivery task failed: {}", e)).into()
                }
            });
        }
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, head.content_type)
        .header(header::CONTENT_LENGTH, head.content_length)
        .header(header::CACHE_CONTROL, head.cache_control)
        .body(Body::from_stream(body))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            HttpAppError::from(AppError::Internal(e.to_string()))
        })
}

fn logical_path(path: &str) -> Result<LogicalPath, AppError> {
    LogicalPath::parse(&format!("{}/{}", OBJECTS_ROUTE, path.trim_start_matches('/')))
}

#[utoipa::path(
    get,
    path = "/objects/{path}",
    tag = "delivery",
    params(("path" = String, Path, description = "Object path below /objects/")),
    responses(
        (status = 200, description = "Object bytes", content_type = "application/octet-stream"),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Read access denied", body = ErrorResponse),
        (status = 404, description = "Object not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, requester), fields(requester = %requester.principal))]
pub async fn get_object(
    requester: RequesterContext,
    Path(path): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, HttpAppError> {
    let logical = logical_path(&path)?;
    let objects = state.objects.clone();
    let principal = requester.principal;

    stream_delivery(move |mut sink| async move {
        objects
            .authorize_and_stream(&logical, &principal, Permission::Read, &mut sink)
            .await
    })
    .await
}

#[utoipa::path(
    delete,
    path = "/objects/{path}",
    tag = "delivery",
    params(("path" = String, Path, description = "Object path below /objects/")),
    responses(
        (status = 204, description = "Object and its policy removed"),
        (status = 403, description = "Write access denied", body = ErrorResponse),
        (status = 404, description = "Object not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, requester), fields(requester = %requester.principal))]
pub async fn delete_object(
    requester: RequesterContext,
    Path(path): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let logical = logical_path(&path)?;
    state
        .objects
        .unregister_object(&logical, &requester.principal)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/public-objects/{path}",
    tag = "delivery",
    params(("path" = String, Path, description = "Path searched across the public roots")),
    responses(
        (status = 200, description = "Object bytes", content_type = "application/octet-stream"),
        (status = 404, description = "Object not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_public_object(
    Path(path): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, HttpAppError> {
    let objects = state.objects.clone();

    stream_delivery(move |mut sink| async move {
        objects.stream_public(&path, &mut sink).await
    })
    .await
}

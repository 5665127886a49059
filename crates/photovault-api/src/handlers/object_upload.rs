//! Upload grants and the signed PUT endpoint that receives object bytes.

use crate::auth::RequesterContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use futures::TryStreamExt;
use photovault_core::models::UploadGrantResponse;
use photovault_core::ObjectId;
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::io::StreamReader;

#[utoipa::path(
    post,
    path = "/api/objects/upload",
    tag = "objects",
    responses(
        (status = 200, description = "Upload grant issued", body = UploadGrantResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 500, description = "Private object root not configured", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, requester), fields(requester = %requester.principal))]
pub async fn create_upload_grant(
    requester: RequesterContext,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let grant = state.objects.create_upload_grant().await?;

    Ok((StatusCode::OK, Json(UploadGrantResponse::from(grant))))
}

#[derive(Debug, Deserialize)]
pub struct SignedUploadQuery {
    pub expires: i64,
    pub signature: String,
}

#[utoipa::path(
    put,
    path = "/api/objects/upload/{object_id}",
    tag = "objects",
    params(
        ("object_id" = String, Path, description = "Object id from the upload grant"),
        ("expires" = i64, Query, description = "Expiry as unix seconds"),
        ("signature" = String, Query, description = "Hex HMAC signature")
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Bytes stored"),
        (status = 403, description = "Bad signature, expired URL or signed uploads disabled", body = ErrorResponse),
        (status = 404, description = "No grant for this object", body = ErrorResponse),
        (status = 409, description = "Object already registered", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query, body), fields(object_id = %object_id))]
pub async fn receive_upload(
    Path(object_id): Path<String>,
    Query(query): Query<SignedUploadQuery>,
    State(state): State<Arc<AppState>>,
    body: Body,
) -> Result<impl IntoResponse, HttpAppError> {
    let object_id = ObjectId::parse(&object_id)?;

    let stream = body.into_data_stream().map_err(std::io::Error::other);
    let reader = StreamReader::new(Box::pin(stream));

    let size_bytes = state
        .objects
        .receive_upload(&object_id, query.expires, &query.signature, reader)
        .await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "object_id": object_id.to_string(),
            "size_bytes": size_bytes,
        })),
    ))
}

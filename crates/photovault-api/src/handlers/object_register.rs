use crate::auth::RequesterContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use photovault_core::models::{RegisterObjectRequest, RegisterObjectResponse};
use photovault_core::ObjectId;
use std::sync::Arc;

/// Register uploaded bytes under the caller and attach their access policy.
#[utoipa::path(
    post,
    path = "/api/objects",
    tag = "objects",
    request_body = RegisterObjectRequest,
    responses(
        (status = 200, description = "Object registered", body = RegisterObjectResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Upload grant expired", body = ErrorResponse),
        (status = 404, description = "No upload grant or no uploaded bytes", body = ErrorResponse),
        (status = 409, description = "Object already registered with different terms", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, requester, request), fields(requester = %requester.principal, object_id = %request.object_id))]
pub async fn register_object(
    requester: RequesterContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<RegisterObjectRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let object_id = ObjectId::parse(&request.object_id)?;

    let (object_path, policy) = state
        .objects
        .register_object(&object_id, &requester.principal, request.visibility)
        .await?;

    Ok((
        StatusCode::OK,
        Json(RegisterObjectResponse {
            object_path: object_path.to_string(),
            policy,
        }),
    ))
}

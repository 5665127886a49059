//! Owner-only policy mutations.

use crate::auth::RequesterContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use photovault_core::models::{GrantAccessRequest, PolicyResponse, UpdateVisibilityRequest};
use photovault_core::{AclPolicy, AclRule, ObjectId, PrincipalId};
use std::sync::Arc;

fn policy_response(object_id: &ObjectId, policy: AclPolicy) -> Json<PolicyResponse> {
    Json(PolicyResponse {
        object_id: object_id.to_string(),
        policy,
    })
}

#[utoipa::path(
    patch,
    path = "/api/objects/{object_id}/policy",
    tag = "policies",
    params(("object_id" = String, Path, description = "Object id")),
    request_body = UpdateVisibilityRequest,
    responses(
        (status = 200, description = "Visibility updated", body = PolicyResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Object has no policy", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, requester, payload), fields(requester = %requester.principal))]
pub async fn update_visibility(
    requester: RequesterContext,
    Path(object_id): Path<String>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpdateVisibilityRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let Json(request) = payload?;
    let object_id = ObjectId::parse(&object_id)?;

    let policy = state
        .objects
        .update_visibility(&object_id, &requester.principal, request.visibility)
        .await?;

    Ok(policy_response(&object_id, policy))
}

#[utoipa::path(
    post,
    path = "/api/objects/{object_id}/grants",
    tag = "policies",
    params(("object_id" = String, Path, description = "Object id")),
    request_body = GrantAccessRequest,
    responses(
        (status = 200, description = "Rule added", body = PolicyResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Object has no policy", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, requester, request), fields(requester = %requester.principal))]
pub async fn grant_access(
    requester: RequesterContext,
    Path(object_id): Path<String>,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<GrantAccessRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let object_id = ObjectId::parse(&object_id)?;
    let rule = AclRule {
        principal: PrincipalId::new(request.principal),
        permission: request.permission,
    };

    let policy = state
        .objects
        .grant_access(&object_id, &requester.principal, rule)
        .await?;

    Ok(policy_response(&object_id, policy))
}

#[utoipa::path(
    delete,
    path = "/api/objects/{object_id}/grants/{principal}",
    tag = "policies",
    params(
        ("object_id" = String, Path, description = "Object id"),
        ("principal" = String, Path, description = "Principal whose rules are revoked")
    ),
    responses(
        (status = 200, description = "Rules revoked", body = PolicyResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Object has no policy", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, requester), fields(requester = %requester.principal))]
pub async fn revoke_access(
    requester: RequesterContext,
    Path((object_id, principal)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let object_id = ObjectId::parse(&object_id)?;

    let policy = state
        .objects
        .revoke_access(&object_id, &requester.principal, &PrincipalId::new(principal))
        .await?;

    Ok(policy_response(&object_id, policy))
}

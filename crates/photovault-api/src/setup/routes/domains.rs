//! Domain route groups (uploads, policies, delivery).

use crate::constants::{API_BASE, OBJECTS_ROUTE, PUBLIC_OBJECTS_ROUTE, UPLOAD_ROUTE_PREFIX};
use crate::handlers;
use crate::state::AppState;
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use std::sync::Arc;

pub fn upload_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            UPLOAD_ROUTE_PREFIX,
            post(handlers::object_upload::create_upload_grant),
        )
        .route(
            &format!("{}/objects", API_BASE),
            post(handlers::object_register::register_object),
        )
        .with_state(state)
}

/// The signature in the query string is the credential; no bearer token.
pub fn signed_upload_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/{{object_id}}", UPLOAD_ROUTE_PREFIX),
            put(handlers::object_upload::receive_upload),
        )
        .with_state(state)
}

pub fn policy_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/objects/{{object_id}}/policy", API_BASE),
            patch(handlers::object_policy::update_visibility),
        )
        .route(
            &format!("{}/objects/{{object_id}}/grants", API_BASE),
            post(handlers::object_policy::grant_access),
        )
        .route(
            &format!("{}/objects/{{object_id}}/grants/{{principal}}", API_BASE),
            delete(handlers::object_policy::revoke_access),
        )
        .with_state(state)
}

pub fn object_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/{{*path}}", OBJECTS_ROUTE),
            get(handlers::object_delivery::get_object)
                .delete(handlers::object_delivery::delete_object),
        )
        .with_state(state)
}

pub fn public_object_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/{{*path}}", PUBLIC_OBJECTS_ROUTE),
            get(handlers::object_delivery::get_public_object),
        )
        .with_state(state)
}

//! Application state shared by every handler.

use crate::auth::AuthState;
use crate::services::ObjectStorageService;
use photovault_core::Config;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub objects: ObjectStorageService,
    pub auth: Arc<AuthState>,
}

impl AppState {
    pub fn new(config: &Config, objects: ObjectStorageService) -> Self {
        Self {
            auth: Arc::new(AuthState::new(config.jwt_secret())),
            objects,
        }
    }
}

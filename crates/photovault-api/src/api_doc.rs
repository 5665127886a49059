//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use photovault_core::models;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PhotoVault Object Storage API",
        version = "0.1.0",
        description = "Upload grants, object registration with access policies, and authorized streaming delivery."
    ),
    modifiers(&BearerAuth),
    paths(
        // Uploads
        handlers::object_upload::create_upload_grant,
        handlers::object_upload::receive_upload,
        handlers::object_register::register_object,
        // Policies
        handlers::object_policy::update_visibility,
        handlers::object_policy::grant_access,
        handlers::object_policy::revoke_access,
        // Delivery
        handlers::object_delivery::get_object,
        handlers::object_delivery::delete_object,
        handlers::object_delivery::get_public_object,
    ),
    components(
        schemas(
            models::UploadGrantResponse,
            models::WriteTarget,
            models::RegisterObjectRequest,
            models::RegisterObjectResponse,
            models::UpdateVisibilityRequest,
            models::GrantAccessRequest,
            models::PolicyResponse,
            models::AclPolicy,
            models::AclRule,
            models::Visibility,
            models::Permission,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "objects", description = "Upload grants, signed uploads and object registration"),
        (name = "policies", description = "Owner-only access policy changes"),
        (name = "delivery", description = "Authorized and public object streaming")
    )
)]
pub struct ApiDoc;

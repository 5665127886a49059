//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use photovault_core::{Config, UploadTargetMode};

/// Validate critical configuration values
///
/// Runs `Config::validate` and the deployment checks that depend on the
/// environment (CORS, grant enforcement).
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();
    let env_var = std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .ok();

    if is_production && env_var.is_none() {
        tracing::warn!(
            "Production mode detected but ENVIRONMENT/APP_ENV not set - error details may leak"
        );
    }

    if is_production && config.cors_origins().iter().any(|o| o == "*") {
        return Err(anyhow::anyhow!(
            "CORS configured to allow all origins (*) in production. \
            Set specific allowed origins via CORS_ORIGINS."
        ));
    }

    if is_production && !config.storage().enforce_upload_grants {
        return Err(anyhow::anyhow!(
            "ENFORCE_UPLOAD_GRANTS cannot be disabled in production"
        ));
    }

    if config.storage().upload_target == UploadTargetMode::Local {
        tracing::warn!(
            "UPLOAD_TARGET=local hands out filesystem paths, clients must share the private root"
        );
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use photovault_core::StorageConfig;

    fn config(environment: &str, cors: &str) -> Config {
        Config {
            server_port: 3000,
            environment: environment.to_string(),
            cors_origins: vec![cors.to_string()],
            jwt_secret: "a-test-jwt-secret-with-at-least-32-chars".to_string(),
            database_url: None,
            db_max_connections: 10,
            storage: StorageConfig {
                private_object_dir: None,
                public_object_search_paths: Vec::new(),
                upload_target: UploadTargetMode::Local,
                public_base_url: "http://localhost:3000".to_string(),
                upload_signing_secret: None,
                upload_grant_ttl_secs: 900,
                object_cache_ttl_secs: 3600,
                max_upload_size_bytes: 1024,
                enforce_upload_grants: true,
            },
        }
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        assert!(validate_config(&config("production", "*")).is_err());
        assert!(validate_config(&config("production", "https://app.example.com")).is_ok());
        assert!(validate_config(&config("development", "*")).is_ok());
    }

    #[test]
    fn test_grant_enforcement_required_in_production() {
        let mut config = config("production", "https://app.example.com");
        config.storage.enforce_upload_grants = false;
        assert!(validate_config(&config).is_err());
    }
}

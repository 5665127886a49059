//! Configuration module
//!
//! Environment-driven settings for the HTTP service and the storage core. The
//! private object root is optional at startup; its absence only
//! surfaces as a configuration error the first time an operation needs it.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

const SERVER_PORT: u16 = 3000;
const UPLOAD_GRANT_TTL_SECS: u64 = 15 * 60;
const MAX_UPLOAD_GRANT_TTL_SECS: u64 = 7 * 24 * 60 * 60;
const OBJECT_CACHE_TTL_SECS: u64 = 3600;
const MAX_UPLOAD_SIZE_BYTES: usize = 500 * 1024 * 1024;
const DB_MAX_CONNECTIONS: u32 = 10;
const MIN_SECRET_LEN: usize = 32;

/// How upload grants hand out their write target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTargetMode {
    /// Return a filesystem path under the private root.
    Local,
    /// Return a signed PUT URL served by this API.
    Signed,
}

impl FromStr for UploadTargetMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(UploadTargetMode::Local),
            "signed" => Ok(UploadTargetMode::Signed),
            _ => Err(anyhow::anyhow!("Invalid upload target mode: {}", s)),
        }
    }
}

impl Display for UploadTargetMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadTargetMode::Local => write!(f, "local"),
            UploadTargetMode::Signed => write!(f, "signed"),
        }
    }
}

/// Settings consumed by the storage core (resolver, grant issuer, delivery).
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub private_object_dir: Option<PathBuf>,
    pub public_object_search_paths: Vec<PathBuf>,
    pub upload_target: UploadTargetMode,
    pub public_base_url: String,
    pub upload_signing_secret: Option<String>,
    pub upload_grant_ttl_secs: u64,
    pub object_cache_ttl_secs: u64,
    pub max_upload_size_bytes: usize,
    pub enforce_upload_grants: bool,
}

/// Full service configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub storage: StorageConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let server_port = env::var("SERVER_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(SERVER_PORT);

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins = split_list(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;

        let upload_target = env::var("UPLOAD_TARGET")
            .unwrap_or_else(|_| "signed".to_string())
            .parse()?;

        let storage = StorageConfig {
            private_object_dir: env::var("PRIVATE_OBJECT_DIR")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            public_object_search_paths: split_list(
                &env::var("PUBLIC_OBJECT_SEARCH_PATHS").unwrap_or_default(),
            )
            .into_iter()
            .map(PathBuf::from)
            .collect(),
            upload_target,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("http://localhost:{}", server_port)),
            upload_signing_secret: env::var("UPLOAD_SIGNING_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            upload_grant_ttl_secs: env::var("UPLOAD_GRANT_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&ttl| ttl > 0)
                .unwrap_or(UPLOAD_GRANT_TTL_SECS),
            object_cache_ttl_secs: env::var("OBJECT_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(OBJECT_CACHE_TTL_SECS),
            max_upload_size_bytes: env::var("MAX_UPLOAD_SIZE_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(MAX_UPLOAD_SIZE_BYTES),
            enforce_upload_grants: env::var("ENFORCE_UPLOAD_GRANTS")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
        };

        let config = Config {
            server_port,
            environment,
            cors_origins,
            jwt_secret,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DB_MAX_CONNECTIONS),
            storage,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least {} characters long",
                MIN_SECRET_LEN
            ));
        }

        if self.storage.upload_target == UploadTargetMode::Signed {
            match self.storage.upload_signing_secret.as_deref() {
                None => {
                    return Err(anyhow::anyhow!(
                        "UPLOAD_SIGNING_SECRET must be set when UPLOAD_TARGET=signed"
                    ))
                }
                Some(secret) if secret.len() < MIN_SECRET_LEN => {
                    return Err(anyhow::anyhow!(
                        "UPLOAD_SIGNING_SECRET must be at least {} characters long",
                        MIN_SECRET_LEN
                    ))
                }
                Some(_) => {}
            }
            if !self.storage.public_base_url.starts_with("http://")
                && !self.storage.public_base_url.starts_with("https://")
            {
                return Err(anyhow::anyhow!(
                    "PUBLIC_BASE_URL must be an http(s) URL"
                ));
            }
        }

        if self.storage.upload_grant_ttl_secs == 0
            || self.storage.upload_grant_ttl_secs > MAX_UPLOAD_GRANT_TTL_SECS
        {
            return Err(anyhow::anyhow!(
                "UPLOAD_GRANT_TTL_SECS must be between 1 and {}",
                MAX_UPLOAD_GRANT_TTL_SECS
            ));
        }

        if let Some(url) = self.database_url.as_deref() {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        if self.db_max_connections == 0 {
            return Err(anyhow::anyhow!("DB_MAX_CONNECTIONS cannot be 0"));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    pub fn object_cache_ttl_secs(&self) -> u64 {
        self.storage.object_cache_ttl_secs
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.storage.max_upload_size_bytes
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

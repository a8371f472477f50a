//! Configuration module
//!
//! Configuration is read from the process environment (with `.env` support),
//! validated once at startup and then shared read-only.

use std::env;
use std::path::PathBuf;

use crate::storage_types::{StorageBackend, StorageMode};

// Common constants
const SERVER_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 10;
const MAX_FILE_SIZE_MB: usize = 10;
const MAX_VIDEO_SIZE_MB: usize = 200;
const MAX_DOCUMENT_SIZE_MB: usize = 50;
const HTTP_CONCURRENCY_LIMIT: usize = 1_000;
const LOCAL_STORAGE_PATH: &str = "./uploads";
const DEFAULT_BUCKET_REGION: &str = "us-east-1";
/// Upper bound of a V4 signed URL lifetime (7 days).
pub const MAX_SIGNED_URL_TTL_SECS: u64 = 604_800;

/// Server and upload limits configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub max_file_size_bytes: usize,
    pub max_video_size_bytes: usize,
    pub max_document_size_bytes: usize,
    /// Cap on in-flight requests; uploads buffer whole files in memory
    pub http_concurrency_limit: usize,
}

/// Disk backend settings. Always present: the disk backend needs no credentials.
#[derive(Clone, Debug)]
pub struct DiskConfig {
    pub root: PathBuf,
    pub base_url: String,
}

/// S3-protocol bucket settings (Supabase Storage)
#[derive(Clone, Debug)]
pub struct BucketConfig {
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Base for public object URLs, `<public_url>/<bucket>/<key>`
    pub public_url: String,
}

/// Where the signed-URL backend finds its service account
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceAccount {
    /// Inline JSON key
    Key(String),
    /// Path to a JSON key file
    Path(String),
}

/// Google Cloud Storage settings (Firebase Storage)
#[derive(Clone, Debug)]
pub struct SignedConfig {
    pub bucket: String,
    pub service_account: ServiceAccount,
    pub url_ttl_secs: u64,
}

/// Storage configuration snapshot used for backend selection
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub mode: StorageMode,
    pub disk: DiskConfig,
    pub bucket: Option<BucketConfig>,
    pub signed: Option<SignedConfig>,
}

impl StorageConfig {
    /// Build from a key lookup. `from_env` passes `std::env::var`; tests pass a map.
    pub fn from_lookup<F>(lookup: F, server_port: u16) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mode = match get("STORAGE_MODE") {
            Some(raw) => raw.parse::<StorageMode>()?,
            None => StorageMode::Auto,
        };

        let disk = DiskConfig {
            root: PathBuf::from(
                get("LOCAL_STORAGE_PATH").unwrap_or_else(|| LOCAL_STORAGE_PATH.to_string()),
            ),
            base_url: get("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{}/files", server_port))
                .trim_end_matches('/')
                .to_string(),
        };

        let bucket = match (
            get("SUPABASE_S3_ENDPOINT"),
            get("SUPABASE_BUCKET"),
            get("SUPABASE_S3_ACCESS_KEY_ID"),
            get("SUPABASE_S3_SECRET_ACCESS_KEY"),
        ) {
            (Some(endpoint), Some(bucket), Some(access_key_id), Some(secret_access_key)) => {
                let endpoint = endpoint.trim_end_matches('/').to_string();
                let public_url = get("SUPABASE_PUBLIC_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| derive_public_url(&endpoint));
                Some(BucketConfig {
                    endpoint,
                    bucket,
                    region: get("SUPABASE_S3_REGION")
                        .unwrap_or_else(|| DEFAULT_BUCKET_REGION.to_string()),
                    access_key_id,
                    secret_access_key,
                    public_url,
                })
            }
            _ => None,
        };

        let service_account = get("FIREBASE_SERVICE_ACCOUNT")
            .map(ServiceAccount::Key)
            .or_else(|| get("FIREBASE_SERVICE_ACCOUNT_PATH").map(ServiceAccount::Path));
        let signed = match (get("FIREBASE_STORAGE_BUCKET"), service_account) {
            (Some(bucket), Some(service_account)) => {
                let url_ttl_secs = get("FIREBASE_SIGNED_URL_TTL_SECS")
                    .and_then(|s| s.parse::<u64>().ok())
                    .filter(|&ttl| ttl > 0)
                    .unwrap_or(MAX_SIGNED_URL_TTL_SECS)
                    .min(MAX_SIGNED_URL_TTL_SECS);
                Some(SignedConfig {
                    bucket,
                    service_account,
                    url_ttl_secs,
                })
            }
            _ => None,
        };

        Ok(StorageConfig {
            mode,
            disk,
            bucket,
            signed,
        })
    }

    /// Whether the configuration a backend needs is present. Disk always is.
    pub fn is_configured(&self, backend: StorageBackend) -> bool {
        match backend {
            StorageBackend::Disk => true,
            StorageBackend::RemoteBucket => self.bucket.is_some(),
            StorageBackend::RemoteSigned => self.signed.is_some(),
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.mode {
            StorageMode::Pinned(StorageBackend::RemoteBucket) if self.bucket.is_none() => {
                Err(anyhow::anyhow!(
                    "STORAGE_MODE=remote-bucket requires SUPABASE_S3_ENDPOINT, SUPABASE_BUCKET, \
                     SUPABASE_S3_ACCESS_KEY_ID and SUPABASE_S3_SECRET_ACCESS_KEY"
                ))
            }
            StorageMode::Pinned(StorageBackend::RemoteSigned) if self.signed.is_none() => {
                Err(anyhow::anyhow!(
                    "STORAGE_MODE=remote-signed requires FIREBASE_STORAGE_BUCKET and \
                     FIREBASE_SERVICE_ACCOUNT or FIREBASE_SERVICE_ACCOUNT_PATH"
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Supabase serves the S3 protocol under `/storage/v1/s3` and public objects
/// under `/storage/v1/object/public`.
fn derive_public_url(endpoint: &str) -> String {
    match endpoint.strip_suffix("/s3") {
        Some(prefix) => format!("{}/object/public", prefix),
        None => endpoint.to_string(),
    }
}

/// Unparseable values fall back to the default; zero is raised to one.
fn parse_concurrency_limit(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or(HTTP_CONCURRENCY_LIMIT)
        .max(1)
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server_port: u16 = env::var("PORT")
            .unwrap_or_else(|_| SERVER_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let megabytes = |key: &str, default: usize| {
            env::var(key)
                .unwrap_or_else(|_| default.to_string())
                .parse::<usize>()
                .unwrap_or(default)
                * 1024
                * 1024
        };

        let base = BaseConfig {
            server_port,
            cors_origins,
            environment,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            max_file_size_bytes: megabytes("MAX_FILE_SIZE_MB", MAX_FILE_SIZE_MB),
            max_video_size_bytes: megabytes("MAX_VIDEO_SIZE_MB", MAX_VIDEO_SIZE_MB),
            max_document_size_bytes: megabytes("MAX_DOCUMENT_SIZE_MB", MAX_DOCUMENT_SIZE_MB),
            http_concurrency_limit: parse_concurrency_limit(
                env::var("HTTP_CONCURRENCY_LIMIT").ok().as_deref(),
            ),
        };

        let storage = StorageConfig::from_lookup(|key| env::var(key).ok(), server_port)?;

        let config = Config { base, storage };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(ref url) = self.base.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        if self.base.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        self.storage.validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.base.environment
    }

    pub fn database_url(&self) -> Option<&str> {
        self.base.database_url.as_deref()
    }

    pub fn storage_mode(&self) -> StorageMode {
        self.storage.mode
    }
}

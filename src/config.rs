//! Configuration management
//!
//! TOML file support with environment variable overrides and defaults.
//! Every section may be omitted; missing fields take their default.
//!
//! ```toml
//! [server]
//! listen_addr = "0.0.0.0:5006"
//!
//! [dataset]
//! path = "data/occupancy.csv"
//!
//! [object_store]
//! region = "us-west-2"
//! credentials = { type = "profile", name = "research" }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest validity S3 accepts for a presigned URL (7 days)
pub const MAX_PRESIGN_EXPIRY_SECS: u64 = 604_800;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApplicationConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Visualization dataset settings
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Document store client settings
    #[serde(default)]
    pub docdb: DocDbConfig,

    /// Object store client settings
    #[serde(default)]
    pub object_store: ObjectStoreConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// CORS allowed origins (empty = any)
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

/// Visualization dataset configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetConfig {
    /// CSV file with a `date` column
    #[serde(default = "default_dataset_path")]
    pub path: PathBuf,

    /// Initially selected variable
    #[serde(default = "default_variable")]
    pub default_variable: String,

    /// Initial window slider value
    #[serde(default = "default_window")]
    pub default_window: usize,

    /// Initial sigma slider value
    #[serde(default = "default_sigma")]
    pub default_sigma: f64,

    /// Upper bound of the window slider
    #[serde(default = "default_max_window")]
    pub max_window: usize,

    /// Upper bound of the sigma slider
    #[serde(default = "default_max_sigma")]
    pub max_sigma: f64,

    /// Memoized report capacity
    #[serde(default = "default_stats_cache_entries")]
    pub stats_cache_entries: usize,
}

/// Document store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocDbConfig {
    /// URL scheme (https, or http for local testing)
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// API host, optionally with port
    #[serde(default = "default_docdb_host")]
    pub host: String,

    /// API version path segment
    #[serde(default = "default_docdb_version")]
    pub version: String,

    /// Database name
    #[serde(default = "default_docdb_database")]
    pub database: String,

    /// Collection name
    #[serde(default = "default_docdb_collection")]
    pub collection: String,

    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Project names offered by the multi-select
    #[serde(default = "default_project_options")]
    pub project_options: Vec<String>,
}

/// Object store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObjectStoreConfig {
    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom endpoint (MinIO, LocalStack, ...)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Use path-style addressing (needed by most custom endpoints)
    #[serde(default)]
    pub force_path_style: bool,

    /// Credential source
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Presigned URL validity in seconds
    #[serde(default = "default_presign_expiry_secs")]
    pub presign_expiry_secs: u64,

    /// Bucket pre-filled in the selector
    #[serde(default = "default_bucket")]
    pub default_bucket: String,
}

/// Where object store credentials come from
#[derive(Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialsConfig {
    /// Standard provider chain (env, profile, instance metadata)
    #[default]
    Default,
    /// Named profile from the shared config files
    Profile {
        /// Profile name
        name: String,
    },
    /// Explicit static keys
    Static {
        /// Access key id
        access_key_id: String,
        /// Secret access key
        secret_access_key: String,
        /// Optional session token
        #[serde(default)]
        session_token: Option<String>,
    },
    /// Unsigned requests (public buckets; presigning will fail)
    Anonymous,
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialsConfig::Default => write!(f, "Default"),
            CredentialsConfig::Profile { name } => {
                f.debug_struct("Profile").field("name", name).finish()
            },
            CredentialsConfig::Static { access_key_id, .. } => f
                .debug_struct("Static")
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"***")
                .finish_non_exhaustive(),
            CredentialsConfig::Anonymous => write!(f, "Anonymous"),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0:5006".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/occupancy.csv")
}
fn default_variable() -> String {
    "Temperature".to_string()
}
fn default_window() -> usize {
    30
}
fn default_sigma() -> f64 {
    10.0
}
fn default_max_window() -> usize {
    60
}
fn default_max_sigma() -> f64 {
    20.0
}
fn default_stats_cache_entries() -> usize {
    256
}
fn default_scheme() -> String {
    "https".to_string()
}
fn default_docdb_host() -> String {
    "api.allenneuraldynamics.org".to_string()
}
fn default_docdb_version() -> String {
    "v2".to_string()
}
fn default_docdb_database() -> String {
    "metadata_index".to_string()
}
fn default_docdb_collection() -> String {
    "data_assets".to_string()
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_max_retries() -> u32 {
    2
}
fn default_project_options() -> Vec<String> {
    vec![
        "Learning mFISH task".to_string(),
        "Ephys Platform".to_string(),
        "Behavior Platform".to_string(),
    ]
}
fn default_region() -> String {
    "us-west-2".to_string()
}
fn default_presign_expiry_secs() -> u64 {
    3600
}
fn default_bucket() -> String {
    "aind-open-data".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            log_level: default_log_level(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
            default_variable: default_variable(),
            default_window: default_window(),
            default_sigma: default_sigma(),
            max_window: default_max_window(),
            max_sigma: default_max_sigma(),
            stats_cache_entries: default_stats_cache_entries(),
        }
    }
}

impl Default for DocDbConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            host: default_docdb_host(),
            version: default_docdb_version(),
            database: default_docdb_database(),
            collection: default_docdb_collection(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_retries: default_max_retries(),
            project_options: default_project_options(),
        }
    }
}

impl DocDbConfig {
    /// Collection endpoint, e.g. `https://host/v2/metadata_index/data_assets`
    pub fn collection_url(&self) -> String {
        format!(
            "{}://{}/{}/{}/{}",
            self.scheme,
            self.host.trim_end_matches('/'),
            self.version,
            self.database,
            self.collection
        )
    }

    /// Whole-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Connect timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint: None,
            force_path_style: false,
            credentials: CredentialsConfig::default(),
            request_timeout_secs: default_request_timeout_secs(),
            presign_expiry_secs: default_presign_expiry_secs(),
            default_bucket: default_bucket(),
        }
    }
}

impl ObjectStoreConfig {
    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Presigned URL validity
    pub fn presign_expiry(&self) -> Duration {
        Duration::from_secs(self.presign_expiry_secs)
    }
}

impl ApplicationConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_toml(&contents).map_err(|e| match e {
            Error::Configuration(msg) => {
                Error::Configuration(format!("{}: {}", path.display(), msg))
            },
            other => other,
        })
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {}", e)))
    }

    /// Load a file, apply environment overrides and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("EXPLORER_LISTEN_ADDR") {
            self.server.listen_addr = addr;
        }
        if let Ok(path) = std::env::var("EXPLORER_DATASET") {
            self.dataset.path = PathBuf::from(path);
        }
        if let Ok(host) = std::env::var("EXPLORER_DOCDB_HOST") {
            self.docdb.host = host;
        }
        if let Ok(region) = std::env::var("EXPLORER_S3_REGION") {
            self.object_store.region = region;
        }
        if let Ok(endpoint) = std::env::var("EXPLORER_S3_ENDPOINT") {
            self.object_store.endpoint = if endpoint.is_empty() {
                None
            } else {
                Some(endpoint)
            };
        }
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            self.server.log_level = log_level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(Error::Configuration(msg.to_string()));

        if self.server.listen_addr.is_empty() {
            return fail("Listen address cannot be empty");
        }

        let ds = &self.dataset;
        if ds.max_window == 0 {
            return fail("max_window must be > 0");
        }
        if ds.default_window == 0 || ds.default_window > ds.max_window {
            return fail("default_window must be between 1 and max_window");
        }
        if ds.max_sigma.is_nan() || ds.max_sigma < 0.0 {
            return fail("max_sigma must be >= 0");
        }
        if ds.default_sigma.is_nan() || ds.default_sigma < 0.0 || ds.default_sigma > ds.max_sigma
        {
            return fail("default_sigma must be between 0 and max_sigma");
        }

        let doc = &self.docdb;
        if doc.host.is_empty() {
            return fail("DocDB host cannot be empty");
        }
        if doc.scheme != "https" && doc.scheme != "http" {
            return fail("DocDB scheme must be http or https");
        }
        if doc.request_timeout_secs == 0 || doc.connect_timeout_secs == 0 {
            return fail("DocDB timeouts must be > 0");
        }

        let os = &self.object_store;
        if os.region.is_empty() {
            return fail("Object store region cannot be empty");
        }
        if os.request_timeout_secs == 0 {
            return fail("Object store timeout must be > 0");
        }
        if os.presign_expiry_secs == 0 || os.presign_expiry_secs > MAX_PRESIGN_EXPIRY_SECS {
            return fail("presign_expiry_secs must be between 1 and 604800");
        }
        if let Some(endpoint) = &os.endpoint {
            if url::Url::parse(endpoint).is_err() {
                return fail("Object store endpoint is not a valid URL");
            }
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

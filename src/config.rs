//! # Configuration
//!
//! Layered configuration for the token count client. Sources are applied in
//! order, later sources overriding earlier ones:
//!
//! 1. built-in defaults (the HTRC sandbox endpoints)
//! 2. an optional TOML file passed with `--config`
//! 3. environment variables prefixed with `HTRC_`, nested keys separated by
//!    `__` (for example `HTRC_DATA_API__ENDPOINT`)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_SOLR_PROXY_URL: &str = "http://sandbox.htrc.illinois.edu:9994/solr/meta/select?q=";
pub const DEFAULT_OAUTH2_ENDPOINT: &str =
    "https://sandbox.htrc.illinois.edu:9443/oauth2endpoints/token?grant_type=client_credentials";
pub const DEFAULT_DATA_API_ENDPOINT: &str = "https://sandbox.htrc.illinois.edu:25443/data-api";
pub const DEFAULT_TOKENCOUNT_PATH: &str = "/tokencount";

/// Size of the intermediate buffer used when writing the archive
pub const DEFAULT_BUFFER_SIZE: usize = 65535;

const ENV_PREFIX: &str = "HTRC";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpSettings,
    pub solr: SolrConfig,
    pub oauth2: OAuth2Config,
    pub data_api: DataApiConfig,
    pub output: OutputConfig,
}

/// Settings shared by every HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// User agent string
    pub user_agent: String,
    /// Request timeout; unset means the transport default
    pub timeout_secs: Option<u64>,
    /// Refuse to talk to the OAuth2 and Data API endpoints without TLS
    pub require_tls: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: format!("htrc-tokencount/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: None,
            require_tls: true,
        }
    }
}

impl HttpSettings {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Solr proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolrConfig {
    /// Select URL ending with the query parameter name, e.g. `.../select?q=`
    pub base_url: String,
}

impl Default for SolrConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SOLR_PROXY_URL.to_string(),
        }
    }
}

/// OAuth2 token endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuth2Config {
    /// Token endpoint, already carrying `grant_type=client_credentials`
    pub endpoint: String,
    /// Also append the client id and secret to the token URL query string
    pub credentials_in_query: bool,
}

impl Default for OAuth2Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OAUTH2_ENDPOINT.to_string(),
            credentials_in_query: false,
        }
    }
}

/// Data API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataApiConfig {
    /// Data API base endpoint
    pub endpoint: String,
    /// Request path appended to the endpoint
    pub path: String,
    /// Additional form parameters sent after `volumeIDs`, in order
    pub params: Vec<FormParam>,
}

/// One extra Data API form field. Kept as a list entry so the name reaches
/// the wire exactly as written; table keys are lowercased by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormParam {
    pub name: String,
    pub value: String,
}

impl FormParam {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Default for DataApiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_DATA_API_ENDPOINT.to_string(),
            path: DEFAULT_TOKENCOUNT_PATH.to_string(),
            params: Vec::new(),
        }
    }
}

/// Archive output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write buffer size in bytes
    pub buffer_size: usize,
    /// Delete the destination file when writing it fails part way
    pub remove_partial_on_failure: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            remove_partial_on_failure: true,
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional TOML file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            debug!("Loading configuration file {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validate_url("solr.base_url", &self.solr.base_url)?;
        validate_url("oauth2.endpoint", &self.oauth2.endpoint)?;
        validate_url("data_api.endpoint", &self.data_api.endpoint)?;

        if !self.data_api.path.is_empty() && !self.data_api.path.starts_with('/') {
            return Err(Error::InvalidInput {
                field: "data_api.path".to_string(),
                reason: "path must start with '/'".to_string(),
            });
        }

        if self.output.buffer_size == 0 {
            return Err(Error::InvalidInput {
                field: "output.buffer_size".to_string(),
                reason: "buffer size must be greater than 0".to_string(),
            });
        }

        if self.http.timeout_secs == Some(0) {
            return Err(Error::InvalidInput {
                field: "http.timeout_secs".to_string(),
                reason: "timeout must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).map_err(|e| Error::InvalidInput {
        field: field.to_string(),
        reason: format!("invalid URL {value:?}: {e}"),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::InvalidInput {
            field: field.to_string(),
            reason: format!("unsupported URL scheme {other:?}"),
        }),
    }
}

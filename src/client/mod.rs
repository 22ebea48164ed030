pub mod data_api;
pub mod oauth2;
pub mod solr;

pub use data_api::DataApiClient;
pub use oauth2::{AccessToken, Credentials, OAuth2Client};
pub use solr::{SearchResult, SolrProxyClient};

use crate::config::HttpSettings;
use crate::{Error, Result};
use reqwest::Client;
use tracing::warn;
use url::{form_urlencoded, Url};

pub(crate) const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Ordered, read-only list of volume identifiers returned by the search proxy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeIds(Vec<String>);

impl VolumeIds {
    #[must_use]
    pub fn new(ids: Vec<String>) -> Self {
        Self(ids)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for VolumeIds {
    fn from(ids: Vec<String>) -> Self {
        Self(ids)
    }
}

/// Form-encode a single value the way HTML forms do (space becomes `+`)
#[must_use]
pub fn form_encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Build an HTTP client for one pipeline step
pub(crate) fn build_http_client(settings: &HttpSettings, https_only: bool) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(&settings.user_agent)
        .https_only(https_only);

    if let Some(timeout) = settings.timeout() {
        builder = builder.timeout(timeout);
    }

    Ok(builder.build()?)
}

/// Reject an endpoint that does not use TLS when TLS is required
pub(crate) fn ensure_tls(endpoint: &str, require_tls: bool) -> Result<()> {
    if !require_tls {
        return Ok(());
    }

    let url = Url::parse(endpoint).map_err(|e| Error::InvalidInput {
        field: "endpoint".to_string(),
        reason: format!("invalid URL {endpoint:?}: {e}"),
    })?;

    if url.scheme() == "https" {
        Ok(())
    } else {
        Err(Error::InsecureEndpoint {
            url: endpoint.to_string(),
        })
    }
}

/// Read the body of a failed response; a read failure only yields an empty body
pub(crate) async fn read_error_body(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!("Unable to read response body: {}", e);
            String::new()
        }
    }
}

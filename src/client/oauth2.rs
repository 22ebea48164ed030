use super::{build_http_client, ensure_tls, form_encode, read_error_body, FORM_CONTENT_TYPE};
use crate::config::{HttpSettings, OAuth2Config};
use crate::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, error, info};

const ACCESS_TOKEN_FIELD: &str = "access_token";

/// OAuth2 client credentials
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Bearer token returned by the token endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    #[must_use]
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(<{} chars>)", self.0.len())
    }
}

/// Client for the OAuth2 client-credentials token endpoint
pub struct OAuth2Client {
    client: Client,
    endpoint: String,
    credentials_in_query: bool,
}

impl OAuth2Client {
    pub fn new(config: &OAuth2Config, http: &HttpSettings) -> Result<Self> {
        ensure_tls(&config.endpoint, http.require_tls)?;

        Ok(Self {
            client: build_http_client(http, http.require_tls)?,
            endpoint: config.endpoint.clone(),
            credentials_in_query: config.credentials_in_query,
        })
    }

    /// Token URL; optionally carries the credentials in the query string as well
    #[must_use]
    pub fn token_url(&self, credentials: &Credentials) -> String {
        if !self.credentials_in_query {
            return self.endpoint.clone();
        }

        format!(
            "{}&client_secret={}&client_id={}",
            self.endpoint,
            form_encode(&credentials.client_secret),
            form_encode(&credentials.client_id)
        )
    }

    /// Form body of the client-credentials grant
    #[must_use]
    pub fn token_request_body(credentials: &Credentials) -> String {
        format!(
            "grant_type=client_credentials&client_id={}&client_secret={}",
            form_encode(&credentials.client_id),
            form_encode(&credentials.client_secret)
        )
    }

    /// Exchange the client credentials for a bearer token
    pub async fn fetch_token(&self, credentials: &Credentials) -> Result<AccessToken> {
        debug!("Requesting OAuth2 token for client {}", credentials.client_id);

        let response = self
            .client
            .post(self.token_url(credentials))
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(Self::token_request_body(credentials))
            .send()
            .await
            .map_err(|e| {
                error!("OAuth2 token request failed: {}", e);
                Error::Network(e)
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = read_error_body(response).await;
            error!("Unable to get token. Response code: {}", status.as_u16());
            return Err(Error::Http {
                service: "oauth2",
                status: status.as_u16(),
                body,
            });
        }

        let json = response.text().await?;
        let token = parse_token_response(&json)?;
        info!("Obtained OAuth2 token ({} chars)", token.as_str().len());
        Ok(token)
    }
}

/// Decode the token response as a JSON object and project `access_token`
pub fn parse_token_response(json: &str) -> Result<AccessToken> {
    let fields: Map<String, Value> = serde_json::from_str(json)
        .map_err(|e| Error::parse("oauth2 response", e))?;

    debug!(
        "OAuth2 response fields: {:?}",
        fields.keys().collect::<Vec<_>>()
    );

    match fields.get(ACCESS_TOKEN_FIELD) {
        Some(Value::String(token)) => Ok(AccessToken::new(token.as_str())),
        Some(other) => Err(Error::parse(
            "oauth2 response",
            format!("access_token is not a string: {other}"),
        )),
        None => Err(Error::parse("oauth2 response", "missing access_token")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials::new("my client", "s3cr&t=")
    }

    #[test]
    fn test_parse_token_response() {
        let token =
            parse_token_response(r#"{"access_token":"abc123","token_type":"bearer"}"#).unwrap();
        assert_eq!(token.as_str(), "abc123");
        assert_eq!(token.bearer_header(), "Bearer abc123");
    }

    #[test]
    fn test_parse_token_response_with_scalars_and_nesting() {
        let json = r#"{"token_type":"bearer","expires_in":3600,"scope":["read"],"access_token":"a,b:c"}"#;
        assert_eq!(parse_token_response(json).unwrap().as_str(), "a,b:c");
    }

    #[test]
    fn test_parse_token_response_errors() {
        assert!(matches!(
            parse_token_response("not json"),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(
            parse_token_response(r#"{"token_type":"bearer"}"#),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(
            parse_token_response(r#"{"access_token":42}"#),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(
            parse_token_response(r#"["access_token"]"#),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_token_request_body_is_form_encoded() {
        assert_eq!(
            OAuth2Client::token_request_body(&credentials()),
            "grant_type=client_credentials&client_id=my+client&client_secret=s3cr%26t%3D"
        );
    }

    #[test]
    fn test_token_url() {
        let http = HttpSettings::default();
        let mut config = OAuth2Config::default();

        let client = OAuth2Client::new(&config, &http).unwrap();
        assert_eq!(client.token_url(&credentials()), config.endpoint);

        config.credentials_in_query = true;
        let client = OAuth2Client::new(&config, &http).unwrap();
        assert_eq!(
            client.token_url(&credentials()),
            format!(
                "{}&client_secret=s3cr%26t%3D&client_id=my+client",
                config.endpoint
            )
        );
    }

    #[test]
    fn test_plain_http_endpoint_is_refused() {
        let config = OAuth2Config {
            endpoint: "http://example.org/token?grant_type=client_credentials".to_string(),
            credentials_in_query: false,
        };
        let result = OAuth2Client::new(&config, &HttpSettings::default());
        assert!(matches!(result, Err(Error::InsecureEndpoint { .. })));
    }

    #[test]
    fn test_secrets_are_not_debug_printed() {
        let printed = format!("{:?} {:?}", credentials(), AccessToken::new("abc123"));
        assert!(!printed.contains("s3cr&t="));
        assert!(!printed.contains("abc123"));
        assert!(printed.contains("my client"));
    }
}

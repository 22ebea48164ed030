use super::{
    build_http_client, ensure_tls, form_encode, read_error_body, AccessToken, VolumeIds,
    FORM_CONTENT_TYPE,
};
use crate::config::{DataApiConfig, FormParam, HttpSettings};
use crate::{Error, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, error, info};

const VOLUME_SEPARATOR: &str = "|";

/// Join volume ids with `|`, encoding every id and every separator on its own
#[must_use]
pub fn encode_volume_ids(ids: &VolumeIds) -> String {
    let separator = form_encode(VOLUME_SEPARATOR);
    ids.iter()
        .map(form_encode)
        .collect::<Vec<_>>()
        .join(&separator)
}

/// Client for the HTRC Data API
pub struct DataApiClient {
    client: Client,
    endpoint: String,
    params: Vec<FormParam>,
}

impl DataApiClient {
    pub fn new(config: &DataApiConfig, http: &HttpSettings) -> Result<Self> {
        ensure_tls(&config.endpoint, http.require_tls)?;

        Ok(Self {
            client: build_http_client(http, http.require_tls)?,
            endpoint: config.endpoint.clone(),
            params: config.params.clone(),
        })
    }

    /// Form body carrying the volume ids followed by the extra parameters
    #[must_use]
    pub fn request_body(&self, ids: &VolumeIds) -> String {
        let mut body = format!("volumeIDs={}", encode_volume_ids(ids));
        for param in &self.params {
            body.push('&');
            body.push_str(&form_encode(&param.name));
            body.push('=');
            body.push_str(&form_encode(&param.value));
        }
        body
    }

    /// POST the volume ids to `endpoint + path`; on 200 the returned response
    /// body is the archive stream.
    pub async fn fetch(&self, path: &str, ids: &VolumeIds, token: &AccessToken) -> Result<Response> {
        if ids.is_empty() {
            return Err(Error::InvalidInput {
                field: "volume_ids".to_string(),
                reason: "at least one volume id is required".to_string(),
            });
        }

        let url = format!("{}{}", self.endpoint, path);
        info!("Sending request to Data API {} for {} volumes", url, ids.len());

        let body = self.request_body(ids);
        debug!("Data API request body: {} bytes", body.len());

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, token.bearer_header())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!("Data API request failed: {}", e);
                Error::Network(e)
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = read_error_body(response).await;
            error!("Unable to get volumes. Response code: {}", status.as_u16());
            return Err(Error::Http {
                service: "data api",
                status: status.as_u16(),
                body,
            });
        }

        debug!("Data API content length: {:?}", response.content_length());
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> VolumeIds {
        VolumeIds::from(values.iter().map(|s| (*s).to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn test_encode_volume_ids() {
        assert_eq!(encode_volume_ids(&ids(&["id1", "id2", "id3"])), "id1%7Cid2%7Cid3");
        assert_eq!(encode_volume_ids(&ids(&["single"])), "single");
        assert_eq!(
            encode_volume_ids(&ids(&["uc2.ark:/13960/t2", "a|b"])),
            "uc2.ark%3A%2F13960%2Ft2%7Ca%7Cb"
        );
    }

    #[test]
    fn test_request_body() {
        let client = DataApiClient::new(&DataApiConfig::default(), &HttpSettings::default()).unwrap();
        assert_eq!(
            client.request_body(&ids(&["id1", "id2", "id3"])),
            "volumeIDs=id1%7Cid2%7Cid3"
        );
    }

    #[test]
    fn test_request_body_with_extra_params() {
        let mut config = DataApiConfig::default();
        config.params.push(FormParam::new("version", "2.0"));
        config.params.push(FormParam::new("pageLevel", "a b"));

        let client = DataApiClient::new(&config, &HttpSettings::default()).unwrap();
        assert_eq!(
            client.request_body(&ids(&["id1"])),
            "volumeIDs=id1&version=2.0&pageLevel=a+b"
        );
    }

    #[tokio::test]
    async fn test_empty_volume_list_is_rejected_before_sending() {
        let client = DataApiClient::new(&DataApiConfig::default(), &HttpSettings::default()).unwrap();
        let result = client
            .fetch("/tokencount", &VolumeIds::default(), &AccessToken::new("t"))
            .await;
        assert!(matches!(
            result,
            Err(Error::InvalidInput { ref field, .. }) if field == "volume_ids"
        ));
    }

    #[test]
    fn test_plain_http_endpoint_is_refused() {
        let config = DataApiConfig {
            endpoint: "http://example.org/data-api".to_string(),
            ..DataApiConfig::default()
        };
        let result = DataApiClient::new(&config, &HttpSettings::default());
        assert!(matches!(result, Err(Error::InsecureEndpoint { .. })));
    }
}

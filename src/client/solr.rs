use super::{build_http_client, form_encode, read_error_body, VolumeIds};
use crate::config::{HttpSettings, SolrConfig};
use crate::{Error, Result};
use reqwest::{Client, StatusCode};
use tracing::{debug, error, info};

const RESULT_ELEMENT: &str = "result";
const NUM_FOUND_ATTRIBUTE: &str = "numFound";
const ID_ELEMENT: &str = "str";
const ID_NAME: &str = "id";

/// Volume identifiers extracted from a Solr select response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    /// Count reported by the `result` element; informational only
    pub num_found: Option<u64>,
    /// Identifiers in document order
    pub ids: VolumeIds,
}

/// Client for the HTRC Solr proxy
pub struct SolrProxyClient {
    client: Client,
    base_url: String,
}

impl SolrProxyClient {
    pub fn new(config: &SolrConfig, http: &HttpSettings) -> Result<Self> {
        Ok(Self {
            client: build_http_client(http, false)?,
            base_url: config.base_url.clone(),
        })
    }

    /// Append the form-encoded query to the proxy select URL
    #[must_use]
    pub fn build_query_url(&self, query: &str) -> String {
        format!("{}{}", self.base_url, form_encode(query))
    }

    /// Send the query to the proxy and collect the volume ids it returns
    pub async fn fetch_volume_ids(&self, query: &str) -> Result<SearchResult> {
        let url = self.build_query_url(query);
        info!("Sending request to Solr Proxy {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            error!("Solr proxy request failed: {}", e);
            Error::Network(e)
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = read_error_body(response).await;
            error!("Solr proxy response code: {}", status.as_u16());
            return Err(Error::Http {
                service: "solr proxy",
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        debug!("Solr proxy response: {} bytes", text.len());

        let result = parse_search_response(&text)?;
        info!(
            "Solr proxy returned {} volume ids (numFound: {:?})",
            result.ids.len(),
            result.num_found
        );
        Ok(result)
    }
}

/// Walk the response elements in document order, collecting the text of every
/// `<str name="id">` inside the `<result>` element.
pub fn parse_search_response(xml: &str) -> Result<SearchResult> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| Error::parse("solr response", e))?;

    let mut num_found = None;
    let mut ids = Vec::new();

    for node in doc.descendants().filter(|n| n.is_element()) {
        let name = node.tag_name().name();

        if name == RESULT_ELEMENT {
            if let Some(value) = node.attribute(NUM_FOUND_ATTRIBUTE) {
                let count = value.trim().parse::<u64>().map_err(|e| {
                    Error::parse("solr response", format!("invalid numFound {value:?}: {e}"))
                })?;
                num_found = Some(count);
            }
        } else if name == ID_ELEMENT
            && node.attribute("name") == Some(ID_NAME)
            && inside_result(node)
        {
            ids.push(node.text().unwrap_or_default().to_string());
        }
    }

    debug!("Parsed {} volume ids from Solr response", ids.len());
    Ok(SearchResult {
        num_found,
        ids: VolumeIds::new(ids),
    })
}

fn inside_result(node: roxmltree::Node<'_, '_>) -> bool {
    node.ancestors()
        .skip(1)
        .any(|n| n.is_element() && n.tag_name().name() == RESULT_ELEMENT)
}

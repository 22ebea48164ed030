use super::archive::{ArchiveSummary, ArchiveWriter};
use crate::client::{Credentials, DataApiClient, OAuth2Client, SolrProxyClient};
use crate::{Config, Error, Result};
use std::path::PathBuf;
use tracing::{info, instrument};

/// Inputs of one token count run
#[derive(Debug, Clone)]
pub struct TokenCountRequest {
    pub credentials: Credentials,
    /// Solr query string
    pub query: String,
    /// Destination of the zip archive
    pub output: PathBuf,
}

/// Query -> volume ids -> token -> Data API -> zip file, one step after the other.
pub struct TokenCountWorkflow {
    solr: SolrProxyClient,
    oauth2: OAuth2Client,
    data_api: DataApiClient,
    writer: ArchiveWriter,
    data_api_path: String,
}

impl TokenCountWorkflow {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            solr: SolrProxyClient::new(&config.solr, &config.http)?,
            oauth2: OAuth2Client::new(&config.oauth2, &config.http)?,
            data_api: DataApiClient::new(&config.data_api, &config.http)?,
            writer: ArchiveWriter::new(&config.output),
            data_api_path: config.data_api.path.clone(),
        })
    }

    #[instrument(skip_all, fields(query = %request.query, output = %request.output.display()))]
    pub async fn run(&self, request: &TokenCountRequest) -> Result<ArchiveSummary> {
        let search = self.solr.fetch_volume_ids(&request.query).await?;
        info!("Got volume id list: {:?}", search.ids.as_slice());

        if search.ids.is_empty() {
            return Err(Error::NoVolumes {
                query: request.query.clone(),
            });
        }

        let token = self.oauth2.fetch_token(&request.credentials).await?;

        let response = self
            .data_api
            .fetch(&self.data_api_path, &search.ids, &token)
            .await?;

        self.writer.write_response(response, &request.output).await
    }
}

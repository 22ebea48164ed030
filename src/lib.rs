pub mod client;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod tools;

pub use client::{
    AccessToken, Credentials, DataApiClient, OAuth2Client, SearchResult, SolrProxyClient,
    VolumeIds,
};
pub use config::Config;
pub use error::{Error, ErrorCategory, Result};
pub use tools::{ArchiveSummary, ArchiveWriter, TokenCountRequest, TokenCountWorkflow};

use crate::config::OutputConfig;
use crate::{Error, Result};
use futures::{Stream, StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

/// Result of persisting an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Destination file
    pub path: PathBuf,
    /// Number of bytes written
    pub bytes_written: u64,
}

/// Copies an archive stream verbatim into a file
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    buffer_size: usize,
    remove_partial_on_failure: bool,
}

impl ArchiveWriter {
    #[must_use]
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            buffer_size: config.buffer_size.max(1),
            remove_partial_on_failure: config.remove_partial_on_failure,
        }
    }

    /// Write a successful Data API response body to `path`
    pub async fn write_response(
        &self,
        response: reqwest::Response,
        path: &Path,
    ) -> Result<ArchiveSummary> {
        self.write_stream(response.bytes_stream().map_err(Error::Network), path)
            .await
    }

    /// Write every chunk of `stream` to `path`, replacing any existing file
    pub async fn write_stream<S, B>(&self, stream: S, path: &Path) -> Result<ArchiveSummary>
    where
        S: Stream<Item = Result<B>>,
        B: AsRef<[u8]>,
    {
        info!("Writing response to zip file {}", path.display());

        let file = File::create(path).await?;
        let mut writer = BufWriter::with_capacity(self.buffer_size, file);

        match Self::copy(stream, &mut writer).await {
            Ok(bytes_written) => {
                info!("Wrote {} bytes to {}", bytes_written, path.display());
                Ok(ArchiveSummary {
                    path: path.to_path_buf(),
                    bytes_written,
                })
            }
            Err(e) => {
                drop(writer);
                if self.remove_partial_on_failure {
                    warn!("Removing partially written file {}", path.display());
                    if let Err(remove_err) = tokio::fs::remove_file(path).await {
                        warn!("Unable to remove {}: {}", path.display(), remove_err);
                    }
                }
                Err(e)
            }
        }
    }

    async fn copy<S, B>(stream: S, writer: &mut BufWriter<File>) -> Result<u64>
    where
        S: Stream<Item = Result<B>>,
        B: AsRef<[u8]>,
    {
        let mut stream = std::pin::pin!(stream);
        let mut total = 0u64;
        let mut chunks = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let bytes = chunk.as_ref();
            writer.write_all(bytes).await?;
            total += bytes.len() as u64;
            chunks += 1;
        }

        writer.flush().await?;
        writer.get_mut().sync_all().await?;
        debug!("Copied {} chunks ({} bytes)", chunks, total);
        Ok(total)
    }
}

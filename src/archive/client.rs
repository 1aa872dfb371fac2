// src/archive/client.rs
//! Archive transport: HTTP download or local file, both bounded by the configured ceilings

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tokio::io::AsyncReadExt;

use super::codec::{decode_archive, is_gzip};
use super::types::EventArchive;
use crate::config::ArchiveConfig;
use crate::error::ArchiveError;

/// Something that can produce a decoded archive
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    async fn load(&self) -> Result<EventArchive, ArchiveError>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Pick the right source for the configured location
pub fn source_from_config(config: &ArchiveConfig) -> Result<Box<dyn ArchiveSource>, ArchiveError> {
    if !config.is_valid() {
        return Err(ArchiveError::NotConfigured);
    }
    if config.is_remote() {
        Ok(Box::new(HttpArchiveSource::new(config)?))
    } else {
        Ok(Box::new(FileArchiveSource::new(config)))
    }
}

pub struct HttpArchiveSource {
    url: String,
    http_client: HttpClient,
    max_compressed_bytes: usize,
    max_decompressed_bytes: usize,
}

impl HttpArchiveSource {
    pub fn new(config: &ArchiveConfig) -> Result<Self, ArchiveError> {
        let http_client = HttpClient::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            url: config.archive_url.clone(),
            http_client,
            max_compressed_bytes: config.max_compressed_bytes,
            max_decompressed_bytes: config.max_decompressed_bytes,
        })
    }

    /// Download the raw payload, aborting as soon as it passes the compressed ceiling
    async fn fetch_bytes(&self) -> Result<Vec<u8>, ArchiveError> {
        log::info!("Fetching staking archive from {}", self.url);

        let mut response = self
            .http_client
            .get(&self.url)
            .header("Accept", "application/gzip, application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArchiveError::Status(status.as_u16()));
        }

        let limit = self.max_compressed_bytes;
        if let Some(declared) = response.content_length() {
            if declared as usize > limit {
                return Err(ArchiveError::CompressedTooLarge { limit });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit {
                return Err(ArchiveError::CompressedTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        log::info!("Downloaded {} bytes", body.len());
        Ok(body)
    }
}

#[async_trait]
impl ArchiveSource for HttpArchiveSource {
    async fn load(&self) -> Result<EventArchive, ArchiveError> {
        let body = self.fetch_bytes().await?;
        decode_archive(&body, self.max_compressed_bytes, self.max_decompressed_bytes)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

pub struct FileArchiveSource {
    path: String,
    max_compressed_bytes: usize,
    max_decompressed_bytes: usize,
}

impl FileArchiveSource {
    pub fn new(config: &ArchiveConfig) -> Self {
        Self {
            path: config.archive_url.clone(),
            max_compressed_bytes: config.max_compressed_bytes,
            max_decompressed_bytes: config.max_decompressed_bytes,
        }
    }
}

#[async_trait]
impl ArchiveSource for FileArchiveSource {
    async fn load(&self) -> Result<EventArchive, ArchiveError> {
        let io_error = |e: std::io::Error| ArchiveError::Io(format!("{}: {}", self.path, e));

        let mut file = tokio::fs::File::open(&self.path).await.map_err(io_error)?;
        let size = file.metadata().await.map_err(io_error)?.len() as usize;
        let mut header = [0u8; 2];
        let read = file.read(&mut header).await.map_err(io_error)?;

        // Gzip files are held to the compressed ceiling, plain JSON to the decompressed one
        if is_gzip(&header[..read]) {
            if size > self.max_compressed_bytes {
                return Err(ArchiveError::CompressedTooLarge {
                    limit: self.max_compressed_bytes,
                });
            }
        } else if size > self.max_decompressed_bytes {
            return Err(ArchiveError::DecompressedTooLarge {
                limit: self.max_decompressed_bytes,
            });
        }

        let bytes = tokio::fs::read(&self.path).await.map_err(io_error)?;
        decode_archive(&bytes, self.max_compressed_bytes, self.max_decompressed_bytes)
    }

    fn describe(&self) -> String {
        self.path.clone()
    }
}

//! S3-compatible bucket access over libcurl.
//!
//! Path-style addressing (`{endpoint}/{bucket}/{key}`) with anonymous
//! requests; listing uses ListObjectsV2.

mod list;
mod transfer;

use url::Url;

use crate::bucket::{ListPage, ObjectStore, StorageError};
use crate::config::AuditConfig;

pub use list::{parse_last_modified, parse_list_page};
pub use transfer::{S3Body, TransferOptions};

/// Client for one bucket on one endpoint.
#[derive(Debug, Clone)]
pub struct S3Client {
    endpoint: Url,
    bucket: String,
    prefix: Option<String>,
    transfer: TransferOptions,
}

impl S3Client {
    pub fn new(
        endpoint: &str,
        bucket: &str,
        prefix: Option<String>,
        transfer: TransferOptions,
    ) -> Result<Self, StorageError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| StorageError::InvalidUrl(format!("{}: {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(StorageError::InvalidUrl(endpoint.to_string()));
        }
        Ok(Self {
            endpoint,
            bucket: bucket.to_string(),
            prefix: prefix.filter(|p| !p.is_empty()),
            transfer,
        })
    }

    pub fn from_config(cfg: &AuditConfig) -> Result<Self, StorageError> {
        let transfer = TransferOptions {
            verify_tls: cfg.verify_tls,
            ..TransferOptions::default()
        };
        Self::new(&cfg.endpoint, &cfg.bucket, cfg.prefix.clone(), transfer)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn bucket_url(&self) -> Result<Url, StorageError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::InvalidUrl(self.endpoint.to_string()))?
            .pop_if_empty()
            .push(&self.bucket);
        Ok(url)
    }

    /// ListObjectsV2 URL for one page.
    pub fn list_url(&self, continuation: Option<&str>) -> Result<Url, StorageError> {
        let mut url = self.bucket_url()?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("list-type", "2");
            if let Some(prefix) = &self.prefix {
                q.append_pair("prefix", prefix);
            }
            if let Some(token) = continuation {
                q.append_pair("continuation-token", token);
            }
        }
        Ok(url)
    }

    /// GET URL for one object. Key segments are percent-encoded individually.
    pub fn object_url(&self, key: &str) -> Result<Url, StorageError> {
        let mut url = self.bucket_url()?;
        url.path_segments_mut()
            .map_err(|_| StorageError::InvalidUrl(self.endpoint.to_string()))?
            .extend(key.split('/'));
        Ok(url)
    }
}

impl ObjectStore for S3Client {
    type Body = S3Body;

    async fn list_page(&self, continuation: Option<String>) -> Result<ListPage, StorageError> {
        let url = self.list_url(continuation.as_deref())?;
        let opts = self.transfer;
        let body = tokio::task::spawn_blocking(move || {
            transfer::fetch_blocking(url.as_str(), opts)
        })
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;
        let xml = String::from_utf8(body)
            .map_err(|e| StorageError::Listing(format!("response is not UTF-8: {}", e)))?;
        parse_list_page(&xml)
    }

    async fn open(&self, key: &str) -> Result<S3Body, StorageError> {
        let url = self.object_url(key)?;
        transfer::open_stream(url.to_string(), self.transfer).await
    }
}

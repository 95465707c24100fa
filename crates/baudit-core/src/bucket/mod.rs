//! Object-storage capability: paginated listing and streamed object bodies.
//!
//! The engine only depends on the `ObjectStore` trait; `S3Client` is the
//! libcurl-backed implementation used by the CLI.

mod error;
mod inventory;
pub mod s3;

use std::future::Future;
use tokio::io::AsyncRead;

pub use error::StorageError;
pub use inventory::list_all;
pub use s3::S3Client;

/// One object as reported by a listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryEntry {
    pub key: String,
    pub size: u64,
    /// Last mutation time, Unix seconds (fractional part kept).
    pub last_modified: f64,
}

/// One page of a bucket listing.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub entries: Vec<InventoryEntry>,
    /// Token for the next page; `None` on the last page.
    pub next: Option<String>,
}

/// Read access to a bucket.
///
/// Bodies are plain `AsyncRead` streams; dropping one closes it whether or not
/// it was read to the end.
pub trait ObjectStore: Send + Sync + 'static {
    type Body: AsyncRead + Send + Unpin + 'static;

    /// Fetch one listing page, starting after `continuation` (or at the start).
    fn list_page(
        &self,
        continuation: Option<String>,
    ) -> impl Future<Output = Result<ListPage, StorageError>> + Send;

    /// Open a streaming read of the object stored under `key`.
    fn open(&self, key: &str) -> impl Future<Output = Result<Self::Body, StorageError>> + Send;
}

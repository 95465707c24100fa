//! ListObjectsV2 response parsing and timestamp normalization.

use chrono::DateTime;
use serde::Deserialize;

use crate::bucket::{InventoryEntry, ListPage, StorageError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResultXml {
    #[serde(default)]
    contents: Vec<ContentsXml>,
    #[serde(default)]
    is_truncated: bool,
    #[serde(default)]
    next_continuation_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContentsXml {
    key: String,
    last_modified: String,
    #[serde(default)]
    size: u64,
}

/// Convert an RFC 3339 `LastModified` value into Unix seconds.
pub fn parse_last_modified(value: &str) -> Result<f64, StorageError> {
    let ts = DateTime::parse_from_rfc3339(value.trim())
        .map_err(|e| StorageError::Listing(format!("bad LastModified {:?}: {}", value, e)))?;
    Ok(ts.timestamp_millis() as f64 / 1000.0)
}

/// Parse one ListObjectsV2 page.
pub fn parse_list_page(xml: &str) -> Result<ListPage, StorageError> {
    let parsed: ListBucketResultXml =
        quick_xml::de::from_str(xml).map_err(|e| StorageError::Listing(e.to_string()))?;

    let mut entries = Vec::with_capacity(parsed.contents.len());
    for c in parsed.contents {
        entries.push(InventoryEntry {
            last_modified: parse_last_modified(&c.last_modified)?,
            key: c.key,
            size: c.size,
        });
    }

    let next = match (parsed.is_truncated, parsed.next_continuation_token) {
        (true, Some(token)) if !token.is_empty() => Some(token),
        (true, _) => {
            return Err(StorageError::Listing(
                "truncated listing without NextContinuationToken".to_string(),
            ))
        }
        (false, _) => None,
    };

    Ok(ListPage { entries, next })
}

//! Streaming content digests for object bodies.
//!
//! Bodies are hashed incrementally through a fixed-size buffer so memory use
//! stays bounded regardless of object size.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io;
use std::str::FromStr;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Default read buffer for hashing (69 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 69 * 1024;

/// Digest algorithm recorded alongside each checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// 128-bit MD5; matches the ETag of single-part uploads.
    #[default]
    Md5,
    Sha256,
}

impl DigestAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "md5",
            DigestAlgorithm::Sha256 => "sha256",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown digest algorithm {0:?}")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for DigestAlgorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "md5" => Ok(DigestAlgorithm::Md5),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            other => Err(UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Incremental hasher over one of the supported algorithms.
pub enum ContentHasher {
    Md5(md5::Context),
    Sha256(Sha256),
}

impl ContentHasher {
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Md5 => ContentHasher::Md5(md5::Context::new()),
            DigestAlgorithm::Sha256 => ContentHasher::Sha256(Sha256::new()),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            ContentHasher::Md5(ctx) => ctx.consume(data),
            ContentHasher::Sha256(h) => h.update(data),
        }
    }

    /// Finish and return the digest as lowercase hex.
    pub fn finalize_hex(self) -> String {
        match self {
            ContentHasher::Md5(ctx) => format!("{:x}", ctx.compute()),
            ContentHasher::Sha256(h) => hex::encode(h.finalize()),
        }
    }
}

/// Read `reader` to the end in `chunk_size` pieces and return the hex digest.
///
/// Any read error is returned as-is; no partial digest is ever produced.
pub async fn hash_reader<R>(
    reader: &mut R,
    algorithm: DigestAlgorithm,
    chunk_size: usize,
) -> io::Result<String>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut hasher = ContentHasher::new(algorithm);
    let mut buf = vec![0u8; chunk_size.max(1)];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize_hex())
}

//! Storage error type, kept concrete so the retry layer can classify it.

use std::fmt;
use std::io;

/// Error returned by the storage capability (listing or object reads).
#[derive(Debug)]
pub enum StorageError {
    /// Curl reported an error (timeout, connection, TLS verification, etc.).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// Reading the body stream failed.
    Io(io::Error),
    /// The listing response could not be understood.
    Listing(String),
    /// Endpoint, bucket, or key could not be turned into a request URL.
    InvalidUrl(String),
}

impl StorageError {
    /// Recover a `StorageError` that was carried through an `io::Error`
    /// (body streams surface transfer failures this way).
    pub fn from_io(e: io::Error) -> Self {
        if e.get_ref().map_or(false, |inner| inner.is::<StorageError>()) {
            if let Some(inner) = e.into_inner() {
                if let Ok(storage) = inner.downcast::<StorageError>() {
                    return *storage;
                }
            }
            return StorageError::Io(io::Error::other("transfer failed"));
        }
        StorageError::Io(e)
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Curl(e) => write!(f, "{}", e),
            StorageError::Http(code) => write!(f, "HTTP {}", code),
            StorageError::Io(e) => write!(f, "body read: {}", e),
            StorageError::Listing(msg) => write!(f, "listing: {}", msg),
            StorageError::InvalidUrl(msg) => write!(f, "invalid URL: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Curl(e) => Some(e),
            StorageError::Io(e) => Some(e),
            StorageError::Http(_) | StorageError::Listing(_) | StorageError::InvalidUrl(_) => None,
        }
    }
}

impl From<curl::Error> for StorageError {
    fn from(e: curl::Error) -> Self {
        StorageError::Curl(e)
    }
}

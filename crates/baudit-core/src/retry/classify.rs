//! Classify storage and commit failures into retry policy error kinds.

use std::io;

use crate::bucket::StorageError;
use crate::retry::error::AttemptError;
use crate::retry::policy::ErrorKind;

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        403 | 404 => ErrorKind::Inaccessible(code as u16),
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_peer_failed_verification() || e.is_ssl_cacert() || e.is_ssl_certproblem() {
        return ErrorKind::TlsVerification;
    }
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_ssl_connect_error()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return ErrorKind::Connection;
    }
    if e.is_partial_file() {
        return ErrorKind::Transfer;
    }
    ErrorKind::Other
}

/// Classify a body read failure that did not carry a `StorageError`.
pub fn classify_io_error(e: &io::Error) -> ErrorKind {
    match e.kind() {
        io::ErrorKind::TimedOut => ErrorKind::Timeout,
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::BrokenPipe => ErrorKind::Connection,
        _ => ErrorKind::Transfer,
    }
}

/// Classify an attempt failure into an ErrorKind.
pub fn classify(e: &AttemptError) -> ErrorKind {
    match e {
        AttemptError::Storage(StorageError::Curl(ce)) => classify_curl_error(ce),
        AttemptError::Storage(StorageError::Http(code)) => classify_http_status(*code),
        AttemptError::Storage(StorageError::Io(ie)) => classify_io_error(ie),
        AttemptError::Storage(StorageError::Listing(_)) => ErrorKind::Other,
        AttemptError::Storage(StorageError::InvalidUrl(_)) => ErrorKind::Inaccessible(0),
        AttemptError::Commit(_) => ErrorKind::Commit,
        AttemptError::GateClosed => ErrorKind::Inaccessible(0),
    }
}

//! Blocking libcurl transfers, bridged to async callers.
//!
//! Listing pages are small and fetched whole. Object bodies are streamed: the
//! transfer runs on a blocking thread and hands chunks to the async side over a
//! bounded channel, so a slow reader throttles the download. Dropping the
//! receiving side aborts the transfer on its next write.

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use std::cell::RefCell;
use std::io;
use std::str;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_util::io::StreamReader;

use crate::bucket::StorageError;

/// Chunks buffered between the curl thread and the reader.
const BODY_CHANNEL_DEPTH: usize = 8;

/// Body stream returned by `S3Client::open`.
pub type S3Body = StreamReader<BoxStream<'static, io::Result<Bytes>>, Bytes>;

/// Per-request curl settings derived from `AuditConfig`.
#[derive(Debug, Clone, Copy)]
pub struct TransferOptions {
    pub verify_tls: bool,
    pub connect_timeout: Duration,
    /// Abort if throughput stays under 1 KiB/s for this long.
    pub low_speed_time: Duration,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            verify_tls: true,
            connect_timeout: Duration::from_secs(30),
            low_speed_time: Duration::from_secs(60),
        }
    }
}

fn configure(easy: &mut curl::easy::Easy, url: &str, opts: TransferOptions) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.ssl_verify_peer(opts.verify_tls)?;
    easy.ssl_verify_host(opts.verify_tls)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.low_speed_limit(1024)?;
    easy.low_speed_time(opts.low_speed_time)?;
    Ok(())
}

/// Status code from an HTTP status line ("HTTP/1.1 200 OK").
fn parse_status_line(line: &str) -> Option<u32> {
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}

/// GET `url` and return the whole body. Runs in the current thread; call from
/// `spawn_blocking` if used from async code.
pub fn fetch_blocking(url: &str, opts: TransferOptions) -> Result<Vec<u8>, StorageError> {
    let mut body = Vec::new();
    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url, opts)?;
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }
    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(StorageError::Http(code));
    }
    Ok(body)
}

struct HeadState {
    status: u32,
    ready: Option<oneshot::Sender<Result<(), StorageError>>>,
}

impl HeadState {
    fn signal(&mut self, result: Result<(), StorageError>) {
        if let Some(tx) = self.ready.take() {
            let _ = tx.send(result);
        }
    }
}

/// Run one streamed GET. `ready` fires with an error as soon as a final
/// non-2xx head arrives, and with `Ok` on the first body chunk of a 2xx
/// response (or at the end of an empty one). Body chunks go to `chunks`.
///
/// A 2xx head alone is not trusted: a proxy's CONNECT reply is also handed to
/// the header callback and looks exactly like one.
fn stream_blocking(
    url: String,
    opts: TransferOptions,
    ready: oneshot::Sender<Result<(), StorageError>>,
    chunks: mpsc::Sender<io::Result<Bytes>>,
) {
    let head = RefCell::new(HeadState {
        status: 0,
        ready: Some(ready),
    });

    let mut easy = curl::easy::Easy::new();
    if let Err(e) = configure(&mut easy, &url, opts) {
        head.borrow_mut().signal(Err(StorageError::Curl(e)));
        return;
    }

    let result = {
        let mut transfer = easy.transfer();
        let setup = transfer
            .header_function(|data| {
                let line = str::from_utf8(data).unwrap_or("").trim_end();
                let mut head = head.borrow_mut();
                match parse_status_line(line) {
                    // Interim heads (100 Continue, 103 Early Hints) are skipped.
                    Some(code) if code < 200 => {}
                    Some(code) => head.status = code,
                    None if line.is_empty() => {
                        let status = head.status;
                        if status >= 400 {
                            head.signal(Err(StorageError::Http(status)));
                        }
                    }
                    None => {}
                }
                true
            })
            .and_then(|_| {
                transfer.write_function(|data| {
                    let mut head = head.borrow_mut();
                    if !(200..300).contains(&head.status) {
                        // Error page body; discard.
                        return Ok(data.len());
                    }
                    head.signal(Ok(()));
                    drop(head);
                    match chunks.blocking_send(Ok(Bytes::copy_from_slice(data))) {
                        Ok(()) => Ok(data.len()),
                        // Reader dropped the body: abort the transfer.
                        Err(_) => Ok(0),
                    }
                })
            });
        match setup {
            Ok(()) => transfer.perform(),
            Err(e) => Err(e),
        }
    };

    let mut head = head.into_inner();
    match result {
        Ok(()) => {
            // CURLINFO_RESPONSE_CODE is the origin's final status, never the proxy's.
            let status = easy.response_code().unwrap_or(head.status);
            let outcome = if (200..300).contains(&status) {
                Ok(())
            } else {
                Err(StorageError::Http(status))
            };
            match outcome {
                Ok(()) => head.signal(Ok(())),
                Err(e) if head.ready.is_some() => head.signal(Err(e)),
                // The reader already has a stream: fail it instead of ending it cleanly.
                Err(e) => {
                    let _ = chunks.blocking_send(Err(io::Error::other(e)));
                }
            }
        }
        Err(e) => {
            if head.ready.is_some() {
                head.signal(Err(StorageError::Curl(e)));
            } else if !e.is_write_error() {
                let _ = chunks.blocking_send(Err(io::Error::other(StorageError::Curl(e))));
            }
        }
    }
}

/// Start a streamed GET and wait until the body starts (or the request fails).
pub async fn open_stream(url: String, opts: TransferOptions) -> Result<S3Body, StorageError> {
    let (ready_tx, ready_rx) = oneshot::channel();
    let (chunk_tx, chunk_rx) = mpsc::channel(BODY_CHANNEL_DEPTH);
    tokio::task::spawn_blocking(move || stream_blocking(url, opts, ready_tx, chunk_tx));

    match ready_rx.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(e),
        Err(_) => {
            return Err(StorageError::Io(io::Error::other(
                "transfer thread exited before the body started",
            )))
        }
    }

    let body = stream::unfold(chunk_rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
    .boxed();
    Ok(StreamReader::new(body))
}

//! Minimal S3-style HTTP/1.1 server for integration tests.
//!
//! Serves one bucket with path-style addressing: `GET /{bucket}?list-type=2`
//! returns ListObjectsV2 XML in fixed-size pages (the continuation token is
//! the start index), and `GET /{bucket}/{key}` returns the object body.
//! Objects can be made flaky (first N GETs answer 500) or unreadable (404),
//! and object responses can be preceded by an interim `100 Continue` head.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const BUCKET: &str = "lab";

#[derive(Debug, Clone)]
struct Object {
    last_modified: String,
    /// `None`: listed but every GET answers 404.
    body: Option<Vec<u8>>,
}

#[derive(Default)]
struct State {
    objects: Mutex<BTreeMap<String, Object>>,
    /// Remaining 500 responses per key.
    flaky: Mutex<HashMap<String, u32>>,
    /// Keys whose GET responses start with an interim head.
    interim: Mutex<HashSet<String>>,
    page_size: usize,
    object_gets: AtomicUsize,
    list_requests: AtomicUsize,
}

/// Handle to a running server. The server runs until the process exits.
#[derive(Clone)]
pub struct S3Server {
    endpoint: String,
    state: Arc<State>,
}

impl S3Server {
    /// Start a server that returns at most `page_size` keys per listing page.
    pub fn start(page_size: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(State {
            page_size: page_size.max(1),
            ..State::default()
        });
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&shared);
                thread::spawn(move || handle(stream, &state));
            }
        });
        Self {
            endpoint: format!("http://127.0.0.1:{}", port),
            state,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Add or replace an object. `last_modified` is RFC 3339.
    pub fn put(&self, key: &str, last_modified: &str, body: &[u8]) {
        self.state.objects.lock().unwrap().insert(
            key.to_string(),
            Object {
                last_modified: last_modified.to_string(),
                body: Some(body.to_vec()),
            },
        );
    }

    /// List `key` but answer 404 to every GET.
    pub fn put_unreadable(&self, key: &str, last_modified: &str) {
        self.state.objects.lock().unwrap().insert(
            key.to_string(),
            Object {
                last_modified: last_modified.to_string(),
                body: None,
            },
        );
    }

    /// The next `failures` GETs of `key` answer 500.
    pub fn fail_next_gets(&self, key: &str, failures: u32) {
        self.state
            .flaky
            .lock()
            .unwrap()
            .insert(key.to_string(), failures);
    }

    /// Precede every response to a GET of `key` with `100 Continue`.
    pub fn send_interim_head(&self, key: &str) {
        self.state.interim.lock().unwrap().insert(key.to_string());
    }

    pub fn object_gets(&self) -> usize {
        self.state.object_gets.load(Ordering::SeqCst)
    }

    pub fn list_requests(&self) -> usize {
        self.state.list_requests.load(Ordering::SeqCst)
    }
}

fn handle(mut stream: TcpStream, state: &State) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let (method, target) = (parts.next().unwrap_or(""), parts.next().unwrap_or("/"));
    if !method.eq_ignore_ascii_case("GET") {
        respond(&mut stream, "405 Method Not Allowed", "text/plain", b"");
        return;
    }

    let url = match url::Url::parse(&format!("http://localhost{}", target)) {
        Ok(u) => u,
        Err(_) => {
            respond(&mut stream, "400 Bad Request", "text/plain", b"");
            return;
        }
    };
    let path = percent_decode(url.path().trim_start_matches('/'));
    let key = match path.split_once('/') {
        Some((bucket, key)) if bucket == BUCKET => key.to_string(),
        None if path == BUCKET => {
            state.list_requests.fetch_add(1, Ordering::SeqCst);
            let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
            let xml = list_page(state, &query);
            respond(&mut stream, "200 OK", "application/xml", xml.as_bytes());
            return;
        }
        _ => {
            respond(&mut stream, "404 Not Found", "application/xml", b"<Error><Code>NoSuchBucket</Code></Error>");
            return;
        }
    };

    state.object_gets.fetch_add(1, Ordering::SeqCst);
    if state.interim.lock().unwrap().contains(&key) {
        let _ = stream.write_all(b"HTTP/1.1 100 Continue\r\n\r\n");
    }
    {
        let mut flaky = state.flaky.lock().unwrap();
        if let Some(left) = flaky.get_mut(&key) {
            if *left > 0 {
                *left -= 1;
                drop(flaky);
                respond(&mut stream, "500 Internal Server Error", "application/xml", b"<Error><Code>InternalError</Code></Error>");
                return;
            }
        }
    }
    let body = state
        .objects
        .lock()
        .unwrap()
        .get(&key)
        .and_then(|o| o.body.clone());
    match body {
        Some(body) => respond(&mut stream, "200 OK", "application/octet-stream", &body),
        None => respond(&mut stream, "404 Not Found", "application/xml", b"<Error><Code>NoSuchKey</Code></Error>"),
    }
}

fn list_page(state: &State, query: &HashMap<String, String>) -> String {
    let prefix = query.get("prefix").map(String::as_str).unwrap_or("");
    let start: usize = query
        .get("continuation-token")
        .and_then(|t| t.parse().ok())
        .unwrap_or(0);
    let objects = state.objects.lock().unwrap();
    let matching: Vec<(&String, &Object)> = objects
        .iter()
        .filter(|(k, _)| k.starts_with(prefix))
        .collect();
    let end = (start + state.page_size).min(matching.len());
    let page = matching.get(start..end).unwrap_or(&[]);
    let truncated = end < matching.len();

    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <ListBucketResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">",
    );
    xml.push_str(&format!("<Name>{}</Name><KeyCount>{}</KeyCount>", BUCKET, page.len()));
    xml.push_str(&format!("<IsTruncated>{}</IsTruncated>", truncated));
    if truncated {
        xml.push_str(&format!("<NextContinuationToken>{}</NextContinuationToken>", end));
    }
    for (key, obj) in page {
        let size = obj.body.as_ref().map(Vec::len).unwrap_or(0);
        xml.push_str(&format!(
            "<Contents><Key>{}</Key><LastModified>{}</LastModified><Size>{}</Size></Contents>",
            xml_escape(key),
            obj.last_modified,
            size
        ));
    }
    xml.push_str("</ListBucketResult>");
    xml
}

fn respond(stream: &mut TcpStream, status: &str, content_type: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(v) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(v);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

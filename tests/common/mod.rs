//! Local stand-in for the photo API
//!
//! Serves `/photos`, `/photos/{id}` and `/albums/{id}` for a fixed number
//! of photos over plain HTTP/1.1, one thread per connection.

#![allow(dead_code)]

use serde_json::json;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const PHOTOS_PER_ALBUM: u64 = 50;

#[derive(Clone, Copy)]
struct Behavior {
    photo_count: u64,
    listing: bool,
    delay: Duration,
}

pub struct StubApi {
    addr: SocketAddr,
    requests: Arc<AtomicUsize>,
}

impl StubApi {
    pub fn start(photo_count: u64) -> Self {
        Self::spawn(Behavior {
            photo_count,
            listing: true,
            delay: Duration::ZERO,
        })
    }

    /// `/photos` answers 500, single resources still work
    pub fn without_listing(photo_count: u64) -> Self {
        Self::spawn(Behavior {
            photo_count,
            listing: false,
            delay: Duration::ZERO,
        })
    }

    /// Every response is held back for `delay`
    pub fn slow(photo_count: u64, delay: Duration) -> Self {
        Self::spawn(Behavior {
            photo_count,
            listing: true,
            delay,
        })
    }

    fn spawn(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub api");
        let addr = listener.local_addr().expect("stub api address");
        let requests = Arc::new(AtomicUsize::new(0));

        let counter = requests.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let counter = counter.clone();
                thread::spawn(move || handle(stream, behavior, &counter));
            }
        });

        Self { addr, requests }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

/// Base URL of a port nothing listens on
pub fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    format!("http://{addr}")
}

pub fn album_of(photo_id: u64) -> u64 {
    (photo_id - 1) / PHOTOS_PER_ALBUM + 1
}

fn handle(mut stream: TcpStream, behavior: Behavior, counter: &AtomicUsize) {
    let Some(path) = read_request_path(&mut stream) else {
        return;
    };
    counter.fetch_add(1, Ordering::SeqCst);

    if !behavior.delay.is_zero() {
        thread::sleep(behavior.delay);
    }

    let (status, body) = route(&path, behavior);
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        _ => "Internal Server Error",
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn read_request_path(stream: &mut TcpStream) -> Option<String> {
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        raw.extend_from_slice(&buf[..n]);
    }

    let head = String::from_utf8_lossy(&raw);
    let request_line = head.lines().next()?;
    request_line.split_whitespace().nth(1).map(str::to_string)
}

fn route(path: &str, behavior: Behavior) -> (u16, String) {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match segments.as_slice() {
        ["photos"] if behavior.listing => {
            let listing: Vec<_> = (1..=behavior.photo_count).map(photo_json).collect();
            (200, serde_json::Value::Array(listing).to_string())
        }
        ["photos"] => (500, "{}".to_string()),
        ["photos", id] => match id.parse::<u64>() {
            Ok(id) if (1..=behavior.photo_count).contains(&id) => (200, photo_json(id).to_string()),
            _ => (404, "{}".to_string()),
        },
        ["albums", id] => match id.parse::<u64>() {
            Ok(id) if id >= 1 => (
                200,
                json!({"userId": 1, "id": id, "title": format!("album {id}")}).to_string(),
            ),
            _ => (404, "{}".to_string()),
        },
        _ => (404, "{}".to_string()),
    }
}

fn photo_json(id: u64) -> serde_json::Value {
    json!({
        "albumId": album_of(id),
        "id": id,
        "title": format!("photo {id}"),
        "url": format!("https://via.placeholder.com/600/{id}"),
        "thumbnailUrl": format!("https://via.placeholder.com/150/{id}"),
    })
}

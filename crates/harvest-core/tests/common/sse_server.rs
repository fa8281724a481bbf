//! Minimal HTTP/1.1 server that streams scripted server-sent events.
//!
//! Answers `GET <path>?token=<token>` with `text/event-stream` and writes each
//! frame in order, then closes the connection (or keeps it open for a while).
//! A wrong or missing token gets 401.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SseScript {
    /// Token the `token` query parameter must carry.
    pub token: String,
    /// Raw frames, e.g. `"event: progress\ndata: {..}\n\n"`.
    pub frames: Vec<String>,
    /// Pause before each frame.
    pub frame_delay: Duration,
    /// Keep the connection open this long after the last frame.
    pub hold_open: Duration,
}

impl SseScript {
    pub fn new(token: &str, frames: Vec<String>) -> Self {
        Self {
            token: token.to_string(),
            frames,
            frame_delay: Duration::from_millis(10),
            hold_open: Duration::ZERO,
        }
    }
}

pub fn frame(event: &str, data: &str) -> String {
    format!("event: {event}\r\ndata: {data}\r\n\r\n")
}

pub struct SseServer {
    pub base_url: String,
    requests: Arc<AtomicUsize>,
    targets: Arc<Mutex<Vec<String>>>,
}

impl SseServer {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }
}

/// Starts a server in a background thread. It runs until the process exits.
pub fn start(script: SseScript) -> SseServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(AtomicUsize::new(0));
    let targets = Arc::new(Mutex::new(Vec::new()));
    let script = Arc::new(script);
    {
        let requests = Arc::clone(&requests);
        let targets = Arc::clone(&targets);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                requests.fetch_add(1, Ordering::SeqCst);
                let script = Arc::clone(&script);
                let targets = Arc::clone(&targets);
                thread::spawn(move || handle(stream, &script, &targets));
            }
        });
    }
    SseServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        requests,
        targets,
    }
}

fn handle(mut stream: TcpStream, script: &SseScript, targets: &Mutex<Vec<String>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("")
        .to_string();
    targets.lock().unwrap().push(target.clone());

    let expected = format!("token={}", script.token);
    let authorized = target
        .split_once('?')
        .is_some_and(|(_, query)| query.split('&').any(|pair| pair == expected));
    if !authorized {
        let _ = stream.write_all(
            b"HTTP/1.1 401 Unauthorized\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }

    let head = "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n";
    if stream.write_all(head.as_bytes()).is_err() {
        return;
    }
    for frame in &script.frames {
        thread::sleep(script.frame_delay);
        if stream.write_all(frame.as_bytes()).is_err() || stream.flush().is_err() {
            return;
        }
    }
    thread::sleep(script.hold_open);
}

//! Minimal HTTP/1.1 server that answers GETs with canned JSON.
//!
//! Routes match on the path only; the query string is ignored for routing
//! but every request target is recorded so tests can assert on it.
//! Unknown paths answer 404.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Route {
    status: u16,
    body: String,
}

pub struct JsonServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl JsonServer {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request targets (path and query) seen so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct Routes(HashMap<String, Route>);

impl Routes {
    pub fn json(mut self, path: &str, body: serde_json::Value) -> Self {
        self.0.insert(
            path.to_string(),
            Route { status: 200, body: body.to_string() },
        );
        self
    }

    pub fn raw(mut self, path: &str, status: u16, body: &str) -> Self {
        self.0.insert(
            path.to_string(),
            Route { status, body: body.to_string() },
        );
        self
    }
}

/// Starts a server in a background thread. It runs until the process exits.
pub fn start(routes: Routes) -> JsonServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes = Arc::new(routes.0);
    let requests = Arc::new(Mutex::new(Vec::new()));

    let seen = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let seen = Arc::clone(&seen);
            thread::spawn(move || handle(stream, &routes, &seen));
        }
    });

    JsonServer {
        base_url: format!("http://127.0.0.1:{port}"),
        requests,
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

fn handle(mut stream: TcpStream, routes: &HashMap<String, Route>, seen: &Mutex<Vec<String>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };

    // "GET /api/v1/search?q=x HTTP/1.1"
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let path = target.split('?').next().unwrap_or("/").to_string();
    seen.lock().unwrap().push(target);

    let route = routes.get(&path).cloned().unwrap_or(Route {
        status: 404,
        body: r#"{"error":"not found"}"#.to_string(),
    });
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        route.status,
        reason(route.status),
        route.body.len(),
        route.body
    );
    let _ = stream.write_all(response.as_bytes());
}

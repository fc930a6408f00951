//! A throwaway Ollama stand-in on a loopback port.
#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use kgenrich::config::OllamaConfig;
use serde_json::{Value, json};

/// How the fake server answers.
#[derive(Clone)]
pub struct Behavior {
    /// Names reported by `/api/tags`.
    pub models: Vec<String>,
    pub tags_status: u16,
    pub generate_status: u16,
    /// Maps a prompt to the `response` field.
    pub responder: fn(&str) -> String,
}

impl Behavior {
    pub fn with_models(models: &[&str], responder: fn(&str) -> String) -> Self {
        Self {
            models: models.iter().map(|m| m.to_string()).collect(),
            tags_status: 200,
            generate_status: 200,
            responder,
        }
    }
}

pub struct FakeOllama {
    url: String,
    generate_bodies: Arc<Mutex<Vec<Value>>>,
    tag_requests: Arc<Mutex<usize>>,
}

impl FakeOllama {
    /// Bind to an ephemeral port and serve until the test process exits.
    pub fn start(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let generate_bodies = Arc::new(Mutex::new(Vec::new()));
        let tag_requests = Arc::new(Mutex::new(0));

        let bodies = Arc::clone(&generate_bodies);
        let tags = Arc::clone(&tag_requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                handle(stream, &behavior, &bodies, &tags);
            }
        });

        Self {
            url,
            generate_bodies,
            tag_requests,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Client configuration pointing at this server.
    pub fn config(&self, model: &str) -> OllamaConfig {
        OllamaConfig {
            url: self.url.clone(),
            model: model.to_string(),
            timeout_secs: 5,
            ..OllamaConfig::default()
        }
    }

    pub fn generate_bodies(&self) -> Vec<Value> {
        self.generate_bodies.lock().unwrap().clone()
    }

    pub fn tag_requests(&self) -> usize {
        *self.tag_requests.lock().unwrap()
    }
}

fn handle(
    stream: TcpStream,
    behavior: &Behavior,
    bodies: &Mutex<Vec<Value>>,
    tags: &Mutex<usize>,
) {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            if key.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = vec![0u8; content_length];
    if reader.read_exact(&mut body).is_err() {
        return;
    }

    let (status, payload) = match (method.as_str(), path.as_str()) {
        ("GET", "/api/tags") => {
            *tags.lock().unwrap() += 1;
            let models: Vec<Value> = behavior
                .models
                .iter()
                .map(|name| json!({ "name": name }))
                .collect();
            (behavior.tags_status, json!({ "models": models }))
        }
        ("POST", "/api/generate") => {
            let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
            let prompt = request["prompt"].as_str().unwrap_or_default().to_string();
            bodies.lock().unwrap().push(request);
            if behavior.generate_status == 200 {
                (200, json!({ "response": (behavior.responder)(&prompt), "done": true }))
            } else {
                (behavior.generate_status, json!({ "error": "model failure" }))
            }
        }
        _ => (404, json!({ "error": "not found" })),
    };

    let text = payload.to_string();
    let response = format!(
        "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{text}",
        reason(status),
        text.len()
    );
    let mut stream = reader.into_inner();
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}

/// Canned answers keyed on which prompt is being asked.
pub fn canned_responder(prompt: &str) -> String {
    if prompt.contains("rate its complexity") {
        "  low\n".to_string()
    } else if prompt.contains("semantic tags") {
        "Geometry, Math".to_string()
    } else if prompt.contains("depends on or interacts with") {
        "math\n\nSquare\n".to_string()
    } else {
        "  Computes a geometric quantity.  ".to_string()
    }
}

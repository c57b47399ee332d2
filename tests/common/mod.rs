//! Shared fixtures: an in-process parse API stub built on axum, and dump helpers.

#![allow(dead_code)]

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use bzip2::write::BzEncoder;
use bzip2::Compression;
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;

pub type Params = HashMap<String, String>;

/// Every request any stub received, in arrival order, tagged with the stub name.
pub type CallLog = Arc<Mutex<Vec<(String, Params)>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls_to(log: &CallLog, name: &str) -> usize {
    log.lock().unwrap().iter().filter(|(n, _)| n == name).count()
}

pub fn call_names(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
}

/// What a stub answers for one request
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl Reply {
    /// 200 with a well-formed `action=parse` body carrying `html`
    pub fn html(html: &str) -> Self {
        let body = serde_json::json!({ "parse": { "title": "t", "text": { "*": html } } });
        Self {
            status: StatusCode::OK,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            body: "stub failure".to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn raw(body: &str) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Serves `/w/api.php` on an ephemeral local port and returns its URL.
pub async fn spawn_stub<F>(name: &str, log: CallLog, respond: F) -> String
where
    F: Fn(&Params) -> Reply + Clone + Send + Sync + 'static,
{
    let name = name.to_string();
    let app = Router::new().route(
        "/w/api.php",
        get(move |Query(params): Query<Params>| {
            let log = log.clone();
            let respond = respond.clone();
            let name = name.clone();
            async move {
                let reply = respond(&params);
                log.lock().unwrap().push((name, params));
                if !reply.delay.is_zero() {
                    tokio::time::sleep(reply.delay).await;
                }
                (reply.status, reply.body)
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/w/api.php")
}

/// URL of a local port with nothing listening on it
pub async fn dead_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/w/api.php")
}

/// Writes `xml` to a temp file with the given suffix, bzip2-compressed when
/// the suffix ends in `.bz2`.
pub fn write_dump(xml: &str, suffix: &str) -> NamedTempFile {
    let mut tmp = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    if suffix.ends_with(".bz2") {
        let mut encoder = BzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(xml.as_bytes()).unwrap();
        tmp.write_all(&encoder.finish().unwrap()).unwrap();
    } else {
        tmp.write_all(xml.as_bytes()).unwrap();
    }
    tmp.flush().unwrap();
    tmp
}

//! In-process resolution service
//!
//! Serves `POST /get-audio` on an ephemeral port with a canned response and
//! records every request body it receives.

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub struct ResolverStub {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<Value>>>,
}

impl ResolverStub {
    /// Start a stub that answers every request with `status` and `body`
    pub async fn start(status: StatusCode, body: Value) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(Mutex::new(Vec::new()));

        let handler = {
            let hits = hits.clone();
            let received = received.clone();
            move |Json(request): Json<Value>| {
                let hits = hits.clone();
                let received = received.clone();
                let body = body.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    received.lock().unwrap().push(request);
                    (status, Json(body))
                }
            }
        };

        let app = Router::new().route("/get-audio", post(handler));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Should bind stub resolver");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            hits,
            received,
        }
    }

    /// Start a stub that returns the given tracks with 200
    pub async fn with_tracks(tracks: Value) -> Self {
        Self::start(StatusCode::OK, serde_json::json!({ "tracks": tracks })).await
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }
}

/// Base URL of a port nothing listens on
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

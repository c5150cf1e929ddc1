#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use harscope_engine::{EventSink, IngestEvent};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(harscope_logging::initialize_for_tests);
}

#[derive(Default)]
pub struct TestSink {
    events: Arc<Mutex<Vec<IngestEvent>>>,
    cancel_on_batch: Option<CancellationToken>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels `token` as soon as the first batch is announced.
    pub fn cancelling(token: CancellationToken) -> Self {
        Self {
            events: Arc::default(),
            cancel_on_batch: Some(token),
        }
    }

    pub fn take(&self) -> Vec<IngestEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: IngestEvent) {
        if let (IngestEvent::EntriesAdded { .. }, Some(token)) = (&event, &self.cancel_on_batch) {
            token.cancel();
        }
        self.events.lock().unwrap().push(event);
    }
}

pub fn har_entry(method: &str, url: &str, status: i64, time: f64) -> Value {
    json!({
        "startedDateTime": "2024-03-01T10:00:00.000Z",
        "time": time,
        "request": {"method": method, "url": url, "httpVersion": "HTTP/1.1", "headers": [], "cookies": []},
        "response": {
            "status": status,
            "statusText": "",
            "headers": [],
            "content": {"size": 0, "mimeType": "application/json", "text": ""}
        },
        "timings": {"blocked": -1, "dns": -1, "connect": -1, "send": 1, "wait": time - 2.0, "receive": 1}
    })
}

pub fn har_document(entries: Vec<Value>) -> String {
    json!({
        "log": {
            "version": "1.1",
            "creator": {"name": "WebInspector", "version": "537.36"},
            "pages": [],
            "entries": entries
        }
    })
    .to_string()
}

/// `count` GET entries against `https://api.example.com/items/{i}`.
pub fn numbered_document(count: usize) -> String {
    har_document(
        (0..count)
            .map(|i| har_entry("GET", &format!("https://api.example.com/items/{i}"), 200, 10.0))
            .collect(),
    )
}

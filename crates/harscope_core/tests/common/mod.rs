#![allow(dead_code)]

use std::sync::Once;

use harscope_core::{Entry, EntryIndex, Header};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(harscope_logging::initialize_for_tests);
}

pub fn entry(method: &str, url: &str, status: i64) -> Entry {
    let mut entry = Entry::default();
    entry.request.method = method.to_string();
    entry.request.url = url.to_string();
    entry.response.status = status;
    entry.started_date_time = "2024-03-01T10:00:00.000Z".to_string();
    entry.time = 10.0;
    entry
}

pub fn header(name: &str, value: &str) -> Header {
    Header {
        name: name.to_string(),
        value: value.to_string(),
    }
}

pub fn with_request_header(mut entry: Entry, name: &str, value: &str) -> Entry {
    entry.request.headers.push(header(name, value));
    entry
}

pub fn with_response_header(mut entry: Entry, name: &str, value: &str) -> Entry {
    entry.response.headers.push(header(name, value));
    entry
}

pub fn timed(mut entry: Entry, started: &str, time: f64) -> Entry {
    entry.started_date_time = started.to_string();
    entry.time = time;
    entry
}

pub fn build_index(entries: &[Entry]) -> EntryIndex {
    let mut index = EntryIndex::new();
    for (position, entry) in entries.iter().enumerate() {
        index.add_entry(entry, position);
    }
    index
}

/// Five entries: 0, 1 and 3 on api.example.com, 2 is a jpeg, 3 failed with 500.
pub fn scenario_entries() -> Vec<Entry> {
    let mut image = entry("GET", "https://cdn.example.net/img/logo", 200);
    image.response.content.mime_type = "image/jpeg".to_string();
    let image = with_response_header(image, "Content-Type", "image/jpeg");

    let mut slow = entry("GET", "https://api.example.com/v1/users", 200);
    slow.time = 250.0;
    let mut failed = entry("POST", "https://api.example.com/v1/orders", 500);
    failed.time = 40.0;

    vec![
        entry("GET", "https://api.example.com/v1/session", 200),
        slow,
        image,
        failed,
        entry("GET", "https://www.example.org/", 200),
    ]
}

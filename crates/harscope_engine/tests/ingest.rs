mod common;

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use common::{har_document, har_entry, init_logging, numbered_document, TestSink};
use harscope_core::{Category, DimensionKey};
use harscope_engine::{
    ingest_file, ingest_reader, EntryStore, IngestEvent, IngestSettings, LoadFailureKind,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn batches(events: &[IngestEvent]) -> Vec<(usize, usize)> {
    events
        .iter()
        .filter_map(|event| match event {
            IngestEvent::EntriesAdded { first, count } => Some((*first, *count)),
            _ => None,
        })
        .collect()
}

fn progress(events: &[IngestEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|event| match event {
            IngestEvent::Progress { count } => Some(*count),
            _ => None,
        })
        .collect()
}

#[test]
fn batches_and_progress_follow_the_defaults() {
    init_logging();
    let store = EntryStore::new();
    let sink = TestSink::new();
    let doc = numbered_document(250);

    let total = ingest_reader(
        doc.as_bytes(),
        &store,
        &IngestSettings::default(),
        &sink,
        &CancellationToken::new(),
    )
    .unwrap();

    assert_eq!(total, 250);
    assert_eq!(store.len(), 250);
    let events = sink.take();
    assert_eq!(batches(&events), vec![(0, 100), (100, 100), (200, 50)]);
    assert_eq!(progress(&events), vec![50, 100, 150, 200, 250, 250]);
    assert_eq!(events.last(), Some(&IngestEvent::Completed { total: 250 }));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
}

#[test]
fn positions_follow_document_order() {
    init_logging();
    let store = EntryStore::new();
    ingest_reader(
        numbered_document(5).as_bytes(),
        &store,
        &IngestSettings::default(),
        &TestSink::new(),
        &CancellationToken::new(),
    )
    .unwrap();

    for position in 0..5 {
        let entry = store.entry(position).unwrap();
        assert_eq!(
            entry.request.url,
            format!("https://api.example.com/items/{position}")
        );
    }
    assert_eq!(store.positions(DimensionKey::Method("GET")), vec![0, 1, 2, 3, 4]);
    assert_eq!(store.version().as_deref(), Some("1.1"));
}

#[test]
fn malformed_tail_keeps_the_entries_already_read() {
    init_logging();
    let store = EntryStore::new();
    let sink = TestSink::new();
    let mut doc = numbered_document(3);
    // Cut the document inside the closing brackets and append garbage.
    doc.truncate(doc.find("],\"pages\"").unwrap());
    doc.push_str(", {\"request\": oops");

    let err = ingest_reader(
        doc.as_bytes(),
        &store,
        &IngestSettings::default(),
        &sink,
        &CancellationToken::new(),
    )
    .unwrap_err();

    assert!(matches!(err.kind, LoadFailureKind::Malformed { line: 1, .. }));
    assert_eq!(store.len(), 3);
    let events = sink.take();
    assert_eq!(batches(&events), vec![(0, 3)]);
    assert_eq!(
        events.last(),
        Some(&IngestEvent::Failed {
            error: err.clone(),
            ingested: 3
        })
    );
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
}

#[test]
fn entry_with_wrong_field_type_fails_the_load() {
    init_logging();
    let store = EntryStore::new();
    let doc = r#"{"log":{"entries":[{"request":{"url":"https://a.com/"}},{"time":"slow"}]}}"#;

    let err = ingest_reader(
        doc.as_bytes(),
        &store,
        &IngestSettings::default(),
        &TestSink::new(),
        &CancellationToken::new(),
    )
    .unwrap_err();

    assert!(matches!(err.kind, LoadFailureKind::Malformed { .. }));
    assert_eq!(store.len(), 1);
}

#[test]
fn zero_settings_are_treated_as_one() {
    init_logging();
    let store = EntryStore::new();
    let sink = TestSink::new();
    let settings = IngestSettings {
        batch_size: 0,
        progress_interval: 0,
    };

    ingest_reader(
        numbered_document(2).as_bytes(),
        &store,
        &settings,
        &sink,
        &CancellationToken::new(),
    )
    .unwrap();

    let events = sink.take();
    assert_eq!(batches(&events), vec![(0, 1), (1, 1)]);
    assert_eq!(progress(&events), vec![1, 2, 2]);
}

#[test]
fn cancellation_stops_between_entries() {
    init_logging();
    let store = EntryStore::new();
    let token = CancellationToken::new();
    let sink = TestSink::cancelling(token.clone());
    let settings = IngestSettings {
        batch_size: 2,
        progress_interval: 50,
    };

    let err = ingest_reader(
        numbered_document(10).as_bytes(),
        &store,
        &settings,
        &sink,
        &token,
    )
    .unwrap_err();

    assert_eq!(err.kind, LoadFailureKind::Cancelled);
    assert_eq!(store.len(), 2);
    let events = sink.take();
    assert_eq!(batches(&events), vec![(0, 2)]);
    assert!(matches!(
        events.last(),
        Some(IngestEvent::Failed { ingested: 2, .. })
    ));
}

#[test]
fn categories_partition_every_ingested_entry() {
    init_logging();
    let store = EntryStore::new();
    let mut image = har_entry("GET", "https://cdn.example.net/logo.png", 200, 5.0);
    image["response"]["content"]["mimeType"] = "image/png".into();
    let doc = har_document(vec![
        har_entry("GET", "https://api.example.com/v1/users", 200, 20.0),
        image,
        har_entry("GET", "wss://live.example.com/socket", 101, 1.0),
        har_entry("GET", "https://example.com/app.js", 200, 3.0),
    ]);

    ingest_reader(
        doc.as_bytes(),
        &store,
        &IngestSettings::default(),
        &TestSink::new(),
        &CancellationToken::new(),
    )
    .unwrap();

    let counts = store.category_counts();
    assert_eq!(counts.iter().map(|(_, n)| n).sum::<usize>(), store.len());
    assert_eq!(store.positions(DimensionKey::Category(Category::Img)), vec![1]);
    assert_eq!(store.positions(DimensionKey::Category(Category::Ws)), vec![2]);
}

#[tokio::test]
async fn missing_file_reports_io_failure() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("absent.har");
    let sink = Arc::new(TestSink::new());

    let result = ingest_file(
        path.clone(),
        Arc::new(EntryStore::new()),
        IngestSettings::default(),
        sink.clone(),
        CancellationToken::new(),
    )
    .await;

    assert_eq!(result.unwrap_err().kind, LoadFailureKind::Io);
    let events = sink.take();
    assert_eq!(events.first(), Some(&IngestEvent::Started { path }));
    assert!(matches!(
        events.last(),
        Some(IngestEvent::Failed {
            ingested: 0,
            ..
        })
    ));
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn file_ingestion_starts_then_completes() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("session.har");
    fs::write(&path, numbered_document(120)).unwrap();
    let store = Arc::new(EntryStore::new());
    let sink = Arc::new(TestSink::new());

    let total = ingest_file(
        path.clone(),
        store.clone(),
        IngestSettings::default(),
        sink.clone(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(total, 120);
    assert_eq!(store.len(), 120);
    let events = sink.take();
    assert_eq!(events.first(), Some(&IngestEvent::Started { path }));
    assert_eq!(batches(&events), vec![(0, 100), (100, 20)]);
    assert_eq!(events.last(), Some(&IngestEvent::Completed { total: 120 }));
}

#[test]
fn readers_never_see_a_partially_indexed_entry() {
    init_logging();
    let store = EntryStore::new();
    let done = AtomicBool::new(false);
    let doc = numbered_document(2000);

    thread::scope(|scope| {
        scope.spawn(|| {
            let settings = IngestSettings {
                batch_size: 1,
                progress_interval: 1,
            };
            ingest_reader(
                doc.as_bytes(),
                &store,
                &settings,
                &TestSink::new(),
                &CancellationToken::new(),
            )
            .unwrap();
            done.store(true, Ordering::SeqCst);
        });

        let mut snapshots = 0usize;
        loop {
            let finished = done.load(Ordering::SeqCst);
            store.read_with(|entries, index| {
                assert_eq!(index.len(), entries.len());
                let mut bucketed: Vec<usize> = Category::ALL
                    .into_iter()
                    .flat_map(|category| index.get_by_category(category))
                    .collect();
                bucketed.sort_unstable();
                assert_eq!(bucketed, (0..entries.len()).collect::<Vec<_>>());
            });
            snapshots += 1;
            if finished {
                break;
            }
        }
        assert!(snapshots > 0);
    });

    assert_eq!(store.len(), 2000);
}

#[test]
fn late_cancel_does_not_hide_a_decode_error() {
    init_logging();
    let store = EntryStore::new();
    let token = CancellationToken::new();
    // Cancels right after the second entry, before the broken third is read.
    let sink = TestSink::cancelling(token.clone());
    let settings = IngestSettings {
        batch_size: 2,
        progress_interval: 50,
    };
    let mut doc = numbered_document(2);
    doc.truncate(doc.find("],\"pages\"").unwrap());
    doc.push_str(", {\"request\": oops");

    let err = ingest_reader(doc.as_bytes(), &store, &settings, &sink, &token).unwrap_err();

    assert!(matches!(err.kind, LoadFailureKind::Malformed { .. }));
    assert_eq!(store.len(), 2);
}

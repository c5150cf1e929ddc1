//! Secondary indices over the entry store.
//!
//! The index holds positions only. It has no lock of its own: the store that
//! owns it appends an entry and indexes it under one write lock.

use std::collections::HashMap;

use crate::category::{classify, Category};
use crate::entry::Entry;

/// Bodies longer than this are not scanned by the text filter.
pub const MAX_SEARCHABLE_BODY: usize = 10_000;

/// One indexed facet and the value to look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionKey<'a> {
    Method(&'a str),
    Status(i64),
    MimeType(&'a str),
    Host(&'a str),
    Path(&'a str),
    Category(Category),
}

#[derive(Debug, Clone, Default)]
pub struct EntryIndex {
    by_method: HashMap<String, Vec<usize>>,
    by_status: HashMap<i64, Vec<usize>>,
    by_mime: HashMap<String, Vec<usize>>,
    by_host: HashMap<String, Vec<usize>>,
    by_path: HashMap<String, Vec<usize>>,
    by_category: HashMap<Category, Vec<usize>>,
    len: usize,
}

impl EntryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of positions indexed so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Indexes `entry` under `position`. Positions must arrive in increasing
    /// order so that every list stays sorted.
    pub fn add_entry(&mut self, entry: &Entry, position: usize) {
        self.by_method
            .entry(entry.request.method.clone())
            .or_default()
            .push(position);
        self.by_status
            .entry(entry.response.status)
            .or_default()
            .push(position);
        self.by_mime
            .entry(entry.response.content.mime_type.clone())
            .or_default()
            .push(position);

        // Unparseable URLs are simply absent from host/path.
        if let Some(parts) = entry.url_parts() {
            self.by_host.entry(parts.host).or_default().push(position);
            self.by_path.entry(parts.path).or_default().push(position);
        }

        self.by_category
            .entry(classify(entry))
            .or_default()
            .push(position);
        self.len += 1;
    }

    /// Positions recorded under `key`, in insertion order.
    pub fn get(&self, key: DimensionKey<'_>) -> Vec<usize> {
        let list = match key {
            DimensionKey::Method(method) => self.by_method.get(method),
            DimensionKey::Status(status) => self.by_status.get(&status),
            DimensionKey::MimeType(mime) => self.by_mime.get(mime),
            DimensionKey::Host(host) => self.by_host.get(host),
            DimensionKey::Path(path) => self.by_path.get(path),
            DimensionKey::Category(category) => self.by_category.get(&category),
        };
        list.cloned().unwrap_or_default()
    }

    pub fn get_by_category(&self, category: Category) -> Vec<usize> {
        self.get(DimensionKey::Category(category))
    }

    /// Counts per category, in filter-bar order. Categories without entries
    /// are reported with zero.
    pub fn category_counts(&self) -> Vec<(Category, usize)> {
        Category::ALL
            .into_iter()
            .map(|category| {
                let count = self.by_category.get(&category).map_or(0, Vec::len);
                (category, count)
            })
            .collect()
    }

    /// Positions whose status is >= 400 or 0. Recomputed on every call.
    pub fn error_positions(&self, entries: &[Entry]) -> Vec<usize> {
        entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_error())
            .map(|(position, _)| position)
            .collect()
    }

    /// Positions whose searchable fields contain `text`, case-insensitively.
    /// An empty needle matches everything.
    pub fn text_matches(&self, entries: &[Entry], text: &str) -> Vec<usize> {
        let needle = text.to_lowercase();
        entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| needle.is_empty() || matches_text(entry, &needle))
            .map(|(position, _)| position)
            .collect()
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// `needle` must already be lowercased. Returns on the first matching field.
pub fn matches_text(entry: &Entry, needle: &str) -> bool {
    let request = &entry.request;
    let response = &entry.response;

    if let Some(parts) = entry.url_parts() {
        if contains(&parts.host, needle)
            || contains(&parts.path, needle)
            || contains(&parts.query, needle)
        {
            return true;
        }
    }

    if contains(&request.method, needle) {
        return true;
    }

    let headers = request.headers.iter().chain(response.headers.iter());
    for header in headers {
        if contains(&header.name, needle) || contains(&header.value, needle) {
            return true;
        }
    }

    if contains(&response.status_text, needle) || contains(&response.content.mime_type, needle) {
        return true;
    }

    if let Some(post) = &request.post_data {
        if !post.text.is_empty() && post.text.len() <= MAX_SEARCHABLE_BODY && contains(&post.text, needle) {
            return true;
        }
    }

    if !response.content.text.is_empty() {
        let body = entry.response_text();
        if body.len() <= MAX_SEARCHABLE_BODY && contains(&body, needle) {
            return true;
        }
    }

    request
        .cookies
        .iter()
        .chain(response.cookies.iter())
        .any(|cookie| contains(&cookie.name, needle) || contains(&cookie.value, needle))
}

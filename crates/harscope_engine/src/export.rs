//! Filtered-archive export and per-entry report payloads.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use harscope_core::{parse_har_datetime, Entry};
use harscope_logging::har_info;
use serde::Serialize;
use serde_json::value::RawValue;

use crate::persist::{write_archive, PersistError};
use crate::store::EntryStore;

/// HAR version written when the source archive did not declare one.
pub const DEFAULT_HAR_VERSION: &str = "1.2";

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub pretty: bool,
    /// Creator name used when the source archive had no `log.creator`.
    pub creator_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            creator_name: "harscope".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub entry_count: usize,
    pub output_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    log: ExportLog<'a>,
}

#[derive(Serialize)]
struct ExportLog<'a> {
    version: &'a str,
    creator: &'a RawValue,
    entries: Vec<&'a RawValue>,
}

#[derive(Serialize)]
struct DefaultCreator<'a> {
    name: &'a str,
    version: &'a str,
}

/// Serializes the entries at `positions` (in that order) as a HAR document.
///
/// Entries are written exactly as they appeared in the source, including
/// fields the entry model does not know. Out-of-range positions are skipped.
pub fn filtered_har_json(
    store: &EntryStore,
    positions: &[usize],
    options: &ExportOptions,
) -> Result<String, ExportError> {
    let (meta, raw) = store.raw_selection(positions);

    let fallback_creator;
    let creator: &RawValue = match meta.creator.as_deref() {
        Some(creator) => creator,
        None => {
            fallback_creator = serde_json::value::to_raw_value(&DefaultCreator {
                name: &options.creator_name,
                version: env!("CARGO_PKG_VERSION"),
            })?;
            &*fallback_creator
        }
    };

    let document = ExportDocument {
        log: ExportLog {
            version: meta.version.as_deref().unwrap_or(DEFAULT_HAR_VERSION),
            creator,
            entries: raw.iter().map(|value| &**value).collect(),
        },
    };

    let json = if options.pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    Ok(json)
}

/// Writes the filtered archive into `dir` as `filename`, or a suffixed
/// variant of it when that name is taken. See [`write_archive`].
pub fn export_filtered(
    store: &EntryStore,
    positions: &[usize],
    dir: &Path,
    filename: &str,
    options: &ExportOptions,
) -> Result<ExportSummary, ExportError> {
    let json = filtered_har_json(store, positions, options)?;
    let entry_count = positions.iter().filter(|&&p| p < store.len()).count();
    let output_path = write_archive(dir, filename, json.as_bytes())?;
    har_info!(
        "Exported {} entries to {}",
        entry_count,
        output_path.display()
    );
    Ok(ExportSummary {
        entry_count,
        output_path,
    })
}

/// Shell command reproducing the request. The `Host` header is left to curl.
pub fn curl_command(entry: &Entry) -> String {
    let request = &entry.request;
    let mut cmd = format!("curl -X {} {}", request.method, quote(&request.url));
    for header in &request.headers {
        if header.name.eq_ignore_ascii_case("host") {
            continue;
        }
        let _ = write!(cmd, " -H {}", quote(&format!("{}: {}", header.name, header.value)));
    }
    if let Some(post) = request.post_data.as_ref().filter(|p| !p.text.is_empty()) {
        let _ = write!(cmd, " -d {}", quote(&post.text));
    }
    cmd
}

/// POSIX single-quoting: embedded quotes become `'\''`.
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "'\\''"))
}

/// Markdown digest of one transaction for pasting into a support ticket.
pub fn markdown_summary(entry: &Entry) -> String {
    let request = &entry.request;
    let response = &entry.response;
    let url = entry.url_parts().unwrap_or_default();

    let mut out = String::new();
    let _ = writeln!(
        out,
        "# {} {} {}\n",
        request.method, response.status, url.host
    );

    out.push_str("## Overview\n\n");
    match parse_har_datetime(&entry.started_date_time) {
        Ok(started) => {
            let _ = writeln!(
                out,
                "- **Started:** {}",
                started.format("%Y-%m-%d %H:%M:%S%.3f UTC")
            );
        }
        Err(_) => {
            let _ = writeln!(out, "- **Started:** {}", entry.started_date_time);
        }
    }
    let _ = writeln!(
        out,
        "- **Status:** {} {}",
        response.status, response.status_text
    );
    let slow = if entry.time > 5000.0 {
        " (slow)"
    } else if entry.time > 2000.0 {
        " (sluggish)"
    } else {
        ""
    };
    let _ = writeln!(out, "- **Response Time:** {:.0}ms{}", entry.time, slow);
    let _ = writeln!(out, "- **Category:** {}", harscope_core::classify(entry));
    let _ = writeln!(out, "- **URL:** `{}`\n", request.url);

    if !request.headers.is_empty() {
        out.push_str("## Request Headers\n\n");
        for header in &request.headers {
            let _ = writeln!(out, "- `{}: {}`", header.name, header.value);
        }
        out.push('\n');
    }
    if let Some(post) = request.post_data.as_ref().filter(|p| !p.text.is_empty()) {
        let _ = writeln!(out, "## Request Body\n\n```\n{}\n```\n", post.text);
    }
    if !response.headers.is_empty() {
        out.push_str("## Response Headers\n\n");
        for header in &response.headers {
            let _ = writeln!(out, "- `{}: {}`", header.name, header.value);
        }
        out.push('\n');
    }

    out.push_str("## Reproduce\n\n```sh\n");
    out.push_str(&curl_command(entry));
    out.push_str("\n```\n");
    out
}

//! Plain-text rendering of the visible list and the timeline.

use std::fmt::Write as _;

use harscope_core::{classify, phase_segments, AppViewModel, Entry, Phase, TimelineProjection};
use harscope_engine::EntryStore;

const LABEL_WIDTH: usize = 32;

pub fn render_list(view: &AppViewModel, store: &EntryStore) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.summary_line());

    let counts: Vec<String> = view
        .category_counts
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(category, count)| format!("{category} {count}"))
        .collect();
    if !counts.is_empty() {
        let _ = writeln!(out, "{}", counts.join(" | "));
    }
    out.push('\n');

    for &position in &view.visible {
        let Some(entry) = store.entry(position) else {
            continue;
        };
        let _ = writeln!(out, "{}", list_row(position, &entry));
    }
    out
}

fn list_row(position: usize, entry: &Entry) -> String {
    let marker = if entry.is_error() { '!' } else { ' ' };
    format!(
        "{marker}{position:>5} {:>3} {:<7} {:>8.0}ms {:<8} {}",
        entry.response.status,
        entry.request.method,
        entry.time,
        classify(entry).as_str(),
        entry.request.url,
    )
}

pub fn render_timeline(projection: &TimelineProjection, store: &EntryStore) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "timeline: {} over {:.0}ms ({:?})",
        projection.rows.len(),
        projection.window_length_ms,
        projection.regime
    );

    for row in &projection.rows {
        let Some(entry) = store.entry(row.position) else {
            continue;
        };
        let _ = writeln!(
            out,
            "{} |{}{}",
            label(&entry.request.url),
            " ".repeat(row.offset),
            bar(&entry, row.width)
        );
    }

    let mut axis = vec![b' '; projection.chart_width + 8];
    for tick in &projection.ticks {
        for (i, byte) in tick.label.bytes().enumerate() {
            if let Some(slot) = axis.get_mut(tick.column + i) {
                *slot = byte;
            }
        }
    }
    let _ = writeln!(
        out,
        "{} |{}",
        " ".repeat(LABEL_WIDTH),
        String::from_utf8_lossy(&axis).trim_end()
    );
    out
}

fn label(url: &str) -> String {
    let tail: String = url
        .chars()
        .rev()
        .take(LABEL_WIDTH)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("{tail:>LABEL_WIDTH$}")
}

/// Bar of `width` columns drawn phase by phase; columns not covered by a
/// phase are drawn as generic duration.
fn bar(entry: &Entry, width: usize) -> String {
    let mut bar = String::with_capacity(width);
    for segment in phase_segments(entry, width) {
        let glyph = match segment.phase {
            Phase::Blocked => '-',
            Phase::Dns => 'd',
            Phase::Connect => 'c',
            Phase::Ssl => 's',
            Phase::Send => '>',
            Phase::Wait => '.',
            Phase::Receive => '#',
        };
        bar.extend(std::iter::repeat(glyph).take(segment.width));
    }
    let drawn = bar.chars().count();
    bar.extend(std::iter::repeat('=').take(width.saturating_sub(drawn)));
    bar
}

#[cfg(test)]
mod tests {
    use super::{bar, label, LABEL_WIDTH};
    use harscope_core::Entry;

    #[test]
    fn bar_fills_its_width() {
        let mut entry = Entry::default();
        entry.time = 100.0;
        entry.timings.wait = 50.0;
        entry.timings.receive = 50.0;
        assert_eq!(bar(&entry, 10), ".....#####");

        entry.time = 0.0;
        assert_eq!(bar(&entry, 4), "====");
    }

    #[test]
    fn label_keeps_the_end_of_long_urls() {
        let url = format!("https://example.com/{}", "a".repeat(40));
        let long = label(&url);
        assert_eq!(long.chars().count(), LABEL_WIDTH);
        assert!(long.ends_with("aaaa"));
        assert_eq!(label("x").trim_start(), "x");
    }
}

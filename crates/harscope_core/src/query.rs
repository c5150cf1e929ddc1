//! Filter/query engine: composes index lookups into the visible position list.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::category::{classify, Category, CategoryParseError};
use crate::entry::Entry;
use crate::index::{matches_text, EntryIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Filter-bar choices in display order, starting with `all`.
    pub fn choices() -> Vec<CategoryFilter> {
        std::iter::once(CategoryFilter::All)
            .chain(Category::ALL.into_iter().map(CategoryFilter::Only))
            .collect()
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(category) => category.fmt(f),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        s.parse().map(CategoryFilter::Only)
    }
}

/// User-controlled filter inputs. A plain value; the engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub text: String,
    pub category: CategoryFilter,
    pub errors_only: bool,
    pub sort_by_duration: bool,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_text_filter(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn set_category_filter(&mut self, category: CategoryFilter) {
        self.category = category;
    }

    pub fn toggle_errors_only(&mut self) {
        self.errors_only = !self.errors_only;
    }

    pub fn toggle_sort_by_duration(&mut self) {
        self.sort_by_duration = !self.sort_by_duration;
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Name for a filtered export of `original`, describing the active filters,
    /// e.g. `session_filtered_fetch_errors_only_20240102_030405.har`.
    pub fn export_filename(&self, original: &str, timestamp: NaiveDateTime) -> String {
        let base = match original.rfind('.') {
            Some(dot) => &original[..dot],
            None => original,
        };

        let mut parts = Vec::new();
        if let CategoryFilter::Only(category) = self.category {
            parts.push(category.to_string());
        }
        if !self.text.is_empty() {
            let cleaned: String = sanitize(&self.text).chars().take(20).collect();
            parts.push(format!("search_{cleaned}"));
        }
        if self.errors_only {
            parts.push("errors_only".to_string());
        }
        if self.sort_by_duration {
            parts.push("by_slowest".to_string());
        }

        let stamp = timestamp.format("%Y%m%d_%H%M%S");
        let name = if parts.is_empty() {
            format!("{base}_all_entries_{stamp}.har")
        } else {
            format!("{base}_filtered_{}_{stamp}.har", parts.join("_"))
        };
        collapse_underscores(&name)
    }
}

fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn collapse_underscores(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_underscore = false;
    for c in input.chars() {
        if c == '_' {
            if !prev_underscore {
                out.push(c);
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }
    out
}

/// Positions present in both lists, in `probe` order, keeping `probe`'s
/// duplicates. `probe` is the result of the filter being applied next and
/// `current` the list computed so far.
pub fn intersect(probe: &[usize], current: &[usize]) -> Vec<usize> {
    if probe.is_empty() || current.is_empty() {
        return Vec::new();
    }
    let members: HashSet<usize> = current.iter().copied().collect();
    probe
        .iter()
        .copied()
        .filter(|position| members.contains(position))
        .collect()
}

/// Computes the visible positions for `state`. Always a full recompute.
pub fn evaluate(state: &FilterState, entries: &[Entry], index: &EntryIndex) -> Vec<usize> {
    let mut result = match state.category {
        CategoryFilter::All => (0..entries.len()).collect(),
        CategoryFilter::Only(category) => index.get_by_category(category),
    };

    if state.errors_only {
        result = intersect(&index.error_positions(entries), &result);
    }

    if !state.text.is_empty() {
        result = intersect(&index.text_matches(entries, &state.text), &result);
    }

    if state.sort_by_duration {
        sort_slowest_first(&mut result, entries);
    }

    result
}

/// Reference evaluation by a single linear scan, without the index.
pub fn evaluate_naive(state: &FilterState, entries: &[Entry]) -> Vec<usize> {
    let needle = state.text.to_lowercase();
    let mut result: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| !state.errors_only || entry.is_error())
        .filter(|(_, entry)| needle.is_empty() || matches_text(entry, &needle))
        .filter(|(_, entry)| match state.category {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => classify(entry) == category,
        })
        .map(|(position, _)| position)
        .collect();

    if state.sort_by_duration {
        sort_slowest_first(&mut result, entries);
    }
    result
}

fn sort_slowest_first(positions: &mut [usize], entries: &[Entry]) {
    // Stable: equal durations keep their prior order.
    positions.sort_by(|a, b| entries[*b].time.total_cmp(&entries[*a].time));
}

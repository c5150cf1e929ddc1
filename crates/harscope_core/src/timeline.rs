//! Timeline projection: lays the visible entries out on a fixed number of
//! columns. A pure function of the filtered set and the chart width.

use chrono::{DateTime, Duration, Utc};

use crate::datetime::parse_har_datetime;
use crate::entry::{Entry, Timings};

pub const TICK_COUNT: usize = 11;
/// Windows at or below this length put every bar at offset 0.
pub const COLLAPSED_WINDOW_MS: f64 = 100.0;
/// Windows above this length stagger bars by row instead of by time.
pub const STAGGERED_WINDOW_MS: f64 = 10_000.0;
const STAGGER_STEP: usize = 2;
const MIN_PRIMARY_WIDTH: f64 = 5.0;
const RESCALE_MIN_DURATION_MS: f64 = 20.0;
const RESCALE_FACTOR: f64 = 0.8;
const MIN_WIDTH_LONG: usize = 3;
const MIN_WIDTH_SHORT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// Window too short to spread out; all bars start at column 0.
    Collapsed,
    /// Offsets proportional to start time within the window.
    TimeScaled,
    /// Offsets follow render order as a staircase.
    Staggered,
}

impl Regime {
    fn for_window(length_ms: f64) -> Self {
        if length_ms <= COLLAPSED_WINDOW_MS {
            Regime::Collapsed
        } else if length_ms > STAGGERED_WINDOW_MS {
            Regime::Staggered
        } else {
            Regime::TimeScaled
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Blocked,
    Dns,
    Connect,
    Ssl,
    Send,
    Wait,
    Receive,
}

impl Phase {
    pub const ORDER: [Phase; 7] = [
        Phase::Blocked,
        Phase::Dns,
        Phase::Connect,
        Phase::Ssl,
        Phase::Send,
        Phase::Wait,
        Phase::Receive,
    ];

    fn duration(self, timings: &Timings) -> f64 {
        match self {
            Phase::Blocked => timings.blocked,
            Phase::Dns => timings.dns,
            Phase::Connect => timings.connect,
            Phase::Ssl => timings.ssl,
            Phase::Send => timings.send,
            Phase::Wait => timings.wait,
            Phase::Receive => timings.receive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSegment {
    pub phase: Phase,
    pub width: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineRow {
    pub position: usize,
    /// `None` when the timestamp did not parse; such rows sort last.
    pub start: Option<DateTime<Utc>>,
    pub duration_ms: f64,
    pub offset: usize,
    pub width: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub column: usize,
    pub elapsed_ms: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineProjection {
    pub chart_width: usize,
    /// Earliest parsed start among the rows, if any parsed.
    pub window_start: Option<DateTime<Utc>>,
    pub window_length_ms: f64,
    pub regime: Regime,
    /// Rows in render order: by start time, unparseable last.
    pub rows: Vec<TimelineRow>,
    pub ticks: Vec<Tick>,
}

impl TimelineProjection {
    pub fn row(&self, position: usize) -> Option<&TimelineRow> {
        self.rows.iter().find(|row| row.position == position)
    }
}

/// Projects `positions` onto `chart_width` columns. Zero-duration entries and
/// positions beyond `entries` are dropped.
pub fn project(entries: &[Entry], positions: &[usize], chart_width: usize) -> TimelineProjection {
    let mut rows: Vec<TimelineRow> = positions
        .iter()
        .filter_map(|&position| {
            let entry = entries.get(position)?;
            (entry.time > 0.0).then(|| TimelineRow {
                position,
                start: parse_har_datetime(&entry.started_date_time).ok(),
                duration_ms: entry.time,
                offset: 0,
                width: 0,
            })
        })
        .collect();

    let (window_start, window_length_ms) = window(&rows);
    let regime = Regime::for_window(window_length_ms);
    let max_duration = rows.iter().map(|row| row.duration_ms).fold(0.0, f64::max);

    // Stable sort keeps the filtered order among equal and unparseable starts.
    rows.sort_by(|a, b| match (a.start, b.start) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    for (render_index, row) in rows.iter_mut().enumerate() {
        row.offset = match (regime, window_start, row.start) {
            (Regime::Collapsed, _, _) => 0,
            (Regime::Staggered, _, _) => staggered_offset(render_index, chart_width),
            (Regime::TimeScaled, Some(earliest), Some(start)) => {
                let relative = elapsed_ms(earliest, start);
                scale(chart_width as f64 * relative / window_length_ms)
            }
            // Unparseable start: fall back to the left edge.
            (Regime::TimeScaled, _, _) => 0,
        }
        .min(chart_width);
        row.width = bar_width(row.duration_ms, window_length_ms, max_duration, chart_width);
    }

    TimelineProjection {
        chart_width,
        window_start,
        window_length_ms,
        regime,
        rows,
        ticks: ticks(window_length_ms, chart_width),
    }
}

fn window(rows: &[TimelineRow]) -> (Option<DateTime<Utc>>, f64) {
    let mut earliest: Option<DateTime<Utc>> = None;
    let mut latest: Option<DateTime<Utc>> = None;
    for row in rows {
        let Some(start) = row.start else {
            continue;
        };
        // Durations past chrono's range leave the bounds to the other rows.
        let Some(end) =
            start.checked_add_signed(Duration::microseconds((row.duration_ms * 1000.0).round() as i64))
        else {
            continue;
        };
        earliest = Some(earliest.map_or(start, |current| current.min(start)));
        latest = Some(latest.map_or(end, |current| current.max(end)));
    }
    match (earliest, latest) {
        (Some(earliest), Some(latest)) => (Some(earliest), elapsed_ms(earliest, latest)),
        _ => (None, 0.0),
    }
}

fn elapsed_ms(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_microseconds().unwrap_or(i64::MAX) as f64 / 1000.0
}

fn scale(value: f64) -> usize {
    if value.is_finite() && value > 0.0 {
        value.round() as usize
    } else {
        0
    }
}

fn staggered_offset(render_index: usize, chart_width: usize) -> usize {
    let span = chart_width / 6;
    if span == 0 {
        return 0;
    }
    ((render_index % span) * STAGGER_STEP).min(chart_width / 3)
}

/// Bar width in columns for one entry; never less than 1.
pub fn bar_width(duration_ms: f64, window_ms: f64, max_duration_ms: f64, chart_width: usize) -> usize {
    let columns = chart_width as f64;

    if window_ms <= 0.0 {
        if max_duration_ms <= 0.0 || duration_ms <= 0.0 {
            return 1;
        }
        return scale(columns * duration_ms / max_duration_ms).clamp(1, chart_width.max(1));
    }

    let primary = columns * duration_ms / window_ms;
    let width = if primary < MIN_PRIMARY_WIDTH
        && duration_ms > RESCALE_MIN_DURATION_MS
        && max_duration_ms > 0.0
    {
        let rescaled = scale(columns * RESCALE_FACTOR * duration_ms / max_duration_ms);
        if rescaled < MIN_WIDTH_LONG && duration_ms > COLLAPSED_WINDOW_MS {
            MIN_WIDTH_LONG
        } else if rescaled < MIN_WIDTH_SHORT {
            MIN_WIDTH_SHORT
        } else {
            rescaled
        }
    } else {
        scale(primary)
    };
    width.clamp(1, chart_width.max(1))
}

/// Splits a bar of `width` columns into timing phases. Every non-empty phase
/// gets at least one column while room remains.
pub fn phase_segments(entry: &Entry, width: usize) -> Vec<PhaseSegment> {
    if entry.time <= 0.0 {
        return Vec::new();
    }
    let mut used = 0;
    let mut segments = Vec::new();
    for phase in Phase::ORDER {
        let duration = phase.duration(&entry.timings);
        if duration <= 0.0 {
            continue;
        }
        let share = ((width as f64 * duration / entry.time) as usize).max(1);
        let share = share.min(width - used);
        if share == 0 {
            break;
        }
        used += share;
        segments.push(PhaseSegment { phase, width: share });
    }
    segments
}

/// Eleven ticks on a log10 axis spanning the window.
pub fn ticks(window_ms: f64, chart_width: usize) -> Vec<Tick> {
    let log_max = (window_ms.max(0.0) + 1.0).log10();
    (0..TICK_COUNT)
        .map(|k| {
            let progress = k as f64 / (TICK_COUNT - 1) as f64;
            let elapsed_ms = 10f64.powf(progress * log_max) - 1.0;
            Tick {
                column: (chart_width as f64 * progress) as usize,
                elapsed_ms,
                label: format_elapsed(elapsed_ms),
            }
        })
        .collect()
}

/// `250` below one second, `1.5s` above.
pub fn format_elapsed(ms: f64) -> String {
    if ms < 1000.0 {
        format!("{ms:.0}")
    } else {
        format!("{:.1}s", ms / 1000.0)
    }
}

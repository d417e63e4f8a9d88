//! Timeline projector
//!
//! Turns a configuration, its persisted rotation index and `now` into a bounded
//! list of timed entries plus the index the caller must persist for the next
//! projection to continue the cycle.

use std::time::Duration;

use vela_core::{DisplayConfig, RotationContent, Timestamp};

use crate::{TimelineConfig, MIN_INTERVAL};

/// One scheduled display change
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimelineEntry {
    pub activate_at: Timestamp,
    pub text: String,
    /// Rotation slot the text came from
    pub index: u64,
}

/// When the host should ask for a new projection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Refresh {
    At(Timestamp),
    /// Nothing changes until the configuration does
    Never,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Projection {
    pub entries: Vec<TimelineEntry>,
    pub next_index: u64,
    pub refresh: Refresh,
}

impl Projection {
    /// A schedule that shows `text` from `now` on and never changes
    pub fn fixed(now: Timestamp, text: &str, index: u64) -> Self {
        Projection {
            entries: vec![TimelineEntry {
                activate_at: now,
                text: text.to_owned(),
                index,
            }],
            next_index: index,
            refresh: Refresh::Never,
        }
    }

    /// Entry visible at `t`, if the projection covers it
    pub fn entry_at(&self, t: Timestamp) -> Option<&TimelineEntry> {
        self.entries.iter().rev().find(|e| e.activate_at <= t)
    }
}

/// Rotation interval actually used: at least one second
pub fn effective_interval(secs: f64) -> Duration {
    if !secs.is_finite() || secs <= MIN_INTERVAL.as_secs_f64() {
        return MIN_INTERVAL;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// Project a display configuration with the default horizon
pub fn project(cfg: &DisplayConfig, now: Timestamp) -> Projection {
    project_with(cfg, now, &TimelineConfig::default())
}

/// Project a display configuration
///
/// Slot 0 is the primary text, followed by the rotation texts. Without rotation
/// texts the result is a single entry that never needs refreshing.
pub fn project_with(cfg: &DisplayConfig, now: Timestamp, config: &TimelineConfig) -> Projection {
    if !cfg.rotates() {
        return Projection::fixed(now, &cfg.primary_text, cfg.rotation_index);
    }

    let slots: Vec<&str> = std::iter::once(cfg.primary_text.as_str())
        .chain(cfg.rotation_texts.iter().map(String::as_str))
        .collect();

    project_slots(
        &slots,
        cfg.rotation_index,
        effective_interval(cfg.rotation_interval_secs),
        now,
        config,
    )
}

/// Project rotation content; `fallback` is shown when there are no items
pub fn project_content(
    content: &RotationContent,
    fallback: &str,
    start_index: u64,
    now: Timestamp,
    config: &TimelineConfig,
) -> Projection {
    let slots: Vec<&str> = content.texts().collect();
    match slots.len() {
        0 => Projection::fixed(now, fallback, start_index),
        1 => Projection::fixed(now, slots[0], start_index),
        _ => project_slots(
            &slots,
            start_index,
            effective_interval(content.rotation_interval_secs),
            now,
            config,
        ),
    }
}

fn project_slots(
    slots: &[&str],
    start_index: u64,
    interval: Duration,
    now: Timestamp,
    config: &TimelineConfig,
) -> Projection {
    let n = slots.len() as u64;
    let end = now + config.horizon;
    let cap = config.max_entries.max(1);

    let mut entries = Vec::new();
    let mut index = start_index % n;
    let mut at = now;

    // First entry is always emitted, even for a zero horizon
    while entries.len() < cap && (entries.is_empty() || at < end) {
        entries.push(TimelineEntry {
            activate_at: at,
            text: slots[index as usize].to_owned(),
            index,
        });
        index = (index + 1) % n;

        let next = at + interval;
        if next == at {
            break;
        }
        at = next;
    }

    // Cut short by the cap: ask again when the next slot is due
    let refresh = if at < end { at } else { end };
    Projection {
        entries,
        next_index: index,
        refresh: Refresh::At(refresh),
    }
}

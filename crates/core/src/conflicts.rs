//! Conflict detection and overlap layout
//!
//! Two non-all-day events conflict iff their half-open intervals
//! overlap; back-to-back events sharing a boundary do not. The layout
//! pass assigns a column and total-column count so overlapping events
//! can render side by side deterministically.

use std::collections::HashMap;

use serde::Serialize;

use cadence_domain::CalendarEvent;

/// Deterministic rendering position for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventLayout {
    pub event_id: String,
    /// Zero-based column index.
    pub column: usize,
    /// Width of the concurrency group this event renders within.
    pub total_columns: usize,
}

/// Build the pairwise conflict map for a set of events.
///
/// Every non-all-day event gets an entry; the value lists the ids of
/// events it overlaps. The map is symmetric by construction. All-day
/// events never participate.
pub fn detect_conflicts(events: &[CalendarEvent]) -> HashMap<String, Vec<String>> {
    let timed: Vec<&CalendarEvent> = events.iter().filter(|event| !event.is_all_day).collect();

    let mut conflicts: HashMap<String, Vec<String>> =
        timed.iter().map(|event| (event.id.clone(), Vec::new())).collect();

    for (i, a) in timed.iter().enumerate() {
        for b in timed.iter().skip(i + 1) {
            if a.overlaps_with(b) {
                if let Some(list) = conflicts.get_mut(&a.id) {
                    list.push(b.id.clone());
                }
                if let Some(list) = conflicts.get_mut(&b.id) {
                    list.push(a.id.clone());
                }
            }
        }
    }

    conflicts
}

/// Assign columns to a day's events for side-by-side rendering.
///
/// Two passes, both required:
/// 1. Greedy placement: events sorted by start go into the first
///    column whose most recent occupant has already ended; otherwise a
///    new column opens.
/// 2. Widening: each event's `total_columns` becomes one more than the
///    highest column index among the events overlapping it, so a short
///    early meeting that overlaps several staggered later ones is
///    still rendered at the full concurrency width. The first pass
///    alone undercounts staggered (not fully nested) overlaps.
///
/// All-day events always get column 0 with a single-column width.
pub fn layout_overlaps(events: &[CalendarEvent]) -> Vec<EventLayout> {
    let mut sorted: Vec<&CalendarEvent> = events.iter().filter(|event| !event.is_all_day).collect();
    sorted.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)).then(a.id.cmp(&b.id)));

    // Pass 1: greedy first-fit placement.
    let mut column_of: HashMap<&str, usize> = HashMap::new();
    let mut column_ends: Vec<chrono::DateTime<chrono::Utc>> = Vec::new();
    for event in &sorted {
        let slot = column_ends.iter().position(|end| *end <= event.start);
        let column = match slot {
            Some(column) => {
                column_ends[column] = event.end;
                column
            }
            None => {
                column_ends.push(event.end);
                column_ends.len() - 1
            }
        };
        column_of.insert(event.id.as_str(), column);
    }

    // Pass 2: widen each event to the deepest overlap level touching it.
    let mut layouts: HashMap<&str, EventLayout> = HashMap::new();
    for event in &sorted {
        let own = column_of[event.id.as_str()];
        let deepest = sorted
            .iter()
            .filter(|other| event.overlaps_with(other))
            .map(|other| column_of[other.id.as_str()])
            .max()
            .unwrap_or(own)
            .max(own);
        layouts.insert(
            event.id.as_str(),
            EventLayout { event_id: event.id.clone(), column: own, total_columns: deepest + 1 },
        );
    }

    // Emit in the caller's order; all-day events stay at column zero.
    events
        .iter()
        .map(|event| {
            if event.is_all_day {
                EventLayout { event_id: event.id.clone(), column: 0, total_columns: 1 }
            } else {
                layouts
                    .get(event.id.as_str())
                    .cloned()
                    .unwrap_or_else(|| EventLayout {
                        event_id: event.id.clone(),
                        column: 0,
                        total_columns: 1,
                    })
            }
        })
        .collect()
}

// src/history/timeline.rs
//! Fills the per-event timeline with unlock boundaries and extends it to coverage end.
//!
//! Unlocks are purely time driven, so a wallet with no activity on an unlock
//! day still needs a point there for the locked curve to step down.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use super::types::TimelinePoint;
use crate::vesting::ScheduleSet;

/// Insert unlock-boundary points, append a coverage-end point and sort.
///
/// Without schedules the timeline is only extended, never reordered. With
/// schedules, boundaries are enumerated up to `coverage_end` (or to full
/// unlock when the archive has no end date).
pub fn extend_timeline(
    mut timeline: Vec<TimelinePoint>,
    schedules: &ScheduleSet,
    coverage_end: Option<DateTime<Utc>>,
) -> Vec<TimelinePoint> {
    let Some(last) = timeline.last().cloned() else {
        return timeline;
    };

    if schedules.is_empty() {
        if let Some(end) = coverage_end {
            if end > last.date {
                timeline.push(last.carried_to(end, last.locked));
            }
        }
        return timeline;
    }

    // Stable, so points sharing a timestamp keep replay order
    timeline.sort_by_key(|p| p.date);

    let until = coverage_end.unwrap_or(DateTime::<Utc>::MAX_UTC);
    let boundaries: BTreeSet<DateTime<Utc>> = schedules
        .iter()
        .flat_map(|s| s.unlock_boundaries(until))
        .collect();

    let mut synthetic = Vec::new();
    for boundary in boundaries {
        let idx = timeline.partition_point(|p| p.date < boundary);
        if timeline.get(idx).is_some_and(|p| p.date == boundary) {
            continue;
        }
        // Carry from the latest event before the boundary; ties go to the last replayed
        let Some(base) = idx.checked_sub(1).and_then(|i| timeline.get(i)) else {
            continue;
        };
        synthetic.push(base.carried_to(boundary, schedules.total_locked(boundary)));
    }
    log::debug!("Inserted {} unlock points", synthetic.len());

    timeline.extend(synthetic);
    timeline.sort_by_key(|p| p.date);

    if let Some(end) = coverage_end {
        if let Some(base) = timeline.last().cloned() {
            if end > base.date {
                timeline.push(base.carried_to(end, schedules.total_locked(end)));
            }
        }
    }
    timeline
}

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::Serialize;

use crate::models::{wall_clock, AvailabilitySlot, DayOfWeek};

use super::clock::{TimeZoneClock, WeekSpan};

/// A concrete day and time range, in the zone of whoever asked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub day_of_week: DayOfWeek,
    #[serde(with = "wall_clock")]
    pub start_time: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end_time: NaiveTime,
}

impl Window {
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start_time <= time && time < self.end_time
    }
}

/// An overlapping window together with its position on the canonical week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    pub window: Window,
    pub span: WeekSpan,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WindowFilter {
    pub day: Option<DayOfWeek>,
    /// Wall-clock time in the first user's zone that the window must contain.
    pub time: Option<NaiveTime>,
}

/// Every window in which both users are available, expressed in `zone_a`.
///
/// Sorted by weekday (Monday first) then start time.
pub fn intersect(
    clock: &TimeZoneClock,
    slots_a: &[AvailabilitySlot],
    zone_a: Tz,
    slots_b: &[AvailabilitySlot],
    zone_b: Tz,
    filter: WindowFilter,
) -> Vec<Overlap> {
    let spans_b: Vec<WeekSpan> = slots_b
        .iter()
        .map(|s| clock.span(s.day_of_week, s.start_time, s.end_time, zone_b))
        .collect();

    let mut overlaps = Vec::new();
    for slot_a in slots_a {
        let span_a = clock.span(slot_a.day_of_week, slot_a.start_time, slot_a.end_time, zone_a);
        for span_b in &spans_b {
            let Some(span) = span_a.intersection(span_b) else {
                continue;
            };
            let (day_of_week, start_time, end_time) = clock.local_window(&span, zone_a);
            let window = Window { day_of_week, start_time, end_time };

            if filter.day.is_some_and(|day| day != window.day_of_week) {
                continue;
            }
            if filter.time.is_some_and(|time| !window.contains(time)) {
                continue;
            }
            overlaps.push(Overlap { window, span });
        }
    }

    overlaps.sort_by_key(|o| (o.window.day_of_week, o.window.start_time));
    overlaps
}

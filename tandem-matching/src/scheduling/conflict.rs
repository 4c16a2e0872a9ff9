use std::fmt;

use serde::Serialize;

use tandem_shared::errors::AppResult;

use crate::models::{Booking, Meeting};

use super::clock::{parse_zone, TimeZoneClock, WeekSpan};

/// An existing meeting placed on the canonical week.
#[derive(Debug, Clone)]
pub struct PlacedMeeting {
    pub meeting: Meeting,
    pub span: WeekSpan,
}

/// Which participant of a proposed meeting is already busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSide {
    Requester,
    Target,
    Both,
}

impl fmt::Display for ConflictSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictSide::Requester => write!(f, "requester"),
            ConflictSide::Target => write!(f, "target"),
            ConflictSide::Both => write!(f, "both"),
        }
    }
}

/// Places bookings on the canonical week using each creator's current home zone.
pub fn place_bookings(clock: &TimeZoneClock, bookings: &[Booking]) -> AppResult<Vec<PlacedMeeting>> {
    bookings
        .iter()
        .map(|b| {
            let zone = parse_zone(&b.creator_time_zone)?;
            let m = &b.meeting;
            Ok(PlacedMeeting {
                meeting: m.clone(),
                span: clock.span(m.day_of_week, m.start_time, m.end_time, zone),
            })
        })
        .collect()
}

/// True if any meeting involving `user_id` overlaps `window`. Meetings that merely touch
/// the window's edges do not count.
pub fn has_conflict(user_id: i32, window: &WeekSpan, existing: &[PlacedMeeting]) -> bool {
    existing
        .iter()
        .filter(|p| p.meeting.involves(user_id))
        .any(|p| p.span.overlaps(window))
}

pub fn conflicting_side(
    requester_id: i32,
    target_id: i32,
    window: &WeekSpan,
    existing: &[PlacedMeeting],
) -> Option<ConflictSide> {
    match (
        has_conflict(requester_id, window, existing),
        has_conflict(target_id, window, existing),
    ) {
        (true, true) => Some(ConflictSide::Both),
        (true, false) => Some(ConflictSide::Requester),
        (false, true) => Some(ConflictSide::Target),
        (false, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DayOfWeek;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use chrono_tz::Tz;
    use tandem_shared::errors::ErrorCode;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn clock() -> TimeZoneClock {
        TimeZoneClock::for_week_of(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap())
    }

    fn booking(user1: i32, user2: i32, day: DayOfWeek, start: NaiveTime, end: NaiveTime, zone: &str) -> Booking {
        Booking {
            meeting: Meeting {
                id: 1,
                user1_id: user1,
                user2_id: user2,
                day_of_week: day,
                start_time: start,
                end_time: end,
                created_at: Utc::now(),
            },
            creator_time_zone: zone.to_string(),
        }
    }

    #[test]
    fn overlapping_meeting_conflicts() {
        let placed = place_bookings(
            &clock(),
            &[booking(1, 3, DayOfWeek::Monday, t(10, 0), t(11, 0), "UTC")],
        )
        .unwrap();
        let window = clock().span(DayOfWeek::Monday, t(10, 30), t(12, 0), Tz::UTC);
        assert!(has_conflict(1, &window, &placed));
        assert!(has_conflict(3, &window, &placed));
        assert!(!has_conflict(2, &window, &placed));
    }

    #[test]
    fn touching_boundaries_do_not_conflict() {
        let placed = place_bookings(
            &clock(),
            &[booking(1, 3, DayOfWeek::Monday, t(10, 0), t(11, 0), "UTC")],
        )
        .unwrap();
        let after = clock().span(DayOfWeek::Monday, t(11, 0), t(12, 0), Tz::UTC);
        let before = clock().span(DayOfWeek::Monday, t(9, 0), t(10, 0), Tz::UTC);
        assert!(!has_conflict(1, &after, &placed));
        assert!(!has_conflict(1, &before, &placed));
    }

    #[test]
    fn other_day_does_not_conflict() {
        let placed = place_bookings(
            &clock(),
            &[booking(1, 3, DayOfWeek::Tuesday, t(10, 0), t(11, 0), "UTC")],
        )
        .unwrap();
        let window = clock().span(DayOfWeek::Monday, t(10, 0), t(11, 0), Tz::UTC);
        assert!(!has_conflict(1, &window, &placed));
    }

    #[test]
    fn meetings_are_placed_in_creator_zone() {
        // Created by a New York user at 09:00-10:00 their time: 14:00-15:00 UTC.
        let placed = place_bookings(
            &clock(),
            &[booking(5, 1, DayOfWeek::Monday, t(9, 0), t(10, 0), "America/New_York")],
        )
        .unwrap();
        let utc_afternoon = clock().span(DayOfWeek::Monday, t(14, 30), t(15, 30), Tz::UTC);
        let utc_morning = clock().span(DayOfWeek::Monday, t(9, 0), t(10, 0), Tz::UTC);
        assert!(has_conflict(1, &utc_afternoon, &placed));
        assert!(!has_conflict(1, &utc_morning, &placed));
    }

    #[test]
    fn invalid_creator_zone_fails_closed() {
        let err = place_bookings(
            &clock(),
            &[booking(5, 1, DayOfWeek::Monday, t(9, 0), t(10, 0), "Nowhere/Land")],
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidTimeZone);
    }

    #[test]
    fn reports_the_busy_side() {
        let placed = place_bookings(
            &clock(),
            &[
                booking(1, 7, DayOfWeek::Monday, t(10, 0), t(11, 0), "UTC"),
                booking(2, 8, DayOfWeek::Monday, t(13, 0), t(14, 0), "UTC"),
            ],
        )
        .unwrap();
        let morning = clock().span(DayOfWeek::Monday, t(10, 0), t(11, 0), Tz::UTC);
        let afternoon = clock().span(DayOfWeek::Monday, t(13, 0), t(14, 0), Tz::UTC);
        let all_day = clock().span(DayOfWeek::Monday, t(9, 0), t(17, 0), Tz::UTC);
        let evening = clock().span(DayOfWeek::Monday, t(18, 0), t(19, 0), Tz::UTC);

        assert_eq!(conflicting_side(1, 2, &morning, &placed), Some(ConflictSide::Requester));
        assert_eq!(conflicting_side(1, 2, &afternoon, &placed), Some(ConflictSide::Target));
        assert_eq!(conflicting_side(1, 2, &all_day, &placed), Some(ConflictSide::Both));
        assert_eq!(conflicting_side(1, 2, &evening, &placed), None);
    }
}

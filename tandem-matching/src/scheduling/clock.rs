//! Wall-clock ↔ canonical-week conversion.
//!
//! A [`CanonicalPoint`] is a number of seconds since Monday 00:00 UTC of a reference week,
//! kept in `[0, WEEK_SECS)`. Points from different zones can be compared directly. Offsets
//! are looked up in the tz database for the concrete instant inside the reference week, so
//! a zone observing daylight saving converts with the offset actually in force that week.
//!
//! Day rollover is carried: 22:00 Sunday in New York becomes 03:00 Monday on the canonical
//! week, not 03:00 Sunday.

use std::fmt;

use chrono::{Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use tandem_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{seconds_of_day, DayOfWeek};

pub const DAY_SECS: i64 = 86_400;
pub const WEEK_SECS: i64 = 7 * DAY_SECS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalPoint(i64);

impl CanonicalPoint {
    pub fn from_secs(secs: i64) -> Self {
        Self(secs.rem_euclid(WEEK_SECS))
    }

    pub fn secs(self) -> i64 {
        self.0
    }
}

/// Half-open interval `[start, end)` on the canonical week. `end` may run past `WEEK_SECS`
/// when the interval wraps from Sunday into Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekSpan {
    start: i64,
    end: i64,
}

impl WeekSpan {
    pub fn new(start: CanonicalPoint, duration_secs: i64) -> Self {
        Self {
            start: start.secs(),
            end: start.secs() + duration_secs.max(0),
        }
    }

    pub fn start(&self) -> CanonicalPoint {
        CanonicalPoint(self.start)
    }

    pub fn end(&self) -> CanonicalPoint {
        CanonicalPoint::from_secs(self.end)
    }

    pub fn duration_secs(&self) -> i64 {
        self.end - self.start
    }

    /// Common part of two spans, accounting for the week wrap. Spans that only touch
    /// do not intersect.
    pub fn intersection(&self, other: &WeekSpan) -> Option<WeekSpan> {
        [-WEEK_SECS, 0, WEEK_SECS].into_iter().find_map(|shift| {
            let start = self.start.max(other.start + shift);
            let end = self.end.min(other.end + shift);
            (start < end).then(|| WeekSpan::new(CanonicalPoint::from_secs(start), end - start))
        })
    }

    pub fn overlaps(&self, other: &WeekSpan) -> bool {
        self.intersection(other).is_some()
    }
}

impl fmt::Display for WeekSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Resolves an IANA zone name. Unknown names are rejected rather than treated as UTC.
pub fn parse_zone(name: &str) -> AppResult<Tz> {
    name.trim().parse::<Tz>().map_err(|_| {
        AppError::with_details(
            ErrorCode::InvalidTimeZone,
            format!("unrecognized time zone '{name}'"),
            serde_json::json!({ "time_zone": name }),
        )
    })
}

/// Converts between zone-local weekly wall-clock times and the canonical week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeZoneClock {
    week_start: NaiveDate,
}

impl TimeZoneClock {
    /// Clock anchored on the Monday of the week containing `date`.
    pub fn for_week_of(date: NaiveDate) -> Self {
        let back = i64::from(date.weekday().num_days_from_monday());
        Self {
            week_start: date - Duration::days(back),
        }
    }

    /// Clock anchored on the current UTC week.
    pub fn current() -> Self {
        Self::for_week_of(Utc::now().date_naive())
    }

    pub fn week_start(&self) -> NaiveDate {
        self.week_start
    }

    fn local_datetime(&self, day: DayOfWeek, time: NaiveTime) -> NaiveDateTime {
        (self.week_start + Duration::days(i64::from(day.index()))).and_time(time)
    }

    fn week_origin_utc(&self) -> NaiveDateTime {
        self.week_start.and_time(NaiveTime::MIN)
    }

    pub fn to_canonical(&self, day: DayOfWeek, time: NaiveTime, zone: Tz) -> CanonicalPoint {
        let local = self.local_datetime(day, time);
        let offset_secs = match zone.offset_from_local_datetime(&local) {
            LocalResult::Single(offset) => offset.fix().local_minus_utc(),
            LocalResult::Ambiguous(earliest, _) => earliest.fix().local_minus_utc(),
            // Spring-forward gap: use the offset in force just before the jump.
            LocalResult::None => {
                let before = local - Duration::hours(3);
                zone.offset_from_local_datetime(&before)
                    .earliest()
                    .unwrap_or_else(|| zone.offset_from_utc_datetime(&before))
                    .fix()
                    .local_minus_utc()
            }
        };
        let utc = local - Duration::seconds(i64::from(offset_secs));
        CanonicalPoint::from_secs((utc - self.week_origin_utc()).num_seconds())
    }

    pub fn from_canonical(&self, point: CanonicalPoint, zone: Tz) -> (DayOfWeek, NaiveTime) {
        let utc = self.week_origin_utc() + Duration::seconds(point.secs());
        let local = zone.from_utc_datetime(&utc).naive_local();
        (DayOfWeek::from(local.weekday()), local.time())
    }

    /// Places a same-day local interval on the canonical week.
    pub fn span(&self, day: DayOfWeek, start: NaiveTime, end: NaiveTime, zone: Tz) -> WeekSpan {
        let duration = seconds_of_day(&end) - seconds_of_day(&start);
        WeekSpan::new(self.to_canonical(day, start, zone), duration)
    }

    /// Expresses a canonical span as a local day and start/end wall-clock times in `zone`.
    pub fn local_window(&self, span: &WeekSpan, zone: Tz) -> (DayOfWeek, NaiveTime, NaiveTime) {
        let (day, start) = self.from_canonical(span.start(), zone);
        let (_, end) = self.from_canonical(span.end(), zone);
        (day, start, end)
    }
}

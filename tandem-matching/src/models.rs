use std::fmt;
use std::io::Write;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::schema::{friendships, interests, meetings, user_accounts, user_availability, user_profiles};

// --- DayOfWeek ---

/// Weekday label of a recurring slot or meeting. Ordered Monday first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[serde(try_from = "String")]
#[diesel(sql_type = Text)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    /// Days since Monday (Monday = 0).
    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn from_index(index: u32) -> Self {
        Self::ALL[(index % 7) as usize]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayOfWeek {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| {
                let name = d.as_str().to_lowercase();
                name == lower || (lower.len() == 3 && name.starts_with(&lower))
            })
            .ok_or_else(|| format!("unknown day of week: {s}"))
    }
}

impl TryFrom<String> for DayOfWeek {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<chrono::Weekday> for DayOfWeek {
    fn from(w: chrono::Weekday) -> Self {
        Self::from_index(w.num_days_from_monday())
    }
}

impl ToSql<Text, Pg> for DayOfWeek {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for DayOfWeek {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Ok(raw.parse()?)
    }
}

/// `HH:MM` wall-clock serialization. Input also tolerates `HH:MM:SS`.
pub mod wall_clock {
    use chrono::{NaiveTime, Timelike};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<NaiveTime, String> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .map_err(|_| format!("invalid time of day '{raw}', expected HH:MM"))
    }

    pub fn format(time: &NaiveTime) -> String {
        if time.second() == 0 {
            time.format("%H:%M").to_string()
        } else {
            time.format("%H:%M:%S").to_string()
        }
    }
}

// --- Account ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone, PartialEq)]
#[diesel(table_name = user_accounts)]
pub struct Account {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
}

impl Account {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// --- Profile ---

pub const DEFAULT_TIME_ZONE: &str = "UTC";

#[derive(Debug, Queryable, Identifiable, Serialize, Clone, PartialEq)]
#[diesel(table_name = user_profiles)]
pub struct Profile {
    pub id: i32,
    pub native_language: Option<String>,
    pub target_language: Option<String>,
    pub target_language_proficiency: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub profession: Option<String>,
    pub mbti: Option<String>,
    pub zodiac: Option<String>,
    pub home_time_zone: String,
    pub visibility: String,
}

impl Profile {
    /// Bare profile in the default zone with nothing filled in.
    pub fn new(id: i32) -> Self {
        Self {
            id,
            native_language: None,
            target_language: None,
            target_language_proficiency: None,
            age: None,
            gender: None,
            profession: None,
            mbti: None,
            zodiac: None,
            home_time_zone: DEFAULT_TIME_ZONE.to_string(),
            visibility: "Show".to_string(),
        }
    }
}

// --- Interest ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone, PartialEq)]
#[diesel(table_name = interests)]
pub struct Interest {
    pub id: i32,
    #[serde(rename = "name")]
    pub interest_name: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = interests)]
pub struct NewInterest<'a> {
    pub interest_name: &'a str,
}

// --- Friendship ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = friendships)]
pub struct Friendship {
    pub id: i32,
    pub user_id_1: i32,
    pub user_id_2: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = friendships)]
pub struct NewFriendship {
    pub user_id_1: i32,
    pub user_id_2: i32,
}

impl NewFriendship {
    /// Stores the pair with the lower id first so each friendship has one row.
    pub fn canonical(a: i32, b: i32) -> Self {
        let (user_id_1, user_id_2) = if a < b { (a, b) } else { (b, a) };
        Self { user_id_1, user_id_2 }
    }
}

// --- AvailabilitySlot ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone, PartialEq)]
#[diesel(table_name = user_availability)]
pub struct AvailabilitySlot {
    pub id: i32,
    pub user_id: i32,
    pub day_of_week: DayOfWeek,
    #[serde(with = "wall_clock")]
    pub start_time: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end_time: NaiveTime,
}

/// A slot as submitted by its owner, before it has an id.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Validate)]
#[validate(schema(function = "validate_slot_bounds"))]
pub struct SlotInput {
    pub day_of_week: DayOfWeek,
    #[serde(with = "wall_clock")]
    pub start_time: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end_time: NaiveTime,
}

fn validate_slot_bounds(slot: &SlotInput) -> Result<(), ValidationError> {
    if slot.start_time >= slot.end_time {
        let mut err = ValidationError::new("slot_bounds");
        err.message = Some("start_time must be before end_time on the same day".into());
        return Err(err);
    }
    Ok(())
}

impl SlotInput {
    pub fn new(day_of_week: DayOfWeek, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self { day_of_week, start_time, end_time }
    }

    pub fn overlaps(&self, other: &SlotInput) -> bool {
        self.day_of_week == other.day_of_week
            && self.start_time < other.end_time
            && other.start_time < self.end_time
    }
}

impl From<&AvailabilitySlot> for SlotInput {
    fn from(slot: &AvailabilitySlot) -> Self {
        Self::new(slot.day_of_week, slot.start_time, slot.end_time)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = user_availability)]
pub struct NewAvailabilitySlot {
    pub user_id: i32,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl NewAvailabilitySlot {
    pub fn for_user(user_id: i32, slot: &SlotInput) -> Self {
        Self {
            user_id,
            day_of_week: slot.day_of_week,
            start_time: slot.start_time,
            end_time: slot.end_time,
        }
    }
}

// --- Meeting ---

/// A committed meeting. Times are wall-clock in `user1_id`'s home zone as it was at creation.
#[derive(Debug, Queryable, Identifiable, Serialize, Clone, PartialEq)]
#[diesel(table_name = meetings)]
pub struct Meeting {
    pub id: i32,
    pub user1_id: i32,
    pub user2_id: i32,
    pub day_of_week: DayOfWeek,
    #[serde(with = "wall_clock")]
    pub start_time: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

impl Meeting {
    pub fn involves(&self, user_id: i32) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }
}

#[derive(Debug, Insertable, Clone, PartialEq)]
#[diesel(table_name = meetings)]
pub struct NewMeeting {
    pub user1_id: i32,
    pub user2_id: i32,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// An existing meeting together with the current home zone of its creator (`user1_id`),
/// which is the zone its wall-clock times are expressed in.
#[derive(Debug, Clone)]
pub struct Booking {
    pub meeting: Meeting,
    pub creator_time_zone: String,
}

pub(crate) fn seconds_of_day(time: &NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn day_of_week_parses_case_insensitively() {
        assert_eq!("monday".parse::<DayOfWeek>().unwrap(), DayOfWeek::Monday);
        assert_eq!("SUNDAY".parse::<DayOfWeek>().unwrap(), DayOfWeek::Sunday);
        assert_eq!("Wed".parse::<DayOfWeek>().unwrap(), DayOfWeek::Wednesday);
        assert!("Funday".parse::<DayOfWeek>().is_err());
        assert!("M".parse::<DayOfWeek>().is_err());
    }

    #[test]
    fn day_of_week_orders_monday_first() {
        let mut days = vec![DayOfWeek::Sunday, DayOfWeek::Wednesday, DayOfWeek::Monday];
        days.sort();
        assert_eq!(days, vec![DayOfWeek::Monday, DayOfWeek::Wednesday, DayOfWeek::Sunday]);
        assert_eq!(DayOfWeek::from_index(8), DayOfWeek::Tuesday);
        assert_eq!(DayOfWeek::from(chrono::Weekday::Sat), DayOfWeek::Saturday);
    }

    #[test]
    fn wall_clock_accepts_minutes_and_seconds() {
        assert_eq!(wall_clock::parse("09:30").unwrap(), t(9, 30));
        assert_eq!(wall_clock::parse("09:30:00").unwrap(), t(9, 30));
        assert!(wall_clock::parse("25:00").is_err());
        assert_eq!(wall_clock::format(&t(7, 5)), "07:05");
        assert_eq!(
            wall_clock::format(&NaiveTime::from_hms_opt(7, 5, 30).unwrap()),
            "07:05:30"
        );
    }

    #[test]
    fn slot_input_deserializes_and_validates() {
        let slot: SlotInput = serde_json::from_value(serde_json::json!({
            "day_of_week": "tuesday",
            "start_time": "18:00",
            "end_time": "20:30:00"
        }))
        .unwrap();
        assert_eq!(slot.day_of_week, DayOfWeek::Tuesday);
        assert!(slot.validate().is_ok());

        let backwards = SlotInput::new(DayOfWeek::Tuesday, t(20, 0), t(18, 0));
        assert!(backwards.validate().is_err());
        let empty = SlotInput::new(DayOfWeek::Tuesday, t(18, 0), t(18, 0));
        assert!(empty.validate().is_err());
    }

    #[test]
    fn slots_overlap_only_on_same_day() {
        let a = SlotInput::new(DayOfWeek::Monday, t(9, 0), t(12, 0));
        let b = SlotInput::new(DayOfWeek::Monday, t(11, 0), t(13, 0));
        let c = SlotInput::new(DayOfWeek::Monday, t(12, 0), t(13, 0));
        let d = SlotInput::new(DayOfWeek::Tuesday, t(9, 0), t(12, 0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(!a.overlaps(&d));
    }

    #[test]
    fn friendship_pair_is_canonical() {
        let pair = NewFriendship::canonical(9, 3);
        assert_eq!((pair.user_id_1, pair.user_id_2), (3, 9));
    }

    #[test]
    fn meeting_serializes_wall_clock() {
        let meeting = Meeting {
            id: 1,
            user1_id: 1,
            user2_id: 2,
            day_of_week: DayOfWeek::Friday,
            start_time: t(14, 0),
            end_time: t(15, 30),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&meeting).unwrap();
        assert_eq!(json["day_of_week"], "Friday");
        assert_eq!(json["start_time"], "14:00");
        assert_eq!(json["end_time"], "15:30");
    }
}

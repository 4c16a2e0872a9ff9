//! Cross-timezone meeting scheduling between friends.

pub mod availability;
pub mod clock;
pub mod conflict;
pub mod intersect;
pub mod resolve;
pub mod scheduler;

pub use clock::TimeZoneClock;
pub use scheduler::{schedule_meeting, ScheduleRequest, ScheduledMeeting};

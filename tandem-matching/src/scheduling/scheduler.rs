use chrono::NaiveTime;
use serde::Serialize;

use tandem_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Account, Booking, DayOfWeek, Meeting, NewMeeting};
use crate::storage::Storage;

use super::clock::{parse_zone, TimeZoneClock};
use super::conflict::{conflicting_side, place_bookings};
use super::intersect::{intersect, WindowFilter};
use super::resolve::resolve_target;

#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub requester_id: i32,
    pub target_name: String,
    pub preferred_day: Option<DayOfWeek>,
    /// Wall-clock time in the requester's zone.
    pub preferred_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduledMeeting {
    pub meeting: Meeting,
    pub target: Account,
}

/// Books the earliest common window between the requester and a friend found by name.
///
/// The meeting is stored in the requester's zone with the requester as `user1_id`. The
/// double-booking check and the insert run atomically inside the storage layer.
pub fn schedule_meeting(
    storage: &dyn Storage,
    clock: &TimeZoneClock,
    req: &ScheduleRequest,
) -> AppResult<ScheduledMeeting> {
    let result = try_schedule(storage, clock, req);

    let outcome = match &result {
        Ok(_) => "scheduled",
        Err(e) => e.code().kind(),
    };
    metrics::counter!("tandem_schedule_outcomes_total", "outcome" => outcome).increment(1);

    match &result {
        Ok(scheduled) => tracing::info!(
            requester_id = req.requester_id,
            target_id = scheduled.target.id,
            meeting_id = scheduled.meeting.id,
            day = %scheduled.meeting.day_of_week,
            "meeting scheduled"
        ),
        Err(e) if e.code().status_code().is_server_error() => {
            tracing::error!(requester_id = req.requester_id, error = %e, "scheduling failed")
        }
        Err(e) => tracing::warn!(requester_id = req.requester_id, outcome, error = %e, "scheduling rejected"),
    }

    result
}

fn try_schedule(storage: &dyn Storage, clock: &TimeZoneClock, req: &ScheduleRequest) -> AppResult<ScheduledMeeting> {
    if req.requester_id <= 0 {
        return Err(AppError::new(ErrorCode::InvalidInput, "requester id must be positive"));
    }
    let target_name = req.target_name.trim();
    if target_name.is_empty() {
        return Err(AppError::new(ErrorCode::InvalidInput, "target name must not be blank"));
    }

    let candidates = storage.find_users_by_name_fragment(target_name)?;
    let target = resolve_target(&candidates, target_name, req.requester_id)?;

    if target.id == req.requester_id {
        return Err(AppError::new(ErrorCode::SelfScheduling, "cannot schedule a meeting with yourself"));
    }

    if !storage.is_friend(req.requester_id, target.id)? {
        return Err(AppError::new(
            ErrorCode::NotFriends,
            format!("you can only schedule meetings with friends, and {} is not one yet", target.full_name()),
        ));
    }

    let requester_profile = storage
        .get_profile(req.requester_id)?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "your profile was not found"))?;
    let target_profile = storage.get_profile(target.id)?.ok_or_else(|| {
        AppError::new(ErrorCode::ProfileNotFound, format!("profile of {} was not found", target.full_name()))
    })?;

    let requester_slots = storage.get_availability(req.requester_id)?;
    if requester_slots.is_empty() {
        return Err(AppError::with_details(
            ErrorCode::NoAvailability,
            "you have not set any availability",
            serde_json::json!({ "side": "requester" }),
        ));
    }
    let target_slots = storage.get_availability(target.id)?;
    if target_slots.is_empty() {
        return Err(AppError::with_details(
            ErrorCode::NoAvailability,
            format!("{} has not set any availability", target.full_name()),
            serde_json::json!({ "side": "target", "user": target.full_name() }),
        ));
    }

    let requester_zone = parse_zone(&requester_profile.home_time_zone)?;
    let target_zone = parse_zone(&target_profile.home_time_zone)?;

    let filter = WindowFilter { day: req.preferred_day, time: req.preferred_time };
    let overlaps = intersect(clock, &requester_slots, requester_zone, &target_slots, target_zone, filter);
    tracing::debug!(
        requester_id = req.requester_id,
        target_id = target.id,
        windows = overlaps.len(),
        "availability intersected"
    );

    let Some(chosen) = overlaps.first().copied() else {
        return Err(AppError::new(
            ErrorCode::NoOverlap,
            format!("no overlapping availability with {} for the requested time", target.full_name()),
        ));
    };

    let new = NewMeeting {
        user1_id: req.requester_id,
        user2_id: target.id,
        day_of_week: chosen.window.day_of_week,
        start_time: chosen.window.start_time,
        end_time: chosen.window.end_time,
    };

    let guard = |bookings: &[Booking]| -> AppResult<()> {
        let placed = place_bookings(clock, bookings)?;
        match conflicting_side(req.requester_id, target.id, &chosen.span, &placed) {
            None => Ok(()),
            Some(side) => Err(AppError::with_details(
                ErrorCode::SchedulingConflict,
                format!(
                    "the {} {}-{} window conflicts with an existing meeting ({side})",
                    chosen.window.day_of_week,
                    chosen.window.start_time.format("%H:%M"),
                    chosen.window.end_time.format("%H:%M"),
                ),
                serde_json::json!({ "conflicting_slot": chosen.window, "side": side }),
            )),
        }
    };
    let meeting = storage.create_meeting(&new, &guard)?;

    Ok(ScheduledMeeting { meeting, target })
}

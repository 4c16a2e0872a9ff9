use validator::Validate;

use tandem_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::SlotInput;

/// Checks that every new slot is well-formed and that, together with the slots the owner
/// keeps, no two slots overlap on the same day.
pub fn validate_slots(kept: &[SlotInput], new: &[SlotInput]) -> AppResult<()> {
    for slot in new {
        slot.validate().map_err(|e| {
            AppError::with_details(
                ErrorCode::InvalidAvailability,
                e.to_string(),
                serde_json::json!({ "day_of_week": slot.day_of_week }),
            )
        })?;
    }

    for (i, slot) in new.iter().enumerate() {
        let clash = kept
            .iter()
            .chain(new[..i].iter())
            .find(|other| slot.overlaps(other));
        if let Some(other) = clash {
            return Err(AppError::new(
                ErrorCode::InvalidAvailability,
                format!(
                    "slot {} {}-{} overlaps {}-{}",
                    slot.day_of_week,
                    slot.start_time.format("%H:%M"),
                    slot.end_time.format("%H:%M"),
                    other.start_time.format("%H:%M"),
                    other.end_time.format("%H:%M"),
                ),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DayOfWeek;
    use chrono::NaiveTime;

    fn slot(day: DayOfWeek, start: u32, end: u32) -> SlotInput {
        SlotInput::new(
            day,
            NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
        )
    }

    #[test]
    fn accepts_disjoint_slots() {
        let kept = [slot(DayOfWeek::Monday, 9, 11)];
        let new = [slot(DayOfWeek::Monday, 11, 12), slot(DayOfWeek::Tuesday, 9, 11)];
        assert!(validate_slots(&kept, &new).is_ok());
    }

    #[test]
    fn rejects_backwards_slot() {
        let err = validate_slots(&[], &[slot(DayOfWeek::Monday, 12, 9)]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidAvailability);
    }

    #[test]
    fn rejects_overlap_with_kept_slot() {
        let kept = [slot(DayOfWeek::Friday, 9, 12)];
        let err = validate_slots(&kept, &[slot(DayOfWeek::Friday, 11, 13)]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidAvailability);
    }

    #[test]
    fn rejects_overlap_within_batch() {
        let new = [slot(DayOfWeek::Sunday, 9, 12), slot(DayOfWeek::Sunday, 10, 11)];
        assert!(validate_slots(&[], &new).is_err());
    }
}

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use tandem_shared::errors::{AppError, AppResult, ErrorCode};
use tandem_shared::types::auth::AuthUser;
use tandem_shared::types::ApiResponse;

use crate::models::{wall_clock, DayOfWeek, Meeting};
use crate::scheduling::{self, ScheduleRequest, ScheduledMeeting, TimeZoneClock};
use crate::AppState;

// --- POST /meetings/schedule ---

#[derive(Debug, Deserialize, Validate)]
pub struct ScheduleMeetingRequest {
    #[validate(length(min = 1, max = 201, message = "target_name must be between 1 and 201 characters"))]
    pub target_name: String,
    pub preferred_day: Option<DayOfWeek>,
    /// `HH:MM` in the caller's home zone.
    pub preferred_time: Option<String>,
}

pub async fn schedule_meeting(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScheduleMeetingRequest>,
) -> AppResult<Json<ApiResponse<ScheduledMeeting>>> {
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::InvalidInput, e.to_string()))?;

    let preferred_time = req
        .preferred_time
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(wall_clock::parse)
        .transpose()
        .map_err(|e| AppError::new(ErrorCode::InvalidInput, e))?;

    let request = ScheduleRequest {
        requester_id: user.id,
        target_name: req.target_name,
        preferred_day: req.preferred_day,
        preferred_time,
    };

    let scheduled = scheduling::schedule_meeting(state.storage.as_ref(), &TimeZoneClock::current(), &request)?;
    let message = format!(
        "meeting with {} booked for {} {}-{}",
        scheduled.target.full_name(),
        scheduled.meeting.day_of_week,
        scheduled.meeting.start_time.format("%H:%M"),
        scheduled.meeting.end_time.format("%H:%M"),
    );
    Ok(Json(ApiResponse::ok_with_message(scheduled, message)))
}

// --- GET /meetings ---

pub async fn list_meetings(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Meeting>>>> {
    let meetings = state.storage.get_meetings_for_user(user.id)?;
    Ok(Json(ApiResponse::ok(meetings)))
}

// --- DELETE /meetings/:id ---

#[derive(Debug, Serialize)]
pub struct MeetingCancelledResponse {
    pub cancelled: bool,
}

pub async fn cancel_meeting(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<i32>,
) -> AppResult<Json<ApiResponse<MeetingCancelledResponse>>> {
    if !state.storage.delete_meeting(user.id, meeting_id)? {
        return Err(AppError::new(ErrorCode::MeetingNotFound, "meeting not found"));
    }
    tracing::info!(user_id = user.id, meeting_id, "meeting cancelled");
    Ok(Json(ApiResponse::ok(MeetingCancelledResponse { cancelled: true })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::models::Profile;
    use crate::routes::test_support::{call, TestApp};

    /// Two UTC friends who are both free all Monday afternoon.
    fn friends() -> TestApp {
        let app = TestApp::new();
        app.storage.insert_user("Ines", "Moreau", Profile::new(1)).unwrap();
        app.storage.insert_user("Jonas", "Vogel", Profile::new(2)).unwrap();
        app.storage.add_friend(1, 2).unwrap();
        app
    }

    async fn free_monday_afternoon(app: &TestApp, user: i32) {
        let slots = json!({ "slots": [{ "day_of_week": "Monday", "start_time": "13:00", "end_time": "17:00" }] });
        let (status, _) = call(app, "POST", "/availability", Some(user), Some(slots)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn schedules_lists_and_cancels() {
        let app = friends();
        free_monday_afternoon(&app, 1).await;
        free_monday_afternoon(&app, 2).await;

        let body = json!({ "target_name": "jonas", "preferred_time": "14:30" });
        let (status, scheduled) = call(&app, "POST", "/meetings/schedule", Some(1), Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(scheduled["data"]["target"]["first_name"], "Jonas");
        assert_eq!(scheduled["data"]["meeting"]["day_of_week"], "Monday");
        assert_eq!(scheduled["data"]["meeting"]["start_time"], "13:00");
        assert_eq!(scheduled["data"]["meeting"]["end_time"], "17:00");
        assert_eq!(scheduled["message"], "meeting with Jonas Vogel booked for Monday 13:00-17:00");

        let (_, listed) = call(&app, "GET", "/meetings", Some(2), None).await;
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);

        let id = scheduled["data"]["meeting"]["id"].as_i64().unwrap();
        let (status, _) = call(&app, "DELETE", &format!("/meetings/{id}"), Some(2), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = call(&app, "DELETE", &format!("/meetings/{id}"), Some(2), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "E3010");
    }

    #[tokio::test]
    async fn double_booking_is_a_conflict() {
        let app = friends();
        free_monday_afternoon(&app, 1).await;
        free_monday_afternoon(&app, 2).await;

        let body = json!({ "target_name": "Jonas Vogel" });
        let (status, _) = call(&app, "POST", "/meetings/schedule", Some(1), Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, err) = call(&app, "POST", "/meetings/schedule", Some(1), Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["success"], false);
        assert_eq!(err["error"]["code"], "E3008");
        assert_eq!(err["error"]["details"]["side"], "both");
    }

    #[tokio::test]
    async fn non_friend_is_forbidden() {
        let app = friends();
        app.storage.insert_user("Kai", "Lund", Profile::new(3)).unwrap();
        let (status, err) = call(&app, "POST", "/meetings/schedule", Some(1), Some(json!({ "target_name": "kai" }))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(err["error"]["code"], "E3005");
    }

    #[tokio::test]
    async fn malformed_preferences_are_invalid_input() {
        let app = friends();
        let body = json!({ "target_name": "jonas", "preferred_time": "25:99" });
        let (status, err) = call(&app, "POST", "/meetings/schedule", Some(1), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"]["code"], "E3001");

        let body = json!({ "target_name": "" });
        let (status, _) = call(&app, "POST", "/meetings/schedule", Some(1), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

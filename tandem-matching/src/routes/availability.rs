use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use tandem_shared::errors::{AppError, AppResult, ErrorCode};
use tandem_shared::types::auth::AuthUser;
use tandem_shared::types::ApiResponse;

use crate::models::{AvailabilitySlot, SlotInput};
use crate::routes::require_profile;
use crate::scheduling::availability::validate_slots;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct AvailabilityRequest {
    #[validate(length(max = 100, message = "too many slots in one request"))]
    pub slots: Vec<SlotInput>,
}

// --- GET /availability ---

pub async fn list_availability(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<AvailabilitySlot>>>> {
    let slots = state.storage.get_availability(user.id)?;
    Ok(Json(ApiResponse::ok(slots)))
}

// --- POST /availability ---

pub async fn add_availability(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AvailabilityRequest>,
) -> AppResult<Json<ApiResponse<Vec<AvailabilitySlot>>>> {
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::InvalidAvailability, e.to_string()))?;
    if req.slots.is_empty() {
        return Err(AppError::new(ErrorCode::InvalidAvailability, "at least one slot is required"));
    }
    require_profile(&state, user.id)?;

    let kept: Vec<SlotInput> = state.storage.get_availability(user.id)?.iter().map(SlotInput::from).collect();
    validate_slots(&kept, &req.slots)?;

    let added = state.storage.add_availability(user.id, &req.slots)?;
    tracing::info!(user_id = user.id, added = added.len(), "availability added");
    Ok(Json(ApiResponse::ok(added)))
}

// --- PUT /availability ---

pub async fn replace_availability(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AvailabilityRequest>,
) -> AppResult<Json<ApiResponse<Vec<AvailabilitySlot>>>> {
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::InvalidAvailability, e.to_string()))?;
    require_profile(&state, user.id)?;
    validate_slots(&[], &req.slots)?;

    let slots = state.storage.replace_availability(user.id, &req.slots)?;
    tracing::info!(user_id = user.id, slots = slots.len(), "availability replaced");
    Ok(Json(ApiResponse::ok(slots)))
}

// --- DELETE /availability/:id ---

#[derive(Debug, Serialize)]
pub struct SlotRemovedResponse {
    pub removed: bool,
}

pub async fn remove_availability(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(slot_id): Path<i32>,
) -> AppResult<Json<ApiResponse<SlotRemovedResponse>>> {
    if !state.storage.remove_availability(user.id, slot_id)? {
        return Err(AppError::new(ErrorCode::AvailabilitySlotNotFound, "availability slot not found"));
    }
    Ok(Json(ApiResponse::ok(SlotRemovedResponse { removed: true })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::models::Profile;
    use crate::routes::test_support::{call, TestApp};

    fn app_with_user() -> TestApp {
        let app = TestApp::new();
        app.storage.insert_user("Lena", "Ortiz", Profile::new(1)).unwrap();
        app
    }

    fn slot(day: &str, start: &str, end: &str) -> serde_json::Value {
        json!({ "day_of_week": day, "start_time": start, "end_time": end })
    }

    #[tokio::test]
    async fn add_then_list_in_week_order() {
        let app = app_with_user();
        let body = json!({ "slots": [slot("friday", "18:00", "20:00"), slot("Tue", "07:00", "08:30")] });
        let (status, _) = call(&app, "POST", "/availability", Some(1), Some(body)).await;
        assert_eq!(status, StatusCode::OK);

        let (_, listed) = call(&app, "GET", "/availability", Some(1), None).await;
        let slots = listed["data"].as_array().unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0]["day_of_week"], "Tuesday");
        assert_eq!(slots[0]["end_time"], "08:30");
        assert_eq!(slots[1]["day_of_week"], "Friday");
    }

    #[tokio::test]
    async fn overlapping_addition_is_rejected() {
        let app = app_with_user();
        let first = json!({ "slots": [slot("Monday", "09:00", "11:00")] });
        call(&app, "POST", "/availability", Some(1), Some(first)).await;

        let clash = json!({ "slots": [slot("Monday", "10:00", "12:00")] });
        let (status, err) = call(&app, "POST", "/availability", Some(1), Some(clash)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"]["code"], "E2005");
    }

    #[tokio::test]
    async fn backwards_slot_is_rejected() {
        let app = app_with_user();
        let body = json!({ "slots": [slot("Monday", "11:00", "09:00")] });
        let (status, _) = call(&app, "PUT", "/availability", Some(1), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn replace_swaps_everything_and_remove_is_owner_only() {
        let app = app_with_user();
        app.storage.insert_user("Milo", "Park", Profile::new(2)).unwrap();
        call(&app, "POST", "/availability", Some(1), Some(json!({ "slots": [slot("Monday", "09:00", "11:00")] }))).await;

        let body = json!({ "slots": [slot("Sunday", "10:00", "12:00")] });
        let (_, replaced) = call(&app, "PUT", "/availability", Some(1), Some(body)).await;
        let id = replaced["data"][0]["id"].as_i64().unwrap();

        let (_, listed) = call(&app, "GET", "/availability", Some(1), None).await;
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);

        let (status, _) = call(&app, "DELETE", &format!("/availability/{id}"), Some(2), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, "DELETE", &format!("/availability/{id}"), Some(1), None).await;
        assert_eq!(status, StatusCode::OK);
    }
}

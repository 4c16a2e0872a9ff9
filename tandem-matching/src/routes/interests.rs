use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use tandem_shared::errors::{AppError, AppResult, ErrorCode};
use tandem_shared::types::auth::AuthUser;
use tandem_shared::types::ApiResponse;

use crate::models::Interest;
use crate::routes::require_profile;
use crate::AppState;

const MAX_INTEREST_LEN: usize = 100;

fn interest_name(raw: &str) -> AppResult<String> {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > MAX_INTEREST_LEN {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            format!("interest name must be between 1 and {MAX_INTEREST_LEN} characters"),
        ));
    }
    Ok(name.to_string())
}

// --- GET /interests/catalog ---

pub async fn list_catalog(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Interest>>>> {
    let catalog = state.storage.list_all_interests()?;
    Ok(Json(ApiResponse::ok(catalog)))
}

// --- GET /interests ---

pub async fn list_interests(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Interest>>>> {
    let interests = state.storage.get_interests(user.id)?;
    Ok(Json(ApiResponse::ok(interests)))
}

// --- POST /interests ---

#[derive(Debug, Deserialize)]
pub struct AddInterestRequest {
    pub name: String,
}

pub async fn add_interest(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddInterestRequest>,
) -> AppResult<Json<ApiResponse<Interest>>> {
    let name = interest_name(&req.name)?;
    require_profile(&state, user.id)?;

    let interest = state.storage.find_or_create_interest(&name)?;
    state.storage.attach_interest(user.id, interest.id)?;
    Ok(Json(ApiResponse::ok(interest)))
}

// --- PUT /interests ---

#[derive(Debug, Deserialize, Validate)]
pub struct ReplaceInterestsRequest {
    #[validate(length(max = 50, message = "too many interests in one request"))]
    pub names: Vec<String>,
}

pub async fn replace_interests(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReplaceInterestsRequest>,
) -> AppResult<Json<ApiResponse<Vec<Interest>>>> {
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;
    let names = req
        .names
        .iter()
        .map(|raw| interest_name(raw))
        .collect::<AppResult<Vec<String>>>()?;
    require_profile(&state, user.id)?;

    let interests = state.storage.replace_interests(user.id, &names)?;
    tracing::info!(user_id = user.id, interests = interests.len(), "interests replaced");
    Ok(Json(ApiResponse::ok(interests)))
}

// --- DELETE /interests/:id ---

#[derive(Debug, Serialize)]
pub struct InterestRemovedResponse {
    pub removed: bool,
}

pub async fn remove_interest(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(interest_id): Path<i32>,
) -> AppResult<Json<ApiResponse<InterestRemovedResponse>>> {
    if !state.storage.detach_interest(user.id, interest_id)? {
        return Err(AppError::new(ErrorCode::InterestNotFound, "interest not found on your profile"));
    }
    Ok(Json(ApiResponse::ok(InterestRemovedResponse { removed: true })))
}

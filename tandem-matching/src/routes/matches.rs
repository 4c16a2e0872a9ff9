use axum::extract::{Query, State};
use axum::Json;
use std::sync::Arc;

use tandem_shared::errors::AppResult;
use tandem_shared::types::auth::AuthUser;
use tandem_shared::types::ApiResponse;

use crate::matching::{self, MatchCriteria, MatchReport};
use crate::AppState;

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// --- GET /matches?zodiac=&mbti= ---

pub async fn find_matches(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(criteria): Query<MatchCriteria>,
) -> AppResult<Json<ApiResponse<MatchReport>>> {
    let criteria = MatchCriteria {
        zodiac: non_blank(criteria.zodiac),
        mbti: non_blank(criteria.mbti),
    };
    let report = matching::find_matches(state.storage.as_ref(), user.id, &criteria)?;
    Ok(Json(ApiResponse::ok(report)))
}

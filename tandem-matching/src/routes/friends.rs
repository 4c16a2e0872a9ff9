use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;

use tandem_shared::errors::{AppError, AppResult, ErrorCode};
use tandem_shared::types::auth::AuthUser;
use tandem_shared::types::ApiResponse;

use crate::models::{Account, Friendship};
use crate::AppState;

// --- GET /friends ---

pub async fn list_friends(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Account>>>> {
    let mut friends = Vec::new();
    for id in state.storage.list_friend_ids(user.id)? {
        if let Some(account) = state.storage.get_account(id)? {
            friends.push(account);
        }
    }
    Ok(Json(ApiResponse::ok(friends)))
}

// --- POST /friends/:id ---

pub async fn add_friend(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(friend_id): Path<i32>,
) -> AppResult<Json<ApiResponse<Friendship>>> {
    if friend_id == user.id {
        return Err(AppError::new(ErrorCode::CannotFriendSelf, "cannot add yourself as a friend"));
    }
    if state.storage.get_account(friend_id)?.is_none() {
        return Err(AppError::new(ErrorCode::AccountNotFound, "user not found"));
    }

    let friendship = state.storage.add_friend(user.id, friend_id)?;
    tracing::info!(user_id = user.id, friend_id, "friendship created");
    Ok(Json(ApiResponse::ok(friendship)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::models::Profile;
    use crate::routes::test_support::{call, TestApp};

    fn two_users() -> TestApp {
        let app = TestApp::new();
        app.storage.insert_user("Nora", "Quinn", Profile::new(1)).unwrap();
        app.storage.insert_user("Omar", "Reyes", Profile::new(2)).unwrap();
        app
    }

    #[tokio::test]
    async fn friendship_shows_up_on_both_sides() {
        let app = two_users();
        let (status, _) = call(&app, "POST", "/friends/2", Some(1), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, theirs) = call(&app, "GET", "/friends", Some(2), None).await;
        assert_eq!(theirs["data"][0]["first_name"], "Nora");

        let (status, err) = call(&app, "POST", "/friends/1", Some(2), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["error"]["code"], "E2003");
    }

    #[tokio::test]
    async fn self_and_unknown_users_are_rejected() {
        let app = two_users();
        let (status, _) = call(&app, "POST", "/friends/1", Some(1), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(&app, "POST", "/friends/77", Some(1), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{range}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Auth errors
/// - E2xxx: Profile, friendship and availability errors
/// - E3xxx: Matching and scheduling errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    BadRequest,
    StorageError,

    // Auth (E1xxx)
    TokenExpired,
    TokenInvalid,

    // Profile (E2xxx)
    ProfileNotFound,
    AccountNotFound,
    FriendshipAlreadyExists,
    CannotFriendSelf,
    InvalidAvailability,
    AvailabilitySlotNotFound,
    InterestNotFound,

    // Matching & scheduling (E3xxx)
    InvalidInput,
    TargetNotFound,
    AmbiguousTarget,
    SelfScheduling,
    NotFriends,
    NoAvailability,
    NoOverlap,
    SchedulingConflict,
    InvalidTimeZone,
    MeetingNotFound,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::BadRequest => "E0008",
            Self::StorageError => "E0010",

            // Auth
            Self::TokenExpired => "E1004",
            Self::TokenInvalid => "E1005",

            // Profile
            Self::ProfileNotFound => "E2001",
            Self::AccountNotFound => "E2002",
            Self::FriendshipAlreadyExists => "E2003",
            Self::CannotFriendSelf => "E2004",
            Self::InvalidAvailability => "E2005",
            Self::AvailabilitySlotNotFound => "E2006",
            Self::InterestNotFound => "E2007",

            // Matching & scheduling
            Self::InvalidInput => "E3001",
            Self::TargetNotFound => "E3002",
            Self::AmbiguousTarget => "E3003",
            Self::SelfScheduling => "E3004",
            Self::NotFriends => "E3005",
            Self::NoAvailability => "E3006",
            Self::NoOverlap => "E3007",
            Self::SchedulingConflict => "E3008",
            Self::InvalidTimeZone => "E3009",
            Self::MeetingNotFound => "E3010",
        }
    }

    /// Short machine-readable kind, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InternalError => "internal_error",
            Self::ValidationError => "validation_error",
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::BadRequest => "bad_request",
            Self::StorageError => "storage_error",
            Self::TokenExpired => "token_expired",
            Self::TokenInvalid => "token_invalid",
            Self::ProfileNotFound => "profile_not_found",
            Self::AccountNotFound => "account_not_found",
            Self::FriendshipAlreadyExists => "friendship_already_exists",
            Self::CannotFriendSelf => "cannot_friend_self",
            Self::InvalidAvailability => "invalid_availability",
            Self::AvailabilitySlotNotFound => "availability_slot_not_found",
            Self::InterestNotFound => "interest_not_found",
            Self::InvalidInput => "invalid_input",
            Self::TargetNotFound => "target_not_found",
            Self::AmbiguousTarget => "ambiguous_target",
            Self::SelfScheduling => "self_scheduling",
            Self::NotFriends => "not_friends",
            Self::NoAvailability => "no_availability",
            Self::NoOverlap => "no_overlap",
            Self::SchedulingConflict => "scheduling_conflict",
            Self::InvalidTimeZone => "invalid_time_zone",
            Self::MeetingNotFound => "meeting_not_found",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError | Self::StorageError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::InvalidInput
            | Self::InvalidAvailability | Self::InvalidTimeZone => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::ProfileNotFound | Self::AccountNotFound
            | Self::AvailabilitySlotNotFound | Self::InterestNotFound | Self::TargetNotFound
            | Self::MeetingNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::TokenExpired | Self::TokenInvalid => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::CannotFriendSelf | Self::SelfScheduling
            | Self::NotFriends => StatusCode::FORBIDDEN,
            Self::FriendshipAlreadyExists | Self::AmbiguousTarget
            | Self::SchedulingConflict => StatusCode::CONFLICT,
            Self::NoAvailability | Self::NoOverlap => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Opaque failure of the storage layer (pool exhaustion, connection loss, poisoned lock).
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// The code this error is reported under.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Known { code, .. } => *code,
            AppError::Internal(_) => ErrorCode::InternalError,
            AppError::Database(diesel::result::Error::NotFound) => ErrorCode::NotFound,
            AppError::Database(_) => ErrorCode::StorageError,
            AppError::Validation(_) => ErrorCode::ValidationError,
        }
    }

    pub fn details(&self) -> Option<&serde_json::Value> {
        match self {
            AppError::Known { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                if status.is_server_error() {
                    tracing::error!(code = code.code(), error = %message, "request failed");
                }
                let mut resp = ApiErrorResponse::new(code.code(), code.kind(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal_error", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "not_found", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0010", "storage_error", "database error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", "validation_error", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

pub mod availability;
pub mod friends;
pub mod health;
pub mod interests;
pub mod matches;
pub mod meetings;

use tandem_shared::errors::{AppError, AppResult, ErrorCode};

use crate::AppState;

/// Fails with `ProfileNotFound` unless the caller has a profile to attach data to.
pub(crate) fn require_profile(state: &AppState, user_id: i32) -> AppResult<()> {
    match state.storage.get_profile(user_id)? {
        Some(_) => Ok(()),
        None => Err(AppError::new(ErrorCode::ProfileNotFound, "profile not found")),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    use tandem_shared::types::auth::Claims;

    use crate::storage::MemoryStorage;
    use crate::AppState;

    const DEV_JWT_SECRET: &str = "development-secret-change-in-production";

    pub struct TestApp {
        pub storage: Arc<MemoryStorage>,
        state: Arc<AppState>,
    }

    impl TestApp {
        pub fn new() -> Self {
            let storage = Arc::new(MemoryStorage::new());
            let state = Arc::new(AppState {
                storage: storage.clone(),
                metrics_handle: PrometheusBuilder::new().build_recorder().handle(),
            });
            Self { storage, state }
        }
    }

    fn bearer(user_id: i32) -> String {
        let token = encode(
            &Header::default(),
            &Claims::new(user_id, 3600),
            &EncodingKey::from_secret(DEV_JWT_SECRET.as_bytes()),
        )
        .unwrap();
        format!("Bearer {token}")
    }

    /// Sends one request through the router and returns the status and JSON body.
    pub async fn call(
        app: &TestApp,
        method: &str,
        uri: &str,
        user_id: Option<i32>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = user_id {
            builder = builder.header(header::AUTHORIZATION, bearer(id));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = crate::router(app.state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_reports_storage() {
        let app = TestApp::new();
        let (status, body) = call(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["checks"][0]["name"], "storage");
    }
}

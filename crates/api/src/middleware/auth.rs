//! Telegram Mini App authentication for protected routes.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use sana_shared::types::UserId;
use sana_shared::{InitDataError, TelegramUser};
use serde_json::json;
use tracing::{error, warn};

use crate::AppState;

/// Header carrying `Telegram.WebApp.initData`.
pub const INIT_DATA_HEADER: &str = "x-telegram-init-data";

fn reject(status: StatusCode, error: &str, message: &str) -> Response {
    (status, Json(json!({ "error": error, "message": message }))).into_response()
}

/// Verifies the init-data header and stores the [`TelegramUser`] in request
/// extensions.
///
/// - missing header: 401
/// - no bot token configured: 500
/// - signature mismatch: 403
/// - anything else malformed: 401
pub async fn telegram_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let init_data = request
        .headers()
        .get(INIT_DATA_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty());

    let Some(init_data) = init_data else {
        return reject(
            StatusCode::UNAUTHORIZED,
            "missing_auth",
            "Missing auth header",
        );
    };

    let Some(verifier) = state.verifier.as_ref() else {
        error!("Telegram bot token is not configured");
        return reject(
            StatusCode::INTERNAL_SERVER_ERROR,
            "server_config_error",
            "Server config error",
        );
    };

    match verifier.verify(init_data, Utc::now()) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(InitDataError::SignatureMismatch) => {
            warn!("Init data hash mismatch");
            reject(
                StatusCode::FORBIDDEN,
                "integrity_check_failed",
                "Data integrity check failed",
            )
        }
        Err(e) => {
            warn!(error = %e, "Invalid init data");
            reject(
                StatusCode::UNAUTHORIZED,
                "invalid_auth",
                "Invalid authentication data",
            )
        }
    }
}

/// Extractor for the authenticated Telegram user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub TelegramUser);

impl AuthUser {
    /// Returns the application user ID.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.0.user_id()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TelegramUser>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "unauthorized",
                        "message": "Authentication required"
                    })),
                )
            })
    }
}

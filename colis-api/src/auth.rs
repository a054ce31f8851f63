use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{error::AppError, middleware::auth::SessionClaims, state::AppState};

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    code: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    role: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let code = req.code.trim();
    if code.is_empty() {
        return Err(AppError::ValidationError("Code is required".into()));
    }

    let account = state
        .accounts
        .find_account(code)
        .await?
        .ok_or_else(|| AppError::AuthenticationError("Invalid Code".into()))?;

    let token = SessionClaims::for_account(&account, &state.auth).sign(&state.auth)?;
    info!(role = %account.role, "session opened");

    Ok(Json(LoginResponse {
        token,
        role: account.role,
    }))
}

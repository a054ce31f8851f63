use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use colis_core::ReferenceData;
use colis_order::{models::FLAG_TRUE, Order, OrderPatch};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{error::AppError, middleware::SessionClaims, state::AppState};

#[derive(Debug, Deserialize)]
pub struct MessageStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageStatusResponse {
    pub message: String,
    pub status: String,
    pub column: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/commandes", get(list_orders).post(create_order))
        .route("/commandes/{id}", put(update_order).delete(delete_order))
        .route("/commandes/{id}/message-status", put(update_message_status))
        .route("/commandes/validation/{column}", get(validation_rules))
        .route("/references", get(references))
}

/// GET /commandes
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(state.orders.list(&claims.role).await?))
}

/// POST /commandes
pub async fn create_order(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let input = OrderPatch::from_value(body)?;
    let row_id = state.orders.create(&claims.role, &input).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Commande ajoutée",
            "data": {
                "reference": input.reference.unwrap_or_default(),
                "rowId": row_id,
            }
        })),
    ))
}

/// PUT /commandes/{id}
pub async fn update_order(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(row_id): Path<u32>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let patch = OrderPatch::from_value(body)?;
    state.orders.update(&claims.role, row_id, &patch).await?;
    Ok(Json(json!({ "message": "Commande modifiée" })))
}

/// DELETE /commandes/{id}
pub async fn delete_order(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(row_id): Path<u32>,
) -> Result<Json<Value>, AppError> {
    state.orders.delete(&claims.role, row_id).await?;
    Ok(Json(json!({ "message": "Commande supprimée" })))
}

/// PUT /commandes/{id}/message-status
pub async fn update_message_status(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(row_id): Path<u32>,
    body: Bytes,
) -> Result<Json<MessageStatusResponse>, AppError> {
    // An empty body means the default flag.
    let req: MessageStatusRequest = if body.is_empty() {
        MessageStatusRequest { status: None }
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::ValidationError(e.to_string()))?
    };
    let status = req
        .status
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FLAG_TRUE.to_string());

    let column = state
        .orders
        .set_message_sent(&claims.role, row_id, &status)
        .await?;

    Ok(Json(MessageStatusResponse {
        message: "Statut message mis à jour".into(),
        status,
        column,
    }))
}

/// GET /commandes/validation/{column}
pub async fn validation_rules(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(column): Path<String>,
) -> Result<Json<Value>, AppError> {
    let rules = state
        .references
        .column_validation(&claims.role, &column)
        .await?;
    Ok(Json(json!({
        "sheet": claims.role,
        "column": column,
        "validationRules": rules,
    })))
}

/// GET /references
pub async fn references(State(state): State<AppState>) -> Result<Json<ReferenceData>, AppError> {
    let rows = state.references.reference_rows().await?;
    Ok(Json(ReferenceData::from_rows(&rows)))
}

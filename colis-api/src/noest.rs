use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{error::AppError, middleware::SessionClaims, state::AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendFromSheetRequest {
    pub row_id: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TrackingRequest {
    #[serde(default)]
    pub tracking: String,
}

#[derive(Debug, Deserialize)]
pub struct RemarkRequest {
    #[serde(default)]
    pub tracking: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingsRequest {
    pub trackings_array: Option<Vec<String>>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/send-from-sheet", post(send_from_sheet))
        .route("/order", post(create_order))
        .route("/order/validate", post(validate_order))
        .route("/order/update", post(update_order))
        .route("/order/delete", post(delete_order))
        .route("/order/remark", post(add_remark))
        .route("/order/tentative", post(ask_new_tentative))
        .route("/order/return", post(ask_return))
        .route("/order/label/{tracking}", get(download_label))
        .route("/trackings", post(trackings_info))
        .route("/desks", get(desks))
        .route("/fees", get(fees))
        .route("/communes", get(communes))
        .route("/communes/{wilaya}", get(communes_of_wilaya))
        .route("/wilayas", get(wilayas))
}

/// POST /noest/send-from-sheet
/// Submits a stored order of the caller's partition to the carrier.
pub async fn send_from_sheet(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<SendFromSheetRequest>,
) -> Result<Json<Value>, AppError> {
    let row_id = req
        .row_id
        .ok_or_else(|| AppError::ValidationError("rowId is required".into()))?;

    let result = state.orders.submit_to_carrier(&claims.role, row_id).await?;

    Ok(Json(json!({
        "success": true,
        "tracking": result.tracking,
        "reference": result.reference,
        "message": "Order sent to Noest successfully",
    })))
}

/// POST /noest/order
/// Raw passthrough; the body goes to the carrier unchecked.
pub async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let result = state.orders.bridge().create_raw(body).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn validate_order(
    State(state): State<AppState>,
    Json(req): Json<TrackingRequest>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.orders.bridge().validate(&req.tracking).await?))
}

/// POST /noest/order/update
/// Everything besides `tracking` is forwarded as the fields to change.
pub async fn update_order(
    State(state): State<AppState>,
    Json(mut body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let tracking = body
        .as_object_mut()
        .and_then(|fields| fields.remove("tracking"))
        .and_then(|t| t.as_str().map(str::to_string))
        .unwrap_or_default();
    Ok(Json(state.orders.bridge().update(&tracking, body).await?))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Json(req): Json<TrackingRequest>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.orders.bridge().delete(&req.tracking).await?))
}

pub async fn add_remark(
    State(state): State<AppState>,
    Json(req): Json<RemarkRequest>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(
        state
            .orders
            .bridge()
            .add_remark(&req.tracking, &req.content)
            .await?,
    ))
}

pub async fn ask_new_tentative(
    State(state): State<AppState>,
    Json(req): Json<TrackingRequest>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.orders.bridge().ask_new_tentative(&req.tracking).await?))
}

pub async fn ask_return(
    State(state): State<AppState>,
    Json(req): Json<TrackingRequest>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.orders.bridge().ask_return(&req.tracking).await?))
}

/// GET /noest/order/label/{tracking}
pub async fn download_label(
    State(state): State<AppState>,
    Path(tracking): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let pdf = state.orders.bridge().download_label(&tracking).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                label_disposition(&tracking),
            ),
        ],
        pdf,
    ))
}

/// Quoted attachment header. Only ASCII letters, digits and `-` of the
/// tracking id reach the filename.
fn label_disposition(tracking: &str) -> String {
    let name: String = tracking
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    format!("attachment; filename=\"label-{}.pdf\"", name)
}

pub async fn trackings_info(
    State(state): State<AppState>,
    Json(req): Json<TrackingsRequest>,
) -> Result<Json<Value>, AppError> {
    let trackings = req
        .trackings_array
        .ok_or_else(|| AppError::ValidationError("trackingsArray must be an array".into()))?;
    Ok(Json(state.orders.bridge().trackings_info(&trackings).await?))
}

pub async fn desks(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    Ok(Json(state.orders.bridge().desks().await?))
}

pub async fn fees(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    Ok(Json(state.orders.bridge().fees().await?))
}

pub async fn communes(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    Ok(Json(state.orders.bridge().communes(None).await?))
}

pub async fn communes_of_wilaya(
    State(state): State<AppState>,
    Path(wilaya): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.orders.bridge().communes(Some(&wilaya)).await?))
}

pub async fn wilayas(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    Ok(Json(state.orders.bridge().wilayas().await?))
}

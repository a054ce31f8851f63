use colis_core::{CarrierClient, CarrierOperation, CoreError, CoreResult};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::{Order, SubmissionResult, DEFAULT_WEIGHT};

/// Shipment type the carrier expects for a plain home or desk delivery.
pub const SHIPMENT_TYPE_DELIVERY: u8 = 1;

/// Carrier-native shape of a new shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarrierOrderRequest {
    pub client: String,
    pub phone: String,
    pub phone_2: String,
    pub adresse: String,
    pub wilaya_id: String,
    pub commune: String,
    pub montant: String,
    pub remarque: String,
    pub produit: String,
    pub type_id: u8,
    pub poids: String,
    pub stop_desk: u8,
    pub reference: String,
    /// Sent only for stop desk parcels; absent otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_code: Option<String>,
}

impl CarrierOrderRequest {
    pub fn from_order(order: &Order) -> Self {
        let poids = if order.weight.trim().is_empty() {
            DEFAULT_WEIGHT.to_string()
        } else {
            order.weight.clone()
        };

        Self {
            client: order.client.clone(),
            phone: order.phone.clone(),
            phone_2: order.phone2.clone(),
            adresse: order.address.clone(),
            wilaya_id: order.wilaya.clone(),
            commune: order.commune.clone(),
            montant: order.amount.clone(),
            remarque: order.note.clone(),
            produit: order.product.clone(),
            type_id: SHIPMENT_TYPE_DELIVERY,
            poids,
            stop_desk: u8::from(order.is_stop_desk),
            reference: order.reference.clone(),
            station_code: order.is_stop_desk.then(|| order.station_code.clone()),
        }
    }
}

/// Checks an order carries what the carrier needs, naming every gap.
pub fn validate_for_submission(order: &Order) -> CoreResult<()> {
    let mut missing = Vec::new();
    if order.client.trim().is_empty() {
        missing.push("client");
    }
    if order.phone.trim().is_empty() {
        missing.push("phone");
    }
    if order.wilaya.trim().is_empty() {
        missing.push("wilaya");
    }
    if order.is_stop_desk && order.station_code.trim().is_empty() {
        missing.push("stationCode");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::ValidationError(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

/// Translates between orders and the carrier API.
pub struct CarrierBridge {
    client: Arc<dyn CarrierClient>,
}

impl CarrierBridge {
    pub fn new(client: Arc<dyn CarrierClient>) -> Self {
        Self { client }
    }

    /// Creates the shipment for an order. On success the caller moves the
    /// order to `System` with the returned tracking id.
    pub async fn submit(&self, order: &Order) -> CoreResult<SubmissionResult> {
        validate_for_submission(order)?;

        let request = CarrierOrderRequest::from_order(order);
        let payload = serde_json::to_value(&request)
            .map_err(|e| CoreError::carrier(format!("could not encode shipment: {}", e), None))?;
        debug!(reference = %request.reference, "submitting shipment to carrier");

        let response = self.client.call(CarrierOperation::CreateOrder, payload).await?;
        let result = parse_submission(response)?;

        info!(tracking = %result.tracking, reference = %order.reference, "carrier accepted shipment");
        Ok(result)
    }

    /// Forwards a caller-built shipment as is.
    pub async fn create_raw(&self, payload: Value) -> CoreResult<Value> {
        let fields = into_object(payload)?;
        self.client
            .call(CarrierOperation::CreateOrder, Value::Object(fields))
            .await
    }

    pub async fn validate(&self, tracking: &str) -> CoreResult<Value> {
        self.by_tracking(CarrierOperation::ValidateOrder, tracking).await
    }

    /// Updates a shipment. `fields` carries the carrier-native fields to change.
    pub async fn update(&self, tracking: &str, fields: Value) -> CoreResult<Value> {
        let tracking = require_tracking(tracking)?;
        let mut payload = match fields {
            Value::Null => Map::new(),
            other => into_object(other)?,
        };
        payload.insert("tracking".to_string(), Value::String(tracking.to_string()));
        self.client
            .call(CarrierOperation::UpdateOrder, Value::Object(payload))
            .await
    }

    pub async fn delete(&self, tracking: &str) -> CoreResult<Value> {
        self.by_tracking(CarrierOperation::DeleteOrder, tracking).await
    }

    pub async fn add_remark(&self, tracking: &str, content: &str) -> CoreResult<Value> {
        let tracking = require_tracking(tracking)?;
        if content.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Tracking and content required".to_string(),
            ));
        }
        self.client
            .call(
                CarrierOperation::AddRemark,
                json!({ "tracking": tracking, "content": content }),
            )
            .await
    }

    pub async fn ask_new_tentative(&self, tracking: &str) -> CoreResult<Value> {
        self.by_tracking(CarrierOperation::AskNewTentative, tracking).await
    }

    pub async fn ask_return(&self, tracking: &str) -> CoreResult<Value> {
        self.by_tracking(CarrierOperation::AskReturn, tracking).await
    }

    /// Bulk status lookup.
    pub async fn trackings_info(&self, trackings: &[String]) -> CoreResult<Value> {
        if trackings.is_empty() || trackings.iter().any(|t| t.trim().is_empty()) {
            return Err(CoreError::ValidationError(
                "trackingsArray must be a non-empty list of tracking ids".to_string(),
            ));
        }
        self.client
            .call(
                CarrierOperation::GetTrackingsInfo,
                json!({ "trackings": trackings }),
            )
            .await
    }

    pub async fn download_label(&self, tracking: &str) -> CoreResult<Vec<u8>> {
        let tracking = require_tracking(tracking)?;
        self.client.download_label(tracking).await
    }

    pub async fn desks(&self) -> CoreResult<Value> {
        self.client.call(CarrierOperation::GetDesks, json!({})).await
    }

    pub async fn fees(&self) -> CoreResult<Value> {
        self.client.call(CarrierOperation::GetFees, json!({})).await
    }

    pub async fn communes(&self, wilaya: Option<&str>) -> CoreResult<Value> {
        let payload = match wilaya.map(str::trim).filter(|w| !w.is_empty()) {
            Some(wilaya_id) => json!({ "wilaya_id": wilaya_id }),
            None => json!({}),
        };
        self.client.call(CarrierOperation::GetCommunes, payload).await
    }

    pub async fn wilayas(&self) -> CoreResult<Value> {
        self.client.call(CarrierOperation::GetWilayas, json!({})).await
    }

    async fn by_tracking(&self, operation: CarrierOperation, tracking: &str) -> CoreResult<Value> {
        let tracking = require_tracking(tracking)?;
        self.client
            .call(operation, json!({ "tracking": tracking }))
            .await
    }
}

/// Reads a create-order response. Success needs both a truthy `success`
/// and a tracking id; anything else is reported with the raw response.
pub fn parse_submission(response: Value) -> CoreResult<SubmissionResult> {
    let success = response.get("success").is_some_and(is_truthy);
    let tracking = response.get("tracking").and_then(scalar_text).unwrap_or_default();

    if !success || tracking.is_empty() {
        warn!(response = %response, "carrier rejected shipment");
        return Err(CoreError::carrier(
            "Failed to create carrier order",
            Some(response),
        ));
    }

    let reference = response.get("reference").and_then(scalar_text);
    Ok(SubmissionResult { tracking, reference })
}

/// Loose truthiness the carrier API relies on: `true`, non-zero numbers and
/// non-empty strings count, `"false"` and `"0"` do not.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "false" && s != "0",
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn require_tracking(tracking: &str) -> CoreResult<&str> {
    let tracking = tracking.trim();
    if tracking.is_empty() {
        return Err(CoreError::ValidationError("Tracking required".to_string()));
    }
    Ok(tracking)
}

fn into_object(value: Value) -> CoreResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(CoreError::ValidationError(
            "carrier payload must be a JSON object".to_string(),
        )),
    }
}

use async_trait::async_trait;
use colis_core::{CarrierClient, CarrierOperation, CoreResult};
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Carrier stand-in answering from a fixed script and recording every call.
///
/// Operations without a scripted response answer `{"success": true}`;
/// `CreateOrder` additionally gets a fresh `MOCK-` tracking id.
#[derive(Default)]
pub struct ScriptedCarrier {
    responses: HashMap<CarrierOperation, Value>,
    label: Vec<u8>,
    calls: Mutex<Vec<(CarrierOperation, Value)>>,
}

impl ScriptedCarrier {
    pub fn new() -> Self {
        Self {
            label: b"%PDF-1.4 mock label".to_vec(),
            ..Default::default()
        }
    }

    pub fn with_response(mut self, operation: CarrierOperation, response: Value) -> Self {
        self.responses.insert(operation, response);
        self
    }

    pub fn with_label(mut self, label: Vec<u8>) -> Self {
        self.label = label;
        self
    }

    pub async fn calls(&self) -> Vec<(CarrierOperation, Value)> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self, operation: CarrierOperation) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|(op, _)| *op == operation)
            .count()
    }

    fn default_response(operation: CarrierOperation) -> Value {
        match operation {
            CarrierOperation::CreateOrder => json!({
                "success": true,
                "tracking": format!("MOCK-{}", Uuid::new_v4().simple()),
            }),
            CarrierOperation::GetWilayas
            | CarrierOperation::GetCommunes
            | CarrierOperation::GetDesks => json!([]),
            _ => json!({ "success": true }),
        }
    }
}

#[async_trait]
impl CarrierClient for ScriptedCarrier {
    async fn call(&self, operation: CarrierOperation, payload: Value) -> CoreResult<Value> {
        debug!(%operation, %payload, "scripted carrier call");
        self.calls.lock().await.push((operation, payload));
        Ok(self
            .responses
            .get(&operation)
            .cloned()
            .unwrap_or_else(|| Self::default_response(operation)))
    }

    async fn download_label(&self, tracking: &str) -> CoreResult<Vec<u8>> {
        debug!(tracking, "scripted label download");
        Ok(self.label.clone())
    }
}

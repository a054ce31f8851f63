use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::CoreResult;

/// Every structured call the carrier API exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CarrierOperation {
    CreateOrder,
    ValidateOrder,
    UpdateOrder,
    DeleteOrder,
    AddRemark,
    AskNewTentative,
    AskReturn,
    GetTrackingsInfo,
    GetDesks,
    GetFees,
    GetCommunes,
    GetWilayas,
}

impl CarrierOperation {
    pub const ALL: [CarrierOperation; 12] = [
        CarrierOperation::CreateOrder,
        CarrierOperation::ValidateOrder,
        CarrierOperation::UpdateOrder,
        CarrierOperation::DeleteOrder,
        CarrierOperation::AddRemark,
        CarrierOperation::AskNewTentative,
        CarrierOperation::AskReturn,
        CarrierOperation::GetTrackingsInfo,
        CarrierOperation::GetDesks,
        CarrierOperation::GetFees,
        CarrierOperation::GetCommunes,
        CarrierOperation::GetWilayas,
    ];

    /// Path of the operation below the carrier's public API root.
    pub fn path(&self) -> &'static str {
        match self {
            CarrierOperation::CreateOrder => "/create/order",
            CarrierOperation::ValidateOrder => "/valid/order",
            CarrierOperation::UpdateOrder => "/update/order",
            CarrierOperation::DeleteOrder => "/delete/order",
            CarrierOperation::AddRemark => "/add/maj",
            CarrierOperation::AskNewTentative => "/ask/new-tentative",
            CarrierOperation::AskReturn => "/ask/return",
            CarrierOperation::GetTrackingsInfo => "/get/trackings/info",
            CarrierOperation::GetDesks => "/desks",
            CarrierOperation::GetFees => "/fees",
            CarrierOperation::GetCommunes => "/get/communes",
            CarrierOperation::GetWilayas => "/get/wilayas",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CarrierOperation::CreateOrder => "createOrder",
            CarrierOperation::ValidateOrder => "validateOrder",
            CarrierOperation::UpdateOrder => "updateOrder",
            CarrierOperation::DeleteOrder => "deleteOrder",
            CarrierOperation::AddRemark => "addRemark",
            CarrierOperation::AskNewTentative => "askNewTentative",
            CarrierOperation::AskReturn => "askReturn",
            CarrierOperation::GetTrackingsInfo => "getTrackingsInfo",
            CarrierOperation::GetDesks => "getDesks",
            CarrierOperation::GetFees => "getFees",
            CarrierOperation::GetCommunes => "getCommunes",
            CarrierOperation::GetWilayas => "getWilayas",
        }
    }
}

impl fmt::Display for CarrierOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Transport to the parcel carrier.
///
/// Implementations attach the account credentials to every request; callers
/// only pass operation-specific fields.
#[async_trait]
pub trait CarrierClient: Send + Sync {
    async fn call(&self, operation: CarrierOperation, payload: Value) -> CoreResult<Value>;

    /// Shipping label for a tracking id, as PDF bytes.
    async fn download_label(&self, tracking: &str) -> CoreResult<Vec<u8>>;
}

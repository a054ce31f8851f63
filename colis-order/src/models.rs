use colis_core::{CoreError, CoreResult};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Token a spreadsheet cell holds for a true flag. Anything else is false.
pub const FLAG_TRUE: &str = "OUI";

/// Weight sent to the carrier when the sheet leaves it blank.
pub const DEFAULT_WEIGHT: &str = "1";

/// Order status. The vocabulary is open: tenants add their own workshop
/// states, which are kept verbatim in `Custom`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    /// `Nouvelle`
    #[default]
    New,
    /// `System`, handed over to the carrier
    Submitted,
    /// `Annuler`
    Cancelled,
    Custom(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::New => "Nouvelle",
            OrderStatus::Submitted => "System",
            OrderStatus::Cancelled => "Annuler",
            OrderStatus::Custom(s) => s,
        }
    }

    /// Whether the status means the order sits with the carrier, either the
    /// canonical `System` or any tenant wording around "system"/"envoyé".
    pub fn is_submitted(&self) -> bool {
        let lower = self.as_str().to_lowercase();
        lower.contains("system") || lower.contains("envoy")
    }
}

impl From<&str> for OrderStatus {
    fn from(value: &str) -> Self {
        match value {
            "Nouvelle" => OrderStatus::New,
            "System" => OrderStatus::Submitted,
            "Annuler" => OrderStatus::Cancelled,
            other => OrderStatus::Custom(other.to_string()),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        OrderStatus::from(value.as_str())
    }
}

impl From<OrderStatus> for String {
    fn from(value: OrderStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One business order, i.e. one data row of a tenant partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Spreadsheet row number. `None` until the order is placed in a partition.
    pub row_id: Option<u32>,
    pub status: OrderStatus,
    /// `DD-MM-YYYY`
    pub created_date: String,
    pub reference: String,
    pub client: String,
    pub phone: String,
    pub phone2: String,
    pub address: String,
    pub commune: String,
    pub amount: String,
    /// Region code
    pub wilaya: String,
    pub product: String,
    pub note: String,
    pub weight: String,
    pub is_pickup: bool,
    pub is_exchange: bool,
    pub is_stop_desk: bool,
    /// Parcel may be opened on delivery
    pub can_open: bool,
    pub station_code: String,
    pub tracking: String,
    pub message_sent: bool,
}

impl Order {
    pub fn new(created_date: String) -> Self {
        Self {
            status: OrderStatus::New,
            created_date,
            weight: DEFAULT_WEIGHT.to_string(),
            ..Default::default()
        }
    }

    pub fn with_row_id(mut self, row_id: u32) -> Self {
        self.row_id = Some(row_id);
        self
    }

    pub fn has_tracking(&self) -> bool {
        !self.tracking.is_empty()
    }
}

/// Caller-supplied order fields for a create or an update.
///
/// Updates replace every field wholesale: anything left out here is
/// written back blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    #[serde(default, alias = "state", deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, alias = "date", deserialize_with = "lenient_string")]
    pub created_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reference: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub client: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone2: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub commune: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub amount: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub wilaya: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub product: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub note: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub weight: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_pickup: Option<bool>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_exchange: Option<bool>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_stop_desk: Option<bool>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub can_open: Option<bool>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub station_code: Option<String>,
    /// Display name of the stop desk; replaces address and commune.
    #[serde(default, deserialize_with = "lenient_string")]
    pub station_name: Option<String>,
}

impl OrderPatch {
    /// Parses a request body. Anything but a JSON object is invalid input.
    pub fn from_value(value: Value) -> CoreResult<Self> {
        if !value.is_object() {
            return Err(CoreError::ValidationError(
                "order payload must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| CoreError::ValidationError(format!("invalid order payload: {}", e)))
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// What the carrier hands back for an accepted shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub tracking: String,
    pub reference: Option<String>,
}

pub fn encode_flag(value: bool) -> &'static str {
    if value {
        FLAG_TRUE
    } else {
        ""
    }
}

pub fn decode_flag(cell: &str) -> bool {
    cell == FLAG_TRUE
}

/// Prefixes a leading `0` to phone numbers that lack it. Blank stays blank.
pub fn normalize_phone(raw: &str) -> String {
    let cleaned = raw.trim();
    if cleaned.is_empty() || cleaned.starts_with('0') {
        cleaned.to_string()
    } else {
        format!("0{}", cleaned)
    }
}

// Front ends send amounts, wilaya codes and phones as numbers as often as
// strings.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => return Err(de::Error::custom(format!("expected a string or a number, got {}", other))),
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
        Some(Value::String(s)) => Some(matches!(
            s.trim().to_ascii_uppercase().as_str(),
            FLAG_TRUE | "TRUE" | "1"
        )),
        Some(other) => return Err(de::Error::custom(format!("expected a flag, got {}", other))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_round_trips_through_strings() {
        for raw in ["Nouvelle", "System", "Annuler", "Atelier", "system envoyé", ""] {
            let status = OrderStatus::from(raw);
            assert_eq!(status.as_str(), raw);
        }
        assert_eq!(OrderStatus::from("System"), OrderStatus::Submitted);
        // case-sensitive: lowercase is a custom value
        assert_eq!(OrderStatus::from("nouvelle"), OrderStatus::Custom("nouvelle".into()));
    }

    #[test]
    fn test_submitted_predicate() {
        assert!(OrderStatus::Submitted.is_submitted());
        assert!(OrderStatus::from("SYSTEM").is_submitted());
        assert!(OrderStatus::from("Envoyer").is_submitted());
        assert!(OrderStatus::from("Envoyé au transporteur").is_submitted());
        assert!(!OrderStatus::New.is_submitted());
        assert!(!OrderStatus::Cancelled.is_submitted());
    }

    #[test]
    fn test_phone_normalization() {
        assert_eq!(normalize_phone("550000000"), "0550000000");
        assert_eq!(normalize_phone("0550000000"), "0550000000");
        assert_eq!(normalize_phone(" 661223344 "), "0661223344");
        assert_eq!(normalize_phone(""), "");
    }

    #[test]
    fn test_flags() {
        assert_eq!(encode_flag(true), "OUI");
        assert_eq!(encode_flag(false), "");
        assert!(decode_flag("OUI"));
        assert!(!decode_flag("oui"));
        assert!(!decode_flag("NON"));
        assert!(!decode_flag(""));
    }

    #[test]
    fn test_patch_accepts_numbers_and_aliases() {
        let patch = OrderPatch::from_value(json!({
            "state": "Annuler",
            "date": "01-02-2024",
            "phone": 550000000,
            "amount": 4500,
            "wilaya": 16,
            "isStopDesk": true,
            "isExchange": "OUI",
            "stationName": "Station Alger"
        }))
        .unwrap();

        assert_eq!(patch.status.as_deref(), Some("Annuler"));
        assert_eq!(patch.created_date.as_deref(), Some("01-02-2024"));
        assert_eq!(patch.phone.as_deref(), Some("550000000"));
        assert_eq!(patch.amount.as_deref(), Some("4500"));
        assert_eq!(patch.wilaya.as_deref(), Some("16"));
        assert_eq!(patch.is_stop_desk, Some(true));
        assert_eq!(patch.is_exchange, Some(true));
        assert_eq!(patch.product, None);
    }

    #[test]
    fn test_patch_rejects_non_objects() {
        let err = OrderPatch::from_value(json!(["Ali"])).unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        assert!(OrderPatch::from_value(json!("Ali")).is_err());
    }

    #[test]
    fn test_order_serializes_camel_case() {
        let order = Order::new("19-10-2026".into()).with_row_id(2);
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["rowId"], 2);
        assert_eq!(json["status"], "Nouvelle");
        assert_eq!(json["createdDate"], "19-10-2026");
        assert_eq!(json["weight"], "1");
        assert_eq!(json["isStopDesk"], false);
    }

    #[test]
    fn test_patch_rejects_lists_and_objects() {
        for body in [
            json!({ "client": ["x"] }),
            json!({ "amount": { "value": 4500 } }),
            json!({ "isStopDesk": ["OUI"] }),
        ] {
            let err = OrderPatch::from_value(body.clone()).unwrap_err();
            assert!(matches!(err, CoreError::ValidationError(_)), "{}", body);
        }
    }
}

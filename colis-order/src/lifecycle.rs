use crate::models::{normalize_phone, Order, OrderPatch, OrderStatus, SubmissionResult, DEFAULT_WEIGHT};
use crate::schema::{self, Column};

/// Builds the order a create request describes: status `Nouvelle`, dated
/// `today`, no tracking yet.
pub fn create(input: &OrderPatch, today: &str) -> Order {
    fill(input, OrderStatus::New, today.to_string())
}

/// Applies an edit to a stored order.
///
/// Any status may follow any other. The tracking id survives every edit
/// except moving an order out of a submitted status, which clears it.
/// Fields the patch leaves out come back blank.
pub fn apply_update(existing: &Order, patch: &OrderPatch) -> Order {
    let status = non_empty(&patch.status)
        .map(OrderStatus::from)
        .unwrap_or_else(|| existing.status.clone());

    let tracking = if existing.status.is_submitted() && status != existing.status {
        String::new()
    } else {
        existing.tracking.clone()
    };

    let created_date = non_empty(&patch.created_date)
        .map(str::to_string)
        .unwrap_or_else(|| existing.created_date.clone());

    Order {
        row_id: existing.row_id,
        tracking,
        message_sent: existing.message_sent,
        ..fill(patch, status, created_date)
    }
}

/// Records a shipment the carrier accepted on the stored row. The only
/// transition that sets a non-empty tracking id. Status and tracking are
/// the only cells written; the rest of the row is returned as stored.
pub fn mark_submitted(row: &[String], result: &SubmissionResult) -> Vec<String> {
    let mut row = row.to_vec();
    schema::set_cell(&mut row, Column::Status, OrderStatus::Submitted.as_str());
    schema::set_cell(&mut row, Column::Tracking, &result.tracking);
    row
}

fn fill(patch: &OrderPatch, status: OrderStatus, created_date: String) -> Order {
    let text = |field: &Option<String>| field.clone().unwrap_or_default();
    let is_stop_desk = patch.is_stop_desk.unwrap_or(false);

    // A stop desk parcel goes to the station, not to the customer.
    let (address, commune) = if is_stop_desk {
        let station = text(&patch.station_name);
        (station.clone(), station)
    } else {
        (text(&patch.address), text(&patch.commune))
    };

    Order {
        row_id: None,
        status,
        created_date,
        reference: text(&patch.reference),
        client: text(&patch.client),
        phone: normalize_phone(&text(&patch.phone)),
        phone2: normalize_phone(&text(&patch.phone2)),
        address,
        commune,
        amount: text(&patch.amount),
        wilaya: text(&patch.wilaya),
        product: text(&patch.product),
        note: text(&patch.note),
        weight: non_empty(&patch.weight)
            .unwrap_or(DEFAULT_WEIGHT)
            .to_string(),
        is_pickup: patch.is_pickup.unwrap_or(false),
        is_exchange: patch.is_exchange.unwrap_or(false),
        is_stop_desk,
        can_open: patch.can_open.unwrap_or(false),
        station_code: if is_stop_desk {
            text(&patch.station_code)
        } else {
            String::new()
        },
        tracking: String::new(),
        message_sent: false,
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

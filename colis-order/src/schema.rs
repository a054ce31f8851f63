//! Positional layout of an order row.
//!
//! Each column index has exactly one meaning for the lifetime of a
//! partition. Encode and decode both go through [`Column`], so the layout is
//! declared here and nowhere else.

use crate::models::{decode_flag, encode_flag, Order, OrderStatus};

/// Number of cells an encoded order occupies (columns A to T).
pub const ROW_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Status,
    Date,
    Reference,
    Client,
    Phone,
    Phone2,
    Address,
    Commune,
    Amount,
    Wilaya,
    Product,
    Note,
    Weight,
    Pickup,
    Exchange,
    StopDesk,
    Open,
    StationCode,
    Tracking,
    MessageSent,
}

impl Column {
    pub const ALL: [Column; ROW_WIDTH] = [
        Column::Status,
        Column::Date,
        Column::Reference,
        Column::Client,
        Column::Phone,
        Column::Phone2,
        Column::Address,
        Column::Commune,
        Column::Amount,
        Column::Wilaya,
        Column::Product,
        Column::Note,
        Column::Weight,
        Column::Pickup,
        Column::Exchange,
        Column::StopDesk,
        Column::Open,
        Column::StationCode,
        Column::Tracking,
        Column::MessageSent,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Header text of the column in a freshly created partition.
    pub fn label(self) -> &'static str {
        match self {
            Column::Status => "Etat",
            Column::Date => "Date",
            Column::Reference => "Reference",
            Column::Client => "Client",
            Column::Phone => "Phone",
            Column::Phone2 => "Phone 2",
            Column::Address => "Adresse",
            Column::Commune => "Commune",
            Column::Amount => "Montant",
            Column::Wilaya => "Wilaya",
            Column::Product => "Produit",
            Column::Note => "Remarque",
            Column::Weight => "Poids",
            Column::Pickup => "PICK UP",
            Column::Exchange => "ECHANGE",
            Column::StopDesk => "STOP DESK",
            Column::Open => "Ouvrir",
            Column::StationCode => "Code Station",
            Column::Tracking => "Tracking",
            Column::MessageSent => "Message Envoyé",
        }
    }
}

/// Canonical header row.
pub fn header() -> Vec<String> {
    Column::ALL.iter().map(|c| c.label().to_string()).collect()
}

/// Builds an order from a row. Short rows are fine: missing cells read as
/// blank. Never fails; the row id is left for the caller to assign.
pub fn decode(row: &[String]) -> Order {
    let get = |column: Column| cell(row, column);
    let flag = |column: Column| decode_flag(&get(column));

    Order {
        row_id: None,
        status: OrderStatus::from(get(Column::Status)),
        created_date: get(Column::Date),
        reference: get(Column::Reference),
        client: get(Column::Client),
        phone: get(Column::Phone),
        phone2: get(Column::Phone2),
        address: get(Column::Address),
        commune: get(Column::Commune),
        amount: get(Column::Amount),
        wilaya: get(Column::Wilaya),
        product: get(Column::Product),
        note: get(Column::Note),
        weight: get(Column::Weight),
        is_pickup: flag(Column::Pickup),
        is_exchange: flag(Column::Exchange),
        is_stop_desk: flag(Column::StopDesk),
        can_open: flag(Column::Open),
        station_code: get(Column::StationCode),
        tracking: get(Column::Tracking),
        message_sent: flag(Column::MessageSent),
    }
}

/// Reads one cell as stored. A missing cell reads as blank.
pub fn cell(row: &[String], column: Column) -> String {
    row.get(column.index()).cloned().unwrap_or_default()
}

/// Overwrites one cell, padding a short row with blanks up to it.
pub fn set_cell(row: &mut Vec<String>, column: Column, value: &str) {
    let index = column.index();
    if row.len() <= index {
        row.resize(index + 1, String::new());
    }
    row[index] = value.to_string();
}

/// Lays an order out over the full row width. Every position is written,
/// blank when the field is empty.
pub fn encode(order: &Order) -> Vec<String> {
    Column::ALL
        .iter()
        .map(|&column| match column {
            Column::Status => order.status.as_str().to_string(),
            Column::Date => order.created_date.clone(),
            Column::Reference => order.reference.clone(),
            Column::Client => order.client.clone(),
            Column::Phone => order.phone.clone(),
            Column::Phone2 => order.phone2.clone(),
            Column::Address => order.address.clone(),
            Column::Commune => order.commune.clone(),
            Column::Amount => order.amount.clone(),
            Column::Wilaya => order.wilaya.clone(),
            Column::Product => order.product.clone(),
            Column::Note => order.note.clone(),
            Column::Weight => order.weight.clone(),
            Column::Pickup => encode_flag(order.is_pickup).to_string(),
            Column::Exchange => encode_flag(order.is_exchange).to_string(),
            Column::StopDesk => encode_flag(order.is_stop_desk).to_string(),
            Column::Open => encode_flag(order.can_open).to_string(),
            Column::StationCode => order.station_code.clone(),
            Column::Tracking => order.tracking.clone(),
            Column::MessageSent => encode_flag(order.message_sent).to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn sample() -> Order {
        Order {
            row_id: None,
            status: OrderStatus::Custom("Atelier".into()),
            created_date: "27-10-2023".into(),
            reference: "REF-001".into(),
            client: "Ali".into(),
            phone: "0550000000".into(),
            phone2: "0661000000".into(),
            address: "Rue Didouche".into(),
            commune: "Alger Centre".into(),
            amount: "5000".into(),
            wilaya: "16".into(),
            product: "Montre".into(),
            note: "fragile".into(),
            weight: "2".into(),
            is_pickup: true,
            is_exchange: false,
            is_stop_desk: true,
            can_open: true,
            station_code: "STOP01".into(),
            tracking: "T123".into(),
            message_sent: true,
        }
    }

    #[test]
    fn test_column_indices_are_positional() {
        for (i, column) in Column::ALL.iter().enumerate() {
            assert_eq!(column.index(), i);
        }
        assert_eq!(Column::Tracking.index(), 18);
        assert_eq!(Column::MessageSent.index(), 19);
        assert_eq!(header().len(), ROW_WIDTH);
    }

    #[test]
    fn test_decode_encode_preserves_every_field() {
        let order = sample();
        let encoded = encode(&order);
        assert_eq!(encoded.len(), ROW_WIDTH);
        assert_eq!(decode(&encoded), order);
    }

    #[test]
    fn test_decode_short_row() {
        let order = decode(&row(&["Nouvelle", "01-01-2024", "R1", "Ali"]));
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.client, "Ali");
        assert_eq!(order.phone, "");
        assert_eq!(order.tracking, "");
        assert!(!order.is_stop_desk);

        let empty = decode(&[]);
        assert_eq!(empty.status.as_str(), "");
        assert_eq!(empty.reference, "");
    }

    #[test]
    fn test_flags_only_accept_oui() {
        let mut cells = vec![String::new(); ROW_WIDTH];
        cells[Column::Pickup.index()] = "oui".into();
        cells[Column::Exchange.index()] = "OUI".into();
        cells[Column::StopDesk.index()] = "true".into();
        let order = decode(&cells);
        assert!(!order.is_pickup);
        assert!(order.is_exchange);
        assert!(!order.is_stop_desk);
    }

    #[test]
    fn test_encode_blank_order_keeps_full_width() {
        let encoded = encode(&Order::default());
        assert_eq!(encoded.len(), ROW_WIDTH);
        assert_eq!(encoded[Column::Status.index()], "Nouvelle");
        assert!(encoded[1..].iter().all(|c| c.is_empty()));
    }

    #[test]
    fn test_cells_beyond_schema_are_ignored() {
        let mut cells = encode(&sample());
        cells.push("extra".into());
        assert_eq!(decode(&cells), sample());
    }

    #[test]
    fn test_set_cell_pads_short_rows_and_keeps_the_rest() {
        let mut cells = row(&["Nouvelle", "01-01-2024"]);
        set_cell(&mut cells, Column::Tracking, "T1");
        assert_eq!(cells.len(), Column::Tracking.index() + 1);
        assert_eq!(cell(&cells, Column::Tracking), "T1");
        assert_eq!(cell(&cells, Column::Date), "01-01-2024");
        assert_eq!(cell(&cells, Column::MessageSent), "");

        set_cell(&mut cells, Column::Status, "System");
        assert_eq!(cells[0], "System");
        assert_eq!(cells.len(), Column::Tracking.index() + 1);
    }
}

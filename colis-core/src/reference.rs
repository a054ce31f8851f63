use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub code: String,
    /// Tenant role; doubles as the partition name holding the tenant's orders.
    pub role: String,
}

/// Raw lookup tables as read from the workbook, header rows included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceRows {
    pub wilayas: Vec<Vec<String>>,
    pub communes: Vec<Vec<String>>,
    pub stations: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wilaya {
    pub code: String,
    pub name: String,
    /// Home delivery price
    pub delivery_price: String,
    /// Stop desk delivery price
    pub delivery_price_desk: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commune {
    pub name: String,
    pub wilaya_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub wilayas: Vec<Wilaya>,
    pub communes: Vec<Commune>,
    pub stations: Vec<Station>,
}

impl ReferenceData {
    pub fn from_rows(rows: &ReferenceRows) -> Self {
        Self {
            wilayas: body(&rows.wilayas)
                .map(|r| Wilaya {
                    code: cell(r, 0),
                    name: cell(r, 1),
                    delivery_price: cell(r, 2),
                    delivery_price_desk: cell(r, 3),
                })
                .collect(),
            communes: body(&rows.communes)
                .map(|r| Commune {
                    name: cell(r, 0),
                    wilaya_code: cell(r, 1),
                })
                .collect(),
            stations: body(&rows.stations)
                .map(|r| Station {
                    name: cell(r, 0),
                    code: cell(r, 1),
                })
                .collect(),
        }
    }
}

// A table with only a header (or nothing) has no body.
fn body(rows: &[Vec<String>]) -> impl Iterator<Item = &Vec<String>> {
    rows.iter().skip(1)
}

fn cell(row: &[String], index: usize) -> String {
    row.get(index).cloned().unwrap_or_default()
}

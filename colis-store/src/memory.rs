use async_trait::async_trait;
use colis_core::{
    Account, AccountDirectory, CoreError, CoreResult, ReferenceRows, ReferenceSource, RowStore,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

/// In-process workbook: named partitions of string rows plus the account
/// and reference sheets. Behaves like the spreadsheet for everything the
/// order desk relies on, including the row shift after a delete.
#[derive(Default)]
pub struct MemoryWorkbook {
    sheets: RwLock<HashMap<String, Vec<Vec<String>>>>,
    accounts: Vec<Account>,
    references: ReferenceRows,
    validations: HashMap<String, Value>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeded demo workbook: two tenants (`alger` with one order, `oran`
    /// empty), login codes `123` and `456`, a few wilayas, communes and
    /// stations, and a status dropdown on column A.
    pub fn demo(header: Vec<String>) -> Self {
        let mut sample = vec![
            "Nouvelle", "27-10-2023", "REF-001", "Mock Client", "0550000000", "",
            "Alger Centre", "Alger Centre", "5000", "16", "Montre", "", "1",
        ]
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();
        sample.resize(header.len(), String::new());

        Self::new()
            .with_partition("alger", vec![header.clone(), sample])
            .with_partition("oran", vec![header])
            .with_account("123", "alger")
            .with_account("456", "oran")
            .with_references(ReferenceRows {
                wilayas: table(&[
                    &["Code", "Wilaya", "Prix", "Prix Desk"],
                    &["1", "Adrar", "1400", "900"],
                    &["16", "Alger", "400", "300"],
                ]),
                communes: table(&[
                    &["Commune", "Wilaya"],
                    &["Alger Centre", "16"],
                    &["Bab El Oued", "16"],
                    &["Adrar", "1"],
                ]),
                stations: table(&[
                    &["Station", "Code"],
                    &["Station Alger", "STOP01"],
                    &["Station Adrar", "STOP02"],
                ]),
            })
            .with_validation(
                "A",
                json!({
                    "condition": {
                        "type": "ONE_OF_LIST",
                        "values": [
                            { "userEnteredValue": "Nouvelle" },
                            { "userEnteredValue": "Atelier" },
                            { "userEnteredValue": "Annuler" }
                        ]
                    },
                    "showCustomUi": true
                }),
            )
    }

    pub fn with_partition(mut self, name: &str, rows: Vec<Vec<String>>) -> Self {
        self.sheets.get_mut().insert(name.to_string(), rows);
        self
    }

    pub fn with_account(mut self, code: &str, role: &str) -> Self {
        self.accounts.push(Account {
            code: code.to_string(),
            role: role.to_string(),
        });
        self
    }

    pub fn with_references(mut self, references: ReferenceRows) -> Self {
        self.references = references;
        self
    }

    pub fn with_validation(mut self, column: &str, rule: Value) -> Self {
        self.validations.insert(column.to_uppercase(), rule);
        self
    }

    /// Snapshot of a partition, empty when it does not exist.
    pub async fn rows(&self, partition: &str) -> Vec<Vec<String>> {
        self.sheets
            .read()
            .await
            .get(partition)
            .cloned()
            .unwrap_or_default()
    }
}

fn table(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect()
}

fn missing(partition: &str) -> CoreError {
    CoreError::StoreError(format!("Sheet {} not found", partition))
}

fn position(row_index: u32) -> CoreResult<usize> {
    if row_index == 0 {
        return Err(CoreError::StoreError("Row indices start at 1".into()));
    }
    Ok(row_index as usize - 1)
}

#[async_trait]
impl RowStore for MemoryWorkbook {
    async fn get_all_rows(&self, partition: &str) -> CoreResult<Vec<Vec<String>>> {
        let sheets = self.sheets.read().await;
        sheets.get(partition).cloned().ok_or_else(|| missing(partition))
    }

    async fn append_row(&self, partition: &str, row: &[String]) -> CoreResult<u32> {
        let mut sheets = self.sheets.write().await;
        let rows = sheets.get_mut(partition).ok_or_else(|| missing(partition))?;
        rows.push(row.to_vec());
        let row_index = rows.len() as u32;
        info!(partition, row_index, "row appended");
        Ok(row_index)
    }

    async fn update_row(&self, partition: &str, row_index: u32, row: &[String]) -> CoreResult<()> {
        let at = position(row_index)?;
        let mut sheets = self.sheets.write().await;
        let rows = sheets.get_mut(partition).ok_or_else(|| missing(partition))?;
        if rows.len() <= at {
            rows.resize(at + 1, Vec::new());
        }
        // Cells past the written range keep their value, as in the sheet.
        let target = &mut rows[at];
        if target.len() < row.len() {
            target.resize(row.len(), String::new());
        }
        target[..row.len()].clone_from_slice(row);
        info!(partition, row_index, "row updated");
        Ok(())
    }

    async fn delete_row(&self, partition: &str, row_index: u32) -> CoreResult<()> {
        let at = position(row_index)?;
        let mut sheets = self.sheets.write().await;
        let rows = sheets.get_mut(partition).ok_or_else(|| missing(partition))?;
        if at >= rows.len() {
            return Err(CoreError::StoreError(format!(
                "Row {} is beyond the end of sheet {}",
                row_index, partition
            )));
        }
        rows.remove(at);
        info!(partition, row_index, "row deleted");
        Ok(())
    }

    async fn update_cell(
        &self,
        partition: &str,
        row_index: u32,
        column_index: usize,
        value: &str,
    ) -> CoreResult<()> {
        let at = position(row_index)?;
        let mut sheets = self.sheets.write().await;
        let rows = sheets.get_mut(partition).ok_or_else(|| missing(partition))?;
        if rows.len() <= at {
            rows.resize(at + 1, Vec::new());
        }
        let target = &mut rows[at];
        if target.len() <= column_index {
            target.resize(column_index + 1, String::new());
        }
        target[column_index] = value.to_string();
        info!(partition, row_index, column_index, "cell updated");
        Ok(())
    }
}

#[async_trait]
impl AccountDirectory for MemoryWorkbook {
    async fn find_account(&self, code: &str) -> CoreResult<Option<Account>> {
        Ok(self.accounts.iter().find(|a| a.code == code).cloned())
    }
}

#[async_trait]
impl ReferenceSource for MemoryWorkbook {
    async fn reference_rows(&self) -> CoreResult<ReferenceRows> {
        Ok(self.references.clone())
    }

    async fn column_validation(&self, partition: &str, column: &str) -> CoreResult<Option<Value>> {
        if !self.sheets.read().await.contains_key(partition) {
            return Err(missing(partition));
        }
        Ok(self.validations.get(&column.to_uppercase()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn workbook() -> MemoryWorkbook {
        MemoryWorkbook::new().with_partition("t", vec![cells(&["h1", "h2", "h3"])])
    }

    #[tokio::test]
    async fn test_append_returns_sheet_row() {
        let book = workbook();
        assert_eq!(book.append_row("t", &cells(&["a"])).await.unwrap(), 2);
        assert_eq!(book.append_row("t", &cells(&["b"])).await.unwrap(), 3);
        assert_eq!(book.get_all_rows("t").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_moves_rows_up() {
        let book = workbook();
        for v in ["a", "b", "c"] {
            book.append_row("t", &cells(&[v])).await.unwrap();
        }
        book.delete_row("t", 3).await.unwrap();
        let rows = book.rows("t").await;
        assert_eq!(rows[1], cells(&["a"]));
        assert_eq!(rows[2], cells(&["c"]));
        assert!(book.delete_row("t", 9).await.is_err());
    }

    #[tokio::test]
    async fn test_update_row_keeps_trailing_cells() {
        let book = workbook();
        book.append_row("t", &cells(&["a", "b", "c", "d"])).await.unwrap();
        book.update_row("t", 2, &cells(&["x", "y"])).await.unwrap();
        assert_eq!(book.rows("t").await[1], cells(&["x", "y", "c", "d"]));
    }

    #[tokio::test]
    async fn test_update_cell_pads_short_rows() {
        let book = workbook();
        book.append_row("t", &cells(&["a"])).await.unwrap();
        book.update_cell("t", 2, 3, "OUI").await.unwrap();
        assert_eq!(book.rows("t").await[1], cells(&["a", "", "", "OUI"]));
    }

    #[tokio::test]
    async fn test_unknown_partition_fails() {
        let book = workbook();
        assert!(matches!(
            book.get_all_rows("nope").await,
            Err(CoreError::StoreError(_))
        ));
        assert!(book.append_row("nope", &cells(&["a"])).await.is_err());
        assert!(book.update_row("t", 0, &cells(&["a"])).await.is_err());
    }

    #[tokio::test]
    async fn test_demo_workbook() {
        let header = cells(&["Etat", "Date", "Reference"]);
        let book = MemoryWorkbook::demo(header.clone());

        let alger = book.get_all_rows("alger").await.unwrap();
        assert_eq!(alger[0], header);
        assert_eq!(alger[1][2], "REF-001");
        assert_eq!(book.get_all_rows("oran").await.unwrap().len(), 1);

        let account = book.find_account("456").await.unwrap().unwrap();
        assert_eq!(account.role, "oran");
        assert!(book.find_account("999").await.unwrap().is_none());

        let references = book.reference_rows().await.unwrap();
        assert_eq!(references.stations[1], cells(&["Station Alger", "STOP01"]));

        let rule = book.column_validation("alger", "a").await.unwrap().unwrap();
        assert_eq!(rule["condition"]["type"], "ONE_OF_LIST");
        assert!(book.column_validation("alger", "B").await.unwrap().is_none());
    }
}

use async_trait::async_trait;
use serde_json::Value;

use crate::reference::{Account, ReferenceRows};
use crate::CoreResult;

/// Positional row access over one named partition (a spreadsheet sheet).
///
/// Row indices are 1-based and match the spreadsheet row number, so the
/// header lives at row 1 and the first order at row 2.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// All rows of the partition, header first. Missing partition content
    /// is an empty vector.
    async fn get_all_rows(&self, partition: &str) -> CoreResult<Vec<Vec<String>>>;

    /// Appends a row and returns the row number it landed on.
    async fn append_row(&self, partition: &str, row: &[String]) -> CoreResult<u32>;

    async fn update_row(&self, partition: &str, row_index: u32, row: &[String]) -> CoreResult<()>;

    /// Removes the row; every following row moves up by one.
    async fn delete_row(&self, partition: &str, row_index: u32) -> CoreResult<()>;

    async fn update_cell(
        &self,
        partition: &str,
        row_index: u32,
        column_index: usize,
        value: &str,
    ) -> CoreResult<()>;
}

/// Login codes and the tenant role each one unlocks.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn find_account(&self, code: &str) -> CoreResult<Option<Account>>;
}

/// Shared lookup tables and per-column validation rules.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn reference_rows(&self) -> CoreResult<ReferenceRows>;

    /// Data-validation rule attached to a column of the partition, if any.
    async fn column_validation(&self, partition: &str, column: &str) -> CoreResult<Option<Value>>;
}

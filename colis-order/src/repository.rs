use chrono::Local;
use colis_core::{CarrierClient, CoreError, CoreResult, RowStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::bridge::CarrierBridge;
use crate::lifecycle;
use crate::locator::{find_column, MESSAGE_SENT_FALLBACK, MESSAGE_SENT_HINTS};
use crate::models::{decode_flag, Order, OrderPatch, SubmissionResult};
use crate::schema::{self, Column};

/// Sheet row of the first order; row 1 is the header.
pub const FIRST_DATA_ROW: u32 = 2;

/// Order operations over tenant partitions.
///
/// Every call is a plain read-modify-write against the row store. Nothing
/// is cached between calls and nothing is locked: concurrent writes to one
/// row race and the last one wins. Row ids shift when an earlier row is
/// deleted, so they must not be kept across deletes.
pub struct OrderRepository {
    store: Arc<dyn RowStore>,
    bridge: CarrierBridge,
}

impl OrderRepository {
    pub fn new(store: Arc<dyn RowStore>, carrier: Arc<dyn CarrierClient>) -> Self {
        Self {
            store,
            bridge: CarrierBridge::new(carrier),
        }
    }

    pub fn bridge(&self) -> &CarrierBridge {
        &self.bridge
    }

    /// All orders of the partition, in sheet order.
    pub async fn list(&self, partition: &str) -> CoreResult<Vec<Order>> {
        let rows = self.store.get_all_rows(partition).await?;
        let Some((header, body)) = rows.split_first() else {
            return Ok(Vec::new());
        };
        let message_column = message_column(partition, header);

        let orders = body
            .iter()
            .zip(FIRST_DATA_ROW..)
            .map(|(row, row_id)| {
                let mut order = schema::decode(row).with_row_id(row_id);
                order.message_sent = row.get(message_column).is_some_and(|cell| decode_flag(cell));
                order
            })
            .collect();
        Ok(orders)
    }

    /// Appends a new order and returns its row id.
    pub async fn create(&self, partition: &str, input: &OrderPatch) -> CoreResult<u32> {
        let today = Local::now().format("%d-%m-%Y").to_string();
        let order = lifecycle::create(input, &today);

        let row_id = self
            .store
            .append_row(partition, &schema::encode(&order))
            .await?;
        info!(partition, row_id, reference = %order.reference, "order created");
        Ok(row_id)
    }

    pub async fn update(&self, partition: &str, row_id: u32, patch: &OrderPatch) -> CoreResult<()> {
        let (existing, stored) = self.load(partition, row_id).await?;
        let updated = lifecycle::apply_update(&existing, patch);

        // Column T belongs to whatever the header puts there, which is not
        // always the message flag. Write back what was read.
        let mut row = schema::encode(&updated);
        schema::set_cell(&mut row, Column::MessageSent, &schema::cell(&stored, Column::MessageSent));

        self.store.update_row(partition, row_id, &row).await?;
        info!(
            partition,
            row_id,
            from = %existing.status,
            to = %updated.status,
            tracking_cleared = existing.has_tracking() && !updated.has_tracking(),
            "order updated"
        );
        Ok(())
    }

    /// Removes the order. Every order below it moves up one row.
    pub async fn delete(&self, partition: &str, row_id: u32) -> CoreResult<()> {
        if row_id < FIRST_DATA_ROW {
            return Err(not_found(row_id));
        }
        self.store.delete_row(partition, row_id).await?;
        info!(partition, row_id, "order deleted");
        Ok(())
    }

    /// Writes the message flag cell and returns the column it went to.
    pub async fn set_message_sent(&self, partition: &str, row_id: u32, value: &str) -> CoreResult<usize> {
        let rows = self.store.get_all_rows(partition).await?;
        let header = rows
            .first()
            .ok_or_else(|| CoreError::NotFoundError(format!("Partition {} is empty", partition)))?;
        if row_id < FIRST_DATA_ROW || row_id as usize > rows.len() {
            return Err(not_found(row_id));
        }

        let column = message_column(partition, header);
        self.store
            .update_cell(partition, row_id, column, value)
            .await?;
        info!(partition, row_id, column, value, "message status updated");
        Ok(column)
    }

    /// Hands the order to the carrier and records the tracking id it returns.
    pub async fn submit_to_carrier(&self, partition: &str, row_id: u32) -> CoreResult<SubmissionResult> {
        let (existing, stored) = self.load(partition, row_id).await?;
        let result = self.bridge.submit(&existing).await?;

        self.store
            .update_row(partition, row_id, &lifecycle::mark_submitted(&stored, &result))
            .await?;
        info!(partition, row_id, tracking = %result.tracking, "order submitted to carrier");
        Ok(result)
    }

    /// The decoded order together with the row exactly as stored.
    async fn load(&self, partition: &str, row_id: u32) -> CoreResult<(Order, Vec<String>)> {
        let mut rows = self.store.get_all_rows(partition).await?;
        if row_id < FIRST_DATA_ROW || row_id as usize > rows.len() {
            return Err(not_found(row_id));
        }
        let stored = rows.swap_remove(row_id as usize - 1);
        Ok((schema::decode(&stored).with_row_id(row_id), stored))
    }
}

fn message_column(partition: &str, header: &[String]) -> usize {
    match find_column(header, &MESSAGE_SENT_HINTS) {
        Some(column) => {
            debug!(partition, column, "message column found in header");
            column
        }
        None => {
            warn!(partition, column = MESSAGE_SENT_FALLBACK, "no message column in header, using default");
            MESSAGE_SENT_FALLBACK
        }
    }
}

fn not_found(row_id: u32) -> CoreError {
    CoreError::NotFoundError(format!("Order not found at row {}", row_id))
}

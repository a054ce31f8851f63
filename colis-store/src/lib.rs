pub mod app_config;
pub mod memory;
pub mod noest;
pub mod scripted;
pub mod sheets;

pub use app_config::{BackendMode, Config};
pub use memory::MemoryWorkbook;
pub use noest::NoestClient;
pub use scripted::ScriptedCarrier;
pub use sheets::SheetsClient;

use colis_core::{AccountDirectory, CarrierClient, CoreResult, ReferenceSource, RowStore};
use std::sync::Arc;
use tracing::info;

/// The collaborators an order desk runs against.
#[derive(Clone)]
pub struct Backends {
    pub rows: Arc<dyn RowStore>,
    pub accounts: Arc<dyn AccountDirectory>,
    pub references: Arc<dyn ReferenceSource>,
    pub carrier: Arc<dyn CarrierClient>,
}

impl Backends {
    /// Builds the backends `config.backend.mode` asks for. A real backend
    /// that cannot be built is an error, never a switch to the doubles.
    pub fn from_config(config: &Config, header: Vec<String>) -> CoreResult<Self> {
        match config.backend.mode {
            BackendMode::Real => {
                let sheets = Arc::new(SheetsClient::new(config.sheets.clone())?);
                let carrier = Arc::new(NoestClient::new(&config.carrier)?);
                info!(spreadsheet = %config.sheets.spreadsheet_id, carrier = %carrier.base_url(), "using real backends");
                Ok(Self {
                    rows: sheets.clone(),
                    accounts: sheets.clone(),
                    references: sheets,
                    carrier,
                })
            }
            BackendMode::TestDouble => {
                info!("using in-memory workbook and scripted carrier");
                Ok(Self::test_double(
                    Arc::new(MemoryWorkbook::demo(header)),
                    Arc::new(ScriptedCarrier::new()),
                ))
            }
        }
    }

    pub fn test_double(workbook: Arc<MemoryWorkbook>, carrier: Arc<ScriptedCarrier>) -> Self {
        Self {
            rows: workbook.clone(),
            accounts: workbook.clone(),
            references: workbook,
            carrier,
        }
    }
}

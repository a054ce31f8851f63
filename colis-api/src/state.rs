use colis_core::{AccountDirectory, ReferenceSource};
use colis_order::OrderRepository;
use colis_store::Backends;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderRepository>,
    pub accounts: Arc<dyn AccountDirectory>,
    pub references: Arc<dyn ReferenceSource>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(backends: Backends, auth: AuthConfig) -> Self {
        Self {
            orders: Arc::new(OrderRepository::new(backends.rows, backends.carrier)),
            accounts: backends.accounts,
            references: backends.references,
            auth,
        }
    }
}

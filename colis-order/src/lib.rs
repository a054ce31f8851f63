pub mod models;
pub mod schema;
pub mod lifecycle;
pub mod locator;
pub mod bridge;
pub mod repository;

pub use models::{Order, OrderPatch, OrderStatus, SubmissionResult};
pub use schema::Column;
pub use bridge::{CarrierBridge, CarrierOrderRequest};
pub use repository::OrderRepository;

//! Application services: the operations the transport layer calls.
//!
//! Each service owns no state beyond its storage handle (and clock or quantity
//! policy); all consistency comes from storage transactions.

pub mod cart;
pub mod catalog;
pub mod customers;
pub mod delivery;
pub mod orders;
pub mod payments;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use customers::CustomerDirectory;
pub use delivery::DeliveryTracker;
pub use orders::{CHECKPOINT_DELIVERY_WRITTEN, CHECKPOINT_ORDER_WRITTEN, OrderService};
pub use payments::PaymentLedger;

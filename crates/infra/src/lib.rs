//! Infrastructure layer: storage, clock, configuration and the application
//! services that tie the domain crates together.

pub mod clock;
pub mod config;
pub mod error;
pub mod services;
pub mod storage;
pub mod storefront;


pub use clock::{Clock, ManualClock, SystemClock};
pub use config::StorefrontConfig;
pub use error::{CommerceError, CommerceResult, StoreError};
pub use services::{
    CartService, CatalogService, CustomerDirectory, DeliveryTracker, OrderService, PaymentLedger,
};
pub use storage::{InMemoryStorage, ReadView, RowCounts, Storage, UnitOfWork};
pub use storefront::Storefront;

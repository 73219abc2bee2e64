//! Wiring of the storefront services over one shared storage backend.

use std::sync::Arc;

use storefront_cart::QuantityPolicy;

use crate::clock::{Clock, SystemClock};
use crate::config::StorefrontConfig;
use crate::error::CommerceResult;
use crate::services::{
    CartService, CatalogService, CustomerDirectory, DeliveryTracker, OrderService, PaymentLedger,
};
use crate::storage::{InMemoryStorage, Storage};

/// Every storefront service, sharing one storage backend and clock.
pub struct Storefront<S> {
    storage: Arc<S>,
    pub catalog: CatalogService<S>,
    pub customers: CustomerDirectory<S>,
    pub cart: CartService<S>,
    pub orders: OrderService<S>,
    pub payments: PaymentLedger<S>,
    pub delivery: DeliveryTracker<S>,
}

impl<S> Storefront<S>
where
    S: Storage,
{
    pub fn new(
        storage: Arc<S>,
        clock: Arc<dyn Clock>,
        config: &StorefrontConfig,
    ) -> CommerceResult<Self> {
        let policy = QuantityPolicy::new(config.max_item_quantity)?;

        Ok(Self {
            catalog: CatalogService::new(storage.clone()),
            customers: CustomerDirectory::new(storage.clone(), clock.clone()),
            cart: CartService::new(storage.clone(), policy),
            orders: OrderService::new(storage.clone(), clock.clone()),
            payments: PaymentLedger::new(storage.clone(), clock.clone()),
            delivery: DeliveryTracker::new(storage.clone(), clock),
            storage,
        })
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

impl Storefront<InMemoryStorage> {
    /// Initialise logging and wire an in-memory backend with the system clock.
    pub fn bootstrap(config: &StorefrontConfig) -> CommerceResult<Self> {
        storefront_observability::init(config.log_format);

        let storefront = Self::new(
            Arc::new(InMemoryStorage::new()),
            Arc::new(SystemClock),
            config,
        )?;
        tracing::info!(
            max_item_quantity = config.max_item_quantity,
            log_format = config.log_format.as_str(),
            "storefront ready"
        );
        Ok(storefront)
    }
}

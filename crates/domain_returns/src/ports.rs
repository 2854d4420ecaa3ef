//! Returns Domain Ports
//!
//! The [`ReturnStore`] trait covers the returns workflow's own rows plus the
//! two collaborator surfaces it touches: the sale subsystem (read the sale,
//! flip its `has_returns` flag) and the product subsystem (stock deltas,
//! which must never drive stock negative).
//!
//! Fetches return `Option`; every mutating method is one atomic unit.

use async_trait::async_trait;

use core_kernel::{DomainPort, PortError, ProductId, ReturnId, SaleId};

use crate::eligibility::SaleRecord;
use crate::order::{ReturnOrder, StockAdjustment};

/// Storage port for the returns domain
#[async_trait]
pub trait ReturnStore: DomainPort {
    /// Looks up the sale view by id
    async fn find_sale(&self, id: SaleId) -> Result<Option<SaleRecord>, PortError>;

    /// Inserts a sale view (populated by the sale flow)
    async fn insert_sale(&self, sale: &SaleRecord) -> Result<(), PortError>;

    /// Looks up a return by id
    async fn find_return(&self, id: ReturnId) -> Result<Option<ReturnOrder>, PortError>;

    /// Returns every return captured for a sale
    async fn returns_for_sale(&self, sale_id: SaleId) -> Result<Vec<ReturnOrder>, PortError>;

    /// Credit-note number of the most recently created return
    async fn latest_credit_note_number(&self) -> Result<Option<String>, PortError>;

    /// Inserts the return with its items and marks the sale `has_returns`
    ///
    /// Must fail with `Conflict` on a duplicate credit-note number.
    async fn insert_return(&self, order: &ReturnOrder) -> Result<(), PortError>;

    /// Updates a return row (approval/rejection)
    async fn update_return(&self, order: &ReturnOrder) -> Result<(), PortError>;

    /// Applies the stock deltas and stores the completed return in one unit
    ///
    /// Must fail with `Conflict` (applying nothing) if any delta would drive
    /// a product's stock negative.
    async fn complete_return(
        &self,
        order: &ReturnOrder,
        adjustments: &[StockAdjustment],
    ) -> Result<(), PortError>;

    /// Current stock of a product
    async fn product_stock(&self, id: ProductId) -> Result<Option<i64>, PortError>;

    /// Sets a product's stock (populated by the product flow)
    async fn set_product_stock(&self, id: ProductId, stock: i64) -> Result<(), PortError>;
}

/// In-memory mock implementation of [`ReturnStore`] for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Mock store backed by `HashMap`s behind an async lock
    #[derive(Debug, Default)]
    pub struct MockReturnStore {
        sales: Arc<RwLock<HashMap<SaleId, SaleRecord>>>,
        returns: Arc<RwLock<HashMap<ReturnId, ReturnOrder>>>,
        // Creation order, for latest_credit_note_number
        credit_notes: Arc<RwLock<Vec<String>>>,
        stock: Arc<RwLock<HashMap<ProductId, i64>>>,
    }

    impl MockReturnStore {
        /// Creates an empty mock store
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with sales for testing
        pub async fn with_sales(sales: Vec<SaleRecord>) -> Self {
            let store = Self::new();
            for sale in sales {
                store.sales.write().await.insert(sale.id, sale);
            }
            store
        }
    }

    impl DomainPort for MockReturnStore {}

    #[async_trait]
    impl ReturnStore for MockReturnStore {
        async fn find_sale(&self, id: SaleId) -> Result<Option<SaleRecord>, PortError> {
            Ok(self.sales.read().await.get(&id).cloned())
        }

        async fn insert_sale(&self, sale: &SaleRecord) -> Result<(), PortError> {
            self.sales.write().await.insert(sale.id, sale.clone());
            Ok(())
        }

        async fn find_return(&self, id: ReturnId) -> Result<Option<ReturnOrder>, PortError> {
            Ok(self.returns.read().await.get(&id).cloned())
        }

        async fn returns_for_sale(
            &self,
            sale_id: SaleId,
        ) -> Result<Vec<ReturnOrder>, PortError> {
            let mut orders: Vec<_> = self
                .returns
                .read()
                .await
                .values()
                .filter(|r| r.original_sale_id == sale_id)
                .cloned()
                .collect();
            orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(orders)
        }

        async fn latest_credit_note_number(&self) -> Result<Option<String>, PortError> {
            Ok(self.credit_notes.read().await.last().cloned())
        }

        async fn insert_return(&self, order: &ReturnOrder) -> Result<(), PortError> {
            let mut credit_notes = self.credit_notes.write().await;
            if credit_notes.contains(&order.credit_note_number) {
                return Err(PortError::conflict(format!(
                    "credit note number {} already exists",
                    order.credit_note_number
                )));
            }

            let mut sales = self.sales.write().await;
            let sale = sales
                .get_mut(&order.original_sale_id)
                .ok_or_else(|| PortError::not_found("Sale", order.original_sale_id))?;

            sale.has_returns = true;
            credit_notes.push(order.credit_note_number.clone());
            self.returns.write().await.insert(order.id, order.clone());
            Ok(())
        }

        async fn update_return(&self, order: &ReturnOrder) -> Result<(), PortError> {
            let mut returns = self.returns.write().await;
            if !returns.contains_key(&order.id) {
                return Err(PortError::not_found("Return", order.id));
            }
            returns.insert(order.id, order.clone());
            Ok(())
        }

        async fn complete_return(
            &self,
            order: &ReturnOrder,
            adjustments: &[StockAdjustment],
        ) -> Result<(), PortError> {
            let mut stock = self.stock.write().await;

            // Verify every final level before applying anything.
            let mut final_levels = Vec::with_capacity(adjustments.len());
            for adjustment in adjustments {
                let current = stock.get(&adjustment.product_id).copied().unwrap_or(0);
                let updated = current + adjustment.delta;
                if updated < 0 {
                    return Err(PortError::conflict(format!(
                        "stock for product {} would become negative ({})",
                        adjustment.product_id, updated
                    )));
                }
                final_levels.push((adjustment.product_id, updated));
            }
            for (product_id, level) in final_levels {
                stock.insert(product_id, level);
            }

            self.update_return(order).await
        }

        async fn product_stock(&self, id: ProductId) -> Result<Option<i64>, PortError> {
            Ok(self.stock.read().await.get(&id).copied())
        }

        async fn set_product_stock(&self, id: ProductId, stock: i64) -> Result<(), PortError> {
            self.stock.write().await.insert(id, stock);
            Ok(())
        }
    }
}

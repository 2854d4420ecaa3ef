//! Return workflow application service

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use core_kernel::{Money, ProductId, ReturnId, SaleId, UserId};

use crate::credit_note::next_credit_note_number;
use crate::eligibility::{check_eligibility, Eligibility, RequestedItem};
use crate::error::ReturnError;
use crate::order::{
    ProductCondition, RefundMethod, ReturnItem, ReturnOrder, ReturnType,
};
use crate::ports::ReturnStore;

/// Attempts at allocating a unique credit-note number before giving up
const CREDIT_NOTE_ATTEMPTS: usize = 3;

/// A return request as captured at the counter
#[derive(Debug, Clone)]
pub struct CreateReturn {
    pub sale_id: SaleId,
    pub return_type: ReturnType,
    pub reason: String,
    pub product_condition: ProductCondition,
    pub refund_amount: Money,
    pub refund_method: RefundMethod,
    pub requested_by: UserId,
    pub notes: Option<String>,
    pub items: Vec<ReturnItemRequest>,
}

/// One requested line
#[derive(Debug, Clone)]
pub struct ReturnItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
    pub restock_quantity: u32,
}

/// Service owning the return/credit-note workflow
pub struct ReturnService {
    store: Arc<dyn ReturnStore>,
}

impl ReturnService {
    /// Creates a new service over the given store
    pub fn new(store: Arc<dyn ReturnStore>) -> Self {
        Self { store }
    }

    /// Checks whether a request would be accepted, without writing anything
    pub async fn check_eligibility(
        &self,
        sale_id: SaleId,
        requested: &[RequestedItem],
    ) -> Result<Eligibility, ReturnError> {
        let sale = self.store.find_sale(sale_id).await?;
        let prior = self.store.returns_for_sale(sale_id).await?;
        Ok(check_eligibility(
            sale.as_ref(),
            &prior,
            requested,
            Utc::now().date_naive(),
        ))
    }

    /// Captures a return request
    ///
    /// Re-runs the eligibility rules, allocates the next credit-note number,
    /// and inserts the return, its items, and the sale's `has_returns` flag
    /// in one transaction. A duplicate-number conflict from a concurrent
    /// creator is retried with a freshly generated number.
    pub async fn create(&self, request: CreateReturn) -> Result<ReturnOrder, ReturnError> {
        self.validate_items(&request)?;

        let requested: Vec<RequestedItem> = request
            .items
            .iter()
            .map(|i| RequestedItem {
                product_id: i.product_id,
                quantity: i.quantity,
            })
            .collect();
        let eligibility = self.check_eligibility(request.sale_id, &requested).await?;
        if !eligibility.eligible {
            return Err(ReturnError::Ineligible(
                eligibility.message.unwrap_or_default(),
            ));
        }

        let items: Vec<ReturnItem> = request
            .items
            .iter()
            .map(|i| ReturnItem::new(i.product_id, i.quantity, i.unit_price, i.restock_quantity))
            .collect();

        for attempt in 1..=CREDIT_NOTE_ATTEMPTS {
            let last = self.store.latest_credit_note_number().await?;
            let number = next_credit_note_number(last.as_deref());

            let order = ReturnOrder::new(
                request.sale_id,
                number,
                request.return_type,
                request.reason.clone(),
                request.product_condition,
                request.refund_amount,
                request.refund_method,
                request.requested_by,
                request.notes.clone(),
                items.clone(),
            );

            match self.store.insert_return(&order).await {
                Ok(()) => {
                    info!(
                        return_id = %order.id,
                        sale_id = %order.original_sale_id,
                        credit_note = %order.credit_note_number,
                        "return request captured"
                    );
                    return Ok(order);
                }
                Err(e) if e.is_conflict() && attempt < CREDIT_NOTE_ATTEMPTS => {
                    debug!(
                        credit_note = %order.credit_note_number,
                        attempt,
                        "credit note number taken, regenerating"
                    );
                }
                Err(e) if e.is_conflict() => return Err(ReturnError::CreditNoteConflict),
                Err(e) => return Err(ReturnError::Storage(e)),
            }
        }
        Err(ReturnError::CreditNoteConflict)
    }

    /// Approves a pending request
    pub async fn approve(
        &self,
        id: ReturnId,
        approved_by: UserId,
    ) -> Result<ReturnOrder, ReturnError> {
        let mut order = self.require(id).await?;
        order.approve(approved_by)?;
        self.store.update_return(&order).await?;

        info!(return_id = %id, approved_by = %approved_by, "return approved");
        Ok(order)
    }

    /// Rejects a pending request, recording the reason in the notes
    pub async fn reject(&self, id: ReturnId, reason: &str) -> Result<ReturnOrder, ReturnError> {
        let mut order = self.require(id).await?;
        order.reject(reason)?;
        self.store.update_return(&order).await?;

        info!(return_id = %id, "return rejected");
        Ok(order)
    }

    /// Processes an approved return
    ///
    /// Applies every stock delta and the terminal COMPLETED status in one
    /// transaction; if any delta would drive stock negative, nothing is
    /// applied and the return stays APPROVED.
    pub async fn process(&self, id: ReturnId) -> Result<ReturnOrder, ReturnError> {
        let mut order = self.require(id).await?;
        let adjustments = order.stock_adjustments();
        order.mark_completed()?;

        self.store.complete_return(&order, &adjustments).await?;

        info!(
            return_id = %id,
            adjustments = adjustments.len(),
            "return processed"
        );
        Ok(order)
    }

    /// Returns a return order by id
    pub async fn return_order(&self, id: ReturnId) -> Result<ReturnOrder, ReturnError> {
        self.require(id).await
    }

    /// Returns every return captured for a sale, oldest first
    pub async fn returns_for_sale(
        &self,
        sale_id: SaleId,
    ) -> Result<Vec<ReturnOrder>, ReturnError> {
        Ok(self.store.returns_for_sale(sale_id).await?)
    }

    async fn require(&self, id: ReturnId) -> Result<ReturnOrder, ReturnError> {
        self.store
            .find_return(id)
            .await?
            .ok_or(ReturnError::ReturnNotFound(id))
    }

    fn validate_items(&self, request: &CreateReturn) -> Result<(), ReturnError> {
        if request.items.is_empty() {
            return Err(ReturnError::EmptyItems);
        }
        if request.refund_amount.is_negative() {
            return Err(ReturnError::NegativeRefund {
                amount: request.refund_amount,
            });
        }
        for item in &request.items {
            if item.quantity == 0 {
                return Err(ReturnError::NonPositiveQuantity {
                    product_id: item.product_id,
                });
            }
            if item.restock_quantity > item.quantity {
                return Err(ReturnError::RestockExceedsQuantity {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    restock: item.restock_quantity,
                });
            }
        }
        Ok(())
    }
}

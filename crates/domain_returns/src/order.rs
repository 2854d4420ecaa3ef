//! Return order aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{Money, ProductId, ReturnId, SaleId, UserId};

use crate::error::ReturnError;

/// Return status
///
/// `PENDING -> APPROVED -> COMPLETED`, or `PENDING -> REJECTED`. REJECTED and
/// COMPLETED are terminal; APPROVED only ever advances to COMPLETED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl ReturnStatus {
    /// Wire/storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnStatus::Pending => "PENDING",
            ReturnStatus::Approved => "APPROVED",
            ReturnStatus::Rejected => "REJECTED",
            ReturnStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReturnStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ReturnStatus::Pending),
            "APPROVED" => Ok(ReturnStatus::Approved),
            "REJECTED" => Ok(ReturnStatus::Rejected),
            "COMPLETED" => Ok(ReturnStatus::Completed),
            other => Err(format!("unknown return status: {other}")),
        }
    }
}

/// How the sale is being reversed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnType {
    /// Money back
    Refund,
    /// Exchange for the same product (replacement unit leaves stock)
    ExchangeSame,
    /// Exchange for a different product (handled as refund + new sale)
    ExchangeDifferent,
}

impl ReturnType {
    /// Wire/storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnType::Refund => "REFUND",
            ReturnType::ExchangeSame => "EXCHANGE_SAME",
            ReturnType::ExchangeDifferent => "EXCHANGE_DIFFERENT",
        }
    }
}

impl FromStr for ReturnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REFUND" => Ok(ReturnType::Refund),
            "EXCHANGE_SAME" => Ok(ReturnType::ExchangeSame),
            "EXCHANGE_DIFFERENT" => Ok(ReturnType::ExchangeDifferent),
            other => Err(format!("unknown return type: {other}")),
        }
    }
}

/// Condition of the returned product as assessed at the counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCondition {
    Excellent,
    Good,
    Defective,
    Damaged,
}

impl ProductCondition {
    /// Only resellable conditions go back into stock
    pub fn allows_restock(&self) -> bool {
        matches!(self, ProductCondition::Excellent | ProductCondition::Good)
    }

    /// Wire/storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCondition::Excellent => "EXCELLENT",
            ProductCondition::Good => "GOOD",
            ProductCondition::Defective => "DEFECTIVE",
            ProductCondition::Damaged => "DAMAGED",
        }
    }
}

impl FromStr for ProductCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EXCELLENT" => Ok(ProductCondition::Excellent),
            "GOOD" => Ok(ProductCondition::Good),
            "DEFECTIVE" => Ok(ProductCondition::Defective),
            "DAMAGED" => Ok(ProductCondition::Damaged),
            other => Err(format!("unknown product condition: {other}")),
        }
    }
}

/// How the refund is paid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundMethod {
    Cash,
    Card,
    StoreCredit,
    Transfer,
}

impl RefundMethod {
    /// Wire/storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundMethod::Cash => "CASH",
            RefundMethod::Card => "CARD",
            RefundMethod::StoreCredit => "STORE_CREDIT",
            RefundMethod::Transfer => "TRANSFER",
        }
    }
}

impl FromStr for RefundMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CASH" => Ok(RefundMethod::Cash),
            "CARD" => Ok(RefundMethod::Card),
            "STORE_CREDIT" => Ok(RefundMethod::StoreCredit),
            "TRANSFER" => Ok(RefundMethod::Transfer),
            other => Err(format!("unknown refund method: {other}")),
        }
    }
}

/// One returned line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnItem {
    /// Returned product
    pub product_id: ProductId,
    /// Returned quantity
    pub quantity: u32,
    /// Unit price at sale time
    pub unit_price: Money,
    /// quantity x unit_price
    pub total: Money,
    /// How many units go back into stock (at most `quantity`)
    pub restock_quantity: u32,
}

impl ReturnItem {
    /// Creates a return line, computing its total
    pub fn new(
        product_id: ProductId,
        quantity: u32,
        unit_price: Money,
        restock_quantity: u32,
    ) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
            total: unit_price.multiply(rust_decimal::Decimal::from(quantity)),
            restock_quantity,
        }
    }
}

/// A stock delta to apply when a return is processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    /// Positive restocks, negative removes (replacement units)
    pub delta: i64,
}

/// A request to reverse part of a sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnOrder {
    /// Unique identifier
    pub id: ReturnId,
    /// The sale being reversed
    pub original_sale_id: SaleId,
    /// Sequential credit-note number, unique (`NC-########`)
    pub credit_note_number: String,
    /// How the sale is reversed
    pub return_type: ReturnType,
    /// Customer's stated reason
    pub reason: String,
    /// Assessed condition of the returned goods
    pub product_condition: ProductCondition,
    /// Amount refunded to the customer
    pub refund_amount: Money,
    /// How the refund is paid out
    pub refund_method: RefundMethod,
    /// Status
    pub status: ReturnStatus,
    /// Approver
    pub approved_by: Option<UserId>,
    /// Approval timestamp
    pub approved_at: Option<DateTime<Utc>>,
    /// Free-form notes; rejection reasons are appended here
    pub notes: Option<String>,
    /// Who captured the request
    pub requested_by: UserId,
    /// Returned lines
    pub items: Vec<ReturnItem>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl ReturnOrder {
    /// Creates a new PENDING return order
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        original_sale_id: SaleId,
        credit_note_number: String,
        return_type: ReturnType,
        reason: String,
        product_condition: ProductCondition,
        refund_amount: Money,
        refund_method: RefundMethod,
        requested_by: UserId,
        notes: Option<String>,
        items: Vec<ReturnItem>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ReturnId::new_v7(),
            original_sale_id,
            credit_note_number,
            return_type,
            reason,
            product_condition,
            refund_amount,
            refund_method,
            status: ReturnStatus::Pending,
            approved_by: None,
            approved_at: None,
            notes,
            requested_by,
            items,
            created_at: now,
            updated_at: now,
        }
    }

    /// Outstanding returns block new requests on the same sale
    pub fn is_outstanding(&self) -> bool {
        matches!(self.status, ReturnStatus::Pending | ReturnStatus::Approved)
    }

    /// Only APPROVED/COMPLETED returns count against the sold quantity
    pub fn counts_as_returned(&self) -> bool {
        matches!(self.status, ReturnStatus::Approved | ReturnStatus::Completed)
    }

    /// Quantity of a product this return claims back
    pub fn returned_quantity(&self, product_id: ProductId) -> u32 {
        self.items
            .iter()
            .filter(|i| i.product_id == product_id)
            .map(|i| i.quantity)
            .sum()
    }

    /// Approves a pending request
    pub fn approve(&mut self, approved_by: UserId) -> Result<(), ReturnError> {
        self.transition_guard(ReturnStatus::Pending, ReturnStatus::Approved)?;
        self.status = ReturnStatus::Approved;
        self.approved_by = Some(approved_by);
        self.approved_at = Some(Utc::now());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Rejects a pending request, appending the reason to the notes
    pub fn reject(&mut self, reason: &str) -> Result<(), ReturnError> {
        self.transition_guard(ReturnStatus::Pending, ReturnStatus::Rejected)?;
        self.status = ReturnStatus::Rejected;
        let suffix = format!("[RECHAZADO]: {reason}");
        self.notes = Some(match self.notes.take() {
            Some(existing) => format!("{existing}\n{suffix}"),
            None => suffix,
        });
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Marks an approved request as processed
    pub fn mark_completed(&mut self) -> Result<(), ReturnError> {
        self.transition_guard(ReturnStatus::Approved, ReturnStatus::Completed)?;
        self.status = ReturnStatus::Completed;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// The stock deltas processing this return must apply
    ///
    /// Restock happens only when the line asked for it and the assessed
    /// condition is resellable. A same-product exchange additionally hands a
    /// replacement unit to the customer, which leaves stock regardless of
    /// whether the defective unit was restocked.
    pub fn stock_adjustments(&self) -> Vec<StockAdjustment> {
        let mut adjustments = Vec::new();
        for item in &self.items {
            let mut delta: i64 = 0;
            if item.restock_quantity > 0 && self.product_condition.allows_restock() {
                delta += i64::from(item.restock_quantity);
            }
            if self.return_type == ReturnType::ExchangeSame {
                delta -= i64::from(item.quantity);
            }
            if delta != 0 {
                adjustments.push(StockAdjustment {
                    product_id: item.product_id,
                    delta,
                });
            }
        }
        adjustments
    }

    fn transition_guard(
        &self,
        expected: ReturnStatus,
        target: ReturnStatus,
    ) -> Result<(), ReturnError> {
        if self.status != expected {
            return Err(ReturnError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: target,
            });
        }
        Ok(())
    }
}

//! Test Data Builders
//!
//! Builder patterns for constructing test data with sensible defaults. Tests
//! specify only the relevant fields and take defaults for everything else.

use chrono::NaiveDate;

use core_kernel::{ClientId, Money, ProductId, SaleId, UserId};
use domain_receivables::Invoice;
use domain_returns::{
    CreateReturn, ProductCondition, RefundMethod, ReturnItemRequest, ReturnType, SaleLine,
    SaleRecord,
};

use crate::fixtures::{MoneyFixtures, TemporalFixtures};

/// Builder for receivable invoices
pub struct InvoiceBuilder {
    number: String,
    client_id: ClientId,
    total: Money,
    due_date: NaiveDate,
}

impl Default for InvoiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceBuilder {
    /// Creates a builder with default values
    pub fn new() -> Self {
        Self {
            number: "FAC-00000001".to_string(),
            client_id: ClientId::new(),
            total: MoneyFixtures::standard_total(),
            due_date: TemporalFixtures::due_in_30_days(),
        }
    }

    /// Sets the invoice number
    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = number.into();
        self
    }

    /// Sets the billed client
    pub fn with_client(mut self, client_id: ClientId) -> Self {
        self.client_id = client_id;
        self
    }

    /// Sets the invoice total
    pub fn with_total(mut self, total: Money) -> Self {
        self.total = total;
        self
    }

    /// Sets the due date
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = due_date;
        self
    }

    /// Builds the invoice (status PENDING, nothing paid)
    pub fn build(self) -> Invoice {
        Invoice::issue(self.number, self.client_id, self.total, self.due_date)
    }
}

/// Builder for the sale view consumed by the returns workflow
pub struct SaleRecordBuilder {
    sale: SaleRecord,
}

impl Default for SaleRecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SaleRecordBuilder {
    /// Creates a builder for an active sale sold yesterday, with no lines
    pub fn new() -> Self {
        Self {
            sale: SaleRecord {
                id: SaleId::new_v7(),
                sold_at: TemporalFixtures::days_ago(1),
                is_active: true,
                is_cancelled: false,
                has_returns: false,
                lines: Vec::new(),
            },
        }
    }

    /// Moves the sale date the given number of days into the past
    pub fn sold_days_ago(mut self, days: i64) -> Self {
        self.sale.sold_at = TemporalFixtures::days_ago(days);
        self
    }

    /// Marks the sale cancelled
    pub fn cancelled(mut self) -> Self {
        self.sale.is_cancelled = true;
        self
    }

    /// Marks the sale inactive
    pub fn inactive(mut self) -> Self {
        self.sale.is_active = false;
        self
    }

    /// Adds a fully specified line
    pub fn with_line(mut self, line: SaleLine) -> Self {
        self.sale.lines.push(line);
        self
    }

    /// Adds a returnable line at the standard unit price
    pub fn with_simple_line(self, product_id: ProductId, quantity: u32) -> Self {
        self.with_line(SaleLine {
            product_id,
            product_name: "Producto de prueba".to_string(),
            quantity,
            unit_price: MoneyFixtures::unit_price(),
            is_returnable: true,
            return_deadline_days: None,
        })
    }

    /// Builds the sale record
    pub fn build(self) -> SaleRecord {
        self.sale
    }
}

/// Builder for return requests
pub struct ReturnRequestBuilder {
    request: CreateReturn,
}

impl ReturnRequestBuilder {
    /// Creates a builder for a refund request against the given sale
    pub fn new(sale_id: SaleId) -> Self {
        Self {
            request: CreateReturn {
                sale_id,
                return_type: ReturnType::Refund,
                reason: "No era lo esperado".to_string(),
                product_condition: ProductCondition::Good,
                refund_amount: MoneyFixtures::unit_price(),
                refund_method: RefundMethod::Cash,
                requested_by: UserId::new(),
                notes: None,
                items: Vec::new(),
            },
        }
    }

    /// Sets the return type
    pub fn with_type(mut self, return_type: ReturnType) -> Self {
        self.request.return_type = return_type;
        self
    }

    /// Sets the assessed product condition
    pub fn with_condition(mut self, condition: ProductCondition) -> Self {
        self.request.product_condition = condition;
        self
    }

    /// Sets the refund amount
    pub fn with_refund(mut self, amount: Money) -> Self {
        self.request.refund_amount = amount;
        self
    }

    /// Sets the notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.request.notes = Some(notes.into());
        self
    }

    /// Adds an item at the standard unit price
    pub fn with_item(mut self, product_id: ProductId, quantity: u32, restock: u32) -> Self {
        self.request.items.push(ReturnItemRequest {
            product_id,
            quantity,
            unit_price: MoneyFixtures::unit_price(),
            restock_quantity: restock,
        });
        self
    }

    /// Builds the request
    pub fn build(self) -> CreateReturn {
        self.request
    }
}

//! Payment application service

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use core_kernel::{InvoiceId, Money};

use crate::error::ReceivableError;
use crate::invoice::{Invoice, InvoiceStatus};
use crate::payment::{Payment, PaymentMethod};
use crate::ports::ReceivableStore;

/// Result of a successful payment application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub invoice: Invoice,
}

/// Service applying payments against receivable invoices
pub struct PaymentService {
    store: Arc<dyn ReceivableStore>,
}

impl PaymentService {
    /// Creates a new service over the given store
    pub fn new(store: Arc<dyn ReceivableStore>) -> Self {
        Self { store }
    }

    /// Applies a payment to an invoice
    ///
    /// Fails before touching storage when the invoice is missing, already
    /// fully paid, or the amount is non-positive, in the wrong currency, or
    /// exceeds the open balance. Payment insert and invoice update commit as
    /// one unit; on any storage failure the invoice stays untouched.
    pub async fn create_payment(
        &self,
        invoice_id: InvoiceId,
        amount: Money,
        method: PaymentMethod,
        reference: Option<String>,
        notes: Option<String>,
    ) -> Result<PaymentReceipt, ReceivableError> {
        let mut invoice = self
            .store
            .find_invoice(invoice_id)
            .await?
            .ok_or(ReceivableError::InvoiceNotFound(invoice_id))?;

        if invoice.status == InvoiceStatus::Paid {
            return Err(ReceivableError::InvoiceAlreadyPaid(invoice_id));
        }
        if !amount.is_positive() {
            return Err(ReceivableError::NonPositiveAmount { amount });
        }
        if amount.currency() != invoice.currency() {
            return Err(ReceivableError::CurrencyMismatch {
                given: amount.currency(),
                expected: invoice.currency(),
            });
        }
        if amount > invoice.balance {
            return Err(ReceivableError::Overpayment {
                amount,
                balance: invoice.balance,
            });
        }

        let payment = Payment::new(invoice_id, amount, method)
            .with_reference(reference)
            .with_notes(notes);
        invoice.apply_payment(amount);

        self.store.record_payment(&payment, &invoice).await?;

        info!(
            invoice_id = %invoice_id,
            payment_id = %payment.id,
            amount = %amount,
            new_balance = %invoice.balance,
            status = %invoice.status,
            "payment applied"
        );
        Ok(PaymentReceipt { payment, invoice })
    }

    /// Returns an invoice by id
    pub async fn invoice(&self, invoice_id: InvoiceId) -> Result<Invoice, ReceivableError> {
        self.store
            .find_invoice(invoice_id)
            .await?
            .ok_or(ReceivableError::InvoiceNotFound(invoice_id))
    }

    /// Returns an invoice's payments, most recent payment date first
    pub async fn payments_for_invoice(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Vec<Payment>, ReceivableError> {
        // Resolve the invoice first so an unknown id is a NotFound, not an
        // empty list.
        let _ = self.invoice(invoice_id).await?;
        Ok(self.store.payments_for_invoice(invoice_id).await?)
    }

    /// Returns all payments, most recent payment date first
    pub async fn all_payments(&self) -> Result<Vec<Payment>, ReceivableError> {
        Ok(self.store.all_payments().await?)
    }

    /// Flags an invoice past its due date as OVERDUE
    ///
    /// Only PENDING or PARTIAL invoices can be flagged; payment application
    /// afterwards derives PARTIAL/PAID as usual.
    pub async fn flag_overdue(&self, invoice_id: InvoiceId) -> Result<Invoice, ReceivableError> {
        let mut invoice = self.invoice(invoice_id).await?;

        match invoice.status {
            InvoiceStatus::Paid => return Err(ReceivableError::InvoiceAlreadyPaid(invoice_id)),
            InvoiceStatus::Overdue => return Err(ReceivableError::AlreadyOverdue(invoice_id)),
            InvoiceStatus::Pending | InvoiceStatus::Partial => {}
        }

        let today = Utc::now().date_naive();
        if !invoice.is_overdue(today) {
            return Err(ReceivableError::NotPastDue {
                id: invoice_id,
                due_date: invoice.due_date,
            });
        }

        invoice.status = InvoiceStatus::Overdue;
        invoice.updated_at = Utc::now();
        self.store.update_invoice(&invoice).await?;

        info!(invoice_id = %invoice_id, due_date = %invoice.due_date, "invoice flagged overdue");
        Ok(invoice)
    }
}

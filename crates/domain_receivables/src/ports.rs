//! Receivables Domain Ports
//!
//! The [`ReceivableStore`] trait defines everything the payment-application
//! service needs from its data source. Fetches return `Option`; the one
//! mutating method of the payment path, [`ReceivableStore::record_payment`],
//! inserts the payment row and updates the invoice row as a single atomic
//! unit, so a partially-applied payment is structurally impossible.

use async_trait::async_trait;

use core_kernel::{DomainPort, InvoiceId, PortError};

use crate::invoice::Invoice;
use crate::payment::Payment;

/// Storage port for the receivables domain
#[async_trait]
pub trait ReceivableStore: DomainPort {
    /// Looks up an invoice by id
    async fn find_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, PortError>;

    /// Inserts an invoice (issued by the sale/billing flow)
    ///
    /// Must fail with `Conflict` on a duplicate invoice number.
    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), PortError>;

    /// Updates an invoice row (dunning status changes)
    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), PortError>;

    /// Inserts the payment and stores the updated invoice in one atomic unit
    async fn record_payment(
        &self,
        payment: &Payment,
        invoice: &Invoice,
    ) -> Result<(), PortError>;

    /// Returns an invoice's payments, most recent payment date first
    async fn payments_for_invoice(&self, id: InvoiceId) -> Result<Vec<Payment>, PortError>;

    /// Returns all payments, most recent payment date first
    async fn all_payments(&self) -> Result<Vec<Payment>, PortError>;
}

/// In-memory mock implementation of [`ReceivableStore`] for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Mock store backed by `HashMap`s behind an async lock
    #[derive(Debug, Default)]
    pub struct MockReceivableStore {
        invoices: Arc<RwLock<HashMap<InvoiceId, Invoice>>>,
        payments: Arc<RwLock<Vec<Payment>>>,
    }

    impl MockReceivableStore {
        /// Creates an empty mock store
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with invoices for testing
        pub async fn with_invoices(invoices: Vec<Invoice>) -> Self {
            let store = Self::new();
            for invoice in invoices {
                store.invoices.write().await.insert(invoice.id, invoice);
            }
            store
        }

        /// Total number of stored payments
        pub async fn payment_count(&self) -> usize {
            self.payments.read().await.len()
        }
    }

    impl DomainPort for MockReceivableStore {}

    #[async_trait]
    impl ReceivableStore for MockReceivableStore {
        async fn find_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, PortError> {
            Ok(self.invoices.read().await.get(&id).cloned())
        }

        async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
            let mut invoices = self.invoices.write().await;
            if invoices.values().any(|i| i.number == invoice.number) {
                return Err(PortError::conflict(format!(
                    "invoice number {} already exists",
                    invoice.number
                )));
            }
            invoices.insert(invoice.id, invoice.clone());
            Ok(())
        }

        async fn update_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
            let mut invoices = self.invoices.write().await;
            if !invoices.contains_key(&invoice.id) {
                return Err(PortError::not_found("Invoice", invoice.id));
            }
            invoices.insert(invoice.id, invoice.clone());
            Ok(())
        }

        async fn record_payment(
            &self,
            payment: &Payment,
            invoice: &Invoice,
        ) -> Result<(), PortError> {
            let mut invoices = self.invoices.write().await;
            if !invoices.contains_key(&invoice.id) {
                return Err(PortError::not_found("Invoice", invoice.id));
            }
            invoices.insert(invoice.id, invoice.clone());
            self.payments.write().await.push(payment.clone());
            Ok(())
        }

        async fn payments_for_invoice(
            &self,
            id: InvoiceId,
        ) -> Result<Vec<Payment>, PortError> {
            let mut payments: Vec<_> = self
                .payments
                .read()
                .await
                .iter()
                .filter(|p| p.invoice_id == id)
                .cloned()
                .collect();
            payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
            Ok(payments)
        }

        async fn all_payments(&self) -> Result<Vec<Payment>, PortError> {
            let mut payments: Vec<_> = self.payments.read().await.clone();
            payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
            Ok(payments)
        }
    }
}

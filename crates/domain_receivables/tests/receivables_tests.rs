//! Comprehensive tests for domain_receivables

use std::sync::Arc;

use rust_decimal_macros::dec;

use core_kernel::{Currency, ErrorKind, InvoiceId, Money};
use domain_receivables::ports::mock::MockReceivableStore;
use domain_receivables::{
    Invoice, InvoiceStatus, PaymentMethod, PaymentService, ReceivableError,
};
use test_utils::assertions::{assert_money_eq, assert_money_zero};
use test_utils::builders::InvoiceBuilder;
use test_utils::fixtures::TemporalFixtures;

fn dop(amount: rust_decimal::Decimal) -> Money {
    Money::new(amount, Currency::DOP)
}

async fn service_with(invoices: Vec<Invoice>) -> (PaymentService, Arc<MockReceivableStore>) {
    let store = Arc::new(MockReceivableStore::with_invoices(invoices).await);
    (PaymentService::new(store.clone()), store)
}

fn invoice_of(total: rust_decimal::Decimal) -> Invoice {
    InvoiceBuilder::new().with_total(dop(total)).build()
}

// ============================================================================
// Payment application
// ============================================================================

mod payment_tests {
    use super::*;

    #[tokio::test]
    async fn test_partial_payment() {
        let invoice = invoice_of(dec!(500));
        let id = invoice.id;
        let (service, _) = service_with(vec![invoice]).await;

        let receipt = service
            .create_payment(id, dop(dec!(200)), PaymentMethod::Cash, None, None)
            .await
            .unwrap();

        assert_money_eq(&receipt.payment.amount, &dop(dec!(200)));
        assert_money_eq(&receipt.invoice.paid_amount, &dop(dec!(200)));
        assert_money_eq(&receipt.invoice.balance, &dop(dec!(300)));
        assert_eq!(receipt.invoice.status, InvoiceStatus::Partial);
    }

    #[tokio::test]
    async fn test_full_payment_reaches_paid_exactly() {
        let invoice = invoice_of(dec!(500));
        let id = invoice.id;
        let (service, _) = service_with(vec![invoice]).await;

        let receipt = service
            .create_payment(id, dop(dec!(500)), PaymentMethod::Transfer, None, None)
            .await
            .unwrap();

        assert_money_zero(&receipt.invoice.balance);
        assert_eq!(receipt.invoice.status, InvoiceStatus::Paid);
    }

    #[tokio::test]
    async fn test_second_payment_on_paid_invoice_is_invalid_state() {
        let invoice = invoice_of(dec!(500));
        let id = invoice.id;
        let (service, _) = service_with(vec![invoice]).await;

        service
            .create_payment(id, dop(dec!(500)), PaymentMethod::Cash, None, None)
            .await
            .unwrap();
        let err = service
            .create_payment(id, dop(dec!(0.01)), PaymentMethod::Cash, None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ReceivableError::InvoiceAlreadyPaid(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_overpayment_never_mutates_the_invoice() {
        let invoice = invoice_of(dec!(500));
        let id = invoice.id;
        let (service, store) = service_with(vec![invoice]).await;

        let err = service
            .create_payment(id, dop(dec!(500.01)), PaymentMethod::Cash, None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ReceivableError::Overpayment { .. }));
        assert_eq!(err.kind(), ErrorKind::Validation);

        let untouched = service.invoice(id).await.unwrap();
        assert_eq!(untouched.balance, dop(dec!(500)));
        assert_eq!(untouched.paid_amount, dop(dec!(0)));
        assert_eq!(untouched.status, InvoiceStatus::Pending);
        assert_eq!(store.payment_count().await, 0);
    }

    #[tokio::test]
    async fn test_overpayment_after_partial() {
        let invoice = invoice_of(dec!(500));
        let id = invoice.id;
        let (service, _) = service_with(vec![invoice]).await;

        service
            .create_payment(id, dop(dec!(400)), PaymentMethod::Cash, None, None)
            .await
            .unwrap();
        let err = service
            .create_payment(id, dop(dec!(101)), PaymentMethod::Cash, None, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReceivableError::Overpayment { balance, .. } if balance == dop(dec!(100))
        ));
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected() {
        let invoice = invoice_of(dec!(500));
        let id = invoice.id;
        let (service, _) = service_with(vec![invoice]).await;

        for amount in [dop(dec!(0)), dop(dec!(-10))] {
            let err = service
                .create_payment(id, amount, PaymentMethod::Cash, None, None)
                .await
                .unwrap_err();
            assert!(matches!(err, ReceivableError::NonPositiveAmount { .. }));
        }
    }

    #[tokio::test]
    async fn test_unknown_invoice_not_found() {
        let (service, _) = service_with(vec![]).await;

        let err = service
            .create_payment(
                InvoiceId::new(),
                dop(dec!(10)),
                PaymentMethod::Cash,
                None,
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ReceivableError::InvoiceNotFound(_)));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_currency_mismatch_rejected() {
        let invoice = invoice_of(dec!(500));
        let id = invoice.id;
        let (service, _) = service_with(vec![invoice]).await;

        let err = service
            .create_payment(
                id,
                Money::new(dec!(10), Currency::USD),
                PaymentMethod::Cash,
                None,
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ReceivableError::CurrencyMismatch { .. }));
    }

    #[tokio::test]
    async fn test_balance_invariant_across_a_payment_series() {
        let invoice = invoice_of(dec!(1000));
        let id = invoice.id;
        let (service, _) = service_with(vec![invoice]).await;

        for amount in [dec!(250), dec!(125.50), dec!(0.50), dec!(624)] {
            let receipt = service
                .create_payment(id, dop(amount), PaymentMethod::Cash, None, None)
                .await
                .unwrap();
            assert_eq!(
                receipt.invoice.balance,
                receipt.invoice.total - receipt.invoice.paid_amount
            );
            assert_eq!(
                receipt.invoice.status == InvoiceStatus::Paid,
                receipt.invoice.balance.is_zero()
            );
        }

        let settled = service.invoice(id).await.unwrap();
        assert_eq!(settled.status, InvoiceStatus::Paid);
        assert_eq!(settled.paid_amount, dop(dec!(1000)));
    }

    #[tokio::test]
    async fn test_receipt_carries_reference_and_notes() {
        let invoice = invoice_of(dec!(100));
        let id = invoice.id;
        let (service, _) = service_with(vec![invoice]).await;

        let receipt = service
            .create_payment(
                id,
                dop(dec!(100)),
                PaymentMethod::Card,
                Some("VISA-9921".to_string()),
                Some("pago en mostrador".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(receipt.payment.reference.as_deref(), Some("VISA-9921"));
        assert_eq!(receipt.payment.notes.as_deref(), Some("pago en mostrador"));
    }
}

// ============================================================================
// Queries
// ============================================================================

mod query_tests {
    use super::*;

    #[tokio::test]
    async fn test_payments_for_invoice_newest_first() {
        let invoice = invoice_of(dec!(900));
        let id = invoice.id;
        let (service, _) = service_with(vec![invoice]).await;

        for amount in [dec!(100), dec!(200), dec!(300)] {
            service
                .create_payment(id, dop(amount), PaymentMethod::Cash, None, None)
                .await
                .unwrap();
        }

        let payments = service.payments_for_invoice(id).await.unwrap();
        assert_eq!(payments.len(), 3);
        for pair in payments.windows(2) {
            assert!(pair[0].payment_date >= pair[1].payment_date);
        }
    }

    #[tokio::test]
    async fn test_payments_for_unknown_invoice_not_found() {
        let (service, _) = service_with(vec![]).await;

        let err = service
            .payments_for_invoice(InvoiceId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReceivableError::InvoiceNotFound(_)));
    }

    #[tokio::test]
    async fn test_all_payments_spans_invoices() {
        let first = invoice_of(dec!(100));
        let second = invoice_of(dec!(100));
        let (first_id, second_id) = (first.id, second.id);
        let (service, _) = service_with(vec![first, second]).await;

        service
            .create_payment(first_id, dop(dec!(100)), PaymentMethod::Cash, None, None)
            .await
            .unwrap();
        service
            .create_payment(second_id, dop(dec!(50)), PaymentMethod::Card, None, None)
            .await
            .unwrap();

        let payments = service.all_payments().await.unwrap();
        assert_eq!(payments.len(), 2);
    }
}

// ============================================================================
// Overdue flagging
// ============================================================================

mod overdue_tests {
    use super::*;

    #[tokio::test]
    async fn test_flag_overdue_past_due_invoice() {
        let invoice = InvoiceBuilder::new()
            .with_total(dop(dec!(500)))
            .with_due_date(TemporalFixtures::past_due_date())
            .build();
        let id = invoice.id;
        let (service, _) = service_with(vec![invoice]).await;

        let flagged = service.flag_overdue(id).await.unwrap();
        assert_eq!(flagged.status, InvoiceStatus::Overdue);
    }

    #[tokio::test]
    async fn test_overdue_invoice_still_accepts_payment() {
        let invoice = InvoiceBuilder::new()
            .with_total(dop(dec!(500)))
            .with_due_date(TemporalFixtures::past_due_date())
            .build();
        let id = invoice.id;
        let (service, _) = service_with(vec![invoice]).await;
        service.flag_overdue(id).await.unwrap();

        let receipt = service
            .create_payment(id, dop(dec!(500)), PaymentMethod::Transfer, None, None)
            .await
            .unwrap();
        assert_eq!(receipt.invoice.status, InvoiceStatus::Paid);
    }

    #[tokio::test]
    async fn test_flag_overdue_twice_invalid_state() {
        let invoice = InvoiceBuilder::new()
            .with_due_date(TemporalFixtures::past_due_date())
            .build();
        let id = invoice.id;
        let (service, _) = service_with(vec![invoice]).await;
        service.flag_overdue(id).await.unwrap();

        let err = service.flag_overdue(id).await.unwrap_err();
        assert!(matches!(err, ReceivableError::AlreadyOverdue(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_flag_overdue_before_due_date_rejected() {
        let invoice = InvoiceBuilder::new()
            .with_due_date(TemporalFixtures::due_in_30_days())
            .build();
        let id = invoice.id;
        let (service, _) = service_with(vec![invoice]).await;

        let err = service.flag_overdue(id).await.unwrap_err();
        assert!(matches!(err, ReceivableError::NotPastDue { .. }));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_flag_overdue_on_paid_invoice_rejected() {
        let invoice = InvoiceBuilder::new()
            .with_total(dop(dec!(100)))
            .with_due_date(TemporalFixtures::past_due_date())
            .build();
        let id = invoice.id;
        let (service, _) = service_with(vec![invoice]).await;
        service
            .create_payment(id, dop(dec!(100)), PaymentMethod::Cash, None, None)
            .await
            .unwrap();

        let err = service.flag_overdue(id).await.unwrap_err();
        assert!(matches!(err, ReceivableError::InvoiceAlreadyPaid(_)));
    }
}

// ============================================================================
// Wire format
// ============================================================================

mod serde_tests {
    use super::*;

    #[test]
    fn test_statuses_serialize_in_screaming_case() {
        assert_eq!(
            serde_json::to_string(&InvoiceStatus::Partial).unwrap(),
            "\"PARTIAL\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Transfer).unwrap(),
            "\"TRANSFER\""
        );
    }
}

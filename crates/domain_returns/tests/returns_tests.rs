//! Comprehensive tests for domain_returns

use std::sync::Arc;

use rust_decimal_macros::dec;

use core_kernel::{Currency, ErrorKind, Money, ProductId, ReturnId, UserId};
use domain_returns::ports::mock::MockReturnStore;
use domain_returns::{
    ProductCondition, ReturnError, ReturnService, ReturnStatus, ReturnStore, ReturnType,
    SaleRecord,
};
use test_utils::builders::{ReturnRequestBuilder, SaleRecordBuilder};

fn dop(amount: rust_decimal::Decimal) -> Money {
    Money::new(amount, Currency::DOP)
}

async fn service_with(sales: Vec<SaleRecord>) -> (ReturnService, Arc<MockReturnStore>) {
    let store = Arc::new(MockReturnStore::with_sales(sales).await);
    (ReturnService::new(store.clone()), store)
}

/// One captured (PENDING) return over a single-line sale with seeded stock
async fn pending_return(
    condition: ProductCondition,
    return_type: ReturnType,
    quantity: u32,
    restock: u32,
    initial_stock: i64,
) -> (ReturnService, Arc<MockReturnStore>, ReturnId, ProductId) {
    let product_id = ProductId::new();
    let sale = SaleRecordBuilder::new()
        .with_simple_line(product_id, quantity)
        .build();
    let sale_id = sale.id;
    let (service, store) = service_with(vec![sale]).await;
    store
        .set_product_stock(product_id, initial_stock)
        .await
        .unwrap();

    let order = service
        .create(
            ReturnRequestBuilder::new(sale_id)
                .with_condition(condition)
                .with_type(return_type)
                .with_item(product_id, quantity, restock)
                .build(),
        )
        .await
        .unwrap();
    (service, store, order.id, product_id)
}

// ============================================================================
// Creation & credit-note numbering
// ============================================================================

mod create_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_captures_pending_return_and_flags_sale() {
        let product_id = ProductId::new();
        let sale = SaleRecordBuilder::new()
            .with_simple_line(product_id, 3)
            .build();
        let sale_id = sale.id;
        let (service, store) = service_with(vec![sale]).await;

        let order = service
            .create(
                ReturnRequestBuilder::new(sale_id)
                    .with_item(product_id, 2, 2)
                    .build(),
            )
            .await
            .unwrap();

        assert_eq!(order.status, ReturnStatus::Pending);
        assert_eq!(order.credit_note_number, "NC-00000001");
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].total, dop(dec!(200)));

        let sale = store.find_sale(sale_id).await.unwrap().unwrap();
        assert!(sale.has_returns);
    }

    #[tokio::test]
    async fn test_credit_note_numbers_are_sequential() {
        let product_id = ProductId::new();
        let sale = SaleRecordBuilder::new()
            .with_simple_line(product_id, 5)
            .build();
        let sale_id = sale.id;
        let (service, _) = service_with(vec![sale]).await;

        let first = service
            .create(
                ReturnRequestBuilder::new(sale_id)
                    .with_item(product_id, 1, 1)
                    .build(),
            )
            .await
            .unwrap();
        // Clear the outstanding return before requesting again.
        service.reject(first.id, "prueba").await.unwrap();

        let second = service
            .create(
                ReturnRequestBuilder::new(sale_id)
                    .with_item(product_id, 1, 1)
                    .build(),
            )
            .await
            .unwrap();

        assert_eq!(first.credit_note_number, "NC-00000001");
        assert_eq!(second.credit_note_number, "NC-00000002");
    }

    #[tokio::test]
    async fn test_ineligible_request_surfaces_the_message() {
        let (service, _) = service_with(vec![]).await;

        let err = service
            .create(
                ReturnRequestBuilder::new(core_kernel::SaleId::new())
                    .with_item(ProductId::new(), 1, 0)
                    .build(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ReturnError::Ineligible(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "La venta no existe");
    }

    #[tokio::test]
    async fn test_outstanding_return_blocks_second_request() {
        let product_id = ProductId::new();
        let sale = SaleRecordBuilder::new()
            .with_simple_line(product_id, 5)
            .build();
        let sale_id = sale.id;
        let (service, _) = service_with(vec![sale]).await;

        service
            .create(
                ReturnRequestBuilder::new(sale_id)
                    .with_item(product_id, 1, 1)
                    .build(),
            )
            .await
            .unwrap();

        let err = service
            .create(
                ReturnRequestBuilder::new(sale_id)
                    .with_item(product_id, 1, 1)
                    .build(),
            )
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Ya existe una devolución en proceso para esta venta"
        );
    }

    #[tokio::test]
    async fn test_cumulative_quantity_cap_across_returns() {
        let product_id = ProductId::new();
        let sale = SaleRecordBuilder::new()
            .with_simple_line(product_id, 3)
            .build();
        let sale_id = sale.id;
        let (service, _) = service_with(vec![sale]).await;

        let first = service
            .create(
                ReturnRequestBuilder::new(sale_id)
                    .with_item(product_id, 2, 0)
                    .build(),
            )
            .await
            .unwrap();
        service.approve(first.id, UserId::new()).await.unwrap();
        service.process(first.id).await.unwrap();

        // 2 of the 3 sold units are already returned; 2 more exceed the cap.
        let err = service
            .create(
                ReturnRequestBuilder::new(sale_id)
                    .with_item(product_id, 2, 2)
                    .build(),
            )
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("excede lo disponible"));
        assert!(message.contains("Disponible: 1"));
    }

    #[tokio::test]
    async fn test_expired_deadline_rejected() {
        let product_id = ProductId::new();
        let sale = SaleRecordBuilder::new()
            .sold_days_ago(31)
            .with_simple_line(product_id, 1)
            .build();
        let sale_id = sale.id;
        let (service, _) = service_with(vec![sale]).await;

        let err = service
            .create(
                ReturnRequestBuilder::new(sale_id)
                    .with_item(product_id, 1, 1)
                    .build(),
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("plazo de devolución"));
    }

    #[tokio::test]
    async fn test_cancelled_sale_rejected() {
        let product_id = ProductId::new();
        let sale = SaleRecordBuilder::new()
            .cancelled()
            .with_simple_line(product_id, 1)
            .build();
        let sale_id = sale.id;
        let (service, _) = service_with(vec![sale]).await;

        let err = service
            .create(
                ReturnRequestBuilder::new(sale_id)
                    .with_item(product_id, 1, 0)
                    .build(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "La venta no está activa o fue anulada");
    }

    #[tokio::test]
    async fn test_item_validation() {
        let product_id = ProductId::new();
        let sale = SaleRecordBuilder::new()
            .with_simple_line(product_id, 3)
            .build();
        let sale_id = sale.id;
        let (service, _) = service_with(vec![sale]).await;

        // No items at all.
        let err = service
            .create(ReturnRequestBuilder::new(sale_id).build())
            .await
            .unwrap_err();
        assert!(matches!(err, ReturnError::EmptyItems));

        // Zero quantity.
        let err = service
            .create(
                ReturnRequestBuilder::new(sale_id)
                    .with_item(product_id, 0, 0)
                    .build(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ReturnError::NonPositiveQuantity { .. }));

        // Restock above the returned quantity.
        let err = service
            .create(
                ReturnRequestBuilder::new(sale_id)
                    .with_item(product_id, 1, 2)
                    .build(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ReturnError::RestockExceedsQuantity { .. }));

        // Negative refund.
        let err = service
            .create(
                ReturnRequestBuilder::new(sale_id)
                    .with_item(product_id, 1, 1)
                    .with_refund(dop(dec!(-1)))
                    .build(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ReturnError::NegativeRefund { .. }));
    }
}

// ============================================================================
// Approval workflow
// ============================================================================

mod workflow_tests {
    use super::*;

    #[tokio::test]
    async fn test_approve_sets_approver_and_timestamp() {
        let (service, _, id, _) = pending_return(
            ProductCondition::Good,
            ReturnType::Refund,
            1,
            1,
            10,
        )
        .await;
        let approver = UserId::new();

        let order = service.approve(id, approver).await.unwrap();

        assert_eq!(order.status, ReturnStatus::Approved);
        assert_eq!(order.approved_by, Some(approver));
        assert!(order.approved_at.is_some());
    }

    #[tokio::test]
    async fn test_approve_unknown_return_not_found() {
        let (service, _) = service_with(vec![]).await;
        let err = service
            .approve(ReturnId::new(), UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReturnError::ReturnNotFound(_)));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_approve_non_pending_invalid_state() {
        let (service, _, id, _) = pending_return(
            ProductCondition::Good,
            ReturnType::Refund,
            1,
            1,
            10,
        )
        .await;
        service.approve(id, UserId::new()).await.unwrap();

        let err = service.approve(id, UserId::new()).await.unwrap_err();
        assert!(matches!(err, ReturnError::InvalidTransition { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_reject_appends_reason_and_preserves_notes() {
        let product_id = ProductId::new();
        let sale = SaleRecordBuilder::new()
            .with_simple_line(product_id, 1)
            .build();
        let sale_id = sale.id;
        let (service, _) = service_with(vec![sale]).await;

        let order = service
            .create(
                ReturnRequestBuilder::new(sale_id)
                    .with_item(product_id, 1, 1)
                    .with_notes("cliente frecuente")
                    .build(),
            )
            .await
            .unwrap();

        let rejected = service.reject(order.id, "sin recibo").await.unwrap();

        assert_eq!(rejected.status, ReturnStatus::Rejected);
        assert_eq!(
            rejected.notes.as_deref(),
            Some("cliente frecuente\n[RECHAZADO]: sin recibo")
        );
    }

    #[tokio::test]
    async fn test_reject_approved_return_invalid_state() {
        let (service, _, id, _) = pending_return(
            ProductCondition::Good,
            ReturnType::Refund,
            1,
            1,
            10,
        )
        .await;
        service.approve(id, UserId::new()).await.unwrap();

        let err = service.reject(id, "tarde").await.unwrap_err();
        assert!(matches!(err, ReturnError::InvalidTransition { .. }));
    }
}

// ============================================================================
// Processing & stock effects
// ============================================================================

mod process_tests {
    use super::*;

    #[tokio::test]
    async fn test_process_restocks_resellable_units() {
        let (service, store, id, product_id) = pending_return(
            ProductCondition::Excellent,
            ReturnType::Refund,
            5,
            5,
            10,
        )
        .await;
        service.approve(id, UserId::new()).await.unwrap();

        let order = service.process(id).await.unwrap();

        assert_eq!(order.status, ReturnStatus::Completed);
        assert_eq!(store.product_stock(product_id).await.unwrap(), Some(15));
    }

    #[tokio::test]
    async fn test_process_defective_skips_restock() {
        let (service, store, id, product_id) = pending_return(
            ProductCondition::Defective,
            ReturnType::Refund,
            5,
            5,
            10,
        )
        .await;
        service.approve(id, UserId::new()).await.unwrap();

        let order = service.process(id).await.unwrap();

        assert_eq!(order.status, ReturnStatus::Completed);
        // Condition excludes restock even though restock_quantity was 5.
        assert_eq!(store.product_stock(product_id).await.unwrap(), Some(10));
    }

    #[tokio::test]
    async fn test_process_defective_exchange_same_still_deducts_replacement() {
        let (service, store, id, product_id) = pending_return(
            ProductCondition::Defective,
            ReturnType::ExchangeSame,
            2,
            2,
            10,
        )
        .await;
        service.approve(id, UserId::new()).await.unwrap();

        service.process(id).await.unwrap();

        // No restock (defective), but 2 replacement units left the shelf.
        assert_eq!(store.product_stock(product_id).await.unwrap(), Some(8));
    }

    #[tokio::test]
    async fn test_process_good_exchange_same_nets_out() {
        let (service, store, id, product_id) = pending_return(
            ProductCondition::Good,
            ReturnType::ExchangeSame,
            2,
            2,
            10,
        )
        .await;
        service.approve(id, UserId::new()).await.unwrap();

        service.process(id).await.unwrap();

        // +2 restocked, -2 handed out.
        assert_eq!(store.product_stock(product_id).await.unwrap(), Some(10));
    }

    #[tokio::test]
    async fn test_process_pending_return_invalid_state() {
        let (service, _, id, _) = pending_return(
            ProductCondition::Good,
            ReturnType::Refund,
            1,
            1,
            10,
        )
        .await;

        let err = service.process(id).await.unwrap_err();
        assert!(matches!(err, ReturnError::InvalidTransition { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_process_never_drives_stock_negative() {
        let (service, store, id, product_id) = pending_return(
            ProductCondition::Defective,
            ReturnType::ExchangeSame,
            2,
            0,
            1, // only one unit on the shelf, two replacements needed
        )
        .await;
        service.approve(id, UserId::new()).await.unwrap();

        let err = service.process(id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // Nothing was applied: stock untouched, return still approved.
        assert_eq!(store.product_stock(product_id).await.unwrap(), Some(1));
        let order = service.return_order(id).await.unwrap();
        assert_eq!(order.status, ReturnStatus::Approved);
    }

    #[tokio::test]
    async fn test_completed_return_frees_the_sale_for_new_requests() {
        let (service, _, id, product_id) = pending_return(
            ProductCondition::Good,
            ReturnType::Refund,
            1,
            1,
            10,
        )
        .await;
        let order = service.return_order(id).await.unwrap();
        let sale_id = order.original_sale_id;
        service.approve(id, UserId::new()).await.unwrap();
        service.process(id).await.unwrap();

        // The only line is fully returned now, so a new request fails on
        // quantity, not on the one-outstanding-return rule.
        let err = service
            .create(
                ReturnRequestBuilder::new(sale_id)
                    .with_item(product_id, 1, 1)
                    .build(),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ya fue devuelto en su totalidad"));
    }
}

// ============================================================================
// Queries & wire format
// ============================================================================

mod query_tests {
    use super::*;

    #[tokio::test]
    async fn test_returns_for_sale_oldest_first() {
        let product_id = ProductId::new();
        let sale = SaleRecordBuilder::new()
            .with_simple_line(product_id, 4)
            .build();
        let sale_id = sale.id;
        let (service, _) = service_with(vec![sale]).await;

        let first = service
            .create(
                ReturnRequestBuilder::new(sale_id)
                    .with_item(product_id, 1, 1)
                    .build(),
            )
            .await
            .unwrap();
        service.reject(first.id, "prueba").await.unwrap();
        let second = service
            .create(
                ReturnRequestBuilder::new(sale_id)
                    .with_item(product_id, 1, 1)
                    .build(),
            )
            .await
            .unwrap();

        let history = service.returns_for_sale(sale_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, first.id);
        assert_eq!(history[1].id, second.id);
    }

    #[test]
    fn test_statuses_serialize_in_screaming_case() {
        assert_eq!(
            serde_json::to_string(&ReturnStatus::Pending).unwrap(),
            "\"PENDING\""
        );
        assert_eq!(
            serde_json::to_string(&ReturnType::ExchangeSame).unwrap(),
            "\"EXCHANGE_SAME\""
        );
        assert_eq!(
            serde_json::to_string(&ProductCondition::Defective).unwrap(),
            "\"DEFECTIVE\""
        );
    }
}

//! Return eligibility rules
//!
//! [`check_eligibility`] is a pure function over the sale record, the sale's
//! prior returns, and the requested items. The checks run in a fixed order
//! and stop at the first failure so callers always get a deterministic,
//! end-user-facing message (shown verbatim at the counter).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Money, ProductId, SaleId};

use crate::order::ReturnOrder;

/// Deadline applied when a sale line carries no product-specific one
pub const DEFAULT_RETURN_DEADLINE_DAYS: i64 = 30;

/// One line of the original sale, as supplied by the sale subsystem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    /// Products can be flagged non-returnable (perishables, clearance)
    pub is_returnable: bool,
    /// Product-specific deadline in days; `None` falls back to the default
    pub return_deadline_days: Option<u32>,
}

/// The sale view the return workflow reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: SaleId,
    pub sold_at: DateTime<Utc>,
    pub is_active: bool,
    pub is_cancelled: bool,
    /// Flipped by the return workflow when the first request is captured
    pub has_returns: bool,
    pub lines: Vec<SaleLine>,
}

impl SaleRecord {
    /// Finds the sale line for a product
    pub fn line(&self, product_id: ProductId) -> Option<&SaleLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }
}

/// An item of a return request, reduced to what eligibility needs
#[derive(Debug, Clone, Copy)]
pub struct RequestedItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Outcome of an eligibility check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Eligibility {
    pub eligible: bool,
    pub message: Option<String>,
}

impl Eligibility {
    fn ok() -> Self {
        Self {
            eligible: true,
            message: None,
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            eligible: false,
            message: Some(message.into()),
        }
    }
}

/// Validates a return request against the sale history
///
/// `prior_returns` must be all returns ever captured for the sale; the
/// function itself picks out the outstanding ones and the ones that count
/// against the sold quantity.
pub fn check_eligibility(
    sale: Option<&SaleRecord>,
    prior_returns: &[ReturnOrder],
    requested: &[RequestedItem],
    today: NaiveDate,
) -> Eligibility {
    let sale = match sale {
        Some(sale) => sale,
        None => return Eligibility::fail("La venta no existe"),
    };

    if !sale.is_active || sale.is_cancelled {
        return Eligibility::fail("La venta no está activa o fue anulada");
    }

    // One outstanding return per sale at a time; COMPLETED and REJECTED
    // history does not block new requests.
    if prior_returns.iter().any(|r| r.is_outstanding()) {
        return Eligibility::fail("Ya existe una devolución en proceso para esta venta");
    }

    let sale_date = sale.sold_at.date_naive();

    for item in requested {
        let line = match sale.line(item.product_id) {
            Some(line) => line,
            None => {
                return Eligibility::fail(format!(
                    "El producto {} no pertenece a la venta original",
                    item.product_id
                ))
            }
        };

        if !line.is_returnable {
            return Eligibility::fail(format!(
                "El producto {} no es retornable",
                line.product_name
            ));
        }

        let deadline_days = line
            .return_deadline_days
            .map(i64::from)
            .unwrap_or(DEFAULT_RETURN_DEADLINE_DAYS);
        let days_since_sale = (today - sale_date).num_days();
        // The deadline day itself still passes.
        if days_since_sale > deadline_days {
            return Eligibility::fail(format!(
                "El plazo de devolución de {} días venció para {}",
                deadline_days, line.product_name
            ));
        }

        let already_returned: u32 = prior_returns
            .iter()
            .filter(|r| r.counts_as_returned())
            .map(|r| r.returned_quantity(item.product_id))
            .sum();
        let remaining = line.quantity.saturating_sub(already_returned);

        if remaining == 0 {
            return Eligibility::fail(format!(
                "El producto {} ya fue devuelto en su totalidad",
                line.product_name
            ));
        }
        if item.quantity > remaining {
            return Eligibility::fail(format!(
                "La cantidad solicitada de {} excede lo disponible para devolución. Disponible: {}",
                line.product_name, remaining
            ));
        }
    }

    Eligibility::ok()
}

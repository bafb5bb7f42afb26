//! # Pricing
//!
//! Cart totals as the checkout screens compute them before submitting.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal = Σ (price × quantity)                                        │
//! │                                                                         │
//! │  EXCLUSIVE (tax on top)            INCLUSIVE (tax inside prices)        │
//! │  ───────────────────────           ─────────────────────────────        │
//! │  tax   = subtotal × rate / 100     tax   = subtotal − subtotal × 100    │
//! │  total = subtotal + tax − disc                        / (100 + rate)    │
//! │                                    total = subtotal − disc              │
//! │                                                                         │
//! │  total is floored at zero                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The backend recomputes and is authoritative; these numbers exist so the
//! cashier sees the same figure the customer will be charged.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{PaymentMethod, SaleItem, SaleRequest, TaxType};

/// Computed totals for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleTotals {
    #[ts(type = "number")]
    pub subtotal: Money,
    #[ts(type = "number")]
    pub tax_amount: Money,
    #[ts(type = "number")]
    pub discount: Money,
    #[ts(type = "number")]
    pub total: Money,
}

impl SaleTotals {
    /// Computes subtotal, tax amount and total.
    ///
    /// `tax_rate` is a percentage (10.0 = 10%), `discount` an absolute amount.
    pub fn compute(items: &[SaleItem], tax_rate: f64, discount: Money, tax_type: TaxType) -> Self {
        let subtotal: Money = items.iter().map(SaleItem::line_total).sum();

        let (tax_amount, total) = match tax_type {
            TaxType::Exclusive => {
                let tax = subtotal.percentage(tax_rate);
                (tax, subtotal + tax - discount)
            }
            TaxType::Inclusive => {
                let net = Money::from_minor(
                    (subtotal.minor() as f64 * 100.0 / (100.0 + tax_rate)).round() as i64,
                );
                (subtotal - net, subtotal - discount)
            }
        };

        SaleTotals {
            subtotal,
            tax_amount,
            discount,
            total: total.floor_zero(),
        }
    }
}

impl SaleRequest {
    /// Builds a request whose `total` matches the cart at this instant.
    ///
    /// ```rust
    /// use posflow_core::money::Money;
    /// use posflow_core::types::{PaymentMethod, SaleItem, SaleRequest, TaxType};
    ///
    /// let request = SaleRequest::from_cart(
    ///     vec![SaleItem::new("p-1", "Lager", Money::from_major(150), 2)],
    ///     10.0,
    ///     Money::from_major(20),
    ///     TaxType::Exclusive,
    ///     PaymentMethod::Cash,
    ///     Some("shift-1".to_string()),
    /// );
    /// assert_eq!(request.total, Money::from_major(310));
    /// ```
    pub fn from_cart(
        items: Vec<SaleItem>,
        tax_rate: f64,
        discount: Money,
        tax_type: TaxType,
        payment_method: PaymentMethod,
        shift_id: Option<String>,
    ) -> Self {
        let totals = SaleTotals::compute(&items, tax_rate, discount, tax_type);
        SaleRequest {
            items,
            total: totals.total,
            discount,
            tax: tax_rate,
            tax_type,
            payment_method,
            shift_id,
        }
    }

    /// Recomputes totals from the request's own items and rates.
    pub fn totals(&self) -> SaleTotals {
        SaleTotals::compute(&self.items, self.tax, self.discount, self.tax_type)
    }
}

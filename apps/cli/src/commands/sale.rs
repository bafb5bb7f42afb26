//! # Sale Command
//!
//! Checkout from a JSON cart file.
//!
//! ```json
//! {
//!   "items": [{ "productId": "p-1", "name": "Lager", "price": 150, "quantity": 2 }],
//!   "tax": 10,
//!   "discount": 20,
//!   "taxType": "exclusive",
//!   "paymentMethod": "cash",
//!   "shiftId": "s-1"
//! }
//! ```
//!
//! The total is computed here and submitted as-is. Without a `shiftId` the
//! open shift is looked up first.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use posflow_client::{MetricCategory, PosClient};
use posflow_core::{
    optimistic_inventory_update, Money, PaymentMethod, Product, SaleItem, SaleRequest, SaleResult,
    TaxType,
};

/// Cart as written by the operator.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartFile {
    pub items: Vec<SaleItem>,
    /// Tax rate in percent.
    #[serde(default)]
    pub tax: f64,
    #[serde(default)]
    pub discount: Money,
    #[serde(default)]
    pub tax_type: TaxType,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub shift_id: Option<String>,
}

impl CartFile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let cart: CartFile =
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        anyhow::ensure!(!cart.items.is_empty(), "cart has no items");
        Ok(cart)
    }

    pub fn into_request(self, shift_id: Option<String>) -> SaleRequest {
        SaleRequest::from_cart(
            self.items,
            self.tax,
            self.discount,
            self.tax_type,
            self.payment_method,
            self.shift_id.or(shift_id),
        )
    }
}

pub async fn complete(client: &PosClient, path: &Path) -> Result<()> {
    let cart = CartFile::load(path)?;

    let open_shift = if cart.shift_id.is_none() {
        match client.current_shift().await {
            Ok(shift) => shift.map(|s| s.id),
            Err(e) => {
                warn!(error = %e, "Could not look up the open shift");
                None
            }
        }
    } else {
        None
    };

    // Snapshot for showing remaining stock if the backend omits it.
    let catalog = client.products(false).await.ok();

    let request = cart.into_request(open_shift);
    let totals = request.totals();
    println!("Subtotal: {}", totals.subtotal);
    println!("Tax:      {} ({}% {:?})", totals.tax_amount, request.tax, request.tax_type);
    println!("Discount: {}", totals.discount);
    println!("Total:    {}", request.total);

    let outcome = client
        .complete_sale(request, |r| {
            println!("Cart cleared, submitting {} items...", r.items.len());
        })
        .await;

    match outcome {
        Ok(result) => {
            client.metrics().record(MetricCategory::Sales, result.client_elapsed_ms);
            print_result(&result, catalog.as_deref());
            Ok(())
        }
        Err(failure) => {
            client.metrics().record(MetricCategory::Sales, failure.elapsed_ms);
            println!("Sale failed after {:.1} ms", failure.elapsed_ms);
            if failure.needs_rollback {
                println!("Cart was cleared optimistically; restore it from {}", path.display());
            }
            Err(failure.into())
        }
    }
}

fn print_result(result: &SaleResult, catalog: Option<&[Product]>) {
    println!(
        "Sale {} completed in {:.1} ms ({})",
        result.sale_id, result.client_elapsed_ms, result.performance_grade
    );

    let remaining = remaining_stock(result, catalog);
    for d in &result.stock_deductions {
        match remaining.iter().find(|p| p.id == d.id) {
            Some(p) => println!("  {} -{} → {} left", p.name, d.deducted, p.quantity),
            None => println!("  {} -{}", d.id, d.deducted),
        }
    }

    for w in &result.low_stock_warnings {
        println!("  low stock: {} ({} left)", w.name, w.remaining);
    }
}

/// Updated products from the backend, or the pre-sale catalog with the
/// deductions applied locally.
fn remaining_stock(result: &SaleResult, catalog: Option<&[Product]>) -> Vec<Product> {
    if !result.updated_products.is_empty() {
        return result.updated_products.clone();
    }
    catalog
        .map(|products| optimistic_inventory_update(products, &result.stock_deductions))
        .unwrap_or_default()
}

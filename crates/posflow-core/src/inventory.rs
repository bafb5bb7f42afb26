//! # Optimistic Inventory Update
//!
//! Bridges the gap between a completed sale and the next full catalog
//! refresh: the product grid shows the deducted quantities immediately
//! instead of waiting for `GET /api/products`.
//!
//! ```text
//!  products (cached)        stock deductions (from SaleResult)
//!  ┌──────────┬─────┐       ┌──────────┬──────────┐
//!  │ lager    │  10 │       │ lager    │   2      │
//!  │ cider    │   1 │   +   │ cider    │   5      │   =   lager 8, cider 0,
//!  │ water    │  40 │       └──────────┴──────────┘         water 40
//!  └──────────┴─────┘
//! ```

use std::collections::HashMap;

use crate::types::{Product, StockDeduction};

/// Returns a copy of `products` with every deduction applied.
///
/// ## Rules
/// - Deductions naming the same product are summed
/// - Quantities never go below zero; negative deductions count as zero
/// - Arithmetic saturates, so huge deductions cannot overflow
/// - Products without a deduction, and the list order, are unchanged
/// - Deductions for unknown products are ignored
pub fn optimistic_inventory_update(
    products: &[Product],
    deductions: &[StockDeduction],
) -> Vec<Product> {
    let mut by_id: HashMap<&str, i64> = HashMap::with_capacity(deductions.len());
    for d in deductions {
        let total = by_id.entry(d.id.as_str()).or_insert(0);
        *total = total.saturating_add(d.deducted.max(0));
    }

    products
        .iter()
        .map(|product| match by_id.get(product.id.as_str()) {
            Some(&deducted) => Product {
                quantity: product.quantity.saturating_sub(deducted).max(0),
                ..product.clone()
            },
            None => product.clone(),
        })
        .collect()
}

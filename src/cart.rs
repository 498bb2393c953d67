use crate::error::{AppError, AppResult};
use serde::Serialize;
use std::collections::BTreeMap;

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 9_999;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub quantity: u32,
}

/// Canteen cart keyed by product id. A present line always has quantity >= 1.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: BTreeMap<String, CartLine>,
}

impl Cart {
    pub fn add(&mut self, product_id: &str) -> AppResult<u32> {
        let current = self.quantity(product_id).unwrap_or(0);
        if current >= MAX_LINE_QUANTITY {
            return Err(quantity_limit());
        }
        self.lines.insert(
            product_id.to_string(),
            CartLine {
                product_id: product_id.to_string(),
                quantity: current + 1,
            },
        );
        Ok(current + 1)
    }

    /// Decrement by one, never below 1. Returns the new quantity, or None if
    /// the product is not in the cart.
    pub fn decrease(&mut self, product_id: &str) -> Option<u32> {
        let line = self.lines.get_mut(product_id)?;
        if line.quantity > 1 {
            line.quantity -= 1;
        }
        Some(line.quantity)
    }

    pub fn remove(&mut self, product_id: &str) -> bool {
        self.lines.remove(product_id).is_some()
    }

    pub fn set_quantity(&mut self, product_id: &str, quantity: u32) -> AppResult<()> {
        if quantity > MAX_LINE_QUANTITY {
            return Err(quantity_limit());
        }
        if quantity == 0 {
            self.lines.remove(product_id);
            return Ok(());
        }
        self.lines.insert(
            product_id.to_string(),
            CartLine {
                product_id: product_id.to_string(),
                quantity,
            },
        );
        Ok(())
    }

    pub fn quantity(&self, product_id: &str) -> Option<u32> {
        self.lines.get(product_id).map(|l| l.quantity)
    }

    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.values()
    }

    pub fn total_items(&self) -> u64 {
        self.lines.values().map(|l| u64::from(l.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

fn quantity_limit() -> AppError {
    AppError::bad_params(format!("at most {} of one product per order", MAX_LINE_QUANTITY))
}

/// Price of one line in cents. Fails instead of wrapping on absurd prices.
pub fn line_total_cents(unit_price_cents: i64, quantity: u32) -> AppResult<i64> {
    unit_price_cents
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| AppError::bad_params("order total is too large"))
}

/// Sum of line totals, with the same overflow rule as [`line_total_cents`].
pub fn sum_cents(totals: impl IntoIterator<Item = i64>) -> AppResult<i64> {
    totals.into_iter().try_fold(0i64, |acc, t| {
        acc.checked_add(t)
            .ok_or_else(|| AppError::bad_params("order total is too large"))
    })
}

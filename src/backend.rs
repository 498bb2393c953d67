use crate::cart::{self, Cart};
use crate::db;
use crate::error::{AppError, AppResult};
use crate::stage::AdmissionStage;
use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

/// Write path of the school API: the two mutations the dashboard issues.
pub trait Backend {
    /// Single-field PATCH of a stakeholder's admission stage.
    fn patch_stakeholder_stage(&self, stakeholder_id: &str, stage: AdmissionStage) -> AppResult<()>;

    /// Create one order from the cart lines; returns the new order id.
    fn create_order(&self, buyer_id: &str, cart: &Cart) -> AppResult<String>;
}

/// Backend backed by the workspace database.
pub struct WorkspaceBackend<'a> {
    conn: &'a Connection,
}

impl<'a> WorkspaceBackend<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl Backend for WorkspaceBackend<'_> {
    fn patch_stakeholder_stage(&self, stakeholder_id: &str, stage: AdmissionStage) -> AppResult<()> {
        let changed = self.conn.execute(
            "UPDATE stakeholders SET stage = ?, updated_at = ? WHERE id = ?",
            (stage.number(), Utc::now().to_rfc3339(), stakeholder_id),
        )?;
        if changed == 0 {
            return Err(AppError::Backend(format!(
                "stakeholder {} no longer exists",
                stakeholder_id
            )));
        }
        Ok(())
    }

    fn create_order(&self, buyer_id: &str, cart: &Cart) -> AppResult<String> {
        if cart.is_empty() {
            return Err(AppError::EmptyCart);
        }

        let mut priced = Vec::new();
        for line in cart.lines() {
            let product = db::get_product(self.conn, &line.product_id)?
                .ok_or_else(|| AppError::not_found("product", &line.product_id))?;
            if !product.available {
                return Err(AppError::bad_params(format!(
                    "product {} is not available",
                    product.name
                )));
            }
            let line_total = cart::line_total_cents(product.price_cents, line.quantity)?;
            priced.push((line.product_id.clone(), line.quantity, product.price_cents, line_total));
        }
        let total = cart::sum_cents(priced.iter().map(|(_, _, _, t)| *t))?;

        let order_id = Uuid::new_v4().to_string();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO orders(id, buyer_id, total_cents, status, created_at)
             VALUES(?, ?, ?, 'pending', ?)",
            (&order_id, buyer_id, total, Utc::now().to_rfc3339()),
        )?;
        for (product_id, quantity, unit_price, _) in &priced {
            tx.execute(
                "INSERT INTO order_items(order_id, product_id, quantity, unit_price_cents)
                 VALUES(?, ?, ?, ?)",
                (&order_id, product_id, quantity, unit_price),
            )?;
        }
        tx.commit()?;
        Ok(order_id)
    }
}

use super::{optional_str, required_str};
use crate::backend::{Backend, WorkspaceBackend};
use crate::cart::{line_total_cents, sum_cents};
use crate::db;
use crate::error::{AppError, AppResult};
use crate::ipc::error::respond;
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};

fn cart_view(state: &AppState) -> AppResult<Value> {
    let mut lines = Vec::new();
    let mut line_totals = Vec::new();
    for line in state.cart.lines() {
        let product = match state.db.as_ref() {
            Some(conn) => db::get_product(conn, &line.product_id)?,
            None => None,
        };
        let unit = product.as_ref().map(|p| p.price_cents);
        let line_total = unit
            .map(|u| line_total_cents(u, line.quantity))
            .transpose()?;
        line_totals.extend(line_total);
        lines.push(json!({
            "productId": line.product_id,
            "quantity": line.quantity,
            "name": product.as_ref().map(|p| p.name.clone()),
            "unitPriceCents": unit,
            "lineTotalCents": line_total,
        }));
    }
    Ok(json!({
        "lines": lines,
        "totalItems": state.cart.total_items(),
        "totalCents": sum_cents(line_totals)?,
    }))
}

fn handle_add(state: &mut AppState, req: &Request) -> AppResult<Value> {
    let product_id = required_str(&req.params, "productId")?;
    let product = db::get_product(state.conn()?, &product_id)?
        .ok_or_else(|| AppError::not_found("product", &product_id))?;
    if !product.available {
        return Err(AppError::bad_params(format!(
            "product {} is not available",
            product.name
        )));
    }
    let next = state.cart.quantity(&product_id).unwrap_or(0).saturating_add(1);
    line_total_cents(product.price_cents, next)?;
    state.cart.add(&product_id)?;
    cart_view(state)
}

fn handle_decrease(state: &mut AppState, req: &Request) -> AppResult<Value> {
    let product_id = required_str(&req.params, "productId")?;
    state
        .cart
        .decrease(&product_id)
        .ok_or_else(|| AppError::not_found("cart line", &product_id))?;
    cart_view(state)
}

fn handle_remove(state: &mut AppState, req: &Request) -> AppResult<Value> {
    let product_id = required_str(&req.params, "productId")?;
    if !state.cart.remove(&product_id) {
        return Err(AppError::not_found("cart line", product_id));
    }
    cart_view(state)
}

fn handle_set_quantity(state: &mut AppState, req: &Request) -> AppResult<Value> {
    let product_id = required_str(&req.params, "productId")?;
    let quantity = req
        .params
        .get("quantity")
        .and_then(|v| v.as_u64())
        .and_then(|q| u32::try_from(q).ok())
        .ok_or_else(|| AppError::bad_params("quantity must be a non-negative integer"))?;
    if quantity > 0 {
        let product = db::get_product(state.conn()?, &product_id)?
            .ok_or_else(|| AppError::not_found("product", &product_id))?;
        line_total_cents(product.price_cents, quantity)?;
    }
    state.cart.set_quantity(&product_id, quantity)?;
    cart_view(state)
}

fn handle_clear(state: &mut AppState) -> AppResult<Value> {
    state.cart.clear();
    cart_view(state)
}

/// Flush the cart into one order. The cart survives a failed order so the
/// buyer can fix it and retry.
fn handle_checkout(state: &mut AppState, req: &Request) -> AppResult<Value> {
    let buyer_id = required_str(&req.params, "buyerId")?;
    let conn = state.db.as_ref().ok_or(AppError::NoWorkspace)?;
    let backend = WorkspaceBackend::new(conn);
    match backend.create_order(&buyer_id, &state.cart) {
        Ok(order_id) => {
            tracing::info!(order = %order_id, buyer = %buyer_id, items = state.cart.total_items(), "order created");
            state.cart.clear();
            Ok(json!({ "orderId": order_id }))
        }
        Err(e) => {
            tracing::warn!(buyer = %buyer_id, error = %e, "order failed, cart kept");
            Err(e)
        }
    }
}

fn handle_orders_list(state: &mut AppState, req: &Request) -> AppResult<Value> {
    let buyer = optional_str(&req.params, "buyerId");
    let orders = db::list_orders(state.conn()?, buyer.as_deref())?;
    Ok(json!({ "orders": orders }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "cart.get" => cart_view(state),
        "cart.add" => handle_add(state, req),
        "cart.decrease" => handle_decrease(state, req),
        "cart.remove" => handle_remove(state, req),
        "cart.setQuantity" => handle_set_quantity(state, req),
        "cart.clear" => handle_clear(state),
        "cart.checkout" => handle_checkout(state, req),
        "orders.list" => handle_orders_list(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}

use super::{optional_str, required_param, required_str};
use crate::db::{self, Product, Stakeholder};
use crate::envelope::Envelope;
use crate::error::{AppError, AppResult};
use crate::ipc::error::respond;
use crate::ipc::types::{AppState, Request};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

/// Unwrap the backend envelope and decode every record, reporting the index
/// of the first one that does not fit.
fn decode_payload<T: DeserializeOwned>(req: &Request) -> AppResult<(Vec<T>, serde_json::Value)> {
    let raw = req
        .params
        .get("payload")
        .cloned()
        .ok_or_else(|| AppError::bad_params("missing payload"))?;
    let envelope = Envelope::normalize(raw)?;
    let mut out = Vec::with_capacity(envelope.data.len());
    for (i, item) in envelope.data.into_iter().enumerate() {
        let rec = serde_json::from_value(item)
            .map_err(|e| AppError::bad_params(format!("payload record {}: {}", i, e)))?;
        out.push(rec);
    }
    Ok((out, serde_json::Value::Object(envelope.meta)))
}

fn handle_stakeholders_import(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = state.conn()?;
    let (records, meta) = decode_payload::<Stakeholder>(req)?;
    let tx = conn.unchecked_transaction()?;
    for s in &records {
        db::upsert_stakeholder(&tx, s)?;
    }
    tx.commit()?;
    tracing::info!(count = records.len(), "stakeholders imported");
    Ok(json!({ "imported": records.len(), "meta": meta }))
}

fn handle_stakeholders_list(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = state.conn()?;
    let kind = optional_str(&req.params, "kind");
    let rows = db::list_stakeholders(conn, kind.as_deref())?;
    Ok(json!({ "stakeholders": rows }))
}

fn handle_products_import(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = state.conn()?;
    let (records, meta) = decode_payload::<Product>(req)?;
    if let Some(p) = records.iter().find(|p| p.price_cents < 0) {
        return Err(AppError::bad_params(format!(
            "product {} has a negative priceCents",
            p.id
        )));
    }
    let tx = conn.unchecked_transaction()?;
    for p in &records {
        db::upsert_product(&tx, p)?;
    }
    tx.commit()?;
    tracing::info!(count = records.len(), "products imported");
    Ok(json!({ "imported": records.len(), "meta": meta }))
}

fn handle_products_create(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = state.conn()?;
    let name = required_str(&req.params, "name")?;
    let price_cents: i64 = required_param(&req.params, "priceCents")?;
    if price_cents < 0 {
        return Err(AppError::bad_params("priceCents must not be negative"));
    }
    let available = req
        .params
        .get("available")
        .and_then(|v| v.as_bool())
        .unwrap_or(true);
    let product = Product {
        id: Uuid::new_v4().to_string(),
        name,
        price_cents,
        available,
    };
    db::upsert_product(conn, &product)?;
    Ok(json!({ "product": product }))
}

fn handle_products_list(state: &mut AppState) -> AppResult<serde_json::Value> {
    let conn = state.conn()?;
    Ok(json!({ "products": db::list_products(conn)? }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "stakeholders.import" => handle_stakeholders_import(state, req),
        "stakeholders.list" => handle_stakeholders_list(state, req),
        "products.import" => handle_products_import(state, req),
        "products.create" => handle_products_create(state, req),
        "products.list" => handle_products_list(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}

use super::{optional_param, optional_usize, required_param, required_str};
use crate::debounce::Debouncer;
use crate::error::{AppError, AppResult};
use crate::ipc::error::respond;
use crate::ipc::types::{AppState, PagerSlot, Request};
use crate::paging::Pager;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

fn matches_query(item: &Value, keys: &[String], needle: &str) -> bool {
    let hit = |v: &Value| match v {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Number(n) => n.to_string().contains(needle),
        _ => false,
    };
    if keys.is_empty() {
        return match item {
            Value::Object(map) => map.values().any(&hit),
            other => hit(other),
        };
    }
    keys.iter().any(|k| item.get(k).map(&hit).unwrap_or(false))
}

fn filtered(source: &[Value], keys: &[String], query: &str) -> Vec<Value> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return source.to_vec();
    }
    source
        .iter()
        .filter(|item| matches_query(item, keys, &needle))
        .cloned()
        .collect()
}

/// A changed filter restarts the window from its initial size.
fn apply_query(slot: &mut PagerSlot, query: String) {
    if query != slot.query {
        slot.query = query;
        slot.pager
            .set_data(filtered(&slot.source, &slot.search_keys, &slot.query));
    }
}

/// Apply a search that has waited out its quiet period.
fn settle_search(slot: &mut PagerSlot, now: Instant) {
    if let Some(query) = slot.search.poll(now) {
        apply_query(slot, query);
    }
}

fn slot_view(pager_id: &str, slot: &PagerSlot) -> Value {
    json!({
        "pagerId": pager_id,
        "items": slot.pager.displayed(),
        "window": slot.pager.window(),
        "query": slot.query,
        "searchPending": slot.search.is_pending(),
    })
}

fn slot_mut<'a>(state: &'a mut AppState, pager_id: &str) -> AppResult<&'a mut PagerSlot> {
    state
        .pagers
        .get_mut(pager_id)
        .ok_or_else(|| AppError::not_found("pager", pager_id))
}

fn handle_open(state: &mut AppState, req: &Request) -> AppResult<Value> {
    let pager_id = required_str(&req.params, "pagerId")?;
    let items: Vec<Value> = required_param(&req.params, "items")?;
    let step = optional_usize(&req.params, "itemsPerPage")?.unwrap_or(state.config.page_size);
    let initial = optional_usize(&req.params, "initialItemsPerPage")?.unwrap_or(step);
    let search_keys: Vec<String> = optional_param(&req.params, "searchKeys")?;
    let debounce = match optional_usize(&req.params, "debounceMs")? {
        Some(ms) => Duration::from_millis(ms as u64),
        None => state.config.search_debounce,
    };

    let pager = Pager::new(items.clone(), initial, step)?;
    let slot = PagerSlot {
        source: items,
        pager,
        search_keys,
        search: Debouncer::new(debounce),
        query: String::new(),
    };
    let view = slot_view(&pager_id, &slot);
    if state.pagers.insert(pager_id.clone(), slot).is_some() {
        tracing::debug!(pager = %pager_id, "pager reopened");
    }
    Ok(view)
}

fn handle_get(state: &mut AppState, req: &Request) -> AppResult<Value> {
    let pager_id = required_str(&req.params, "pagerId")?;
    let slot = slot_mut(state, &pager_id)?;
    settle_search(slot, Instant::now());
    Ok(slot_view(&pager_id, slot))
}

fn handle_load_more(state: &mut AppState, req: &Request) -> AppResult<Value> {
    let pager_id = required_str(&req.params, "pagerId")?;
    let slot = slot_mut(state, &pager_id)?;
    settle_search(slot, Instant::now());
    slot.pager.load_more();
    Ok(slot_view(&pager_id, slot))
}

fn handle_search(state: &mut AppState, req: &Request) -> AppResult<Value> {
    let pager_id = required_str(&req.params, "pagerId")?;
    let query = req
        .params
        .get("query")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let immediate = req
        .params
        .get("immediate")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let slot = slot_mut(state, &pager_id)?;
    let now = Instant::now();
    slot.search.submit(query, now);
    if immediate {
        if let Some(q) = slot.search.flush() {
            apply_query(slot, q);
        }
    } else {
        settle_search(slot, now);
    }
    Ok(slot_view(&pager_id, slot))
}

fn handle_replace(state: &mut AppState, req: &Request) -> AppResult<Value> {
    let pager_id = required_str(&req.params, "pagerId")?;
    let items: Vec<Value> = required_param(&req.params, "items")?;
    let slot = slot_mut(state, &pager_id)?;
    slot.source = items;
    let visible = filtered(&slot.source, &slot.search_keys, &slot.query);
    slot.pager.set_data(visible);
    Ok(slot_view(&pager_id, slot))
}

fn handle_reset(state: &mut AppState, req: &Request) -> AppResult<Value> {
    let pager_id = required_str(&req.params, "pagerId")?;
    let slot = slot_mut(state, &pager_id)?;
    slot.pager.reset();
    Ok(slot_view(&pager_id, slot))
}

fn handle_close(state: &mut AppState, req: &Request) -> AppResult<Value> {
    let pager_id = required_str(&req.params, "pagerId")?;
    let closed = state.pagers.remove(&pager_id).is_some();
    Ok(json!({ "pagerId": pager_id, "closed": closed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "pager.open" => handle_open(state, req),
        "pager.get" => handle_get(state, req),
        "pager.loadMore" => handle_load_more(state, req),
        "pager.search" => handle_search(state, req),
        "pager.replace" => handle_replace(state, req),
        "pager.reset" => handle_reset(state, req),
        "pager.close" => handle_close(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}

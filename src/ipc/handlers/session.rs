use super::{optional_str, required_str};
use crate::error::{AppError, AppResult};
use crate::format::decode_segment;
use crate::ipc::error::respond;
use crate::ipc::types::{AppState, Request};
use crate::session::Session;
use serde_json::json;

fn headers_json(session: &Session) -> serde_json::Value {
    session
        .headers()
        .into_iter()
        .map(|(name, value)| json!({ "name": name, "value": value }))
        .collect()
}

fn handle_session_set(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let token = required_str(&req.params, "token")?;
    let session = Session::new(token, optional_str(&req.params, "apiKey"));
    let result = json!({
        "hasApiKey": session.api_key.is_some(),
        "headers": headers_json(&session),
    });
    state.session = Some(session);
    tracing::info!("session set");
    Ok(result)
}

fn handle_session_clear(state: &mut AppState) -> AppResult<serde_json::Value> {
    let had = state.session.take().is_some();
    Ok(json!({ "cleared": had }))
}

fn handle_session_headers(state: &mut AppState) -> AppResult<serde_json::Value> {
    let session = state.session.as_ref().ok_or(AppError::NoSession)?;
    Ok(json!({ "headers": headers_json(session) }))
}

fn handle_attachment_request(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let session = state.session.as_ref().ok_or(AppError::NoSession)?;
    let raw = required_str(&req.params, "fileId")?;
    let file_id = decode_segment(&raw);
    if file_id.is_empty() {
        return Err(AppError::bad_params("fileId is not a valid path segment"));
    }
    let request = session.attachment_request(&state.config.api_base, &file_id);
    Ok(json!({
        "method": request.method,
        "url": request.url,
        "headers": headers_json(session),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "session.set" => handle_session_set(state, req),
        "session.clear" => handle_session_clear(state),
        "session.headers" => handle_session_headers(state),
        "attachments.request" => handle_attachment_request(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}

use crate::admissions::AdmissionBoard;
use crate::db;
use crate::error::{AppError, AppResult};
use crate::ipc::error::{ok, respond};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::{Path, PathBuf};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "hasSession": state.session.is_some(),
            "openPagers": state.pagers.len(),
        }),
    )
}

/// Open (or create) the workspace database and make it current. Anything
/// cached from the previous workspace is dropped.
pub fn open_workspace(state: &mut AppState, path: &Path) -> AppResult<()> {
    let conn = db::open_db(path).map_err(|e| AppError::WorkspaceOpen(format!("{e:#}")))?;
    state.workspace = Some(path.to_path_buf());
    state.db = Some(conn);
    state.admissions = AdmissionBoard::default();
    state.cart.clear();
    tracing::info!(workspace = %path.display(), "workspace opened");
    Ok(())
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let path = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .ok_or_else(|| AppError::bad_params("missing params.path"))?;
    open_workspace(state, &path)?;
    Ok(json!({ "workspacePath": path.to_string_lossy() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(respond(&req.id, handle_workspace_select(state, req))),
        _ => None,
    }
}

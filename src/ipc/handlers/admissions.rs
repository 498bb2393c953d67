use super::{optional_str, required_param, required_str};
use crate::admissions::{AdmissionRow, APPLICANT_KIND};
use crate::backend::WorkspaceBackend;
use crate::db::{self, Stakeholder};
use crate::error::{AppError, AppResult};
use crate::ipc::error::{err, fail, ok, respond};
use crate::ipc::types::{AppState, Request};
use crate::stage::AdmissionStage;
use chrono::Utc;
use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

fn load_rows(conn: &Connection) -> AppResult<Vec<AdmissionRow>> {
    Ok(db::list_stakeholders(conn, Some(APPLICANT_KIND))?
        .iter()
        .map(AdmissionRow::from_stakeholder)
        .collect())
}

fn handle_stages() -> AppResult<serde_json::Value> {
    let stages: Vec<_> = AdmissionStage::ALL
        .iter()
        .map(|s| json!({ "stage": s.number(), "label": s.label() }))
        .collect();
    Ok(json!({ "stages": stages }))
}

fn handle_create(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = state.conn()?;
    let applicant = Stakeholder {
        id: Uuid::new_v4().to_string(),
        kind: APPLICANT_KIND.to_string(),
        first_name: required_str(&req.params, "firstName")?,
        last_name: required_str(&req.params, "lastName")?,
        email: optional_str(&req.params, "email"),
        class_name: optional_str(&req.params, "className"),
        stage: Some(AdmissionStage::Inquiry.number()),
        updated_at: Some(Utc::now().to_rfc3339()),
    };
    db::upsert_stakeholder(conn, &applicant)?;
    Ok(json!({ "row": AdmissionRow::from_stakeholder(&applicant) }))
}

fn handle_list(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = state.db.as_ref().ok_or(AppError::NoWorkspace)?;
    let search = optional_str(&req.params, "search");
    let stage = match req.params.get("stage") {
        None | Some(serde_json::Value::Null) => None,
        Some(_) => Some(AdmissionStage::from_number(required_param(&req.params, "stage")?)?),
    };

    let rows: Vec<AdmissionRow> = load_rows(conn)?
        .into_iter()
        .filter(|r| stage.map(|s| r.stage == s.number()).unwrap_or(true))
        .filter(|r| search.as_deref().map(|q| r.matches(q)).unwrap_or(true))
        .collect();

    let mut counts = serde_json::Map::new();
    for s in AdmissionStage::ALL {
        let n = rows.iter().filter(|r| r.stage == s.number()).count();
        counts.insert(s.number().to_string(), json!(n));
    }

    state.admissions.replace(rows);
    Ok(json!({
        "rows": state.admissions.rows(),
        "countsByStage": counts,
    }))
}

fn parse_set_stage(req: &Request) -> AppResult<(String, AdmissionStage)> {
    let id = required_str(&req.params, "stakeholderId")?;
    let stage = AdmissionStage::from_number(required_param(&req.params, "stage")?)?;
    Ok((id, stage))
}

fn handle_set_stage(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (id, to) = match parse_set_stage(req) {
        Ok(v) => v,
        Err(e) => return fail(&req.id, &e),
    };
    let Some(conn) = state.db.as_ref() else {
        return fail(&req.id, &AppError::NoWorkspace);
    };

    // Rows that were never listed are picked up from the store first.
    if state.admissions.get(&id).is_none() {
        match db::get_stakeholder(conn, &id) {
            Ok(Some(s)) if s.kind == APPLICANT_KIND => {
                state.admissions.upsert(AdmissionRow::from_stakeholder(&s))
            }
            Ok(_) => return fail(&req.id, &AppError::not_found("admission", id)),
            Err(e) => return fail(&req.id, &e),
        }
    }
    let backend = WorkspaceBackend::new(conn);
    match state.admissions.set_stage(&backend, &id, to) {
        Ok(change) => ok(
            &req.id,
            json!({
                "change": change,
                "row": state.admissions.get(&id),
            }),
        ),
        Err(e) if e.rolled_back => err(
            &req.id,
            e.source.code(),
            e.source.to_string(),
            Some(json!({ "rolledBack": true, "row": state.admissions.get(&id) })),
        ),
        Err(e) => fail(&req.id, &e.source),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "admissions.stages" => Some(respond(&req.id, handle_stages())),
        "admissions.create" => Some(respond(&req.id, handle_create(state, req))),
        "admissions.list" => Some(respond(&req.id, handle_list(state, req))),
        "admissions.setStage" => Some(handle_set_stage(state, req)),
        _ => None,
    }
}

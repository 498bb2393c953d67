use super::{optional_param, optional_str, optional_usize, required_param};
use crate::error::{AppError, AppResult};
use crate::format::display_date;
use crate::ipc::error::respond;
use crate::ipc::types::{AppState, Request};
use crate::stage::AdmissionStage;
use crate::table::{Action, Column, DataTable, RowPredicate, SubItem, TableRow};
use serde::Deserialize;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
enum CellFormat {
    #[default]
    Raw,
    Date,
    StageLabel,
    Upper,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColumnSpec {
    key: String,
    title: String,
    #[serde(default)]
    format: CellFormat,
    #[serde(default)]
    class_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct DisabledWhen {
    field: String,
    equals: Value,
}

#[derive(Debug, Deserialize)]
struct SubItemSpec {
    label: String,
    #[serde(default, rename = "disabledWhen")]
    disabled_when: Option<DisabledWhen>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum ActionSpec {
    Link {
        label: String,
        href: String,
        #[serde(default, rename = "disabledWhen")]
        disabled_when: Option<DisabledWhen>,
    },
    Button {
        label: String,
        #[serde(default, rename = "disabledWhen")]
        disabled_when: Option<DisabledWhen>,
    },
    Dropdown {
        label: String,
        items: Vec<SubItemSpec>,
    },
}

/// Fill `{field}` placeholders from the row. Unknown fields become empty.
fn fill_template(template: &str, row: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let key = &rest[start + 1..start + len];
        out.push_str(&row.field(key).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    out
}

fn predicate(spec: Option<DisabledWhen>) -> Option<RowPredicate<Value>> {
    spec.map(|w| -> RowPredicate<Value> {
        Box::new(move |row: &Value| row.get(&w.field) == Some(&w.equals))
    })
}

fn build_column(spec: ColumnSpec) -> Column<Value> {
    let mut col = Column::new(spec.key, spec.title);
    if let Some(c) = spec.class_name {
        col = col.class_name(c);
    }
    match spec.format {
        CellFormat::Raw => col,
        CellFormat::Date => col.render(|raw, _| raw.map(display_date).unwrap_or_default()),
        CellFormat::StageLabel => col.render(|raw, _| {
            raw.and_then(|v| v.parse::<i64>().ok())
                .map(|n| AdmissionStage::label_for(n).to_string())
                .unwrap_or_default()
        }),
        CellFormat::Upper => col.render(|raw, _| raw.unwrap_or_default().to_uppercase()),
    }
}

fn build_action(spec: ActionSpec) -> Action<Value> {
    match spec {
        ActionSpec::Link {
            label,
            href,
            disabled_when,
        } => Action::Link {
            label,
            href: Box::new(move |row: &Value| fill_template(&href, row)),
            disabled: predicate(disabled_when),
        },
        ActionSpec::Button {
            label,
            disabled_when,
        } => {
            let log_label = label.clone();
            Action::Button {
                label,
                on_click: Box::new(move |row: &Value| {
                    tracing::debug!(action = %log_label, row = ?row.field("id"), "table action");
                }),
                disabled: predicate(disabled_when),
            }
        }
        ActionSpec::Dropdown { label, items } => Action::Dropdown {
            label,
            items: items
                .into_iter()
                .map(|it| {
                    let log_label = it.label.clone();
                    SubItem {
                        label: it.label,
                        on_click: Box::new(move |row: &Value| {
                            tracing::debug!(action = %log_label, row = ?row.field("id"), "table action");
                        }),
                        disabled: predicate(it.disabled_when),
                    }
                })
                .collect(),
        },
    }
}

fn row_id_fn(key: String) -> impl Fn(&Value) -> String {
    move |row: &Value| row.field(&key).unwrap_or_default()
}

fn row_id_key(req: &Request) -> String {
    optional_str(&req.params, "rowIdKey").unwrap_or_else(|| "id".to_string())
}

fn handle_render(req: &Request) -> AppResult<Value> {
    let columns: Vec<ColumnSpec> = required_param(&req.params, "columns")?;
    let rows: Vec<Value> = required_param(&req.params, "rows")?;
    let actions: Vec<ActionSpec> = optional_param(&req.params, "actions")?;

    let mut table = DataTable::<Value>::new(columns.into_iter().map(build_column).collect())
        .with_actions(actions.into_iter().map(build_action).collect());
    if let Some(msg) = optional_str(&req.params, "emptyMessage") {
        table = table.with_empty_message(msg);
    }
    let selectable = req
        .params
        .get("enableRowSelection")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if selectable {
        let selected: BTreeSet<String> = optional_param(&req.params, "selectedRows")?;
        table = table.with_row_selection(row_id_fn(row_id_key(req)), selected);
    }

    Ok(serde_json::to_value(table.render(&rows))?)
}

fn handle_activate(req: &Request) -> AppResult<Value> {
    let actions: Vec<ActionSpec> = required_param(&req.params, "actions")?;
    let row: Value = required_param(&req.params, "row")?;
    let action_index = optional_usize(&req.params, "actionIndex")?
        .ok_or_else(|| AppError::bad_params("missing actionIndex"))?;
    let item_index = optional_usize(&req.params, "itemIndex")?;

    let table = DataTable::<Value>::new(Vec::new()).with_actions(actions.into_iter().map(build_action).collect());
    let activation = table.activate(&row, action_index, item_index)?;
    Ok(serde_json::to_value(activation)?)
}

fn handle_toggle_selection(req: &Request) -> AppResult<Value> {
    let rows: Vec<Value> = optional_param(&req.params, "rows")?;
    let selected: BTreeSet<String> = optional_param(&req.params, "selectedRows")?;
    let all = req
        .params
        .get("all")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let key = row_id_key(req);

    let mut table = DataTable::<Value>::new(Vec::new()).with_row_selection(row_id_fn(key.clone()), selected);
    if all {
        table.toggle_all(&rows)?;
    } else {
        let row_id = optional_str(&req.params, "rowId")
            .ok_or_else(|| AppError::bad_params("missing rowId (or set all)"))?;
        let row = rows
            .iter()
            .find(|r| r.field(&key).as_deref() == Some(row_id.as_str()))
            .cloned()
            .unwrap_or_else(|| {
                let mut stub = serde_json::Map::new();
                stub.insert(key.clone(), Value::String(row_id.clone()));
                Value::Object(stub)
            });
        table.toggle_row(&row)?;
    }
    let selected_rows = table.selected().cloned().unwrap_or_default();
    let all_selected = !rows.is_empty()
        && rows
            .iter()
            .all(|r| selected_rows.contains(&r.field(&key).unwrap_or_default()));
    Ok(json!({ "selectedRows": selected_rows, "allSelected": all_selected }))
}

/// Row click with an optional `rowHref` template. The click handler resolves
/// the template against the clicked row; without one the click is unhandled.
fn handle_click_row(req: &Request) -> AppResult<Value> {
    let row: Value = required_param(&req.params, "row")?;
    let target: Rc<RefCell<Option<String>>> = Rc::default();
    let mut table = DataTable::<Value>::new(Vec::new());
    if let Some(template) = optional_str(&req.params, "rowHref") {
        let sink = Rc::clone(&target);
        table = table.with_row_click(move |r: &Value| {
            *sink.borrow_mut() = Some(fill_template(&template, r));
        });
    }
    let handled = table.click_row(&row);
    let href = target.borrow_mut().take();
    Ok(json!({ "handled": handled, "href": href }))
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "table.render" => handle_render(req),
        "table.activate" => handle_activate(req),
        "table.toggleSelection" => handle_toggle_selection(req),
        "table.clickRow" => handle_click_row(req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}

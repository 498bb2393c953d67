use crate::error::{AppError, AppResult};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// Raw field lookup for a table row.
pub trait TableRow {
    fn field(&self, key: &str) -> Option<String>;
}

impl TableRow for Value {
    fn field(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

pub type CellRender<T> = Box<dyn Fn(Option<&str>, &T) -> String>;
pub type RowPredicate<T> = Box<dyn Fn(&T) -> bool>;
pub type RowHandler<T> = Box<dyn Fn(&T)>;
pub type RowHref<T> = Box<dyn Fn(&T) -> String>;
pub type RowId<T> = Box<dyn Fn(&T) -> String>;
pub type SelectionListener = Box<dyn FnMut(&BTreeSet<String>)>;

pub struct Column<T> {
    pub key: String,
    pub title: String,
    pub render: Option<CellRender<T>>,
    pub class_name: Option<String>,
}

impl<T> Column<T> {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            render: None,
            class_name: None,
        }
    }

    pub fn render(mut self, f: impl Fn(Option<&str>, &T) -> String + 'static) -> Self {
        self.render = Some(Box::new(f));
        self
    }

    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }
}

pub struct SubItem<T> {
    pub label: String,
    pub on_click: RowHandler<T>,
    pub disabled: Option<RowPredicate<T>>,
}

pub enum Action<T> {
    Link {
        label: String,
        href: RowHref<T>,
        disabled: Option<RowPredicate<T>>,
    },
    Button {
        label: String,
        on_click: RowHandler<T>,
        disabled: Option<RowPredicate<T>>,
    },
    Dropdown {
        label: String,
        items: Vec<SubItem<T>>,
    },
}

fn is_disabled<T>(pred: &Option<RowPredicate<T>>, row: &T) -> bool {
    pred.as_ref().map(|p| p(row)).unwrap_or(false)
}

struct Selection<T> {
    row_id: RowId<T>,
    selected: BTreeSet<String>,
    on_change: Option<SelectionListener>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderCell {
    pub key: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedCell {
    pub key: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedSubItem {
    pub label: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderedAction {
    Link {
        label: String,
        href: String,
        disabled: bool,
    },
    Button {
        label: String,
        disabled: bool,
    },
    Dropdown {
        label: String,
        items: Vec<RenderedSubItem>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderedRow {
    #[serde(rename_all = "camelCase")]
    Data {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        selected: bool,
        cells: Vec<RenderedCell>,
        actions: Vec<RenderedAction>,
    },
    #[serde(rename_all = "camelCase")]
    Empty { message: String, col_span: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub columns: Vec<HeaderCell>,
    pub rows: Vec<RenderedRow>,
    pub selectable: bool,
    pub all_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum Activation {
    Navigate { href: String },
    Invoked { label: String },
    Disabled { label: String },
}

/// Column/action schema applied to any row type. The table never mutates
/// rows; handlers own every side effect.
pub struct DataTable<T> {
    columns: Vec<Column<T>>,
    actions: Vec<Action<T>>,
    selection: Option<Selection<T>>,
    on_row_click: Option<RowHandler<T>>,
    empty_message: String,
}

impl<T: TableRow> DataTable<T> {
    pub fn new(columns: Vec<Column<T>>) -> Self {
        Self {
            columns,
            actions: Vec::new(),
            selection: None,
            on_row_click: None,
            empty_message: "No data available".to_string(),
        }
    }

    pub fn with_actions(mut self, actions: Vec<Action<T>>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    pub fn with_row_click(mut self, f: impl Fn(&T) + 'static) -> Self {
        self.on_row_click = Some(Box::new(f));
        self
    }

    pub fn with_row_selection(
        mut self,
        row_id: impl Fn(&T) -> String + 'static,
        selected: BTreeSet<String>,
    ) -> Self {
        self.selection = Some(Selection {
            row_id: Box::new(row_id),
            selected,
            on_change: None,
        });
        self
    }

    pub fn on_selection_change(mut self, f: impl FnMut(&BTreeSet<String>) + 'static) -> Self {
        if let Some(sel) = self.selection.as_mut() {
            sel.on_change = Some(Box::new(f));
        }
        self
    }

    pub fn selected(&self) -> Option<&BTreeSet<String>> {
        self.selection.as_ref().map(|s| &s.selected)
    }

    fn col_span(&self) -> usize {
        self.columns.len()
            + usize::from(!self.actions.is_empty())
            + usize::from(self.selection.is_some())
    }

    pub fn render(&self, rows: &[T]) -> TableView {
        let columns = self
            .columns
            .iter()
            .map(|c| HeaderCell {
                key: c.key.clone(),
                title: c.title.clone(),
                class_name: c.class_name.clone(),
            })
            .collect();

        let rendered = if rows.is_empty() {
            vec![RenderedRow::Empty {
                message: self.empty_message.clone(),
                col_span: self.col_span(),
            }]
        } else {
            rows.iter().map(|row| self.render_row(row)).collect()
        };

        let all_selected = match &self.selection {
            Some(sel) if !rows.is_empty() => rows.iter().all(|r| sel.selected.contains(&(sel.row_id)(r))),
            _ => false,
        };

        TableView {
            columns,
            rows: rendered,
            selectable: self.selection.is_some(),
            all_selected,
        }
    }

    fn render_row(&self, row: &T) -> RenderedRow {
        let cells = self
            .columns
            .iter()
            .map(|c| {
                let raw = row.field(&c.key);
                let text = match &c.render {
                    Some(f) => f(raw.as_deref(), row),
                    None => raw.unwrap_or_default(),
                };
                RenderedCell {
                    key: c.key.clone(),
                    text,
                    class_name: c.class_name.clone(),
                }
            })
            .collect();

        let actions = self
            .actions
            .iter()
            .map(|a| match a {
                Action::Link {
                    label,
                    href,
                    disabled,
                } => RenderedAction::Link {
                    label: label.clone(),
                    href: href(row),
                    disabled: is_disabled(disabled, row),
                },
                Action::Button {
                    label, disabled, ..
                } => RenderedAction::Button {
                    label: label.clone(),
                    disabled: is_disabled(disabled, row),
                },
                Action::Dropdown { label, items } => RenderedAction::Dropdown {
                    label: label.clone(),
                    items: items
                        .iter()
                        .map(|it| RenderedSubItem {
                            label: it.label.clone(),
                            disabled: is_disabled(&it.disabled, row),
                        })
                        .collect(),
                },
            })
            .collect();

        let (id, selected) = match &self.selection {
            Some(sel) => {
                let id = (sel.row_id)(row);
                let selected = sel.selected.contains(&id);
                (Some(id), selected)
            }
            None => (None, false),
        };

        RenderedRow::Data {
            id,
            selected,
            cells,
            actions,
        }
    }

    /// Run an action (or dropdown sub-item) against a row. Disabled entries
    /// never reach their handler.
    pub fn activate(&self, row: &T, action_index: usize, item_index: Option<usize>) -> AppResult<Activation> {
        let action = self
            .actions
            .get(action_index)
            .ok_or_else(|| AppError::bad_params(format!("no action at index {}", action_index)))?;

        match action {
            Action::Link {
                label,
                href,
                disabled,
            } => {
                if is_disabled(disabled, row) {
                    return Ok(Activation::Disabled {
                        label: label.clone(),
                    });
                }
                Ok(Activation::Navigate { href: href(row) })
            }
            Action::Button {
                label,
                on_click,
                disabled,
            } => {
                if is_disabled(disabled, row) {
                    return Ok(Activation::Disabled {
                        label: label.clone(),
                    });
                }
                on_click(row);
                Ok(Activation::Invoked {
                    label: label.clone(),
                })
            }
            Action::Dropdown { label, items } => {
                let Some(idx) = item_index else {
                    return Err(AppError::bad_params(format!(
                        "dropdown {} needs an itemIndex",
                        label
                    )));
                };
                let item = items.get(idx).ok_or_else(|| {
                    AppError::bad_params(format!("dropdown {} has no item at index {}", label, idx))
                })?;
                if is_disabled(&item.disabled, row) {
                    return Ok(Activation::Disabled {
                        label: item.label.clone(),
                    });
                }
                (item.on_click)(row);
                Ok(Activation::Invoked {
                    label: item.label.clone(),
                })
            }
        }
    }

    /// Returns false when no row click handler is configured.
    pub fn click_row(&self, row: &T) -> bool {
        match &self.on_row_click {
            Some(f) => {
                f(row);
                true
            }
            None => false,
        }
    }

    pub fn toggle_row(&mut self, row: &T) -> AppResult<bool> {
        let sel = self
            .selection
            .as_mut()
            .ok_or_else(|| AppError::bad_params("row selection is not enabled"))?;
        let id = (sel.row_id)(row);
        let now_selected = if sel.selected.remove(&id) {
            false
        } else {
            sel.selected.insert(id);
            true
        };
        if let Some(f) = sel.on_change.as_mut() {
            f(&sel.selected);
        }
        Ok(now_selected)
    }

    /// Select every row, or clear the selection when every row is already selected.
    pub fn toggle_all(&mut self, rows: &[T]) -> AppResult<()> {
        let sel = self
            .selection
            .as_mut()
            .ok_or_else(|| AppError::bad_params("row selection is not enabled"))?;
        let ids: Vec<String> = rows.iter().map(|r| (sel.row_id)(r)).collect();
        if !ids.is_empty() && ids.iter().all(|id| sel.selected.contains(id)) {
            for id in &ids {
                sel.selected.remove(id);
            }
        } else {
            sel.selected.extend(ids);
        }
        if let Some(f) = sel.on_change.as_mut() {
            f(&sel.selected);
        }
        Ok(())
    }
}

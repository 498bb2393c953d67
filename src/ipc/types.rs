use std::collections::HashMap;
use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;
use serde_json::Value;

use crate::admissions::AdmissionBoard;
use crate::cart::Cart;
use crate::config::Config;
use crate::debounce::Debouncer;
use crate::error::{AppError, AppResult};
use crate::paging::Pager;
use crate::session::Session;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// One open "load more" list: the unfiltered source, the filtered window over
/// it, and the search input waiting out its quiet period.
pub struct PagerSlot {
    pub source: Vec<Value>,
    pub pager: Pager<Value>,
    pub search_keys: Vec<String>,
    pub search: Debouncer<String>,
    pub query: String,
}

pub struct AppState {
    pub config: Config,
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub session: Option<Session>,
    pub admissions: AdmissionBoard,
    pub pagers: HashMap<String, PagerSlot>,
    pub cart: Cart,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            workspace: None,
            db: None,
            session: None,
            admissions: AdmissionBoard::default(),
            pagers: HashMap::new(),
            cart: Cart::default(),
        }
    }

    pub fn conn(&self) -> AppResult<&Connection> {
        self.db.as_ref().ok_or(AppError::NoWorkspace)
    }
}

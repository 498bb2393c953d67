use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("select a workspace first")]
    NoWorkspace,

    #[error("set a session first")]
    NoSession,

    #[error("{0}")]
    BadParams(String),

    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("stage must be between 1 and 6, got {0}")]
    InvalidStage(i64),

    #[error("stakeholder is already at stage {0}")]
    StageUnchanged(&'static str),

    #[error("page sizes must be greater than zero")]
    InvalidPageSize,

    #[error("unrecognized response envelope: {0}")]
    BadEnvelope(String),

    #[error("cart is empty")]
    EmptyCart,

    #[error("failed to open workspace: {0}")]
    WorkspaceOpen(String),

    #[error("backend rejected the update: {0}")]
    Backend(String),

    #[error(transparent)]
    Db(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn bad_params(message: impl Into<String>) -> Self {
        AppError::BadParams(message.into())
    }

    pub fn not_found(what: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound {
            what,
            id: id.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NoWorkspace => "no_workspace",
            AppError::NoSession => "no_session",
            AppError::BadParams(_) => "bad_params",
            AppError::NotFound { .. } => "not_found",
            AppError::InvalidStage(_) => "invalid_stage",
            AppError::StageUnchanged(_) => "stage_unchanged",
            AppError::InvalidPageSize => "invalid_page_size",
            AppError::BadEnvelope(_) => "bad_envelope",
            AppError::EmptyCart => "empty_cart",
            AppError::WorkspaceOpen(_) => "db_open_failed",
            AppError::Backend(_) => "backend_failed",
            AppError::Db(_) => "db_error",
            AppError::Json(_) => "json_error",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

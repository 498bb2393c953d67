pub mod admissions;
pub mod canteen;
pub mod core;
pub mod pager;
pub mod records;
pub mod session;
pub mod table;

use crate::error::{AppError, AppResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

fn required_str(params: &Value, key: &str) -> AppResult<String> {
    let v = params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| AppError::bad_params(format!("missing {}", key)))?;
    if v.is_empty() {
        return Err(AppError::bad_params(format!("{} must not be empty", key)));
    }
    Ok(v)
}

fn optional_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn optional_usize(params: &Value, key: &str) -> AppResult<Option<usize>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| AppError::bad_params(format!("{} must be a non-negative integer", key))),
    }
}

fn required_param<T: DeserializeOwned>(params: &Value, key: &str) -> AppResult<T> {
    let raw = params
        .get(key)
        .cloned()
        .ok_or_else(|| AppError::bad_params(format!("missing {}", key)))?;
    serde_json::from_value(raw).map_err(|e| AppError::bad_params(format!("invalid {}: {}", key, e)))
}

fn optional_param<T: DeserializeOwned + Default>(params: &Value, key: &str) -> AppResult<T> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(raw) => serde_json::from_value(raw.clone())
            .map_err(|e| AppError::bad_params(format!("invalid {}: {}", key, e))),
    }
}

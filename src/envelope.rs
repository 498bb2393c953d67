use crate::error::{AppError, AppResult};
use serde_json::{Map, Value};

/// A backend list response with its record array pulled out.
///
/// The backend answers lists as a bare array, `{data: [...]}`, or
/// `{data: {data: [...], total, ...}}` depending on the endpoint. Everything
/// other than the record array is kept in `meta`.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub data: Vec<Value>,
    pub meta: Map<String, Value>,
}

impl Envelope {
    pub fn normalize(raw: Value) -> AppResult<Self> {
        match raw {
            Value::Array(items) => Ok(Self {
                data: items,
                meta: Map::new(),
            }),
            Value::Object(mut outer) => {
                let Some(inner) = outer.remove("data") else {
                    return Err(AppError::BadEnvelope("missing data".to_string()));
                };
                let mut meta = outer;
                match inner {
                    Value::Array(items) => Ok(Self { data: items, meta }),
                    Value::Object(mut nested) => match nested.remove("data") {
                        Some(Value::Array(items)) => {
                            meta.extend(nested);
                            Ok(Self { data: items, meta })
                        }
                        Some(other) => Err(AppError::BadEnvelope(format!(
                            "data.data must be an array, got {}",
                            kind(&other)
                        ))),
                        // single record
                        None => Ok(Self {
                            data: vec![Value::Object(nested)],
                            meta,
                        }),
                    },
                    other => Err(AppError::BadEnvelope(format!(
                        "data must be an array or object, got {}",
                        kind(&other)
                    ))),
                }
            }
            other => Err(AppError::BadEnvelope(format!(
                "expected array or object, got {}",
                kind(&other)
            ))),
        }
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

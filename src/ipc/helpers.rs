use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::MAX_PAGE_SIZE;
use crate::ipc::error::HandlerErr;

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing params.{}", key)))
}

pub fn get_optional_str(params: &serde_json::Value, key: &str) -> Result<Option<String>, HandlerErr> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| HandlerErr::bad_params(format!("params.{} must be a string", key))),
    }
}

pub fn parse_page(v: Option<&serde_json::Value>) -> Result<usize, HandlerErr> {
    let Some(value) = v else {
        return Err(HandlerErr::bad_params("missing params.page"));
    };
    let Some(page) = value.as_u64() else {
        return Err(HandlerErr::bad_params("params.page must be a positive integer"));
    };
    if page == 0 {
        return Err(HandlerErr::bad_params("params.page must be >= 1"));
    }
    Ok(page as usize)
}

pub fn parse_page_size(v: Option<&serde_json::Value>) -> Result<usize, HandlerErr> {
    let Some(value) = v else {
        return Err(HandlerErr::bad_params("missing params.pageSize"));
    };
    let Some(size) = value.as_u64() else {
        return Err(HandlerErr::bad_params("params.pageSize must be a positive integer"));
    };
    if size == 0 || size as usize > MAX_PAGE_SIZE {
        return Err(HandlerErr::bad_params(format!(
            "params.pageSize must be in range 1..={}",
            MAX_PAGE_SIZE
        )));
    }
    Ok(size as usize)
}

/// Deserialize `params.<key>` (or `{}` when absent) into a typed form.
pub fn parse_form<T: DeserializeOwned>(params: &serde_json::Value, key: &str) -> Result<T, HandlerErr> {
    let raw = params
        .get(key)
        .cloned()
        .unwrap_or_else(|| serde_json::Value::Object(Default::default()));
    if !raw.is_object() {
        return Err(HandlerErr::bad_params(format!("params.{} must be an object", key)));
    }
    serde_json::from_value(raw)
        .map_err(|e| HandlerErr::bad_params(format!("params.{}: {}", key, e)))
}

pub fn to_json<T: Serialize>(value: T) -> Result<serde_json::Value, HandlerErr> {
    serde_json::to_value(value).map_err(|e| HandlerErr::new("internal", e.to_string()))
}

/// Deserialize the whole params object.
pub fn parse_params<T: DeserializeOwned>(params: &serde_json::Value) -> Result<T, HandlerErr> {
    let raw = match params {
        serde_json::Value::Null => serde_json::Value::Object(Default::default()),
        other => other.clone(),
    };
    serde_json::from_value(raw).map_err(|e| HandlerErr::bad_params(e.to_string()))
}

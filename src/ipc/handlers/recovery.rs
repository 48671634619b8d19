//! Fee recovery reminders. Messages are composed here and handed back to the
//! shell, which owns delivery.

use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::lists::ensure_loaded;
use crate::ipc::handlers::school::school_details;
use crate::ipc::helpers::{get_optional_str, get_required_str, to_json};
use crate::ipc::types::{AppState, Request};
use crate::messages::{self, MessageBody, TEMPLATES};
use crate::model::Defaulter;
use crate::validate::FieldError;
use serde_json::json;

/// Owned form of [`MessageBody`] resolved from request params.
enum Body {
    Template(&'static messages::Template),
    Custom(String),
}

impl Body {
    fn as_message(&self) -> MessageBody<'_> {
        match self {
            Body::Template(t) => MessageBody::Template(t),
            Body::Custom(text) => MessageBody::Custom(text),
        }
    }
}

/// A non-blank `message` wins over `templateId`.
fn resolve_body(params: &serde_json::Value) -> Result<Body, HandlerErr> {
    if let Some(text) = get_optional_str(params, "message")?.filter(|m| !m.trim().is_empty()) {
        return Ok(Body::Custom(text));
    }
    match get_optional_str(params, "templateId")? {
        Some(id) => messages::template(&id)
            .map(Body::Template)
            .ok_or_else(|| HandlerErr::not_found("template", &id)),
        None => Err(HandlerErr::validation(vec![FieldError {
            field: "message".to_string(),
            message: "choose a template or write a message".to_string(),
        }])),
    }
}

fn templates() -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({ "templates": to_json(TEMPLATES)? }))
}

fn compose(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let defaulter_id = get_required_str(&req.params, "defaulterId")?;
    let body = resolve_body(&req.params)?;
    let school_name = school_details(state)?.name.clone();
    ensure_loaded::<Defaulter>(state)?;

    let defaulter = state
        .screens
        .defaulters
        .find(&defaulter_id)
        .ok_or_else(|| HandlerErr::not_found("defaulter", &defaulter_id))?;
    let message = messages::compose(body.as_message(), defaulter, &school_name);
    to_json(message)
}

/// One message per defaulter matching the current view filter, across all pages.
fn bulk(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let body = resolve_body(&req.params)?;
    let school_name = school_details(state)?.name.clone();
    ensure_loaded::<Defaulter>(state)?;

    let view = &state.screens.defaulters;
    if view.filtered_len() == 0 {
        return Err(HandlerErr::validation(vec![FieldError {
            field: "recipients".to_string(),
            message: "no defaulters match the current filters".to_string(),
        }]));
    }
    let batch = messages::compose_bulk(body.as_message(), view.filtered(), &school_name);
    tracing::info!(count = batch.len(), "bulk reminders composed");
    Ok(json!({
        "count": batch.len(),
        "messages": to_json(&batch)?,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "recovery.templates" => templates(),
        "recovery.compose" => compose(state, req),
        "recovery.bulk" => bulk(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}

//! WhatsApp sender settings. Stored and validated here; sending stays with
//! the shell. The API key never leaves the daemon unredacted.

use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{parse_form, to_json};
use crate::ipc::types::{AppState, Request};
use crate::messages;
use crate::model::WhatsAppSettings;
use crate::validate::Validator;
use serde::Deserialize;

const MIN_KEY_LEN: usize = 8;

fn settings(state: &mut AppState) -> Result<&WhatsAppSettings, HandlerErr> {
    if state.whatsapp.is_none() {
        let loaded = state
            .source
            .fetch_whatsapp_settings()
            .map_err(HandlerErr::source)?;
        state.whatsapp = Some(loaded);
    }
    state
        .whatsapp
        .as_ref()
        .ok_or_else(|| HandlerErr::new("internal", "whatsapp settings unavailable"))
}

fn render(settings: &WhatsAppSettings) -> Result<serde_json::Value, HandlerErr> {
    let mut out = to_json(settings.redacted())?;
    out["apiKeySet"] = serde_json::Value::Bool(!settings.api_key.is_empty());
    Ok(out)
}

/// Absent fields keep their current value. An empty `apiKey` clears the key.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WhatsAppForm {
    enabled: Option<bool>,
    api_key: Option<String>,
    template_enabled: Option<bool>,
    default_template: Option<String>,
}

fn get(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    render(settings(state)?)
}

fn update(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let form: WhatsAppForm = parse_form(&req.params, "form")?;
    let current = settings(state)?.clone();

    let mut v = Validator::new();
    let enabled = form.enabled.unwrap_or(current.enabled);
    let template_enabled = form.template_enabled.unwrap_or(current.template_enabled);
    let api_key = match form.api_key.as_deref().map(str::trim) {
        None => current.api_key.clone(),
        Some(key)
            if key.chars().any(char::is_whitespace)
                || (!key.is_empty() && key.len() < MIN_KEY_LEN) =>
        {
            v.push(
                "apiKey",
                format!("apiKey must be at least {} characters without spaces", MIN_KEY_LEN),
            );
            current.api_key.clone()
        }
        Some(key) => key.to_string(),
    };
    if enabled && api_key.is_empty() {
        v.push("apiKey", "apiKey is required while WhatsApp is enabled");
    }
    let default_template = form
        .default_template
        .map(|t| t.trim().to_string())
        .unwrap_or_else(|| current.default_template.clone());
    if template_enabled && default_template.is_empty() {
        v.push("defaultTemplate", "defaultTemplate is required while templates are enabled");
    }
    let unknown = messages::unknown_placeholders(&default_template);
    if !unknown.is_empty() {
        v.push(
            "defaultTemplate",
            format!("unknown placeholders: {}", unknown.join(", ")),
        );
    }
    v.finish().into_result().map_err(HandlerErr::validation)?;

    let updated = WhatsAppSettings {
        enabled,
        api_key,
        template_enabled,
        default_template,
    };
    tracing::info!(enabled, template_enabled, "whatsapp settings updated");
    let result = render(&updated)?;
    state.whatsapp = Some(updated);
    Ok(result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "whatsapp.get" => get(state),
        "whatsapp.update" => update(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}

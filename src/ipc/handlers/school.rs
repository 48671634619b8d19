use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{parse_form, to_json};
use crate::ipc::types::{AppState, Request};
use crate::model::SchoolDetails;
use crate::validate::Validator;
use serde::Deserialize;

/// The cached school details, fetched on first use.
pub(crate) fn school_details(state: &mut AppState) -> Result<&SchoolDetails, HandlerErr> {
    if state.school.is_none() {
        let details = state.source.fetch_school().map_err(HandlerErr::source)?;
        state.school = Some(details);
    }
    state
        .school
        .as_ref()
        .ok_or_else(|| HandlerErr::new("internal", "school details unavailable"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchoolForm {
    name: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    principal: Option<String>,
    slogan: Option<String>,
}

fn get(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    to_json(school_details(state)?)
}

fn update(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let form: SchoolForm = parse_form(&req.params, "form")?;
    let current = school_details(state)?.clone();

    let mut v = Validator::new();
    let name = v.require("name", form.name.as_deref());
    let email = v.email("email", form.email.as_deref());
    let address = v.optional(form.address.as_deref());
    let phone = v.optional(form.phone.as_deref());
    let principal = v.optional(form.principal.as_deref());
    let slogan = v.optional(form.slogan.as_deref());
    v.finish().into_result().map_err(HandlerErr::validation)?;

    let updated = SchoolDetails {
        name: name.unwrap_or(current.name),
        email: email.unwrap_or(current.email),
        address: address.unwrap_or(current.address),
        phone: phone.unwrap_or(current.phone),
        principal: principal.unwrap_or(current.principal),
        slogan: slogan.unwrap_or(current.slogan),
    };
    tracing::info!(name = %updated.name, "school details updated");
    let result = to_json(&updated)?;
    state.school = Some(updated);
    Ok(result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "school.get" => get(state),
        "school.update" => update(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}

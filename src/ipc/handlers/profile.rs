//! The signed-in user's own profile. Only contact details are editable.

use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{parse_form, to_json};
use crate::ipc::types::{AppState, Request};
use crate::model::Profile;
use crate::validate::Validator;
use serde::Deserialize;

fn signed_in_user(state: &AppState) -> Result<String, HandlerErr> {
    state
        .session
        .as_ref()
        .map(|s| s.username.clone())
        .ok_or_else(|| HandlerErr::new("unauthorized", "sign in to see the profile"))
}

fn profile(state: &mut AppState) -> Result<&Profile, HandlerErr> {
    let username = signed_in_user(state)?;
    if state.profile.is_none() {
        let loaded = state
            .source
            .fetch_profile(&username)
            .map_err(HandlerErr::source)?;
        state.profile = Some(loaded);
    }
    state
        .profile
        .as_ref()
        .ok_or_else(|| HandlerErr::new("internal", "profile unavailable"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileForm {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    department: Option<String>,
}

fn get(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    to_json(profile(state)?)
}

fn update(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let form: ProfileForm = parse_form(&req.params, "form")?;
    let current = profile(state)?.clone();

    let mut v = Validator::new();
    let name = v.require("name", form.name.as_deref());
    let email = v.email("email", form.email.as_deref());
    let phone = v.phone("phone", form.phone.as_deref());
    let department = v.optional(form.department.as_deref());
    v.finish().into_result().map_err(HandlerErr::validation)?;

    let updated = Profile {
        name: name.unwrap_or_else(|| current.name.clone()),
        email: email.unwrap_or_else(|| current.email.clone()),
        phone: phone.unwrap_or_else(|| current.phone.clone()),
        department: department.unwrap_or_else(|| current.department.clone()),
        ..current
    };
    // The header shows the session's display name.
    if let Some(session) = state.session.as_mut() {
        session.name = updated.name.clone();
    }
    tracing::info!(user = %updated.id, "profile updated");
    let result = to_json(&updated)?;
    state.profile = Some(updated);
    Ok(result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "profile.get" => get(state),
        "profile.update" => update(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}

use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_optional_str, to_json};
use crate::ipc::types::{AppState, Request};
use crate::validate::Validator;
use serde_json::json;

fn login(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let username = get_optional_str(&req.params, "username")?;
    let password = get_optional_str(&req.params, "password")?;

    let mut v = Validator::new();
    let username = v.require("username", username.as_deref());
    // Passwords are not trimmed; only emptiness is checked.
    let password = match password.filter(|p| !p.is_empty()) {
        Some(p) => Some(p),
        None => {
            v.push("password", "password is required");
            None
        }
    };
    v.finish().into_result().map_err(HandlerErr::validation)?;
    let (Some(username), Some(password)) = (username, password) else {
        return Err(HandlerErr::bad_params("missing credentials"));
    };

    let session = state
        .source
        .login(&username, &password)
        .map_err(HandlerErr::source)?;
    tracing::info!(user = %session.username, "signed in");
    let result = json!({ "session": to_json(&session)? });
    state.session = Some(session);
    Ok(result)
}

/// Dropping the session also closes every screen.
fn logout(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let was_signed_in = state.session.take().is_some();
    state.profile = None;
    state.screens.unmount_all();
    tracing::info!(was_signed_in, "signed out");
    Ok(json!({ "signedOut": was_signed_in }))
}

fn session(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({ "session": to_json(&state.session)? }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "auth.login" => login(state, req),
        "auth.logout" => logout(state),
        "auth.session" => session(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}

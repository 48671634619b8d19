use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::lists::{require_ready, snapshot};
use crate::ipc::helpers::{get_required_str, to_json};
use crate::ipc::types::{AppState, Request};
use crate::model::Staff;
use serde_json::json;

fn toggle_active(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(&req.params, "id")?;
    require_ready::<Staff>(state)?;
    let mut member = state
        .screens
        .staff
        .find(&id)
        .cloned()
        .ok_or_else(|| HandlerErr::not_found("staff", &id))?;
    member.active = !member.active;
    state.screens.staff.replace(&id, member.clone());
    tracing::info!(staff = %member.name, active = member.active, "staff status toggled");
    Ok(json!({
        "record": to_json(&member)?,
        "view": snapshot::<Staff>(state)?,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "staff.toggleActive" => toggle_active(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}

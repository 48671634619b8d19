//! Inbox actions on top of the generic `notifications.*` list methods.

use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::lists::{ensure_loaded, require_ready, snapshot};
use crate::ipc::helpers::{get_required_str, to_json};
use crate::ipc::types::{AppState, Request};
use crate::model::Notification;
use serde_json::json;

/// Counted over the whole inbox, not the filtered view.
fn unread(state: &AppState) -> usize {
    state
        .screens
        .notifications
        .records()
        .iter()
        .filter(|n| !n.read)
        .count()
}

fn result(state: &AppState, record: &Notification) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({
        "record": to_json(record)?,
        "unread": unread(state),
        "view": snapshot::<Notification>(state)?,
    }))
}

fn mark_as_read(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(&req.params, "id")?;
    require_ready::<Notification>(state)?;
    let mut notification = state
        .screens
        .notifications
        .find(&id)
        .cloned()
        .ok_or_else(|| HandlerErr::not_found("notification", &id))?;
    notification.read = true;
    state.screens.notifications.replace(&id, notification.clone());
    result(state, &notification)
}

fn mark_all_as_read(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    require_ready::<Notification>(state)?;
    let mut inbox = state.screens.notifications.records().to_vec();
    let marked = inbox.iter().filter(|n| !n.read).count();
    for n in &mut inbox {
        n.read = true;
    }
    state.screens.notifications.set_records(inbox);
    tracing::debug!(marked, "notifications marked read");
    Ok(json!({
        "marked": marked,
        "unread": 0,
        "view": snapshot::<Notification>(state)?,
    }))
}

fn delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(&req.params, "id")?;
    require_ready::<Notification>(state)?;
    let removed = state
        .screens
        .notifications
        .remove(&id)
        .ok_or_else(|| HandlerErr::not_found("notification", &id))?;
    result(state, &removed)
}

/// Loads the inbox if needed, for the badge on the home screen.
fn unread_count(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    ensure_loaded::<Notification>(state)?;
    Ok(json!({ "unread": unread(state) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "notifications.markAsRead" => mark_as_read(state, req),
        "notifications.markAllAsRead" => mark_all_as_read(state),
        "notifications.delete" => delete(state, req),
        "notifications.unreadCount" => unread_count(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}

//! Generic list-screen methods: `<screen>.open`, `.search`, `.page`, `.create`, ...
//!
//! Every method that changes view state answers with the re-derived snapshot,
//! so the shell never has to recompute filtering or paging itself.

use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{
    get_optional_str, get_required_str, parse_form, parse_page, parse_page_size, to_json,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{
    Bus, BusExpense, ClassRoom, Defaulter, FeeAccount, FeeStructure, Notification, Staff, Student,
    Vehicle,
};
use crate::screens::{Editable, FetchCtx, Listable};
use crate::view::{LoadOutcome, SortDir, SortKey};
use serde_json::json;
use uuid::Uuid;

pub(crate) fn snapshot<T: Listable>(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    to_json(T::view(&state.screens).snapshot())
}

/// Fetch the screen's collection through a load ticket.
pub(crate) fn load<T: Listable>(state: &mut AppState) -> Result<LoadOutcome, HandlerErr> {
    let today = state.today();
    let defaulter_threshold_days = state.config.defaulter_threshold_days;
    let Some(ticket) = T::view_mut(&mut state.screens).begin_load() else {
        return Err(HandlerErr::new(
            "load_in_flight",
            format!("{} is already loading", T::SCREEN),
        ));
    };
    tracing::debug!(screen = T::SCREEN, "load started");

    let result = T::fetch(&FetchCtx {
        source: state.source.as_ref(),
        today,
        defaulter_threshold_days,
    });
    if let Err(e) = &result {
        tracing::warn!(screen = T::SCREEN, kind = e.code(), error = %e, "load failed");
    }

    let outcome = T::view_mut(&mut state.screens).finish_load(ticket, result);
    tracing::debug!(screen = T::SCREEN, ?outcome, "load finished");
    Ok(outcome)
}

fn load_failed<T: Listable>(state: &AppState) -> HandlerErr {
    let message = match T::view(&state.screens).load_state() {
        crate::view::LoadState::Failed { message } => message.clone(),
        _ => format!("{} could not be loaded", T::SCREEN),
    };
    let err = HandlerErr::new("load_failed", message);
    match snapshot::<T>(state) {
        Ok(view) => err.with_details(view),
        Err(_) => err,
    }
}

/// Load the screen unless it already holds data. Used by operations that
/// read another screen's records (payments, reminders, dashboard).
pub(crate) fn ensure_loaded<T: Listable>(state: &mut AppState) -> Result<(), HandlerErr> {
    if T::view(&state.screens).is_ready() {
        return Ok(());
    }
    match load::<T>(state)? {
        LoadOutcome::Applied => Ok(()),
        _ => Err(load_failed::<T>(state)),
    }
}

pub(crate) fn require_ready<T: Listable>(state: &AppState) -> Result<(), HandlerErr> {
    if T::view(&state.screens).is_ready() {
        Ok(())
    } else {
        Err(HandlerErr::new(
            "not_loaded",
            format!("{} is not loaded; call {}.open first", T::SCREEN, T::SCREEN),
        ))
    }
}

fn open<T: Listable>(state: &mut AppState, remount: bool) -> Result<serde_json::Value, HandlerErr> {
    if remount {
        T::view_mut(&mut state.screens).unmount();
    }
    match load::<T>(state)? {
        LoadOutcome::Failed | LoadOutcome::Stale => Err(load_failed::<T>(state)),
        LoadOutcome::Applied => snapshot::<T>(state),
    }
}

fn close<T: Listable>(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    T::view_mut(&mut state.screens).unmount();
    tracing::debug!(screen = T::SCREEN, "closed");
    Ok(json!({ "closed": true }))
}

fn search<T: Listable>(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let search = get_required_str(&req.params, "search")?;
    require_ready::<T>(state)?;
    T::view_mut(&mut state.screens).set_search(&search);
    snapshot::<T>(state)
}

fn select<T: Listable>(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let field = get_required_str(&req.params, "field")?;
    let value = get_required_str(&req.params, "value")?;
    if !T::SELECTORS.contains(&field.as_str()) {
        return Err(HandlerErr::bad_params(format!(
            "{} cannot be filtered by {}",
            T::SCREEN,
            field
        ))
        .with_details(json!({ "selectors": T::SELECTORS })));
    }
    require_ready::<T>(state)?;
    T::view_mut(&mut state.screens).set_selector(&field, &value);
    snapshot::<T>(state)
}

fn clear_filters<T: Listable>(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    require_ready::<T>(state)?;
    T::view_mut(&mut state.screens).clear_filters();
    snapshot::<T>(state)
}

/// `field: null` (or absent) removes the sort.
fn sort<T: Listable>(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let key = match get_optional_str(&req.params, "field")? {
        None => None,
        Some(field) => {
            if !T::SORT_FIELDS.contains(&field.as_str()) {
                return Err(HandlerErr::bad_params(format!(
                    "{} cannot be sorted by {}",
                    T::SCREEN,
                    field
                ))
                .with_details(json!({ "sortFields": T::SORT_FIELDS })));
            }
            let dir = match get_optional_str(&req.params, "dir")? {
                None => SortDir::Asc,
                Some(raw) => SortDir::parse(&raw)
                    .ok_or_else(|| HandlerErr::bad_params("params.dir must be asc or desc"))?,
            };
            Some(SortKey { field, dir })
        }
    };
    require_ready::<T>(state)?;
    T::view_mut(&mut state.screens).set_sort(key);
    snapshot::<T>(state)
}

fn page<T: Listable>(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let page = parse_page(req.params.get("page"))?;
    require_ready::<T>(state)?;
    T::view_mut(&mut state.screens).set_page(page);
    snapshot::<T>(state)
}

fn step<T: Listable>(state: &mut AppState, forward: bool) -> Result<serde_json::Value, HandlerErr> {
    require_ready::<T>(state)?;
    let view = T::view_mut(&mut state.screens);
    if forward {
        view.next_page();
    } else {
        view.prev_page();
    }
    snapshot::<T>(state)
}

fn page_size<T: Listable>(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let size = parse_page_size(req.params.get("pageSize"))?;
    require_ready::<T>(state)?;
    T::view_mut(&mut state.screens).set_page_size(size);
    snapshot::<T>(state)
}

fn record_result<T: Listable>(state: &AppState, record: &T) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({
        "record": to_json(record)?,
        "view": snapshot::<T>(state)?,
    }))
}

fn create<T: Editable>(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let form: T::Form = parse_form(&req.params, "form")?;
    require_ready::<T>(state)?;
    let record = T::build(form, Uuid::new_v4().to_string(), None).map_err(HandlerErr::validation)?;
    tracing::info!(screen = T::SCREEN, id = record.id(), "record created");
    T::view_mut(&mut state.screens).push(record.clone());
    record_result(state, &record)
}

fn update<T: Editable>(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(&req.params, "id")?;
    let form: T::Form = parse_form(&req.params, "form")?;
    require_ready::<T>(state)?;
    let existing = T::view(&state.screens)
        .find(&id)
        .cloned()
        .ok_or_else(|| HandlerErr::not_found(T::SCREEN, &id))?;
    let record = T::build(form, id.clone(), Some(&existing)).map_err(HandlerErr::validation)?;
    T::view_mut(&mut state.screens).replace(&id, record.clone());
    tracing::info!(screen = T::SCREEN, id = %id, "record updated");
    record_result(state, &record)
}

fn delete<T: Editable>(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(&req.params, "id")?;
    require_ready::<T>(state)?;
    let removed = T::view_mut(&mut state.screens)
        .remove(&id)
        .ok_or_else(|| HandlerErr::not_found(T::SCREEN, &id))?;
    T::after_delete(&removed, &mut state.screens);
    tracing::info!(screen = T::SCREEN, id = %id, "record deleted");
    record_result(state, &removed)
}

fn list_op<T: Listable>(
    state: &mut AppState,
    req: &Request,
    op: &str,
) -> Option<Result<serde_json::Value, HandlerErr>> {
    let result = match op {
        "open" => open::<T>(state, true),
        "refresh" => open::<T>(state, false),
        "close" => close::<T>(state),
        "view" => snapshot::<T>(state),
        "search" => search::<T>(state, req),
        "select" => select::<T>(state, req),
        "clearFilters" => clear_filters::<T>(state),
        "sort" => sort::<T>(state, req),
        "page" => page::<T>(state, req),
        "nextPage" => step::<T>(state, true),
        "prevPage" => step::<T>(state, false),
        "pageSize" => page_size::<T>(state, req),
        _ => return None,
    };
    Some(result)
}

fn editable_op<T: Editable>(
    state: &mut AppState,
    req: &Request,
    op: &str,
) -> Option<Result<serde_json::Value, HandlerErr>> {
    match op {
        "create" => Some(create::<T>(state, req)),
        "update" => Some(update::<T>(state, req)),
        "delete" => Some(delete::<T>(state, req)),
        _ => list_op::<T>(state, req, op),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let (screen, op) = req.method.split_once('.')?;
    let result = match screen {
        "students" => editable_op::<Student>(state, req, op),
        "classes" => editable_op::<ClassRoom>(state, req, op),
        "buses" => editable_op::<Bus>(state, req, op),
        "vehicles" => editable_op::<Vehicle>(state, req, op),
        "expenses" => editable_op::<BusExpense>(state, req, op),
        "feeStructures" => editable_op::<FeeStructure>(state, req, op),
        "staff" => editable_op::<Staff>(state, req, op),
        "feeAccounts" => list_op::<FeeAccount>(state, req, op),
        "defaulters" => list_op::<Defaulter>(state, req, op),
        "notifications" => list_op::<Notification>(state, req, op),
        _ => None,
    }?;
    Some(respond(&req.id, result))
}

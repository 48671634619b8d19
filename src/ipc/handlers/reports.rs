use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::lists::ensure_loaded;
use crate::ipc::helpers::{get_required_str, to_json};
use crate::ipc::types::{AppState, Request};
use crate::model::{Defaulter, Student};
use crate::reports::{self, ReportKind};
use serde_json::json;

fn report(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let raw = get_required_str(&req.params, "kind")?;
    let kind = ReportKind::parse(&raw).ok_or_else(|| {
        HandlerErr::bad_params(format!("unknown report kind: {}", raw))
            .with_details(json!({ "kinds": ReportKind::ALL }))
    })?;
    let rows = state
        .source
        .fetch_report(kind)
        .map_err(HandlerErr::source)?;
    to_json(reports::build_report(kind, rows))
}

fn dashboard(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    ensure_loaded::<Student>(state)?;
    ensure_loaded::<Defaulter>(state)?;
    let dash = reports::dashboard(
        state.screens.students.records(),
        &state.payments,
        state.screens.defaulters.records().len(),
        state.today(),
    );
    to_json(dash)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "reports.get" => report(state, req),
        "dashboard.get" => dashboard(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}

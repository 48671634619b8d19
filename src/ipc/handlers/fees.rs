use crate::config::parse_date;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::parse_params;
use crate::ipc::types::{AppState, Request};
use crate::status;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusQuery {
    amount: f64,
    #[serde(default)]
    paid: f64,
    due_date: String,
    today: Option<String>,
}

/// Evaluate the fee status rule for one session.
fn fee_status(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let q: StatusQuery = parse_params(&req.params)?;
    let due = parse_date(&q.due_date).map_err(|e| HandlerErr::bad_params(e.to_string()))?;
    let today = match q.today.as_deref() {
        Some(raw) => parse_date(raw).map_err(|e| HandlerErr::bad_params(e.to_string()))?,
        None => state.today(),
    };
    if q.amount < 0.0 || q.paid < 0.0 {
        return Err(HandlerErr::bad_params("amount and paid must be non-negative"));
    }

    let st = status::fee_status(q.amount, q.paid, due, today);
    let overdue = st.is_overdue();
    let months = if overdue { status::overdue_months(due, today) } else { 0 };
    let due_for = overdue.then(|| status::due_for_label(months));
    Ok(json!({
        "status": st,
        "label": st.label(),
        "balance": (q.amount - q.paid).max(0.0),
        "overdue": overdue,
        "overdueMonths": months,
        "dueFor": due_for,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "fees.status" => fee_status(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}

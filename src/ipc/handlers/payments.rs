//! Fee collection. A recorded payment is pushed to the data source first and
//! then applied to every loaded screen it affects.

use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::lists::ensure_loaded;
use crate::ipc::handlers::school::school_details;
use crate::ipc::helpers::{get_required_str, parse_params, to_json};
use crate::ipc::types::{AppState, Request};
use crate::messages;
use crate::model::{FeeAccount, FeeTransaction, Payment, PaymentMode, Receipt, Student};
use crate::record::format_number;
use crate::source::PaymentRequest;
use crate::status;
use crate::validate::{NumInput, Validator};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentForm {
    student_id: Option<String>,
    amount: Option<NumInput>,
    mode: Option<String>,
    reference: Option<String>,
    date: Option<String>,
}

struct ValidPayment {
    student: Student,
    amount: f64,
    mode: PaymentMode,
    reference: Option<String>,
    date: NaiveDate,
}

fn validate(state: &AppState, form: PaymentForm) -> Result<ValidPayment, HandlerErr> {
    let mut v = Validator::new();
    let student_id = v.require("studentId", form.student_id.as_deref());
    let amount = v.positive_amount("amount", form.amount.as_ref());
    let mode = v
        .one_of("mode", form.mode.as_deref(), &PaymentMode::ALL)
        .and_then(PaymentMode::parse);
    let reference = v.optional(form.reference.as_deref());
    if matches!(mode, Some(m) if m != PaymentMode::Cash) && reference.is_none() {
        v.push("reference", "reference is required unless paying in cash");
    }
    let date = match form.date.as_deref() {
        Some(raw) => v.date("date", Some(raw)),
        None => Some(state.today()),
    };

    let student = match student_id.as_deref() {
        Some(id) => {
            let found = state.screens.students.find(id).cloned();
            if found.is_none() {
                v.push("studentId", format!("unknown student {}", id));
            }
            found
        }
        None => None,
    };
    if let (Some(s), Some(a)) = (&student, amount) {
        if a > s.pending_fees {
            v.push(
                "amount",
                format!(
                    "amount exceeds the outstanding balance of {}",
                    format_number(s.pending_fees)
                ),
            );
        }
    }
    v.finish().into_result().map_err(HandlerErr::validation)?;

    match (student, amount, mode, date) {
        (Some(student), Some(amount), Some(mode), Some(date)) => Ok(ValidPayment {
            student,
            amount,
            mode,
            reference,
            date,
        }),
        _ => Err(HandlerErr::bad_params("incomplete payment form")),
    }
}

/// Settle the student's fee account and re-derive defaulters from it.
fn apply_to_accounts(state: &mut AppState, student_id: &str, amount: f64, txn: &FeeTransaction) {
    let today = state.today();
    let account = state
        .screens
        .fee_accounts
        .records()
        .iter()
        .find(|a| a.student_id == student_id)
        .cloned();
    if let Some(mut account) = account {
        let applied = account.apply_payment(amount, txn, today);
        if applied < amount {
            tracing::warn!(
                student = student_id,
                applied,
                amount,
                "payment exceeds the fee account balance"
            );
        }
        let id = account.id.clone();
        state.screens.fee_accounts.replace(&id, account);
    }

    if state.screens.defaulters.is_ready() {
        let defaulters = status::defaulters(
            state.screens.fee_accounts.records(),
            today,
            state.config.defaulter_threshold_days,
        );
        state.screens.defaulters.set_records(defaulters);
    }
}

fn record(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let form: PaymentForm = parse_params(&req.params)?;
    ensure_loaded::<Student>(state)?;
    if state.screens.defaulters.is_ready() {
        // Defaulters are derived from accounts, which must be current too.
        ensure_loaded::<FeeAccount>(state)?;
    }
    let payment = validate(state, form)?;
    let school_name = school_details(state)?.name.clone();

    let ack = state
        .source
        .make_payment(&PaymentRequest {
            student_id: payment.student.id.clone(),
            amount: payment.amount,
            mode: payment.mode,
            reference: payment.reference.clone(),
            date: payment.date,
        })
        .map_err(HandlerErr::source)?;

    let receipt_number = format!("RCPT-{}", state.receipts.len() + 1);
    let mut student = payment.student;
    student.pending_fees = (student.pending_fees - payment.amount).max(0.0);
    student.last_payment = Some(payment.date.format("%d %b %Y").to_string());
    let student_id = student.id.clone();
    state.screens.students.replace(&student_id, student.clone());

    if state.screens.fee_accounts.is_ready() {
        let txn = FeeTransaction {
            id: ack.payment_id.clone(),
            date: payment.date,
            amount: payment.amount,
            mode: payment.mode.as_str().to_string(),
            receipt: receipt_number.clone(),
        };
        apply_to_accounts(state, &student_id, payment.amount, &txn);
    }

    let recorded = Payment {
        id: ack.payment_id,
        student_id: student_id.clone(),
        amount: payment.amount,
        date: payment.date,
        mode: payment.mode,
        reference: payment.reference.clone(),
        receipt_number: receipt_number.clone(),
    };
    let receipt = Receipt {
        receipt_number: receipt_number.clone(),
        date: payment.date,
        school_name,
        student_name: student.name.clone(),
        class: student.class_section(),
        roll_number: student.roll_number.clone(),
        amount: payment.amount,
        mode: payment.mode,
        reference: payment.reference,
    };
    tracing::info!(
        receipt = %receipt_number,
        student = %student.name,
        amount = payment.amount,
        "payment recorded"
    );

    let result = json!({
        "payment": to_json(&recorded)?,
        "receipt": to_json(&receipt)?,
        "receiptText": messages::receipt_text(&receipt),
        "student": to_json(&student)?,
    });
    if state.screens.notifications.is_ready() {
        let at = payment.date.and_time(chrono::Local::now().time());
        state
            .screens
            .notifications
            .push(messages::payment_notice(&receipt, at));
    }
    state.payments.push(recorded);
    state.receipts.push(receipt);
    Ok(result)
}

fn receipt(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let number = get_required_str(&req.params, "receiptNumber")?;
    let receipt = state
        .receipts
        .iter()
        .find(|r| r.receipt_number == number)
        .ok_or_else(|| HandlerErr::not_found("receipt", &number))?;
    Ok(json!({
        "receipt": to_json(receipt)?,
        "text": messages::receipt_text(receipt),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "payments.record" => record(state, req),
        "payments.receipt" => receipt(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}

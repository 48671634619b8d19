//! Fee reminder composition and receipt text. Delivery belongs to the shell.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::model::{Defaulter, Notification, NotificationKind, Receipt};
use crate::record::format_number;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: &'static str,
    pub title: &'static str,
    pub content: &'static str,
}

pub const TEMPLATES: [Template; 3] = [
    Template {
        id: "1",
        title: "Fee Reminder",
        content: "Dear [PARENT_NAME],\n\nThis is a reminder that your child [STUDENT_NAME]'s school fee of Rs. [AMOUNT] is pending for [DUE_PERIOD]. Kindly pay at your earliest convenience.\n\nRegards,\n[SCHOOL_NAME]",
    },
    Template {
        id: "2",
        title: "Urgent Payment Notice",
        content: "Dear [PARENT_NAME],\n\nYour child [STUDENT_NAME]'s school fee of Rs. [AMOUNT] has been pending for [DUE_PERIOD]. Please clear the dues immediately to avoid any administrative action.\n\nRegards,\n[SCHOOL_NAME]",
    },
    Template {
        id: "3",
        title: "Final Payment Notice",
        content: "Dear [PARENT_NAME],\n\nThis is the final notice regarding your child [STUDENT_NAME]'s pending school fee of Rs. [AMOUNT] which has been overdue for [DUE_PERIOD]. Please clear the dues within 7 days.\n\nRegards,\n[SCHOOL_NAME]",
    },
];

pub fn template(id: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.id == id)
}

/// Either a stored template or free text typed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageBody<'a> {
    Template(&'a Template),
    Custom(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub defaulter_id: String,
    pub to: String,
    pub parent_name: String,
    pub body: String,
}

pub fn render(body: MessageBody<'_>, defaulter: &Defaulter, school_name: &str) -> String {
    match body {
        MessageBody::Custom(text) => text.to_string(),
        MessageBody::Template(t) => t
            .content
            .replace("[PARENT_NAME]", &defaulter.parent_name)
            .replace("[STUDENT_NAME]", &defaulter.name)
            .replace("[AMOUNT]", &format_number(defaulter.pending_amount))
            .replace("[DUE_PERIOD]", &defaulter.due_for)
            .replace("[SCHOOL_NAME]", school_name),
    }
}

/// Tokens [`render`] fills in.
pub const PLACEHOLDERS: [&str; 5] = [
    "[PARENT_NAME]",
    "[STUDENT_NAME]",
    "[AMOUNT]",
    "[DUE_PERIOD]",
    "[SCHOOL_NAME]",
];

/// Bracketed upper-case tokens in `text` that rendering would leave as-is,
/// each listed once in order of appearance.
pub fn unknown_placeholders(text: &str) -> Vec<String> {
    let mut unknown: Vec<String> = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('[') {
        let tail = &rest[start + 1..];
        let Some(end) = tail.find(|c: char| c == ']' || c == '[') else {
            break;
        };
        if !tail[end..].starts_with(']') {
            rest = &tail[end..];
            continue;
        }
        let inner = &tail[..end];
        let token = format!("[{}]", inner);
        let looks_like_placeholder =
            !inner.is_empty() && inner.chars().all(|c| c.is_ascii_uppercase() || c == '_');
        if looks_like_placeholder
            && !PLACEHOLDERS.contains(&token.as_str())
            && !unknown.contains(&token)
        {
            unknown.push(token);
        }
        rest = &tail[end + 1..];
    }
    unknown
}

pub fn compose(body: MessageBody<'_>, defaulter: &Defaulter, school_name: &str) -> OutboundMessage {
    OutboundMessage {
        defaulter_id: defaulter.id.clone(),
        to: defaulter.contact_number.clone(),
        parent_name: defaulter.parent_name.clone(),
        body: render(body, defaulter, school_name),
    }
}

pub fn compose_bulk<'a, I>(body: MessageBody<'_>, defaulters: I, school_name: &str) -> Vec<OutboundMessage>
where
    I: IntoIterator<Item = &'a Defaulter>,
{
    defaulters
        .into_iter()
        .map(|d| compose(body, d, school_name))
        .collect()
}

pub fn receipt_text(receipt: &Receipt) -> String {
    let mut out = String::new();
    out.push_str(&receipt.school_name);
    out.push_str("\nPayment Receipt\n--------------\n");
    out.push_str(&format!("Receipt No: {}\n", receipt.receipt_number));
    out.push_str(&format!("Date: {}\n\n", receipt.date.format("%d/%m/%Y")));
    out.push_str("Student Details:\n");
    out.push_str(&format!("Name: {}\n", receipt.student_name));
    out.push_str(&format!("Class: {}\n", receipt.class));
    out.push_str(&format!("Roll No: {}\n\n", receipt.roll_number));
    out.push_str(&format!(
        "Amount Paid: Rs. {}\n",
        format_number(receipt.amount)
    ));
    out.push_str(&format!("Payment Mode: {}\n", receipt.mode.label()));
    if let Some(reference) = &receipt.reference {
        out.push_str(&format!("Reference: {}\n", reference));
    }
    out.push_str("\nThank you for your payment!\n");
    out
}

/// Inbox entry announcing a recorded payment; keyed by its receipt number.
pub fn payment_notice(receipt: &Receipt, at: NaiveDateTime) -> Notification {
    Notification {
        id: receipt.receipt_number.clone(),
        title: "Fee Payment Confirmation".to_string(),
        message: format!(
            "Payment of Rs. {} received for {} (Class {}). Receipt {}.",
            format_number(receipt.amount),
            receipt.student_name,
            receipt.class,
            receipt.receipt_number
        ),
        date: at,
        read: false,
        kind: NotificationKind::Fee,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaymentMode;
    use chrono::NaiveDate;

    fn defaulter() -> Defaulter {
        Defaulter {
            id: "2".into(),
            student_id: "2".into(),
            name: "Jagdish Sharma".into(),
            class: "10".into(),
            section: "B".into(),
            roll_number: "102".into(),
            parent_name: "Nandlal Sharma".into(),
            contact_number: "9876543211".into(),
            pending_amount: 25000.0,
            oldest_due_date: NaiveDate::from_ymd_opt(2023, 10, 15).expect("date"),
            overdue_months: 4,
            due_for: "4 months".into(),
            due_bucket: "3months".into(),
        }
    }

    #[test]
    fn template_placeholders_are_filled() {
        let t = template("2").expect("template");
        let body = render(MessageBody::Template(t), &defaulter(), "Sunrise School");
        assert!(body.starts_with("Dear Nandlal Sharma,"));
        assert!(body.contains("Jagdish Sharma's school fee of Rs. 25000 has been pending for 4 months"));
        assert!(body.ends_with("Sunrise School"));
        assert!(!body.contains('['));
    }

    #[test]
    fn custom_text_is_sent_verbatim() {
        let msg = compose(MessageBody::Custom("Please visit the office."), &defaulter(), "X");
        assert_eq!(msg.body, "Please visit the office.");
        assert_eq!(msg.to, "9876543211");
    }

    #[test]
    fn receipt_lists_reference_when_present() {
        let receipt = Receipt {
            receipt_number: "RCPT-1".into(),
            date: NaiveDate::from_ymd_opt(2024, 2, 20).expect("date"),
            school_name: "Sunrise School".into(),
            student_name: "Jai Patidar".into(),
            class: "10-A".into(),
            roll_number: "101".into(),
            amount: 15000.0,
            mode: PaymentMode::Upi,
            reference: Some("UPI-778".into()),
        };
        let text = receipt_text(&receipt);
        assert!(text.contains("Receipt No: RCPT-1"));
        assert!(text.contains("Date: 20/02/2024"));
        assert!(text.contains("Amount Paid: Rs. 15000"));
        assert!(text.contains("Payment Mode: UPI"));
        assert!(text.contains("Reference: UPI-778"));
    }

    #[test]
    fn unknown_placeholders_are_reported_once() {
        let text = "Hi [PARENT_NAME], [CLASS] is due [DUE_DATE]; [CLASS] again, [note] and [[AMOUNT]] [open";
        assert_eq!(unknown_placeholders(text), vec!["[CLASS]", "[DUE_DATE]"]);
        assert!(unknown_placeholders(TEMPLATES[2].content).is_empty());
    }

    #[test]
    fn payment_notice_names_student_and_receipt() {
        let receipt = Receipt {
            receipt_number: "RCPT-4".into(),
            date: NaiveDate::from_ymd_opt(2024, 2, 20).expect("date"),
            school_name: "Sunrise School".into(),
            student_name: "Kamal Singh".into(),
            class: "12-B".into(),
            roll_number: "105".into(),
            amount: 8000.0,
            mode: PaymentMode::Cash,
            reference: None,
        };
        let at = receipt.date.and_hms_opt(9, 30, 0).expect("time");
        let notice = payment_notice(&receipt, at);
        assert_eq!(notice.id, "RCPT-4");
        assert!(!notice.read);
        assert_eq!(
            notice.message,
            "Payment of Rs. 8000 received for Kamal Singh (Class 12-B). Receipt RCPT-4."
        );
    }
}

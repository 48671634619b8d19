use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::{Defaulter, FeeAccount};

/// Payment state of one fee session. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeeStatus {
    Paid,
    NotDue,
    Partial,
    PartialOverdue,
    Pending,
}

impl FeeStatus {
    pub fn label(self) -> &'static str {
        match self {
            FeeStatus::Paid => "Paid",
            FeeStatus::NotDue => "Not Due",
            FeeStatus::Partial => "Partial",
            FeeStatus::PartialOverdue => "Partial (Overdue)",
            FeeStatus::Pending => "Pending",
        }
    }

    /// Position in the severity order, `Paid` lowest.
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn is_overdue(self) -> bool {
        matches!(self, FeeStatus::PartialOverdue | FeeStatus::Pending)
    }
}

/// The single status rule shared by every screen.
///
/// A session is overdue only once `today` is strictly past `due`.
pub fn fee_status(amount: f64, paid: f64, due: NaiveDate, today: NaiveDate) -> FeeStatus {
    if amount <= 0.0 || paid >= amount {
        return FeeStatus::Paid;
    }
    let some_paid = paid > 0.0;
    match (today > due, some_paid) {
        (false, true) => FeeStatus::Partial,
        (false, false) => FeeStatus::NotDue,
        (true, true) => FeeStatus::PartialOverdue,
        (true, false) => FeeStatus::Pending,
    }
}

/// Most severe status wins; an account without sessions counts as paid.
pub fn account_status<I>(statuses: I) -> FeeStatus
where
    I: IntoIterator<Item = FeeStatus>,
{
    statuses.into_iter().max().unwrap_or(FeeStatus::Paid)
}

/// Whole calendar months past `due`, at least 1 once overdue and 0 before.
pub fn overdue_months(due: NaiveDate, today: NaiveDate) -> u32 {
    if today <= due {
        return 0;
    }
    let mut months = (today.year() - due.year()) * 12 + today.month() as i32 - due.month() as i32;
    if today.day() < due.day() {
        months -= 1;
    }
    months.max(1) as u32
}

pub fn due_for_label(months: u32) -> String {
    if months == 1 {
        "1 month".to_string()
    } else {
        format!("{} months", months)
    }
}

/// Buckets the recovery screen filters on; three months and beyond share one bucket.
pub fn due_bucket(months: u32) -> &'static str {
    match months {
        0 | 1 => "1month",
        2 => "2months",
        _ => "3months",
    }
}

/// Accounts with an overdue balance whose oldest overdue due date is at least
/// `threshold_days` old. Output order follows `accounts`.
pub fn defaulters(accounts: &[FeeAccount], today: NaiveDate, threshold_days: i64) -> Vec<Defaulter> {
    let mut out = Vec::new();
    for account in accounts {
        let overdue: Vec<_> = account
            .sessions
            .iter()
            .filter(|s| s.balance() > 0.0 && today > s.due_date)
            .collect();
        let Some(oldest) = overdue.iter().map(|s| s.due_date).min() else {
            continue;
        };
        if (today - oldest).num_days() < threshold_days {
            continue;
        }
        let pending_amount: f64 = overdue.iter().map(|s| s.balance()).sum();
        let months = overdue_months(oldest, today);
        out.push(Defaulter {
            id: account.id.clone(),
            student_id: account.student_id.clone(),
            name: account.student_name.clone(),
            class: account.class.clone(),
            section: account.section.clone(),
            roll_number: account.roll_number.clone(),
            parent_name: account.parent_name.clone(),
            contact_number: account.contact_number.clone(),
            pending_amount,
            oldest_due_date: oldest,
            overdue_months: months,
            due_for: due_for_label(months),
            due_bucket: due_bucket(months).to_string(),
        });
    }
    out
}

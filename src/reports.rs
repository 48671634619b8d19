use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{Payment, ReportRow, Student};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    Daily,
    Monthly,
    ClassWise,
    Pending,
    BusExpenses,
}

impl ReportKind {
    pub const ALL: [&'static str; 5] = ["daily", "monthly", "class-wise", "pending", "bus-expenses"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Self::Daily),
            "monthly" => Some(Self::Monthly),
            "class-wise" => Some(Self::ClassWise),
            "pending" => Some(Self::Pending),
            "bus-expenses" => Some(Self::BusExpenses),
            _ => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Daily => "Daily Collection",
            Self::Monthly => "Monthly Collection",
            Self::ClassWise => "Class-wise Collection",
            Self::Pending => "Pending Dues",
            Self::BusExpenses => "Bus Expenses",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub kind: ReportKind,
    pub title: &'static str,
    pub rows: Vec<ReportRow>,
    pub total_amount: f64,
    pub total_students: u32,
}

pub fn build_report(kind: ReportKind, rows: Vec<ReportRow>) -> Report {
    let total_amount = rows.iter().map(|r| r.amount).sum();
    let total_students = rows.iter().map(|r| r.students).sum();
    Report {
        kind,
        title: kind.title(),
        rows,
        total_amount,
        total_students,
    }
}

const RECENT_PAYMENTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total_collected_today: f64,
    pub total_pending: f64,
    pub total_students: usize,
    pub defaulter_count: usize,
    pub recent_payments: Vec<Payment>,
}

/// `payments` is in recording order; the newest come first in the output.
pub fn dashboard(
    students: &[Student],
    payments: &[Payment],
    defaulter_count: usize,
    today: NaiveDate,
) -> Dashboard {
    Dashboard {
        total_collected_today: payments
            .iter()
            .filter(|p| p.date == today)
            .map(|p| p.amount)
            .sum(),
        total_pending: students.iter().map(|s| s.pending_fees).sum(),
        total_students: students.len(),
        defaulter_count,
        recent_payments: payments.iter().rev().take(RECENT_PAYMENTS).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::DemoSource;
    use crate::model::PaymentMode;
    use crate::source::SchoolData;

    #[test]
    fn report_totals_sum_rows() {
        let src = DemoSource::new();
        let report = build_report(
            ReportKind::Daily,
            src.fetch_report(ReportKind::Daily).expect("rows"),
        );
        assert_eq!(report.total_amount, 75000.0);
        assert_eq!(report.total_students, 31);
        assert_eq!(ReportKind::parse("class-wise"), Some(ReportKind::ClassWise));
        assert_eq!(ReportKind::parse("weekly"), None);
    }

    #[test]
    fn dashboard_counts_only_todays_collection() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 20).expect("date");
        let payment = |n: u32, d: NaiveDate, amount: f64| Payment {
            id: n.to_string(),
            student_id: "1".into(),
            amount,
            date: d,
            mode: PaymentMode::Cash,
            reference: None,
            receipt_number: format!("RCPT-{}", n),
        };
        let yesterday = today.pred_opt().expect("date");
        let payments: Vec<Payment> = (1..=7)
            .map(|n| payment(n, if n % 2 == 0 { today } else { yesterday }, 1000.0))
            .collect();
        let students = DemoSource::new().fetch_students().expect("students");

        let dash = dashboard(&students, &payments, 4, today);
        assert_eq!(dash.total_collected_today, 3000.0);
        assert_eq!(dash.total_pending, 66000.0);
        assert_eq!(dash.total_students, 5);
        assert_eq!(dash.recent_payments.len(), 5);
        assert_eq!(dash.recent_payments[0].id, "7");
    }
}

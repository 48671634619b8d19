use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::record::{opt_text, FieldValue, Record};
use crate::status::{self, FeeStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub roll_number: String,
    pub class: String,
    pub section: String,
    pub parent_name: String,
    pub contact_number: String,
    pub admission_number: String,
    pub pending_fees: f64,
    pub last_payment: Option<String>,
    pub bus_id: Option<String>,
}

impl Student {
    pub fn class_section(&self) -> String {
        format!("{}-{}", self.class, self.section)
    }
}

impl Record for Student {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::str(&self.id)),
            "name" => Some(FieldValue::str(&self.name)),
            "rollNumber" => Some(FieldValue::str(&self.roll_number)),
            "class" => Some(FieldValue::str(&self.class)),
            "section" => Some(FieldValue::str(&self.section)),
            "classSection" => Some(FieldValue::Text(Cow::Owned(self.class_section()))),
            "parentName" => Some(FieldValue::str(&self.parent_name)),
            "contactNumber" => Some(FieldValue::str(&self.contact_number)),
            "admissionNumber" => Some(FieldValue::str(&self.admission_number)),
            "pendingFees" => Some(FieldValue::Number(self.pending_fees)),
            "lastPayment" => opt_text(&self.last_payment),
            "busId" => opt_text(&self.bus_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRoom {
    pub id: String,
    pub name: String,
    pub section: String,
    pub class_teacher: String,
    pub total_students: i64,
    pub room_number: String,
    pub schedule: String,
}

impl Record for ClassRoom {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::str(&self.id)),
            "name" => Some(FieldValue::str(&self.name)),
            "section" => Some(FieldValue::str(&self.section)),
            "classTeacher" => Some(FieldValue::str(&self.class_teacher)),
            "totalStudents" => Some(FieldValue::Number(self.total_students as f64)),
            "roomNumber" => Some(FieldValue::str(&self.room_number)),
            "schedule" => Some(FieldValue::str(&self.schedule)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bus {
    pub id: String,
    pub bus_number: String,
    pub route: String,
    pub driver_name: String,
    pub driver_contact: String,
    pub capacity: u32,
    pub assigned_students: u32,
    pub monthly_fee: f64,
}

impl Record for Bus {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::str(&self.id)),
            "busNumber" => Some(FieldValue::str(&self.bus_number)),
            "route" => Some(FieldValue::str(&self.route)),
            "driverName" => Some(FieldValue::str(&self.driver_name)),
            "driverContact" => Some(FieldValue::str(&self.driver_contact)),
            "capacity" => Some(FieldValue::Number(self.capacity as f64)),
            "assignedStudents" => Some(FieldValue::Number(self.assigned_students as f64)),
            "monthlyFee" => Some(FieldValue::Number(self.monthly_fee)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    pub reg_number: String,
    pub model: String,
    pub capacity: u32,
    pub driver: String,
}

impl Record for Vehicle {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::str(&self.id)),
            "regNumber" => Some(FieldValue::str(&self.reg_number)),
            "model" => Some(FieldValue::str(&self.model)),
            "capacity" => Some(FieldValue::Number(self.capacity as f64)),
            "driver" => Some(FieldValue::str(&self.driver)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusExpense {
    pub id: String,
    pub vehicle_id: String,
    pub date: NaiveDate,
    pub category: String,
    pub amount: f64,
    pub notes: Option<String>,
}

impl Record for BusExpense {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::str(&self.id)),
            "vehicleId" => Some(FieldValue::str(&self.vehicle_id)),
            "date" => Some(FieldValue::Text(Cow::Owned(self.date.to_string()))),
            "category" => Some(FieldValue::str(&self.category)),
            "amount" => Some(FieldValue::Number(self.amount)),
            "notes" => opt_text(&self.notes),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeStructure {
    pub id: String,
    pub name: String,
    pub class: String,
    pub tuition_fee: f64,
    pub bus_fee: f64,
    pub library_fee: f64,
    pub sports_fee: f64,
    pub exam_fee: f64,
    pub total_fee: f64,
}

impl FeeStructure {
    pub fn component_total(&self) -> f64 {
        self.tuition_fee + self.bus_fee + self.library_fee + self.sports_fee + self.exam_fee
    }
}

impl Record for FeeStructure {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::str(&self.id)),
            "name" => Some(FieldValue::str(&self.name)),
            "class" => Some(FieldValue::str(&self.class)),
            "tuitionFee" => Some(FieldValue::Number(self.tuition_fee)),
            "busFee" => Some(FieldValue::Number(self.bus_fee)),
            "libraryFee" => Some(FieldValue::Number(self.library_fee)),
            "sportsFee" => Some(FieldValue::Number(self.sports_fee)),
            "examFee" => Some(FieldValue::Number(self.exam_fee)),
            "totalFee" => Some(FieldValue::Number(self.total_fee)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeTransaction {
    pub id: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub mode: String,
    pub receipt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSession {
    pub session_id: String,
    pub name: String,
    pub amount: f64,
    pub paid: f64,
    pub balance: f64,
    pub due_date: NaiveDate,
    pub status: FeeStatus,
    #[serde(default)]
    pub transactions: Vec<FeeTransaction>,
}

impl FeeSession {
    pub fn new(session_id: &str, name: &str, amount: f64, paid: f64, due_date: NaiveDate) -> Self {
        Self {
            session_id: session_id.to_string(),
            name: name.to_string(),
            amount,
            paid,
            balance: (amount - paid).max(0.0),
            due_date,
            status: status::fee_status(amount, paid, due_date, due_date),
            transactions: Vec::new(),
        }
    }

    pub fn balance(&self) -> f64 {
        (self.amount - self.paid).max(0.0)
    }

    pub fn refresh(&mut self, today: NaiveDate) {
        self.balance = self.balance();
        self.status = status::fee_status(self.amount, self.paid, self.due_date, today);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeAccount {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub roll_number: String,
    pub class: String,
    pub section: String,
    pub parent_name: String,
    pub contact_number: String,
    pub fee_structure_id: String,
    pub academic_year: String,
    pub status: FeeStatus,
    pub sessions: Vec<FeeSession>,
}

impl FeeAccount {
    pub fn outstanding(&self) -> f64 {
        self.sessions.iter().map(|s| s.balance()).sum()
    }

    pub fn refresh_status(&mut self, today: NaiveDate) {
        for s in &mut self.sessions {
            s.refresh(today);
        }
        self.status = status::account_status(self.sessions.iter().map(|s| s.status));
    }

    /// Settles open sessions oldest due date first. Returns the amount applied.
    pub fn apply_payment(&mut self, amount: f64, txn: &FeeTransaction, today: NaiveDate) -> f64 {
        let mut order: Vec<usize> = (0..self.sessions.len()).collect();
        order.sort_by_key(|&i| self.sessions[i].due_date);

        let mut remaining = amount;
        for i in order {
            if remaining <= 0.0 {
                break;
            }
            let session = &mut self.sessions[i];
            let open = session.balance();
            if open <= 0.0 {
                continue;
            }
            let applied = open.min(remaining);
            session.paid += applied;
            session.transactions.push(FeeTransaction {
                amount: applied,
                ..txn.clone()
            });
            remaining -= applied;
        }
        self.refresh_status(today);
        amount - remaining
    }
}

impl Record for FeeAccount {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::str(&self.id)),
            "studentId" => Some(FieldValue::str(&self.student_id)),
            "studentName" => Some(FieldValue::str(&self.student_name)),
            "rollNumber" => Some(FieldValue::str(&self.roll_number)),
            "class" => Some(FieldValue::str(&self.class)),
            "section" => Some(FieldValue::str(&self.section)),
            "classSection" => Some(FieldValue::Text(Cow::Owned(format!(
                "{}-{}",
                self.class, self.section
            )))),
            "academicYear" => Some(FieldValue::str(&self.academic_year)),
            "status" => Some(FieldValue::str(self.status.label())),
            "outstanding" => Some(FieldValue::Number(self.outstanding())),
            _ => None,
        }
    }

    /// Status sorts by severity, not by its label.
    fn sort_key(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "status" => Some(FieldValue::Number(f64::from(self.status.rank()))),
            _ => self.field(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Defaulter {
    pub id: String,
    pub student_id: String,
    pub name: String,
    pub class: String,
    pub section: String,
    pub roll_number: String,
    pub parent_name: String,
    pub contact_number: String,
    pub pending_amount: f64,
    pub oldest_due_date: NaiveDate,
    pub overdue_months: u32,
    pub due_for: String,
    pub due_bucket: String,
}

impl Record for Defaulter {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::str(&self.id)),
            "name" => Some(FieldValue::str(&self.name)),
            "class" => Some(FieldValue::str(&self.class)),
            "section" => Some(FieldValue::str(&self.section)),
            "rollNumber" => Some(FieldValue::str(&self.roll_number)),
            "parentName" => Some(FieldValue::str(&self.parent_name)),
            "contactNumber" => Some(FieldValue::str(&self.contact_number)),
            "pendingAmount" => Some(FieldValue::Number(self.pending_amount)),
            "overdueMonths" => Some(FieldValue::Number(self.overdue_months as f64)),
            "dueFor" => Some(FieldValue::str(&self.due_for)),
            "dueBucket" => Some(FieldValue::str(&self.due_bucket)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: String,
    pub name: String,
    pub role: String,
    pub email: String,
    pub active: bool,
}

impl Record for Staff {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::str(&self.id)),
            "name" => Some(FieldValue::str(&self.name)),
            "role" => Some(FieldValue::str(&self.role)),
            "email" => Some(FieldValue::str(&self.email)),
            "active" => Some(FieldValue::Bool(self.active)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Online,
    Upi,
    Cheque,
}

impl PaymentMode {
    pub const ALL: [&'static str; 4] = ["cash", "online", "upi", "cheque"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(Self::Cash),
            "online" => Some(Self::Online),
            "upi" => Some(Self::Upi),
            "cheque" => Some(Self::Cheque),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Online => "online",
            Self::Upi => "upi",
            Self::Cheque => "cheque",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::Online => "Online Banking",
            Self::Upi => "UPI",
            Self::Cheque => "Cheque",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub student_id: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub mode: PaymentMode,
    pub reference: Option<String>,
    pub receipt_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub receipt_number: String,
    pub date: NaiveDate,
    pub school_name: String,
    pub student_name: String,
    pub class: String,
    pub roll_number: String,
    pub amount: f64,
    pub mode: PaymentMode,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub id: String,
    pub label: String,
    pub amount: f64,
    pub students: u32,
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolDetails {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub principal: String,
    pub slogan: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub username: String,
    pub name: String,
    pub role: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub joined_date: NaiveDate,
    pub avatar: Option<String>,
    pub school: String,
    pub department: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Fee,
    Event,
    Holiday,
    Transport,
    System,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fee => "fee",
            Self::Event => "event",
            Self::Holiday => "holiday",
            Self::Transport => "transport",
            Self::System => "system",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub date: NaiveDateTime,
    pub read: bool,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

impl Record for Notification {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::str(&self.id)),
            "title" => Some(FieldValue::str(&self.title)),
            "message" => Some(FieldValue::str(&self.message)),
            "type" => Some(FieldValue::str(self.kind.as_str())),
            "read" => Some(FieldValue::Bool(self.read)),
            // ISO form, so text order is time order.
            "date" => Some(FieldValue::Text(Cow::Owned(
                self.date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            ))),
            _ => None,
        }
    }
}

/// WhatsApp sender configuration as edited on the admin settings screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppSettings {
    pub enabled: bool,
    pub api_key: String,
    pub template_enabled: bool,
    pub default_template: String,
}

impl WhatsAppSettings {
    /// Copy that is safe to hand to the shell: the key keeps four characters at each end.
    pub fn redacted(&self) -> Self {
        Self {
            api_key: mask_key(&self.api_key),
            ..self.clone()
        }
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}

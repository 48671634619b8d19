//! Data-access capability the daemon is built against.
//!
//! The trait speaks only in domain types and explicit error variants so that a
//! real backend client can be swapped in for [`crate::demo::DemoSource`]
//! without touching screen logic.

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::{
    Bus, BusExpense, ClassRoom, FeeAccount, FeeStructure, Notification, PaymentMode, Profile,
    ReportRow, SchoolDetails, Session, Staff, Student, Vehicle, WhatsAppSettings,
};
use crate::reports::ReportKind;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    /// The backend could not be reached or timed out.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// The backend answered but refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("invalid username or password")]
    Unauthorized,

    /// The response did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl SourceError {
    pub fn code(&self) -> &'static str {
        match self {
            SourceError::Unavailable(_) => "source_unavailable",
            SourceError::Rejected(_) => "source_rejected",
            SourceError::Unauthorized => "unauthorized",
            SourceError::Malformed(_) => "source_malformed",
        }
    }
}

pub type SourceResult<T> = Result<T, SourceError>;

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub student_id: String,
    pub amount: f64,
    pub mode: PaymentMode,
    pub reference: Option<String>,
    pub date: NaiveDate,
}

/// What the backend acknowledges for a recorded payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentAck {
    pub payment_id: String,
}

pub trait SchoolData {
    fn login(&self, username: &str, password: &str) -> SourceResult<Session>;

    fn fetch_students(&self) -> SourceResult<Vec<Student>>;
    fn fetch_classes(&self) -> SourceResult<Vec<ClassRoom>>;
    fn fetch_buses(&self) -> SourceResult<Vec<Bus>>;
    fn fetch_vehicles(&self) -> SourceResult<Vec<Vehicle>>;
    fn fetch_expenses(&self) -> SourceResult<Vec<BusExpense>>;
    fn fetch_fee_structures(&self) -> SourceResult<Vec<FeeStructure>>;
    fn fetch_fee_accounts(&self) -> SourceResult<Vec<FeeAccount>>;
    fn fetch_staff(&self) -> SourceResult<Vec<Staff>>;
    fn fetch_school(&self) -> SourceResult<SchoolDetails>;
    fn fetch_report(&self, kind: ReportKind) -> SourceResult<Vec<ReportRow>>;
    fn fetch_notifications(&self) -> SourceResult<Vec<Notification>>;
    fn fetch_whatsapp_settings(&self) -> SourceResult<WhatsAppSettings>;
    fn fetch_profile(&self, username: &str) -> SourceResult<Profile>;

    fn make_payment(&self, payment: &PaymentRequest) -> SourceResult<PaymentAck>;
}

//! In-memory [`SchoolData`] seeded with sample records.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use uuid::Uuid;

use crate::model::{
    Bus, BusExpense, ClassRoom, FeeAccount, FeeSession, FeeStructure, Notification,
    NotificationKind, Profile, ReportRow, SchoolDetails, Session, Staff, Student, Vehicle,
    WhatsAppSettings,
};
use crate::reports::ReportKind;
use crate::source::{PaymentAck, PaymentRequest, SchoolData, SourceError, SourceResult};
use crate::status::FeeStatus;

const DEMO_USER: &str = "admin";
const DEMO_PASSWORD: &str = "password";

/// Canned failure the demo source can be started with, to exercise error states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    Offline,
    Rejected,
    Malformed,
}

impl FailureMode {
    pub fn error(self) -> SourceError {
        match self {
            FailureMode::Offline => SourceError::Unavailable("demo backend is offline".to_string()),
            FailureMode::Rejected => SourceError::Rejected("demo backend refused the request".to_string()),
            FailureMode::Malformed => SourceError::Malformed("demo backend sent garbage".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DemoSource {
    /// When set, every call fails with this error.
    fail_with: Option<SourceError>,
}

impl DemoSource {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn failing(err: SourceError) -> Self {
        Self {
            fail_with: Some(err),
        }
    }

    pub fn with_failure(mode: Option<FailureMode>) -> Self {
        Self {
            fail_with: mode.map(FailureMode::error),
        }
    }

    fn check(&self) -> SourceResult<()> {
        match &self.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, 0).unwrap_or_default()
}

fn notification(
    id: &str,
    title: &str,
    message: &str,
    date: NaiveDateTime,
    read: bool,
    kind: NotificationKind,
) -> Notification {
    Notification {
        id: id.to_string(),
        title: title.to_string(),
        message: message.to_string(),
        date,
        read,
        kind,
    }
}

#[allow(clippy::too_many_arguments)]
fn student(
    id: &str,
    name: &str,
    roll: &str,
    class: &str,
    section: &str,
    parent: &str,
    contact: &str,
    pending: f64,
    last_payment: &str,
) -> Student {
    Student {
        id: id.to_string(),
        name: name.to_string(),
        roll_number: roll.to_string(),
        class: class.to_string(),
        section: section.to_string(),
        parent_name: parent.to_string(),
        contact_number: contact.to_string(),
        admission_number: format!("ADM{:03}", id.parse::<u32>().unwrap_or(0)),
        pending_fees: pending,
        last_payment: Some(last_payment.to_string()),
        bus_id: None,
    }
}

fn seed_students() -> Vec<Student> {
    vec![
        student("1", "Jai Patidar", "101", "10", "A", "Rohit Patidar", "9876543210", 15000.0, "15 Mar 2023"),
        student("2", "Jagdish Sharma", "102", "10", "B", "Nandlal Sharma", "9876543211", 25000.0, "10 Jan 2023"),
        student("3", "Anil Kumar", "103", "9", "A", "Pushpendra Kumar", "9876543212", 0.0, "5 Apr 2023"),
        student("4", "Surbhi Patidar", "104", "11", "A", "NandKishore Patidar", "9876543213", 18000.0, "22 Feb 2023"),
        student("5", "Kamal Singh", "105", "12", "B", "Ram singh", "9876543214", 8000.0, "18 Mar 2023"),
    ]
}

/// Term sessions for one account: `paid` per term, terms due Jun, Oct and Jan.
fn sessions(term_amount: f64, paid: [f64; 3]) -> Vec<FeeSession> {
    vec![
        FeeSession::new("1", "First Term", term_amount, paid[0], date(2023, 6, 15)),
        FeeSession::new("2", "Second Term", term_amount, paid[1], date(2023, 10, 15)),
        FeeSession::new("3", "Third Term", term_amount, paid[2], date(2024, 1, 15)),
    ]
}

fn seed_fee_accounts() -> Vec<FeeAccount> {
    let plans: [(&str, &str, f64, [f64; 3]); 5] = [
        ("1", "1", 15000.0, [15000.0, 15000.0, 0.0]),
        ("2", "1", 15000.0, [15000.0, 5000.0, 0.0]),
        ("3", "1", 15000.0, [15000.0, 15000.0, 15000.0]),
        ("4", "2", 16000.0, [16000.0, 14000.0, 0.0]),
        ("5", "2", 16000.0, [16000.0, 16000.0, 8000.0]),
    ];
    seed_students()
        .into_iter()
        .zip(plans)
        .map(|(s, (id, structure, term, paid))| FeeAccount {
            id: id.to_string(),
            student_id: s.id,
            student_name: s.name,
            roll_number: s.roll_number,
            class: s.class,
            section: s.section,
            parent_name: s.parent_name,
            contact_number: s.contact_number,
            fee_structure_id: structure.to_string(),
            academic_year: "2023-2024".to_string(),
            status: FeeStatus::Paid,
            sessions: sessions(term, paid),
        })
        .collect()
}

fn class_room(id: &str, name: &str, section: &str, teacher: &str, total: i64, room: &str) -> ClassRoom {
    ClassRoom {
        id: id.to_string(),
        name: name.to_string(),
        section: section.to_string(),
        class_teacher: teacher.to_string(),
        total_students: total,
        room_number: room.to_string(),
        schedule: "Mon-Fri, 8:00 AM - 2:00 PM".to_string(),
    }
}

fn bus(id: &str, number: &str, route: &str, driver: &str, contact: &str, capacity: u32, assigned: u32, fee: f64) -> Bus {
    Bus {
        id: id.to_string(),
        bus_number: number.to_string(),
        route: route.to_string(),
        driver_name: driver.to_string(),
        driver_contact: contact.to_string(),
        capacity,
        assigned_students: assigned,
        monthly_fee: fee,
    }
}

fn fee_structure(id: &str, name: &str, class: &str, c: [f64; 5]) -> FeeStructure {
    FeeStructure {
        id: id.to_string(),
        name: name.to_string(),
        class: class.to_string(),
        tuition_fee: c[0],
        bus_fee: c[1],
        library_fee: c[2],
        sports_fee: c[3],
        exam_fee: c[4],
        total_fee: c.iter().sum(),
    }
}

fn report_row(id: &str, label: &str, amount: f64, students: u32, mode: &str) -> ReportRow {
    ReportRow {
        id: id.to_string(),
        label: label.to_string(),
        amount,
        students,
        mode: mode.to_string(),
    }
}

impl SchoolData for DemoSource {
    fn login(&self, username: &str, password: &str) -> SourceResult<Session> {
        self.check()?;
        if username != DEMO_USER || password != DEMO_PASSWORD {
            return Err(SourceError::Unauthorized);
        }
        Ok(Session {
            username: DEMO_USER.to_string(),
            name: "Admin User".to_string(),
            role: "admin".to_string(),
            token: format!("demo-{}", Uuid::new_v4()),
        })
    }

    fn fetch_students(&self) -> SourceResult<Vec<Student>> {
        self.check()?;
        Ok(seed_students())
    }

    fn fetch_classes(&self) -> SourceResult<Vec<ClassRoom>> {
        self.check()?;
        Ok(vec![
            class_room("1", "Class 1", "A", "Mr. Rajesh Sharma", 35, "101"),
            class_room("2", "Class 2", "B", "Mrs. Priya Verma", 28, "102"),
            class_room("3", "Class 3", "A", "Mr. Anand Patel", 32, "103"),
            class_room("4", "Class 4", "C", "Mrs. Sunita Gupta", 30, "104"),
            class_room("5", "Class 5", "B", "Mr. Vikram Singh", 33, "105"),
        ])
    }

    fn fetch_buses(&self) -> SourceResult<Vec<Bus>> {
        self.check()?;
        Ok(vec![
            bus("1", "BUS001", "North Route", "Ramesh Yadav", "9876543210", 40, 32, 2000.0),
            bus("2", "BUS002", "South Route", "Pushpendra Kumar", "9876543211", 35, 28, 1800.0),
            bus("3", "BUS003", "East Route", "Sunil Verma", "9876543212", 40, 37, 2200.0),
        ])
    }

    fn fetch_vehicles(&self) -> SourceResult<Vec<Vehicle>> {
        self.check()?;
        Ok(vec![
            Vehicle {
                id: "1".to_string(),
                reg_number: "KA 01 AB 1234".to_string(),
                model: "Ashok Leyland".to_string(),
                capacity: 45,
                driver: "Rajesh Kumar".to_string(),
            },
            Vehicle {
                id: "2".to_string(),
                reg_number: "KA 01 CD 5678".to_string(),
                model: "Tata".to_string(),
                capacity: 35,
                driver: "Suresh Patel".to_string(),
            },
        ])
    }

    fn fetch_expenses(&self) -> SourceResult<Vec<BusExpense>> {
        self.check()?;
        let expense = |id: &str, vehicle: &str, d: NaiveDate, category: &str, amount: f64, notes: &str| BusExpense {
            id: id.to_string(),
            vehicle_id: vehicle.to_string(),
            date: d,
            category: category.to_string(),
            amount,
            notes: Some(notes.to_string()),
        };
        Ok(vec![
            expense("1", "1", date(2023, 4, 15), "Fuel", 5000.0, "Monthly fuel"),
            expense("2", "2", date(2023, 4, 10), "Maintenance", 2500.0, "Oil change"),
            expense("3", "1", date(2023, 4, 5), "Repair", 8000.0, "Brake repair"),
        ])
    }

    fn fetch_fee_structures(&self) -> SourceResult<Vec<FeeStructure>> {
        self.check()?;
        Ok(vec![
            fee_structure("1", "Standard Fee Structure", "All Classes", [25000.0, 5000.0, 2000.0, 3000.0, 1500.0]),
            fee_structure("2", "Class 11-12 Fee Structure", "Class 11-12", [35000.0, 5000.0, 3000.0, 3000.0, 2000.0]),
            fee_structure("3", "Primary Classes Fee", "Class 1-5", [20000.0, 5000.0, 1000.0, 2000.0, 1000.0]),
        ])
    }

    fn fetch_fee_accounts(&self) -> SourceResult<Vec<FeeAccount>> {
        self.check()?;
        Ok(seed_fee_accounts())
    }

    fn fetch_staff(&self) -> SourceResult<Vec<Staff>> {
        self.check()?;
        let staff = |id: &str, name: &str, role: &str, email: &str, active: bool| Staff {
            id: id.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            email: email.to_string(),
            active,
        };
        Ok(vec![
            staff("1", "Ramkaran Patidar", "Admin", "Ramkaran@example.com", true),
            staff("2", "Jagdish Sharma", "Accountant", "Jagdish@example.com", true),
            staff("3", "Rakesh Singh", "Staff", "Rakesh@example.com", false),
        ])
    }

    fn fetch_school(&self) -> SourceResult<SchoolDetails> {
        self.check()?;
        Ok(SchoolDetails {
            name: "St Marry Champion Public School".to_string(),
            address: "123 Education Lane, Knowledge City".to_string(),
            phone: "+91 9876543210".to_string(),
            email: "contact@citypublicschool.edu".to_string(),
            principal: "Dr. Jagdish Sharma".to_string(),
            slogan: "Empowering minds, Shaping futures".to_string(),
        })
    }

    fn fetch_report(&self, kind: ReportKind) -> SourceResult<Vec<ReportRow>> {
        self.check()?;
        let rows = match kind {
            ReportKind::Daily => vec![
                report_row("1", "15 Apr 2023", 25000.0, 10, "Cash"),
                report_row("2", "16 Apr 2023", 35000.0, 15, "Online"),
                report_row("3", "17 Apr 2023", 15000.0, 6, "Cash"),
            ],
            ReportKind::Monthly => vec![
                report_row("1", "April 2023", 120000.0, 48, "Mixed"),
                report_row("2", "March 2023", 105000.0, 42, "Mixed"),
                report_row("3", "February 2023", 98000.0, 39, "Mixed"),
            ],
            ReportKind::ClassWise => vec![
                report_row("1", "Class 10", 75000.0, 30, "Mixed"),
                report_row("2", "Class 11", 82000.0, 25, "Mixed"),
                report_row("3", "Class 12", 90000.0, 22, "Mixed"),
            ],
            ReportKind::Pending => vec![
                report_row("1", "Class 10", 45000.0, 18, "Pending"),
                report_row("2", "Class 11", 38000.0, 15, "Pending"),
                report_row("3", "Class 12", 52000.0, 20, "Pending"),
            ],
            ReportKind::BusExpenses => vec![
                report_row("1", "Bus 1", 12000.0, 35, "Expenses"),
                report_row("2", "Bus 2", 10000.0, 28, "Expenses"),
                report_row("3", "Bus 3", 8000.0, 0, "Expenses"),
            ],
        };
        Ok(rows)
    }

    fn fetch_notifications(&self) -> SourceResult<Vec<Notification>> {
        self.check()?;
        use NotificationKind::*;
        Ok(vec![
            notification("1", "Fee Payment Reminder", "The last date for paying the second quarter fees is 15th October 2023.", at(2023, 10, 1, 10, 30), false, Fee),
            notification("2", "PTM Schedule", "Parent-Teacher Meeting is scheduled for 20th October 2023 from 10:00 AM to 2:00 PM.", at(2023, 10, 5, 9, 15), true, Event),
            notification("3", "Holiday Notice", "The school will remain closed on 24th October 2023 due to Diwali celebrations.", at(2023, 10, 10, 14, 20), false, Holiday),
            notification("4", "Fee Payment Confirmation", "Payment of Rs. 15,000 received for Rahul Kumar (Class 10-A) for Second Quarter fees.", at(2023, 10, 12, 11, 45), true, Fee),
            notification("5", "Bus Route Change", "Bus route #3 will have a new stop at Sector 15 starting from 1st November 2023.", at(2023, 10, 15, 8, 30), false, Transport),
            notification("6", "Fee Structure Update", "The fee structure for the next academic year has been updated. Please check the fee details section.", at(2023, 10, 20, 16, 10), false, Fee),
            notification("7", "System Maintenance", "The fee payment portal will be under maintenance on 25th October from 10:00 PM to 2:00 AM.", at(2023, 10, 22, 9, 0), true, System),
        ])
    }

    fn fetch_whatsapp_settings(&self) -> SourceResult<WhatsAppSettings> {
        self.check()?;
        Ok(WhatsAppSettings {
            enabled: true,
            api_key: "wha_123456789abcdef".to_string(),
            template_enabled: true,
            default_template: "Hello [PARENT_NAME], this is a message from [SCHOOL_NAME] regarding your child [STUDENT_NAME].".to_string(),
        })
    }

    fn fetch_profile(&self, username: &str) -> SourceResult<Profile> {
        self.check()?;
        if username != DEMO_USER {
            return Err(SourceError::Rejected(format!("no profile for {}", username)));
        }
        Ok(Profile {
            id: "1".to_string(),
            name: "Admin User".to_string(),
            email: "admin@schoolmgmt.com".to_string(),
            phone: "+91 9876543210".to_string(),
            role: "Administrator".to_string(),
            joined_date: date(2022, 1, 15),
            avatar: None,
            school: "St Marry Champion Public School".to_string(),
            department: "Administration".to_string(),
        })
    }

    fn make_payment(&self, payment: &PaymentRequest) -> SourceResult<PaymentAck> {
        self.check()?;
        if payment.amount <= 0.0 {
            return Err(SourceError::Rejected("amount must be positive".to_string()));
        }
        Ok(PaymentAck {
            payment_id: Uuid::new_v4().to_string(),
        })
    }
}

//! Per-screen configuration: which fields search, filter and sort, where the
//! records come from, and how edit forms become records.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::model::{
    Bus, BusExpense, ClassRoom, Defaulter, FeeAccount, FeeStructure, Notification, Staff, Student,
    Vehicle,
};
use crate::record::Record;
use crate::source::{SchoolData, SourceResult};
use crate::status;
use crate::validate::{FieldError, NumInput, Validator};
use crate::view::ListView;

pub const STAFF_ROLES: [&str; 3] = ["Admin", "Accountant", "Staff"];

/// What a list screen needs from the outside world when it loads.
pub struct FetchCtx<'a> {
    pub source: &'a dyn SchoolData,
    pub today: NaiveDate,
    pub defaulter_threshold_days: i64,
}

pub trait Listable: Record + Serialize + Clone + Sized + 'static {
    /// Method prefix on the wire, e.g. `students` for `students.search`.
    const SCREEN: &'static str;
    const SEARCH_FIELDS: &'static [&'static str];
    const SELECTORS: &'static [&'static str];
    const SORT_FIELDS: &'static [&'static str];
    /// Screens with their own default; otherwise the configured page size.
    const PAGE_SIZE: Option<usize> = None;

    fn fetch(ctx: &FetchCtx<'_>) -> SourceResult<Vec<Self>>;

    fn view(screens: &Screens) -> &ListView<Self>;
    fn view_mut(screens: &mut Screens) -> &mut ListView<Self>;
}

/// Screens whose records the user can create, edit and delete.
pub trait Editable: Listable {
    type Form: DeserializeOwned;

    /// `existing` is the record being edited; fields the form does not carry
    /// (balances, assignments) are taken from it.
    fn build(form: Self::Form, id: String, existing: Option<&Self>) -> Result<Self, Vec<FieldError>>;

    /// Runs once `removed` is gone from its own view, to fix up records on
    /// other screens that referred to it.
    fn after_delete(_removed: &Self, _screens: &mut Screens) {}
}

#[derive(Debug, Clone)]
pub struct Screens {
    pub students: ListView<Student>,
    pub classes: ListView<ClassRoom>,
    pub buses: ListView<Bus>,
    pub vehicles: ListView<Vehicle>,
    pub expenses: ListView<BusExpense>,
    pub fee_structures: ListView<FeeStructure>,
    pub fee_accounts: ListView<FeeAccount>,
    pub defaulters: ListView<Defaulter>,
    pub staff: ListView<Staff>,
    pub notifications: ListView<Notification>,
}

fn list_view<T: Listable>(page_size: usize) -> ListView<T> {
    ListView::new(T::SEARCH_FIELDS, T::PAGE_SIZE.unwrap_or(page_size))
}

impl Screens {
    pub fn new(page_size: usize) -> Self {
        Self {
            students: list_view(page_size),
            classes: list_view(page_size),
            buses: list_view(page_size),
            vehicles: list_view(page_size),
            expenses: list_view(page_size),
            fee_structures: list_view(page_size),
            fee_accounts: list_view(page_size),
            defaulters: list_view(page_size),
            staff: list_view(page_size),
            notifications: list_view(page_size),
        }
    }

    pub fn unmount_all(&mut self) {
        self.students.unmount();
        self.classes.unmount();
        self.buses.unmount();
        self.vehicles.unmount();
        self.expenses.unmount();
        self.fee_structures.unmount();
        self.fee_accounts.unmount();
        self.defaulters.unmount();
        self.staff.unmount();
        self.notifications.unmount();
    }

    /// Frees one seat on `bus_id`. A bus that is not loaded is left alone.
    pub fn release_seat(&mut self, bus_id: &str) {
        if let Some(mut bus) = self.buses.find(bus_id).cloned() {
            bus.assigned_students = bus.assigned_students.saturating_sub(1);
            self.buses.replace(bus_id, bus);
        }
    }

    /// Drops every loaded student's assignment to `bus_id`; returns how many rode it.
    pub fn clear_bus_assignments(&mut self, bus_id: &str) -> usize {
        let riders: Vec<Student> = self
            .students
            .records()
            .iter()
            .filter(|s| s.bus_id.as_deref() == Some(bus_id))
            .cloned()
            .collect();
        let count = riders.len();
        for mut student in riders {
            student.bus_id = None;
            let id = student.id.clone();
            self.students.replace(&id, student);
        }
        count
    }
}

macro_rules! screen_view {
    ($field:ident) => {
        fn view(screens: &Screens) -> &ListView<Self> {
            &screens.$field
        }

        fn view_mut(screens: &mut Screens) -> &mut ListView<Self> {
            &mut screens.$field
        }
    };
}

impl Listable for Student {
    const SCREEN: &'static str = "students";
    const SEARCH_FIELDS: &'static [&'static str] = &[
        "name",
        "rollNumber",
        "admissionNumber",
        "parentName",
        "contactNumber",
        "classSection",
    ];
    const SELECTORS: &'static [&'static str] = &["class", "section"];
    const SORT_FIELDS: &'static [&'static str] =
        &["name", "rollNumber", "class", "pendingFees", "admissionNumber"];

    fn fetch(ctx: &FetchCtx<'_>) -> SourceResult<Vec<Self>> {
        ctx.source.fetch_students()
    }

    screen_view!(students);
}

impl Listable for ClassRoom {
    const SCREEN: &'static str = "classes";
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "classTeacher", "roomNumber"];
    const SELECTORS: &'static [&'static str] = &["section"];
    const SORT_FIELDS: &'static [&'static str] = &["name", "section", "totalStudents", "roomNumber"];
    const PAGE_SIZE: Option<usize> = Some(10);

    fn fetch(ctx: &FetchCtx<'_>) -> SourceResult<Vec<Self>> {
        ctx.source.fetch_classes()
    }

    screen_view!(classes);
}

impl Listable for Bus {
    const SCREEN: &'static str = "buses";
    const SEARCH_FIELDS: &'static [&'static str] = &["busNumber", "route", "driverName"];
    const SELECTORS: &'static [&'static str] = &["route"];
    const SORT_FIELDS: &'static [&'static str] =
        &["busNumber", "route", "capacity", "assignedStudents", "monthlyFee"];

    fn fetch(ctx: &FetchCtx<'_>) -> SourceResult<Vec<Self>> {
        ctx.source.fetch_buses()
    }

    screen_view!(buses);
}

impl Listable for Vehicle {
    const SCREEN: &'static str = "vehicles";
    const SEARCH_FIELDS: &'static [&'static str] = &["regNumber", "model", "driver"];
    const SELECTORS: &'static [&'static str] = &[];
    const SORT_FIELDS: &'static [&'static str] = &["regNumber", "model", "capacity"];

    fn fetch(ctx: &FetchCtx<'_>) -> SourceResult<Vec<Self>> {
        ctx.source.fetch_vehicles()
    }

    screen_view!(vehicles);
}

impl Listable for BusExpense {
    const SCREEN: &'static str = "expenses";
    const SEARCH_FIELDS: &'static [&'static str] = &["category", "notes", "date"];
    const SELECTORS: &'static [&'static str] = &["vehicleId", "category"];
    const SORT_FIELDS: &'static [&'static str] = &["date", "amount", "category"];

    fn fetch(ctx: &FetchCtx<'_>) -> SourceResult<Vec<Self>> {
        ctx.source.fetch_expenses()
    }

    screen_view!(expenses);
}

impl Listable for FeeStructure {
    const SCREEN: &'static str = "feeStructures";
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "class"];
    const SELECTORS: &'static [&'static str] = &[];
    const SORT_FIELDS: &'static [&'static str] = &["name", "class", "totalFee"];

    fn fetch(ctx: &FetchCtx<'_>) -> SourceResult<Vec<Self>> {
        ctx.source.fetch_fee_structures()
    }

    screen_view!(fee_structures);
}

impl Listable for FeeAccount {
    const SCREEN: &'static str = "feeAccounts";
    const SEARCH_FIELDS: &'static [&'static str] = &["studentName", "classSection"];
    const SELECTORS: &'static [&'static str] = &["academicYear", "class", "section", "status"];
    const SORT_FIELDS: &'static [&'static str] = &["studentName", "rollNumber", "outstanding", "status"];

    /// Statuses are recomputed against today so every screen agrees.
    fn fetch(ctx: &FetchCtx<'_>) -> SourceResult<Vec<Self>> {
        let mut accounts = ctx.source.fetch_fee_accounts()?;
        for account in &mut accounts {
            account.refresh_status(ctx.today);
        }
        Ok(accounts)
    }

    screen_view!(fee_accounts);
}

impl Listable for Defaulter {
    const SCREEN: &'static str = "defaulters";
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "rollNumber", "parentName"];
    const SELECTORS: &'static [&'static str] = &["dueBucket", "class", "section"];
    const SORT_FIELDS: &'static [&'static str] = &["name", "pendingAmount", "overdueMonths"];

    fn fetch(ctx: &FetchCtx<'_>) -> SourceResult<Vec<Self>> {
        let accounts = ctx.source.fetch_fee_accounts()?;
        Ok(status::defaulters(
            &accounts,
            ctx.today,
            ctx.defaulter_threshold_days,
        ))
    }

    screen_view!(defaulters);
}

impl Listable for Staff {
    const SCREEN: &'static str = "staff";
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "email", "role"];
    const SELECTORS: &'static [&'static str] = &["role", "active"];
    const SORT_FIELDS: &'static [&'static str] = &["name", "role", "email"];

    fn fetch(ctx: &FetchCtx<'_>) -> SourceResult<Vec<Self>> {
        ctx.source.fetch_staff()
    }

    screen_view!(staff);
}

impl Listable for Notification {
    const SCREEN: &'static str = "notifications";
    const SEARCH_FIELDS: &'static [&'static str] = &["title", "message"];
    const SELECTORS: &'static [&'static str] = &["type", "read"];
    const SORT_FIELDS: &'static [&'static str] = &["date", "title", "type"];

    fn fetch(ctx: &FetchCtx<'_>) -> SourceResult<Vec<Self>> {
        ctx.source.fetch_notifications()
    }

    screen_view!(notifications);
}

// -- edit forms --------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentForm {
    pub name: Option<String>,
    pub roll_number: Option<String>,
    pub class: Option<String>,
    pub section: Option<String>,
    pub parent_name: Option<String>,
    pub contact_number: Option<String>,
    pub admission_number: Option<String>,
}

impl Editable for Student {
    type Form = StudentForm;

    fn build(form: StudentForm, id: String, existing: Option<&Self>) -> Result<Self, Vec<FieldError>> {
        let mut v = Validator::new();
        let name = v.require("name", form.name.as_deref());
        let roll_number = v.require("rollNumber", form.roll_number.as_deref());
        let class = v.require("class", form.class.as_deref());
        let section = v.require("section", form.section.as_deref());
        let contact_number = v.digits("contactNumber", form.contact_number.as_deref(), 10);
        let parent_name = v.optional(form.parent_name.as_deref());
        let admission_number = v.optional(form.admission_number.as_deref());
        v.finish().into_result()?;

        Ok(Student {
            id,
            name: name.unwrap_or_default(),
            roll_number: roll_number.unwrap_or_default(),
            class: class.unwrap_or_default(),
            section: section.unwrap_or_default(),
            parent_name: parent_name.unwrap_or_default(),
            contact_number: contact_number.unwrap_or_default(),
            admission_number: admission_number
                .or_else(|| existing.map(|s| s.admission_number.clone()))
                .unwrap_or_default(),
            pending_fees: existing.map_or(0.0, |s| s.pending_fees),
            last_payment: existing.and_then(|s| s.last_payment.clone()),
            bus_id: existing.and_then(|s| s.bus_id.clone()),
        })
    }

    fn after_delete(removed: &Self, screens: &mut Screens) {
        if let Some(bus_id) = &removed.bus_id {
            screens.release_seat(bus_id);
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassForm {
    pub name: Option<String>,
    pub section: Option<String>,
    pub class_teacher: Option<String>,
    pub total_students: Option<NumInput>,
    pub room_number: Option<String>,
    pub schedule: Option<String>,
}

impl Editable for ClassRoom {
    type Form = ClassForm;

    fn build(form: ClassForm, id: String, _existing: Option<&Self>) -> Result<Self, Vec<FieldError>> {
        let mut v = Validator::new();
        let name = v.require("name", form.name.as_deref());
        let section = v.require("section", form.section.as_deref());
        let class_teacher = v.require("classTeacher", form.class_teacher.as_deref());
        let total_students = v.non_negative_int("totalStudents", form.total_students.as_ref());
        let room_number = v.optional(form.room_number.as_deref());
        let schedule = v.optional(form.schedule.as_deref());
        v.finish().into_result()?;

        Ok(ClassRoom {
            id,
            name: name.unwrap_or_default(),
            section: section.unwrap_or_default(),
            class_teacher: class_teacher.unwrap_or_default(),
            total_students: total_students.unwrap_or_default(),
            room_number: room_number.unwrap_or_default(),
            schedule: schedule.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusForm {
    pub bus_number: Option<String>,
    pub route: Option<String>,
    pub driver_name: Option<String>,
    pub driver_contact: Option<String>,
    pub capacity: Option<NumInput>,
    pub monthly_fee: Option<NumInput>,
}

impl Editable for Bus {
    type Form = BusForm;

    fn build(form: BusForm, id: String, existing: Option<&Self>) -> Result<Self, Vec<FieldError>> {
        let mut v = Validator::new();
        let bus_number = v.require("busNumber", form.bus_number.as_deref());
        let route = v.require("route", form.route.as_deref());
        let driver_name = v.require("driverName", form.driver_name.as_deref());
        let driver_contact = v.digits("driverContact", form.driver_contact.as_deref(), 10);
        let capacity = v.positive_int("capacity", form.capacity.as_ref());
        let monthly_fee = v.non_negative("monthlyFee", form.monthly_fee.as_ref());
        let assigned_students = existing.map_or(0, |b| b.assigned_students);
        if let Some(cap) = capacity {
            if cap < assigned_students {
                v.push(
                    "capacity",
                    format!("capacity cannot be below the {} students already assigned", assigned_students),
                );
            }
        }
        v.finish().into_result()?;

        Ok(Bus {
            id,
            bus_number: bus_number.unwrap_or_default(),
            route: route.unwrap_or_default(),
            driver_name: driver_name.unwrap_or_default(),
            driver_contact: driver_contact.unwrap_or_default(),
            capacity: capacity.unwrap_or_default(),
            assigned_students,
            monthly_fee: monthly_fee.unwrap_or_default(),
        })
    }

    /// Riders of a deleted bus become unassigned.
    fn after_delete(removed: &Self, screens: &mut Screens) {
        let riders = screens.clear_bus_assignments(&removed.id);
        if riders > 0 {
            tracing::info!(bus = %removed.bus_number, riders, "bus deleted; riders unassigned");
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleForm {
    pub reg_number: Option<String>,
    pub model: Option<String>,
    pub capacity: Option<NumInput>,
    pub driver: Option<String>,
}

impl Editable for Vehicle {
    type Form = VehicleForm;

    fn build(form: VehicleForm, id: String, _existing: Option<&Self>) -> Result<Self, Vec<FieldError>> {
        let mut v = Validator::new();
        let reg_number = v.require("regNumber", form.reg_number.as_deref());
        let model = v.require("model", form.model.as_deref());
        let capacity = v.positive_int("capacity", form.capacity.as_ref());
        let driver = v.require("driver", form.driver.as_deref());
        v.finish().into_result()?;

        Ok(Vehicle {
            id,
            reg_number: reg_number.unwrap_or_default(),
            model: model.unwrap_or_default(),
            capacity: capacity.unwrap_or_default(),
            driver: driver.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseForm {
    pub vehicle_id: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
    pub amount: Option<NumInput>,
    pub notes: Option<String>,
}

impl Editable for BusExpense {
    type Form = ExpenseForm;

    fn build(form: ExpenseForm, id: String, _existing: Option<&Self>) -> Result<Self, Vec<FieldError>> {
        let mut v = Validator::new();
        let vehicle_id = v.require("vehicleId", form.vehicle_id.as_deref());
        let date = v.date("date", form.date.as_deref());
        let category = v.require("category", form.category.as_deref());
        let amount = v.positive_amount("amount", form.amount.as_ref());
        let notes = v.optional(form.notes.as_deref());
        v.finish().into_result()?;

        Ok(BusExpense {
            id,
            vehicle_id: vehicle_id.unwrap_or_default(),
            date: date.unwrap_or_default(),
            category: category.unwrap_or_default(),
            amount: amount.unwrap_or_default(),
            notes,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeStructureForm {
    pub name: Option<String>,
    pub class: Option<String>,
    pub tuition_fee: Option<NumInput>,
    pub bus_fee: Option<NumInput>,
    pub library_fee: Option<NumInput>,
    pub sports_fee: Option<NumInput>,
    pub exam_fee: Option<NumInput>,
}

impl Editable for FeeStructure {
    type Form = FeeStructureForm;

    /// The total is always recomputed from the components.
    fn build(form: FeeStructureForm, id: String, _existing: Option<&Self>) -> Result<Self, Vec<FieldError>> {
        let mut v = Validator::new();
        let name = v.require("name", form.name.as_deref());
        let class = v.require("class", form.class.as_deref());
        let tuition_fee = v.non_negative("tuitionFee", form.tuition_fee.as_ref());
        let bus_fee = v.non_negative("busFee", form.bus_fee.as_ref());
        let library_fee = v.non_negative("libraryFee", form.library_fee.as_ref());
        let sports_fee = v.non_negative("sportsFee", form.sports_fee.as_ref());
        let exam_fee = v.non_negative("examFee", form.exam_fee.as_ref());
        v.finish().into_result()?;

        let mut structure = FeeStructure {
            id,
            name: name.unwrap_or_default(),
            class: class.unwrap_or_default(),
            tuition_fee: tuition_fee.unwrap_or_default(),
            bus_fee: bus_fee.unwrap_or_default(),
            library_fee: library_fee.unwrap_or_default(),
            sports_fee: sports_fee.unwrap_or_default(),
            exam_fee: exam_fee.unwrap_or_default(),
            total_fee: 0.0,
        };
        structure.total_fee = structure.component_total();
        Ok(structure)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub active: Option<bool>,
}

impl Editable for Staff {
    type Form = StaffForm;

    fn build(form: StaffForm, id: String, existing: Option<&Self>) -> Result<Self, Vec<FieldError>> {
        let mut v = Validator::new();
        let name = v.require("name", form.name.as_deref());
        let email = v.email("email", form.email.as_deref());
        let role = match v.optional(form.role.as_deref()) {
            Some(role) => v.one_of("role", Some(role.as_str()), &STAFF_ROLES).map(str::to_string),
            None => Some(
                existing
                    .map(|s| s.role.clone())
                    .unwrap_or_else(|| "Staff".to_string()),
            ),
        };
        v.finish().into_result()?;

        Ok(Staff {
            id,
            name: name.unwrap_or_default(),
            email: email.unwrap_or_default(),
            role: role.unwrap_or_default(),
            active: form
                .active
                .or_else(|| existing.map(|s| s.active))
                .unwrap_or(true),
        })
    }
}

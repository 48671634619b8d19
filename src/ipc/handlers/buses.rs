//! Transport assignments. A student rides at most one bus; moving a student
//! frees the seat on the previous bus. Deletes keep this in step through
//! `Editable::after_delete`.

use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::lists::{ensure_loaded, snapshot};
use crate::ipc::helpers::{get_required_str, to_json};
use crate::ipc::types::{AppState, Request};
use crate::model::{Bus, Student};
use crate::validate::FieldError;
use serde_json::json;

fn find_bus(state: &AppState, id: &str) -> Result<Bus, HandlerErr> {
    state
        .screens
        .buses
        .find(id)
        .cloned()
        .ok_or_else(|| HandlerErr::not_found("bus", id))
}

fn find_student(state: &AppState, id: &str) -> Result<Student, HandlerErr> {
    state
        .screens
        .students
        .find(id)
        .cloned()
        .ok_or_else(|| HandlerErr::not_found("student", id))
}

fn result(state: &AppState, bus: &Bus, student: &Student) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({
        "bus": to_json(bus)?,
        "student": to_json(student)?,
        "view": snapshot::<Bus>(state)?,
    }))
}

fn assign(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let bus_id = get_required_str(&req.params, "busId")?;
    let student_id = get_required_str(&req.params, "studentId")?;
    ensure_loaded::<Bus>(state)?;
    ensure_loaded::<Student>(state)?;

    let mut bus = find_bus(state, &bus_id)?;
    let mut student = find_student(state, &student_id)?;
    if student.bus_id.as_deref() == Some(bus_id.as_str()) {
        return result(state, &bus, &student);
    }
    if bus.assigned_students >= bus.capacity {
        return Err(HandlerErr::validation(vec![FieldError {
            field: "busId".to_string(),
            message: format!("{} is full ({} seats)", bus.bus_number, bus.capacity),
        }]));
    }

    if let Some(previous) = student.bus_id.take() {
        state.screens.release_seat(&previous);
    }
    bus.assigned_students += 1;
    student.bus_id = Some(bus_id.clone());
    state.screens.buses.replace(&bus_id, bus.clone());
    state.screens.students.replace(&student_id, student.clone());
    tracing::info!(bus = %bus.bus_number, student = %student.name, "student assigned to bus");
    result(state, &bus, &student)
}

fn unassign(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let bus_id = get_required_str(&req.params, "busId")?;
    let student_id = get_required_str(&req.params, "studentId")?;
    ensure_loaded::<Bus>(state)?;
    ensure_loaded::<Student>(state)?;

    find_bus(state, &bus_id)?;
    let mut student = find_student(state, &student_id)?;
    if student.bus_id.as_deref() != Some(bus_id.as_str()) {
        return Err(HandlerErr::not_found(
            "assignment",
            &format!("{} on {}", student_id, bus_id),
        ));
    }
    student.bus_id = None;
    state.screens.release_seat(&bus_id);
    state.screens.students.replace(&student_id, student.clone());
    let bus = find_bus(state, &bus_id)?;
    result(state, &bus, &student)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "buses.assignStudent" => assign(state, req),
        "buses.unassignStudent" => unassign(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}

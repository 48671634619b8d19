use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Outcome of checking a form: either fine, or every problem found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Validation {
    Ok,
    Invalid { errors: Vec<FieldError> },
}

impl Validation {
    #[cfg(test)]
    pub fn is_ok(&self) -> bool {
        matches!(self, Validation::Ok)
    }

    pub fn into_result(self) -> Result<(), Vec<FieldError>> {
        match self {
            Validation::Ok => Ok(()),
            Validation::Invalid { errors } => Err(errors),
        }
    }
}

/// Numeric form input; shells send either JSON numbers or raw text-box contents.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumInput {
    Num(f64),
    Text(String),
}

impl NumInput {
    pub fn value(&self) -> Option<f64> {
        match self {
            NumInput::Num(n) if n.is_finite() => Some(*n),
            NumInput::Num(_) => None,
            NumInput::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, NumInput::Text(s) if s.trim().is_empty())
    }
}

/// Collects field errors; each check returns the parsed value when it passed.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn require(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(v.to_string()),
            _ => {
                self.push(field, format!("{} is required", field));
                None
            }
        }
    }

    /// Blank or absent becomes `None` without an error.
    pub fn optional(&mut self, value: Option<&str>) -> Option<String> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn positive_amount(&mut self, field: &str, value: Option<&NumInput>) -> Option<f64> {
        let Some(raw) = value.filter(|v| !v.is_blank()) else {
            self.push(field, format!("{} is required", field));
            return None;
        };
        match raw.value() {
            Some(n) if n > 0.0 => Some(n),
            _ => {
                self.push(field, format!("{} must be a number greater than 0", field));
                None
            }
        }
    }

    /// Absent or blank reads as zero.
    pub fn non_negative(&mut self, field: &str, value: Option<&NumInput>) -> Option<f64> {
        let Some(raw) = value.filter(|v| !v.is_blank()) else {
            return Some(0.0);
        };
        match raw.value() {
            Some(n) if n >= 0.0 => Some(n),
            _ => {
                self.push(field, format!("{} must be a non-negative number", field));
                None
            }
        }
    }

    pub fn positive_int(&mut self, field: &str, value: Option<&NumInput>) -> Option<u32> {
        let Some(raw) = value.filter(|v| !v.is_blank()) else {
            self.push(field, format!("{} is required", field));
            return None;
        };
        match raw.value() {
            Some(n) if n >= 1.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => Some(n as u32),
            _ => {
                self.push(field, format!("{} must be a whole number of at least 1", field));
                None
            }
        }
    }

    pub fn non_negative_int(&mut self, field: &str, value: Option<&NumInput>) -> Option<i64> {
        let Some(raw) = value.filter(|v| !v.is_blank()) else {
            return Some(0);
        };
        match raw.value() {
            Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= i64::MAX as f64 => Some(n as i64),
            _ => {
                self.push(field, format!("{} must be a whole number", field));
                None
            }
        }
    }

    pub fn date(&mut self, field: &str, value: Option<&str>) -> Option<NaiveDate> {
        let raw = self.require(field, value)?;
        match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(d) => Some(d),
            Err(_) => {
                self.push(field, format!("{} must be a date (YYYY-MM-DD)", field));
                None
            }
        }
    }

    /// Optional phone number; when present it must be exactly `len` digits.
    pub fn digits(&mut self, field: &str, value: Option<&str>, len: usize) -> Option<String> {
        let v = self.optional(value)?;
        if v.len() == len && v.bytes().all(|b| b.is_ascii_digit()) {
            Some(v)
        } else {
            self.push(field, format!("{} must be {} digits", field, len));
            None
        }
    }

    /// Optional phone number in display form such as `+91 9876543210`:
    /// 10 to 13 digits, spaces and dashes allowed, one leading `+`.
    pub fn phone(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        let v = self.optional(value)?;
        let body = v.strip_prefix('+').unwrap_or(v.as_str());
        let clean = body.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-');
        let digits = body.chars().filter(|c| c.is_ascii_digit()).count();
        if clean && (10..=13).contains(&digits) {
            Some(v)
        } else {
            self.push(field, format!("{} must be a phone number", field));
            None
        }
    }

    pub fn email(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        let v = self.require(field, value)?;
        let well_formed = v
            .split_once('@')
            .map(|(user, domain)| !user.is_empty() && domain.contains('.') && !domain.starts_with('.'))
            .unwrap_or(false);
        if well_formed {
            Some(v)
        } else {
            self.push(field, format!("{} must be an email address", field));
            None
        }
    }

    pub fn one_of<'a>(&mut self, field: &str, value: Option<&str>, allowed: &[&'a str]) -> Option<&'a str> {
        let v = self.require(field, value)?;
        match allowed.iter().find(|a| **a == v) {
            Some(a) => Some(*a),
            None => {
                self.push(field, format!("{} must be one of: {}", field, allowed.join(", ")));
                None
            }
        }
    }

    pub fn finish(self) -> Validation {
        if self.errors.is_empty() {
            Validation::Ok
        } else {
            Validation::Invalid {
                errors: self.errors,
            }
        }
    }
}

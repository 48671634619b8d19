use std::borrow::Cow;

/// A single field value as seen by search, selectors and sorting.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Text(Cow<'a, str>),
    Number(f64),
    Bool(bool),
}

impl<'a> FieldValue<'a> {
    pub fn str(s: &'a str) -> Self {
        FieldValue::Text(Cow::Borrowed(s))
    }

    /// String form used for substring search and exact selector match.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(s) => Cow::Borrowed(s.as_ref()),
            FieldValue::Number(n) => Cow::Owned(format_number(*n)),
            FieldValue::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
        }
    }
}

/// Whole numbers print without a fractional part (`15000`, not `15000.0`).
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

pub trait Record {
    fn id(&self) -> &str;

    /// `None` when the record has no such field or the optional field is unset.
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;

    /// Value sorting orders by; the displayed field unless the record ranks it differently.
    fn sort_key(&self, name: &str) -> Option<FieldValue<'_>> {
        self.field(name)
    }
}

pub(crate) fn opt_text(v: &Option<String>) -> Option<FieldValue<'_>> {
    v.as_deref().map(FieldValue::str)
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::record::Record;

/// Selector value meaning "no constraint".
pub const ALL: &str = "All";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub search: String,
    #[serde(default)]
    pub selectors: BTreeMap<String, String>,
}

impl FilterCriteria {
    pub fn is_unconstrained(&self) -> bool {
        self.search.is_empty() && self.selectors.values().all(|v| v == ALL)
    }

    pub fn set_selector(&mut self, field: &str, value: &str) {
        if value == ALL {
            self.selectors.remove(field);
        } else {
            self.selectors.insert(field.to_string(), value.to_string());
        }
    }
}

/// Search is a case-insensitive substring test over `search_fields`; every
/// selector other than [`ALL`] must equal the field text exactly.
pub fn matches<R: Record>(record: &R, search_fields: &[&str], criteria: &FilterCriteria) -> bool {
    search_matches(record, search_fields, &criteria.search)
        && criteria
            .selectors
            .iter()
            .all(|(field, want)| selector_matches(record, field, want))
}

fn search_matches<R: Record>(record: &R, search_fields: &[&str], search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    search_fields.iter().any(|name| {
        record
            .field(name)
            .map(|v| v.text().to_lowercase().contains(&needle))
            .unwrap_or(false)
    })
}

fn selector_matches<R: Record>(record: &R, field: &str, want: &str) -> bool {
    if want == ALL {
        return true;
    }
    record
        .field(field)
        .map(|v| v.text() == want)
        .unwrap_or(false)
}

/// Positions of matching records, in input order.
pub fn filter_indices<R: Record>(
    records: &[R],
    search_fields: &[&str],
    criteria: &FilterCriteria,
) -> Vec<usize> {
    if criteria.is_unconstrained() {
        return (0..records.len()).collect();
    }
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| matches(*r, search_fields, criteria))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::record::FieldValue;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq, serde::Serialize)]
    pub(crate) struct Row {
        pub id: String,
        pub name: String,
        pub class: String,
        pub phone: Option<String>,
    }

    impl Record for Row {
        fn id(&self) -> &str {
            &self.id
        }

        fn field(&self, name: &str) -> Option<FieldValue<'_>> {
            match name {
                "name" => Some(FieldValue::str(&self.name)),
                "class" => Some(FieldValue::str(&self.class)),
                "phone" => self.phone.as_deref().map(FieldValue::str),
                _ => None,
            }
        }
    }

    pub(crate) fn row(id: &str, name: &str, class: &str) -> Row {
        Row {
            id: id.to_string(),
            name: name.to_string(),
            class: class.to_string(),
            phone: None,
        }
    }

    const FIELDS: &[&str] = &["name", "phone"];

    fn criteria(search: &str, class: &str) -> FilterCriteria {
        let mut c = FilterCriteria {
            search: search.to_string(),
            ..Default::default()
        };
        c.set_selector("class", class);
        c
    }

    #[test]
    fn search_and_class_selector_combine() {
        let rows = vec![
            row("1", "Arjun Patel", "10"),
            row("2", "Ravi Sharma", "10"),
            row("3", "Ananya Gupta", "9"),
        ];
        let got = filter_indices(&rows, FIELDS, &criteria("a", "10"));
        // Both class-10 names contain an "a".
        assert_eq!(got, vec![0, 1]);

        let got = filter_indices(&rows, FIELDS, &criteria("ARJ", "All"));
        assert_eq!(got, vec![0]);
    }

    #[test]
    fn selector_is_case_sensitive_and_missing_fields_never_match() {
        let mut r = row("1", "Jai Patidar", "10");
        assert!(!matches(&r, FIELDS, &criteria("", "10 ")));
        assert!(!matches(&r, FIELDS, &criteria("98765", "All")));
        r.phone = Some("9876543210".into());
        assert!(matches(&r, FIELDS, &criteria("98765", "All")));

        let mut c = FilterCriteria::default();
        c.set_selector("section", "A");
        assert!(!matches(&r, FIELDS, &c));
    }

    #[test]
    fn all_sentinel_clears_a_selector() {
        let mut c = criteria("", "10");
        assert!(!c.is_unconstrained());
        c.set_selector("class", ALL);
        assert!(c.is_unconstrained());
    }

    fn arb_rows() -> impl Strategy<Value = Vec<Row>> {
        prop::collection::vec(("[a-cA-C ]{0,6}", "(9|10|11)"), 0..40).prop_map(|v| {
            v.into_iter()
                .enumerate()
                .map(|(i, (name, class))| row(&i.to_string(), &name, &class))
                .collect()
        })
    }

    fn arb_criteria() -> impl Strategy<Value = FilterCriteria> {
        ("[a-cA-C]{0,2}", "(All|9|10|11)").prop_map(|(s, c)| criteria(&s, &c))
    }

    proptest! {
        #[test]
        fn unconstrained_filter_is_identity(rows in arb_rows()) {
            let got = filter_indices(&rows, FIELDS, &FilterCriteria::default());
            prop_assert_eq!(got, (0..rows.len()).collect::<Vec<_>>());
        }

        #[test]
        fn filter_is_an_ordered_subsequence(rows in arb_rows(), c in arb_criteria()) {
            let got = filter_indices(&rows, FIELDS, &c);
            prop_assert!(got.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(got.iter().all(|&i| i < rows.len()));
        }

        #[test]
        fn filter_is_idempotent(rows in arb_rows(), c in arb_criteria()) {
            let once: Vec<Row> = filter_indices(&rows, FIELDS, &c)
                .into_iter()
                .map(|i| rows[i].clone())
                .collect();
            let twice: Vec<Row> = filter_indices(&once, FIELDS, &c)
                .into_iter()
                .map(|i| once[i].clone())
                .collect();
            prop_assert_eq!(once, twice);
        }
    }
}

use serde::Serialize;
use std::cmp::Ordering;

use super::filter::{self, FilterCriteria};
use super::page::{self, PageInfo};
use crate::record::{FieldValue, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortKey {
    pub field: String,
    pub dir: SortDir,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Failed { message: String },
}

/// Proof that a load was started for a particular mount of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Failed,
    /// The view was closed or remounted after the load began.
    Stale,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSnapshot<'a, T: Serialize> {
    pub load: &'a LoadState,
    pub criteria: &'a FilterCriteria,
    pub sort: Option<&'a SortKey>,
    pub rows: Vec<&'a T>,
    pub page: PageInfo,
    pub empty: bool,
}

/// Per-screen view state: source records, criteria and the derived visible order.
#[derive(Debug, Clone)]
pub struct ListView<T> {
    records: Vec<T>,
    search_fields: &'static [&'static str],
    criteria: FilterCriteria,
    sort: Option<SortKey>,
    page: usize,
    page_size: usize,
    default_page_size: usize,
    load: LoadState,
    generation: u64,
    visible: Vec<usize>,
}

impl<T: Record> ListView<T> {
    pub fn new(search_fields: &'static [&'static str], page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            records: Vec::new(),
            search_fields,
            criteria: FilterCriteria::default(),
            sort: None,
            page: 1,
            page_size,
            default_page_size: page_size,
            load: LoadState::Idle,
            generation: 0,
            visible: Vec::new(),
        }
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn is_ready(&self) -> bool {
        self.load == LoadState::Ready
    }

    #[cfg(test)]
    pub fn page(&self) -> usize {
        self.page
    }

    #[cfg(test)]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self) -> usize {
        page::total_pages(self.visible.len(), self.page_size)
    }

    /// Every record matching the current criteria, across all pages.
    pub fn filtered(&self) -> impl Iterator<Item = &T> + '_ {
        self.visible.iter().map(move |&i| &self.records[i])
    }

    pub fn filtered_len(&self) -> usize {
        self.visible.len()
    }

    pub fn current_page(&self) -> Vec<&T> {
        let bounds = page::page_bounds(self.visible.len(), self.page_size, self.page);
        self.visible[bounds].iter().map(|&i| &self.records[i]).collect()
    }

    pub fn find(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    // -- load lifecycle ---------------------------------------------------

    /// `None` while another load is in flight; overlapping refreshes are dropped.
    pub fn begin_load(&mut self) -> Option<LoadTicket> {
        if self.load == LoadState::Loading {
            return None;
        }
        self.load = LoadState::Loading;
        Some(LoadTicket {
            generation: self.generation,
        })
    }

    pub fn finish_load<E: std::fmt::Display>(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<T>, E>,
    ) -> LoadOutcome {
        if ticket.generation != self.generation {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.generation,
                "dropping stale load result"
            );
            return LoadOutcome::Stale;
        }
        match result {
            Ok(records) => {
                self.records = records;
                self.load = LoadState::Ready;
                self.recompute_clamped();
                LoadOutcome::Applied
            }
            Err(e) => {
                self.load = LoadState::Failed {
                    message: e.to_string(),
                };
                self.visible.clear();
                LoadOutcome::Failed
            }
        }
    }

    /// Screen closed: drop data and criteria, invalidate in-flight loads.
    pub fn unmount(&mut self) {
        self.generation += 1;
        self.records.clear();
        self.visible.clear();
        self.criteria = FilterCriteria::default();
        self.sort = None;
        self.page = 1;
        self.page_size = self.default_page_size;
        self.load = LoadState::Idle;
    }

    // -- criteria (reset to page 1) -----------------------------------------

    pub fn set_search(&mut self, search: &str) {
        if self.criteria.search == search {
            return;
        }
        self.criteria.search = search.to_string();
        self.recompute_reset();
    }

    pub fn set_selector(&mut self, field: &str, value: &str) {
        self.criteria.set_selector(field, value);
        self.recompute_reset();
    }

    pub fn clear_filters(&mut self) {
        self.criteria = FilterCriteria::default();
        self.recompute_reset();
    }

    pub fn set_sort(&mut self, sort: Option<SortKey>) {
        self.sort = sort;
        self.recompute_reset();
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    // -- paging (clamped) -------------------------------------------------

    pub fn set_page(&mut self, page: usize) {
        self.page = page::clamp_page(page, self.total_pages());
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page.saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.page.saturating_sub(1));
    }

    // -- source mutations (clamp) -------------------------------------------

    pub fn push(&mut self, record: T) {
        self.records.push(record);
        self.recompute_clamped();
    }

    /// Returns false when no record has `id`.
    pub fn replace(&mut self, id: &str, record: T) -> bool {
        let Some(slot) = self.records.iter_mut().find(|r| r.id() == id) else {
            return false;
        };
        *slot = record;
        self.recompute_clamped();
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        let pos = self.records.iter().position(|r| r.id() == id)?;
        let removed = self.records.remove(pos);
        self.recompute_clamped();
        Some(removed)
    }

    /// Swap in a re-derived source collection, keeping criteria.
    pub fn set_records(&mut self, records: Vec<T>) {
        self.records = records;
        self.recompute_clamped();
    }

    pub fn snapshot(&self) -> ListSnapshot<'_, T>
    where
        T: Serialize,
    {
        let (rows, empty) = match self.load {
            LoadState::Ready => {
                let rows = self.current_page();
                let empty = self.visible.is_empty();
                (rows, empty)
            }
            _ => (Vec::new(), false),
        };
        ListSnapshot {
            load: &self.load,
            criteria: &self.criteria,
            sort: self.sort.as_ref(),
            rows,
            page: PageInfo::new(self.visible.len(), self.page_size, self.page),
            empty,
        }
    }

    fn recompute_reset(&mut self) {
        self.derive();
        self.page = 1;
    }

    fn recompute_clamped(&mut self) {
        self.derive();
        self.page = page::clamp_page(self.page, self.total_pages());
    }

    fn derive(&mut self) {
        if self.load != LoadState::Ready {
            self.visible.clear();
            return;
        }
        let mut visible = filter::filter_indices(&self.records, self.search_fields, &self.criteria);
        if let Some(sort) = &self.sort {
            let records = &self.records;
            // Stable: ties keep filtered (source) order.
            visible.sort_by(|&a, &b| {
                let ord = compare_fields(
                    records[a].sort_key(&sort.field),
                    records[b].sort_key(&sort.field),
                );
                match sort.dir {
                    SortDir::Asc => ord,
                    SortDir::Desc => ord.reverse(),
                }
            });
        }
        self.visible = visible;
    }
}

/// Missing values sort last in ascending order; numbers compare numerically,
/// text compares case-insensitively.
fn compare_fields(a: Option<FieldValue<'_>>, b: Option<FieldValue<'_>>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(FieldValue::Number(x)), Some(FieldValue::Number(y))) => {
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(FieldValue::Bool(x)), Some(FieldValue::Bool(y))) => x.cmp(&y),
        (Some(x), Some(y)) => x.text().to_lowercase().cmp(&y.text().to_lowercase()),
    }
}

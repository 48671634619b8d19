//! List view-state derivation: filter, sort and page an in-memory collection.

pub mod filter;
pub mod list;
pub mod page;

pub use list::{ListView, LoadOutcome, LoadState, SortDir, SortKey};

//! Organization entity and related types
//!
//! Read-side shapes returned by the directory. These are built fresh for
//! every request and never written back.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A building that hosts one or more organizations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: i64,
    pub address: String,
    pub coordinates: Coordinates,
}

/// An organization with its building, phone numbers and industry names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub phones: Vec<String>,
    pub building: Building,
    pub industries: Vec<String>,
}

/// One page of results
///
/// `page_items` counts the rows fetched for this page *before* the
/// look-ahead row is dropped, so it can be `items.len() + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    /// 1-based page number
    pub page: u32,
    pub page_items: usize,
    pub has_more: bool,
}

impl<T> PaginatedResult<T> {
    /// Map the items while keeping the page metadata
    pub fn map<U, F>(self, f: F) -> PaginatedResult<U>
    where
        F: FnMut(T) -> U,
    {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_items: self.page_items,
            has_more: self.has_more,
        }
    }
}

/// Page request; `page` is 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub items_per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, items_per_page: u32) -> Self {
        Self {
            page,
            items_per_page,
        }
    }

    /// Rows to skip: `(page - 1) * items_per_page`
    pub fn offset(&self) -> i64 {
        (i64::from(self.page.max(1)) - 1) * i64::from(self.items_per_page)
    }

    /// Rows to fetch: one more than the page size, to detect a next page
    pub fn limit(&self) -> i64 {
        i64::from(self.items_per_page) + 1
    }
}

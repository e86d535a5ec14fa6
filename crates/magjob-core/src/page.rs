use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_SORT_FIELD: &str = "id";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("page size must be greater than zero")]
    ZeroSize,
    #[error("cannot sort by '{0}'")]
    UnknownSortField(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: impl Into<String>, ascending: bool) -> Self {
        Self {
            field: field.into(),
            direction: if ascending {
                SortDirection::Ascending
            } else {
                SortDirection::Descending
            },
        }
    }

    pub fn ascending(&self) -> bool {
        self.direction == SortDirection::Ascending
    }
}

/// Zero-based page window with an optional sort order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Option<Sort>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: None,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Result<Self, PageError> {
        if size == 0 {
            return Err(PageError::ZeroSize);
        }
        Ok(Self {
            page,
            size,
            sort: None,
        })
    }

    /// Everything on one page. Used where the caller wants the full set.
    pub fn unpaged() -> Self {
        Self {
            page: 0,
            size: u32::MAX,
            sort: None,
        }
    }

    pub fn sorted_by(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    /// Sort and slice an in-memory collection.
    pub fn apply<T: Sortable>(&self, mut items: Vec<T>) -> Result<Page<T>, PageError> {
        let sort = self
            .sort
            .clone()
            .unwrap_or_else(|| Sort::new(DEFAULT_SORT_FIELD, true));

        if !T::SORT_FIELDS.contains(&sort.field.as_str()) {
            return Err(PageError::UnknownSortField(sort.field));
        }

        items.sort_by(|a, b| {
            let ord = compare_keys(a.sort_key(&sort.field), b.sort_key(&sort.field));
            if sort.ascending() {
                ord
            } else {
                ord.reverse()
            }
        });

        let total = items.len();
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let items = items
            .into_iter()
            .skip(start)
            .take(self.size as usize)
            .collect();

        Ok(Page { items, total })
    }
}

/// One page of results plus the size of the whole result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

/// Comparable value extracted from an entity for sorting.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Int(i64),
    Text(String),
    Id(Uuid),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Bool(bool),
}

pub trait Sortable {
    /// Every field `sort_key` answers for.
    const SORT_FIELDS: &'static [&'static str];

    /// `None` when the entity cannot be sorted by `field`.
    fn sort_key(&self, field: &str) -> Option<SortKey>;
}

/// Orders two entities by an optional key, missing keys last.
pub fn compare_keys(a: Option<SortKey>, b: Option<SortKey>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

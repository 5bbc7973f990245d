//! Pagination and sorting primitives for envelope listings.
//!
//! Pages are 1-based at the interface and translated to the store's
//! 0-based pages. Sort fields come from an allow-list; anything else is
//! rejected before a query runs.

use sea_orm::Order;
use serde::Serialize;

use crate::EngineError;

/// Allowed sort fields for the envelope listing.
///
/// `Id` and `Name` order on the envelope, the rest on the allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortBy {
    Id,
    Name,
    Amount,
    Recurring,
    Status,
}

impl TryFrom<&str> for SortBy {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            "amount" => Ok(Self::Amount),
            "recurring" => Ok(Self::Recurring),
            "status" => Ok(Self::Status),
            other => Err(EngineError::NotFound(format!(
                "Sort by {other} is not allowed"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl TryFrom<&str> for SortDirection {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(EngineError::NotFound(format!(
                "Sort direction {value} is not allowed"
            ))),
        }
    }
}

impl From<SortDirection> for Order {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

/// One page of a listing, with 1-based `current_page`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_pages: u64,
    pub total_elements: u64,
    pub number_of_elements: u64,
    pub current_page: u64,
    pub first: bool,
    pub last: bool,
}

impl<T> Page<T> {
    pub(crate) fn assemble(
        content: Vec<T>,
        page_zero: u64,
        total_pages: u64,
        total_elements: u64,
    ) -> Self {
        Self {
            number_of_elements: content.len() as u64,
            current_page: page_zero + 1,
            first: page_zero == 0,
            last: page_zero + 1 >= total_pages,
            total_pages,
            total_elements,
            content,
        }
    }
}

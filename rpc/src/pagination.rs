//! Offset pagination and sort-order parameters for list endpoints.

use serde::Serialize;

use crate::error::ApiError;

/// Default page size when `count` is not specified.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Resolved `start`/`count` of a list request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageParams {
    pub start: usize,
    pub count: usize,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            start: 0,
            count: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageParams {
    /// Parse raw query values. Absent values take the defaults; anything
    /// that is not a non-negative integer is rejected.
    pub fn parse(start: Option<&str>, count: Option<&str>) -> Result<Self, ApiError> {
        let defaults = Self::default();
        Ok(Self {
            start: parse_non_negative("start", start, defaults.start)?,
            count: parse_non_negative("count", count, defaults.count)?,
        })
    }
}

fn parse_non_negative(name: &'static str, raw: Option<&str>, default: usize) -> Result<usize, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(value) => Ok(usize::try_from(value).unwrap_or(usize::MAX)),
        Err(_) => Err(ApiError::InvalidParameter {
            name,
            reason: format!("expected a non-negative integer, got {raw:?}"),
        }),
    }
}

/// Sort direction. Anything but `desc` means ascending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.trim().eq_ignore_ascii_case("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }
}

/// One page of a collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub start: usize,
    pub count: usize,
    /// Length of the whole collection.
    pub total: usize,
}

/// The slice `[start, min(start + count, len))`. A `start` at or past the
/// end gives an empty page.
pub fn paginate<T: Clone>(items: &[T], params: PageParams) -> Page<T> {
    let total = items.len();
    let from = params.start.min(total);
    let to = params.start.saturating_add(params.count).min(total);
    Page {
        items: items[from..to].to_vec(),
        start: params.start,
        count: params.count,
        total,
    }
}

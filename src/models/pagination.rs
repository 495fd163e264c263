//! Pagination Models
//!
//! Page requests parsed from query strings, the cache key they map to, and the
//! page envelope returned to clients.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Sentinel written into cache keys when no sort field is given.
const NO_SORT: &str = "null";
const MAX_SORT_FIELD_LENGTH: usize = 64;

// == Sort Direction ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    /// Case-insensitive parse of `asc` / `desc`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ASC" => Some(SortDirection::Asc),
            "DESC" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering handed to repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort {
    pub field: Option<String>,
    pub direction: SortDirection,
}

// == Page Query ==
/// Raw pagination query parameters, exactly as they arrived.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<String>,
    pub size: Option<String>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
}

// == Page Request ==
/// A validated request for one page of a resource listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRequest {
    page: u32,
    size: u32,
    sort_by: Option<String>,
    sort_direction: SortDirection,
}

impl PageRequest {
    pub const DEFAULT_PAGE: u32 = 0;
    pub const DEFAULT_SIZE: u32 = 20;
    pub const MAX_SIZE: u32 = 100;

    /// Builds a page request, rejecting out-of-range sizes and malformed sort
    /// fields. A blank `sort_by` is the same as none.
    pub fn new(
        page: u32,
        size: u32,
        sort_by: Option<String>,
        sort_direction: SortDirection,
    ) -> Result<Self, ApiError> {
        if size == 0 {
            return Err(ApiError::Validation(
                "Page size must be at least 1".to_string(),
            ));
        }
        if size > Self::MAX_SIZE {
            return Err(ApiError::Validation(format!(
                "Page size cannot exceed {}",
                Self::MAX_SIZE
            )));
        }

        let sort_by = sort_by
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if let Some(field) = &sort_by {
            validate_sort_field(field)?;
        }

        Ok(Self {
            page,
            size,
            sort_by,
            sort_direction,
        })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sort_by(&self) -> Option<&str> {
        self.sort_by.as_deref()
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    pub fn limit(&self) -> u32 {
        self.size
    }

    pub fn sort(&self) -> Sort {
        Sort {
            field: self.sort_by.clone(),
            direction: self.sort_direction,
        }
    }

    /// Cache key for this page of `resource`.
    ///
    /// Equal requests always produce the same key, and requests that differ in
    /// any field produce different keys.
    pub fn cache_key(&self, resource: &str) -> String {
        format!(
            "{}:page:{}:size:{}:sort:{}:{}",
            resource,
            self.page,
            self.size,
            self.sort_by.as_deref().unwrap_or(NO_SORT),
            self.sort_direction
        )
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            size: Self::DEFAULT_SIZE,
            sort_by: None,
            sort_direction: SortDirection::Asc,
        }
    }
}

impl TryFrom<PageQuery> for PageRequest {
    type Error = ApiError;

    fn try_from(query: PageQuery) -> Result<Self, Self::Error> {
        let page = parse_number(query.page.as_deref(), "page", Self::DEFAULT_PAGE)?;
        let size = parse_number(query.size.as_deref(), "size", Self::DEFAULT_SIZE)?;

        let sort_direction = match query.sort_direction.as_deref().map(str::trim) {
            None | Some("") => SortDirection::Asc,
            Some(raw) => SortDirection::parse(raw).ok_or_else(|| {
                ApiError::InvalidRequest(format!(
                    "Invalid sortDirection '{}': expected ASC or DESC",
                    raw
                ))
            })?,
        };

        Self::new(page, size, query.sort_by, sort_direction)
    }
}

fn parse_number(raw: Option<&str>, name: &str, default: u32) -> Result<u32, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => match value.parse::<i64>() {
            Ok(n) if n < 0 => Err(ApiError::Validation(format!(
                "{} must be non-negative",
                name
            ))),
            Ok(n) => u32::try_from(n).map_err(|_| {
                ApiError::Validation(format!("{} is out of range", name))
            }),
            Err(_) => Err(ApiError::InvalidRequest(format!(
                "{} must be an integer, got '{}'",
                name, value
            ))),
        },
    }
}

fn validate_sort_field(field: &str) -> Result<(), ApiError> {
    if field == NO_SORT {
        return Err(ApiError::Validation(format!(
            "sortBy '{}' is reserved",
            NO_SORT
        )));
    }
    if field.len() > MAX_SORT_FIELD_LENGTH {
        return Err(ApiError::Validation(format!(
            "sortBy exceeds maximum length of {} characters",
            MAX_SORT_FIELD_LENGTH
        )));
    }

    let mut chars = field.chars();
    let starts_well = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if !starts_well || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ApiError::Validation(format!(
            "sortBy '{}' is not a valid field name",
            field
        )));
    }
    Ok(())
}

// == Page Response ==
/// Position of a page within the full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub number_of_elements: usize,
    pub total_pages: u64,
    pub first: bool,
    pub last: bool,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageMetadata {
    pub fn new(page: u32, size: u32, total_elements: u64, number_of_elements: usize) -> Self {
        let total_pages = total_elements.div_ceil(u64::from(size.max(1)));
        let next = u64::from(page) + 1;

        Self {
            page,
            size,
            total_elements,
            number_of_elements,
            total_pages,
            first: page == 0,
            last: next >= total_pages,
            has_next: next < total_pages,
            has_previous: page > 0,
        }
    }
}

/// One page of `T` plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub metadata: PageMetadata,
}

impl<T> PageResponse<T> {
    /// Assembles a page from the rows fetched for `request` and the total
    /// row count at the time of the query.
    pub fn of(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        let metadata = PageMetadata::new(
            request.page(),
            request.size(),
            total_elements,
            content.len(),
        );
        Self { content, metadata }
    }
}

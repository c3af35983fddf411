use crate::error::ValidationError;

/// Inclusive lower bound for the requested page size.
pub const MIN_PAGE_SIZE: i64 = 10;
/// Exclusive upper bound for the requested page size.
pub const PAGE_SIZE_LIMIT: i64 = 50;

/// Defaults applied when a resolved lookup arrives without paging fields.
pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// One client lookup: a symbol or name fragment plus optional paging.
///
/// Paging fields are optional so that pure suggestion lookups can omit
/// them entirely; when present they must satisfy [`Query::validate`]
/// whether or not the lookup ends in a detail fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub raw_text: String,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl Query {
    pub fn suggestion(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            page: None,
            page_size: None,
        }
    }

    pub fn with_paging(raw_text: impl Into<String>, page: i64, page_size: i64) -> Self {
        Self {
            raw_text: raw_text.into(),
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    /// Check paging bounds: `page >= 1`, `page_size` in `[10, 50)`.
    ///
    /// Absent fields pass; they are defaulted at detail-fetch time.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(page) = self.page {
            if page < 1 {
                return Err(ValidationError::PageTooSmall { got: page });
            }
        }

        if let Some(size) = self.page_size {
            if !(MIN_PAGE_SIZE..PAGE_SIZE_LIMIT).contains(&size) {
                return Err(ValidationError::PageSizeOutOfRange { got: size });
            }
        }

        Ok(())
    }

    pub fn page_or_default(&self) -> i64 {
        self.page.unwrap_or(DEFAULT_PAGE)
    }

    pub fn page_size_or_default(&self) -> i64 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

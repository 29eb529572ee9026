pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Largest offset the storage integer can carry
const MAX_OFFSET: u64 = i64::MAX as u64;

/// Zero-based page selection for list operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// A non-positive `page_size` falls back to `DEFAULT_PAGE_SIZE`
    pub fn new(page: u64, page_size: i64) -> Self {
        let page_size = u64::try_from(page_size)
            .ok()
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        Self { page, page_size }
    }

    /// Build a page request from raw query parameters
    ///
    /// A missing, malformed or negative page means the first page; a missing,
    /// malformed or non-positive size uses the default.
    pub fn parse(page: Option<&str>, page_size: Option<&str>) -> Self {
        let page = page
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(0);
        let page_size = page_size
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(0);

        Self::new(page, page_size)
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// `page * page_size`, capped at `i64::MAX`
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.page_size).min(MAX_OFFSET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_is_page_times_size() {
        let page = PageRequest::new(3, 25);
        assert_eq!(page.offset(), 75);
        assert_eq!(page.page_size(), 25);
    }

    #[test]
    fn test_non_positive_size_uses_default() {
        assert_eq!(PageRequest::new(0, 0).page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(PageRequest::new(0, -5).page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_parse_query_parameters() {
        assert_eq!(PageRequest::parse(None, None), PageRequest::default());
        assert_eq!(PageRequest::parse(Some("2"), Some("abc")), PageRequest::new(2, 100));
        assert_eq!(PageRequest::parse(Some(" 1 "), Some("10")).offset(), 10);
    }

    #[test]
    fn test_unusable_page_falls_back_to_first() {
        assert_eq!(PageRequest::parse(Some("-1"), None).page(), 0);
        assert_eq!(PageRequest::parse(Some("two"), Some("5")), PageRequest::new(0, 5));
    }

    #[test]
    fn test_offset_never_exceeds_storage_integer() {
        assert_eq!(PageRequest::new(1 << 62, 100).offset(), i64::MAX as u64);
        assert_eq!(PageRequest::new(u64::MAX, i64::MAX).offset(), i64::MAX as u64);
        let parsed = PageRequest::parse(Some("18446744073709551615"), Some("100"));
        assert_eq!(parsed.offset(), i64::MAX as u64);
    }
}

use serde::Serialize;

/// One page of records plus the size of the unpaged result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagingResult<T> {
    pub records: Vec<T>,
    /// Total row count, independent of the page window
    pub total_records: i64,
}

impl<T> PagingResult<T> {
    pub fn new(records: Vec<T>, total_records: i64) -> Self {
        Self {
            records,
            total_records,
        }
    }

    /// Number of pages of `page_size` needed to cover every record.
    pub fn total_pages(&self, page_size: u32) -> i64 {
        if page_size == 0 {
            return 0;
        }
        let size = i64::from(page_size);
        (self.total_records + size - 1) / size
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

use crate::endpoints::sessions::{PaginatedRows, RowFilter, SessionCounts};

/// Outcome of moving the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Moved within the loaded page.
    Moved,
    /// Moved onto another page, which has to be fetched.
    LoadPage(u32),
    /// Already at the first row.
    AtStart,
    /// Already at the last row.
    AtEnd,
}

/// Position of the rating desk: a 1-based page and an index into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCursor {
    pub page: u32,
    pub index: usize,
    pub per_page: u32,
}

impl RowCursor {
    pub fn new(per_page: u32) -> Self {
        Self { page: 1, index: 0, per_page: per_page.max(1) }
    }

    /// Zero-based position across all pages.
    pub fn global_index(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page) + self.index as u64
    }

    pub fn at_start(&self) -> bool {
        self.page <= 1 && self.index == 0
    }

    pub fn at_end(&self, rows: &PaginatedRows) -> bool {
        self.page >= rows.total_pages && self.index + 1 >= rows.items.len()
    }

    pub fn next(&mut self, rows: &PaginatedRows) -> Step {
        if self.index + 1 < rows.items.len() {
            self.index += 1;
            Step::Moved
        } else if self.page < rows.total_pages {
            self.page += 1;
            self.index = 0;
            Step::LoadPage(self.page)
        } else {
            Step::AtEnd
        }
    }

    /// Going back across a page boundary lands on the last row of the
    /// previous page; call `clamp` once that page is loaded.
    pub fn previous(&mut self) -> Step {
        if self.index > 0 {
            self.index -= 1;
            Step::Moved
        } else if self.page > 1 {
            self.page -= 1;
            self.index = self.per_page as usize - 1;
            Step::LoadPage(self.page)
        } else {
            Step::AtStart
        }
    }

    /// Keep the index inside a page of `len` rows.
    pub fn clamp(&mut self, len: usize) {
        self.index = self.index.min(len.saturating_sub(1));
    }

    /// Back to the first row, as on a filter change.
    pub fn reset(&mut self) {
        self.page = 1;
        self.index = 0;
    }
}

pub fn total_pages(total: u64, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(u64::from(per_page)) as u32
}

/// Whole percent of `rated` over `total`, rounded; 0 for an empty total.
pub fn progress_percent(rated: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (rated as f64 / total as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

/// Row counts shown on the filter tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterCounts {
    pub all: u64,
    pub unrated: u64,
    pub rated: u64,
}

impl FilterCounts {
    pub fn new(row_count: u64, rated_count: u64) -> Self {
        Self {
            all: row_count,
            unrated: row_count.saturating_sub(rated_count),
            rated: rated_count,
        }
    }

    pub fn from_session(counts: &SessionCounts) -> Self {
        Self::new(counts.row_count, counts.rated_count)
    }

    pub fn get(&self, filter: RowFilter) -> u64 {
        match filter {
            RowFilter::All => self.all,
            RowFilter::Unrated => self.unrated,
            RowFilter::Rated => self.rated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::sessions::DataRow;
    use serde_json::json;
    use uuid::Uuid;

    fn page(page: u32, len: usize, total: u64) -> PaginatedRows {
        let items = (0..len)
            .map(|i| {
                serde_json::from_value::<DataRow>(json!({
                    "id": Uuid::new_v4(),
                    "row_index": i,
                    "content": {}
                }))
                .unwrap()
            })
            .collect();
        PaginatedRows {
            items,
            total,
            page,
            per_page: 10,
            total_pages: total_pages(total, 10),
            rated_count: 0,
        }
    }

    #[test]
    fn test_next_crosses_page_boundary() {
        let mut cursor = RowCursor::new(10);
        let first = page(1, 10, 25);

        cursor.index = 9;
        assert_eq!(cursor.global_index(), 9);
        assert_eq!(cursor.next(&first), Step::LoadPage(2));
        assert_eq!((cursor.page, cursor.index), (2, 0));
        assert_eq!(cursor.global_index(), 10);
    }

    #[test]
    fn test_next_stops_at_end() {
        let mut cursor = RowCursor { page: 3, index: 3, per_page: 10 };
        let last = page(3, 5, 25);

        assert!(!cursor.at_end(&last));
        assert_eq!(cursor.next(&last), Step::Moved);
        assert!(cursor.at_end(&last));
        assert_eq!(cursor.next(&last), Step::AtEnd);
        assert_eq!(cursor.global_index(), 24);
    }

    #[test]
    fn test_previous_lands_on_last_row_of_previous_page() {
        let mut cursor = RowCursor { page: 2, index: 0, per_page: 10 };
        assert_eq!(cursor.previous(), Step::LoadPage(1));
        assert_eq!(cursor.index, 9);

        // A short page pulls the index back in.
        cursor.clamp(4);
        assert_eq!(cursor.index, 3);

        let mut start = RowCursor::new(10);
        assert!(start.at_start());
        assert_eq!(start.previous(), Step::AtStart);
    }

    #[test]
    fn test_empty_page() {
        let mut cursor = RowCursor::new(10);
        let empty = page(1, 0, 0);
        assert!(cursor.at_end(&empty));
        assert_eq!(cursor.next(&empty), Step::AtEnd);
        cursor.clamp(0);
        assert_eq!(cursor.index, 0);
    }

    #[test]
    fn test_reset() {
        let mut cursor = RowCursor { page: 4, index: 7, per_page: 10 };
        cursor.reset();
        assert_eq!((cursor.page, cursor.index), (1, 0));
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(5, 5), 100);
        assert_eq!(progress_percent(7, 5), 100);
    }

    #[test]
    fn test_filter_counts() {
        let counts = FilterCounts::new(20, 5);
        assert_eq!(counts.get(RowFilter::All), 20);
        assert_eq!(counts.get(RowFilter::Unrated), 15);
        assert_eq!(counts.get(RowFilter::Rated), 5);
        assert_eq!(FilterCounts::new(3, 5).unrated, 0);
    }
}

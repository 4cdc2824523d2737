//! Sorting and paging helpers shared by the table views.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Apply this direction to an ascending comparison
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

/// Current sort column and direction for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState<C> {
    pub column: C,
    pub direction: SortDirection,
}

impl<C: Copy + PartialEq> SortState<C> {
    pub fn new(column: C, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    /// Same column flips direction; a different column starts ascending.
    pub fn toggle(&mut self, column: C) {
        if self.column == column {
            self.direction = self.direction.flipped();
        } else {
            self.column = column;
            self.direction = SortDirection::Ascending;
        }
    }

    /// Arrow for a column header, empty if not the sort column
    pub fn indicator(&self, column: C) -> &'static str {
        if self.column == column {
            self.direction.arrow()
        } else {
            ""
        }
    }
}

/// One page of a filtered, sorted list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based; clamped into range
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<'_, T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// "Showing 6 to 10 of 12"
    pub fn range_label(&self, per_page: usize) -> String {
        if self.total_items == 0 {
            return "No results".to_string();
        }
        let start = (self.page - 1) * per_page + 1;
        let end = start + self.items.len() - 1;
        format!("Showing {} to {} of {}", start, end, self.total_items)
    }
}

/// Number of pages needed for `total` items
pub fn page_count(total: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}

/// Slice out 1-based `page`. Out-of-range pages are clamped to the nearest
/// valid one.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> Page<'_, T> {
    let per_page = per_page.max(1);
    let total_pages = page_count(items.len(), per_page);
    let page = page.clamp(1, total_pages.max(1));
    let start = ((page - 1) * per_page).min(items.len());
    let end = (start + per_page).min(items.len());
    Page {
        items: &items[start..end],
        page,
        total_pages,
        total_items: items.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Col {
        Title,
        Date,
    }

    #[test]
    fn test_toggle_same_column_flips() {
        let mut sort = SortState::new(Col::Date, SortDirection::Descending);
        sort.toggle(Col::Date);
        assert_eq!(sort.direction, SortDirection::Ascending);
        sort.toggle(Col::Date);
        assert_eq!(sort.direction, SortDirection::Descending);
    }

    #[test]
    fn test_toggle_new_column_starts_ascending() {
        let mut sort = SortState::new(Col::Date, SortDirection::Descending);
        sort.toggle(Col::Title);
        assert_eq!(sort, SortState::new(Col::Title, SortDirection::Ascending));
        assert_eq!(sort.indicator(Col::Title), "▲");
        assert_eq!(sort.indicator(Col::Date), "");
    }

    #[test]
    fn test_direction_apply() {
        assert_eq!(SortDirection::Ascending.apply(Ordering::Less), Ordering::Less);
        assert_eq!(SortDirection::Descending.apply(Ordering::Less), Ordering::Greater);
    }

    #[test]
    fn test_paginate() {
        let items: Vec<i32> = (1..=12).collect();

        let first = paginate(&items, 1, 5);
        assert_eq!(first.items, &[1, 2, 3, 4, 5]);
        assert_eq!(first.total_pages, 3);
        assert!(first.has_next());
        assert!(!first.has_prev());
        assert_eq!(first.range_label(5), "Showing 1 to 5 of 12");

        let last = paginate(&items, 3, 5);
        assert_eq!(last.items, &[11, 12]);
        assert!(!last.has_next());
        assert_eq!(last.range_label(5), "Showing 11 to 12 of 12");
    }

    #[test]
    fn test_paginate_clamps_out_of_range() {
        let items: Vec<i32> = (1..=7).collect();
        assert_eq!(paginate(&items, 9, 5).page, 2);
        assert_eq!(paginate(&items, 0, 5).page, 1);

        let empty: Vec<i32> = Vec::new();
        let page = paginate(&empty, 3, 5);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 0);
        assert!(page.items.is_empty());
        assert_eq!(page.range_label(5), "No results");
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 5), 0);
        assert_eq!(page_count(5, 5), 1);
        assert_eq!(page_count(6, 5), 2);
        assert_eq!(page_count(3, 0), 0);
    }
}

//! Pagination utilities for the listing
//!
//! `Pagination` maps a total count and a fixed page size to a page-index
//! domain; `PaginationState` pairs it with the index currently shown.
//! Indexes are 0-based; the HTTP surface is 1-based (see [`index_from_wire`]).

/// Page-index domain for `total_count` items split into pages of `page_size`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    total_count: u64,
    page_size: u64,
}

impl Pagination {
    /// A zero page size is clamped to 1.
    pub fn new(total_count: u64, page_size: u64) -> Self {
        Self { total_count, page_size: page_size.max(1) }
    }

    pub fn total_count(&self) -> u64 { self.total_count }

    pub fn page_size(&self) -> u64 { self.page_size }

    /// Always at least one page, even when there is nothing to show.
    pub fn page_count(&self) -> u64 {
        self.total_count.div_ceil(self.page_size).max(1)
    }

    pub fn last_index(&self) -> u64 { self.page_count() - 1 }

    pub fn is_valid_index(&self, index: u64) -> bool { index < self.page_count() }

    pub fn clamp(&self, index: u64) -> u64 { index.min(self.last_index()) }

    pub fn next(&self, index: u64) -> u64 { self.clamp(index.saturating_add(1)) }

    pub fn prev(&self, index: u64) -> u64 { self.clamp(index.saturating_sub(1)) }

    pub fn offset(&self, index: u64) -> u64 { index.saturating_mul(self.page_size) }
}

/// Convert the 1-based `page` query parameter to a page index.
/// Missing and `0` both mean the first page.
pub fn index_from_wire(page: Option<u64>) -> u64 {
    page.unwrap_or(1).max(1) - 1
}

pub fn index_to_wire(index: u64) -> u64 { index.saturating_add(1) }

/// Current position inside a [`Pagination`]. The index always stays in range:
/// `0 <= current < page_count`, so an empty listing sits on index 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationState {
    pagination: Pagination,
    current: u64,
}

impl PaginationState {
    pub fn new(total_count: u64, page_size: u64) -> Self {
        Self { pagination: Pagination::new(total_count, page_size), current: 0 }
    }

    pub fn at(self, index: u64) -> Self {
        Self { current: self.pagination.clamp(index), ..self }
    }

    pub fn next(self) -> Self { self.at(self.pagination.next(self.current)) }

    pub fn prev(self) -> Self { self.at(self.pagination.prev(self.current)) }

    /// Re-size after a fresh count, keeping the index in range.
    pub fn with_total(self, total_count: u64) -> Self {
        let pagination = Pagination::new(total_count, self.pagination.page_size);
        Self { pagination, current: pagination.clamp(self.current) }
    }

    pub fn current(&self) -> u64 { self.current }

    pub fn pagination(&self) -> Pagination { self.pagination }

    pub fn has_next(&self) -> bool { self.current < self.pagination.last_index() }

    pub fn has_prev(&self) -> bool { self.current > 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_matches_ceiling_with_floor_of_one() {
        for size in 1..=12u64 {
            for total in 0..=60u64 {
                let p = Pagination::new(total, size);
                let expected = std::cmp::max(1, (total + size - 1) / size);
                assert_eq!(p.page_count(), expected, "total={total} size={size}");
                assert!(p.is_valid_index(p.page_count() - 1));
                assert!(!p.is_valid_index(p.page_count()));
            }
        }
    }

    #[test]
    fn twenty_five_items_make_three_pages() {
        let p = Pagination::new(25, 10);
        assert_eq!(p.page_count(), 3);
        assert_eq!(p.offset(2), 20);
        assert_eq!(p.last_index(), 2);
    }

    #[test]
    fn navigation_clamps_instead_of_failing() {
        let p = Pagination::new(25, 10);
        assert_eq!(p.next(0), 1);
        assert_eq!(p.next(2), 2);
        assert_eq!(p.prev(0), 0);
        assert_eq!(p.prev(2), 1);
        assert_eq!(p.clamp(99), 2);
        assert_eq!(p.next(u64::MAX), 2);
    }

    #[test]
    fn zero_page_size_clamps_to_one() {
        let p = Pagination::new(3, 0);
        assert_eq!(p.page_size(), 1);
        assert_eq!(p.page_count(), 3);
    }

    #[test]
    fn wire_index_is_one_based() {
        assert_eq!(index_from_wire(None), 0);
        assert_eq!(index_from_wire(Some(0)), 0);
        assert_eq!(index_from_wire(Some(1)), 0);
        assert_eq!(index_from_wire(Some(4)), 3);
        assert_eq!(index_to_wire(3), 4);
    }

    #[test]
    fn state_stays_in_range() {
        let empty = PaginationState::new(0, 10);
        assert_eq!(empty.current(), 0);
        assert_eq!(empty.next().current(), 0);
        assert!(!empty.has_next());

        let s = PaginationState::new(25, 10).at(7);
        assert_eq!(s.current(), 2);
        assert!(s.has_prev());
        assert_eq!(s.prev().prev().prev().current(), 0);

        let shrunk = s.with_total(5);
        assert_eq!(shrunk.current(), 0);
        assert_eq!(shrunk.pagination().page_count(), 1);
    }
}

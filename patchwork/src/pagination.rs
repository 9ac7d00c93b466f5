use crate::{Error, Result};

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Pagination {
    page: i32,
    items_per_page: i32,
}

impl Pagination {
    /// A single page holding every element of the result set.
    pub const ALL_ELEMENTS: Self = Self {
        page: 0,
        items_per_page: i32::MAX,
    };

    pub fn new(page: i32, items_per_page: i32) -> Result<Self> {
        if page < 0 {
            return Err(Error::invalid_argument(
                "page",
                "page number cannot be negative",
            ));
        }

        if items_per_page <= 0 {
            return Err(Error::invalid_argument(
                "items_per_page",
                "number of items per page should be positive",
            ));
        }

        Ok(Self {
            page,
            items_per_page,
        })
    }

    pub const fn page(&self) -> i32 {
        self.page
    }

    pub const fn items_per_page(&self) -> i32 {
        self.items_per_page
    }

    pub fn skip(&self) -> Result<i32> {
        self.page
            .checked_mul(self.items_per_page)
            .ok_or(Error::Overflow {
                page: self.page,
                items_per_page: self.items_per_page,
            })
    }

    pub const fn long_skip(&self) -> i64 {
        self.page as i64 * self.items_per_page as i64
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::ALL_ELEMENTS
    }
}

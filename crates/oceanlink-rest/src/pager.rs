//! Fixed-window listing for array collections.
//!
//! The array pages collections with a `range=[start-end]` query. Exact
//! counts are not reliable for every resource, so [`Pager::fetch_all`] keeps
//! asking for the next window until one comes back short.

use std::future::Future;

use crate::codes::DEFAULT_PAGE_SIZE;

/// Half-open window `[start, end)` of a paged listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// First index, inclusive.
    pub start: usize,
    /// Last index, exclusive.
    pub end: usize,
}

impl PageWindow {
    /// Query fragment understood by the array, e.g. `range=[0-100]`.
    pub fn range_query(&self) -> String {
        format!("range=[{}-{}]", self.start, self.end)
    }

    /// Number of indices the window covers.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the window covers nothing.
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Fetches a collection window by window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
}

impl Pager {
    /// Creates a pager; a zero page size is raised to one.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    /// Items per window.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// The `index`-th window.
    pub fn window(&self, index: usize) -> PageWindow {
        let start = index * self.page_size;
        PageWindow {
            start,
            end: start + self.page_size,
        }
    }

    /// Call `fetch_page` for windows 0, 1, 2, ... and concatenate the
    /// results in fetch order, stopping after the first page holding fewer
    /// than `page_size` items. The first error aborts the walk.
    pub async fn fetch_all<T, E, F, Fut>(&self, mut fetch_page: F) -> Result<Vec<T>, E>
    where
        F: FnMut(PageWindow) -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        let mut items = Vec::new();
        let mut index = 0;
        loop {
            let page = fetch_page(self.window(index)).await?;
            let short = page.len() < self.page_size;
            items.extend(page);
            if short {
                break;
            }
            index += 1;
        }
        Ok(items)
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

//! Windowed page links for the listing.
//!
//! Pages near the current page are always linked, plus a small run at each
//! end. Anything elided in between collapses to a single [`PageLink::Gap`].

use serde::Serialize;

/// Pages linked on either side of the current page.
pub const INNER_WINDOW: usize = 4;
/// Pages linked beyond the first and before the last page.
pub const OUTER_WINDOW: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageLink {
    Previous { number: usize },
    Page { number: usize, current: bool },
    Gap,
    Next { number: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub current: usize,
    pub total_pages: usize,
}

impl Pagination {
    /// `current` is clamped into `1..=total_pages`.
    pub fn new(current: usize, total_pages: usize) -> Self {
        let total_pages = total_pages.max(1);
        Self {
            current: current.clamp(1, total_pages),
            total_pages,
        }
    }

    /// Nothing to render for a single page.
    pub fn is_needed(&self) -> bool {
        self.total_pages > 1
    }

    pub fn links(&self) -> Vec<PageLink> {
        let mut links = Vec::new();
        if !self.is_needed() {
            return links;
        }

        if self.current > 1 {
            links.push(PageLink::Previous {
                number: self.current - 1,
            });
        }

        let mut last_shown = 0;
        for number in self.visible_pages() {
            if number > last_shown + 1 {
                links.push(PageLink::Gap);
            }
            links.push(PageLink::Page {
                number,
                current: number == self.current,
            });
            last_shown = number;
        }

        if self.current < self.total_pages {
            links.push(PageLink::Next {
                number: self.current + 1,
            });
        }

        links
    }

    /// Page numbers that get a link, ascending.
    fn visible_pages(&self) -> Vec<usize> {
        let total = self.total_pages;

        // Keep the inner window full width by sliding it off the edges.
        let mut from = self.current as isize - INNER_WINDOW as isize;
        let mut to = self.current + INNER_WINDOW;
        if to > total {
            from -= (to - total) as isize;
            to = total;
        }
        let from = if from < 1 {
            to = (to + (1 - from) as usize).min(total);
            1
        } else {
            from as usize
        };

        let mut pages = Vec::new();

        if OUTER_WINDOW + 3 < from {
            pages.extend(1..=OUTER_WINDOW + 1);
        } else {
            pages.extend(1..from);
        }

        pages.extend(from..=to);

        if total.saturating_sub(OUTER_WINDOW + 2) > to {
            pages.extend(total - OUTER_WINDOW..=total);
        } else {
            pages.extend(to + 1..=total);
        }

        pages
    }
}

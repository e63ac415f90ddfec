//! Canonical page type and the adapters for each envelope version the
//! backend has shipped.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub total_items: u64,
    pub current_page: u32,
    pub total_pages: u32,
    pub page_size: u32,
}

impl Pagination {
    pub fn has_more(&self) -> bool {
        self.current_page < self.total_pages
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        self.pagination.has_more()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }

    /// Cuts one page out of a list the backend returned in full.
    /// Pages are 1-based; a page past the end is empty.
    pub fn from_full_list(all: &[T], page: u32, page_size: u32) -> Self
    where
        T: Clone,
    {
        let page_size = page_size.max(1);
        let page = page.max(1);
        let total_items = all.len() as u64;
        let total_pages = (all.len() as u32).div_ceil(page_size).max(1);
        let start = (page as usize - 1).saturating_mul(page_size as usize);
        let items = all
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect();
        Page {
            items,
            pagination: Pagination {
                total_items,
                current_page: page,
                total_pages,
                page_size,
            },
        }
    }
}

/// A wire envelope that can be turned into the canonical page.
pub trait Envelope<T>: DeserializeOwned {
    fn into_page(self) -> Page<T>;
}

/// `{ data: [...], pagination: { total_items, current_page, total_pages, page_size } }`
#[derive(Debug, Deserialize)]
pub struct CurrentEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T: DeserializeOwned> Envelope<T> for CurrentEnvelope<T> {
    fn into_page(self) -> Page<T> {
        Page {
            items: self.data,
            pagination: self.pagination,
        }
    }
}

/// Older shape: `{ data: [...], page, limit, total, totalPages }`.
#[derive(Debug, Deserialize)]
pub struct LegacyEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
}

impl<T: DeserializeOwned> Envelope<T> for LegacyEnvelope<T> {
    fn into_page(self) -> Page<T> {
        Page {
            items: self.data,
            pagination: Pagination {
                total_items: self.total,
                current_page: self.page,
                total_pages: self.total_pages,
                page_size: self.limit,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Number(u32),
    Ellipsis,
}

const MAX_VISIBLE_PAGES: u32 = 5;

/// Page numbers to show in a pager around `current`.
pub fn page_links(current: u32, total: u32) -> Vec<PageLink> {
    if total <= 1 {
        return Vec::new();
    }
    if total <= MAX_VISIBLE_PAGES {
        return (1..=total).map(PageLink::Number).collect();
    }

    let mut links = vec![PageLink::Number(1)];
    if current > 3 {
        links.push(PageLink::Ellipsis);
    }
    let start = current.saturating_sub(1).max(2);
    let end = (current + 1).min(total - 1);
    links.extend((start..=end).map(PageLink::Number));
    if current + 2 < total {
        links.push(PageLink::Ellipsis);
    }
    links.push(PageLink::Number(total));
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn both_envelopes_adapt_to_the_same_page() {
        let current: CurrentEnvelope<u32> = serde_json::from_value(json!({
            "data": [1, 2],
            "pagination": { "total_items": 12, "current_page": 1, "total_pages": 6, "page_size": 2 }
        }))
        .unwrap();
        let legacy: LegacyEnvelope<u32> = serde_json::from_value(json!({
            "data": [1, 2], "page": 1, "limit": 2, "total": 12, "totalPages": 6
        }))
        .unwrap();
        assert_eq!(current.into_page(), legacy.into_page());
    }

    #[test]
    fn has_more_compares_current_and_total() {
        let mut p = Pagination {
            total_items: 25,
            current_page: 1,
            total_pages: 2,
            page_size: 20,
        };
        assert!(p.has_more());
        p.current_page = 2;
        assert!(!p.has_more());
    }

    #[test]
    fn slices_a_full_list_into_pages() {
        let all: Vec<u32> = (1..=23).collect();
        let page = Page::from_full_list(&all, 3, 10);
        assert_eq!(page.items, vec![21, 22, 23]);
        assert_eq!(page.pagination.total_pages, 3);
        assert!(!page.has_more());

        let empty: Page<u32> = Page::from_full_list(&[], 1, 10);
        assert!(empty.items.is_empty());
        assert_eq!(empty.pagination.total_pages, 1);
    }

    #[test]
    fn huge_page_number_yields_an_empty_page() {
        let all: Vec<u32> = (1..=12).collect();
        let page = Page::from_full_list(&all, u32::MAX, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.pagination.current_page, u32::MAX);
        assert!(!page.has_more());
    }

    #[test]
    fn page_links_for_small_totals_show_everything() {
        assert!(page_links(1, 1).is_empty());
        assert_eq!(
            page_links(2, 3),
            vec![PageLink::Number(1), PageLink::Number(2), PageLink::Number(3)]
        );
    }

    #[test]
    fn page_links_collapse_with_ellipses() {
        use PageLink::*;
        assert_eq!(
            page_links(1, 10),
            vec![Number(1), Number(2), Ellipsis, Number(10)]
        );
        assert_eq!(
            page_links(5, 10),
            vec![Number(1), Ellipsis, Number(4), Number(5), Number(6), Ellipsis, Number(10)]
        );
        assert_eq!(
            page_links(10, 10),
            vec![Number(1), Ellipsis, Number(9), Number(10)]
        );
    }
}

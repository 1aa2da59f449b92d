// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::fmt;
use url::form_urlencoded;

pub const PAGE_PARAM: &str = "page";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub current_page: usize,
    pub page_size: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_size: crate::DEFAULT_FALLBACK_PAGE_SIZE,
        }
    }
}

/// The active page of a filtered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice<'a, T> {
    pub records: &'a [T],
    pub total_pages: usize,
    pub current_page: usize,
}

impl<T> PageSlice<'_, T> {
    /// Pagination controls are hidden when everything fits on one page.
    pub fn show_controls(&self) -> bool {
        self.total_pages > 1
    }
}

pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

pub fn clamp_page(requested: usize, total_pages: usize) -> usize {
    requested.clamp(1, total_pages.max(1))
}

pub fn paginate<T>(items: &[T], state: PageState) -> PageSlice<'_, T> {
    let page_size = state.page_size.max(1);
    let total_pages = total_pages(items.len(), page_size);
    let current_page = clamp_page(state.current_page, total_pages);
    let start = ((current_page - 1) * page_size).min(items.len());
    let end = (start + page_size).min(items.len());
    PageSlice {
        records: &items[start..end],
        total_pages,
        current_page,
    }
}

/// Reads a `page` query value. Anything that is not a positive integer is page 1.
pub fn parse_page_param(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

/// A list view's path plus its query parameters, in order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    path: String,
    params: Vec<(String, String)>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
        }
    }

    pub fn parse(raw: &str) -> Self {
        let (path, query) = raw.split_once('?').unwrap_or((raw, ""));
        let params = form_urlencoded::parse(query.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        Self {
            path: path.to_owned(),
            params,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_param(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.params.iter_mut().find(|(name, _)| name == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key.to_owned(), value)),
        }
    }

    pub fn page(&self) -> usize {
        parse_page_param(self.param(PAGE_PARAM))
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.set_param(PAGE_PARAM, page.max(1).to_string());
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if !self.params.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.params.iter())
                .finish();
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

/// Up to `width` page numbers centred on the current page.
pub fn page_window(current_page: usize, total_pages: usize, width: usize) -> Vec<usize> {
    let total = total_pages.max(1);
    let width = width.clamp(1, total);
    let current = clamp_page(current_page, total);
    let half = width / 2;
    let start = current.saturating_sub(half).max(1).min(total + 1 - width);
    (start..start + width).collect()
}

#[cfg(test)]
mod tests {
    use super::{
        Location, PageState, clamp_page, page_window, paginate, parse_page_param, total_pages,
    };

    #[test]
    fn empty_collection_has_one_empty_page() {
        let items: Vec<u32> = Vec::new();
        let page = paginate(
            &items,
            PageState {
                current_page: 3,
                page_size: 6,
            },
        );
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 1);
        assert!(page.records.is_empty());
        assert!(!page.show_controls());
    }

    #[test]
    fn out_of_range_page_clamps_to_last() {
        let items: Vec<u32> = (0..14).collect();
        let page = paginate(
            &items,
            PageState {
                current_page: 99,
                page_size: 6,
            },
        );
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 3);
        assert_eq!(page.records, &[12, 13]);

        let zero = paginate(
            &items,
            PageState {
                current_page: 0,
                page_size: 6,
            },
        );
        assert_eq!(zero.current_page, 1);
    }

    #[test]
    fn pages_partition_the_collection() {
        for len in 0..40usize {
            let items: Vec<usize> = (0..len).collect();
            for page_size in 1..9usize {
                let pages = total_pages(len, page_size);
                let mut seen = Vec::new();
                for current_page in 1..=pages {
                    let page = paginate(
                        &items,
                        PageState {
                            current_page,
                            page_size,
                        },
                    );
                    seen.extend_from_slice(page.records);
                }
                assert_eq!(seen, items, "len={len} page_size={page_size}");
            }
        }
    }

    #[test]
    fn zero_page_size_is_treated_as_one() {
        let items = [1, 2, 3];
        let page = paginate(
            &items,
            PageState {
                current_page: 2,
                page_size: 0,
            },
        );
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.records, &[2]);
    }

    #[test]
    fn clamp_page_bounds() {
        assert_eq!(clamp_page(0, 4), 1);
        assert_eq!(clamp_page(5, 4), 4);
        assert_eq!(clamp_page(2, 0), 1);
    }

    #[test]
    fn page_param_parsing_defaults_to_first_page() {
        assert_eq!(parse_page_param(None), 1);
        assert_eq!(parse_page_param(Some("abc")), 1);
        assert_eq!(parse_page_param(Some("0")), 1);
        assert_eq!(parse_page_param(Some("-2")), 1);
        assert_eq!(parse_page_param(Some("4")), 4);
    }

    #[test]
    fn location_keeps_other_params_when_page_changes() {
        let location = Location::parse("/projects?q=%D8%A2%DA%A9%D9%85%DB%8C&page=2");
        assert_eq!(location.path(), "/projects");
        assert_eq!(location.page(), 2);
        assert_eq!(location.param("q"), Some("آکمی"));

        let moved = location.with_page(5);
        assert_eq!(moved.page(), 5);
        assert_eq!(Location::parse(&moved.to_string()), moved);
    }

    #[test]
    fn bare_path_has_no_query() {
        let location = Location::parse("/workspaces");
        assert_eq!(location.page(), 1);
        assert_eq!(location.to_string(), "/workspaces");
        assert_eq!(location.with_page(3).to_string(), "/workspaces?page=3");
    }

    #[test]
    fn page_window_stays_in_bounds() {
        assert_eq!(page_window(1, 10, 5), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_window(6, 10, 5), vec![4, 5, 6, 7, 8]);
        assert_eq!(page_window(10, 10, 5), vec![6, 7, 8, 9, 10]);
        assert_eq!(page_window(2, 3, 5), vec![1, 2, 3]);
    }
}

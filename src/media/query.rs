//! Catalog listing queries
//!
//! Parses `?type=&category=&search=&page=&limit=` and pages through a catalog.

use serde::Serialize;

use super::catalog::{Catalog, MediaEntry};
use crate::http::encoding::decode_query_component;
use crate::http::mime::MediaKind;

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 500;

/// Filters and paging for the listing endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaQuery {
    pub kind: Option<MediaKind>,
    pub category: Option<String>,
    pub search: Option<String>,
    /// 1-based page number
    pub page: usize,
    pub limit: usize,
}

impl Default for MediaQuery {
    fn default() -> Self {
        Self {
            kind: None,
            category: None,
            search: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Paging summary returned with every listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

/// One page of listing results
#[derive(Debug, Serialize)]
pub struct MediaPage<'a> {
    pub media: Vec<&'a MediaEntry>,
    pub pagination: Pagination,
}

impl MediaQuery {
    /// Parse a raw query string; unknown keys and unparseable values are ignored
    pub fn from_query_string(query: Option<&str>) -> Self {
        let mut parsed = Self::default();
        let Some(query) = query else {
            return parsed;
        };

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = decode_query_component(value);
            if value.is_empty() {
                continue;
            }
            match key {
                "type" => parsed.kind = MediaKind::parse(&value),
                "category" => parsed.category = Some(value),
                "search" => parsed.search = Some(value),
                "page" => {
                    if let Ok(page) = value.parse::<usize>() {
                        parsed.page = page.max(1);
                    }
                }
                "limit" => {
                    if let Ok(limit) = value.parse::<usize>() {
                        parsed.limit = limit.clamp(1, MAX_PAGE_SIZE);
                    }
                }
                _ => {}
            }
        }
        parsed
    }

    /// Whether an entry passes every filter
    pub fn matches(&self, entry: &MediaEntry) -> bool {
        if self.kind.is_some_and(|kind| kind != entry.media_kind) {
            return false;
        }
        if let Some(category) = &self.category {
            if entry.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_name = entry.original_name.to_lowercase().contains(&needle);
            let in_category = entry
                .category
                .as_ref()
                .is_some_and(|c| c.to_lowercase().contains(&needle));
            if !in_name && !in_category {
                return false;
            }
        }
        true
    }

    /// Apply filters and paging to a catalog
    pub fn run<'a>(&self, catalog: &'a Catalog) -> MediaPage<'a> {
        let matching: Vec<&MediaEntry> = catalog.entries().filter(|e| self.matches(e)).collect();
        let total = matching.len();
        let offset = (self.page - 1).saturating_mul(self.limit);

        MediaPage {
            media: matching.into_iter().skip(offset).take(self.limit).collect(),
            pagination: Pagination {
                page: self.page,
                limit: self.limit,
                total,
                pages: total.div_ceil(self.limit),
            },
        }
    }
}

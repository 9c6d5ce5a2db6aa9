//! Paged collections and versioned list loads.
//!
//! Every list screen owns a `ListView`. Each load request takes a
//! `LoadTicket` stamped with a fresh version; when the response arrives it
//! is applied only if no newer load has been requested since, so a slow
//! page-3 response can never overwrite a faster page-4 one.

use tracing::debug;

use crate::api::QueryParams;
use crate::models::{Page, Record, ResourceKind};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

const SORT_BY: &str = "created_at";
const SORT_ORDER: &str = "desc";

/// Pages on each side of the current one that get a direct link.
const PAGE_WINDOW: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based
    pub page: u32,
    pub page_size: u32,
    pub search: String,
    pub parent_filter: String,
}

impl ListQuery {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            search: String::new(),
            parent_filter: String::new(),
        }
    }

    /// Query string for a list request. Search and the parent filter are
    /// only sent when non-empty; resources without a parent ignore it.
    pub fn to_params(&self, kind: ResourceKind) -> QueryParams {
        let params = QueryParams::new()
            .with("page", self.page)
            .with("size", self.page_size)
            .with("sort_by", SORT_BY)
            .with("sort_order", SORT_ORDER)
            .with("search", self.search.trim());

        match kind.parent_param() {
            Some(key) => params.with(key, self.parent_filter.trim()),
            None => params,
        }
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// One page of a resource list as last received from the server.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedCollection {
    pub items: Vec<Record>,
    /// Server-side count after search and parent filtering
    pub total: u64,
    pub query: ListQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page { number: u32, current: bool },
    Gap,
}

impl PagedCollection {
    pub fn empty(query: ListQuery) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            query,
        }
    }

    pub fn from_page(page: Page, query: ListQuery) -> Self {
        let total = page.total();
        let mut items = page.items;
        items.truncate(query.page_size as usize);
        Self {
            items,
            total,
            query,
        }
    }

    pub fn page(&self) -> u32 {
        self.query.page
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_pages(&self) -> u32 {
        let size = u64::from(self.query.page_size.max(1));
        self.total.div_ceil(size).min(u64::from(u32::MAX)) as u32
    }

    /// Display number of the `index`-th row on this page.
    pub fn row_number(&self, index: usize) -> u64 {
        u64::from(self.query.page.saturating_sub(1)) * u64::from(self.query.page_size)
            + index as u64
            + 1
    }

    pub fn has_previous(&self) -> bool {
        self.query.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.query.page < self.total_pages()
    }

    /// Pager links: first, last and the pages within two of the current
    /// one, with a gap marker three pages out. Empty when one page or less.
    pub fn page_window(&self) -> Vec<PageLink> {
        let total_pages = self.total_pages();
        if total_pages <= 1 {
            return Vec::new();
        }

        let current = self.query.page;
        let near = |n: u32| n + PAGE_WINDOW >= current && n <= current + PAGE_WINDOW;
        let gap = |n: u32| n + PAGE_WINDOW + 1 == current || n == current + PAGE_WINDOW + 1;

        (1..=total_pages)
            .filter_map(|n| {
                if n == 1 || n == total_pages || near(n) {
                    Some(PageLink::Page {
                        number: n,
                        current: n == current,
                    })
                } else if gap(n) {
                    Some(PageLink::Gap)
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Proof that a load was requested. Carries the query it was issued with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub kind: ResourceKind,
    pub version: u64,
    pub query: ListQuery,
}

/// The list screen state for one resource.
#[derive(Debug, Clone)]
pub struct ListView {
    kind: ResourceKind,
    /// Criteria the next load will use
    criteria: ListQuery,
    collection: PagedCollection,
    version: u64,
    loading: bool,
    error: Option<String>,
}

impl ListView {
    pub fn new(kind: ResourceKind, page_size: u32) -> Self {
        let criteria = ListQuery::new(page_size);
        Self {
            kind,
            collection: PagedCollection::empty(criteria.clone()),
            criteria,
            version: 0,
            loading: false,
            error: None,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn collection(&self) -> &PagedCollection {
        &self.collection
    }

    pub fn criteria(&self) -> &ListQuery {
        &self.criteria
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// New search text. The next load starts from page 1.
    pub fn set_search(&mut self, search: &str) {
        self.criteria.search = search.to_string();
        self.criteria.page = 1;
    }

    pub fn set_parent_filter(&mut self, parent: &str) {
        self.criteria.parent_filter = parent.to_string();
        self.criteria.page = 1;
    }

    /// Request `page` with the current criteria.
    pub fn begin(&mut self, page: u32) -> LoadTicket {
        self.criteria.page = page.max(1);
        self.version += 1;
        self.loading = true;
        debug!(kind = %self.kind, version = self.version, page = self.criteria.page, "List load requested");
        LoadTicket {
            kind: self.kind,
            version: self.version,
            query: self.criteria.clone(),
        }
    }

    /// Request the page currently on screen again.
    pub fn begin_reload(&mut self) -> LoadTicket {
        self.begin(self.criteria.page)
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.kind == self.kind && ticket.version == self.version
    }

    /// Replace the collection wholesale. Returns false for stale responses.
    pub fn apply(&mut self, ticket: &LoadTicket, page: Page) -> bool {
        if !self.is_current(ticket) {
            debug!(kind = %self.kind, stale = ticket.version, latest = self.version, "Discarding stale list response");
            return false;
        }
        self.collection = PagedCollection::from_page(page, ticket.query.clone());
        self.loading = false;
        self.error = None;
        true
    }

    /// Record a failed load. The previous collection stays on screen.
    pub fn fail(&mut self, ticket: &LoadTicket, message: impl Into<String>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.loading = false;
        self.error = Some(message.into());
        true
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn page_of(n: usize, total: u64) -> Page {
        Page {
            items: (0..n)
                .map(|i| Record::from(json!({"name": format!("item {}", i)})))
                .collect(),
            total: Some(total),
        }
    }

    fn link(number: u32, current: bool) -> PageLink {
        PageLink::Page { number, current }
    }

    fn collection(page: u32, total: u64) -> PagedCollection {
        let mut query = ListQuery::new(10);
        query.page = page;
        PagedCollection {
            items: Vec::new(),
            total,
            query,
        }
    }

    #[test]
    fn test_params_always_include_paging_and_sort() {
        let params = ListQuery::new(10).to_params(ResourceKind::Province);
        assert_eq!(params.get("page"), Some("1"));
        assert_eq!(params.get("size"), Some("10"));
        assert_eq!(params.get("sort_by"), Some("created_at"));
        assert_eq!(params.get("sort_order"), Some("desc"));
        assert_eq!(params.get("search"), None);
    }

    #[test]
    fn test_params_parent_key_per_kind() {
        let mut query = ListQuery::new(10);
        query.parent_filter = "5".to_string();
        query.search = "tab".to_string();

        let cities = query.to_params(ResourceKind::City);
        assert_eq!(cities.get("province_id"), Some("5"));
        assert_eq!(cities.get("search"), Some("tab"));

        let villages = query.to_params(ResourceKind::Village);
        assert_eq!(villages.get("city_id"), Some("5"));

        let provinces = query.to_params(ResourceKind::Province);
        assert_eq!(provinces.get("province_id"), None);
    }

    #[test]
    fn test_blank_search_is_omitted() {
        let mut query = ListQuery::new(10);
        query.search = "   ".to_string();
        assert_eq!(query.to_params(ResourceKind::City).get("search"), None);
    }

    #[test]
    fn test_row_numbers_continue_across_pages() {
        let c = collection(3, 40);
        assert_eq!(c.row_number(0), 21);
        assert_eq!(c.row_number(9), 30);
    }

    #[test]
    fn test_items_truncated_to_page_size() {
        let c = PagedCollection::from_page(page_of(15, 15), ListQuery::new(10));
        assert_eq!(c.items.len(), 10);
        assert_eq!(c.total, 15);
    }

    #[test]
    fn test_no_pager_for_single_page() {
        assert!(collection(1, 10).page_window().is_empty());
        assert!(collection(1, 0).page_window().is_empty());
        assert_eq!(collection(1, 11).total_pages(), 2);
    }

    #[test]
    fn test_page_window_with_gaps() {
        let window = collection(10, 200).page_window();
        assert_eq!(
            window,
            vec![
                link(1, false),
                PageLink::Gap,
                link(8, false),
                link(9, false),
                link(10, true),
                link(11, false),
                link(12, false),
                PageLink::Gap,
                link(20, false),
            ]
        );
    }

    #[test]
    fn test_page_window_near_start() {
        let window = collection(1, 100).page_window();
        assert_eq!(
            window,
            vec![
                link(1, true),
                link(2, false),
                link(3, false),
                PageLink::Gap,
                link(10, false),
            ]
        );
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut view = ListView::new(ResourceKind::Village, 10);
        let slow = view.begin(3);
        let fast = view.begin(4);

        assert!(view.apply(&fast, page_of(10, 50)));
        assert!(!view.apply(&slow, page_of(2, 50)));

        assert_eq!(view.collection().page(), 4);
        assert_eq!(view.collection().items.len(), 10);
        assert!(!view.is_loading());
    }

    #[test]
    fn test_stale_failure_is_ignored() {
        let mut view = ListView::new(ResourceKind::City, 10);
        let old = view.begin(1);
        let new = view.begin(2);

        assert!(!view.fail(&old, "timeout"));
        assert!(view.is_loading());
        assert!(view.error().is_none());

        assert!(view.fail(&new, "timeout"));
        assert_eq!(view.error(), Some("timeout"));
    }

    #[test]
    fn test_search_resets_to_first_page() {
        let mut view = ListView::new(ResourceKind::Province, 10);
        let ticket = view.begin(4);
        view.apply(&ticket, page_of(10, 100));

        view.set_search("gil");
        let ticket = view.begin_reload();
        assert_eq!(ticket.query.page, 1);
        assert_eq!(ticket.query.search, "gil");
    }

    #[test]
    fn test_empty_result_replaces_collection() {
        let mut view = ListView::new(ResourceKind::User, 10);
        let ticket = view.begin(1);
        view.apply(&ticket, page_of(3, 3));

        let ticket = view.begin(1);
        view.apply(&ticket, Page::default());
        assert!(view.collection().is_empty());
        assert_eq!(view.collection().total, 0);
    }
}

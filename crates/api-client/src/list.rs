//! Paged, sorted, searchable list retrieval
//!
//! `PagedList` turns caller-owned query state into one list request and writes
//! the result back. State lives in a `tokio::sync::watch` channel: callers read
//! it with `snapshot()` or the field accessors and can `subscribe()` to changes.
//!
//! Each `fetch_list()` call:
//! - clears the previous error
//! - takes a new generation number
//! - applies its result only if no newer call was issued in the meantime
//!
//! On failure the error message is set and items/total keep their last value.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, instrument};

use crate::gateway::ApiClient;
use crate::resource::Resource;

/// Message shown to users when a list could not be loaded
pub const FETCH_ERROR_MESSAGE: &str = "Daten konnten nicht geladen werden";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("sort direction must be asc or desc, got {other:?}")),
        }
    }
}

/// Initial query values for a list.
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub default_sort_by: String,
    pub default_sort_dir: SortDirection,
    pub default_page_size: u32,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            default_sort_by: "id".to_string(),
            default_sort_dir: SortDirection::Desc,
            default_page_size: 10,
        }
    }
}

/// Caller-controlled part of the list state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Free-text filter; omitted from the request when empty
    pub search: String,
    pub sort_by: String,
    pub sort_dir: SortDirection,
    /// 1-based
    pub page: u32,
    pub page_size: u32,
}

impl ListQuery {
    pub fn from_options(options: &ListOptions) -> Self {
        Self {
            search: String::new(),
            sort_by: options.default_sort_by.clone(),
            sort_dir: options.default_sort_dir,
            page: 1,
            page_size: options.default_page_size,
        }
    }

    /// Offset of the first row on the current page. Page 0 is treated as page 1.
    pub fn skip(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// Query parameters in wire order: search, order_by, order_dir, skip, limit.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(5);
        if !self.search.is_empty() {
            params.push(("search".to_string(), self.search.clone()));
        }
        params.push(("order_by".to_string(), self.sort_by.clone()));
        params.push(("order_dir".to_string(), self.sort_dir.as_str().to_string()));
        params.push(("skip".to_string(), self.skip().to_string()));
        params.push(("limit".to_string(), self.page_size.to_string()));
        params
    }
}

/// Wire body of a list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    /// Count of all matching rows, independent of page size
    pub total: u64,
}

/// Everything a caller can observe about a list.
#[derive(Debug, Clone)]
pub struct ListState<T> {
    pub query: ListQuery,
    pub items: Vec<T>,
    pub total: u64,
    /// User-facing message from the last failed fetch
    pub error: Option<String>,
}

/// What happened to the result of one `fetch_list()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Failed,
    /// A newer fetch was issued before this one resolved; result dropped.
    Stale,
}

/// Paged list bound to one endpoint.
pub struct PagedList<T = serde_json::Value> {
    client: ApiClient,
    endpoint: String,
    state: watch::Sender<ListState<T>>,
    issued: AtomicU64,
}

impl<T> PagedList<T>
where
    T: DeserializeOwned + Clone + Send + Sync,
{
    pub fn new(client: ApiClient, endpoint: impl Into<String>, options: ListOptions) -> Self {
        let initial = ListState {
            query: ListQuery::from_options(&options),
            items: Vec::new(),
            total: 0,
            error: None,
        };
        let (state, _) = watch::channel(initial);
        Self {
            client,
            endpoint: endpoint.into(),
            state,
            issued: AtomicU64::new(0),
        }
    }

    pub fn for_resource(client: ApiClient, resource: Resource, options: ListOptions) -> Self {
        Self::new(client, resource.path(), options)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState<T>> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ListState<T> {
        self.state.borrow().clone()
    }

    pub fn query(&self) -> ListQuery {
        self.state.borrow().query.clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.state.borrow().items.clone()
    }

    pub fn total(&self) -> u64 {
        self.state.borrow().total
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Mutate the query in place. Does not fetch.
    pub fn update_query<F>(&self, update: F)
    where
        F: FnOnce(&mut ListQuery),
    {
        self.state.send_modify(|state| update(&mut state.query));
    }

    pub fn set_search(&self, search: impl Into<String>) {
        let search = search.into();
        self.update_query(|q| q.search = search);
    }

    pub fn set_sort(&self, sort_by: impl Into<String>, sort_dir: SortDirection) {
        let sort_by = sort_by.into();
        self.update_query(|q| {
            q.sort_by = sort_by;
            q.sort_dir = sort_dir;
        });
    }

    pub fn set_page(&self, page: u32) {
        self.update_query(|q| q.page = page);
    }

    pub fn set_page_size(&self, page_size: u32) {
        self.update_query(|q| q.page_size = page_size);
    }

    /// Fetch the page described by the current query and apply the result.
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    pub async fn fetch_list(&self) -> FetchOutcome {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_if_modified(|state| state.error.take().is_some());
        let query = self.query();

        let result = self
            .client
            .get_json::<ListPage<T>>(&self.endpoint, query.to_params())
            .await;

        let mut outcome = FetchOutcome::Stale;
        let mut failure = None;
        self.state.send_if_modified(|state| {
            if self.issued.load(Ordering::SeqCst) != generation {
                return false;
            }
            match result {
                Ok(page) => {
                    state.items = page.items;
                    state.total = page.total;
                    outcome = FetchOutcome::Applied;
                }
                Err(e) => {
                    state.error = Some(FETCH_ERROR_MESSAGE.to_string());
                    failure = Some(e);
                    outcome = FetchOutcome::Failed;
                }
            }
            true
        });

        match (outcome, failure) {
            (FetchOutcome::Failed, Some(e)) => {
                error!(error = %e, page = query.page, "list fetch failed");
            }
            (FetchOutcome::Stale, _) => {
                debug!(generation, page = query.page, "discarding stale list response");
            }
            _ => {
                debug!(page = query.page, total = self.total(), "list updated");
            }
        }
        outcome
    }
}

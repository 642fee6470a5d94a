//! HTTP access to the inventory backend
//!
//! - `ApiClient` attaches the current bearer token to every request and ends
//!   the session when the backend answers 401
//! - `PagedList` drives search/sort/paging queries against list endpoints
//! - `Resource` names the collections the backend exposes

pub mod error;
pub mod gateway;
pub mod list;
pub mod metrics;
pub mod request;
pub mod resource;
#[cfg(test)]
mod test_server;

pub use error::{ApiError, Result};
pub use gateway::{ApiClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use list::{
    FETCH_ERROR_MESSAGE, FetchOutcome, ListOptions, ListPage, ListQuery, ListState, PagedList,
    SortDirection,
};
pub use request::RequestDescriptor;
pub use resource::Resource;

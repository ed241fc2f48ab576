//! Logical LMS operations.
//!
//! [`catalog`] is the static table binding each operation to a path, a
//! method, and whether its responses bypass the cache. [`LmsApi`] exposes
//! the table as typed calls through the [`FetchGateway`](crate::FetchGateway).

mod api;
pub mod catalog;

pub use api::LmsApi;
pub use catalog::{ENDPOINTS, Endpoint};

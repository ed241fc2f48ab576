//! Request gateway

mod builder;
mod fetch;
mod options;
mod refresher;

pub use builder::{BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, Satchel, SatchelBuilder};
pub use fetch::{FetchGateway, error_message};
pub use options::RequestOptions;
pub use refresher::HttpRefresher;

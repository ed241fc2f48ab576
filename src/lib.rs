//! Satchel - API access layer for the school LMS
//!
//! Every call to the LMS backend goes through a [`FetchGateway`], which
//! combines three pieces:
//!
//! - a [`CacheStore`] of prior responses with a fixed TTL and pattern
//!   invalidation,
//! - a [`RefreshCoordinator`] that turns any number of concurrent 401
//!   responses into exactly one token refresh,
//! - a [`PreloadQueue`] that warms the cache in the background without
//!   ever surfacing an error.
//!
//! [`LmsApi`] exposes the logical operations (login, current user, tests,
//! homework, ...) as typed calls over the gateway.
//!
//! # Example
//!
//! ```rust,no_run
//! use satchel::{LmsApi, PreloadConfig, PreloadQueue, Satchel};
//!
//! #[tokio::main]
//! async fn main() -> satchel::Result<()> {
//!     let gateway = Satchel::builder()
//!         .base_url("https://lms.example.org/api")
//!         .build()?;
//!
//!     let preload = PreloadQueue::new(gateway.clone(), PreloadConfig::default());
//!     let api = LmsApi::new(gateway);
//!
//!     api.login("ada@school.test", "hunter2").await?;
//!     preload.warm_defaults();
//!
//!     match api.get_current_user().await {
//!         Ok(me) => println!("{} ({:?})", me.data.name, me.data.role),
//!         Err(e) if e.is_unauthorized() => println!("please log in again"),
//!         Err(e) => return Err(e),
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cache;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod gateway;
pub mod preload;
pub mod telemetry;
pub mod types;
mod version;

pub use error::{Result, SatchelError};
pub use version::{PKG_VERSION, user_agent};

pub use auth::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, RefreshCoordinator,
    StoredCredential, TokenRefresher,
};
pub use cache::{CacheConfig, CacheStore, InvalidationPattern};
pub use config::Config;
pub use endpoints::{Endpoint, LmsApi};
pub use gateway::{FetchGateway, HttpRefresher, RequestOptions, Satchel, SatchelBuilder};
pub use preload::{Enqueued, PreloadConfig, PreloadQueue, fire_and_forget};

pub use types::{
    ApiResponse, Homework, LoginData, Role, Test, TestSubmission, TestSummary, User,
};

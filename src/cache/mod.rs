//! Response cache.
//!
//! [`CacheStore`] keeps prior response payloads keyed on
//! [`cache_key()`] (method + URL + JSON body) with a fixed time-to-live.
//! Expired entries are never swept eagerly: a lookup simply treats them as
//! absent and the next successful response overwrites them.
//!
//! Invalidation comes in three flavours:
//!
//! - [`CacheStore::invalidate()`]: a single key.
//! - [`CacheStore::invalidate_by_pattern()`]: every key containing one of
//!   the fragments of an [`InvalidationPattern`], or everything for
//!   [`InvalidationPattern::All`].
//! - [`CacheStore::clear()`]: logout and refresh failure.
//!
//! Entries are not scoped to the credential that fetched them. Switching
//! accounts without a [`clear()`](CacheStore::clear) can serve the previous
//! account's responses.

pub mod pattern;
pub mod store;

pub use pattern::{InvalidationPattern, is_user_resource};
pub use store::{CacheConfig, CacheEntry, CacheStore, DEFAULT_TTL, cache_key};

//! Request cache for API responses
//!
//! This module provides an in-memory store mapping each request URL to its last
//! successful response, plus a throttle map recording when each URL was last
//! fetched. Time comes from an injectable [`Clock`], and the whole cache can be
//! persisted between runs through a [`SnapshotStore`].

mod clock;
mod snapshot;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use snapshot::SnapshotStore;
pub use store::{CacheEntry, CacheSnapshot, RequestCache};

//! In-memory caching primitives shared by the feed fetcher, the CMS client
//! and the archive service.
//!
//! - [`TtlCache`] - key/value store where every entry carries its own TTL
//! - [`TieredCache`] - a short-lived tier for normal hits plus a long-lived
//!   tier that only serves as a fallback when upstream fails
//! - [`Clock`] - time source, swappable for [`ManualClock`] in tests
//!
//! Caches are process-local and unbounded. Expired entries are dropped
//! lazily on read or in bulk via [`TtlCache::cleanup`].

mod clock;
mod store;
mod tiered;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::TtlCache;
pub use tiered::TieredCache;

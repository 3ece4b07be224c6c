//! `integrador-cache` — keyed, TTL-based cache of remote read results.
//!
//! Reads for one key collapse into a single underlying fetch; writes
//! invalidate their declared keys lazily (the next read refetches). The
//! cache stores backend rows as JSON values; typed access lives in the
//! data layer on top.

pub mod cache;
pub mod key;
pub mod status;

pub use cache::QueryCache;
pub use key::QueryKey;
pub use status::{QueryResult, QueryStatus};

//! Persistent store and ephemeral cache behind the forum.
//!
//! Both are reached through traits so the API can run against Postgres and
//! Redis in production and against in-memory doubles in tests.

pub mod cache;
pub mod client;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
mod record;
pub mod store;

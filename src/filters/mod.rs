//! Result-rewriting layers sitting between a [`crate::chain::Chain`] and
//! its sources. Currently just the TTL-aware cache; other filters (rate
//! limiting, response rewriting) would live here as siblings.

pub mod cache;

//! TTL-based cache filter, grounded on `pymads.filters.cache.CacheFilter`:
//! a dict keyed by the packed question, holding the looked-up records and
//! the lookup time they were computed at. The Rust version stores the
//! already-computed earliest expiry instant instead of recomputing
//! `min(ttl)` against `datetime.now()` on every read.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::chain::{Filter, Query, Resolve};
use crate::error::DnsError;
use crate::record::Record;

struct Entry {
    records: Vec<Record>,
    earliest_expiry: Instant,
}

/// Caches a query's records until the earliest of their TTLs elapses.
/// Empty results are never cached. The mutex only ever guards the map
/// itself, never the resolve in between; two consumers racing on the same
/// miss can both call `next.resolve` and both insert, with the second
/// write winning. That's a tolerable stampede, not a correctness bug: the
/// map never observes a torn read or a partially-written entry.
pub struct CacheFilter {
    entries: Mutex<HashMap<Vec<u8>, Entry>>,
}

impl CacheFilter {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for CacheFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Filter for CacheFilter {
    async fn get(&self, query: &Query, next: &(dyn Resolve + Sync)) -> Result<Vec<Record>, DnsError> {
        let key = query.cache_key();
        let now = Instant::now();

        {
            let entries = self.entries.lock().expect("cache mutex poisoned");
            if let Some(entry) = entries.get(&key) {
                if now < entry.earliest_expiry {
                    return Ok(entry.records.clone());
                }
            }
        }

        let mut records = next.resolve(query).await?;
        if records.is_empty() {
            return Ok(records);
        }

        let earliest_expiry = records
            .iter()
            .map(|r| now + Duration::from_secs(r.ttl as u64))
            .min()
            .expect("records is non-empty");
        for record in &mut records {
            record.cached_expiry = Some(now + Duration::from_secs(record.ttl as u64));
        }

        self.entries.lock().expect("cache mutex poisoned").insert(
            key,
            Entry {
                records: records.clone(),
                earliest_expiry,
            },
        );
        Ok(records)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::enums::RecordClass;
    use crate::record::{DomainName, RData};
    use async_trait::async_trait;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSource {
        hits: Arc<AtomicUsize>,
        record: Record,
    }

    #[async_trait]
    impl Resolve for CountingSource {
        async fn resolve(&self, _query: &Query) -> Result<Vec<Record>, DnsError> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            Ok(vec![self.record.clone()])
        }
    }

    struct EmptySource;
    #[async_trait]
    impl Resolve for EmptySource {
        async fn resolve(&self, _query: &Query) -> Result<Vec<Record>, DnsError> {
            Ok(vec![])
        }
    }

    fn sample_query() -> Query {
        Query::new(DomainName::from("example.com"), 1, 1)
    }

    fn sample_record(ttl: u32) -> Record {
        Record::new(
            DomainName::from("example.com"),
            RecordClass::In,
            ttl,
            RData::A(Ipv4Addr::new(9, 9, 9, 9)),
        )
    }

    #[tokio::test]
    async fn second_lookup_within_ttl_hits_cache() {
        let hits = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            hits: hits.clone(),
            record: sample_record(1800),
        };
        let cache = CacheFilter::new();
        let query = sample_query();

        cache.get(&query, &source).await.unwrap();
        cache.get(&query, &source).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_results_are_never_cached() {
        let cache = CacheFilter::new();
        let query = sample_query();
        let first = cache.get(&query, &EmptySource).await.unwrap();
        assert!(first.is_empty());
        assert!(cache.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn expired_entry_triggers_a_fresh_lookup() {
        let hits = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            hits: hits.clone(),
            record: sample_record(0),
        };
        let cache = CacheFilter::new();
        let query = sample_query();

        cache.get(&query, &source).await.unwrap();
        // ttl=0 means earliest_expiry == now at insert time; any later
        // instant observes now >= earliest_expiry and recomputes.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        cache.get(&query, &source).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_lookups_never_corrupt_the_map() {
        let hits = Arc::new(AtomicUsize::new(0));
        let source = Arc::new(CountingSource {
            hits: hits.clone(),
            record: sample_record(1800),
        });
        let cache = Arc::new(CacheFilter::new());

        let mut tasks = Vec::new();
        for _ in 0..32 {
            let cache = cache.clone();
            let source = source.clone();
            tasks.push(tokio::spawn(async move {
                cache.get(&sample_query(), &*source).await.unwrap()
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            results.push(task.await.unwrap());
        }

        let expected = vec![sample_record(1800)];
        for result in &results {
            assert_eq!(result.len(), 1);
            assert_eq!(result[0].rdata, expected[0].rdata);
        }
        // every racer either hit or missed; the map settles on one entry
        assert_eq!(cache.entries.lock().unwrap().len(), 1);
        assert!(hits.load(Ordering::SeqCst) >= 1);
    }
}

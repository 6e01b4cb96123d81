//! Source + filter composition, grounded on `pymads.chain.Chain`: a plain
//! object holding a sources list and a filters list, composed at query
//! time rather than flattened into a fixed pipeline ahead of time.

use async_trait::async_trait;

use crate::enums::{RecordClass, RecordType};
use crate::error::DnsError;
use crate::record::{DomainName, Record};

/// The subset of a [`crate::packet::Request`] a source or filter needs:
/// name, qtype, qclass (spec section 4.5).
#[derive(Debug, Clone)]
pub struct Query {
    pub name: DomainName,
    pub qtype: u16,
    pub qclass: u16,
}

impl Query {
    pub fn new(name: DomainName, qtype: u16, qclass: u16) -> Self {
        Self {
            name,
            qtype,
            qclass,
        }
    }

    pub fn rtype(&self) -> RecordType {
        RecordType::from(self.qtype)
    }

    pub fn rclass(&self) -> RecordClass {
        RecordClass::from(self.qclass)
    }

    /// The cache fingerprint key from spec section 4.5: encoded question
    /// labels plus qtype and qclass.
    pub fn cache_key(&self) -> Vec<u8> {
        let mut key = self.name.encode();
        key.extend(self.qtype.to_be_bytes());
        key.extend(self.qclass.to_be_bytes());
        key
    }
}

/// Something that can turn a query into records: a source, a filter bound
/// to its next layer, or the raw union of a chain's sources.
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(&self, query: &Query) -> Result<Vec<Record>, DnsError>;
}

/// `get(query) → finite lazy sequence of Record` (spec section 4.5). Every
/// source is trivially a [`Resolve`].
#[async_trait]
pub trait Source: Send + Sync {
    async fn get(&self, query: &Query) -> Result<Vec<Record>, DnsError>;
}

#[async_trait]
impl<T: Source + ?Sized> Resolve for T {
    async fn resolve(&self, query: &Query) -> Result<Vec<Record>, DnsError> {
        self.get(query).await
    }
}

/// `get(query) → sequence of Record`, given access to the next-layer
/// source's `get` (spec section 4.5).
#[async_trait]
pub trait Filter: Send + Sync {
    async fn get(&self, query: &Query, next: &(dyn Resolve + Sync)) -> Result<Vec<Record>, DnsError>;
}

/// Concatenates `source.get(query)` for every source in declaration order
/// (spec section 4.6's "union over sources"). Duplicates across sources are
/// preserved; dedup is not this layer's job.
struct SourceUnion<'a>(&'a [Box<dyn Source>]);

#[async_trait]
impl Resolve for SourceUnion<'_> {
    async fn resolve(&self, query: &Query) -> Result<Vec<Record>, DnsError> {
        let mut out = Vec::new();
        for source in self.0 {
            out.extend(source.get(query).await?);
        }
        Ok(out)
    }
}

/// One link of the filter stack: `filters[0]` is the first element, so it
/// is applied outermost; its `next` is a `Layer` over the remaining
/// filters, terminating at `base` (the raw source union) once the slice is
/// exhausted — matching spec section 4.6's "filters[-1] sees the raw
/// union, filters[0] is outermost".
struct Layer<'a> {
    filters: &'a [Box<dyn Filter>],
    base: &'a (dyn Resolve + Sync),
}

#[async_trait]
impl Resolve for Layer<'_> {
    async fn resolve(&self, query: &Query) -> Result<Vec<Record>, DnsError> {
        match self.filters.split_first() {
            Some((head, rest)) => {
                let inner = Layer {
                    filters: rest,
                    base: self.base,
                };
                head.get(query, &inner).await
            }
            None => self.base.resolve(query).await,
        }
    }
}

/// `{ sources: [Source]; filters: [Filter] }` (spec section 3/4.6).
pub struct Chain {
    sources: Vec<Box<dyn Source>>,
    filters: Vec<Box<dyn Filter>>,
}

impl Chain {
    pub fn new(sources: Vec<Box<dyn Source>>, filters: Vec<Box<dyn Filter>>) -> Self {
        Self { sources, filters }
    }

    /// Materialize the sequence emitted by the outermost layer.
    pub async fn get(&self, query: &Query) -> Result<Vec<Record>, DnsError> {
        let union = SourceUnion(&self.sources);
        let layer = Layer {
            filters: &self.filters,
            base: &union,
        };
        layer.resolve(query).await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::record::RData;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedSource(Vec<Record>);

    #[async_trait]
    impl Source for FixedSource {
        async fn get(&self, _query: &Query) -> Result<Vec<Record>, DnsError> {
            Ok(self.0.clone())
        }
    }

    fn a_record(name: &str, octet: u8) -> Record {
        Record::new(
            DomainName::from(name),
            RecordClass::In,
            60,
            RData::A(Ipv4Addr::new(octet, octet, octet, octet)),
        )
    }

    fn query() -> Query {
        Query::new(DomainName::from("example.com"), 1, 1)
    }

    #[tokio::test]
    async fn chain_with_no_sources_is_empty() {
        let chain = Chain::new(vec![], vec![]);
        assert!(chain.get(&query()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sources_are_concatenated_in_declaration_order() {
        let a = a_record("example.com", 1);
        let b = a_record("example.com", 2);
        let chain = Chain::new(
            vec![
                Box::new(FixedSource(vec![a.clone()])),
                Box::new(FixedSource(vec![b.clone()])),
            ],
            vec![],
        );
        let records = chain.get(&query()).await.unwrap();
        assert_eq!(records, vec![a, b]);
    }

    struct CountingPassthroughFilter(Arc<AtomicUsize>);

    #[async_trait]
    impl Filter for CountingPassthroughFilter {
        async fn get(
            &self,
            query: &Query,
            next: &(dyn Resolve + Sync),
        ) -> Result<Vec<Record>, DnsError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            next.resolve(query).await
        }
    }

    #[tokio::test]
    async fn filters_see_declaration_order_outermost_first() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        struct TaggingFilter(&'static str, Arc<std::sync::Mutex<Vec<&'static str>>>);
        #[async_trait]
        impl Filter for TaggingFilter {
            async fn get(
                &self,
                query: &Query,
                next: &(dyn Resolve + Sync),
            ) -> Result<Vec<Record>, DnsError> {
                self.1.lock().unwrap().push(self.0);
                next.resolve(query).await
            }
        }

        let chain = Chain::new(
            vec![Box::new(FixedSource(vec![a_record("example.com", 9)]))],
            vec![
                Box::new(TaggingFilter("f0", order.clone())),
                Box::new(TaggingFilter("f1", order.clone())),
            ],
        );
        chain.get(&query()).await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["f0", "f1"]);
    }

    #[tokio::test]
    async fn passthrough_filter_does_not_change_results() {
        let counter = Arc::new(AtomicUsize::new(0));
        let chain = Chain::new(
            vec![Box::new(FixedSource(vec![a_record("example.com", 7)]))],
            vec![Box::new(CountingPassthroughFilter(counter.clone()))],
        );
        let records = chain.get(&query()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}

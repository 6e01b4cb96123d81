//! In-memory source, grounded on `pymads.sources.json.DictSource`'s plain
//! `dict`-of-records backing, but built directly from a `HashMap` rather
//! than parsed from JSON (see [`crate::sources::json`] for the loader that
//! feeds one of these).

use std::collections::HashMap;

use async_trait::async_trait;

use crate::chain::{Query, Source};
use crate::error::DnsError;
use crate::record::{DomainName, Record};

/// Maps `DomainName -> [Record]`. `get` never errors; a miss just yields no
/// records (spec section 4.5).
#[derive(Debug, Default, Clone)]
pub struct MapSource {
    records: HashMap<DomainName, Vec<Record>>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: HashMap<DomainName, Vec<Record>>) -> Self {
        Self { records }
    }

    pub fn insert(&mut self, name: DomainName, records: Vec<Record>) {
        self.records.entry(name).or_default().extend(records);
    }
}

#[async_trait]
impl Source for MapSource {
    async fn get(&self, query: &Query) -> Result<Vec<Record>, DnsError> {
        Ok(self.records.get(&query.name).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::enums::RecordClass;
    use crate::record::RData;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn returns_stored_records_for_exact_name() {
        let mut source = MapSource::new();
        let record = Record::new(
            DomainName::from("example.com"),
            RecordClass::In,
            60,
            RData::A(Ipv4Addr::new(1, 2, 3, 4)),
        );
        source.insert(DomainName::from("example.com"), vec![record.clone()]);

        let query = Query::new(DomainName::from("Example.COM"), 1, 1);
        assert_eq!(source.get(&query).await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn miss_returns_empty_without_error() {
        let source = MapSource::new();
        let query = Query::new(DomainName::from("sushi.org"), 1, 1);
        assert!(source.get(&query).await.unwrap().is_empty());
    }
}

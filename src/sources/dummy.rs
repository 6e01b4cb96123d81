//! A canned-response source used only by tests (spec section 4.5).

use async_trait::async_trait;

use crate::chain::{Query, Source};
use crate::error::DnsError;
use crate::record::Record;

/// Always returns the same fixed record list, regardless of the query.
pub struct DummyDnsSource {
    records: Vec<Record>,
}

impl DummyDnsSource {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl Source for DummyDnsSource {
    async fn get(&self, _query: &Query) -> Result<Vec<Record>, DnsError> {
        Ok(self.records.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::enums::RecordClass;
    use crate::record::{DomainName, RData};
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn always_returns_the_canned_records() {
        let record = Record::new(
            DomainName::from("example.com"),
            RecordClass::In,
            60,
            RData::A(Ipv4Addr::new(1, 1, 1, 1)),
        );
        let source = DummyDnsSource::new(vec![record.clone()]);
        let query = Query::new(DomainName::from("anything.invalid"), 1, 1);
        assert_eq!(source.get(&query).await.unwrap(), vec![record]);
    }
}

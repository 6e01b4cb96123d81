//! The JSON record loader from spec section 6, grounded on
//! `pymads.sources.json.JSONSource`: read a `{ domain: [records] }` object,
//! fill in the domain name from the containing key when a record omits it,
//! and build a [`MapSource`] from the result.
//!
//! This is explicitly "thin" per spec section 1 (an example loader, not a
//! general configuration mechanism): it supports the record shapes needed
//! to exercise A/AAAA/NS/CNAME/TXT zones and leaves SOA/opaque data to
//! callers who construct a [`MapSource`] directly.

use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::chain::{Query, Source};
use crate::enums::RecordClass;
use crate::error::DnsError;
use crate::record::{DomainName, RData, Record};
use crate::sources::map::MapSource;

#[derive(Debug, Deserialize)]
struct JsonRecord {
    rdata: String,
    #[serde(default = "default_rtype")]
    rtype: String,
    #[serde(default = "default_rttl")]
    rttl: u32,
    #[serde(default = "default_rclass")]
    rclass: String,
    /// Filled from the containing key when absent, matching
    /// `JSONSource.toRecord`'s `record['domain_name'] = fallback_domain`.
    domain_name: Option<String>,
}

fn default_rtype() -> String {
    "A".to_string()
}
fn default_rttl() -> u32 {
    1800
}
fn default_rclass() -> String {
    "IN".to_string()
}

/// A [`MapSource`] loaded from the spec section 6 JSON zone format.
#[derive(Debug, Clone)]
pub struct JsonSource(MapSource);

impl JsonSource {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DnsError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| DnsError::FormErr(format!("reading JSON zone file: {e}")))?;
        Self::from_str(&data)
    }

    pub fn from_str(data: &str) -> Result<Self, DnsError> {
        let raw: HashMap<String, Vec<JsonRecord>> = serde_json::from_str(data)
            .map_err(|e| DnsError::FormErr(format!("parsing JSON zone file: {e}")))?;

        let mut map = MapSource::new();
        for (key, json_records) in raw {
            let mut records = Vec::with_capacity(json_records.len());
            for jr in json_records {
                let domain = jr.domain_name.as_deref().unwrap_or(&key);
                records.push(to_record(domain, jr)?);
            }
            let name = DomainName::from(key.as_str());
            map.insert(name, records);
        }
        Ok(Self(map))
    }

    pub fn into_map_source(self) -> MapSource {
        self.0
    }
}

fn to_record(domain: &str, jr: JsonRecord) -> Result<Record, DnsError> {
    let rclass = match jr.rclass.as_str() {
        "IN" | "INTERNET" => RecordClass::In,
        other => {
            return Err(DnsError::FormErr(format!(
                "unsupported record class in JSON zone: {other}"
            )))
        }
    };

    let rdata = match jr.rtype.as_str() {
        "A" => {
            let addr: Ipv4Addr = jr
                .rdata
                .parse()
                .map_err(|_| DnsError::FormErr("invalid A rdata in JSON zone"))?;
            RData::A(addr)
        }
        "AAAA" => {
            let addr: Ipv6Addr = jr
                .rdata
                .parse()
                .map_err(|_| DnsError::FormErr("invalid AAAA rdata in JSON zone"))?;
            RData::Aaaa(addr)
        }
        "NS" => RData::Ns(DomainName::from(jr.rdata.as_str())),
        "CNAME" => RData::Cname(DomainName::from(jr.rdata.as_str())),
        "TXT" => RData::Txt(jr.rdata.into_bytes()),
        other => {
            return Err(DnsError::FormErr(format!(
                "unsupported record type in JSON zone: {other}"
            )))
        }
    };

    Ok(Record::new(DomainName::from(domain), rclass, jr.rttl, rdata))
}

#[async_trait]
impl Source for JsonSource {
    async fn get(&self, query: &Query) -> Result<Vec<Record>, DnsError> {
        self.0.get(query).await
    }
}

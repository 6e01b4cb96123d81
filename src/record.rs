//! A typed DNS resource record plus its name and rdata encode/decode.
//!
//! The record type dispatch and the convention of storing rdata already
//! split into typed fields (rather than re-parsing raw bytes on every
//! access) follows `goatns::resourcerecord::InternalResourceRecord`; the
//! `DomainName` wrapper mirrors `goatns::resourcerecord::DomainName`, with
//! labels instead of a flat string so case-normalization and compression
//! both operate on the same representation as [`crate::wire`].

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::enums::{RecordClass, RecordType};
use crate::error::DnsError;
use crate::wire;

/// An ordered sequence of labels, normalized to lower-case ASCII at
/// construction so comparison and hashing are case-insensitive by
/// construction rather than by a custom `Eq`/`Hash` impl.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainName {
    labels: Vec<String>,
}

impl DomainName {
    pub fn from_labels(labels: Vec<String>) -> Self {
        Self {
            labels: labels.into_iter().map(|l| l.to_ascii_lowercase()).collect(),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn encode(&self) -> Vec<u8> {
        wire::encode_labels(&self.labels)
    }

    /// Decode a name at `offset`, following compression pointers against the
    /// whole packet `buffer` as spec section 4.1 requires for domain-bearing
    /// rdata (NS/CNAME) as well as the question name.
    pub fn decode(buffer: &[u8], offset: usize) -> Result<(usize, Self), DnsError> {
        let (end, labels) = wire::decode_labels(buffer, offset)?;
        Ok((end, Self::from_labels(labels)))
    }
}

impl From<&str> for DomainName {
    fn from(input: &str) -> Self {
        let labels = input
            .trim_end_matches('.')
            .split('.')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self::from_labels(labels)
    }
}

impl std::fmt::Display for DomainName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.labels.join("."))
    }
}

/// The SOA rdata's seven fields, per spec section 3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoaData {
    pub mname: DomainName,
    pub rname: DomainName,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

/// Rdata, typed per the record type's own encode/decode rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Ns(DomainName),
    Cname(DomainName),
    Soa(Box<SoaData>),
    Txt(Vec<u8>),
    /// Raw bytes for any rtype this core doesn't special-case, tagged with
    /// the wire rtype value it was decoded under so re-encoding round-trips.
    Opaque(u16, Vec<u8>),
}

impl RData {
    pub fn record_type(&self) -> RecordType {
        match self {
            RData::A(_) => RecordType::A,
            RData::Aaaa(_) => RecordType::AAAA,
            RData::Ns(_) => RecordType::NS,
            RData::Cname(_) => RecordType::CNAME,
            RData::Soa(_) => RecordType::SOA,
            RData::Txt(_) => RecordType::TXT,
            RData::Opaque(rtype, _) => RecordType::Opaque(*rtype),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            RData::A(addr) => addr.octets().to_vec(),
            RData::Aaaa(addr) => addr.octets().to_vec(),
            RData::Ns(name) | RData::Cname(name) => name.encode(),
            RData::Soa(soa) => {
                let mut out = soa.mname.encode();
                out.extend(soa.rname.encode());
                out.extend(soa.serial.to_be_bytes());
                out.extend(soa.refresh.to_be_bytes());
                out.extend(soa.retry.to_be_bytes());
                out.extend(soa.expire.to_be_bytes());
                out.extend(soa.minimum.to_be_bytes());
                out
            }
            RData::Txt(bytes) => bytes.clone(),
            RData::Opaque(_, bytes) => bytes.clone(),
        }
    }

    /// Decode rdata of `rtype` occupying `rdlength` bytes starting at
    /// `offset` in the full packet `buffer` (needed so NS/CNAME/SOA rdata
    /// can resolve compression pointers against the whole packet, not just
    /// the rdata slice).
    pub fn decode(
        buffer: &[u8],
        offset: usize,
        rdlength: usize,
        rtype: RecordType,
    ) -> Result<Self, DnsError> {
        let rdata = buffer
            .get(offset..offset + rdlength)
            .ok_or_else(|| DnsError::FormErr("rdata runs past end of packet"))?;

        match rtype {
            RecordType::A => {
                if rdata.len() != 4 {
                    return Err(DnsError::FormErr("A rdata must be 4 bytes"));
                }
                Ok(RData::A(Ipv4Addr::new(rdata[0], rdata[1], rdata[2], rdata[3])))
            }
            RecordType::AAAA => {
                if rdata.len() != 16 {
                    return Err(DnsError::FormErr("AAAA rdata must be 16 bytes"));
                }
                let octets: [u8; 16] = rdata.try_into().expect("length checked above");
                Ok(RData::Aaaa(Ipv6Addr::from(octets)))
            }
            RecordType::NS => {
                let (_, name) = DomainName::decode(buffer, offset)?;
                Ok(RData::Ns(name))
            }
            RecordType::CNAME => {
                let (_, name) = DomainName::decode(buffer, offset)?;
                Ok(RData::Cname(name))
            }
            RecordType::SOA => {
                let (after_mname, mname) = DomainName::decode(buffer, offset)?;
                let (after_rname, rname) = DomainName::decode(buffer, after_mname)?;
                let serial = wire::read_u32(buffer, after_rname)?;
                let refresh = wire::read_u32(buffer, after_rname + 4)?;
                let retry = wire::read_u32(buffer, after_rname + 8)?;
                let expire = wire::read_u32(buffer, after_rname + 12)?;
                let minimum = wire::read_u32(buffer, after_rname + 16)?;
                Ok(RData::Soa(Box::new(SoaData {
                    mname,
                    rname,
                    serial,
                    refresh,
                    retry,
                    expire,
                    minimum,
                })))
            }
            RecordType::TXT => Ok(RData::Txt(rdata.to_vec())),
            RecordType::Opaque(code) => Ok(RData::Opaque(code, rdata.to_vec())),
        }
    }
}

/// A resource record as carried in answer/authority/additional sections.
///
/// `cached_expiry` is deliberately excluded from `PartialEq`/`Eq`/`Hash`: it
/// is cache bookkeeping stamped by [`crate::filters::cache::CacheFilter`],
/// not part of a record's identity (spec section 3).
#[derive(Debug, Clone)]
pub struct Record {
    pub name: DomainName,
    pub rclass: RecordClass,
    pub ttl: u32,
    pub rdata: RData,
    pub cached_expiry: Option<std::time::Instant>,
}

impl Record {
    pub fn new(name: DomainName, rclass: RecordClass, ttl: u32, rdata: RData) -> Self {
        Self {
            name,
            rclass,
            ttl,
            rdata,
            cached_expiry: None,
        }
    }

    pub fn rtype(&self) -> RecordType {
        self.rdata.record_type()
    }

    /// Encode name, rtype, rclass, ttl, rdlength, rdata per spec section 4.1.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.name.encode();
        let rdata = self.rdata.encode();
        out.extend(self.rtype().value().to_be_bytes());
        out.extend(self.rclass.value().to_be_bytes());
        out.extend(self.ttl.to_be_bytes());
        out.extend((rdata.len() as u16).to_be_bytes());
        out.extend(rdata);
        out
    }

    pub fn decode(buffer: &[u8], offset: usize) -> Result<(usize, Self), DnsError> {
        let (after_name, name) = DomainName::decode(buffer, offset)?;
        let rtype = RecordType::from(wire::read_u16(buffer, after_name)?);
        let rclass = RecordClass::from(wire::read_u16(buffer, after_name + 2)?);
        let ttl = wire::read_u32(buffer, after_name + 4)?;
        let rdlength = wire::read_u16(buffer, after_name + 8)? as usize;
        let rdata_offset = after_name + 10;
        let rdata = RData::decode(buffer, rdata_offset, rdlength, rtype)?;
        Ok((
            rdata_offset + rdlength,
            Record::new(name, rclass, ttl, rdata),
        ))
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.rclass == other.rclass
            && self.ttl == other.ttl
            && self.rdata == other.rdata
    }
}
impl Eq for Record {}

//! Resource record type/class and header opcode/rcode enumerations.
//!
//! Trimmed from `goatns::enums`'s much larger RFC-coverage table down to the
//! handful of variants this core actually dispatches on, plus the
//! `Opaque(u16)` catch-all spec section 3 calls for instead of enumerating
//! every rarely-seen RR type.

use std::fmt;

/// RR type, dispatching rdata encode/decode in [`crate::record`].
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    NS,
    CNAME,
    SOA,
    AAAA,
    TXT,
    /// Any RR type this core doesn't special-case, carried by its raw u16
    /// value so it still round-trips through encode/decode.
    Opaque(u16),
}

impl RecordType {
    pub fn value(self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::CNAME => 5,
            RecordType::SOA => 6,
            RecordType::TXT => 16,
            RecordType::AAAA => 28,
            RecordType::Opaque(v) => v,
        }
    }
}

impl From<u16> for RecordType {
    fn from(value: u16) -> Self {
        match value {
            1 => RecordType::A,
            2 => RecordType::NS,
            5 => RecordType::CNAME,
            6 => RecordType::SOA,
            16 => RecordType::TXT,
            28 => RecordType::AAAA,
            other => RecordType::Opaque(other),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::A => write!(f, "A"),
            RecordType::NS => write!(f, "NS"),
            RecordType::CNAME => write!(f, "CNAME"),
            RecordType::SOA => write!(f, "SOA"),
            RecordType::TXT => write!(f, "TXT"),
            RecordType::AAAA => write!(f, "AAAA"),
            RecordType::Opaque(v) => write!(f, "TYPE{v}"),
        }
    }
}

/// RR class. Only `IN` is meaningful to this core; any other class on a
/// query is rejected with FORMERR per spec section 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordClass {
    In,
    Other(u16),
}

impl RecordClass {
    pub const IN_VALUE: u16 = 1;

    pub fn value(self) -> u16 {
        match self {
            RecordClass::In => Self::IN_VALUE,
            RecordClass::Other(v) => v,
        }
    }

    pub fn is_in(self) -> bool {
        matches!(self, RecordClass::In)
    }
}

impl From<u16> for RecordClass {
    fn from(value: u16) -> Self {
        match value {
            Self::IN_VALUE => RecordClass::In,
            other => RecordClass::Other(other),
        }
    }
}

/// The header's 4-bit opcode field. Only `Query` is accepted by
/// [`crate::packet::Request::decode`]; anything else is FORMERR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Query,
    Other(u8),
}

impl OpCode {
    pub fn value(self) -> u8 {
        match self {
            OpCode::Query => 0,
            OpCode::Other(v) => v,
        }
    }
}

impl From<u8> for OpCode {
    fn from(value: u8) -> Self {
        match value {
            0 => OpCode::Query,
            other => OpCode::Other(other),
        }
    }
}

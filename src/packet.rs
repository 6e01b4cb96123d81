//! The header+question container (`Packet`), and `Request`/`Response`, the
//! validated views spec sections 4.2/4.3 build on top of it.
//!
//! `goatns::Header` packs its flags with a `packed_struct` per-field derive.
//! That can't express the generic `get_flag(pos, mask)`/`set_flag(pos, mask,
//! v)` contract this core needs (property P4 probes arbitrary `(pos,
//! width)` pairs), so flags here live in one raw `u16` with hand-rolled bit
//! accessors instead — closer to the manual `(byte & mask) >> shift`
//! twiddling `goatns`'s own header parsing used before it grew the
//! `packed_struct` dependency.

use crate::enums::{OpCode, RecordClass};
use crate::error::DnsError;
use crate::record::{DomainName, Record};
use crate::wire;

pub mod flag {
    pub const QR: (u16, u16) = (15, 0b1);
    pub const OPCODE: (u16, u16) = (11, 0b1111);
    pub const AA: (u16, u16) = (10, 0b1);
    pub const TC: (u16, u16) = (9, 0b1);
    pub const RD: (u16, u16) = (8, 0b1);
    pub const RA: (u16, u16) = (7, 0b1);
    pub const Z: (u16, u16) = (4, 0b111);
    pub const RCODE: (u16, u16) = (0, 0b1111);
}

/// Header + question + three record sections. `flags` is touched only
/// through [`Packet::get_flag`]/[`Packet::set_flag`].
#[derive(Debug, Clone)]
pub struct Packet {
    pub qid: u16,
    flags: u16,
    pub question: DomainName,
    pub qtype: u16,
    pub qclass: u16,
    pub answers: Vec<Record>,
    pub authority: Vec<Record>,
    pub additional: Vec<Record>,
}

impl Packet {
    pub fn new(qid: u16, question: DomainName, qtype: u16, qclass: u16) -> Self {
        Self {
            qid,
            flags: 0,
            question,
            qtype,
            qclass,
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    /// `(flags >> pos) & mask`.
    pub fn get_flag(&self, (pos, mask): (u16, u16)) -> u16 {
        (self.flags >> pos) & mask
    }

    /// `flags = (flags & !(mask << pos)) | ((v & mask) << pos)`. Bits
    /// outside `mask` at `pos` are left untouched.
    pub fn set_flag(&mut self, (pos, mask): (u16, u16), v: u16) {
        self.flags = (self.flags & !(mask << pos)) | ((v & mask) << pos);
    }

    pub fn qr(&self) -> bool {
        self.get_flag(flag::QR) != 0
    }
    pub fn opcode(&self) -> OpCode {
        OpCode::from(self.get_flag(flag::OPCODE) as u8)
    }
    pub fn aa(&self) -> bool {
        self.get_flag(flag::AA) != 0
    }
    pub fn rd(&self) -> bool {
        self.get_flag(flag::RD) != 0
    }
    pub fn rcode(&self) -> u16 {
        self.get_flag(flag::RCODE)
    }

    pub fn set_qr(&mut self, v: bool) {
        self.set_flag(flag::QR, v as u16);
    }
    pub fn set_opcode(&mut self, op: OpCode) {
        self.set_flag(flag::OPCODE, op.value() as u16);
    }
    pub fn set_aa(&mut self, v: bool) {
        self.set_flag(flag::AA, v as u16);
    }
    pub fn set_tc(&mut self, v: bool) {
        self.set_flag(flag::TC, v as u16);
    }
    pub fn set_rd(&mut self, v: bool) {
        self.set_flag(flag::RD, v as u16);
    }
    pub fn set_ra(&mut self, v: bool) {
        self.set_flag(flag::RA, v as u16);
    }
    pub fn set_rcode(&mut self, rcode: u16) {
        self.set_flag(flag::RCODE, rcode);
    }

    /// 12-byte header, question section, then answer/authority/additional
    /// records. When `rcode != 0`, authority and additional are dropped per
    /// spec section 3's emit invariant.
    pub fn encode(&self) -> Vec<u8> {
        let drop_extra = self.rcode() != 0;
        let ancount = self.answers.len() as u16;
        let nscount = if drop_extra { 0 } else { self.authority.len() as u16 };
        let arcount = if drop_extra { 0 } else { self.additional.len() as u16 };

        let mut out = Vec::with_capacity(crate::HEADER_BYTES + 16);
        out.extend(self.qid.to_be_bytes());
        out.extend(self.flags.to_be_bytes());
        out.extend(1u16.to_be_bytes()); // qdcount
        out.extend(ancount.to_be_bytes());
        out.extend(nscount.to_be_bytes());
        out.extend(arcount.to_be_bytes());

        out.extend(self.question.encode());
        out.extend(self.qtype.to_be_bytes());
        out.extend(self.qclass.to_be_bytes());

        for rec in &self.answers {
            out.extend(rec.encode());
        }
        if !drop_extra {
            for rec in &self.authority {
                out.extend(rec.encode());
            }
            for rec in &self.additional {
                out.extend(rec.encode());
            }
        }
        out
    }

    /// Parse header, question, and all three record sections. Records whose
    /// rtype is NS are placed in `authority`; everything else goes to
    /// `answers` (spec section 3's "Answer vs authority split"). A
    /// non-`IN` qclass is FORMERR.
    pub fn decode(buffer: &[u8]) -> Result<Self, DnsError> {
        if buffer.len() < crate::HEADER_BYTES {
            return Err(DnsError::FormErr("packet shorter than header"));
        }
        let qid = wire::read_u16(buffer, 0)?;
        let flags = wire::read_u16(buffer, 2)?;
        let qdcount = wire::read_u16(buffer, 4)?;
        let ancount = wire::read_u16(buffer, 6)?;
        let nscount = wire::read_u16(buffer, 8)?;
        let arcount = wire::read_u16(buffer, 10)?;

        if qdcount == 0 {
            return Err(DnsError::FormErr("qdcount must be nonzero"));
        }

        let (after_question, question) = DomainName::decode(buffer, crate::HEADER_BYTES)?;
        let qtype = wire::read_u16(buffer, after_question)?;
        let qclass = wire::read_u16(buffer, after_question + 2)?;

        if !RecordClass::from(qclass).is_in() {
            return Err(DnsError::FormErr("qclass must be IN"));
        }

        let mut offset = after_question + 4;
        let mut answers = Vec::new();
        let mut authority = Vec::new();
        let additional = Vec::new();

        let total_records = ancount as usize + nscount as usize + arcount as usize;
        for _ in 0..total_records {
            let (next_offset, record) = Record::decode(buffer, offset)?;
            offset = next_offset;
            if record.rtype() == crate::enums::RecordType::NS {
                authority.push(record);
            } else {
                answers.push(record);
            }
        }

        Ok(Self {
            qid,
            flags,
            question,
            qtype,
            qclass,
            answers,
            authority,
            additional,
        })
    }
}

/// A validated inbound query: `qr=0`, `opcode=0`, `qdcount>0` (spec section
/// 3's "Request").
#[derive(Debug, Clone)]
pub struct Request(pub Packet);

impl Request {
    pub fn decode(buffer: &[u8]) -> Result<Self, DnsError> {
        let packet = Packet::decode(buffer)?;
        if packet.qr() {
            return Err(DnsError::FormErr("qr bit set on a request"));
        }
        if packet.opcode() != OpCode::Query {
            return Err(DnsError::FormErr("unsupported opcode"));
        }
        Ok(Self(packet))
    }
}

/// A response built from a [`Request`], an rcode, and a record list, per
/// spec section 4.3.
pub struct Response;

impl Response {
    /// `qr=1`, `aa=1`, `opcode=0`, `rcode` as supplied; qid/question/qtype/
    /// qclass inherited from `req`. Records with rtype NS go to authority,
    /// everything else to answers.
    pub fn build(req: &Request, rcode: u16, records: Vec<Record>) -> Packet {
        let r = &req.0;
        let mut packet = Packet::new(r.qid, r.question.clone(), r.qtype, r.qclass);
        packet.set_qr(true);
        packet.set_opcode(OpCode::Query);
        packet.set_aa(true);
        packet.set_rd(r.rd());
        packet.set_ra(false);
        packet.set_rcode(rcode);

        for record in records {
            if record.rtype() == crate::enums::RecordType::NS {
                packet.authority.push(record);
            } else {
                packet.answers.push(record);
            }
        }
        packet
    }
}

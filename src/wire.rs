//! Label and packed-integer primitives for the RFC 1035 wire format.
//!
//! Decompression follows the jump-counter technique common to hand-rolled
//! DNS parsers: a label length byte with its top two bits set is a
//! back-pointer, and we bound the number of pointer hops we'll follow so a
//! packet can't walk us into an infinite loop.

use crate::error::DnsError;

/// Maximum number of compression-pointer hops [`decode_labels`] will follow
/// before giving up. RFC 1035 packets are capped at 512 bytes; 16 hops is
/// generous.
const MAX_POINTER_JUMPS: usize = 16;

/// Encode a lower-cased label sequence as `len || bytes` pairs terminated by
/// a zero-length label. Labels must already satisfy the 1..=63 length
/// invariant; callers (namely [`crate::record::DomainName`]) enforce this at
/// construction.
pub fn encode_labels(labels: &[String]) -> Vec<u8> {
    let mut out = Vec::new();
    for label in labels {
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    out
}

/// Decode a label sequence starting at `offset` in `buffer`, following
/// compression pointers as needed. Returns the offset just past the
/// terminating zero label (or just past the two-byte pointer that ended the
/// run of labels) together with the decoded, lower-cased labels.
pub fn decode_labels(buffer: &[u8], offset: usize) -> Result<(usize, Vec<String>), DnsError> {
    let mut labels = Vec::new();
    let mut pos = offset;
    let mut jumps = 0usize;
    let mut end_offset: Option<usize> = None;

    loop {
        let len = *buffer
            .get(pos)
            .ok_or_else(|| DnsError::FormErr("label length byte past end of packet"))? as usize;

        if len == 0 {
            let terminal = pos + 1;
            return Ok((end_offset.unwrap_or(terminal), labels));
        }

        if len & 0xC0 == 0xC0 {
            if jumps >= MAX_POINTER_JUMPS {
                return Err(DnsError::FormErr("too many compression pointer hops"));
            }
            let b2 = *buffer
                .get(pos + 1)
                .ok_or_else(|| DnsError::FormErr("truncated compression pointer"))?
                as usize;
            let pointer = ((len & 0x3F) << 8) | b2;
            if pointer >= buffer.len() || pointer >= pos {
                return Err(DnsError::FormErr(
                    "compression pointer must point strictly backwards",
                ));
            }
            if end_offset.is_none() {
                end_offset = Some(pos + 2);
            }
            jumps += 1;
            pos = pointer;
            continue;
        }

        if len & 0xC0 != 0x00 {
            return Err(DnsError::FormErr("reserved label length bits set"));
        }

        if !(1..=63).contains(&len) {
            return Err(DnsError::FormErr("label length out of range"));
        }
        let start = pos + 1;
        let end = start + len;
        let raw = buffer
            .get(start..end)
            .ok_or_else(|| DnsError::FormErr("label runs past end of packet"))?;
        let label = std::str::from_utf8(raw)
            .map_err(|_| DnsError::FormErr("label is not valid utf-8"))?
            .to_ascii_lowercase();
        labels.push(label);
        pos = end;
    }
}

/// Read a big-endian `u16` at `offset`.
pub fn read_u16(buffer: &[u8], offset: usize) -> Result<u16, DnsError> {
    let bytes: [u8; 2] = buffer
        .get(offset..offset + 2)
        .ok_or_else(|| DnsError::FormErr("u16 read past end of packet"))?
        .try_into()
        .map_err(|_| DnsError::FormErr("u16 read past end of packet"))?;
    Ok(u16::from_be_bytes(bytes))
}

/// Read a big-endian `u32` at `offset`.
pub fn read_u32(buffer: &[u8], offset: usize) -> Result<u32, DnsError> {
    let bytes: [u8; 4] = buffer
        .get(offset..offset + 4)
        .ok_or_else(|| DnsError::FormErr("u32 read past end of packet"))?
        .try_into()
        .map_err(|_| DnsError::FormErr("u32 read past end of packet"))?;
    Ok(u32::from_be_bytes(bytes))
}

/// Pull the query id out of the first two bytes of a raw datagram, the way
/// the consumer's reply-guarantee recovery path does when header decode
/// itself failed.
pub fn peek_query_id(datagram: &[u8]) -> Option<u16> {
    if datagram.len() < 2 {
        return None;
    }
    Some(u16::from_be_bytes([datagram[0], datagram[1]]))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn label_round_trip_single() {
        let labels = vec!["example".to_string(), "com".to_string()];
        let encoded = encode_labels(&labels);
        let (end, decoded) = decode_labels(&encoded, 0).unwrap();
        assert_eq!(end, encoded.len());
        assert_eq!(decoded, labels);
    }

    #[test]
    fn label_round_trip_many_lengths() {
        for n in 1..=10 {
            let labels: Vec<String> = (0..n).map(|i| "a".repeat(1 + (i % 63))).collect();
            let encoded = encode_labels(&labels);
            let (end, decoded) = decode_labels(&encoded, 0).unwrap();
            assert_eq!(end, encoded.len());
            assert_eq!(decoded, labels);
        }
    }

    #[test]
    fn rejects_oversized_label() {
        let mut buf = vec![64u8];
        buf.extend(std::iter::repeat(b'a').take(64));
        buf.push(0);
        assert!(decode_labels(&buf, 0).is_err());
    }

    #[test]
    fn compression_pointer_resolves() {
        // "example.com" at offset 12, then a second question pointing back at it.
        let mut buf = vec![0u8; 12];
        buf.extend(encode_labels(&[
            "example".to_string(),
            "com".to_string(),
        ]));
        let second_name_offset = buf.len();
        buf.extend([0xC0, 0x0C]);
        let (end, labels) = decode_labels(&buf, 12).unwrap();
        assert_eq!(labels, vec!["example".to_string(), "com".to_string()]);
        assert!(end < second_name_offset);

        let (end2, labels2) = decode_labels(&buf, second_name_offset).unwrap();
        assert_eq!(end2, second_name_offset + 2);
        assert_eq!(labels2, labels);
    }

    #[test]
    fn compression_pointer_must_point_backwards() {
        let mut buf = vec![0u8; 12];
        // pointer pointing at itself (a forward/self loop) must be rejected.
        let here = buf.len() as u16;
        buf.extend([0xC0 | ((here >> 8) as u8), (here & 0xFF) as u8]);
        assert!(decode_labels(&buf, 12).is_err());
    }

    #[test]
    fn compression_pointer_cycle_is_bounded() {
        // Two pointers pointing at each other - must not loop forever.
        // offset 0: pointer to 2; offset 2: pointer to 0. Both "forward" at
        // some point in the chase, so detection relies on the jump-forward
        // rejection above; here we additionally bound total hops.
        let buf = vec![0xC0, 0x02, 0xC0, 0x00];
        assert!(decode_labels(&buf, 0).is_err());
    }
}

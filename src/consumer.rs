//! The dequeue/decode/resolve/reply loop, grounded on
//! `pymads.consumer.Consumer.listen`/`consume`/`make_response`: dequeue
//! with a timeout, decode under a FORMERR-converting guard, resolve under a
//! SERVFAIL-converting guard, and always attempt a reply if the query id
//! could be recovered at all.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;

use crate::chain::{Chain, Query};
use crate::error::{DnsError, DnsErrorKind, ErrorConverter};
use crate::packet::{Request, Response};
use crate::queue::DatagramQueue;
use crate::record::Record;
use crate::wire;

/// `make_response(req)` from spec section 4.7: the first chain with a
/// non-empty result wins and produces a NOERROR response; if every chain
/// comes back empty, NXDOMAIN.
pub async fn make_response(request: &Request, chains: &[Chain]) -> Result<Vec<Record>, DnsError> {
    let query = Query::new(
        request.0.question.clone(),
        request.0.qtype,
        request.0.qclass,
    );
    for chain in chains {
        let records = chain.get(&query).await?;
        if !records.is_empty() {
            return Ok(records);
        }
    }
    Err(DnsError::NxDomain("no chain produced a record"))
}

/// Drains [`DatagramQueue`] items, builds a reply for each, and sends it
/// back to the originating peer.
pub struct Consumer {
    socket: Arc<UdpSocket>,
    queue: Arc<DatagramQueue>,
    chains: Arc<Vec<Chain>>,
    debug: bool,
}

impl Consumer {
    pub fn new(
        socket: Arc<UdpSocket>,
        queue: Arc<DatagramQueue>,
        chains: Arc<Vec<Chain>>,
        debug: bool,
    ) -> Self {
        Self {
            socket,
            queue,
            chains,
            debug,
        }
    }

    /// Dequeue and process exactly one datagram, honoring `timeout`;
    /// returns immediately (a no-op) if nothing arrived in time.
    #[tracing::instrument(skip(self), fields(debug = self.debug))]
    pub async fn consume(&self, timeout: Duration) {
        let Some((bytes, peer)) = self.queue.dequeue_timeout(timeout).await else {
            return;
        };
        self.handle_datagram(&bytes, peer).await;
        self.queue.task_done();
    }

    async fn handle_datagram(&self, bytes: &[u8], peer: SocketAddr) {
        match self.build_response(bytes).await {
            Some(response_bytes) => {
                if let Err(e) = self.socket.send_to(&response_bytes, peer).await {
                    tracing::debug!(error = %e, %peer, "failed to send reply");
                }
            }
            None => {
                tracing::debug!(%peer, "dropping datagram: no recoverable query id");
            }
        }
    }

    /// Returns the encoded response bytes, or `None` if the query id could
    /// not be recovered and the datagram must be silently dropped (spec
    /// section 7's "reply guarantee").
    async fn build_response(&self, bytes: &[u8]) -> Option<Vec<u8>> {
        let decode_guard = ErrorConverter::new(DnsErrorKind::FormErr).quiet(!self.debug);
        let request = match decode_guard.convert(Request::decode(bytes)) {
            Ok(request) => request,
            Err(dns_err) => {
                let qid = wire::peek_query_id(bytes)?;
                return Some(error_response_bytes(qid, &dns_err));
            }
        };

        let resolve_guard = ErrorConverter::new(DnsErrorKind::ServFail).quiet(!self.debug);
        let packet = match resolve_guard.convert(make_response(&request, &self.chains).await) {
            Ok(records) => Response::build(&request, DnsErrorKind::NoError.rcode(), records),
            Err(dns_err) => Response::build(&request, dns_err.kind().rcode(), vec![]),
        };
        Some(packet.encode())
    }
}

/// Build a minimal error response when header/question decode itself
/// failed: no parsed question is available, so we hand-encode a bare
/// 12-byte header carrying the recovered qid and the error's rcode,
/// matching spec section 7's "reply guarantee" for undecodable datagrams.
fn error_response_bytes(qid: u16, err: &DnsError) -> Vec<u8> {
    let mut out = Vec::with_capacity(crate::HEADER_BYTES);
    out.extend(qid.to_be_bytes());
    let mut flags: u16 = 0;
    flags |= 1 << 15; // qr
    flags |= err.kind().rcode() & 0b1111;
    out.extend(flags.to_be_bytes());
    out.extend(0u16.to_be_bytes()); // qdcount
    out.extend(0u16.to_be_bytes()); // ancount
    out.extend(0u16.to_be_bytes()); // nscount
    out.extend(0u16.to_be_bytes()); // arcount
    out
}

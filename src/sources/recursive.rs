//! Single-hop recursive upstream source, grounded on
//! `pymads.sources.dns.DnsSource.exchange`: bind a local UDP socket once,
//! resend on each timeout up to `1 + retries` total attempts, and raise on
//! either a timeout with no reply or a non-zero upstream rcode.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::sync::Mutex as AsyncMutex;

use crate::chain::{Query, Source};
use crate::error::DnsError;
use crate::packet::{Packet, Request};
use crate::record::{DomainName, Record};

/// Performs recursive resolution by delegating a single hop to a fixed
/// upstream server. Maintains a monotonically increasing `appid` for query
/// correlation, wrapping at 2^16 (spec section 4.5).
pub struct RecursiveSource {
    socket: AsyncMutex<UdpSocket>,
    remote_addr: SocketAddr,
    appid: AtomicU16,
    retries: u8,
    retry_timeout: Duration,
}

impl RecursiveSource {
    pub async fn bind(
        local_addr: SocketAddr,
        remote_addr: SocketAddr,
        retries: u8,
    ) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(local_addr).await?;
        Ok(Self {
            socket: AsyncMutex::new(socket),
            remote_addr,
            appid: AtomicU16::new(0),
            retries,
            retry_timeout: Duration::from_millis(crate::RECURSIVE_RETRY_TIMEOUT_MS),
        })
    }

    fn next_appid(&self) -> u16 {
        self.appid.fetch_add(1, Ordering::Relaxed)
    }

    async fn exchange(&self, query: &Query) -> Result<Packet, DnsError> {
        let appid = self.next_appid();
        let mut request_packet = Packet::new(appid, query.name.clone(), query.qtype, query.qclass);
        request_packet.set_rd(true);
        let request_bytes = request_packet.encode();

        let socket = self.socket.lock().await;
        let mut recv_buf = [0u8; crate::UDP_BUFFER_SIZE];

        let attempts = 1 + self.retries as u32;
        for _ in 0..attempts {
            socket
                .send_to(&request_bytes, self.remote_addr)
                .await
                .map_err(|e| DnsError::ServFail(format!("upstream send failed: {e}")))?;

            match tokio::time::timeout(self.retry_timeout, socket.recv_from(&mut recv_buf)).await {
                Ok(Ok((len, _src))) => {
                    return Packet::decode(&recv_buf[..len]);
                }
                Ok(Err(e)) => {
                    return Err(DnsError::ServFail(format!("upstream recv failed: {e}")));
                }
                Err(_timed_out) => continue,
            }
        }

        Err(DnsError::ServFail("upstream resolution timed out"))
    }
}

#[async_trait]
impl Source for RecursiveSource {
    async fn get(&self, query: &Query) -> Result<Vec<Record>, DnsError> {
        let response = self.exchange(query).await?;
        if response.rcode() != 0 {
            return Err(DnsError::ServFail(format!(
                "upstream query failed with rcode {}",
                response.rcode()
            )));
        }
        let mut records = response.answers;
        records.extend(response.authority);
        Ok(records)
    }
}

//! The UDP bind/serve loop, grounded on `goatns::servers::udp_server` for
//! its bind/receive-loop/timeout/send shape and on
//! `pymads.server.DnsServer.bind`/`serve`/`stop` for the lifecycle and the
//! `own_consumer` toggle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

use crate::config::ServerConfig;
use crate::consumer::Consumer;
use crate::queue::DatagramQueue;

/// `bind()` + `serve()` + `stop()` from spec section 4.7. One producer
/// (`serve`'s receive loop) and, depending on `own_consumer`, either that
/// same loop or externally spawned consumers drain the queue.
pub struct DnsServer {
    socket: Arc<UdpSocket>,
    queue: Arc<DatagramQueue>,
    consumer: Arc<Consumer>,
    own_consumer: bool,
    serving: Arc<AtomicBool>,
    recv_timeout: Duration,
    consumer_timeout: Duration,
}

impl DnsServer {
    /// Binds a UDP socket (AF_INET or AF_INET6, chosen by
    /// `config.listen_host`'s shape) with a 1-second receive timeout.
    pub async fn bind(config: ServerConfig) -> std::io::Result<Self> {
        let addr = config.listen_host.to_socket_addr(config.listen_port);
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        let queue = Arc::new(DatagramQueue::new(config.queue_capacity));
        let chains = Arc::new(config.chains);
        let consumer = Arc::new(Consumer::new(
            socket.clone(),
            queue.clone(),
            chains,
            config.debug,
        ));

        Ok(Self {
            socket,
            queue,
            consumer,
            own_consumer: config.own_consumer,
            serving: Arc::new(AtomicBool::new(false)),
            recv_timeout: Duration::from_secs(1),
            consumer_timeout: Duration::from_millis(crate::CONSUMER_TIMEOUT_MS),
        })
    }

    /// A handle to the consumer this server feeds, for callers running in
    /// `own_consumer = false` mode who need to drive it themselves.
    pub fn consumer(&self) -> Arc<Consumer> {
        self.consumer.clone()
    }

    /// Spawn `count` background tasks, each looping `consumer.consume()`
    /// until [`Self::stop`] is called. Convenience for `own_consumer =
    /// false` callers who don't want to hand-write the loop themselves;
    /// mirrors `goatns::servers`'s habit of `tokio::spawn`-ing one future
    /// per worker.
    pub fn spawn_consumers(&self, count: usize) -> Vec<JoinHandle<()>> {
        (0..count)
            .map(|_| {
                let consumer = self.consumer.clone();
                let serving = self.serving.clone();
                let timeout = self.consumer_timeout;
                tokio::spawn(async move {
                    while serving.load(Ordering::SeqCst) {
                        consumer.consume(timeout).await;
                    }
                })
            })
            .collect()
    }

    /// Loops while `serving`, receiving up to
    /// [`crate::UDP_BUFFER_SIZE`] bytes per datagram and enqueuing
    /// `(bytes, src_addr)`. When `own_consumer`, calls `consume()` once per
    /// iteration after each enqueue.
    pub async fn serve(&self) -> std::io::Result<()> {
        self.serving.store(true, Ordering::SeqCst);
        let mut buf = [0u8; crate::UDP_BUFFER_SIZE];

        while self.serving.load(Ordering::SeqCst) {
            let received = tokio::time::timeout(self.recv_timeout, self.socket.recv_from(&mut buf)).await;
            match received {
                Ok(Ok((len, src))) => {
                    if self.queue.enqueue((buf[..len].to_vec(), src)).await.is_err() {
                        break;
                    }
                    if self.own_consumer {
                        self.consumer.consume(self.consumer_timeout).await;
                    }
                }
                Ok(Err(e)) => {
                    tracing::debug!(error = %e, "recv_from failed");
                }
                Err(_elapsed) => continue,
            }
        }
        Ok(())
    }

    /// Cooperative, idempotent shutdown: clears `serving` so the receive
    /// loop and any spawned consumers exit on their next check, then waits
    /// for every already-enqueued datagram to finish processing.
    pub async fn stop(&self) {
        self.serving.store(false, Ordering::SeqCst);
        self.queue.join().await;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::chain::Chain;
    use crate::config::ListenHost;
    use crate::enums::RecordClass;
    use crate::packet::Packet;
    use crate::record::{DomainName, RData, Record};
    use crate::sources::MapSource;
    use std::net::Ipv4Addr;

    async fn loopback_server(chains: Vec<Chain>, own_consumer: bool) -> DnsServer {
        let config = ServerConfig::new(chains)
            .listen_host(ListenHost::V4(Ipv4Addr::LOCALHOST))
            .listen_port(0)
            .own_consumer(own_consumer)
            .debug(true);
        DnsServer::bind(config).await.unwrap()
    }

    #[tokio::test]
    async fn serve_answers_a_query_in_own_consumer_mode() {
        let mut map = MapSource::new();
        map.insert(
            DomainName::from("example.com"),
            vec![Record::new(
                DomainName::from("example.com"),
                RecordClass::In,
                60,
                RData::A(Ipv4Addr::new(1, 2, 3, 4)),
            )],
        );
        let chain = Chain::new(vec![Box::new(map)], vec![]);
        let server = Arc::new(loopback_server(vec![chain], true).await);
        let server_addr = server.socket.local_addr().unwrap();

        let serve_handle = {
            let server = server.clone();
            tokio::spawn(async move {
                let _ = server.serve().await;
            })
        };

        // give the loop a moment to start listening
        tokio::time::sleep(Duration::from_millis(20)).await;

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut packet = Packet::new(0x4242, DomainName::from("example.com"), 1, 1);
        packet.set_rd(false);
        client.send_to(&packet.encode(), server_addr).await.unwrap();

        let mut buf = [0u8; 512];
        let (n, _) = tokio::time::timeout(Duration::from_secs(2), client.recv_from(&mut buf))
            .await
            .expect("reply within timeout")
            .unwrap();
        let decoded = Packet::decode(&buf[..n]).unwrap();
        assert_eq!(decoded.qid, 0x4242);
        assert_eq!(decoded.answers.len(), 1);

        server.stop().await;
        serve_handle.abort();
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_returns_once_queue_drains() {
        let server = loopback_server(vec![], false).await;
        server.stop().await;
        server.stop().await;
    }
}

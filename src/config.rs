//! Construction-time options for [`crate::server::DnsServer`] (spec section
//! 4.7's options table). Deliberately narrow: general CLI argument parsing
//! and config-file loading are out of scope per spec section 1, so unlike
//! `goatns::config::ConfigFile` (OAuth, database, and web-server settings)
//! this only carries what `DnsServer::bind`/`serve` actually needs.

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::chain::Chain;

/// The shape of an address to listen on (spec section 6): a plain IPv4
/// dotted quad, or an IPv6 address plus the flow/scope pair POSIX sockets
/// need to bind a link-local address.
#[derive(Debug, Clone, Copy)]
pub enum ListenHost {
    V4(Ipv4Addr),
    V6 {
        addr: Ipv6Addr,
        flowinfo: u32,
        scope_id: u32,
    },
}

impl ListenHost {
    pub fn to_socket_addr(self, port: u16) -> std::net::SocketAddr {
        match self {
            ListenHost::V4(addr) => std::net::SocketAddr::new(addr.into(), port),
            ListenHost::V6 {
                addr,
                flowinfo,
                scope_id,
            } => std::net::SocketAddr::V6(std::net::SocketAddrV6::new(
                addr, port, flowinfo, scope_id,
            )),
        }
    }
}

impl Default for ListenHost {
    fn default() -> Self {
        ListenHost::V4(Ipv4Addr::UNSPECIFIED)
    }
}

/// `DnsServer` construction options from spec section 4.7. `queue_class`'s
/// role (a factory for the bounded queue) is narrowed to `queue_capacity`:
/// this core has exactly one queue implementation
/// ([`crate::queue::DatagramQueue`]), so the only thing worth
/// parameterizing is its bound.
pub struct ServerConfig {
    pub listen_host: ListenHost,
    pub listen_port: u16,
    pub debug: bool,
    pub chains: Vec<Chain>,
    pub queue_capacity: usize,
    pub own_consumer: bool,
}

impl ServerConfig {
    pub fn new(chains: Vec<Chain>) -> Self {
        Self {
            listen_host: ListenHost::default(),
            listen_port: 53,
            debug: false,
            chains,
            queue_capacity: crate::MAX_IN_FLIGHT,
            own_consumer: true,
        }
    }

    pub fn listen_host(mut self, host: ListenHost) -> Self {
        self.listen_host = host;
        self
    }

    pub fn listen_port(mut self, port: u16) -> Self {
        self.listen_port = port;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn own_consumer(mut self, own_consumer: bool) -> Self {
        self.own_consumer = own_consumer;
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let config = ServerConfig::new(vec![]);
        assert_eq!(config.listen_port, 53);
        assert!(!config.debug);
        assert!(config.own_consumer);
        assert_eq!(config.queue_capacity, crate::MAX_IN_FLIGHT);
    }

    #[test]
    fn builder_overrides_apply() {
        let config = ServerConfig::new(vec![])
            .listen_port(5353)
            .debug(true)
            .own_consumer(false);
        assert_eq!(config.listen_port, 5353);
        assert!(config.debug);
        assert!(!config.own_consumer);
    }

    #[test]
    fn v6_listen_host_preserves_flowinfo_and_scope_id() {
        use std::net::SocketAddr;

        let host = ListenHost::V6 {
            addr: "fe80::1".parse().unwrap(),
            flowinfo: 7,
            scope_id: 3,
        };
        match host.to_socket_addr(5300) {
            SocketAddr::V6(v6) => {
                assert_eq!(v6.port(), 5300);
                assert_eq!(v6.flowinfo(), 7);
                assert_eq!(v6.scope_id(), 3);
            }
            SocketAddr::V4(_) => panic!("expected a V6 socket address"),
        }
    }
}

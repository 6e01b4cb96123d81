//! An authoritative DNS server over UDP, built from an ordered chain of
//! record providers and optional filters.
//!
//! The hard parts live in [`wire`] (bit-exact RFC 1035 codec with label
//! compression), [`packet`] (the request/response state machine),
//! [`chain`] (source + filter composition, including a TTL-aware cache),
//! and [`server`] (the UDP receive loop and consumer protocol).

/// Construction-time options for [`server::DnsServer`].
pub mod config;
/// The DNS error taxonomy and the scoped guard that recovers from it.
pub mod error;
/// RR type/class and header flag enumerations.
pub mod enums;
/// Source + filter composition.
pub mod chain;
/// The dequeue/parse/resolve/reply loop.
pub mod consumer;
/// Cache and other result-rewriting layers sitting between a chain and its sources.
pub mod filters;
/// A typed DNS resource record and its rdata encode/decode.
pub mod record;
/// Packet, Request, and Response: the header+question container and its
/// flag accessors.
pub mod packet;
/// The bounded datagram queue shared between the producer loop and its consumers.
pub mod queue;
/// The UDP bind/serve loop.
pub mod server;
/// Record providers: in-memory map, JSON file, recursive upstream.
pub mod sources;
/// Small packed-integer and label helpers shared by the wire codec.
pub mod wire;

/// Internal limit of in-flight datagrams in the bounded queue.
pub const MAX_IN_FLIGHT: usize = 512;
/// The size of a DNS message header, in bytes.
pub const HEADER_BYTES: usize = 12;
/// The maximum size of a UDP DNS datagram this core will read or emit.
pub const UDP_BUFFER_SIZE: usize = 512;
/// Default consumer dequeue timeout.
pub const CONSUMER_TIMEOUT_MS: u64 = 100;
/// Default upstream per-retry timeout used by [`sources::recursive::RecursiveSource`].
pub const RECURSIVE_RETRY_TIMEOUT_MS: u64 = 1000;
/// Default retry count for [`sources::recursive::RecursiveSource`].
pub const RECURSIVE_DEFAULT_RETRIES: u8 = 5;

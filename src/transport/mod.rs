//! Transports for talking to the upstream resolver.
//!
//! UDP is the primary path; a truncated response is retried over TCP,
//! which frames DNS messages with a 2-byte length prefix.

pub mod tcp;
pub mod udp;

/// Maximum size of a DNS packet (with some headroom).
pub const MAX_DNS_PACKET_SIZE: usize = 4096;

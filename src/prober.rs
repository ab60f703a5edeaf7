//! Subnet probing: one ECS-scoped query, one structured result.
//!
//! The prober builds the wire query, hands it to a transport, and
//! reduces the response to the two facts the analyzer cares about:
//! which addresses came back, and whether the resolver honored the
//! subnet hint.

use std::future::Future;
use std::io;
use std::time::Instant;

use crate::dns::{DnsQuery, DnsResponse};
use crate::error::{Error, Result};
use crate::subnet::Subnet;

/// One-shot DNS exchange against an upstream resolver.
///
/// The prober is generic over this seam so tests can feed it canned
/// responses instead of a live socket.
pub trait Exchange {
    /// Send raw query bytes and return raw response bytes.
    fn exchange(&self, query: &[u8]) -> impl Future<Output = io::Result<Vec<u8>>>;
}

/// Outcome of probing one (domain, subnet) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// Resolved IPv4 addresses, lexicographically sorted.
    pub addresses: Vec<String>,
    /// Whether the resolver echoed a client-subnet scope other than /0.
    pub ecs_supported: bool,
}

/// Issues ECS-scoped queries and reduces the responses.
pub struct Prober<E> {
    exchange: E,
    verbose: bool,
}

impl<E: Exchange> Prober<E> {
    pub fn new(exchange: E, verbose: bool) -> Self {
        Self { exchange, verbose }
    }

    /// Probe `domain` as seen from `subnet`.
    ///
    /// The echoed scope decides ECS support: an absent CLIENT-SUBNET
    /// option or a /0 scope both mean the resolver ignored the hint.
    pub async fn probe(&self, domain: &str, subnet: &Subnet) -> Result<ProbeResult> {
        let query = DnsQuery {
            id: rand::random(),
            domain: domain.to_string(),
            subnet: *subnet,
        };
        let start_time = Instant::now();

        let raw = self
            .exchange
            .exchange(&query.to_bytes())
            .await
            .map_err(|e| resolution(domain, subnet, &e.to_string()))?;

        let response = DnsResponse::parse(&raw)
            .ok_or_else(|| resolution(domain, subnet, "malformed response"))?;
        if response.id != query.id {
            return Err(resolution(domain, subnet, "response ID mismatch"));
        }

        let mut addresses: Vec<String> = response.answers.iter().map(|ip| ip.to_string()).collect();
        // String sort, not numeric: "10.0.0.1" sorts before "2.0.0.1".
        // The cross-subnet comparison relies on this exact order.
        addresses.sort();

        let ecs_supported = response.ecs_scope.is_some_and(|scope| scope != 0);

        if self.verbose {
            let scope = match response.ecs_scope {
                Some(s) => format!("/{s}"),
                None => "none".to_string(),
            };
            let elapsed = start_time.elapsed();
            println!(
                "[{}] {} scope={} answers={} total={:.3}ms",
                subnet,
                domain,
                scope,
                addresses.len(),
                elapsed.as_secs_f64() * 1000.0
            );
        }

        Ok(ProbeResult {
            addresses,
            ecs_supported,
        })
    }
}

fn resolution(domain: &str, subnet: &Subnet, detail: &str) -> Error {
    Error::Resolution {
        detail: format!("{domain} via {subnet}: {detail}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{FailingExchange, ScriptedExchange, a_response};

    fn subnet() -> Subnet {
        "98.246.112.0/24".parse().unwrap()
    }

    #[tokio::test]
    async fn sorts_addresses_lexicographically() {
        let exchange = ScriptedExchange::new(vec![a_response(&["2.0.0.1", "10.0.0.1"], Some(24))]);
        let prober = Prober::new(exchange, false);

        let result = prober.probe("example.com", &subnet()).await.unwrap();

        assert_eq!(result.addresses, vec!["10.0.0.1", "2.0.0.1"]);
        assert!(result.ecs_supported);
    }

    #[tokio::test]
    async fn zero_scope_means_unsupported() {
        let exchange = ScriptedExchange::new(vec![a_response(&["1.2.3.4"], Some(0))]);
        let prober = Prober::new(exchange, false);

        let result = prober.probe("example.com", &subnet()).await.unwrap();

        assert!(!result.ecs_supported);
        assert_eq!(result.addresses, vec!["1.2.3.4"]);
    }

    #[tokio::test]
    async fn missing_option_means_unsupported() {
        let exchange = ScriptedExchange::new(vec![a_response(&["1.2.3.4"], None)]);
        let prober = Prober::new(exchange, false);

        let result = prober.probe("example.com", &subnet()).await.unwrap();

        assert!(!result.ecs_supported);
    }

    #[tokio::test]
    async fn keeps_duplicate_addresses() {
        let exchange = ScriptedExchange::new(vec![a_response(&["1.2.3.4", "1.2.3.4"], Some(24))]);
        let prober = Prober::new(exchange, false);

        let result = prober.probe("example.com", &subnet()).await.unwrap();

        assert_eq!(result.addresses, vec!["1.2.3.4", "1.2.3.4"]);
    }

    #[tokio::test]
    async fn transport_error_becomes_resolution_error() {
        let prober = Prober::new(FailingExchange, false);

        let err = prober.probe("example.com", &subnet()).await.unwrap_err();

        assert!(matches!(err, Error::Resolution { .. }));
        assert!(err.to_string().contains("example.com"));
    }

    #[tokio::test]
    async fn malformed_response_becomes_resolution_error() {
        let exchange = ScriptedExchange::new(vec![vec![0x00, 0x01, 0x02]]);
        let prober = Prober::new(exchange, false);

        let err = prober.probe("example.com", &subnet()).await.unwrap_err();

        assert!(err.to_string().contains("malformed response"));
    }

    #[tokio::test]
    async fn mismatched_id_becomes_resolution_error() {
        // An exchange that ignores the query and replies with its own ID.
        struct FixedIdExchange;

        impl Exchange for FixedIdExchange {
            async fn exchange(&self, _query: &[u8]) -> io::Result<Vec<u8>> {
                Ok(a_response(&["1.2.3.4"], Some(24)))
            }
        }

        let prober = Prober::new(FixedIdExchange, false);

        // Query IDs are random; a fixed zero ID loses every time but one
        // in 65536. Probe twice so a collision cannot mask the check.
        let mut saw_mismatch = false;
        for _ in 0..2 {
            if let Err(err) = prober.probe("example.com", &subnet()).await {
                assert!(err.to_string().contains("response ID mismatch"));
                saw_mismatch = true;
                break;
            }
        }
        assert!(saw_mismatch);
    }
}

//! Run orchestration: read the domain list, probe, write the report.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::analyzer::{Analyzer, RunSummary};
use crate::error::{Error, Result};
use crate::prober::Prober;
use crate::report;
use crate::subnet::Subnet;
use crate::transport::udp::UdpExchange;

/// Configuration for one probing run.
pub struct RunConfig {
    /// Domain list, one name per line.
    pub input: PathBuf,
    /// Destination for the semicolon-delimited report.
    pub output: PathBuf,
    /// Upstream recursive resolver.
    pub upstream: SocketAddr,
    /// Ordered vantage list, probed in this order for every domain.
    pub subnets: Vec<Subnet>,
    /// Per-query timeout.
    pub timeout: Duration,
    /// Log each probe.
    pub verbose: bool,
}

/// Probe every domain in input order and write the report.
///
/// Strictly sequential and fail-fast: the first failed exchange aborts
/// the run and nothing is written.
pub async fn run(config: RunConfig) -> Result<RunSummary> {
    let domains = report::read_domains(&config.input)?;

    let exchange = UdpExchange::bind(config.upstream, config.timeout)
        .await
        .map_err(|e| Error::Resolution {
            detail: format!("cannot reach upstream {}: {}", config.upstream, e),
        })?;
    let prober = Prober::new(exchange, config.verbose);
    let analyzer = Analyzer::new(config.subnets);

    let mut summary = RunSummary::default();
    let mut verdicts = Vec::with_capacity(domains.len());

    for domain in &domains {
        let verdict = analyzer.analyze(&prober, domain).await?;
        summary.record(&verdict);
        verdicts.push(verdict);
    }

    report::write_report(&config.output, &verdicts)?;
    report::print_summary(&config.output, &summary);

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subnet::default_subnets;
    use crate::test_util::{a_response, query_domain};
    use crate::transport::MAX_DNS_PACKET_SIZE;
    use std::fs;
    use tokio::net::UdpSocket;

    /// Serves canned answers per domain: example.com never supports
    /// ECS, example.org supports it with the same answer everywhere.
    async fn serve_upstream(socket: UdpSocket, queries: usize) {
        let mut buf = [0u8; MAX_DNS_PACKET_SIZE];
        for _ in 0..queries {
            let (len, src) = socket.recv_from(&mut buf).await.unwrap();
            let query = &buf[..len];
            let mut response = match query_domain(query).unwrap().as_str() {
                "example.com" => a_response(&["93.184.216.34"], None),
                "example.org" => a_response(&["93.184.216.35"], Some(24)),
                other => panic!("unexpected domain {other}"),
            };
            response[0] = query[0];
            response[1] = query[1];
            socket.send_to(&response, src).await.unwrap();
        }
    }

    #[tokio::test]
    async fn end_to_end_report_and_summary() {
        let upstream = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let upstream_addr = upstream.local_addr().unwrap();
        // 2 domains, 4 subnets each
        tokio::spawn(serve_upstream(upstream, 8));

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("domains.txt");
        let output = dir.path().join("report.csv");
        fs::write(&input, "example.com.\nexample.org\n").unwrap();

        let summary = run(RunConfig {
            input,
            output: output.clone(),
            upstream: upstream_addr,
            subnets: default_subnets(),
            timeout: Duration::from_secs(5),
            verbose: false,
        })
        .await
        .unwrap();

        let table = fs::read_to_string(&output).unwrap();
        assert_eq!(
            table,
            "Domain;ECS support;Same across different subnets\n\
             example.com;false;true\n\
             example.org;true;true\n"
        );
        assert_eq!(summary.total_domains, 2);
        assert_eq!(summary.ecs_supported, 1);
        assert_eq!(summary.ecs_but_consistent, 1);
    }

    #[tokio::test]
    async fn missing_input_aborts_before_any_probe() {
        let dir = tempfile::tempdir().unwrap();

        let err = run(RunConfig {
            input: dir.path().join("missing.txt"),
            output: dir.path().join("report.csv"),
            upstream: "127.0.0.1:1".parse().unwrap(),
            subnets: default_subnets(),
            timeout: Duration::from_secs(5),
            verbose: false,
        })
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Input { .. }));
    }

    #[tokio::test]
    async fn probe_failure_leaves_no_output() {
        let upstream = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let upstream_addr = upstream.local_addr().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("domains.txt");
        let output = dir.path().join("report.csv");
        fs::write(&input, "example.com\n").unwrap();

        // Upstream never answers; the probe times out.
        let err = run(RunConfig {
            input,
            output: output.clone(),
            upstream: upstream_addr,
            subnets: default_subnets(),
            timeout: Duration::from_millis(50),
            verbose: false,
        })
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Resolution { .. }));
        assert!(!output.exists());
        drop(upstream);
    }
}

//! UDP exchange with the upstream resolver.
//!
//! Sends one query per call and receives datagrams until one echoes the
//! query ID; stale datagrams left over from earlier timed-out queries
//! are discarded.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;

use super::{MAX_DNS_PACKET_SIZE, tcp};
use crate::prober::Exchange;

/// One-shot UDP exchange, with TCP fallback for truncated responses.
pub struct UdpExchange {
    socket: UdpSocket,
    upstream: SocketAddr,
    timeout: Duration,
}

impl UdpExchange {
    /// Bind an ephemeral socket for talking to `upstream`.
    pub async fn bind(upstream: SocketAddr, timeout: Duration) -> io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(upstream).await?;

        Ok(Self {
            socket,
            upstream,
            timeout,
        })
    }

    async fn exchange_udp(&self, query: &[u8]) -> io::Result<Vec<u8>> {
        self.socket.send(query).await?;

        let query_id = u16::from_be_bytes([query[0], query[1]]);
        let mut buf = [0u8; MAX_DNS_PACKET_SIZE];

        loop {
            let len = self.socket.recv(&mut buf).await?;
            if len < 12 {
                continue;
            }

            let response_id = u16::from_be_bytes([buf[0], buf[1]]);
            if response_id == query_id {
                return Ok(buf[..len].to_vec());
            }
        }
    }
}

impl Exchange for UdpExchange {
    async fn exchange(&self, query: &[u8]) -> io::Result<Vec<u8>> {
        let exchange = async {
            let response = self.exchange_udp(query).await?;

            // TC bit set: the answer did not fit in UDP, ask again over TCP.
            if response[2] & 0x02 != 0 {
                return tcp::exchange(self.upstream, query).await;
            }

            Ok(response)
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "query timed out"))?
    }
}

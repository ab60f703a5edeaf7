//! TCP exchange for responses that did not fit in a UDP datagram.
//!
//! DNS over TCP prefixes every message with a 2-byte big-endian length.

use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::MAX_DNS_PACKET_SIZE;

/// Send `query` over a fresh TCP connection and return the response
/// with its length prefix stripped.
pub async fn exchange(upstream: SocketAddr, query: &[u8]) -> io::Result<Vec<u8>> {
    let mut stream = TcpStream::connect(upstream).await?;

    let mut framed = Vec::with_capacity(query.len() + 2);
    framed.extend_from_slice(&(query.len() as u16).to_be_bytes());
    framed.extend_from_slice(query);
    stream.write_all(&framed).await?;

    let mut buf = vec![0u8; MAX_DNS_PACKET_SIZE];
    let mut total_read = 0;

    loop {
        match stream.read(&mut buf[total_read..]).await? {
            0 => return Err(io::ErrorKind::UnexpectedEof.into()),
            n => total_read += n,
        }

        if total_read >= 2 {
            let msg_len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
            if total_read >= 2 + msg_len {
                return Ok(buf[2..2 + msg_len].to_vec());
            }
        }
    }
}

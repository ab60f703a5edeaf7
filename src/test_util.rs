//! Shared test helpers: canned wire responses and scripted exchanges.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::net::Ipv4Addr;
use std::rc::Rc;

use crate::prober::Exchange;

/// Build a response with `ips` as A records and, when `ecs_scope` is
/// set, an echoed CLIENT-SUBNET option with that scope. The ID is left
/// zero for the exchange to patch.
pub(crate) fn a_response(ips: &[&str], ecs_scope: Option<u8>) -> Vec<u8> {
    let mut data = Vec::new();

    data.extend_from_slice(&[0x00, 0x00]); // ID
    data.extend_from_slice(&[0x81, 0x80]); // standard response, RA
    data.extend_from_slice(&[0x00, 0x01]); // QDCOUNT
    data.extend_from_slice(&(ips.len() as u16).to_be_bytes());
    data.extend_from_slice(&[0x00, 0x00]); // NSCOUNT
    data.extend_from_slice(&u16::from(ecs_scope.is_some()).to_be_bytes());

    // Question: example.com A IN
    data.extend_from_slice(&[7]);
    data.extend_from_slice(b"example");
    data.extend_from_slice(&[3]);
    data.extend_from_slice(b"com");
    data.extend_from_slice(&[0x00, 0x00, 0x01, 0x00, 0x01]);

    for ip in ips {
        let octets = ip.parse::<Ipv4Addr>().unwrap().octets();
        data.extend_from_slice(&[0xC0, 0x0C]); // pointer to the question name
        data.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]); // A IN
        data.extend_from_slice(&[0x00, 0x00, 0x01, 0x2C]); // TTL 300
        data.extend_from_slice(&[0x00, 0x04]);
        data.extend_from_slice(&octets);
    }

    if let Some(scope) = ecs_scope {
        data.push(0x00); // root name
        data.extend_from_slice(&[0x00, 0x29]); // OPT
        data.extend_from_slice(&[0x10, 0x00]); // payload size 4096
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        data.extend_from_slice(&[0x00, 0x0B]); // RDLENGTH
        data.extend_from_slice(&[0x00, 0x08]); // CLIENT-SUBNET
        data.extend_from_slice(&[0x00, 0x07]); // option length
        data.extend_from_slice(&[0x00, 0x01]); // family IPv4
        data.push(24);
        data.push(scope);
        data.extend_from_slice(&[98, 246, 112]);
    }

    data
}

/// Replays canned responses in order, echoing each query's ID the way
/// a real resolver would.
pub(crate) struct ScriptedExchange {
    responses: RefCell<VecDeque<Vec<u8>>>,
    calls: Rc<Cell<usize>>,
}

impl ScriptedExchange {
    pub(crate) fn new(responses: Vec<Vec<u8>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            calls: Rc::new(Cell::new(0)),
        }
    }

    /// Handle onto the call counter, usable after the exchange has been
    /// moved into a prober.
    pub(crate) fn counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.calls)
    }
}

impl Exchange for ScriptedExchange {
    async fn exchange(&self, query: &[u8]) -> io::Result<Vec<u8>> {
        self.calls.set(self.calls.get() + 1);

        let mut response = self
            .responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))?;

        if response.len() >= 2 {
            response[0] = query[0];
            response[1] = query[1];
        }

        Ok(response)
    }
}

/// Always fails, for error-path tests.
pub(crate) struct FailingExchange;

impl Exchange for FailingExchange {
    async fn exchange(&self, _query: &[u8]) -> io::Result<Vec<u8>> {
        Err(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "upstream unreachable",
        ))
    }
}

/// Extract the queried domain from raw query bytes.
pub(crate) fn query_domain(query: &[u8]) -> Option<String> {
    let mut pos = 12;
    let mut parts = Vec::new();

    while pos < query.len() {
        let len = query[pos] as usize;
        if len == 0 {
            break;
        }
        pos += 1;
        if pos + len > query.len() {
            return None;
        }
        parts.push(std::str::from_utf8(&query[pos..pos + len]).ok()?.to_string());
        pos += len;
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("."))
    }
}

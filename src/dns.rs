//! DNS message construction and parsing.
//!
//! Queries carry an EDNS0 OPT record with a CLIENT-SUBNET option so the
//! upstream resolver sees the probe as coming from a chosen network.
//! Responses are reduced to the pieces the prober inspects: A-record
//! addresses, the echoed subnet scope, and the truncation flag.

use std::net::Ipv4Addr;

use crate::subnet::Subnet;

const HEADER_LEN: usize = 12;

const TYPE_A: u16 = 1;
const TYPE_OPT: u16 = 41;
const CLASS_IN: u16 = 1;

/// EDNS option code for CLIENT-SUBNET.
const OPTION_CLIENT_SUBNET: u16 = 8;
/// Address family value for IPv4 in a CLIENT-SUBNET option.
const FAMILY_IPV4: u16 = 1;
/// UDP payload size advertised in the OPT record.
const EDNS_PAYLOAD_SIZE: u16 = 4096;

/// An A-record query scoped to a client subnet.
#[derive(Debug, Clone)]
pub struct DnsQuery {
    pub id: u16,
    pub domain: String,
    pub subnet: Subnet,
}

impl DnsQuery {
    /// Encode the query to wire format bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(128);

        // Header
        data.extend_from_slice(&self.id.to_be_bytes());
        data.extend_from_slice(&0x0100u16.to_be_bytes()); // Recursion desired
        data.extend_from_slice(&1u16.to_be_bytes()); // QDCOUNT
        data.extend_from_slice(&[0x00, 0x00]); // ANCOUNT
        data.extend_from_slice(&[0x00, 0x00]); // NSCOUNT
        data.extend_from_slice(&1u16.to_be_bytes()); // ARCOUNT (the OPT record)

        // Question
        encode_domain(&mut data, &self.domain);
        data.extend_from_slice(&TYPE_A.to_be_bytes());
        data.extend_from_slice(&CLASS_IN.to_be_bytes());

        // OPT pseudo-record carrying the CLIENT-SUBNET option.
        // The address field holds only the octets covered by the prefix,
        // host bits zeroed; scope is always 0 in queries.
        let addr = self.subnet.prefix_octets();
        data.push(0); // root name
        data.extend_from_slice(&TYPE_OPT.to_be_bytes());
        data.extend_from_slice(&EDNS_PAYLOAD_SIZE.to_be_bytes());
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // extended RCODE + flags
        data.extend_from_slice(&((8 + addr.len()) as u16).to_be_bytes()); // RDLENGTH
        data.extend_from_slice(&OPTION_CLIENT_SUBNET.to_be_bytes());
        data.extend_from_slice(&((4 + addr.len()) as u16).to_be_bytes());
        data.extend_from_slice(&FAMILY_IPV4.to_be_bytes());
        data.push(self.subnet.prefix_len());
        data.push(0); // scope
        data.extend_from_slice(&addr);

        data
    }
}

/// A parsed DNS response, reduced to what the prober inspects.
#[derive(Debug, Clone)]
pub struct DnsResponse {
    pub id: u16,
    pub truncated: bool,
    pub answers: Vec<Ipv4Addr>,
    /// Scope prefix length from the echoed CLIENT-SUBNET option, if any.
    pub ecs_scope: Option<u8>,
}

impl DnsResponse {
    /// Parse a response from raw bytes.
    ///
    /// Returns `None` if the packet is malformed: shorter than a header,
    /// or with sections that run past the end of the data.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < HEADER_LEN {
            return None;
        }

        let id = u16::from_be_bytes([data[0], data[1]]);
        let flags = u16::from_be_bytes([data[2], data[3]]);
        let truncated = flags & 0x0200 != 0;

        let qdcount = u16::from_be_bytes([data[4], data[5]]) as usize;
        let ancount = u16::from_be_bytes([data[6], data[7]]) as usize;
        let nscount = u16::from_be_bytes([data[8], data[9]]) as usize;
        let arcount = u16::from_be_bytes([data[10], data[11]]) as usize;

        let mut pos = HEADER_LEN;

        // Question section
        for _ in 0..qdcount {
            pos = skip_name(data, pos)?;
            pos += 4; // QTYPE + QCLASS
            if pos > data.len() {
                return None;
            }
        }

        let mut answers = Vec::new();
        let mut ecs_scope = None;

        // Answer section: collect A records, skip everything else.
        for _ in 0..ancount {
            let (rtype, rclass, rdata) = read_record(data, &mut pos)?;
            if rtype == TYPE_A && rclass == CLASS_IN && rdata.len() == 4 {
                answers.push(Ipv4Addr::new(rdata[0], rdata[1], rdata[2], rdata[3]));
            }
        }

        // Authority + additional: the OPT record holds the echoed option.
        for _ in 0..nscount + arcount {
            let (rtype, _, rdata) = read_record(data, &mut pos)?;
            if rtype == TYPE_OPT {
                if let Some(scope) = parse_ecs_scope(rdata) {
                    ecs_scope = Some(scope);
                }
            }
        }

        Some(Self {
            id,
            truncated,
            answers,
            ecs_scope,
        })
    }
}

fn encode_domain(buf: &mut Vec<u8>, domain: &str) {
    for label in domain.split('.') {
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }
    buf.push(0);
}

/// Skip a possibly compressed name, returning the position just past it.
fn skip_name(data: &[u8], mut pos: usize) -> Option<usize> {
    while pos < data.len() {
        let b = data[pos];
        if b == 0 {
            return Some(pos + 1);
        }
        if b >= 0xC0 {
            if pos + 2 > data.len() {
                return None;
            }
            return Some(pos + 2);
        }
        pos += 1 + b as usize;
    }
    None
}

/// Read one resource record starting at `*pos`, advancing past it.
///
/// Returns (RTYPE, RCLASS, RDATA). For OPT records RCLASS carries the
/// requested payload size, not a DNS class.
fn read_record<'a>(data: &'a [u8], pos: &mut usize) -> Option<(u16, u16, &'a [u8])> {
    *pos = skip_name(data, *pos)?;
    if *pos + 10 > data.len() {
        return None;
    }

    let rtype = u16::from_be_bytes([data[*pos], data[*pos + 1]]);
    let rclass = u16::from_be_bytes([data[*pos + 2], data[*pos + 3]]);
    let rdlength = u16::from_be_bytes([data[*pos + 8], data[*pos + 9]]) as usize;
    *pos += 10;

    if *pos + rdlength > data.len() {
        return None;
    }
    let rdata = &data[*pos..*pos + rdlength];
    *pos += rdlength;

    Some((rtype, rclass, rdata))
}

/// Find the CLIENT-SUBNET option in OPT RDATA and return its scope
/// prefix length.
fn parse_ecs_scope(rdata: &[u8]) -> Option<u8> {
    let mut pos = 0;

    while pos + 4 <= rdata.len() {
        let code = u16::from_be_bytes([rdata[pos], rdata[pos + 1]]);
        let len = u16::from_be_bytes([rdata[pos + 2], rdata[pos + 3]]) as usize;
        pos += 4;
        if pos + len > rdata.len() {
            return None;
        }
        if code == OPTION_CLIENT_SUBNET && len >= 4 {
            // FAMILY (2), SOURCE PREFIX-LENGTH (1), SCOPE PREFIX-LENGTH (1)
            return Some(rdata[pos + 3]);
        }
        pos += len;
    }

    None
}

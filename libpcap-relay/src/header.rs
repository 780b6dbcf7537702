//! Legacy pcap global header: structural detection and synthesis
//!
//! The producer opens every capture with a 24-byte little-endian header
//! (magic `0xa1b2c3d4`, version 2.4, zero timezone and sigfigs). The raw and
//! ethernet variants only differ in the trailing snaplen/linktype words, so
//! detection is done on the common prefix.

use std::fmt;

use pcap_parser::{Linktype, PcapHeader, ToVec};

use crate::error::Error;

/// Size of the legacy pcap global header
pub const PCAP_HEADER_LEN: usize = 24;

/// Number of leading bytes shared by all headers sent by the producer
pub const HEADER_PREFIX_LEN: usize = 13;

/// Snaplen declared by the producer, and used for synthesized headers
pub const DEFAULT_SNAPLEN: u32 = 65535;

// magic, version 2.4, thiszone, first byte of sigfigs
const HEADER_PREFIX: [u8; HEADER_PREFIX_LEN] = [
    0xd4, 0xc3, 0xb2, 0xa1, 0x02, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Link-layer framing of the records of a stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkLayer {
    /// Records start directly with the IP header
    Raw,
    /// Records carry a (fake) ethernet header and the vendor trailer
    Ethernet,
}

impl LinkLayer {
    pub fn linktype(self) -> Linktype {
        match self {
            LinkLayer::Raw => Linktype::RAW,
            LinkLayer::Ethernet => Linktype::ETHERNET,
        }
    }

    /// Map a pcap link type to a known framing, if any
    pub fn from_linktype(linktype: Linktype) -> Option<LinkLayer> {
        match linktype {
            Linktype::RAW => Some(LinkLayer::Raw),
            Linktype::ETHERNET => Some(LinkLayer::Ethernet),
            _ => None,
        }
    }
}

impl fmt::Display for LinkLayer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LinkLayer::Raw => write!(f, "raw"),
            LinkLayer::Ethernet => write!(f, "ethernet"),
        }
    }
}

/// Test if `data` is a pcap global header, using its length and fixed prefix only
pub fn is_header_frame(data: &[u8]) -> bool {
    data.len() == PCAP_HEADER_LEN && data[..HEADER_PREFIX_LEN] == HEADER_PREFIX
}

/// Link type declared by a header frame, or `None` if `data` is not one
pub fn declared_linktype(data: &[u8]) -> Option<Linktype> {
    if !is_header_frame(data) {
        return None;
    }
    let mut b = [0u8; 4];
    b.copy_from_slice(&data[20..PCAP_HEADER_LEN]);
    Some(Linktype(i32::from_le_bytes(b)))
}

/// Build the global header to emit when the producer's own header was missed
pub fn synthesize_header(link_layer: LinkLayer, snaplen: u32) -> Result<Vec<u8>, Error> {
    let mut hdr = PcapHeader::new();
    hdr.snaplen = snaplen;
    hdr.network = link_layer.linktype();
    hdr.to_vec()
        .map_err(|_| Error::Generic("Pcap header serialization failed"))
}

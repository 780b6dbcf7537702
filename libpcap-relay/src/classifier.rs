use pcap_parser::Linktype;
use tracing::{debug, info};

use crate::error::Error;
use crate::header::{declared_linktype, is_header_frame, synthesize_header, LinkLayer, DEFAULT_SNAPLEN};
use crate::trailer::has_trailer;

/// Whether the global header has been emitted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderState {
    NotSent,
    Sent,
}

/// Output produced for one received frame
#[derive(Debug, PartialEq, Eq)]
pub enum Action<'a> {
    /// The frame is the producer's header, forwarded as the stream header
    Header(&'a [u8]),
    /// A synthesized header, followed by the frame as first record
    HeaderAndRecord(Vec<u8>, &'a [u8]),
    /// The frame is a capture record
    Record(&'a [u8]),
    /// The frame is a duplicate header and produces no output
    Discard,
}

/// Decides, for each received frame, what must be written to the output
///
/// The first frame fixes the stream header: either the producer's own header,
/// or a synthesized one when the relay started after the producer. Header
/// frames received later are dropped.
#[derive(Debug)]
pub struct Classifier {
    state: HeaderState,
    linktype: Option<Linktype>,
    snaplen: u32,
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::new()
    }
}

impl Classifier {
    pub fn new() -> Self {
        Classifier::with_snaplen(DEFAULT_SNAPLEN)
    }

    /// Build a classifier declaring `snaplen` in synthesized headers
    pub fn with_snaplen(snaplen: u32) -> Self {
        Classifier {
            state: HeaderState::NotSent,
            linktype: None,
            snaplen,
        }
    }

    pub fn state(&self) -> HeaderState {
        self.state
    }

    /// Link type of the emitted header, once known
    pub fn linktype(&self) -> Option<Linktype> {
        self.linktype
    }

    /// Framing of the emitted header, if it is one the producer uses
    pub fn link_layer(&self) -> Option<LinkLayer> {
        self.linktype.and_then(LinkLayer::from_linktype)
    }

    pub fn classify<'a>(&mut self, frame: &'a [u8]) -> Result<Action<'a>, Error> {
        let header_frame = is_header_frame(frame);
        match self.state {
            HeaderState::NotSent if header_frame => {
                let linktype = declared_linktype(frame);
                info!("Received pcap header, link type {:?}", linktype);
                self.linktype = linktype;
                self.state = HeaderState::Sent;
                Ok(Action::Header(frame))
            }
            HeaderState::NotSent => {
                let link_layer = if has_trailer(frame) {
                    LinkLayer::Ethernet
                } else {
                    LinkLayer::Raw
                };
                info!("No pcap header received, sending {} header", link_layer);
                let header = synthesize_header(link_layer, self.snaplen)?;
                self.linktype = Some(link_layer.linktype());
                self.state = HeaderState::Sent;
                Ok(Action::HeaderAndRecord(header, frame))
            }
            HeaderState::Sent if header_frame => {
                debug!("pcap header detected, skipping");
                Ok(Action::Discard)
            }
            HeaderState::Sent => Ok(Action::Record(frame)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::PCAP_HEADER_LEN;
    use crate::trailer::{TRAILER_LEN, TRAILER_MAGIC};

    fn eth_record() -> Vec<u8> {
        let mut v = vec![0x11; 54];
        v.extend_from_slice(&TRAILER_MAGIC);
        v.extend_from_slice(&[0; TRAILER_LEN - 4]);
        v
    }

    #[test]
    fn classify_producer_header_first() {
        let hdr = synthesize_header(LinkLayer::Ethernet, 1500).expect("header");
        let mut c = Classifier::new();
        assert_eq!(c.state(), HeaderState::NotSent);
        assert_eq!(c.classify(&hdr).expect("classify"), Action::Header(&hdr));
        assert_eq!(c.state(), HeaderState::Sent);
        assert_eq!(c.link_layer(), Some(LinkLayer::Ethernet));
        assert_eq!(c.classify(b"X").expect("classify"), Action::Record(b"X"));
    }

    #[test]
    fn classify_synthesize_raw() {
        let mut c = Classifier::new();
        match c.classify(b"X").expect("classify") {
            Action::HeaderAndRecord(hdr, rec) => {
                assert_eq!(hdr.len(), PCAP_HEADER_LEN);
                assert_eq!(declared_linktype(&hdr), Some(Linktype::RAW));
                assert_eq!(rec, b"X");
            }
            a => panic!("unexpected action {:?}", a),
        }
        assert_eq!(c.link_layer(), Some(LinkLayer::Raw));
    }

    #[test]
    fn classify_synthesize_ethernet() {
        let rec = eth_record();
        let mut c = Classifier::new();
        match c.classify(&rec).expect("classify") {
            Action::HeaderAndRecord(hdr, r) => {
                assert_eq!(declared_linktype(&hdr), Some(Linktype::ETHERNET));
                assert_eq!(r, &rec[..]);
            }
            a => panic!("unexpected action {:?}", a),
        }
    }

    #[test]
    fn classify_link_layer_is_fixed() {
        let mut c = Classifier::new();
        c.classify(b"raw record").expect("classify");
        assert_eq!(c.link_layer(), Some(LinkLayer::Raw));
        let rec = eth_record();
        assert_eq!(c.classify(&rec).expect("classify"), Action::Record(&rec));
        assert_eq!(c.link_layer(), Some(LinkLayer::Raw));
    }

    #[test]
    fn classify_duplicate_headers() {
        let raw = synthesize_header(LinkLayer::Raw, DEFAULT_SNAPLEN).expect("header");
        let eth = synthesize_header(LinkLayer::Ethernet, DEFAULT_SNAPLEN).expect("header");
        let mut c = Classifier::new();
        assert_eq!(c.classify(&raw).expect("classify"), Action::Header(&raw));
        assert_eq!(c.classify(&raw).expect("classify"), Action::Discard);
        // a different header does not change the declared link type
        assert_eq!(c.classify(&eth).expect("classify"), Action::Discard);
        assert_eq!(c.link_layer(), Some(LinkLayer::Raw));
        assert_eq!(c.state(), HeaderState::Sent);
    }

    #[test]
    fn classify_late_header_is_dropped() {
        let raw = synthesize_header(LinkLayer::Raw, DEFAULT_SNAPLEN).expect("header");
        let mut c = Classifier::new();
        assert!(matches!(
            c.classify(b"first").expect("classify"),
            Action::HeaderAndRecord(_, _)
        ));
        assert_eq!(c.classify(&raw).expect("classify"), Action::Discard);
    }

    #[test]
    fn classify_custom_snaplen() {
        let mut c = Classifier::with_snaplen(2048);
        match c.classify(b"X").expect("classify") {
            Action::HeaderAndRecord(hdr, _) => {
                assert_eq!(&hdr[16..20], &2048u32.to_le_bytes());
            }
            a => panic!("unexpected action {:?}", a),
        }
    }
}

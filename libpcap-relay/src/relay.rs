use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::classifier::{Action, Classifier};
use crate::error::Error;
use crate::sink::OutputSink;
use crate::source::{FrameSource, Recv};

/// Counters maintained while relaying
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Frames received
    pub frames: u64,
    /// Capture records written
    pub records: u64,
    /// Duplicate headers dropped
    pub headers_discarded: u64,
    /// Total bytes written, including the header
    pub bytes_written: u64,
}

/// Relay engine: receive frames, classify them, and write the pcap stream
///
/// ## example
///
/// ```
/// use libpcap_relay::{Classifier, OutputSink, Relay, VecFrameSource};
/// use std::sync::atomic::AtomicBool;
/// use std::sync::Arc;
///
/// let source = VecFrameSource::new(vec![b"record".to_vec()]);
/// let sink = OutputSink::new(Vec::new());
/// let mut relay = Relay::new(source, sink, Classifier::new());
/// let stats = relay.run(Arc::new(AtomicBool::new(true))).expect("relay");
/// assert_eq!(stats.records, 1);
/// // 24 bytes of synthesized header, then the record
/// assert_eq!(relay.sink().get_ref().len(), 24 + 6);
/// ```
pub struct Relay<S: FrameSource, W: Write> {
    source: S,
    sink: OutputSink<W>,
    classifier: Classifier,
    stats: RelayStats,
}

impl<S: FrameSource, W: Write> Relay<S, W> {
    pub fn new(source: S, sink: OutputSink<W>, classifier: Classifier) -> Self {
        Relay {
            source,
            sink,
            classifier,
            stats: RelayStats::default(),
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn sink(&self) -> &OutputSink<W> {
        &self.sink
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    pub fn into_sink(self) -> OutputSink<W> {
        self.sink
    }

    /// Relay frames while `running` is true, or until the source is closed
    pub fn run(&mut self, running: Arc<AtomicBool>) -> Result<RelayStats, Error> {
        debug!("Relay: waiting for frames");
        while running.load(Ordering::SeqCst) {
            let frame = match self.source.recv_frame()? {
                Recv::Frame(frame) => frame,
                Recv::Idle => continue,
                Recv::Closed => {
                    debug!("Relay: source closed");
                    break;
                }
            };
            self.stats.frames += 1;
            match frame.source {
                Some(addr) => debug!("Got a {}B packet from {}", frame.data.len(), addr),
                None => debug!("Got a {}B packet", frame.data.len()),
            }
            match self.classifier.classify(frame.data)? {
                Action::Header(header) => {
                    self.sink.write(header)?;
                }
                Action::HeaderAndRecord(header, record) => {
                    self.sink.write(&header)?;
                    self.sink.write(record)?;
                    self.stats.records += 1;
                }
                Action::Record(record) => {
                    self.sink.write(record)?;
                    self.stats.records += 1;
                }
                Action::Discard => {
                    self.stats.headers_discarded += 1;
                }
            }
            self.stats.bytes_written = self.sink.bytes_written();
        }
        self.sink.flush()?;
        info!(
            "Relay stopped: {} frames, {} records, {} duplicate headers, {} bytes written",
            self.stats.frames,
            self.stats.records,
            self.stats.headers_discarded,
            self.stats.bytes_written
        );
        Ok(self.stats)
    }
}

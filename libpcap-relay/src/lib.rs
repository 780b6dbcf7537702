//! Rebuild a pcap stream from capture records received over UDP
//!
//! A remote capture producer sends its pcap global header, then one datagram
//! per capture record. The relay may start after the producer (and miss the
//! header), and the producer may send its header again. [`Classifier`] makes
//! sure the output always starts with exactly one header, synthesizing it from
//! the first record if needed.

mod classifier;
mod config;
mod error;
mod header;
mod relay;
mod sink;
mod source;
pub mod trailer;

pub use classifier::*;
pub use config::*;
pub use error::*;
pub use header::*;
pub use relay::*;
pub use sink::*;
pub use source::*;

pub use pcap_parser;

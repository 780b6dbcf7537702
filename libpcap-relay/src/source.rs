use std::collections::VecDeque;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use tracing::debug;

use crate::error::Error;

/// Largest datagram accepted by the UDP receiver
pub const MAX_DATAGRAM_SIZE: usize = 65535;

/// Data received in one receive call
#[derive(Clone, Copy, Debug)]
pub struct CaptureFrame<'a> {
    pub data: &'a [u8],
    /// Sender address. Informational only.
    pub source: Option<SocketAddr>,
}

/// Result of a receive call
#[derive(Debug)]
pub enum Recv<'a> {
    Frame(CaptureFrame<'a>),
    /// Nothing was received during the poll interval
    Idle,
    /// No more frames will be produced
    Closed,
}

/// Producer of capture frames
pub trait FrameSource {
    /// Wait for the next frame
    ///
    /// The returned frame borrows the source, and is valid until the next call.
    fn recv_frame(&mut self) -> Result<Recv<'_>, Error>;
}

/// Frame source reading datagrams from a bound UDP socket
pub struct UdpFrameSource {
    socket: UdpSocket,
    buffer: Vec<u8>,
}

impl UdpFrameSource {
    /// Bind the socket to `addr`
    ///
    /// If `poll_interval` is set, `recv_frame` returns [`Recv::Idle`] when no
    /// datagram was received during this interval, instead of blocking forever.
    /// A zero interval is rejected.
    pub fn bind<A: ToSocketAddrs>(addr: A, poll_interval: Option<Duration>) -> Result<Self, Error> {
        if poll_interval.is_some_and(|d| d.is_zero()) {
            return Err(Error::Config("poll interval must not be zero".to_owned()));
        }
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or(Error::Generic("No address to bind to"))?;
        let socket = UdpSocket::bind(addr).map_err(|source| Error::Bind { addr, source })?;
        socket.set_read_timeout(poll_interval)?;
        debug!("UDP socket bound to {}", addr);
        Ok(UdpFrameSource {
            socket,
            buffer: vec![0; MAX_DATAGRAM_SIZE],
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.socket.local_addr()?)
    }
}

impl FrameSource for UdpFrameSource {
    fn recv_frame(&mut self) -> Result<Recv<'_>, Error> {
        match self.socket.recv_from(&mut self.buffer) {
            Ok((len, addr)) => Ok(Recv::Frame(CaptureFrame {
                data: &self.buffer[..len],
                source: Some(addr),
            })),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(Recv::Idle)
            }
            Err(e) => Err(Error::Receive(e)),
        }
    }
}

/// Frame source replaying a list of frames, then closing
#[derive(Debug, Default)]
pub struct VecFrameSource {
    frames: VecDeque<Vec<u8>>,
    current: Vec<u8>,
}

impl VecFrameSource {
    pub fn new<I, T>(frames: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Vec<u8>>,
    {
        VecFrameSource {
            frames: frames.into_iter().map(Into::into).collect(),
            current: Vec::new(),
        }
    }

    /// Number of frames not yet received
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for VecFrameSource {
    fn recv_frame(&mut self) -> Result<Recv<'_>, Error> {
        match self.frames.pop_front() {
            Some(frame) => {
                self.current = frame;
                Ok(Recv::Frame(CaptureFrame {
                    data: &self.current,
                    source: None,
                }))
            }
            None => Ok(Recv::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_source_replays_frames() {
        let mut src = VecFrameSource::new(vec![b"ab".to_vec(), b"cde".to_vec()]);
        assert_eq!(src.remaining(), 2);
        match src.recv_frame().expect("recv") {
            Recv::Frame(f) => assert_eq!(f.data, b"ab"),
            r => panic!("unexpected {:?}", r),
        }
        match src.recv_frame().expect("recv") {
            Recv::Frame(f) => assert_eq!(f.data, b"cde"),
            r => panic!("unexpected {:?}", r),
        }
        assert!(matches!(src.recv_frame().expect("recv"), Recv::Closed));
        assert!(matches!(src.recv_frame().expect("recv"), Recv::Closed));
    }

    #[test]
    fn udp_source_idle_on_timeout() {
        let mut src = UdpFrameSource::bind("127.0.0.1:0", Some(Duration::from_millis(10)))
            .expect("bind");
        assert!(matches!(src.recv_frame().expect("recv"), Recv::Idle));
    }

    #[test]
    fn udp_source_zero_poll_interval() {
        match UdpFrameSource::bind("127.0.0.1:0", Some(Duration::ZERO)) {
            Err(Error::Config(msg)) => assert!(msg.contains("poll interval")),
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("zero poll interval should be rejected"),
        }
    }

    #[test]
    fn udp_source_receives_datagram() {
        let mut src = UdpFrameSource::bind("127.0.0.1:0", Some(Duration::from_secs(5)))
            .expect("bind");
        let addr = src.local_addr().expect("local addr");
        let sender = UdpSocket::bind("127.0.0.1:0").expect("sender");
        sender.send_to(b"record", addr).expect("send");
        match src.recv_frame().expect("recv") {
            Recv::Frame(f) => {
                assert_eq!(f.data, b"record");
                assert_eq!(f.source, Some(sender.local_addr().expect("sender addr")));
            }
            r => panic!("unexpected {:?}", r),
        }
    }

    #[test]
    fn udp_source_bind_conflict() {
        let first = UdpFrameSource::bind("127.0.0.1:0", None).expect("bind");
        let addr = first.local_addr().expect("local addr");
        match UdpFrameSource::bind(addr, None) {
            Err(Error::Bind { addr: a, .. }) => assert_eq!(a, addr),
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("second bind should fail"),
        }
    }
}

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Error;

/// Destination of the pcap stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

impl Output {
    /// Parse an output name. The special value "-" means standard output.
    pub fn from_name<P: AsRef<Path>>(name: P) -> Self {
        let name = name.as_ref();
        if name == Path::new("-") {
            Output::Stdout
        } else {
            Output::File(name.to_path_buf())
        }
    }

    /// Open the destination. Files are created, or truncated if they exist.
    pub fn open(&self) -> Result<Box<dyn Write + Send>, Error> {
        match self {
            Output::Stdout => Ok(Box::new(io::stdout())),
            Output::File(path) => {
                debug!("Opening output file '{}'", path.display());
                let file = File::create(path).map_err(|source| Error::OutputOpen {
                    path: path.clone(),
                    source,
                })?;
                Ok(Box::new(file))
            }
        }
    }
}

/// Append-only sink, flushing after each write
///
/// Flushing lets a consumer reading the stream through a pipe see each record
/// as soon as it is received. The underlying writer (and file, if any) is
/// closed when the sink is dropped.
pub struct OutputSink<W: Write> {
    w: W,
    bytes_written: u64,
}

impl<W: Write> OutputSink<W> {
    pub fn new(w: W) -> Self {
        OutputSink { w, bytes_written: 0 }
    }

    pub fn write(&mut self, data: &[u8]) -> Result<(), Error> {
        self.w.write_all(data).map_err(Error::Write)?;
        self.w.flush().map_err(Error::Write)?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), Error> {
        self.w.flush().map_err(Error::Write)
    }

    /// Total number of bytes written
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn get_ref(&self) -> &W {
        &self.w
    }

    pub fn into_inner(self) -> W {
        self.w
    }
}

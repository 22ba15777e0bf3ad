//! TCP transport for network-attached printers

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::transport::Transport;

/// TCP transport over a connected stream
///
/// Reads use a short socket timeout so the reader thread never blocks while
/// holding the transport lock; a timed-out read reports `Ok(0)`.
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Connect to the device at `address` (host:port)
    pub fn connect(address: &str, read_timeout: Duration) -> Result<Self> {
        info!("Connecting to printer at {}", address);
        let stream = TcpStream::connect(address)?;
        stream.set_read_timeout(Some(read_timeout))?;
        stream.set_nodelay(true)?;
        debug!("Connected to {}", address);
        Ok(Self { stream })
    }
}

impl Transport for TcpTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        match self.stream.read(buffer) {
            Ok(0) => Err(Error::ConnectionClosed),
            Ok(n) => Ok(n),
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Ok(0)
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        Ok(self.stream.write(data)?)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(self.stream.flush()?)
    }
}

//! Mock transport for testing

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::transport::Transport;

#[derive(Default)]
struct MockState {
    read_buffer: VecDeque<u8>,
    write_buffer: Vec<u8>,
    closed: bool,
}

/// Mock transport that queues injected reads and captures writes
///
/// Clones share state, so a test can keep a handle while the transport
/// itself is owned by a session or reader thread.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes to be returned by subsequent reads
    pub fn inject_read(&self, data: &[u8]) {
        self.state.lock().read_buffer.extend(data);
    }

    /// Take all bytes written so far, clearing the capture buffer
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.state.lock().write_buffer)
    }

    /// Make every further read and write fail with `ConnectionClosed`
    pub fn close(&self) {
        self.state.lock().closed = true;
    }

    /// Bytes still queued for reading
    pub fn pending_reads(&self) -> usize {
        self.state.lock().read_buffer.len()
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::ConnectionClosed);
        }
        let mut count = 0;
        while count < buffer.len() {
            match state.read_buffer.pop_front() {
                Some(b) => {
                    buffer[count] = b;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::ConnectionClosed);
        }
        state.write_buffer.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn available(&mut self) -> Result<usize> {
        Ok(self.state.lock().read_buffer.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_and_read() {
        let mut mock = MockTransport::new();
        mock.inject_read(&[1, 2, 3]);
        let mut buf = [0u8; 8];
        assert_eq!(mock.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert_eq!(mock.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_write_capture() {
        let mut mock = MockTransport::new();
        mock.write(&[0xAA]).unwrap();
        mock.write(&[0xBB, 0xCC]).unwrap();
        assert_eq!(mock.take_written(), vec![0xAA, 0xBB, 0xCC]);
        assert!(mock.take_written().is_empty());
    }

    #[test]
    fn test_clone_shares_state() {
        let mock = MockTransport::new();
        let mut handle = mock.clone();
        mock.inject_read(&[7]);
        let mut buf = [0u8; 1];
        assert_eq!(handle.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], 7);
    }

    #[test]
    fn test_closed_transport_errors() {
        let mut mock = MockTransport::new();
        mock.close();
        let mut buf = [0u8; 1];
        assert!(matches!(mock.read(&mut buf), Err(Error::ConnectionClosed)));
        assert!(matches!(mock.write(&[0]), Err(Error::ConnectionClosed)));
    }
}

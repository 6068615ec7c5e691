//! In-memory serial connector for testing without a controller board.
//!
//! [`MockSerial`] plays the host side of the port; [`MockController`] plays
//! the board. Lines emitted by the controller arrive on the current
//! connection's reader half; everything the host writes is captured for
//! inspection. Open and write failures can be scripted to drive the link
//! through its reconnect paths.

use crate::traits::{SerialConnector, SerialHalves};
use crate::{HardwareError, LinkConfig, Result};
use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct Shared {
    /// Sender feeding the reader half of the live connection.
    inbound: Option<Sender<Vec<u8>>>,
    written: Vec<u8>,
    open_count: usize,
    failed_opens_remaining: usize,
    fail_writes: bool,
    unplugged: bool,
}

impl Shared {
    fn writes_blocked(&self) -> bool {
        self.fail_writes || self.unplugged
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock serial connector.
///
/// # Examples
///
/// ```
/// use facegate_hardware::mock::MockSerial;
/// use facegate_hardware::traits::SerialConnector;
/// use facegate_hardware::LinkConfig;
/// use std::io::Write;
///
/// let (connector, controller) = MockSerial::new();
/// let mut halves = connector.open(&LinkConfig::new("mock")).unwrap();
///
/// halves.writer.write_all(b"FAN:ON\n").unwrap();
/// assert_eq!(controller.written_lines(), vec!["FAN:ON"]);
/// ```
#[derive(Debug, Clone)]
pub struct MockSerial {
    shared: Arc<Mutex<Shared>>,
}

impl MockSerial {
    /// Create a connector and the handle controlling its far end.
    pub fn new() -> (Self, MockController) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        (
            Self {
                shared: Arc::clone(&shared),
            },
            MockController { shared },
        )
    }
}

impl SerialConnector for MockSerial {
    fn open(&self, config: &LinkConfig) -> Result<SerialHalves> {
        let mut shared = lock(&self.shared);

        if shared.failed_opens_remaining > 0 {
            shared.failed_opens_remaining -= 1;
            return Err(HardwareError::open_failed(
                config.port.clone(),
                "No such file or directory",
            ));
        }

        let (tx, rx) = mpsc::channel();
        // Replacing the sender ends any earlier connection's reader with EOF.
        shared.inbound = Some(tx);
        shared.unplugged = false;
        shared.open_count += 1;

        Ok(SerialHalves {
            reader: Box::new(MockReadHalf {
                rx,
                pending: Vec::new(),
                timeout: config.read_timeout,
            }),
            writer: Box::new(MockWriteHalf {
                shared: Arc::clone(&self.shared),
            }),
        })
    }
}

/// Test-side handle acting as the controller board.
#[derive(Debug, Clone)]
pub struct MockController {
    shared: Arc<Mutex<Shared>>,
}

impl MockController {
    /// Emit one line (a terminator is appended).
    ///
    /// Returns `false` if no connection is open.
    pub fn emit_line(&self, line: &str) -> bool {
        let mut bytes = line.as_bytes().to_vec();
        bytes.push(b'\n');
        self.emit_bytes(bytes)
    }

    /// Emit raw bytes, which may hold partial or multiple lines.
    pub fn emit_bytes(&self, bytes: Vec<u8>) -> bool {
        let shared = lock(&self.shared);
        match &shared.inbound {
            Some(tx) => tx.send(bytes).is_ok(),
            None => false,
        }
    }

    /// Simulate the cable being pulled: the reader sees end of stream and
    /// further writes fail until the next successful open.
    pub fn unplug(&self) {
        let mut shared = lock(&self.shared);
        shared.inbound = None;
        shared.unplugged = true;
    }

    /// Make the next `count` open attempts fail.
    pub fn fail_next_opens(&self, count: usize) {
        lock(&self.shared).failed_opens_remaining = count;
    }

    /// Make writes fail (or succeed again), across reconnects.
    pub fn set_write_failure(&self, fail: bool) {
        lock(&self.shared).fail_writes = fail;
    }

    /// Number of successful opens so far.
    pub fn open_count(&self) -> usize {
        lock(&self.shared).open_count
    }

    /// Returns `true` while a connection is open on the host side.
    pub fn is_open(&self) -> bool {
        lock(&self.shared).inbound.is_some()
    }

    /// Complete lines written by the host, terminators stripped.
    pub fn written_lines(&self) -> Vec<String> {
        let shared = lock(&self.shared);
        String::from_utf8_lossy(&shared.written)
            .split_terminator('\n')
            .map(str::to_string)
            .collect()
    }
}

struct MockReadHalf {
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    timeout: Duration,
}

impl Read for MockReadHalf {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.rx.recv_timeout(self.timeout) {
                Ok(chunk) => self.pending = chunk,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out"));
                }
                Err(RecvTimeoutError::Disconnected) => return Ok(0),
            }
        }

        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

struct MockWriteHalf {
    shared: Arc<Mutex<Shared>>,
}

impl Write for MockWriteHalf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut shared = lock(&self.shared);
        if shared.writes_blocked() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        shared.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if lock(&self.shared).writes_blocked() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};

    fn config() -> LinkConfig {
        LinkConfig::new("mock").with_read_timeout(Duration::from_millis(20))
    }

    #[test]
    fn test_emitted_lines_reach_reader() {
        let (connector, controller) = MockSerial::new();
        let halves = connector.open(&config()).unwrap();
        let mut reader = BufReader::new(halves.reader);

        assert!(controller.emit_line("hello"));
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        assert_eq!(line, "hello\n");
    }

    #[test]
    fn test_idle_read_times_out() {
        let (connector, _controller) = MockSerial::new();
        let mut halves = connector.open(&config()).unwrap();

        let mut buf = [0u8; 8];
        let err = halves.reader.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_unplug_gives_eof_and_failing_writes() {
        let (connector, controller) = MockSerial::new();
        let mut halves = connector.open(&config()).unwrap();

        controller.unplug();

        let mut buf = [0u8; 8];
        assert_eq!(halves.reader.read(&mut buf).unwrap(), 0);
        assert!(halves.writer.write_all(b"GRANTED\n").is_err());
        assert!(!controller.is_open());
    }

    #[test]
    fn test_scripted_open_failures() {
        let (connector, controller) = MockSerial::new();
        controller.fail_next_opens(2);

        assert!(connector.open(&config()).is_err());
        assert!(connector.open(&config()).is_err());
        assert!(connector.open(&config()).is_ok());
        assert_eq!(controller.open_count(), 1);
    }

    #[test]
    fn test_emit_without_connection() {
        let (_connector, controller) = MockSerial::new();
        assert!(!controller.emit_line("ignored"));
    }
}

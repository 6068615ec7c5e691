//! Serial transport link to the controller board.
//!
//! The link owns one connection at a time and moves through an explicit
//! state machine (see [`LinkState`]). Writes and (re)connects serialize on a
//! single connection lock; reads happen on a dedicated reader thread that
//! takes the lock only to claim a freshly opened read half.
//!
//! ```text
//!                 ┌───────────────── connection lock ─────────────────┐
//!  send(cmd) ────►│ connect if needed ─► write line ─► flush          │
//!                 │        on error: drop halves, Disconnected, epoch+1│
//!                 └───────────────────────────────────────────────────┘
//!
//!  reader thread: claim read half ─► read lines (bounded timeout) ─► mirror
//!                       ▲                    │ EOF / I/O error
//!                       └──── backoff ◄──────┘
//! ```
//!
//! Every connect and disconnect bumps an atomic epoch. The reader compares
//! its claim's epoch against the current one between reads and abandons a
//! handle that a writer has already replaced, without taking the lock.

use crate::mirror::DeviceMirror;
use crate::traits::SerialConnector;
use crate::types::{LinkConfig, LinkState};
use crate::{HardwareError, Result};
use facegate_core::constants::MAX_LINE_LENGTH;
use facegate_protocol::{Command, InboundLine, classify_line};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Log target for free-form text printed by the controller firmware.
pub const CONTROLLER_LOG_TARGET: &str = "facegate::controller";

#[derive(Default)]
struct Connection {
    state: LinkState,
    writer: Option<Box<dyn Write + Send>>,
    /// Read half waiting to be claimed by the reader thread.
    reader: Option<Box<dyn Read + Send>>,
}

/// Serial link to the controller.
///
/// # Examples
///
/// ```
/// use facegate_hardware::{LinkConfig, LinkState, TransportLink};
/// use facegate_hardware::mock::MockSerial;
/// use facegate_protocol::Command;
///
/// let (connector, controller) = MockSerial::new();
/// let link = TransportLink::new(LinkConfig::new("mock"), connector);
/// assert_eq!(link.state(), LinkState::Disconnected);
///
/// // Sending connects on demand.
/// link.send(&Command::Grant)?;
/// assert_eq!(link.state(), LinkState::Connected);
/// assert_eq!(controller.written_lines(), vec!["GRANTED"]);
/// # Ok::<(), facegate_hardware::HardwareError>(())
/// ```
pub struct TransportLink {
    config: LinkConfig,
    connector: Box<dyn SerialConnector>,
    connection: Mutex<Connection>,
    epoch: AtomicU64,
    reader_attached: AtomicBool,
}

impl std::fmt::Debug for TransportLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportLink")
            .field("port", &self.config.port)
            .field("state", &self.state())
            .field("epoch", &self.epoch.load(Ordering::Acquire))
            .finish()
    }
}

impl TransportLink {
    /// Create a disconnected link. Nothing is opened until the first
    /// [`send`](Self::send), [`ensure_connected`](Self::ensure_connected) or
    /// reader start.
    pub fn new(config: LinkConfig, connector: impl SerialConnector + 'static) -> Self {
        Self {
            config,
            connector: Box::new(connector),
            connection: Mutex::new(Connection::default()),
            epoch: AtomicU64::new(0),
            reader_attached: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Current connection state.
    pub fn state(&self) -> LinkState {
        self.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == LinkState::Connected
    }

    /// Open the port unless already connected.
    ///
    /// # Errors
    /// Returns the connector's error (typically `HardwareError::OpenFailed`);
    /// the link is left `Disconnected` and the caller decides when to retry.
    pub fn ensure_connected(&self) -> Result<()> {
        let mut conn = self.lock();
        if conn.state == LinkState::Connected {
            return Ok(());
        }
        self.open_locked(&mut conn)
    }

    /// Close the current connection, if any.
    pub fn disconnect(&self) {
        let mut conn = self.lock();
        if conn.state == LinkState::Connected {
            info!(port = %self.config.port, "Disconnecting from controller");
            self.close_locked(&mut conn);
        }
    }

    /// Write one command line and flush it.
    ///
    /// Connects first if needed. Blocks for the duration of the write, so
    /// async callers should run it on a blocking thread.
    ///
    /// # Errors
    /// Returns a transport error if the port cannot be opened or the write
    /// fails. A failed write leaves the link `Disconnected`; the next send or
    /// the reader's next cycle reconnects.
    pub fn send(&self, command: &Command) -> Result<()> {
        let mut conn = self.lock();

        if conn.state != LinkState::Connected {
            self.open_locked(&mut conn)?;
        }

        let bytes = command.encode();
        let outcome = match conn.writer.as_mut() {
            Some(writer) => writer.write_all(&bytes).and_then(|()| writer.flush()),
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection has no write half",
            )),
        };

        match outcome {
            Ok(()) => {
                debug!(command = %command, "Sent command to controller");
                Ok(())
            }
            Err(e) => {
                warn!(command = %command, error = %e, "Write to controller failed");
                self.close_locked(&mut conn);
                Err(HardwareError::communication(format!(
                    "failed to send {command} on {}: {e}",
                    self.config.port
                )))
            }
        }
    }

    fn open_locked(&self, conn: &mut Connection) -> Result<()> {
        conn.state = LinkState::Connecting;
        debug!(port = %self.config.port, "Connecting to controller");

        match self.connector.open(&self.config) {
            Ok(halves) => {
                conn.writer = Some(halves.writer);
                conn.reader = Some(halves.reader);
                conn.state = LinkState::Connected;
                self.epoch.fetch_add(1, Ordering::AcqRel);
                info!(
                    port = %self.config.port,
                    baud = self.config.baud_rate,
                    "Connected to controller"
                );
                Ok(())
            }
            Err(e) => {
                conn.state = LinkState::Disconnected;
                warn!(port = %self.config.port, error = %e, "Failed to connect to controller");
                Err(e)
            }
        }
    }

    fn close_locked(&self, conn: &mut Connection) {
        conn.writer = None;
        conn.reader = None;
        conn.state = LinkState::Disconnected;
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }

    /// Close the connection only if it is still the one from `epoch`.
    fn close_if_current(&self, epoch: u64) {
        let mut conn = self.lock();
        if self.epoch.load(Ordering::Acquire) == epoch && conn.state == LinkState::Connected {
            self.close_locked(&mut conn);
        }
    }

    /// Connect if needed and take the pending read half.
    fn claim_reader(&self) -> Result<(u64, Box<dyn Read + Send>)> {
        let mut conn = self.lock();

        if conn.state != LinkState::Connected {
            self.open_locked(&mut conn)?;
        }

        match conn.reader.take() {
            Some(reader) => Ok((self.epoch.load(Ordering::Acquire), reader)),
            None => {
                // Connected but the read half is gone: start over.
                self.close_locked(&mut conn);
                Err(HardwareError::disconnected(self.config.port.clone()))
            }
        }
    }

    /// Start the reader thread feeding `mirror`.
    ///
    /// The thread connects, reads lines until the connection fails, waits
    /// `retry_interval` and reconnects, forever, until the returned handle
    /// is shut down or dropped.
    ///
    /// # Errors
    /// Returns `HardwareError::ReaderAlreadyRunning` if a reader was already
    /// started on this link, or an I/O error if the thread cannot be spawned.
    pub fn spawn_reader(self: &Arc<Self>, mirror: Arc<DeviceMirror>) -> Result<ReaderHandle> {
        if self.reader_attached.swap(true, Ordering::AcqRel) {
            return Err(HardwareError::ReaderAlreadyRunning {
                port: self.config.port.clone(),
            });
        }

        let (stop_tx, stop_rx) = mpsc::channel();
        let link = Arc::clone(self);

        let spawned = std::thread::Builder::new()
            .name("facegate-serial-reader".to_string())
            .spawn(move || link.run_reader(&mirror, &stop_rx));

        match spawned {
            Ok(thread) => Ok(ReaderHandle {
                stop_tx,
                thread: Some(thread),
            }),
            Err(e) => {
                self.reader_attached.store(false, Ordering::Release);
                Err(e.into())
            }
        }
    }

    fn run_reader(&self, mirror: &DeviceMirror, stop_rx: &Receiver<()>) {
        info!(port = %self.config.port, "Serial reader started");

        loop {
            if stop_requested(stop_rx) {
                break;
            }

            match self.claim_reader() {
                Ok((epoch, reader)) => match self.read_session(epoch, reader, mirror, stop_rx) {
                    SessionEnd::Stopped => break,
                    SessionEnd::Superseded => {
                        debug!("Read half superseded by a newer connection");
                        continue;
                    }
                    SessionEnd::Failed(e) => {
                        error!(port = %self.config.port, error = %e, "Serial read failed");
                        self.close_if_current(epoch);
                    }
                },
                Err(e) => {
                    debug!(error = %e, retry_in = ?self.config.retry_interval, "Reconnect deferred");
                }
            }

            match stop_rx.recv_timeout(self.config.retry_interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.reader_attached.store(false, Ordering::Release);
        info!(port = %self.config.port, "Serial reader stopped");
    }

    fn read_session(
        &self,
        epoch: u64,
        reader: Box<dyn Read + Send>,
        mirror: &DeviceMirror,
        stop_rx: &Receiver<()>,
    ) -> SessionEnd {
        let mut reader = BufReader::new(reader);
        let mut line = Vec::with_capacity(256);
        // Set while skipping the remainder of an overlong line.
        let mut discarding = false;

        loop {
            if stop_requested(stop_rx) {
                return SessionEnd::Stopped;
            }
            if self.epoch.load(Ordering::Acquire) != epoch {
                return SessionEnd::Superseded;
            }

            // Bytes from a read that timed out mid-line stay in `line`.
            let budget = (MAX_LINE_LENGTH + 1).saturating_sub(line.len()) as u64;
            match reader.by_ref().take(budget).read_until(b'\n', &mut line) {
                Ok(0) => {
                    return SessionEnd::Failed(HardwareError::disconnected(
                        self.config.port.clone(),
                    ));
                }
                Ok(_) => {
                    let terminated = line.last() == Some(&b'\n');
                    if discarding {
                        discarding = !terminated;
                    } else if terminated || line.len() <= MAX_LINE_LENGTH {
                        dispatch_line(&line, mirror);
                    } else {
                        warn!(limit = MAX_LINE_LENGTH, "Dropping overlong line from controller");
                        discarding = true;
                    }
                    line.clear();
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut
                            | io::ErrorKind::WouldBlock
                            | io::ErrorKind::Interrupted
                    ) => {}
                Err(e) => return SessionEnd::Failed(e.into()),
            }
        }
    }
}

enum SessionEnd {
    Stopped,
    Superseded,
    Failed(HardwareError),
}

fn stop_requested(stop_rx: &Receiver<()>) -> bool {
    !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty))
}

fn dispatch_line(raw: &[u8], mirror: &DeviceMirror) {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);

    match classify_line(raw) {
        Ok(Some(InboundLine::Status(packet))) => {
            trace!(packet = %packet.to_line(), "Status packet received");
            mirror.apply_inbound(&packet);
        }
        Ok(Some(InboundLine::Diagnostic(text))) => {
            info!(target: CONTROLLER_LOG_TARGET, "{text}");
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Dropping malformed line from controller"),
    }
}

/// Handle to a running reader thread.
///
/// Dropping the handle also stops the reader, at its next check.
#[derive(Debug)]
pub struct ReaderHandle {
    stop_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl ReaderHandle {
    /// Signal the reader to stop and wait for it.
    ///
    /// Blocks for at most one read timeout.
    ///
    /// # Errors
    /// Returns `HardwareError::Other` if the reader thread panicked.
    pub fn shutdown(mut self) -> Result<()> {
        let _ = self.stop_tx.send(());
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| HardwareError::other("serial reader thread panicked")),
            None => Ok(()),
        }
    }

    /// Returns `true` once the reader thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

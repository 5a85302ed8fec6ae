//! Serial link lifecycle and the telemetry monitor loop.
//!
//! [`LinkManager`] is the only owner of the serial handle. The consumer
//! calls [`LinkManager::connect`] / [`LinkManager::send`] /
//! [`LinkManager::disconnect`] from its own context; inbound frames are read
//! continuously by a background monitor task spawned per connection. The
//! stream is split with [`tokio::io::split`] so the write half stays with
//! the manager while the read half moves into the monitor task — neither
//! context ever touches the other's half.
//!
//! Teardown is cooperative: `disconnect()` (and a repeated `connect()`)
//! signals the monitor task over a oneshot channel, awaits its
//! [`JoinHandle`], and only then drops the write half. The task is never
//! aborted mid-read, and no two monitor loops ever run against the same
//! manager.

use crate::config::LinkConfig;
use crate::error::{LinkError, LinkResult};
use crate::event::EventSink;
use crate::protocol::{self, Command};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf, WriteHalf};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_serial::SerialPortBuilderExt;

/// Async transport usable as the link, real or mocked.
///
/// `tokio_serial::SerialStream` for hardware; `tokio::io::DuplexStream` for
/// tests and the bench simulator.
pub trait LinkIo: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> LinkIo for T {}

/// Type-erased boxed link transport.
pub type DynLinkIo = Box<dyn LinkIo>;

/// Pause after a transport read error before retrying, so a persistently
/// failing device cannot spin the loop hot.
const READ_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Consumer-visible connection status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// No connection, none attempted since the last teardown.
    Disconnected,
    /// Handle open, monitor loop running.
    Connected,
    /// The last `connect()` failed; carries the failure line shown to the
    /// operator.
    FailedToOpen(String),
}

enum Connection {
    Disconnected,
    Connected(Active),
    FailedToOpen(String),
}

struct Active {
    writer: WriteHalf<DynLinkIo>,
    monitor: MonitorHandle,
}

struct MonitorHandle {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Owner of the serial handle and its monitor loop.
pub struct LinkManager {
    sink: Arc<dyn EventSink>,
    connection: Connection,
}

impl LinkManager {
    /// New manager delivering inbound frames to `sink`. Starts disconnected.
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            connection: Connection::Disconnected,
        }
    }

    /// Current status for the consumer's display.
    pub fn status(&self) -> LinkStatus {
        match &self.connection {
            Connection::Disconnected => LinkStatus::Disconnected,
            Connection::Connected(_) => LinkStatus::Connected,
            Connection::FailedToOpen(reason) => LinkStatus::FailedToOpen(reason.clone()),
        }
    }

    /// Whether a connection (and its monitor loop) is live.
    pub fn is_connected(&self) -> bool {
        matches!(self.connection, Connection::Connected(_))
    }

    /// Open the serial port and start the monitor loop.
    ///
    /// Any existing connection is fully torn down first (stop, join, close),
    /// so calling this repeatedly never leaks a task or a handle.
    ///
    /// # Errors
    /// [`LinkError::InvalidBaud`] if the configured baud text is not a
    /// positive integer; [`LinkError::PortOpenFailed`] if the device cannot
    /// be opened. Either way the attempt aborts with no retry and the
    /// status becomes [`LinkStatus::FailedToOpen`].
    pub async fn connect(&mut self, config: &LinkConfig) -> LinkResult<()> {
        self.teardown().await;

        let baud = match config.baud() {
            Ok(baud) => baud,
            Err(e) => {
                self.connection = Connection::FailedToOpen(e.to_string());
                return Err(e);
            }
        };

        match open_serial(&config.port_path, baud).await {
            Ok(stream) => {
                tracing::info!(port = %config.port_path, baud, "serial link connected");
                self.attach(stream);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(port = %config.port_path, error = %e, "serial connect failed");
                self.connection = Connection::FailedToOpen(e.to_string());
                Err(e)
            }
        }
    }

    /// Attach an already-open transport and start the monitor loop.
    ///
    /// Used by tests and the bench simulator to run the link over an
    /// in-memory duplex pair instead of a physical port. Same teardown
    /// semantics as [`LinkManager::connect`].
    pub async fn connect_stream(&mut self, stream: DynLinkIo) {
        self.teardown().await;
        self.attach(stream);
    }

    /// Write raw bytes to the transport, fire-and-forget.
    ///
    /// Returns once the bytes are handed to the transport; no
    /// acknowledgement is awaited.
    ///
    /// # Errors
    /// [`LinkError::NotConnected`] when no connection is open (nothing is
    /// queued); [`LinkError::Io`] on a transport write failure.
    pub async fn write(&mut self, bytes: &[u8]) -> LinkResult<()> {
        let Connection::Connected(active) = &mut self.connection else {
            return Err(LinkError::NotConnected);
        };
        active.writer.write_all(bytes).await?;
        active.writer.flush().await?;
        Ok(())
    }

    /// Encode a command and transmit it.
    pub async fn send(&mut self, command: &Command) -> LinkResult<()> {
        let frame = protocol::encode(command);
        self.write(&frame).await?;
        tracing::debug!(frame = %String::from_utf8_lossy(&frame).trim_end(), "wrote frame");
        Ok(())
    }

    /// Transmit a free-text operator command as `CMD:<text>`.
    ///
    /// Empty input is rejected before encoding: no frame is sent and the
    /// call succeeds, matching the console's behavior of ignoring an empty
    /// command box.
    pub async fn send_raw(&mut self, text: &str) -> LinkResult<()> {
        if text.is_empty() {
            tracing::debug!("ignoring empty raw command");
            return Ok(());
        }
        self.send(&Command::Raw(text.to_string())).await
    }

    /// Stop the monitor loop, wait for it to exit, then close the handle.
    ///
    /// Safe to call when already disconnected (no-op). Closing an
    /// already-closed handle is success, not an error.
    pub async fn disconnect(&mut self) {
        self.teardown().await;
    }

    fn attach(&mut self, stream: DynLinkIo) {
        let (read_half, write_half) = tokio::io::split(stream);
        let (stop_tx, stop_rx) = oneshot::channel();
        let sink = Arc::clone(&self.sink);
        let task = tokio::spawn(monitor_loop(BufReader::new(read_half), sink, stop_rx));

        self.connection = Connection::Connected(Active {
            writer: write_half,
            monitor: MonitorHandle { stop_tx, task },
        });
    }

    async fn teardown(&mut self) {
        let previous = std::mem::replace(&mut self.connection, Connection::Disconnected);
        if let Connection::Connected(active) = previous {
            // Stop signal first; the loop may already have exited on EOF, in
            // which case the send fails harmlessly.
            let _ = active.monitor.stop_tx.send(());
            if let Err(e) = active.monitor.task.await {
                tracing::warn!(error = %e, "monitor task did not exit cleanly");
            }
            // The read half died with the task; dropping the write half now
            // closes the handle with no reader left on it.
            drop(active.writer);
            tracing::info!("serial link disconnected");
        }
    }
}

impl Drop for LinkManager {
    fn drop(&mut self) {
        // Dropping while connected aborts the monitor task instead of
        // joining it; `disconnect()` is the orderly path.
        if let Connection::Connected(active) = &self.connection {
            active.monitor.task.abort();
        }
    }
}

/// Open the serial device off the async runtime, 8N1 with no flow control.
async fn open_serial(port_path: &str, baud: u32) -> LinkResult<DynLinkIo> {
    let path = port_path.to_string();
    let opened = tokio::task::spawn_blocking(move || {
        tokio_serial::new(&path, baud)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|source| LinkError::PortOpenFailed { path, source })
    })
    .await
    .map_err(|e| LinkError::Io(std::io::Error::other(e)))??;

    Ok(Box::new(opened))
}

/// Read newline-delimited frames until the stop signal or EOF.
///
/// Runs once per connection. Each complete line is trimmed, decoded, and
/// forwarded to the sink; a transport read error becomes a debug event and
/// the loop keeps going after a short pause. The stop signal is raced
/// against the pending read, so teardown never waits on a silent wire.
async fn monitor_loop(
    mut reader: BufReader<ReadHalf<DynLinkIo>>,
    sink: Arc<dyn EventSink>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    tracing::debug!("monitor loop started");
    let mut line = String::new();

    loop {
        line.clear();
        tokio::select! {
            _ = &mut stop_rx => {
                tracing::debug!("monitor loop stop signal observed");
                break;
            }
            result = reader.read_line(&mut line) => match result {
                Ok(0) => {
                    // Peer hung up. Real ports do not EOF in normal
                    // operation, but in-memory transports do.
                    sink.on_debug("ERROR: serial stream closed");
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    sink.on_telemetry(protocol::decode(trimmed));
                }
                Err(e) => {
                    sink.on_debug(&format!("ERROR: read error {e}"));
                    tokio::time::sleep(READ_ERROR_BACKOFF).await;
                }
            }
        }
    }

    tracing::debug!("monitor loop stopped");
}

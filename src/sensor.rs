//! # Serial Line Source
//!
//! Reads newline-terminated sensor output from the serial port and forwards
//! every complete line to the event loop. Nothing is parsed here; the core
//! gets the raw bytes so decoding failures are handled in one place.

use crate::app::Message;
use crate::error::TransportError;
use crossbeam_channel::Sender;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_serial::SerialPortBuilderExt;
use tokio_util::sync::CancellationToken;

const LINE_TERMINATOR: u8 = b'\n';

#[derive(Debug, Clone, PartialEq)]
pub enum SensorUpdate {
    /// One complete line, terminator included
    Line(Vec<u8>),
    ConnectionStatus(ConnectionStatus),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
    /// Port could not be opened; carries the reason
    Error(String),
}

/// Forwards transport events into the event loop's message channel
#[derive(Clone)]
pub struct Handler {
    sender: Sender<Message>,
}

impl Handler {
    pub fn new(sender: Sender<Message>) -> Self {
        Self { sender }
    }

    /// Returns false once the event loop has gone away
    pub fn line(&self, line: Vec<u8>) -> bool {
        self.sender
            .send(Message::Sensor(SensorUpdate::Line(line)))
            .is_ok()
    }

    pub fn status(&self, status: ConnectionStatus) {
        let update = SensorUpdate::ConnectionStatus(status);
        if let Err(why) = self.sender.send(Message::Sensor(update)) {
            log::debug!("Could not send connection status: {:?}", why.0);
        }
    }
}

/// Forward complete lines from `reader` until end of stream, cancellation, or
/// the receiving side closing. A trailing fragment with no terminator is dropped.
pub async fn pump_lines<R>(
    mut reader: R,
    handler: &Handler,
    should_stop: &CancellationToken,
) -> Result<u64, std::io::Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut forwarded = 0u64;
    let mut line = Vec::new();

    loop {
        line.clear();

        let read = tokio::select! {
            _ = should_stop.cancelled() => {
                log::debug!("Line reader cancelled");
                return Ok(forwarded);
            }
            read = reader.read_until(LINE_TERMINATOR, &mut line) => read?,
        };

        if read == 0 {
            log::warn!("Serial stream ended");
            return Ok(forwarded);
        }
        if line.last() != Some(&LINE_TERMINATOR) {
            log::debug!("Dropping unterminated fragment of {} bytes", line.len());
            return Ok(forwarded);
        }

        if !handler.line(line.clone()) {
            log::warn!("Event loop closed, stopping line reader");
            return Ok(forwarded);
        }
        forwarded += 1;
    }
}

/// Open `port` and stream its lines until `should_stop` fires or the port fails.
///
/// Reports `Connecting`, then either `Connected` followed eventually by
/// `Disconnected`, or `Error` if the port cannot be opened.
pub async fn start_data_collection(
    port: String,
    baud_rate: u32,
    handler: Handler,
    should_stop: CancellationToken,
) {
    log::info!("Opening serial port: {} at {} baud", port, baud_rate);
    handler.status(ConnectionStatus::Connecting);

    let stream = match tokio_serial::new(&port, baud_rate).open_native_async() {
        Ok(stream) => stream,
        Err(e) => {
            let reason = e.to_string();
            log::error!("{}", TransportError::Open { port, reason: reason.clone() });
            handler.status(ConnectionStatus::Error(reason));
            return;
        }
    };

    log::info!("Serial port {} opened", port);
    handler.status(ConnectionStatus::Connected);

    match pump_lines(BufReader::new(stream), &handler, &should_stop).await {
        Ok(count) => log::info!("Serial session on {} ended after {} lines", port, count),
        Err(e) => log::error!("{}", TransportError::Read(e)),
    }

    // Port handle is dropped here, before Disconnected is reported.
    handler.status(ConnectionStatus::Disconnected);
}

//! # Connection Management Module
//!
//! Handles the serial link lifecycle. Owns the async runtime the line reader
//! runs on and turns open/close commands from the event loop into reader
//! tasks.
//!
//! ## Key Components
//! - `ConnectionManager`: connection thread and command processing
//! - `ConnectionCommand`: commands sent from the event loop to this thread
//! - Cancellation: one root token for the whole process (cancelled by Ctrl-C)
//!   and a child token per open port
//!
//! Every state change the reader produces travels back as a `Message`, so the
//! core only ever sees this thread through its message channel.

use crate::app::Message;
use crate::error::TransportError;
use crate::sensor::{start_data_collection, ConnectionStatus, Handler};
use crossbeam_channel::Sender;
use std::sync::mpsc;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionCommand {
    Open { port: String, baud_rate: u32 },
    Close,
}

/// Manages the serial connection on a dedicated thread.
///
/// The thread owns a Tokio runtime; the reader task and the Ctrl-C listener
/// run on it while the event loop keeps the main thread.
pub struct ConnectionManager {
    command_receiver: mpsc::Receiver<ConnectionCommand>,
    event_sender: Sender<Message>,
    shutdown: CancellationToken,
}

impl ConnectionManager {
    /// Creates a new ConnectionManager.
    ///
    /// Returns the manager and a sender for issuing commands from the event loop.
    pub fn new(
        event_sender: Sender<Message>,
        shutdown: CancellationToken,
    ) -> (Self, mpsc::Sender<ConnectionCommand>) {
        let (command_sender, command_receiver) = mpsc::channel();

        let manager = ConnectionManager {
            command_receiver,
            event_sender,
            shutdown,
        };

        (manager, command_sender)
    }

    /// Runs the connection management loop.
    ///
    /// Call from a spawned thread. Blocks until the command channel is closed;
    /// the runtime, and with it any open port, is dropped on return.
    pub fn run(self) {
        let handler = Handler::new(self.event_sender.clone());

        let rt = match Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                let error = TransportError::RuntimeCreation(e.to_string());
                log::error!("{}", error);
                handler.status(ConnectionStatus::Error(error.to_string()));
                return;
            }
        };

        let shutdown = self.shutdown.clone();
        rt.spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => log::info!("Interrupt received, shutting down"),
                        Err(e) => log::error!("Failed to listen for interrupt: {}", e),
                    }
                    shutdown.cancel();
                }
                _ = shutdown.cancelled() => {}
            }
        });

        let mut session: Option<CancellationToken> = None;

        while let Ok(command) = self.command_receiver.recv() {
            match command {
                ConnectionCommand::Open { port, baud_rate } => {
                    if let Some(previous) = session.take() {
                        log::info!("Connection manager: closing previous port before reopening");
                        previous.cancel();
                    }

                    log::info!("Connection manager: opening {}", port);

                    let should_stop = self.shutdown.child_token();
                    session = Some(should_stop.clone());

                    rt.spawn(start_data_collection(
                        port,
                        baud_rate,
                        handler.clone(),
                        should_stop,
                    ));
                }
                ConnectionCommand::Close => {
                    log::info!("Connection manager: close requested");
                    match session.take() {
                        Some(token) => token.cancel(),
                        None => handler.status(ConnectionStatus::Disconnected),
                    }
                }
            }
        }

        log::info!("Connection manager: command channel closed, shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SensorUpdate;
    use crossbeam_channel::unbounded;
    use std::time::Duration;

    fn is_status(message: &Message, status: &ConnectionStatus) -> bool {
        matches!(message, Message::Sensor(SensorUpdate::ConnectionStatus(s)) if s == status)
    }

    #[test]
    fn test_connection_manager_creation() {
        let (event_sender, _event_receiver) = unbounded();
        let (_manager, command_sender) =
            ConnectionManager::new(event_sender, CancellationToken::new());

        assert!(command_sender.send(ConnectionCommand::Close).is_ok());
    }

    #[test]
    fn test_close_without_session_reports_disconnected() {
        let (event_sender, event_receiver) = unbounded();
        let shutdown = CancellationToken::new();
        let (manager, command_sender) = ConnectionManager::new(event_sender, shutdown.clone());
        let thread = std::thread::spawn(move || manager.run());

        command_sender.send(ConnectionCommand::Close).unwrap();
        let message = event_receiver.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(is_status(&message, &ConnectionStatus::Disconnected));

        shutdown.cancel();
        drop(command_sender);
        thread.join().unwrap();
    }

    #[test]
    fn test_open_missing_port_reports_error() {
        let (event_sender, event_receiver) = unbounded();
        let shutdown = CancellationToken::new();
        let (manager, command_sender) = ConnectionManager::new(event_sender, shutdown.clone());
        let thread = std::thread::spawn(move || manager.run());

        command_sender
            .send(ConnectionCommand::Open {
                port: "/dev/ppg-scope-missing-port".to_string(),
                baud_rate: 115_200,
            })
            .unwrap();

        let connecting = event_receiver.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(is_status(&connecting, &ConnectionStatus::Connecting));
        let error = event_receiver.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(
            error,
            Message::Sensor(SensorUpdate::ConnectionStatus(ConnectionStatus::Error(_)))
        ));

        shutdown.cancel();
        drop(command_sender);
        thread.join().unwrap();
    }
}

//! # Event Loop
//!
//! Single consumer of every event in the process. Serial lines and
//! connection status come from the connection thread, operator commands from
//! the console thread; both arrive on one channel and are handled in order,
//! so the acquisition state has exactly one writer.

use crate::acquisition::Acquisition;
use crate::config::Config;
use crate::connection::ConnectionCommand;
use crate::console;
use crate::device_scanner;
use crate::error::TransportError;
use crate::exporter;
use crate::sensor::{ConnectionStatus, SensorUpdate};
use crate::visualization::{BufferCapacity, TerminalSurface};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub enum Message {
    Sensor(SensorUpdate),
    /// Export to the given path, or a timestamped file in the export dir
    Export(Option<PathBuf>),
    SetBufferCapacity(BufferCapacity),
    Status,
    ListPorts,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Flow {
    Continue,
    Stop,
}

/// Counters reported when the session ends
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionSummary {
    pub lines: u64,
    pub discarded: u64,
    pub samples: usize,
}

pub struct App {
    acquisition: Acquisition,
    surface: TerminalSurface,
    config: Config,
    receiver: Receiver<Message>,
    connect_sender: mpsc::Sender<ConnectionCommand>,
    shutdown: CancellationToken,
    pub connection_state: ConnectionState,
    summary: SessionSummary,
    exported_samples: usize,
}

impl App {
    pub fn new(
        config: Config,
        receiver: Receiver<Message>,
        connect_sender: mpsc::Sender<ConnectionCommand>,
        shutdown: CancellationToken,
    ) -> Self {
        App {
            acquisition: Acquisition::new(config.buffer_capacity),
            surface: TerminalSurface::new(),
            config,
            receiver,
            connect_sender,
            shutdown,
            connection_state: ConnectionState::Disconnected,
            summary: SessionSummary::default(),
            exported_samples: 0,
        }
    }

    pub fn acquisition(&self) -> &Acquisition {
        &self.acquisition
    }

    /// Open the configured port and process events until the session ends.
    ///
    /// Returns an error only when the port could not be opened. A link that
    /// drops after opening keeps the session alive so the recorded samples
    /// can still be exported; only `quit` or Ctrl-C end it.
    pub fn run(mut self) -> Result<SessionSummary, TransportError> {
        self.connection_state = ConnectionState::Connecting;
        let open = ConnectionCommand::Open {
            port: self.config.port.clone(),
            baud_rate: self.config.baud_rate,
        };
        if self.connect_sender.send(open).is_err() {
            return Err(TransportError::Open {
                port: self.config.port.clone(),
                reason: "connection thread is not running".to_string(),
            });
        }

        loop {
            if self.shutdown.is_cancelled() {
                log::info!("Shutdown requested");
                break;
            }

            match self.receiver.recv_timeout(POLL_INTERVAL) {
                Ok(message) => {
                    if self.update(message)? == Flow::Stop {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.close_transport();
        self.summary.samples = self.acquisition.store().len();

        let unexported = self.summary.samples - self.exported_samples;
        if unexported > 0 {
            log::warn!("{} samples were recorded but not exported", unexported);
        }
        log::info!(
            "Session ended: {} lines received, {} discarded, {} samples",
            self.summary.lines,
            self.summary.discarded,
            self.summary.samples
        );

        Ok(self.summary)
    }

    fn update(&mut self, message: Message) -> Result<Flow, TransportError> {
        match message {
            Message::Sensor(SensorUpdate::Line(line)) => self.handle_line(&line),
            Message::Sensor(SensorUpdate::ConnectionStatus(status)) => {
                return self.handle_status(status)
            }
            Message::Export(path) => self.export(path),
            Message::SetBufferCapacity(capacity) => {
                self.acquisition.set_buffer_capacity(capacity);
                self.surface.clear();
                println!("Live buffers now hold {} samples per channel", capacity);
            }
            Message::Status => println!("{}", self.status_report()),
            Message::ListPorts => match device_scanner::list_ports() {
                Ok(devices) if devices.is_empty() => println!("No serial ports found"),
                Ok(devices) => {
                    for device in devices {
                        println!("{:<20} {}", device.name, device.description);
                    }
                }
                Err(e) => eprintln!("{}", e),
            },
            Message::Help => println!("{}", console::HELP),
            Message::Quit => return Ok(Flow::Stop),
        }

        Ok(Flow::Continue)
    }

    fn handle_line(&mut self, line: &[u8]) {
        self.summary.lines += 1;
        log::debug!("Raw line: {}", String::from_utf8_lossy(line).trim_end());

        if let Err(e) = self.acquisition.handle_line(line, &mut self.surface) {
            self.summary.discarded += 1;
            log::warn!("Discarding line: {}", e);
        }
    }

    fn handle_status(&mut self, status: ConnectionStatus) -> Result<Flow, TransportError> {
        match status {
            ConnectionStatus::Connecting => {
                self.connection_state = ConnectionState::Connecting;
                Ok(Flow::Continue)
            }
            ConnectionStatus::Connected => {
                self.connection_state = ConnectionState::Connected;
                println!(
                    "Connected to {} at {} baud. Type 'help' for commands.",
                    self.config.port, self.config.baud_rate
                );
                Ok(Flow::Continue)
            }
            ConnectionStatus::Disconnected => {
                self.connection_state = ConnectionState::Disconnected;
                log::warn!("Serial port {} closed", self.config.port);
                println!(
                    "Lost connection to {} with {} samples recorded. \
                     Use 'export' to save them, 'quit' to exit.",
                    self.config.port,
                    self.acquisition.store().len()
                );
                Ok(Flow::Continue)
            }
            ConnectionStatus::Error(reason) => {
                self.connection_state = ConnectionState::Disconnected;
                Err(TransportError::Open {
                    port: self.config.port.clone(),
                    reason,
                })
            }
        }
    }

    fn export(&mut self, path: Option<PathBuf>) {
        let path = path.unwrap_or_else(|| exporter::default_export_path(&self.config.export_dir));

        match self.acquisition.export(&path) {
            Ok(rows) => {
                self.exported_samples = rows;
                log::info!("Exported {} samples to {}", rows, path.display());
                println!("Export Success: {} samples saved to {}", rows, path.display());
            }
            Err(e) => {
                log::error!("Export to {} failed: {}", path.display(), e);
                eprintln!("Export Error: {}", e);
            }
        }
    }

    fn status_report(&self) -> String {
        let store = self.acquisition.store();
        let last_index = store
            .last()
            .map(|record| record.index().to_string())
            .unwrap_or_else(|| "-".to_string());

        let current = self.acquisition.current();

        format!(
            "Port {} ({:?})\nLines {} received, {} discarded\n\
             Samples {} (last index {}), pending PPG {} ACC {}\nBuffer capacity {}\n{}",
            self.config.port,
            self.connection_state,
            self.summary.lines,
            self.summary.discarded,
            store.len(),
            last_index,
            current.ppg_updated,
            current.acc_updated,
            self.acquisition.buffer_capacity(),
            self.surface
                .render(|channel| self.acquisition.buffer(channel))
                .trim_end()
        )
    }

    /// Ask the connection thread to close the port and wait briefly for it
    fn close_transport(&mut self) {
        if self.connection_state == ConnectionState::Disconnected {
            return;
        }
        if self.connect_sender.send(ConnectionCommand::Close).is_err() {
            return;
        }

        let deadline = Instant::now() + CLOSE_TIMEOUT;
        while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            match self.receiver.recv_timeout(remaining) {
                Ok(Message::Sensor(SensorUpdate::ConnectionStatus(
                    ConnectionStatus::Disconnected | ConnectionStatus::Error(_),
                ))) => {
                    self.connection_state = ConnectionState::Disconnected;
                    log::info!("Serial port {} closed", self.config.port);
                    return;
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }

        log::warn!("Timed out waiting for {} to close", self.config.port);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use crossbeam_channel::unbounded;
    use tempfile::tempdir;

    fn line(text: &str) -> Message {
        Message::Sensor(SensorUpdate::Line(text.as_bytes().to_vec()))
    }

    fn status(status: ConnectionStatus) -> Message {
        Message::Sensor(SensorUpdate::ConnectionStatus(status))
    }

    fn test_app(
        config: Config,
    ) -> (
        App,
        crossbeam_channel::Sender<Message>,
        mpsc::Receiver<ConnectionCommand>,
    ) {
        let (event_sender, event_receiver) = unbounded();
        let (connect_sender, connect_receiver) = mpsc::channel();
        let app = App::new(config, event_receiver, connect_sender, CancellationToken::new());
        (app, event_sender, connect_receiver)
    }

    #[test]
    fn test_lines_become_samples() {
        let (mut app, _events, _commands) = test_app(Config::default());

        for text in ["C:1,R:2.5,IR:3,G:4\r\n", "garbage:x\n", "X:5,Y:6,Z:7\n"] {
            assert_eq!(app.update(line(text)).unwrap(), Flow::Continue);
        }

        assert_eq!(app.summary.lines, 3);
        assert_eq!(app.summary.discarded, 1);
        assert_eq!(app.acquisition().store().len(), 1);
        assert_eq!(app.surface.view(Channel::R).latest, Some(2.5));
    }

    #[test]
    fn test_open_failure_is_fatal() {
        let config = Config {
            port: "COM99".to_string(),
            ..Config::default()
        };
        let (mut app, _events, _commands) = test_app(config);

        app.update(status(ConnectionStatus::Connecting)).unwrap();
        match app.update(status(ConnectionStatus::Error("no such device".to_string()))) {
            Err(TransportError::Open { port, reason }) => {
                assert_eq!(port, "COM99");
                assert_eq!(reason, "no such device");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_disconnect_keeps_session_open() {
        let (mut app, _events, _commands) = test_app(Config::default());

        assert_eq!(app.update(status(ConnectionStatus::Connected)).unwrap(), Flow::Continue);
        assert_eq!(app.connection_state, ConnectionState::Connected);
        assert_eq!(
            app.update(status(ConnectionStatus::Disconnected)).unwrap(),
            Flow::Continue
        );
        assert_eq!(app.connection_state, ConnectionState::Disconnected);
    }

    #[test]
    fn test_export_after_link_loss() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("after_drop.csv");
        let (app, events, commands) = test_app(Config::default());

        for message in [
            status(ConnectionStatus::Connecting),
            status(ConnectionStatus::Connected),
            line("C:1,R:2,IR:3,G:4\n"),
            line("X:5,Y:6,Z:7\n"),
            status(ConnectionStatus::Disconnected),
            Message::Export(Some(path.clone())),
            Message::Quit,
        ] {
            events.send(message).unwrap();
        }

        let summary = app.run().unwrap();
        assert_eq!(summary.samples, 1);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "C,R,IR,G,X,Y,Z\n1.0,2.0,3.0,4.0,5.0,6.0,7.0\n");

        // Port already closed, so quitting sends no Close.
        let sent: Vec<ConnectionCommand> = commands.try_iter().collect();
        assert_eq!(sent.len(), 1);
        assert!(matches!(sent[0], ConnectionCommand::Open { .. }));
    }

    #[test]
    fn test_capacity_change_keeps_samples() {
        let (mut app, _events, _commands) = test_app(Config::default());
        app.update(line("C:1,R:1,IR:1,G:1\n")).unwrap();
        app.update(line("X:1,Y:1,Z:1\n")).unwrap();

        app.update(Message::SetBufferCapacity(BufferCapacity::TenThousand)).unwrap();

        assert_eq!(app.acquisition().buffer_capacity(), BufferCapacity::TenThousand);
        assert!(app.acquisition().buffer(Channel::X).is_empty());
        assert_eq!(app.surface.view(Channel::X).redraws, 0);
        assert_eq!(app.acquisition().store().len(), 1);
    }

    #[test]
    fn test_export_to_default_dir() {
        let dir = tempdir().unwrap();
        let config = Config {
            export_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let (mut app, _events, _commands) = test_app(config);
        app.update(line("C:1,R:2,IR:3,G:4\n")).unwrap();
        app.update(line("X:5,Y:6,Z:7\n")).unwrap();

        app.update(Message::Export(None)).unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].starts_with("sensor_data_"));
        assert!(files[0].ends_with(".csv"));
        assert_eq!(app.exported_samples, 1);
    }

    #[test]
    fn test_empty_export_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let (mut app, _events, _commands) = test_app(Config::default());

        app.update(Message::Export(Some(path.clone()))).unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn test_status_report_contents() {
        let (mut app, _events, _commands) = test_app(Config::default());
        app.update(line("C:1,R:1,IR:1,G:1\n")).unwrap();
        app.update(line("X:1,Y:1,Z:1\n")).unwrap();

        let report = app.status_report();
        assert!(report.contains("Samples 1 (last index 1), pending PPG false ACC false"));
        assert!(report.contains("Buffer capacity 1000"));
        assert!(report.contains("Acc Z"));
    }

    #[test]
    fn test_run_opens_then_closes() {
        let config = Config {
            port: "/dev/ttyTEST".to_string(),
            ..Config::default()
        };
        let (app, events, commands) = test_app(config);

        for message in [
            status(ConnectionStatus::Connecting),
            status(ConnectionStatus::Connected),
            line("C:10,R:1,IR:2,G:3\n"),
            line("X:4,Y:5,Z:6\n"),
            Message::Quit,
            status(ConnectionStatus::Disconnected),
        ] {
            events.send(message).unwrap();
        }

        let summary = app.run().unwrap();
        assert_eq!(
            summary,
            SessionSummary {
                lines: 2,
                discarded: 0,
                samples: 1
            }
        );

        let sent: Vec<ConnectionCommand> = commands.try_iter().collect();
        assert_eq!(
            sent,
            vec![
                ConnectionCommand::Open {
                    port: "/dev/ttyTEST".to_string(),
                    baud_rate: 115_200
                },
                ConnectionCommand::Close
            ]
        );
    }

    #[test]
    fn test_run_stops_on_shutdown() {
        let (event_sender, event_receiver) = unbounded();
        let (connect_sender, commands) = mpsc::channel();
        let shutdown = CancellationToken::new();
        let app = App::new(Config::default(), event_receiver, connect_sender, shutdown.clone());

        shutdown.cancel();
        event_sender.send(status(ConnectionStatus::Disconnected)).unwrap();

        assert_eq!(app.run().unwrap().samples, 0);
        assert_eq!(commands.try_iter().last(), Some(ConnectionCommand::Close));
    }
}

//! Operator commands read from standard input.
//!
//! Each line is one command; parsed commands are sent into the same message
//! channel as the serial data, so the event loop handles them in arrival order.

use crate::app::Message;
use crate::visualization::BufferCapacity;
use crossbeam_channel::Sender;
use std::io::BufRead;
use std::path::PathBuf;

pub const HELP: &str = "\
Commands:
  export [PATH]   write recorded samples to CSV (default: sensor_data_<timestamp>.csv)
  capacity <N>    resize live buffers (1000, 3000, 5000, 7000, 10000)
  status          show connection, sample counts and live buffer summary
  ports           list available serial ports
  help            show this message
  quit            close the port and exit";

/// Parse one console line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Message>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, Some(rest.trim_start())),
        None => (line, None),
    };
    let verb_lower = verb.to_ascii_lowercase();

    // The export path is the rest of the line, spaces included.
    if verb_lower == "export" {
        return Ok(Some(Message::Export(rest.map(PathBuf::from))));
    }

    let mut words = rest.unwrap_or_default().split_whitespace();
    let argument = words.next();
    if words.next().is_some() {
        return Err(format!("Too many arguments for '{}'", verb));
    }

    let message = match (verb_lower.as_str(), argument) {
        ("capacity", Some(value)) => {
            let samples: usize = value
                .parse()
                .map_err(|_| format!("'{}' is not a sample count", value))?;
            Message::SetBufferCapacity(BufferCapacity::try_from(samples)?)
        }
        ("capacity", None) => return Err("Usage: capacity <N>".to_string()),
        ("status", None) => Message::Status,
        ("ports", None) => Message::ListPorts,
        ("help", None) => Message::Help,
        ("quit" | "exit", None) => Message::Quit,
        ("status" | "ports" | "help" | "quit" | "exit", Some(_)) => {
            return Err(format!("'{}' takes no arguments", verb))
        }
        (other, _) => return Err(format!("Unknown command '{}' (try 'help')", other)),
    };

    Ok(Some(message))
}

/// Read commands from stdin on a background thread until stdin closes
pub fn spawn(sender: Sender<Message>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::warn!("Console input error: {}", e);
                    break;
                }
            };

            match parse_command(&line) {
                Ok(Some(message)) => {
                    if sender.send(message).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => eprintln!("{}", e),
            }
        }
        log::debug!("Console input closed");
    })
}

use crate::config::Config;
use crate::visualization::BufferCapacity;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ppg-scope")]
#[command(
    about = "Record PPG and accelerometer samples from a serial sensor board",
    long_about = None
)]
pub struct Args {
    /// Serial port to open (e.g. /dev/ttyACM0, COM8)
    #[arg(short, long)]
    pub port: Option<String>,

    /// Serial baud rate
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Live buffer size per channel: 1000, 3000, 5000, 7000 or 10000
    #[arg(short, long, value_parser = parse_capacity)]
    pub capacity: Option<BufferCapacity>,

    /// Directory for timestamped exports
    #[arg(short, long)]
    pub export_dir: Option<PathBuf>,

    /// Config file to use instead of the per-user one
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the effective settings back to the config file
    #[arg(long)]
    pub save_config: bool,

    /// List serial ports and exit
    #[arg(long)]
    pub list_ports: bool,
}

fn parse_capacity(value: &str) -> Result<BufferCapacity, String> {
    let samples: usize = value
        .parse()
        .map_err(|_| format!("'{}' is not a sample count", value))?;
    BufferCapacity::try_from(samples)
}

impl Args {
    /// Flags given on the command line win over the loaded config
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(port) = &self.port {
            config.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }
        if let Some(capacity) = self.capacity {
            config.buffer_capacity = capacity;
        }
        if let Some(dir) = &self.export_dir {
            config.export_dir = dir.clone();
        }
    }
}

mod acquisition;
mod app;
mod channel;
mod circular_buffer;
mod cli;
mod config;
mod connection;
mod console;
mod device_scanner;
mod error;
mod exporter;
mod parser;
mod router;
mod sensor;
mod session_store;
mod synchronizer;
mod visualization;

use app::App;
use clap::Parser;
use config::Config;
use connection::ConnectionManager;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Args::parse();

    if args.list_ports {
        return match device_scanner::list_ports() {
            Ok(devices) => {
                for device in devices {
                    println!("{:<20} {}", device.name, device.description);
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::FAILURE
            }
        };
    }

    let loaded = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        log::warn!("{}; using defaults", e);
        Config::default()
    });
    args.apply_to(&mut config);

    if args.save_config {
        let saved = match &args.config {
            Some(path) => config.save_to(path),
            None => config.save(),
        };
        match saved {
            Ok(()) => log::info!("Saved settings"),
            Err(e) => log::warn!("{}", e),
        }
    }

    // One channel carries serial data, connection status and console commands
    let (sender, receiver) = crossbeam_channel::unbounded();
    let shutdown = CancellationToken::new();

    let (manager, connect_sender) = ConnectionManager::new(sender.clone(), shutdown.clone());
    let connection_thread = std::thread::spawn(move || {
        manager.run();
    });

    // Not joined: it stays blocked on stdin until the process exits.
    console::spawn(sender);

    let result = App::new(config, receiver, connect_sender, shutdown.clone()).run();

    // App dropped its command sender, so the manager loop ends.
    shutdown.cancel();
    if connection_thread.join().is_err() {
        log::error!("Connection thread panicked");
    }

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

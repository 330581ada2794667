//! Firewatch Agent CLI
//!
//! Forest fire sensor network monitor.

use clap::{Parser, Subcommand};
use firewatch_agent::{
    config::Config,
    core::SessionStore,
    monitor::Monitor,
    server::{self, ServerConfig},
    VERSION,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "firewatch")]
#[command(version = VERSION)]
#[command(about = "Forest fire sensor network monitor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start polling the sensor network
    Start {
        /// Poll interval in seconds (overrides the configured value)
        #[arg(long)]
        interval: Option<u64>,

        /// Port for the dashboard API (0 for random)
        #[arg(long, default_value = "7878")]
        port: u16,

        /// Run without the dashboard API
        #[arg(long)]
        no_server: bool,
    },

    /// Pause polling
    Pause,

    /// Resume polling
    Resume,

    /// Show agent status and persisted session summary
    Status,

    /// List persisted fire sessions
    Sessions {
        /// Maximum number of sessions to show
        #[arg(long, short, default_value = "10")]
        limit: usize,
    },

    /// Show configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            interval,
            port,
            no_server,
        } => cmd_start(interval, port, no_server),
        Commands::Pause => cmd_pause(),
        Commands::Resume => cmd_resume(),
        Commands::Status => cmd_status(),
        Commands::Sessions { limit } => cmd_sessions(limit),
        Commands::Config => cmd_config(),
    }
}

fn cmd_start(interval: Option<u64>, port: u16, no_server: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("Firewatch Agent v{VERSION}");
    println!();

    let mut config = Config::load().unwrap_or_default();
    if let Some(secs) = interval {
        config.poll_interval = Duration::from_secs(secs);
    }
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    println!("Starting monitoring...");
    println!("  Alerts endpoint: {}", config.endpoints.alerts_url);
    println!("  Poll interval: {}s", config.poll_interval.as_secs());
    println!("  Session store: {:?}", config.session_store_path());
    if config.paused {
        println!();
        println!("Polling is currently paused.");
        println!("Run `firewatch resume` to start polling.");
    }
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: could not create runtime: {e}");
            std::process::exit(1);
        }
    };

    runtime.block_on(async {
        let monitor = Monitor::new(config);
        let state = monitor.state();
        let refresh = monitor.refresh_handle();

        let server_shutdown = if no_server {
            None
        } else {
            match server::run(ServerConfig { port }, state, refresh).await {
                Ok((addr, shutdown_tx)) => {
                    println!("Dashboard API: http://{addr}");
                    Some(shutdown_tx)
                }
                Err(e) => {
                    eprintln!("Warning: could not start dashboard API: {e}");
                    eprintln!("Continuing without the HTTP surface.");
                    None
                }
            }
        };

        let (monitor_shutdown_tx, monitor_shutdown_rx) = tokio::sync::oneshot::channel();
        let monitor_handle = tokio::spawn(monitor.run(monitor_shutdown_rx));

        // Ctrl+C from a foreign thread wakes the async side
        let (stop_tx, mut stop_rx) = tokio::sync::mpsc::unbounded_channel();
        ctrlc::set_handler(move || {
            let _ = stop_tx.send(());
        })
        .expect("Error setting Ctrl+C handler");

        let _ = stop_rx.recv().await;

        println!();
        println!("Stopping monitoring...");
        let _ = monitor_shutdown_tx.send(());
        if let Some(tx) = server_shutdown {
            let _ = tx.send(());
        }
        let _ = monitor_handle.await;
    });
}

fn cmd_pause() {
    let mut config = Config::load().unwrap_or_default();
    config.paused = true;
    if let Err(e) = config.save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }
    println!("Polling paused. Use 'firewatch resume' to continue.");
}

fn cmd_resume() {
    let mut config = Config::load().unwrap_or_default();
    config.paused = false;
    if let Err(e) = config.save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }
    println!("Polling resumed.");
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("Firewatch Agent Status");
    println!("======================");
    println!();
    println!("Configuration:");
    println!("  Alerts endpoint: {}", config.endpoints.alerts_url);
    println!("  Poll interval: {}s", config.poll_interval.as_secs());
    println!("  Paused: {}", config.paused);
    println!();

    let store = SessionStore::new(config.session_store_path(), config.caps.stored_sessions);
    match store.load() {
        Ok(sessions) if sessions.is_empty() => {
            println!("No persisted fire sessions.");
        }
        Ok(sessions) => {
            println!("Persisted fire sessions: {}", sessions.len());
            let latest = &sessions[0];
            println!(
                "  Latest: device {} from {} (max temp {:.1}, ml confirmed: {})",
                latest.device_id,
                latest.start_time.format("%Y-%m-%d %H:%M:%S"),
                latest.max_temp,
                latest.ml_confirmed
            );
        }
        Err(e) => {
            eprintln!("Could not read session store: {e}");
        }
    }
}

fn cmd_sessions(limit: usize) {
    let config = Config::load().unwrap_or_default();
    let store = SessionStore::new(config.session_store_path(), config.caps.stored_sessions);

    let sessions = match store.load() {
        Ok(sessions) => sessions,
        Err(e) => {
            eprintln!("Could not read session store: {e}");
            std::process::exit(1);
        }
    };

    if sessions.is_empty() {
        println!("No persisted fire sessions.");
        println!("Run 'firewatch start' to begin monitoring.");
        return;
    }

    for session in sessions.iter().take(limit) {
        let end = session
            .end_time
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  device {}  {} -> {}  readings: {}  temp {:.1}/{:.1}/{:.1}  ml confirmed: {}",
            session.id,
            session.device_id,
            session.start_time.format("%Y-%m-%d %H:%M:%S"),
            end,
            session.readings.len(),
            session.min_temp,
            session.avg_temp,
            session.max_temp,
            session.ml_confirmed
        );
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

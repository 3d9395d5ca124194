use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use gateway::server::{self, AppState};
use gateway::{ChannelDirectory, GatewayConfig, JsonSnapshot, Mode, NetworkInterface};
use tokio::net::TcpListener;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    /// GET /rtsp/{channel} returns the upstream SDP
    Describe,
    /// GET /rtp?id={channel} streams the multicast group
    Relay,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Describe => Mode::Describe,
            ModeArg::Relay => Mode::Relay,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "channel-gateway",
    version,
    about = "HTTP gateway from channel names to RTSP descriptions or multicast streams"
)]
struct Args {
    /// Listen address (host:port)
    #[arg(long, short, default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// Channel snapshot (JSON array of channel records)
    #[arg(long, short)]
    snapshot: PathBuf,

    #[arg(long, short, value_enum, default_value_t = ModeArg::Describe)]
    mode: ModeArg,

    /// Multicast interface: name, IPv4 address, or "any"
    #[arg(long, short, default_value = "any")]
    interface: NetworkInterface,

    /// Maximum RTSP redirects followed per request
    #[arg(long, default_value_t = gateway::config::DEFAULT_MAX_REDIRECTS,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_redirects: u32,

    /// RTSP connect timeout in seconds
    #[arg(long, default_value_t = 5)]
    connect_timeout: u64,

    /// RTSP response read timeout in seconds
    #[arg(long, default_value_t = 10)]
    read_timeout: u64,

    /// End a relay after this many seconds without data (0 disables)
    #[arg(long, default_value_t = 0)]
    idle_timeout: u64,

    /// Do not repeat relayed datagrams to the channel's unicast address
    #[arg(long)]
    no_unicast_repeat: bool,
}

impl Args {
    fn config(&self) -> GatewayConfig {
        GatewayConfig {
            mode: self.mode.into(),
            interface: self.interface.clone(),
            max_redirects: self.max_redirects,
            connect_timeout: Duration::from_secs(self.connect_timeout),
            read_timeout: Duration::from_secs(self.read_timeout),
            idle_timeout: (self.idle_timeout > 0).then(|| Duration::from_secs(self.idle_timeout)),
            unicast_repeat: !self.no_unicast_repeat,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.config();

    let snapshot = JsonSnapshot::new(&args.snapshot);
    let directory = match ChannelDirectory::from_source(&snapshot, config.mode) {
        Ok(directory) => directory,
        Err(e) => {
            tracing::error!(error = %e, "failed to load channel directory");
            return ExitCode::FAILURE;
        }
    };

    let listener = match TcpListener::bind(args.listen).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %args.listen, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    let state = AppState::new(directory, &config);
    if let Err(e) = server::serve(listener, state, shutdown_signal()).await {
        tracing::error!(error = %e, "server error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

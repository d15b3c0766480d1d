//! LED stream receiver — entry point.
//!
//! ```text
//! ledstream-server                  Run in the foreground
//! ledstream-server --config <path>  Load a custom config TOML
//! ledstream-server --port <port>    Override the listen port
//! ledstream-server --gen-config     Write default config to stdout
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ledstream_server::config::ServerConfig;
use ledstream_server::service::LedStreamService;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "ledstream-server", about = "TCP LED frame stream receiver")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "ledstream.toml")]
    config: PathBuf,

    /// Listen port, overriding the configuration file.
    #[arg(short, long)]
    port: Option<u16>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        println!("{}", ServerConfig::default().to_toml()?);
        return Ok(());
    }

    let mut config = ServerConfig::load(&cli.config)?;
    if let Some(port) = cli.port {
        config.network.port = port;
    }

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("ledstream-server v{}", env!("CARGO_PKG_VERSION"));
    info!("listen port: {}", config.network.port);
    info!("timeout (ms): {}", config.network.timeout_ms);
    info!("completion mode: {:?}", config.completion.mode);
    info!(
        "completion window (ms): {}",
        config.completion_mode().window_ms(config.total_leds())
    );
    info!("ack: {}", if config.ack.enabled { "enabled" } else { "disabled" });
    for strip in &config.strips {
        info!("strip '{}': {} LEDs", strip.name, strip.leds);
    }

    let service = LedStreamService::new(config);
    let stop = service.stop_handle();

    let stop_clone = stop.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received, shutting down");
        stop_clone.store(false, std::sync::atomic::Ordering::SeqCst);
    });

    service.run().await?;

    Ok(())
}

//! LEDS test-pattern sender.
//!
//! ```text
//! ledstream-send --host 10.0.0.5 --leds 150 --pattern rainbow --fps 60
//! ledstream-send --format grbw --pattern chase --frames 300 --wait-ack
//! ```

mod pattern;

use std::time::Duration;

use clap::Parser;
use futures::SinkExt;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::MissedTickBehavior;
use tokio_util::codec::FramedWrite;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use ledstream_core::{ACK_BYTE, Frame, LedsCodec, MAX_PIXELS, PixelFormat};

use crate::pattern::Pattern;

/// How long to wait for an ACK before sending the next frame anyway.
const ACK_TIMEOUT: Duration = Duration::from_secs(1);

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "ledstream-send", about = "Stream test patterns to a LEDS receiver")]
struct Cli {
    /// Receiver host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Receiver port.
    #[arg(short, long, default_value_t = 7777)]
    port: u16,

    /// Pixels per frame.
    #[arg(short = 'n', long, default_value_t = 60,
          value_parser = clap::value_parser!(u32).range(1..=MAX_PIXELS as i64))]
    leds: u32,

    /// Pixel format: rgb, rgbw, grb, grbw, bgr.
    #[arg(short, long, default_value = "rgb")]
    format: PixelFormat,

    /// Target frames per second.
    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    #[arg(long, value_enum, default_value_t = Pattern::Rainbow)]
    pattern: Pattern,

    /// Stop after this many frames. Runs until Ctrl-C otherwise.
    #[arg(long)]
    frames: Option<u64>,

    /// Wait for the receiver's ACK byte after each frame.
    #[arg(long)]
    wait_ack: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let stream = TcpStream::connect((cli.host.as_str(), cli.port)).await?;
    stream.set_nodelay(true)?;
    info!(
        "connected to {}:{} ({} x {}, {:?})",
        cli.host, cli.port, cli.leds, cli.format, cli.pattern
    );

    let (mut reader, writer) = stream.into_split();
    let mut framed = FramedWrite::new(writer, LedsCodec);

    let period = Duration::from_secs_f64(1.0 / cli.fps.clamp(0.1, 1000.0));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut sent: u64 = 0;
    let mut acks: u64 = 0;
    while cli.frames.is_none_or(|limit| sent < limit) {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut ctrl_c => {
                info!("Ctrl-C received, stopping");
                break;
            }
        }

        let colors = cli.pattern.render(sent, cli.leds as usize);
        framed.send(Frame::from_colors(cli.format, &colors)?).await?;
        sent += 1;

        if cli.wait_ack {
            match tokio::time::timeout(ACK_TIMEOUT, reader.read_u8()).await {
                Ok(Ok(ACK_BYTE)) => {
                    acks += 1;
                    debug!(frame = sent, "ack");
                }
                Ok(Ok(other)) => warn!("unexpected byte from receiver: {other:#04x}"),
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => warn!(frame = sent, "no ack within {ACK_TIMEOUT:?}"),
            }
        }
    }

    info!(sent, acks, "done");
    Ok(())
}

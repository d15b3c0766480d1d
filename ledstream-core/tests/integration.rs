//! Integration tests: the controller driving a real non-blocking TCP
//! listener on localhost, fed by blocking std clients and framed
//! tokio clients.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use futures::SinkExt;
use ledstream_core::{
    ACK_BYTE, AckPolicy, Color, CompletionMode, ControllerConfig, DisconnectReason, Frame,
    LedStreamController, LedsCodec, MemoryStrip, PixelFormat, TcpTransport, TickReport,
};
use tokio_test::assert_ok;
use tokio_util::codec::FramedWrite;

// ── Helpers ──────────────────────────────────────────────────────

type TcpController = LedStreamController<TcpTransport, MemoryStrip>;

fn ephemeral_controller(config: ControllerConfig) -> (TcpController, std::net::SocketAddr) {
    let transport = TcpTransport::bind_addr("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = transport.local_addr().unwrap();
    let strips = vec![MemoryStrip::new(4), MemoryStrip::new(4)];
    (LedStreamController::new(transport, strips, config, 0), addr)
}

/// Tick with wall-clock time until `done` holds or five seconds pass.
fn tick_until(
    ctl: &mut TcpController,
    start: Instant,
    mut done: impl FnMut(&TcpController, &TickReport) -> bool,
) {
    loop {
        let now = start.elapsed().as_millis() as u64;
        let report = ctl.tick(now);
        if done(ctl, &report) {
            return;
        }
        assert!(start.elapsed() < Duration::from_secs(5), "condition not reached");
        std::thread::sleep(Duration::from_millis(1));
    }
}

fn wire(colors: &[Color], format: PixelFormat) -> Vec<u8> {
    let frame = Frame::from_colors(format, colors).unwrap();
    let mut out = frame.header().encode().to_vec();
    out.extend_from_slice(frame.payload());
    out
}

// ── Frame delivery ───────────────────────────────────────────────

#[test]
fn fragmented_frames_over_tcp() {
    let (mut ctl, addr) = ephemeral_controller(ControllerConfig::default());
    let start = Instant::now();

    let colors: Vec<Color> = (0..8).map(|i| Color::from_rgb(i * 10, i, 255 - i)).collect();
    let bytes = wire(&colors, PixelFormat::Bgr);

    let writer = std::thread::spawn(move || {
        let mut peer = TcpStream::connect(addr).unwrap();
        peer.set_nodelay(true).unwrap();
        for chunk in bytes.chunks(5) {
            peer.write_all(chunk).unwrap();
            std::thread::sleep(Duration::from_millis(2));
        }
        peer
    });

    tick_until(&mut ctl, start, |ctl, _| ctl.counters().frames == 1);
    let _peer = writer.join().unwrap();

    let got: Vec<Color> = ctl
        .strips()
        .iter()
        .flat_map(|s| s.pixels().iter().copied())
        .collect();
    assert_eq!(got, colors);
    assert_eq!(ctl.counters().bytes_received, 10 + 24);
}

#[test]
fn garbage_disconnects_and_next_client_is_served() {
    let (mut ctl, addr) = ephemeral_controller(ControllerConfig::default());
    let start = Instant::now();

    let mut bad = TcpStream::connect(addr).unwrap();
    bad.write_all(b"HTTP/1.1 200 OK\r\n").unwrap();
    tick_until(&mut ctl, start, |_, report| {
        matches!(report.disconnected, Some(DisconnectReason::Protocol(_)))
    });

    let mut good = TcpStream::connect(addr).unwrap();
    good.write_all(&wire(&[Color::from_rgb(1, 2, 3)], PixelFormat::Rgb))
        .unwrap();
    tick_until(&mut ctl, start, |ctl, _| ctl.counters().frames == 1);

    assert_eq!(ctl.counters().connects, 2);
    assert_eq!(ctl.counters().disconnects, 1);
    assert_eq!(ctl.strips()[0].pixels()[0], Color::from_rgb(1, 2, 3));
}

#[test]
fn peer_close_is_detected() {
    let (mut ctl, addr) = ephemeral_controller(ControllerConfig::default());
    let start = Instant::now();

    let peer = TcpStream::connect(addr).unwrap();
    tick_until(&mut ctl, start, |ctl, _| ctl.phase().is_connected());
    drop(peer);
    tick_until(&mut ctl, start, |_, report| {
        matches!(report.disconnected, Some(DisconnectReason::PeerClosed))
    });
    assert!(!ctl.phase().is_connected());
}

#[test]
fn ack_is_written_back() {
    let config = ControllerConfig {
        completion: CompletionMode::Heuristic { window_ms: 5 },
        ack: AckPolicy::AfterRender { margin_ms: 1 },
        ..ControllerConfig::default()
    };
    let (mut ctl, addr) = ephemeral_controller(config);
    let start = Instant::now();

    let mut peer = TcpStream::connect(addr).unwrap();
    peer.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    peer.write_all(&wire(&[Color::from_rgb(9, 9, 9)], PixelFormat::Grb))
        .unwrap();

    tick_until(&mut ctl, start, |ctl, _| {
        ctl.counters().frames == 1 && !ctl.ack_pending()
    });

    let mut ack = [0u8; 1];
    peer.read_exact(&mut ack).unwrap();
    assert_eq!(ack[0], ACK_BYTE);
}

// ── Framed async client ──────────────────────────────────────────

#[tokio::test]
async fn framed_client_streams_frames() {
    let (mut ctl, addr) = ephemeral_controller(ControllerConfig::default());
    let start = Instant::now();

    let client = tokio::spawn(async move {
        let stream = tokio::net::TcpStream::connect(addr).await?;
        let mut framed = FramedWrite::new(stream, LedsCodec);
        for i in 0..3u8 {
            let frame = Frame::from_colors(PixelFormat::Rgbw, &[Color::new(i, i, i, i); 8])?;
            framed.send(frame).await?;
        }
        Ok::<_, ledstream_core::LedStreamError>(framed)
    });

    while ctl.counters().frames < 3 {
        ctl.tick(start.elapsed().as_millis() as u64);
        assert!(start.elapsed() < Duration::from_secs(5), "frames not received");
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    let _framed = assert_ok!(client.await.unwrap());
    assert_eq!(ctl.strips()[1].pixels()[3], Color::new(2, 2, 2, 2));
}

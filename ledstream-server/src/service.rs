//! Receiver service core logic.
//!
//! Binds the TCP transport, builds the strips described by the
//! configuration and drives the controller from a tokio interval until
//! stopped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use ledstream_core::{
    Clock, LedStreamController, LedStreamError, MonotonicClock, TcpTransport, TickReport,
};

use crate::config::ServerConfig;
use crate::output::{LoggingStrip, TracingSink};

/// Controller type the service drives.
pub type ServerController = LedStreamController<TcpTransport, LoggingStrip>;

// ── LedStreamService ─────────────────────────────────────────────

/// The top-level receiver service.
pub struct LedStreamService {
    config: ServerConfig,
    running: Arc<AtomicBool>,
}

impl LedStreamService {
    /// The service starts armed: a stop requested before [`run`] is
    /// called makes `run` return without binding.
    ///
    /// [`run`]: LedStreamService::run
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Obtain a handle that can be used to stop the service from
    /// another task.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Bind the listener and build the controller. Bind failure is fatal.
    pub fn build_controller(&self, now_ms: u64) -> Result<ServerController, LedStreamError> {
        let transport = TcpTransport::bind(self.config.network.port)?;
        let strips = LoggingStrip::from_config(&self.config.strips);
        let controller = LedStreamController::new(
            transport,
            strips,
            self.config.to_controller_config(),
            now_ms,
        );
        Ok(if self.config.metrics.enabled {
            controller.with_sink(Box::new(TracingSink))
        } else {
            controller
        })
    }

    /// Run the service until stopped.
    ///
    /// 1. Binds the listener (fatal on failure).
    /// 2. Ticks the controller every `service.tick_ms`.
    /// 3. Shuts down cleanly when `running` becomes `false`.
    pub async fn run(&self) -> Result<(), LedStreamError> {
        if !self.is_running() {
            info!("stop requested before start");
            return Ok(());
        }

        let clock = MonotonicClock::new();
        let mut controller = match self.build_controller(clock.now_ms()) {
            Ok(c) => c,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.service.tick_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while self.running.load(Ordering::SeqCst) {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = Self::wait_for_stop(&self.running) => break,
            }
            let report = controller.tick(clock.now_ms());
            self.log_report(&report);
        }

        self.running.store(false, Ordering::SeqCst);
        let counters = controller.counters();
        info!(
            frames = counters.frames,
            bytes = counters.bytes_received,
            connects = counters.connects,
            disconnects = counters.disconnects,
            overlaps = counters.overlaps,
            "LED stream service stopped"
        );
        Ok(())
    }

    /// Signal the service to stop.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the service is running, or armed to run.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    // ── Internal ─────────────────────────────────────────────────

    fn log_report(&self, report: &TickReport) {
        if let Some(snapshot) = &report.snapshot {
            if self.config.metrics.enabled {
                info!(
                    fps = format_args!("{:.2}", snapshot.frame_rate),
                    frames = snapshot.frames,
                    bytes = snapshot.bytes_received,
                    overlaps = snapshot.overlaps,
                    "stream stats"
                );
            }
            if snapshot.overlaps > 0 && snapshot.frame_rate > 0.0 {
                warn!(
                    overlaps = snapshot.overlaps,
                    "client is sending faster than the strips can render"
                );
            }
        }
    }

    /// Async helper: resolves when `running` becomes false.
    async fn wait_for_stop(running: &Arc<AtomicBool>) {
        loop {
            if !running.load(Ordering::SeqCst) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StripConfig;
    use ledstream_core::{Color, Frame, PixelFormat};
    use std::io::Write;

    fn ephemeral_config() -> ServerConfig {
        let mut config = ServerConfig::default();
        config.network.port = 0;
        config.strips = vec![
            StripConfig {
                name: "a".into(),
                leds: 3,
            },
            StripConfig {
                name: "b".into(),
                leds: 3,
            },
        ];
        config
    }

    #[test]
    fn service_starts_armed() {
        let svc = LedStreamService::new(ServerConfig::default());
        assert!(svc.is_running());
    }

    #[test]
    fn stop_handle_works() {
        let svc = LedStreamService::new(ServerConfig::default());
        let handle = svc.stop_handle();
        handle.store(false, Ordering::SeqCst);
        assert!(!svc.is_running());
    }

    #[tokio::test]
    async fn stop_before_run_is_honoured() {
        let svc = LedStreamService::new(ephemeral_config());
        svc.stop_handle().store(false, Ordering::SeqCst);

        let result = tokio::time::timeout(Duration::from_secs(1), svc.run())
            .await
            .expect("run ignored the earlier stop");
        assert!(result.is_ok());
        assert!(!svc.is_running());
    }

    #[test]
    fn controller_serves_configured_strips() {
        let svc = LedStreamService::new(ephemeral_config());
        let mut ctl = svc.build_controller(0).unwrap();
        assert_eq!(ctl.total_leds(), 6);

        let addr = ctl.listener().local_addr().unwrap();
        let frame = Frame::from_colors(PixelFormat::Rgb, &[Color::from_rgb(7, 7, 7); 4]).unwrap();
        let mut peer = std::net::TcpStream::connect(("127.0.0.1", addr.port())).unwrap();
        peer.write_all(&frame.header().encode()).unwrap();
        peer.write_all(frame.payload()).unwrap();

        let start = std::time::Instant::now();
        while ctl.counters().frames == 0 {
            ctl.tick(start.elapsed().as_millis() as u64);
            assert!(start.elapsed() < Duration::from_secs(5));
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(ctl.strips()[1].pixels()[0], Color::from_rgb(7, 7, 7));
        assert_eq!(ctl.strips()[1].pixels()[1], Color::BLACK);
    }

    #[tokio::test]
    async fn run_stops_on_handle() {
        let svc = Arc::new(LedStreamService::new(ephemeral_config()));
        let stop = svc.stop_handle();
        let task = tokio::spawn({
            let svc = Arc::clone(&svc);
            async move { svc.run().await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(svc.is_running());
        stop.store(false, Ordering::SeqCst);

        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("service did not stop")
            .unwrap();
        assert!(result.is_ok());
    }
}

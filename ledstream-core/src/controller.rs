//! The receiver's tick-driven control loop.
//!
//! [`LedStreamController`] owns the listener, at most one client, the
//! frame decoder and the strips. The host calls [`tick`] repeatedly with
//! a monotonic millisecond timestamp; each call does a bounded amount
//! of non-blocking work and returns.
//!
//! [`tick`]: LedStreamController::tick

use tracing::{debug, info, trace, warn};

use crate::ack::{ACK_BYTE, AckPolicy, AckScheduler};
use crate::decoder::{DecoderState, FrameDecoder};
use crate::error::{DisconnectReason, LedStreamError};
use crate::header::HEADER_SIZE;
use crate::state::ConnectionPhase;
use crate::stats::{MetricsAggregator, MetricsSink, MetricsSnapshot, StreamCounters, names};
use crate::strip::{FrameApplier, OutputStrip};
use crate::timing::{CompletionMode, OverlapTracker};
use crate::transport::{ClientStream, Listener, ReadOutcome, WriteOutcome};

/// Size of the per-read scratch buffer.
pub const READ_CHUNK: usize = 4096;

/// Tunables for [`LedStreamController`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Drop a client after this long without bytes. `0` disables.
    pub timeout_ms: u64,
    pub completion: CompletionMode,
    /// Upper bound on reads serviced per tick. The default of one read
    /// keeps every tick short; raise it for very large frames.
    pub max_reads_per_tick: usize,
    pub ack: AckPolicy,
    pub metrics_interval_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            completion: CompletionMode::default(),
            max_reads_per_tick: 1,
            ack: AckPolicy::Disabled,
            metrics_interval_ms: MetricsAggregator::DEFAULT_INTERVAL_MS,
        }
    }
}

/// What happened during one [`LedStreamController::tick`].
#[derive(Debug, Default)]
pub struct TickReport {
    /// A new client was accepted.
    pub accepted: bool,
    /// Frames decoded and applied.
    pub frames: usize,
    pub disconnected: Option<DisconnectReason>,
    /// Present when a metrics interval elapsed.
    pub snapshot: Option<MetricsSnapshot>,
}

/// Single-client LED frame receiver.
pub struct LedStreamController<L: Listener, S: OutputStrip> {
    config: ControllerConfig,
    listener: L,
    client: Option<L::Stream>,
    phase: ConnectionPhase,
    decoder: FrameDecoder,
    applier: FrameApplier<S>,
    overlap: OverlapTracker,
    ack: AckScheduler,
    counters: StreamCounters,
    metrics: MetricsAggregator,
    sink: Option<Box<dyn MetricsSink + Send>>,
    rx_buf: Vec<u8>,
}

impl<L: Listener, S: OutputStrip> LedStreamController<L, S> {
    /// Create a controller over an already-bound listener. `now_ms`
    /// starts the first metrics interval.
    pub fn new(listener: L, strips: Vec<S>, config: ControllerConfig, now_ms: u64) -> Self {
        let applier = FrameApplier::new(strips);
        info!(
            total_leds = applier.total_leds(),
            strips = applier.strips().len(),
            mode = config.completion.name(),
            window_ms = config.completion.window_ms(applier.total_leds()),
            "controller ready"
        );
        Self {
            metrics: MetricsAggregator::new(config.metrics_interval_ms, now_ms),
            ack: AckScheduler::new(config.ack),
            config,
            listener,
            client: None,
            phase: ConnectionPhase::NoClient,
            decoder: FrameDecoder::new(),
            applier,
            overlap: OverlapTracker::new(),
            counters: StreamCounters::default(),
            sink: None,
            rx_buf: vec![0u8; READ_CHUNK],
        }
    }

    /// Publish metrics and connection state to `sink`.
    pub fn with_sink(mut self, sink: Box<dyn MetricsSink + Send>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Run one non-blocking iteration.
    pub fn tick(&mut self, now_ms: u64) -> TickReport {
        let mut report = TickReport::default();

        if self.client.is_none() {
            report.accepted = self.try_accept(now_ms);
        }

        if self.client.is_some() {
            let outcome = self.service_client(now_ms, &mut report.frames);
            let reason = match outcome {
                Err(reason) => Some(reason),
                Ok(()) if self.timed_out(now_ms) => Some(DisconnectReason::Timeout),
                Ok(()) => None,
            };
            match reason {
                Some(reason) => {
                    self.disconnect(&reason, now_ms);
                    report.disconnected = Some(reason);
                }
                None => self.flush_ack(now_ms),
            }
        }

        self.overlap.expire(now_ms, self.window_ms());
        report.snapshot = self.sample_metrics(now_ms);
        report
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn counters(&self) -> &StreamCounters {
        &self.counters
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn decoder_state(&self) -> DecoderState {
        self.decoder.state()
    }

    pub fn strips(&self) -> &[S] {
        self.applier.strips()
    }

    pub fn total_leds(&self) -> usize {
        self.applier.total_leds()
    }

    /// Current completion window for the configured strips.
    pub fn window_ms(&self) -> u64 {
        self.config.completion.window_ms(self.applier.total_leds())
    }

    /// Whether the most recent frame is presumed still rendering.
    pub fn frame_in_progress(&self) -> bool {
        self.overlap.in_progress()
    }

    pub fn ack_pending(&self) -> bool {
        self.ack.pending()
    }

    // ── Internals ────────────────────────────────────────────────

    fn try_accept(&mut self, now_ms: u64) -> bool {
        let client = match self.listener.accept() {
            Ok(Some(client)) => client,
            Ok(None) => return false,
            Err(e) => {
                warn!("accept failed: {e}");
                return false;
            }
        };

        if let Err(e) = self.phase.accept(now_ms) {
            warn!("{e}");
            return false;
        }
        info!(
            peer = client.peer().as_deref().unwrap_or("unknown"),
            "client connected"
        );
        self.client = Some(client);
        self.decoder.reset();
        self.ack.cancel();
        self.counters.add_connect();
        if let Some(sink) = self.sink.as_mut() {
            sink.publish_state(names::CLIENT_CONNECTED, true);
        }
        true
    }

    /// Read and decode until the stream would block or the per-tick
    /// read budget is spent.
    fn service_client(&mut self, now_ms: u64, frames: &mut usize) -> Result<(), DisconnectReason> {
        let Some(client) = self.client.as_mut() else {
            return Ok(());
        };
        let window_ms = self.config.completion.window_ms(self.applier.total_leds());

        for _ in 0..self.config.max_reads_per_tick.max(1) {
            let n = match client.read(&mut self.rx_buf) {
                Ok(ReadOutcome::Data(n)) => n,
                Ok(ReadOutcome::WouldBlock) => return Ok(()),
                Ok(ReadOutcome::Closed) => return Err(DisconnectReason::PeerClosed),
                Err(e) => return Err(disconnect_reason(e)),
            };
            self.phase.touch(now_ms);

            let overlap = &mut self.overlap;
            let applier = &mut self.applier;
            let counters = &mut self.counters;
            let ack = &mut self.ack;
            let result = self.decoder.feed(&self.rx_buf[..n], |header, payload| {
                if overlap.record_frame(now_ms, window_ms) {
                    counters.add_overlap();
                    debug!("frame arrived before previous render window closed");
                }
                applier.apply(payload, header.pixel_count() as usize, header.format());
                counters.add_frame();
                counters.add_bytes(HEADER_SIZE + payload.len());
                ack.schedule(now_ms, window_ms);
                *frames += 1;
                trace!(
                    pixels = header.pixel_count(),
                    format = %header.format(),
                    "frame applied"
                );
            });
            if let Err(e) = result {
                return Err(disconnect_reason(e));
            }
        }
        Ok(())
    }

    fn timed_out(&self, now_ms: u64) -> bool {
        self.config.timeout_ms != 0
            && self
                .phase
                .idle_ms(now_ms)
                .is_some_and(|idle| idle > self.config.timeout_ms)
    }

    fn disconnect(&mut self, reason: &DisconnectReason, now_ms: u64) {
        let connected_ms = self.phase.connected_ms(now_ms).unwrap_or(0);
        match reason {
            DisconnectReason::PeerClosed | DisconnectReason::Timeout => {
                info!(connected_ms, "client disconnected: {reason}")
            }
            DisconnectReason::Protocol(_) | DisconnectReason::Io(_) => {
                warn!(connected_ms, "client dropped: {reason}")
            }
        }

        if let Some(mut client) = self.client.take() {
            client.close();
        }
        if let Err(e) = self.phase.close() {
            debug!("{e}");
        }
        self.counters.add_disconnect();
        self.overlap.clear();
        self.decoder.reset();
        self.ack.cancel();
        if let Some(sink) = self.sink.as_mut() {
            sink.publish_state(names::CLIENT_CONNECTED, false);
        }
    }

    /// Send the pending ACK if it is due. A blocked write stays pending;
    /// a failed write is dropped.
    fn flush_ack(&mut self, now_ms: u64) {
        if !self.ack.is_due(now_ms) {
            return;
        }
        let Some(client) = self.client.as_mut() else {
            return;
        };
        match client.write(&[ACK_BYTE]) {
            Ok(WriteOutcome::Written(n)) if n > 0 => {
                self.ack.cancel();
                trace!("ack sent");
            }
            Ok(_) => {}
            Err(e) => {
                self.ack.cancel();
                debug!("ack dropped: {e}");
            }
        }
    }

    fn sample_metrics(&mut self, now_ms: u64) -> Option<MetricsSnapshot> {
        let snapshot = self.metrics.sample(now_ms, &self.counters)?;
        if let Some(sink) = self.sink.as_mut() {
            snapshot.publish_to(sink);
        }
        Some(snapshot)
    }
}

/// Header validation failures are protocol violations; anything else
/// coming out of the transport is an I/O failure.
fn disconnect_reason(err: LedStreamError) -> DisconnectReason {
    match err {
        e if e.is_protocol_violation() => DisconnectReason::Protocol(e),
        LedStreamError::Connection(e) => DisconnectReason::Io(e),
        e => DisconnectReason::Io(std::io::Error::other(e.to_string())),
    }
}

// ── Tests ────────────────────────────────────────────────────────

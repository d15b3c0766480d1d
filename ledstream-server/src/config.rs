//! Configuration for the LED stream receiver service.

use std::path::Path;

use serde::{Deserialize, Serialize};

use ledstream_core::{AckPolicy, CompletionMode, ControllerConfig, LedStreamError};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub network: NetworkConfig,
    /// How the render window of a frame is derived.
    pub completion: CompletionConfig,
    pub ack: AckConfig,
    pub metrics: MetricsConfig,
    pub service: ServiceConfig,
    pub logging: LoggingConfig,
    /// Output strips, in the order pixels are distributed.
    pub strips: Vec<StripConfig>,
}

/// Network configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// TCP port to listen on.
    pub port: u16,
    /// Inactivity timeout in milliseconds. `0` disables it.
    pub timeout_ms: u32,
    /// Upper bound on socket reads per tick.
    pub max_reads_per_tick: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    Heuristic,
    Estimate,
}

/// Completion window settings. Only the fields of the selected mode
/// take effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub mode: CompletionKind,
    /// Fixed window for `heuristic` mode.
    pub interval_ms: u32,
    /// Per-LED shift time for `estimate` mode.
    pub show_time_per_led_us: u32,
    /// Added to the estimate.
    pub safety_margin_ms: u32,
}

/// Best-effort acknowledgment byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AckConfig {
    pub enabled: bool,
    /// Delay after the completion window before the ACK is written.
    pub margin_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Log published metrics through `tracing`.
    pub enabled: bool,
    pub interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Controller tick period in milliseconds.
    pub tick_ms: u64,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripConfig {
    pub name: String,
    pub leds: usize,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            completion: CompletionConfig::default(),
            ack: AckConfig::default(),
            metrics: MetricsConfig::default(),
            service: ServiceConfig::default(),
            logging: LoggingConfig::default(),
            strips: vec![StripConfig {
                name: "main".into(),
                leds: 60,
            }],
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: 7777,
            timeout_ms: 5000,
            max_reads_per_tick: 1,
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            mode: CompletionKind::Heuristic,
            interval_ms: 15,
            show_time_per_led_us: 30,
            safety_margin_ms: 2,
        }
    }
}

impl Default for AckConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            margin_ms: 2,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 1000,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { tick_ms: 1 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ServerConfig {
    /// Load configuration from a TOML file. A missing file yields the
    /// defaults; a malformed or out-of-range one is an error.
    pub fn load(path: &Path) -> Result<Self, LedStreamError> {
        let config = match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents)
                .map_err(|e| LedStreamError::Config(format!("{}: {e}", path.display())))?,
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse without validating.
    pub fn from_toml(text: &str) -> Result<Self, LedStreamError> {
        toml::from_str(text).map_err(|e| LedStreamError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, LedStreamError> {
        toml::to_string_pretty(self).map_err(|e| LedStreamError::Config(e.to_string()))
    }

    /// Check value ranges and the strip list.
    pub fn validate(&self) -> Result<(), LedStreamError> {
        check_range("network.timeout_ms", self.network.timeout_ms, 0, 60_000)?;
        check_range("completion.interval_ms", self.completion.interval_ms, 1, 100)?;
        check_range(
            "completion.show_time_per_led_us",
            self.completion.show_time_per_led_us,
            1,
            200,
        )?;
        if self.network.max_reads_per_tick == 0 {
            return Err(LedStreamError::Config(
                "network.max_reads_per_tick must be at least 1".into(),
            ));
        }
        if self.service.tick_ms == 0 {
            return Err(LedStreamError::Config("service.tick_ms must be at least 1".into()));
        }
        if self.strips.is_empty() {
            return Err(LedStreamError::Config("at least one strip is required".into()));
        }
        if let Some(strip) = self.strips.iter().find(|s| s.leds == 0) {
            return Err(LedStreamError::Config(format!(
                "strip '{}' must have at least one LED",
                strip.name
            )));
        }
        Ok(())
    }

    pub fn completion_mode(&self) -> CompletionMode {
        let c = &self.completion;
        match c.mode {
            CompletionKind::Heuristic => CompletionMode::Heuristic {
                window_ms: c.interval_ms,
            },
            CompletionKind::Estimate => CompletionMode::Estimate {
                per_led_us: c.show_time_per_led_us,
                margin_ms: c.safety_margin_ms,
            },
        }
    }

    /// Convert into the controller's tunables.
    pub fn to_controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            timeout_ms: self.network.timeout_ms as u64,
            completion: self.completion_mode(),
            max_reads_per_tick: self.network.max_reads_per_tick,
            ack: if self.ack.enabled {
                AckPolicy::AfterRender {
                    margin_ms: self.ack.margin_ms,
                }
            } else {
                AckPolicy::Disabled
            },
            metrics_interval_ms: self.metrics.interval_ms,
        }
    }

    pub fn total_leds(&self) -> usize {
        self.strips.iter().map(|s| s.leds).sum()
    }
}

fn check_range(name: &str, value: u32, min: u32, max: u32) -> Result<(), LedStreamError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(LedStreamError::Config(format!(
            "{name} = {value} is outside {min}..={max}"
        )))
    }
}

// ── Tests ────────────────────────────────────────────────────────

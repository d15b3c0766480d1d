//! # ledstream-server — LED stream receiver service
//!
//! Listens for a single TCP client speaking the LEDS frame protocol and
//! drives the strips described in the configuration file. Metrics and
//! connection state are published through `tracing`.

pub mod config;
pub mod output;
pub mod service;

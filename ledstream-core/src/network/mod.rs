//! Concrete transports.

mod connection;

pub use connection::{TcpClient, TcpTransport};

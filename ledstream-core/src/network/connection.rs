use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};

use tracing::{debug, info};

use crate::error::LedStreamError;
use crate::transport::{ClientStream, Listener, ReadOutcome, WriteOutcome};

/// Non-blocking TCP listener for LEDS clients.
#[derive(Debug)]
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Bind `0.0.0.0:port` and switch the socket to non-blocking mode.
    ///
    /// Failure here is fatal for the receiver: nothing can be accepted.
    pub fn bind(port: u16) -> Result<Self, LedStreamError> {
        Self::bind_addr(SocketAddr::from(([0, 0, 0, 0], port)))
    }

    /// Bind an explicit address (port 0 picks an ephemeral port).
    pub fn bind_addr(addr: SocketAddr) -> Result<Self, LedStreamError> {
        let bind_err = |source| LedStreamError::Bind {
            port: addr.port(),
            source,
        };
        let listener = TcpListener::bind(addr).map_err(bind_err)?;
        listener.set_nonblocking(true).map_err(bind_err)?;
        info!("listening on {} for LED frames", listener.local_addr()?);
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, LedStreamError> {
        Ok(self.listener.local_addr()?)
    }
}

impl Listener for TcpTransport {
    type Stream = TcpClient;

    fn accept(&mut self) -> Result<Option<TcpClient>, LedStreamError> {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                stream.set_nonblocking(true)?;
                if let Err(e) = stream.set_nodelay(true) {
                    debug!("set_nodelay failed for {peer}: {e}");
                }
                Ok(Some(TcpClient { stream, peer }))
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// An accepted, non-blocking TCP client.
#[derive(Debug)]
pub struct TcpClient {
    stream: TcpStream,
    peer: SocketAddr,
}

impl ClientStream for TcpClient {
    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, LedStreamError> {
        loop {
            match self.stream.read(buf) {
                Ok(0) => return Ok(ReadOutcome::Closed),
                Ok(n) => return Ok(ReadOutcome::Data(n)),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(ReadOutcome::WouldBlock);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<WriteOutcome, LedStreamError> {
        match self.stream.write(buf) {
            Ok(n) => Ok(WriteOutcome::Written(n)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(WriteOutcome::WouldBlock),
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self) {
        // The peer may already be gone; nothing to do about it here.
        let _ = self.stream.shutdown(Shutdown::Both);
    }

    fn peer(&self) -> Option<String> {
        Some(self.peer.to_string())
    }
}

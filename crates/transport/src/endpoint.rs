//! Endpoint - one UDP socket with a fixed direction

use bytes::{Bytes, BytesMut};
use contracts::{Direction, EndpointConfig};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, instrument, trace};

use crate::TransportError;

/// UDP endpoint
///
/// Input endpoints own the bound socket of `address`. Output endpoints hold
/// an unbound socket; the OS picks the source port on first send.
#[derive(Debug)]
pub struct Endpoint {
    config: EndpointConfig,
    socket: Option<UdpSocket>,
}

impl Endpoint {
    /// Open an endpoint
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// `TransportError::Setup` when the socket cannot be created or bound.
    #[instrument(name = "endpoint_open", skip(config), fields(endpoint = %config.label))]
    pub async fn open(config: &EndpointConfig) -> Result<Self, TransportError> {
        let std_socket =
            build_socket(config).map_err(|e| TransportError::setup(&config.label, e))?;
        let socket =
            UdpSocket::from_std(std_socket).map_err(|e| TransportError::setup(&config.label, e))?;

        debug!(
            endpoint = %config.label,
            direction = %config.direction,
            address = %config.address,
            "Endpoint opened"
        );

        Ok(Self {
            config: config.clone(),
            socket: Some(socket),
        })
    }

    pub fn label(&self) -> &str {
        &self.config.label
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub fn direction(&self) -> Direction {
        self.config.direction
    }

    pub fn is_closed(&self) -> bool {
        self.socket.is_none()
    }

    /// Actual local address (the bound port for input endpoints opened on port 0)
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket()?.local_addr()?)
    }

    /// Send one datagram to the destination
    pub async fn send(&self, bytes: &[u8]) -> Result<usize, TransportError> {
        let socket = self.socket_for(Direction::Output)?;
        let sent = socket.send_to(bytes, self.config.address).await?;
        trace!(endpoint = %self.config.label, bytes = sent, "Datagram sent");
        Ok(sent)
    }

    /// Wait for one datagram
    ///
    /// The read buffer is one byte larger than `max_len`, so an oversize
    /// datagram comes back with a length above `max_len` instead of being
    /// silently truncated to it.
    pub async fn receive(&self, max_len: usize) -> Result<Bytes, TransportError> {
        let socket = self.socket_for(Direction::Input)?;
        let mut buf = BytesMut::zeroed(max_len + 1);
        let (len, from) = socket.recv_from(&mut buf).await?;
        buf.truncate(len);
        trace!(endpoint = %self.config.label, bytes = len, %from, "Datagram received");
        Ok(buf.freeze())
    }

    /// Receive without waiting; `WouldBlock` when nothing is queued
    pub fn try_receive(&self, max_len: usize) -> Result<Bytes, TransportError> {
        let socket = self.socket_for(Direction::Input)?;
        let mut buf = BytesMut::zeroed(max_len + 1);
        let (len, from) = socket.try_recv_from(&mut buf)?;
        buf.truncate(len);
        trace!(endpoint = %self.config.label, bytes = len, %from, "Datagram received");
        Ok(buf.freeze())
    }

    /// `receive` bounded by `timeout`
    pub async fn receive_timeout(
        &self,
        max_len: usize,
        timeout: Duration,
    ) -> Result<Bytes, TransportError> {
        match tokio::time::timeout(timeout, self.receive(max_len)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout)),
        }
    }

    /// Release the socket; later operations fail with `Closed`
    pub fn close(&mut self) {
        if self.socket.take().is_some() {
            debug!(endpoint = %self.config.label, "Endpoint closed");
        }
    }

    pub(crate) fn socket(&self) -> Result<&UdpSocket, TransportError> {
        self.socket
            .as_ref()
            .ok_or_else(|| TransportError::Closed(self.config.label.clone()))
    }

    /// Open input socket, if any (for readiness polling)
    pub(crate) fn ready_source(&self) -> Option<&UdpSocket> {
        match self.config.direction {
            Direction::Input => self.socket.as_ref(),
            Direction::Output => None,
        }
    }

    fn socket_for(&self, wanted: Direction) -> Result<&UdpSocket, TransportError> {
        let socket = self.socket()?;
        if self.config.direction != wanted {
            return Err(TransportError::WrongDirection {
                endpoint: self.config.label.clone(),
                direction: self.config.direction,
            });
        }
        Ok(socket)
    }
}

fn build_socket(config: &EndpointConfig) -> std::io::Result<std::net::UdpSocket> {
    let socket = Socket::new(
        Domain::for_address(config.address),
        Type::DGRAM,
        Some(Protocol::UDP),
    )?;

    if config.direction == Direction::Input {
        socket.set_reuse_address(true)?;
        socket.bind(&config.address.into())?;
    }

    socket.set_nonblocking(true)?;
    Ok(socket.into())
}

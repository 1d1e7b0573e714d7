//! UDP transport implementation.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;

use super::Transport;
use crate::error::{Error, Result};
use crate::util::bind_udp_socket;

/// UDP transport for a single target.
///
/// Owns an ephemeral socket connected to the target, so datagrams from other
/// sources are filtered by the kernel.
pub struct UdpTransport {
    socket: UdpSocket,
    target: SocketAddr,
    local_addr: SocketAddr,
}

impl UdpTransport {
    /// Bind an ephemeral socket of the target's address family and connect it.
    pub async fn connect(target: SocketAddr, recv_buffer_size: Option<usize>) -> Result<Self> {
        tracing::debug!(target: "snmp_session::transport", { snmp.target = %target }, "connecting UDP transport");

        let io_err = |source| Error::Io {
            target: Some(target),
            source,
        };
        let bind_addr = if target.is_ipv6() {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        };
        let socket = bind_udp_socket(bind_addr, recv_buffer_size)
            .await
            .map_err(io_err)?;
        socket.connect(target).await.map_err(io_err)?;
        let local_addr = socket.local_addr().map_err(io_err)?;

        tracing::debug!(
            target: "snmp_session::transport",
            { snmp.target = %target, snmp.local_addr = %local_addr },
            "UDP transport connected"
        );

        Ok(Self {
            socket,
            target,
            local_addr,
        })
    }

    /// Local bind address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Transport for UdpTransport {
    async fn send(&self, data: &[u8]) -> Result<()> {
        tracing::trace!(
            target: "snmp_session::transport",
            { snmp.target = %self.target, snmp.bytes = data.len() },
            "UDP send"
        );
        self.socket.send(data).await.map_err(|e| Error::Io {
            target: Some(self.target),
            source: e,
        })?;
        Ok(())
    }

    async fn recv(&self, buf: &mut [u8], recv_timeout: Duration) -> Result<usize> {
        match tokio::time::timeout(recv_timeout, self.socket.recv(buf)).await {
            Ok(Ok(len)) => {
                tracing::trace!(
                    target: "snmp_session::transport",
                    { snmp.target = %self.target, snmp.bytes = len },
                    "UDP recv complete"
                );
                Ok(len)
            }
            Ok(Err(e)) => Err(Error::Io {
                target: Some(self.target),
                source: e,
            }),
            Err(_) => Err(Error::Timeout {
                target: Some(self.target),
                elapsed: recv_timeout,
                retries: 0,
            }),
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exchanges_with_local_peer() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let peer_addr = peer.local_addr().unwrap();
        let transport = UdpTransport::connect(peer_addr, Some(65535)).await.unwrap();
        assert_eq!(transport.peer_addr(), peer_addr);

        transport.send(b"ping").await.unwrap();
        let mut buf = [0u8; 16];
        let (len, from) = peer.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"ping");
        assert_eq!(from.port(), transport.local_addr().port());

        peer.send_to(b"pong", from).await.unwrap();
        let len = transport.recv(&mut buf, Duration::from_secs(2)).await.unwrap();
        assert_eq!(&buf[..len], b"pong");
    }

    #[tokio::test]
    async fn silent_peer_times_out() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let transport = UdpTransport::connect(peer.local_addr().unwrap(), None)
            .await
            .unwrap();
        let mut buf = [0u8; 16];
        let err = transport
            .recv(&mut buf, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }
}

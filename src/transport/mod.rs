//! Transport layer abstraction.
//!
//! Provides the [`Transport`] trait, the connected [`UdpTransport`], and
//! [`poll`], the send/receive loop with per-attempt deadlines and retries.

mod udp;

#[cfg(test)]
mod mock;

pub use udp::*;

#[cfg(test)]
pub(crate) use mock::*;

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{Error, Result};

/// Client-side datagram transport to one peer.
///
/// One request, one datagram: implementations never reassemble.
pub trait Transport: Send + Sync {
    /// Send one datagram to the peer.
    fn send(&self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Receive one datagram into `buf`, waiting at most `timeout`.
    ///
    /// Returns the datagram length. An expired wait is [`Error::Timeout`].
    fn recv(&self, buf: &mut [u8], timeout: Duration)
    -> impl Future<Output = Result<usize>> + Send;

    /// The peer address for this transport.
    fn peer_addr(&self) -> SocketAddr;
}

/// Exchange one request for one reply datagram.
///
/// Makes up to `retries + 1` attempts. Each attempt writes the request and
/// then reads until `accept` takes a datagram, both bounded by `timeout`.
/// Datagrams `accept` refuses (stale replies to earlier requests, duplicates)
/// are dropped and the read continues. Any failure ends the attempt and the
/// next one starts from the write. When all attempts fail the last error is
/// returned, with timeouts reporting the total elapsed time and the retry
/// count.
pub async fn poll<T, F>(
    transport: &T,
    request: &[u8],
    buf: &mut [u8],
    retries: u32,
    timeout: Duration,
    accept: F,
) -> Result<usize>
where
    T: Transport,
    F: Fn(&[u8]) -> bool + Sync,
{
    let peer = transport.peer_addr();
    let start = Instant::now();
    let mut attempt = 0;

    loop {
        match exchange(transport, request, buf, timeout, &accept).await {
            Ok(len) => {
                tracing::trace!(
                    target: "snmp_session::transport",
                    { snmp.peer = %peer, snmp.attempt = attempt, snmp.bytes = len },
                    "reply received"
                );
                return Ok(len);
            }
            Err(err) if attempt < retries => {
                tracing::debug!(
                    target: "snmp_session::transport",
                    { snmp.peer = %peer, snmp.attempt = attempt, error = %err },
                    "attempt failed, retrying"
                );
                attempt += 1;
            }
            Err(err) => {
                tracing::debug!(
                    target: "snmp_session::transport",
                    { snmp.peer = %peer, snmp.attempts = attempt + 1, error = %err },
                    "all attempts failed"
                );
                return Err(match err {
                    Error::Timeout { .. } => Error::Timeout {
                        target: Some(peer),
                        elapsed: start.elapsed(),
                        retries,
                    },
                    other => other.with_target(peer),
                });
            }
        }
    }
}

async fn exchange<T, F>(
    transport: &T,
    request: &[u8],
    buf: &mut [u8],
    timeout: Duration,
    accept: &F,
) -> Result<usize>
where
    T: Transport,
    F: Fn(&[u8]) -> bool + Sync,
{
    let expired = || Error::Timeout {
        target: Some(transport.peer_addr()),
        elapsed: timeout,
        retries: 0,
    };
    match tokio::time::timeout(timeout, transport.send(request)).await {
        Ok(sent) => sent?,
        Err(_) => return Err(expired()),
    }

    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(expired());
        }
        let len = transport.recv(buf, remaining).await?;
        if accept(&buf[..len]) {
            return Ok(len);
        }
        tracing::trace!(
            target: "snmp_session::transport",
            { snmp.peer = %transport.peer_addr(), snmp.bytes = len },
            "datagram refused, reading on"
        );
    }
}

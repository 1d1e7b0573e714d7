//! Socket and formatting helpers shared by the library and the CLI tools.

use std::io;
use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

/// Create and bind a UDP socket with optional receive buffer size.
///
/// For IPv6 addresses, sets `IPV6_V6ONLY = false` to enable dual-stack mode,
/// allowing both IPv4 and IPv6 traffic on a single socket.
///
/// # Arguments
///
/// * `addr` - The socket address to bind to. Use port 0 for an ephemeral port,
///   or `0.0.0.0:162` for a trap listener.
/// * `recv_buffer_size` - Optional receive buffer size. The kernel may cap this
///   at `net.core.rmem_max`.
pub async fn bind_udp_socket(
    addr: SocketAddr,
    recv_buffer_size: Option<usize>,
) -> io::Result<UdpSocket> {
    let domain = if addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;

    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }

    // Allow address reuse for quick restarts of a trap listener
    socket.set_reuse_address(true)?;

    if let Some(size) = recv_buffer_size {
        // Ignore errors - kernel will cap at rmem_max
        let _ = socket.set_recv_buffer_size(size);
    }

    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;

    UdpSocket::from_std(socket.into())
}

/// Hexadecimal encoding and decoding.
pub mod hex {
    use std::fmt;

    /// Encode bytes as lowercase hex string.
    ///
    /// ```
    /// use snmp_session::util::hex::encode;
    ///
    /// assert_eq!(encode(&[0xde, 0xad, 0xbe, 0xef]), "deadbeef");
    /// ```
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Decode a hex string to bytes. ASCII whitespace is ignored, so packet
    /// dumps can be pasted as-is.
    ///
    /// ```
    /// use snmp_session::util::hex::decode;
    ///
    /// assert_eq!(decode("30 03 02 01 00").unwrap(), vec![0x30, 0x03, 0x02, 0x01, 0x00]);
    /// assert!(decode("abc").is_err());
    /// ```
    pub fn decode(s: &str) -> Result<Vec<u8>, DecodeError> {
        let digits: Vec<u8> = s.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
        if digits.len() % 2 != 0 {
            return Err(DecodeError::OddLength);
        }
        digits
            .chunks(2)
            .map(|pair| {
                std::str::from_utf8(pair)
                    .ok()
                    .and_then(|p| u8::from_str_radix(p, 16).ok())
                    .ok_or(DecodeError::InvalidChar)
            })
            .collect()
    }

    /// Error type for hex decoding.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum DecodeError {
        /// Input has odd length (must be pairs of hex digits)
        OddLength,
        /// Invalid hexadecimal character
        InvalidChar,
    }

    impl fmt::Display for DecodeError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::OddLength => write!(f, "odd number of hex digits"),
                Self::InvalidChar => write!(f, "invalid hex character"),
            }
        }
    }

    impl std::error::Error for DecodeError {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_udp_socket_ipv4() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let socket = bind_udp_socket(addr, None).await.unwrap();
        let local = socket.local_addr().unwrap();
        assert!(local.is_ipv4());
        assert_ne!(local.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_udp_socket_with_buffer_size() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let socket = bind_udp_socket(addr, Some(1024 * 1024)).await.unwrap();
        assert_ne!(socket.local_addr().unwrap().port(), 0);
    }

    #[test]
    fn hex_round_trip() {
        let data = [0x00, 0x7f, 0x80, 0xff];
        assert_eq!(hex::decode(&hex::encode(&data)).unwrap(), data);
        assert_eq!(hex::decode("zz"), Err(hex::DecodeError::InvalidChar));
    }
}

//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;

use super::Transport;
use crate::ber::{decode_length, encode_length, encode_signed};
use crate::error::{Error, Result};
use crate::message::reply_id;

/// Builds a reply from the request it answers.
pub(crate) type MockHandler = Arc<dyn Fn(&[u8]) -> Bytes + Send + Sync>;

/// What the next `recv` produces.
#[derive(Clone)]
pub(crate) enum MockResponse {
    /// Community reply whose request ID is rewritten to match the last request
    Data(Bytes),
    /// Returned exactly as queued
    RawData(Bytes),
    /// Computed from the last request
    Handler(MockHandler),
    Timeout,
    IoError(String),
}

struct MockTransportInner {
    target: SocketAddr,
    responses: VecDeque<MockResponse>,
    requests: Vec<Bytes>,
}

/// Replays queued responses and records every request sent.
///
/// An empty queue behaves like a silent peer: every `recv` times out.
#[derive(Clone)]
pub(crate) struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

impl MockTransport {
    pub(crate) fn new(target: SocketAddr) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockTransportInner {
                target,
                responses: VecDeque::new(),
                requests: Vec::new(),
            })),
        }
    }

    fn push(&self, response: MockResponse) {
        self.inner.lock().unwrap().responses.push_back(response);
    }

    pub(crate) fn queue_response(&self, data: impl Into<Bytes>) {
        self.push(MockResponse::Data(data.into()));
    }

    pub(crate) fn queue_raw_response(&self, data: impl Into<Bytes>) {
        self.push(MockResponse::RawData(data.into()));
    }

    pub(crate) fn queue_handler(&self, handler: impl Fn(&[u8]) -> Bytes + Send + Sync + 'static) {
        self.push(MockResponse::Handler(Arc::new(handler)));
    }

    pub(crate) fn queue_timeout(&self) {
        self.push(MockResponse::Timeout);
    }

    pub(crate) fn queue_io_error(&self, msg: impl Into<String>) {
        self.push(MockResponse::IoError(msg.into()));
    }

    /// All requests sent so far.
    pub(crate) fn requests(&self) -> Vec<Bytes> {
        self.inner.lock().unwrap().requests.clone()
    }
}

/// Copy the request ID of a community request into a community reply.
///
/// Works on the raw bytes so replies carrying exception values can be patched.
/// Anything that is not a community message is returned unchanged.
fn patch_request_id(request: &[u8], reply: Bytes) -> Bytes {
    match reply_id(request).and_then(|id| splice_request_id(&reply, id)) {
        Some(patched) => patched,
        None => reply,
    }
}

fn splice_request_id(reply: &[u8], id: i32) -> Option<Bytes> {
    // (tag, header length, content length)
    fn header(data: &[u8]) -> Option<(u8, usize, usize)> {
        let (&tag, rest) = data.split_first()?;
        let (len, consumed) = decode_length(rest).ok()?;
        Some((tag, 1 + consumed, len))
    }

    let (_, outer_header, _) = header(reply)?;
    let mut pos = outer_header;
    let (_, version_header, version_len) = header(reply.get(pos..)?)?;
    if reply.get(pos + version_header..pos + version_header + version_len)? == [3] {
        return None;
    }
    pos += version_header + version_len;
    let (_, community_header, community_len) = header(reply.get(pos..)?)?;
    pos += community_header + community_len;
    let prefix = reply.get(outer_header..pos)?;

    let (pdu_tag, pdu_header, _) = header(reply.get(pos..)?)?;
    pos += pdu_header;
    let (_, id_header, id_len) = header(reply.get(pos..)?)?;
    let tail = reply.get(pos + id_header + id_len..)?;

    let id = encode_signed(i64::from(id));
    let mut pdu = vec![0x02];
    pdu.extend_from_slice(&encode_length(id.len()));
    pdu.extend_from_slice(&id);
    pdu.extend_from_slice(tail);

    let mut body = prefix.to_vec();
    body.push(pdu_tag);
    body.extend_from_slice(&encode_length(pdu.len()));
    body.extend_from_slice(&pdu);

    let mut out = vec![0x30];
    out.extend_from_slice(&encode_length(body.len()));
    out.extend_from_slice(&body);
    Some(Bytes::from(out))
}

impl Transport for MockTransport {
    async fn send(&self, data: &[u8]) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .requests
            .push(Bytes::copy_from_slice(data));
        Ok(())
    }

    async fn recv(&self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        let target = inner.target;
        let next = inner.responses.pop_front().unwrap_or(MockResponse::Timeout);
        match next {
            MockResponse::Data(data) => {
                let data = match inner.requests.last() {
                    Some(request) => patch_request_id(request, data),
                    None => data,
                };
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(len)
            }
            MockResponse::RawData(data) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(len)
            }
            MockResponse::Handler(handler) => {
                let request = inner.requests.last().cloned().unwrap_or_default();
                let data = handler(&request);
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(len)
            }
            MockResponse::Timeout => Err(Error::Timeout {
                target: Some(target),
                elapsed: timeout,
                retries: 0,
            }),
            MockResponse::IoError(msg) => Err(Error::Io {
                target: Some(target),
                source: std::io::Error::other(msg),
            }),
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.inner.lock().unwrap().target
    }
}

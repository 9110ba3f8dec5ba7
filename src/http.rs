//! HTTP request handling for the network transport
//!
//! Only the pieces needed to carry protocol lines over HTTP:
//! `GET /cmd?q=<command>` and `POST /frame` with a hex body. Socket I/O
//! lives in `http_server`; everything here works on byte buffers.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;

use crate::reply::{CommandError, format_reply, is_ok_line};
use crate::sink::PixelSink;
use crate::{StripContext, handle_line};

/// Request shapes the transport cannot even hand to the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    /// No blank line terminating the head yet
    IncompleteHead,
    /// Fewer body bytes than `Content-Length` announced
    IncompleteBody,
    /// Request line or head is not usable
    Malformed,
}

/// A parsed request borrowing from the receive buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub body: &'a [u8],
}

/// Status and body of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Offset of the first body byte, once the head is complete.
pub fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

/// `Content-Length` of a request head, zero when absent or unparsable.
pub fn content_length(head: &str) -> usize {
    head.lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

impl<'a> HttpRequest<'a> {
    /// Parse a complete request (head plus `Content-Length` body bytes).
    pub fn parse(buf: &'a [u8]) -> Result<Self, RequestError> {
        let body_start = header_end(buf).ok_or(RequestError::IncompleteHead)?;
        let head =
            core::str::from_utf8(&buf[..body_start]).map_err(|_| RequestError::Malformed)?;

        let mut request_line = head.lines().next().unwrap_or("").split_ascii_whitespace();
        let method = request_line.next().ok_or(RequestError::Malformed)?;
        let target = request_line.next().ok_or(RequestError::Malformed)?;
        if !request_line.next().is_some_and(|v| v.starts_with("HTTP/")) {
            return Err(RequestError::Malformed);
        }

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };

        let body_end = body_start
            .checked_add(content_length(head))
            .ok_or(RequestError::Malformed)?;
        let body = buf
            .get(body_start..body_end)
            .ok_or(RequestError::IncompleteBody)?;

        Ok(Self {
            method,
            path,
            query,
            body,
        })
    }

    /// Value of query parameter `name`, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query?
            .split('&')
            .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| url_decode(value))
    }

    /// The protocol line this request carries.
    pub fn command_line(&self) -> Result<String, (u16, CommandError)> {
        match (self.method, self.path) {
            ("GET", "/cmd") => self
                .query_param("q")
                .filter(|q| !q.trim().is_empty())
                .ok_or((400, CommandError::MissingPayload)),
            ("POST", "/frame") => {
                let body = String::from_utf8_lossy(self.body);
                let payload = body.trim();
                if payload.is_empty() {
                    return Err((400, CommandError::MissingPayload));
                }
                let mut line = String::with_capacity(payload.len() + 6);
                line.push_str("FRAME ");
                line.push_str(payload);
                Ok(line)
            }
            (_, "/cmd" | "/frame") => Err((405, CommandError::UnknownCommand)),
            _ => Err((404, CommandError::NotFound)),
        }
    }
}

/// Run a request through the protocol engine.
pub fn respond<S: PixelSink>(
    request: &HttpRequest<'_>,
    sink: &mut S,
    ctx: &mut StripContext,
) -> HttpResponse {
    match request.command_line() {
        Ok(line) => {
            let body = handle_line(&line, sink, ctx);
            let status = if is_ok_line(&body) { 200 } else { 400 };
            HttpResponse { status, body }
        }
        Err((status, err)) => HttpResponse {
            status,
            body: format_reply(&Err(err)),
        },
    }
}

/// Response to a request that could not be parsed at all.
pub fn reject(err: RequestError) -> HttpResponse {
    log::debug!("[HTTP] Rejecting request: {:?}", err);
    HttpResponse {
        status: 400,
        body: format_reply(&Err(CommandError::MissingPayload)),
    }
}

pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        _ => "Internal Server Error",
    }
}

impl HttpResponse {
    /// Status line and headers, terminated by the blank line.
    pub fn head(&self) -> String {
        let mut head = String::new();
        let _ = write!(
            head,
            "HTTP/1.1 {} {}\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Connection: close\r\n\
             Content-Length: {}\r\n\
             \r\n",
            self.status,
            reason_phrase(self.status),
            self.body.len()
        );
        head
    }
}

/// Where the listening socket is in its TCP lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketPhase {
    Closed,
    Listen,
    SynReceived,
    Established,
    CloseWait,
    /// Any closing or client-side state
    Other,
}

/// What one accept window should do with the socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptAction {
    /// (Re)listen and wait for a client
    Accept,
    /// Handshake in flight; leave the socket alone this iteration
    Wait,
    /// A client connected since the last window; serve it
    Serve,
    /// Stuck in a state `accept` cannot leave; abort it
    Reset,
}

/// Decide how to treat the socket before calling `accept`, which fails on
/// any open socket that is not plainly listening.
pub fn accept_action(phase: SocketPhase) -> AcceptAction {
    match phase {
        SocketPhase::Closed | SocketPhase::Listen => AcceptAction::Accept,
        SocketPhase::SynReceived => AcceptAction::Wait,
        // Data may still sit in the receive buffer after the peer's FIN.
        SocketPhase::Established | SocketPhase::CloseWait => AcceptAction::Serve,
        SocketPhase::Other => AcceptAction::Reset,
    }
}

fn url_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let hi = bytes.get(i + 1).and_then(|&d| hex_val(d));
                let lo = bytes.get(i + 2).and_then(|&d| hex_val(d));
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 2;
                    }
                    _ => out.push(b'%'),
                }
            }
            other => out.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(digit: u8) -> Option<u8> {
    (digit as char).to_digit(16).map(|v| v as u8)
}

//! Network transport: one HTTP/1.1 request per connection on an
//! embassy-net TCP socket.

use embassy_net::Stack;
use embassy_net::tcp::{Error as TcpError, State, TcpSocket};
use embassy_time::{Duration, with_timeout};
use log::{debug, info, warn};

use crate::BoardError;
use crate::config::{HTTP_PORT, MAX_HTTP_REQUEST};
use crate::dispatch::StripContext;
use crate::http::{
    AcceptAction, HttpRequest, HttpResponse, SocketPhase, accept_action, content_length,
    header_end, reject, respond,
};
use crate::sink::PixelSink;

/// How long one run loop iteration waits for a client
const ACCEPT_WINDOW_MS: u64 = 20;

/// Per-connection inactivity limit
const REQUEST_TIMEOUT_MS: u64 = 2_000;

/// Listening socket that stays bound across run loop iterations
pub struct HttpEndpoint {
    socket: TcpSocket<'static>,
    request: [u8; MAX_HTTP_REQUEST],
}

impl HttpEndpoint {
    pub fn new(stack: Stack<'static>, rx: &'static mut [u8], tx: &'static mut [u8]) -> Self {
        let mut socket = TcpSocket::new(stack, rx, tx);
        socket.set_timeout(Some(Duration::from_millis(REQUEST_TIMEOUT_MS)));
        info!("[HTTP] Endpoint ready on port {}", HTTP_PORT);
        Self {
            socket,
            request: [0; MAX_HTTP_REQUEST],
        }
    }

    /// Serve at most one request. Returns without blocking past the
    /// accept window when no client is waiting.
    pub async fn serve_once<S: PixelSink>(&mut self, sink: &mut S, ctx: &mut StripContext) {
        match accept_action(self.phase()) {
            AcceptAction::Wait => return,
            AcceptAction::Reset => {
                debug!("[HTTP] Socket stuck in {:?}, resetting", self.socket.state());
                self.reset().await;
                return;
            }
            AcceptAction::Serve => {}
            AcceptAction::Accept => {
                match with_timeout(
                    Duration::from_millis(ACCEPT_WINDOW_MS),
                    self.socket.accept(HTTP_PORT),
                )
                .await
                {
                    Err(_) => return,
                    Ok(Err(e)) => {
                        warn!("[HTTP] Accept error: {:?}", e);
                        self.reset().await;
                        return;
                    }
                    Ok(Ok(())) => {}
                }
            }
        }

        if let Err(e) = self.handle_connection(sink, ctx).await {
            warn!("[HTTP] Connection error: {}", e);
        }

        self.socket.close();
        if let Err(e) = self.socket.flush().await {
            debug!("[HTTP] Flush after close failed: {:?}", e);
        }
        self.reset().await;
    }

    fn phase(&self) -> SocketPhase {
        match self.socket.state() {
            State::Closed => SocketPhase::Closed,
            State::Listen => SocketPhase::Listen,
            State::SynReceived => SocketPhase::SynReceived,
            State::Established => SocketPhase::Established,
            State::CloseWait => SocketPhase::CloseWait,
            _ => SocketPhase::Other,
        }
    }

    async fn handle_connection<S: PixelSink>(
        &mut self,
        sink: &mut S,
        ctx: &mut StripContext,
    ) -> Result<(), BoardError> {
        let total = self.read_request().await.map_err(http_error)?;
        if total == 0 {
            return Ok(());
        }

        let response = match HttpRequest::parse(&self.request[..total]) {
            Ok(request) => {
                debug!("[HTTP] {} {}", request.method, request.path);
                respond(&request, sink, ctx)
            }
            Err(err) => reject(err),
        };

        self.write_response(&response).await.map_err(http_error)
    }

    /// Read until the head and its announced body are in, the peer stops
    /// sending, or the buffer is full.
    async fn read_request(&mut self) -> Result<usize, TcpError> {
        let mut total = 0;
        loop {
            if let Some(body_start) = header_end(&self.request[..total]) {
                let head = core::str::from_utf8(&self.request[..body_start]).unwrap_or("");
                if total >= body_start.saturating_add(content_length(head)) {
                    break;
                }
            }
            if total == self.request.len() {
                break;
            }
            let n = self.socket.read(&mut self.request[total..]).await?;
            if n == 0 {
                break;
            }
            total += n;
        }
        Ok(total)
    }

    async fn write_response(&mut self, response: &HttpResponse) -> Result<(), TcpError> {
        self.write_all(response.head().as_bytes()).await?;
        self.write_all(response.body.as_bytes()).await
    }

    async fn write_all(&mut self, mut data: &[u8]) -> Result<(), TcpError> {
        while !data.is_empty() {
            let n = self.socket.write(data).await?;
            if n == 0 {
                return Err(TcpError::ConnectionReset);
            }
            data = &data[n..];
        }
        Ok(())
    }

    /// Return the socket to `Closed`. Also used to stop listening when the
    /// network goes down.
    pub async fn reset(&mut self) {
        self.socket.abort();
        let _ = self.socket.flush().await;
    }
}

fn http_error(e: TcpError) -> BoardError {
    debug!("[HTTP] Socket error: {:?}", e);
    BoardError::HttpError
}

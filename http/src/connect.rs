use std::{net::SocketAddr, sync::Arc, time::SystemTime};

use tokio::{
    io::{AsyncReadExt, ReadHalf, WriteHalf, split},
    net::TcpStream,
    time::{Duration, timeout},
};

use crate::{
    access_log::AccessLog,
    error::ServerError,
    handler::{HandlerFn, ResponseHook},
    request::HttpRequest,
    response::HttpResponse,
    utils::{find_headers_end, http_date},
};

const SERVER_NAME: &str = concat!("coi-serve/", env!("CARGO_PKG_VERSION"));
/// Largest accepted request head
const MAX_HEAD_SIZE: usize = 8192;

/// Everything a connection needs to turn requests into responses
#[derive(Clone)]
pub struct Service {
    pub handler: HandlerFn,
    pub hook: Arc<dyn ResponseHook>,
    pub access_log: Arc<AccessLog>,
}

pub struct HttpConnection {
    /// Reader half of the TCP stream
    reader: ReadHalf<TcpStream>,
    /// Writer half of the TCP stream
    writer: WriteHalf<TcpStream>,
    /// Remote address, for the access log
    peer: SocketAddr,
    service: Service,
    /// Timeout for each read of a request head
    timeout: Duration,
    /// Bytes read past the previous request head (pipelined requests)
    pending: Vec<u8>,
}

impl HttpConnection {
    pub fn new(stream: TcpStream, peer: SocketAddr, service: Service, timeout_secs: u64) -> Self {
        // split the stream into reader and writer
        let (reader, writer) = split(stream);

        HttpConnection {
            reader,
            writer,
            peer,
            service,
            timeout: Duration::from_secs(timeout_secs),
            pending: Vec::new(),
        }
    }

    /// Process the connection
    pub async fn process(&mut self) -> Result<(), ServerError> {
        // keep-alive loop, process multiple requests
        loop {
            let mut buffer = std::mem::take(&mut self.pending);

            // read the request head
            let head_end = loop {
                if let Some(pos) = find_headers_end(&buffer) {
                    break pos;
                }

                if buffer.len() >= MAX_HEAD_SIZE {
                    let mut response = HttpResponse::error(431, "Request header fields too large");
                    self.respond("", &mut response).await?;
                    return Err(ServerError::ProtocolError(
                        "request header was too big".to_string(),
                    ));
                }

                match timeout(self.timeout, self.reader.read_buf(&mut buffer)).await {
                    // connect closed by peer
                    Ok(Ok(0)) => return Ok(()),
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => return Err(ServerError::IOError(e)),
                    Err(_) => return Err(ServerError::TimeoutError("request timeout".to_string())),
                }
            };
            self.pending = buffer.split_off(head_end);

            let head = String::from_utf8_lossy(&buffer).to_string();
            let request = match HttpRequest::parse(&head) {
                Ok(request) => request,
                Err(e) => {
                    let line = head.lines().next().unwrap_or_default();
                    let mut response = HttpResponse::error(400, "Bad request syntax");
                    self.respond(line, &mut response).await?;
                    return Err(e);
                }
            };

            if !request.version.is_supported() {
                let mut response = HttpResponse::error(
                    505,
                    &format!("Invalid HTTP version ({})", request.request_line),
                );
                self.respond(&request.request_line, &mut response).await?;
                return Ok(());
            }

            // bodies are never read, so the stream can not be reused after one
            let connection_keep_alive = request.wants_keep_alive() && !request.has_body();
            let request_line = request.request_line.clone();

            let mut response = (self.service.handler)(request).await;

            let close = !connection_keep_alive || response.closes_connection();
            if close {
                response.headers_mut().insert("Connection", "close");
            } else {
                response.headers_mut().insert("Connection", "keep-alive");
            }

            self.respond(&request_line, &mut response).await?;

            if close {
                break;
            }
        }

        Ok(())
    }

    /// Decorate, log and write one response
    async fn respond(
        &mut self,
        request_line: &str,
        response: &mut HttpResponse,
    ) -> Result<(), ServerError> {
        let headers = response.headers_mut();
        headers.insert("Server", SERVER_NAME);
        headers.insert("Date", &http_date(SystemTime::now()));
        self.service.hook.before_response(headers);

        if self.service.hook.should_log(request_line) {
            self.service
                .access_log
                .record(self.peer.ip(), request_line, response.status_code());
        }

        response
            .send(&mut self.writer)
            .await
            .map_err(ServerError::IOError)
    }
}

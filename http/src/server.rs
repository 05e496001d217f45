use std::{
    future::Future,
    io,
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use tokio::{
    net::{TcpListener, TcpSocket, lookup_host},
    spawn,
    sync::Semaphore,
    time::{self, Duration},
};
use tracing::{debug, error, info};

use crate::{
    access_log::AccessLog,
    connect::{HttpConnection, Service},
    error::ServerError,
    feature::CrossOriginIsolation,
    handler::{HandlerFn, ResponseHook, handler_fn},
    response::HttpResponse,
};

const MAX_CONNECTIONS: usize = 1000;
const CONNECTION_TIMEOUT: usize = 5;
const LISTEN_BACKLOG: u32 = 1024;

#[derive(Clone)]
pub struct ServerConfig {
    /// Interface to bind, `0.0.0.0` for all of them
    pub host: String,
    pub port: u16,
    pub handler: HandlerFn,
    pub hook: Arc<dyn ResponseHook>,
    pub access_log: Arc<AccessLog>,
    pub timeout: usize,
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            handler: handler_fn(|_| async { HttpResponse::error(404, "File not found") }),
            hook: Arc::new(CrossOriginIsolation::new()),
            access_log: Arc::new(AccessLog::stderr()),
            timeout: CONNECTION_TIMEOUT,
            max_connections: MAX_CONNECTIONS,
        }
    }
}

impl ServerConfig {
    /// `host:port`, with IPv6 literals bracketed
    pub fn address(&self) -> String {
        match self.host.parse::<IpAddr>() {
            Ok(ip) => SocketAddr::new(ip, self.port).to_string(),
            Err(_) => format!("{}:{}", self.host, self.port),
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .field("max_connections", &self.max_connections)
            .finish_non_exhaustive()
    }
}

#[derive(Default, Debug)]
pub struct HttpServer {
    pub config: ServerConfig,
}

impl HttpServer {
    pub fn new() -> Self {
        HttpServer {
            config: ServerConfig::default(),
        }
    }

    pub fn set_handler(&mut self, handler: HandlerFn) -> &mut Self {
        self.config.handler = handler;
        self
    }

    pub fn set_hook(&mut self, hook: Arc<dyn ResponseHook>) -> &mut Self {
        self.config.hook = hook;
        self
    }

    pub fn set_access_log(&mut self, access_log: AccessLog) -> &mut Self {
        self.config.access_log = Arc::new(access_log);
        self
    }

    pub fn set_host(&mut self, host: &str) -> &mut Self {
        self.config.host = host.to_string();
        self
    }

    pub fn set_port(&mut self, port: u16) -> &mut Self {
        self.config.port = port;
        self
    }

    /// Bind the listener with address reuse enabled
    pub async fn bind(&self) -> Result<BoundServer, ServerError> {
        let address = self.config.address();
        let addr = lookup_host(&address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })?
            .next()
            .ok_or_else(|| ServerError::ConfigError(format!("{address} resolves to nothing")))?;

        let listener = listen(addr).map_err(|source| match source.kind() {
            io::ErrorKind::AddrInUse => ServerError::AddrInUse {
                port: self.config.port,
                source,
            },
            _ => ServerError::Bind { address, source },
        })?;

        let local_addr = listener.local_addr()?;
        info!(address = %local_addr, "listening");

        Ok(BoundServer {
            listener,
            local_addr,
            service: Service {
                handler: Arc::clone(&self.config.handler),
                hook: Arc::clone(&self.config.hook),
                access_log: Arc::clone(&self.config.access_log),
            },
            timeout: self.config.timeout,
            max_connections: self.config.max_connections,
        })
    }

    /// Bind and serve until the process ends
    pub async fn run(&self) -> Result<(), ServerError> {
        self.bind().await?.serve().await
    }
}

fn listen(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4()?,
        SocketAddr::V6(_) => TcpSocket::new_v6()?,
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(LISTEN_BACKLOG)
}

/// A listener ready to accept; dropping it closes the socket
pub struct BoundServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    service: Service,
    timeout: usize,
    max_connections: usize,
}

impl BoundServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn serve(self) -> Result<(), ServerError> {
        self.serve_until(std::future::pending()).await
    }

    /// Accept connections until `shutdown` completes, then close the listener
    pub async fn serve_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let semaphore = Arc::new(Semaphore::new(self.max_connections));

        loop {
            let permit = tokio::select! {
                _ = &mut shutdown => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(e) => {
                        error!(error = %e, "get permit failed");
                        time::sleep(Duration::from_secs(self.timeout as u64)).await;
                        continue;
                    }
                },
            };

            let (socket, addr) = tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(connection) => connection,
                    Err(e) => {
                        error!(error = %e, "accept connection failed");
                        continue;
                    }
                },
            };

            debug!(peer = %addr, "new connection");

            let mut connection =
                HttpConnection::new(socket, addr, self.service.clone(), self.timeout as u64);

            spawn(async move {
                let _permit = permit;

                if let Err(e) = connection.process().await {
                    debug!(peer = %addr, error = %e, "connection ended with error");
                };
            });
        }

        info!(address = %self.local_addr, "stopped accepting connections");
        Ok(())
    }
}

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error
    #[error("{0}")]
    IOError(#[from] io::Error),
    /// The port is held by another socket
    #[error("port {port} is already in use")]
    AddrInUse {
        port: u16,
        #[source]
        source: io::Error,
    },
    /// Any other bind/listen failure
    #[error("{source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
    /// Serving directory can not be used
    #[error("serving directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("current directory is not listable and no home directory is known")]
    NoHomeDirectory,
    /// Protocol error
    #[error("protocol error: {0}")]
    ProtocolError(String),
    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),
    /// Timeout error
    #[error("timeout: {0}")]
    TimeoutError(String),
}

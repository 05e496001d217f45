//! Static file serving with cross-origin isolation headers.
//!
//! A small HTTP/1.x server: [`server::HttpServer`] accepts connections,
//! [`connect::HttpConnection`] parses request heads and hands them to a
//! [`handler::HandlerFn`], and a [`handler::ResponseHook`] decorates every
//! response and filters the access log on the way out.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use http::feature::{CrossOriginIsolation, StaticFiles, preflight};
//! use http::server::HttpServer;
//!
//! # async fn run() -> Result<(), http::error::ServerError> {
//! let mut server = HttpServer::new();
//! server
//!     .set_port(8000)
//!     .set_handler(preflight(StaticFiles::new("./site").into_handler()))
//!     .set_hook(Arc::new(CrossOriginIsolation::with_quiet_prefix("GET /lib/")));
//! server.run().await
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod access_log;
pub mod body;
pub mod connect;
pub mod directory;
pub mod error;
pub mod feature;
pub mod handler;
pub mod headers;
pub mod method;
pub mod request;
pub mod response;
pub mod server;
pub mod uri;
pub mod utils;
pub mod version;

mod file_server;
mod isolation;

pub use file_server::StaticFiles;
pub use isolation::{CrossOriginIsolation, ISOLATION_HEADERS, preflight};

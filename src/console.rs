use std::path::Path;

use http::error::ServerError;

const RULE: &str = "==========================================";

pub const STOPPED: &str = "\n🛑 Server stopped";

pub fn banner(port: u16, directory: &Path) -> String {
    format!(
        "\n🚀 Cross-Origin Isolated Static Server\n\
         {RULE}\n\
         📍 URL: http://localhost:{port}\n\
         📁 Serving directory: {}\n\
         🦀 Version: {}\n\
         ✅ COOP/COEP headers: ENABLED\n\
         ✅ CORS headers: ENABLED\n\
         {RULE}\n\
         📊 Press Ctrl+C to stop the server\n",
        directory.display(),
        env!("CARGO_PKG_VERSION"),
    )
}

pub fn fallback_warning(message: &str) -> String {
    format!("⚠️  {message}")
}

/// What to tell the user when startup fails
pub fn failure(err: &ServerError) -> String {
    match err {
        ServerError::AddrInUse { port, .. } => format!(
            "\n❌ Port {port} is already in use.\n\
             💡 Try: sudo lsof -i :{port} | grep LISTEN\n\
             💡 Then: kill -9 [PID]"
        ),
        other => format!("\n❌ Error: {other}"),
    }
}

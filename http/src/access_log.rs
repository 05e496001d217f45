use std::{
    io::{self, Write},
    net::IpAddr,
    sync::Mutex,
};

use chrono::{DateTime, Local};

use crate::utils::log_date_time;

/// Access log in the common "host - - [time] request" shape.
///
/// One line per handled request, written to stderr unless another sink is
/// given. Whether a request is logged at all is decided by the response
/// hook before [`AccessLog::record`] is called.
pub struct AccessLog {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl AccessLog {
    pub fn stderr() -> Self {
        Self::to_writer(io::stderr())
    }

    pub fn to_writer<W: Write + Send + 'static>(writer: W) -> Self {
        AccessLog {
            sink: Mutex::new(Box::new(writer)),
        }
    }

    pub fn record(&self, client: IpAddr, request_line: &str, status_code: u16) {
        let line = format_line(client, Local::now(), request_line, status_code);
        let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        let _ = sink.write_all(line.as_bytes());
        let _ = sink.flush();
    }
}

impl Default for AccessLog {
    fn default() -> Self {
        Self::stderr()
    }
}

impl std::fmt::Debug for AccessLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessLog").finish_non_exhaustive()
    }
}

pub fn format_line(
    client: IpAddr,
    time: DateTime<Local>,
    request_line: &str,
    status_code: u16,
) -> String {
    format!(
        "{client} - - [{}] \"{request_line}\" {status_code} -\n",
        log_date_time(time)
    )
}

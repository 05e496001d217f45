use std::time::SystemTime;

use chrono::{DateTime, Local, Utc};

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// find the end of the request head
///
/// The head ends at the first blank line. Lines may end in `\r\n` or a
/// bare `\n`, so `\r\n\r\n`, `\n\n` and `\n\r\n` all terminate it.
/// Returns the position just past the terminator.
pub fn find_headers_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .iter()
        .enumerate()
        .filter(|(_, byte)| **byte == b'\n')
        .find_map(|(pos, _)| match &buffer[pos + 1..] {
            [b'\n', ..] => Some(pos + 2),
            [b'\r', b'\n', ..] => Some(pos + 3),
            _ => None,
        })
}

/// IMF-fixdate, as used by `Date` and `Last-Modified`
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}

/// Parse an IMF-fixdate header value
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Access log timestamp, e.g. `16/Oct/2026 09:41:07`
pub fn log_date_time(time: DateTime<Local>) -> String {
    time.format("%d/%b/%Y %H:%M:%S").to_string()
}

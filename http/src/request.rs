use crate::{
    error::ServerError, headers::HttpHeaders, method::HttpMethod, uri::HttpUri,
    version::HttpVersion,
};

#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Method token as sent, kept for diagnostics on unsupported methods
    pub method_name: String,
    /// HTTP headers
    pub headers: HttpHeaders,
    /// HTTP URI
    pub uri: HttpUri,
    /// HTTP version
    pub version: HttpVersion,
    /// First line of the request, without the line terminator
    pub request_line: String,
}

impl HttpRequest {
    /// Parse a request head (request line plus header lines)
    pub fn parse(head: &str) -> Result<Self, ServerError> {
        let mut lines = head.lines();
        let request_line = lines
            .next()
            .filter(|line| !line.is_empty())
            .ok_or_else(|| ServerError::ProtocolError("Empty request line".into()))?;

        let parts: Vec<&str> = request_line.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(ServerError::ProtocolError(format!(
                "Bad request syntax ('{request_line}')"
            )));
        }

        let mut headers = HttpHeaders::new();
        for line in lines {
            // blank line ends the head
            if line.is_empty() {
                break;
            }

            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.trim(), value.trim());
            }
        }

        Ok(HttpRequest {
            method: HttpMethod::from(parts[0]),
            method_name: parts[0].to_string(),
            headers,
            uri: HttpUri::from(parts[1]),
            version: HttpVersion::from(parts[2]),
            request_line: request_line.to_string(),
        })
    }

    /// Whether the client wants the connection kept open after this request
    pub fn wants_keep_alive(&self) -> bool {
        match self.headers.get("Connection") {
            Some(value) if value.eq_ignore_ascii_case("close") => false,
            Some(value) if value.eq_ignore_ascii_case("keep-alive") => true,
            _ => self.version.keep_alive_by_default(),
        }
    }

    /// Whether the request announces a body
    pub fn has_body(&self) -> bool {
        self.headers.contains_key("Transfer-Encoding")
            || self
                .headers
                .get("Content-Length")
                .is_some_and(|len| len.trim() != "0")
    }
}

impl TryFrom<&str> for HttpRequest {
    type Error = ServerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        HttpRequest::parse(value)
    }
}

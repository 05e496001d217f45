use html_escape::encode_text;
use tokio::io::{self, AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::{body::HttpBody, headers::HttpHeaders, version::HttpVersion};

#[derive(Debug)]
pub struct HttpResponse {
    /// HTTP status code
    status_code: u16,
    /// HTTP status text
    status_text: String,
    /// HTTP headers
    headers: HttpHeaders,
    /// HTTP body
    body: HttpBody,
    /// HTTP version
    version: HttpVersion,
}

impl HttpResponse {
    pub fn new(status_code: u16, status_text: &str) -> Self {
        HttpResponse {
            status_code,
            status_text: status_text.to_string(),
            headers: HttpHeaders::new(),
            body: HttpBody::new(),
            version: HttpVersion::V1_1,
        }
    }

    /// Response with the standard reason phrase for `status_code`
    pub fn status(status_code: u16) -> Self {
        HttpResponse::new(status_code, reason_phrase(status_code))
    }

    /// Error page for `status_code`, closing the connection afterwards
    pub fn error(status_code: u16, message: &str) -> Self {
        let explanation = explanation(status_code);
        let page = format!(
            "<!DOCTYPE HTML>\n\
             <html lang=\"en\">\n\
             <head>\n\
             <meta charset=\"utf-8\">\n\
             <title>Error response</title>\n\
             </head>\n\
             <body>\n\
             <h1>Error response</h1>\n\
             <p>Error code: {status_code}</p>\n\
             <p>Message: {}.</p>\n\
             <p>Error code explanation: {status_code} - {}.</p>\n\
             </body>\n\
             </html>\n",
            encode_text(message),
            encode_text(explanation),
        );

        let mut response = HttpResponse::status(status_code);
        response
            .headers
            .insert("Content-Type", "text/html;charset=utf-8");
        response.headers.insert("Connection", "close");
        // no body allowed on these
        if !matches!(status_code, 100..=199 | 204 | 304) {
            response.body = HttpBody::from(page);
        }
        response
    }

    pub fn with_body(mut self, body: HttpBody) -> Self {
        self.body = body;
        self
    }

    pub fn insert_header(mut self, k: &str, v: &str) -> Self {
        self.headers.insert(k, v);
        self
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HttpHeaders {
        &mut self.headers
    }

    pub fn body(&self) -> &HttpBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut HttpBody {
        &mut self.body
    }

    /// Stream `length` bytes from `reader` as the body
    pub fn with_streaming_body<R>(mut self, reader: R, length: u64, buffer_size: usize) -> Self
    where
        R: AsyncRead + Send + Sync + 'static,
    {
        self.body = HttpBody::from_sized_reader(reader, length, buffer_size);
        self
    }

    /// Drop the body but keep the headers describing it, for HEAD
    pub fn strip_body(&mut self) {
        if !self.headers.contains_key("Content-Length") {
            if let Some(length) = self.body.content_length() {
                self.headers.insert("Content-Length", &length.to_string());
            }
        }
        self.body = HttpBody::Empty;
    }

    /// Whether the peer is told to close the connection
    pub fn closes_connection(&self) -> bool {
        self.headers
            .get("Connection")
            .is_some_and(|v| v.eq_ignore_ascii_case("close"))
    }

    fn allows_body(&self) -> bool {
        !matches!(self.status_code, 100..=199 | 204 | 304)
    }

    async fn write_headers<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut head = format!(
            "{} {} {}\r\n",
            self.version.as_str(),
            self.status_code,
            self.status_text
        );

        if !self.headers.contains_key("Content-Length") && self.allows_body() {
            // an empty body still needs a length to keep the connection usable
            let length = self.body.content_length().unwrap_or(0);
            head.push_str(&format!("Content-Length: {length}\r\n"));
        }

        for (key, value) in self.headers.iter() {
            head.push_str(&format!("{key}: {value}\r\n"));
        }

        // end of headers
        head.push_str("\r\n");
        writer.write_all(head.as_bytes()).await
    }

    /// send response
    pub async fn send<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        self.write_headers(writer).await?;

        while let Some(chunk) = self.body.read_next().await? {
            writer.write_all(&chunk).await?;
        }
        writer.flush().await?;

        Ok(())
    }
}

pub fn reason_phrase(status_code: u16) -> &'static str {
    match status_code {
        200 => "OK",
        204 => "No Content",
        301 => "Moved Permanently",
        304 => "Not Modified",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        505 => "HTTP Version Not Supported",
        _ => "Unknown",
    }
}

fn explanation(status_code: u16) -> &'static str {
    match status_code {
        400 => "Bad request syntax or unsupported method",
        403 => "Request forbidden -- authorization will not help",
        404 => "Nothing matches the given URI",
        431 => "The server is unwilling to process the request because its header fields are too large",
        500 => "Server got itself in trouble",
        501 => "Server does not support this operation",
        505 => "Cannot fulfill request",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::test;

    async fn render(response: &mut HttpResponse) -> String {
        let mut buffer = Vec::new();
        response.send(&mut buffer).await.unwrap();
        String::from_utf8_lossy(&buffer).to_string()
    }

    #[test]
    async fn test_basic_response() {
        let mut response = HttpResponse::new(200, "OK").with_body(HttpBody::from("Hello, World!"));
        response.headers.insert("Content-Type", "text/plain");

        let response_str = render(&mut response).await;
        assert!(response_str.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response_str.contains("Content-Type: text/plain\r\n"));
        assert!(response_str.contains("Content-Length: 13\r\n"));
        assert!(response_str.ends_with("\r\n\r\nHello, World!"));
    }

    #[test]
    async fn test_empty_ok_has_zero_length() {
        let mut response = HttpResponse::status(200);

        let response_str = render(&mut response).await;
        assert!(response_str.contains("Content-Length: 0\r\n"));
        assert!(response_str.ends_with("\r\n\r\n"));
    }

    #[test]
    async fn test_no_content_has_no_length() {
        let mut response = HttpResponse::new(204, "No Content");

        let response_str = render(&mut response).await;
        assert!(response_str.contains("HTTP/1.1 204 No Content"));
        assert!(!response_str.contains("Content-Length"));
    }

    #[test]
    async fn test_error_page() {
        let mut response = HttpResponse::error(404, "File not found");
        assert!(response.closes_connection());

        let response_str = render(&mut response).await;
        assert!(response_str.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(response_str.contains("Content-Type: text/html;charset=utf-8\r\n"));
        assert!(response_str.contains("<p>Message: File not found.</p>"));
    }

    #[test]
    async fn test_error_page_escapes_message() {
        let response = HttpResponse::error(501, "Unsupported method ('<script>')");
        let HttpBody::InMemory { data } = response.body() else {
            panic!("error page should be in memory");
        };
        let page = String::from_utf8_lossy(data);
        assert!(page.contains("&lt;script&gt;"));
    }

    #[test]
    async fn test_strip_body_keeps_length() {
        let mut response = HttpResponse::status(200).with_body(HttpBody::from("0123456789"));
        response.strip_body();

        let response_str = render(&mut response).await;
        assert!(response_str.contains("Content-Length: 10\r\n"));
        assert!(response_str.ends_with("\r\n\r\n"));
    }

    #[test]
    async fn test_streaming_body_uses_declared_length() {
        let reader = std::io::Cursor::new(b"First chunk Second chunk".to_vec());
        let mut response = HttpResponse::status(200).with_streaming_body(reader, 11, 4);

        let response_str = render(&mut response).await;
        assert!(response_str.contains("Content-Length: 11\r\n"));
        assert!(response_str.ends_with("\r\n\r\nFirst chunk"));
        assert!(!response_str.contains("Transfer-Encoding"));
    }
}

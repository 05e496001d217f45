//! Cross-origin isolation for local development.
//!
//! Browsers only expose `SharedArrayBuffer` (and with it threaded
//! WebAssembly builds such as gdal3.js) to pages that are cross-origin
//! isolated. [`CrossOriginIsolation`] stamps the required headers onto every
//! response and [`preflight`] answers CORS preflight requests.

use crate::{
    handler::{HandlerFn, ResponseHook, handler_fn},
    headers::HttpHeaders,
    method::HttpMethod,
    request::HttpRequest,
    response::HttpResponse,
};

use std::sync::Arc;

/// Headers set on every response, names and values exactly as sent
pub const ISOLATION_HEADERS: [(&str, &str); 9] = [
    ("Cross-Origin-Opener-Policy", "same-origin"),
    ("Cross-Origin-Embedder-Policy", "require-corp"),
    ("Cross-Origin-Resource-Policy", "cross-origin"),
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
    ("Cache-Control", "no-cache, no-store, must-revalidate"),
    ("Pragma", "no-cache"),
    ("Expires", "0"),
];

#[derive(Debug, Default, Clone)]
pub struct CrossOriginIsolation {
    /// Request lines starting with this are left out of the access log
    quiet_prefix: Option<String>,
}

impl CrossOriginIsolation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quiet_prefix(prefix: &str) -> Self {
        CrossOriginIsolation {
            quiet_prefix: Some(prefix.to_string()),
        }
    }
}

impl ResponseHook for CrossOriginIsolation {
    fn before_response(&self, headers: &mut HttpHeaders) {
        for (name, value) in ISOLATION_HEADERS {
            headers.insert(name, value);
        }
    }

    fn should_log(&self, request_line: &str) -> bool {
        self.quiet_prefix
            .as_deref()
            .is_none_or(|prefix| !request_line.starts_with(prefix))
    }
}

/// Answer OPTIONS with an empty 200, pass everything else to `inner`
pub fn preflight(inner: HandlerFn) -> HandlerFn {
    handler_fn(move |req: HttpRequest| {
        let inner = Arc::clone(&inner);
        async move {
            match req.method {
                HttpMethod::Options => HttpResponse::status(200),
                _ => inner(req).await,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::HttpBody;
    use tokio::test;

    fn request(line: &str) -> HttpRequest {
        HttpRequest::parse(&format!("{line}\r\nHost: localhost\r\n\r\n")).unwrap()
    }

    #[test]
    async fn test_headers_injected_once() {
        let mut headers = HttpHeaders::new();
        headers.insert("Content-Type", "application/wasm");
        headers.insert("cache-control", "public, max-age=31536000");

        CrossOriginIsolation::new().before_response(&mut headers);

        assert_eq!(headers.len(), ISOLATION_HEADERS.len() + 1);
        for (name, value) in ISOLATION_HEADERS {
            let matching: Vec<_> = headers.iter().filter(|(k, _)| k.as_str() == name).collect();
            assert_eq!(matching.len(), 1, "{name}");
            assert_eq!(matching[0].1, value);
        }
        assert_eq!(headers.get("Content-Type").unwrap(), "application/wasm");
    }

    #[test]
    async fn test_quiet_prefix() {
        let lib_quiet = CrossOriginIsolation::with_quiet_prefix("GET /lib/");
        assert!(!lib_quiet.should_log("GET /lib/gdal3.js HTTP/1.1"));
        assert!(lib_quiet.should_log("GET /index.html HTTP/1.1"));
        assert!(lib_quiet.should_log("HEAD /lib/gdal3.js HTTP/1.1"));

        let all_gets_quiet = CrossOriginIsolation::with_quiet_prefix("GET /");
        assert!(!all_gets_quiet.should_log("GET / HTTP/1.1"));
        assert!(all_gets_quiet.should_log("OPTIONS / HTTP/1.1"));

        assert!(CrossOriginIsolation::new().should_log("GET /lib/x HTTP/1.1"));
    }

    #[test]
    async fn test_preflight_short_circuits() {
        let inner = handler_fn(|_req: HttpRequest| async {
            HttpResponse::status(404).with_body(HttpBody::from("inner"))
        });
        let handler = preflight(inner);

        let response = handler(request("OPTIONS /missing/path HTTP/1.1")).await;
        assert_eq!(response.status_code(), 200);
        assert!(response.body().is_empty());

        let response = handler(request("GET /missing/path HTTP/1.1")).await;
        assert_eq!(response.status_code(), 404);
    }
}

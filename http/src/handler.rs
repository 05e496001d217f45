use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::headers::HttpHeaders;
use crate::request::HttpRequest;
use crate::response::HttpResponse;

/// Handler function type
///
/// Use [`handler_fn`] to build one from an `async fn` or a closure returning
/// a future.
///
/// # Examples
///
/// ```rust
/// use http::handler::{HandlerFn, handler_fn};
/// use http::request::HttpRequest;
/// use http::response::HttpResponse;
///
/// async fn hello(_req: HttpRequest) -> HttpResponse {
///     HttpResponse::status(200).with_body("Hello, world!".into())
/// }
///
/// let handler: HandlerFn = handler_fn(hello);
/// ```
pub type HandlerFn = Arc<dyn Fn(HttpRequest) -> BoxFuture + Send + Sync + 'static>;

pub type BoxFuture = Pin<Box<dyn Future<Output = HttpResponse> + Send + 'static>>;

pub fn handler_fn<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HttpResponse> + Send + 'static,
{
    Arc::new(move |req| -> BoxFuture { Box::pin(f(req)) })
}

/// Hooks run by the connection around every response it writes.
///
/// `before_response` sees the final headers of every response, including
/// the ones the connection produces itself (bad requests, oversized heads).
pub trait ResponseHook: Send + Sync {
    fn before_response(&self, headers: &mut HttpHeaders);

    /// Whether the access log line for `request_line` is written
    fn should_log(&self, _request_line: &str) -> bool {
        true
    }
}

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use chrono::{DateTime, Utc};
use html_escape::encode_text;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tokio::{
    fs::{self, File},
    io::AsyncReadExt,
};
use tracing::{debug, warn};

use crate::{
    body::HttpBody,
    handler::{HandlerFn, handler_fn},
    method::HttpMethod,
    request::HttpRequest,
    response::HttpResponse,
    utils::{http_date, parse_http_date},
};

/// Files up to this size are read into memory, larger ones are streamed
const IN_MEMORY_LIMIT: u64 = 1024 * 1024;
const STREAM_BUFFER_SIZE: usize = 8192;
const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Characters escaped in listing hrefs
const HREF_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Serves GET and HEAD from a directory
///
/// Directories get their `index.html`/`index.htm` or a generated listing,
/// and are redirected to the slash-terminated URL first. Every other method
/// is answered with 501.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: Arc<PathBuf>,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        StaticFiles {
            root: Arc::new(root.into()),
        }
    }

    pub fn into_handler(self) -> HandlerFn {
        handler_fn(move |req| {
            let files = self.clone();
            async move { files.serve(req).await }
        })
    }

    pub async fn serve(&self, req: HttpRequest) -> HttpResponse {
        if !req.method.reads_files() {
            return HttpResponse::error(
                501,
                &format!("Unsupported method ('{}')", req.method_name),
            );
        }

        let mut response = self.respond(&req).await;
        if req.method == HttpMethod::Head {
            response.strip_body();
        }
        response
    }

    async fn respond(&self, req: &HttpRequest) -> HttpResponse {
        let segments = match req.uri.segments() {
            Ok(segments) => segments,
            Err(_) => return HttpResponse::error(400, "Bad request path"),
        };
        let path = segments
            .iter()
            .fold(self.root.to_path_buf(), |path, segment| path.join(segment));

        let metadata = match fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "nothing to serve");
                return HttpResponse::error(404, "File not found");
            }
        };

        if metadata.is_dir() {
            if !req.uri.has_trailing_slash() {
                let location = match &req.uri.query {
                    Some(query) => format!("{}/?{query}", req.uri.path),
                    None => format!("{}/", req.uri.path),
                };
                return HttpResponse::status(301).insert_header("Location", &location);
            }

            for index in INDEX_FILES {
                let index_path = path.join(index);
                if fs::metadata(&index_path)
                    .await
                    .is_ok_and(|meta| meta.is_file())
                {
                    return self.send_file(&index_path, req).await;
                }
            }

            return self.list_directory(&path, req).await;
        }

        // "/file.txt/" names a directory that does not exist
        if req.uri.has_trailing_slash() {
            return HttpResponse::error(404, "File not found");
        }

        self.send_file(&path, req).await
    }

    async fn send_file(&self, path: &Path, req: &HttpRequest) -> HttpResponse {
        let mut file = match File::open(path).await {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to open file");
                return HttpResponse::error(404, "File not found");
            }
        };

        let metadata = match file.metadata().await {
            Ok(meta) => meta,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to get metadata");
                return HttpResponse::error(500, "Error reading file metadata");
            }
        };

        let modified = metadata.modified().ok();
        let last_modified = modified.map(http_date);

        if modified.is_some_and(|time| not_modified_since(req, time)) {
            let mut response = HttpResponse::status(304);
            if let Some(date) = &last_modified {
                response.headers_mut().insert("Last-Modified", date);
            }
            return response;
        }

        let file_size = metadata.len();
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        let mut response = HttpResponse::status(200)
            .insert_header("Content-Type", mime.as_ref())
            .insert_header("Content-Length", &file_size.to_string());
        if let Some(date) = &last_modified {
            response.headers_mut().insert("Last-Modified", date);
        }

        if req.method == HttpMethod::Head {
            return response;
        }

        if file_size <= IN_MEMORY_LIMIT {
            let mut data = Vec::with_capacity(file_size as usize);
            if let Err(e) = file.read_to_end(&mut data).await {
                warn!(path = %path.display(), error = %e, "failed to read file");
                return HttpResponse::error(500, "Error reading file");
            }
            response.with_body(HttpBody::from_data(data))
        } else {
            response.with_streaming_body(file, file_size, STREAM_BUFFER_SIZE)
        }
    }

    async fn list_directory(&self, dir: &Path, req: &HttpRequest) -> HttpResponse {
        let listing = match read_listing(dir).await {
            Ok(listing) => listing,
            Err(e) => {
                debug!(path = %dir.display(), error = %e, "failed to list directory");
                return HttpResponse::error(404, "No permission to list directory");
            }
        };

        let display_path = req
            .uri
            .decoded_path()
            .unwrap_or_else(|_| req.uri.path.clone());
        let title = format!("Directory listing for {}", encode_text(&display_path));

        let mut page = format!(
            "<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n\
             <meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n\
             <body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
        );
        for entry in listing {
            page.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                utf8_percent_encode(&entry.href(), HREF_ESCAPE),
                encode_text(&entry.display_name()),
            ));
        }
        page.push_str("</ul>\n<hr>\n</body>\n</html>\n");

        HttpResponse::status(200)
            .insert_header("Content-Type", "text/html; charset=utf-8")
            .with_body(HttpBody::from(page))
    }
}

struct ListingEntry {
    name: String,
    is_dir: bool,
    is_symlink: bool,
}

impl ListingEntry {
    fn href(&self) -> String {
        match self.is_dir {
            true => format!("{}/", self.name),
            false => self.name.clone(),
        }
    }

    fn display_name(&self) -> String {
        if self.is_dir {
            format!("{}/", self.name)
        } else if self.is_symlink {
            format!("{}@", self.name)
        } else {
            self.name.clone()
        }
    }
}

async fn read_listing(dir: &Path) -> std::io::Result<Vec<ListingEntry>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut listing = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let is_symlink = entry.file_type().await?.is_symlink();
        // follows links, a link to a directory lists as a directory
        let is_dir = fs::metadata(entry.path())
            .await
            .is_ok_and(|meta| meta.is_dir());
        listing.push(ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
            is_symlink,
        });
    }

    listing.sort_by_key(|entry| entry.name.to_lowercase());
    Ok(listing)
}

fn not_modified_since(req: &HttpRequest, modified: SystemTime) -> bool {
    if req.headers.contains_key("If-None-Match") {
        return false;
    }
    let Some(since) = req
        .headers
        .get("If-Modified-Since")
        .and_then(|value| parse_http_date(value))
    else {
        return false;
    };

    DateTime::<Utc>::from(modified).timestamp() <= since.timestamp()
}

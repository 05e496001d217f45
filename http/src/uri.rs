use std::str::Utf8Error;

use percent_encoding::percent_decode_str;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HttpUri {
    /// Raw (still percent-encoded) path
    pub path: String,
    /// Query string without the leading `?`
    pub query: Option<String>,
}

impl HttpUri {
    /// Percent-decoded path
    pub fn decoded_path(&self) -> Result<String, Utf8Error> {
        percent_decode_str(&self.path)
            .decode_utf8()
            .map(|path| path.into_owned())
    }

    /// Decoded path segments, with empty, `.` and `..` segments dropped
    ///
    /// The result can be joined onto a directory without leaving it.
    pub fn segments(&self) -> Result<Vec<String>, Utf8Error> {
        let decoded = self.decoded_path()?;
        Ok(decoded
            .split('/')
            .filter(|s| !s.is_empty() && *s != "." && *s != "..")
            .map(str::to_string)
            .collect())
    }

    pub fn has_trailing_slash(&self) -> bool {
        self.path.ends_with('/')
    }
}

impl From<&str> for HttpUri {
    fn from(value: &str) -> Self {
        // fragment never reaches the server in practice, drop it anyway
        let value = value.split('#').next().unwrap_or_default();
        match value.split_once('?') {
            Some((path, query)) => HttpUri {
                path: path.to_string(),
                query: Some(query.to_string()),
            },
            None => HttpUri {
                path: value.to_string(),
                query: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_split() {
        let uri = HttpUri::from("/data/tile.wasm?v=3#frag");
        assert_eq!(uri.path, "/data/tile.wasm");
        assert_eq!(uri.query.as_deref(), Some("v=3"));
    }

    #[test]
    fn test_segments_decoded() {
        let uri = HttpUri::from("/lib/gdal%203/./gdal3.js");
        assert_eq!(uri.segments().unwrap(), vec!["lib", "gdal 3", "gdal3.js"]);
    }

    #[test]
    fn test_segments_drop_parent() {
        let uri = HttpUri::from("/../../etc/passwd");
        assert_eq!(uri.segments().unwrap(), vec!["etc", "passwd"]);

        let encoded = HttpUri::from("/%2e%2e/secret");
        assert_eq!(encoded.segments().unwrap(), vec!["secret"]);
    }

    #[test]
    fn test_segments_root() {
        let uri = HttpUri::from("/");
        assert!(uri.segments().unwrap().is_empty());
        assert!(uri.has_trailing_slash());
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(HttpUri::from("/%FF").segments().is_err());
    }
}

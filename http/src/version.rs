#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
/// HTTP version
pub enum HttpVersion {
    V1_0,
    #[default]
    V1_1,
    NoSupport,
}

impl HttpVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVersion::V1_0 => "HTTP/1.0",
            HttpVersion::V1_1 => "HTTP/1.1",
            HttpVersion::NoSupport => "NoSupport",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, HttpVersion::NoSupport)
    }

    /// Persistent connections are the default only from 1.1 on
    pub fn keep_alive_by_default(&self) -> bool {
        matches!(self, HttpVersion::V1_1)
    }
}

/// Any `HTTP/1.x` is accepted; 1.1 and later minors get 1.1 semantics
impl From<&str> for HttpVersion {
    fn from(value: &str) -> Self {
        let Some((major, minor)) = value
            .strip_prefix("HTTP/")
            .and_then(|number| number.split_once('.'))
        else {
            return HttpVersion::NoSupport;
        };

        let is_number = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !is_number(major) || !is_number(minor) {
            return HttpVersion::NoSupport;
        }

        match (major.parse::<u32>(), minor.parse::<u32>()) {
            (Ok(1), Ok(0)) => HttpVersion::V1_0,
            (Ok(1), Ok(_)) => HttpVersion::V1_1,
            _ => HttpVersion::NoSupport,
        }
    }
}

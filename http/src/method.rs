#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Options,
    NoSupport,
}

impl HttpMethod {
    /// Methods answered from the serving directory
    pub fn reads_files(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head)
    }
}

impl From<&str> for HttpMethod {
    fn from(value: &str) -> Self {
        match value {
            "GET" => HttpMethod::Get,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            _ => HttpMethod::NoSupport,
        }
    }
}

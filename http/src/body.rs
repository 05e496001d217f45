use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncReadExt};

#[derive(Default)]
pub enum HttpBody {
    /// complete data in memory
    InMemory { data: Vec<u8> },
    /// streaming data, `length` is known for files
    Streaming {
        reader: Pin<Box<dyn AsyncRead + Send + Sync + 'static>>,
        read_buf: Vec<u8>,
        buffer_size: usize,
        length: Option<u64>,
    },
    /// empty body
    #[default]
    Empty,
}

impl HttpBody {
    pub fn new() -> Self {
        HttpBody::Empty
    }

    pub fn from_data(data: Vec<u8>) -> Self {
        match data.is_empty() {
            true => HttpBody::Empty,
            false => HttpBody::InMemory { data },
        }
    }

    /// Stream exactly `length` bytes from `reader`
    pub fn from_sized_reader<R>(reader: R, length: u64, buffer_size: usize) -> Self
    where
        R: AsyncRead + Send + Sync + 'static,
    {
        HttpBody::Streaming {
            reader: Box::pin(reader.take(length)),
            read_buf: Vec::with_capacity(buffer_size),
            buffer_size,
            length: Some(length),
        }
    }

    pub async fn read_next(&mut self) -> tokio::io::Result<Option<Vec<u8>>> {
        match self {
            HttpBody::InMemory { data } => {
                if data.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(std::mem::take(data)))
                }
            }
            HttpBody::Streaming {
                reader,
                read_buf,
                buffer_size,
                ..
            } => {
                read_buf.clear();
                read_buf.resize(*buffer_size, 0);
                match AsyncReadExt::read(reader, read_buf).await {
                    // end of stream
                    Ok(0) => Ok(None),
                    Ok(n) => {
                        read_buf.truncate(n);
                        Ok(Some(read_buf.clone()))
                    }
                    Err(e) => Err(e),
                }
            }
            HttpBody::Empty => Ok(None),
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, HttpBody::Streaming { .. })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, HttpBody::Empty)
    }

    pub fn content_length(&self) -> Option<u64> {
        match self {
            HttpBody::InMemory { data } => Some(data.len() as u64),
            HttpBody::Streaming { length, .. } => *length,
            HttpBody::Empty => None,
        }
    }
}

impl std::fmt::Debug for HttpBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpBody::InMemory { data } => f
                .debug_struct("InMemory")
                .field("len", &data.len())
                .finish(),
            HttpBody::Streaming {
                buffer_size,
                length,
                ..
            } => f
                .debug_struct("Streaming")
                .field("buffer_size", buffer_size)
                .field("length", length)
                .field("reader", &"<dyn AsyncRead>")
                .finish(),
            HttpBody::Empty => write!(f, "Empty"),
        }
    }
}

impl From<&str> for HttpBody {
    fn from(value: &str) -> Self {
        HttpBody::from_data(value.as_bytes().to_vec())
    }
}

impl From<String> for HttpBody {
    fn from(value: String) -> Self {
        HttpBody::from_data(value.into_bytes())
    }
}

impl From<Vec<u8>> for HttpBody {
    fn from(value: Vec<u8>) -> Self {
        HttpBody::from_data(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::test;

    #[test]
    async fn test_empty_body() {
        let mut body = HttpBody::new();

        assert_eq!(body.read_next().await.unwrap(), None);
        assert_eq!(body.content_length(), None);
        assert!(!body.is_streaming());
        assert!(body.is_empty());
    }

    #[test]
    async fn test_in_memory_body() {
        let data = "Hello world!".as_bytes().to_vec();
        let expected_len = data.len() as u64;
        let mut body = HttpBody::from_data(data);

        // length
        assert_eq!(body.content_length(), Some(expected_len));

        // read content
        let content = body.read_next().await.unwrap().unwrap();
        assert_eq!(String::from_utf8_lossy(&content), "Hello world!");

        // have read all data
        assert_eq!(body.read_next().await.unwrap(), None);

        // not streaming
        assert!(!body.is_streaming());
    }

    #[test]
    async fn test_empty_data_is_empty_body() {
        assert!(HttpBody::from(String::new()).is_empty());
    }

    #[test]
    async fn test_sized_streaming_body() {
        use std::io::Cursor;

        let data = b"\0asm\x01\0\0\0 trailing bytes past the limit".to_vec();
        let cursor = Cursor::new(data.clone());

        // some buffer size to ensure read few times
        let mut body = HttpBody::from_sized_reader(cursor, 8, 3);

        assert!(body.is_streaming());
        assert_eq!(body.content_length(), Some(8));

        let mut all_chunks = Vec::new();
        while let Some(chunk) = body.read_next().await.unwrap() {
            all_chunks.extend_from_slice(&chunk);
        }

        assert_eq!(all_chunks, data[..8].to_vec());
    }
}

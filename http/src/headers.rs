/// Ordered header list, names compared ASCII case-insensitively.
///
/// A name appears at most once: inserting an existing name replaces the
/// entry in place, spelling included.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HttpHeaders {
    entries: Vec<(String, String)>,
}

impl HttpHeaders {
    pub fn new() -> Self {
        HttpHeaders {
            entries: Vec::new(),
        }
    }

    /// Insert to header, replacing any value under the same name
    pub fn insert(&mut self, k: &str, v: &str) {
        match self.position(k) {
            Some(i) => self.entries[i] = (k.to_string(), v.to_string()),
            None => self.entries.push((k.to_string(), v.to_string())),
        }
    }

    /// Get the value of the header
    pub fn get(&self, k: &str) -> Option<&String> {
        self.position(k).map(|i| &self.entries[i].1)
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Check if the key in the header exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, k: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case(k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::test;

    #[test]
    async fn test_header_add() {
        let mut header = HttpHeaders::new();
        header.insert("Content-Type", "Unknown");

        assert!(header.contains_key("Content-Type"));
        assert_eq!(header.get("Content-Type").unwrap(), "Unknown");
    }

    #[test]
    async fn test_header_case_insensitive_replace() {
        let mut header = HttpHeaders::new();
        header.insert("cache-control", "public, max-age=60");
        header.insert("Cache-Control", "no-cache");

        assert_eq!(header.len(), 1);
        assert_eq!(header.get("CACHE-CONTROL").unwrap(), "no-cache");
        assert_eq!(header.iter().next().unwrap().0, "Cache-Control");
    }
}

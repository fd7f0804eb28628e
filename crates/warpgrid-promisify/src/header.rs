use serde::{Serialize, Serializer};

/// An HTTP header as a name-value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Response headers accumulated by a handler.
///
/// Preserves first-insertion order. Unlike a wire-level header list, a
/// name appears at most once: inserting an existing name overwrites its
/// value in place. Names are matched exactly, the way keys on the
/// mimicked response object are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<Header>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Set `name` to `value`, replacing any previous value for `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|h| h.name == name) {
            Some(existing) => existing.value = value,
            None => self.entries.push(Header { name, value }),
        }
    }

    /// Merge every entry of `other` into this map; `other` wins on conflicts.
    pub fn merge(&mut self, other: HeaderMap) {
        for header in other.entries {
            self.insert(header.name, header.value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Header> {
        self.entries
    }
}

impl Serialize for HeaderMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|h| (&h.name, &h.value)))
    }
}

impl FromIterator<Header> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = Header>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        for header in iter {
            map.insert(header.name, header.value);
        }
        map
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        iter.into_iter().map(|(n, v)| Header::new(n, v)).collect()
    }
}

impl<N: Into<String>, V: Into<String>, const K: usize> From<[(N, V); K]> for HeaderMap {
    fn from(pairs: [(N, V); K]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_map_insert_and_get() {
        let mut map = HeaderMap::new();
        map.insert("Content-Type", "text/html");
        assert_eq!(map.get("Content-Type"), Some("text/html"));
        assert_eq!(map.get("X-Missing"), None);
    }

    #[test]
    fn insert_overwrites_existing_name() {
        let mut map = HeaderMap::new();
        map.insert("X", "1");
        map.insert("Y", "2");
        map.insert("X", "3");

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("X"), Some("3"));
        let names: Vec<_> = map.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["X", "Y"]);
    }

    #[test]
    fn names_match_exactly() {
        let mut map = HeaderMap::new();
        map.insert("x-trace", "a");
        map.insert("X-Trace", "b");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("x-trace"), Some("a"));
    }

    #[test]
    fn merge_applies_other_on_top() {
        let mut map = HeaderMap::from([("A", "1"), ("B", "2")]);
        map.merge(HeaderMap::from([("B", "20"), ("C", "30")]));

        let pairs: Vec<_> = map
            .iter()
            .map(|h| (h.name.as_str(), h.value.as_str()))
            .collect();
        assert_eq!(pairs, vec![("A", "1"), ("B", "20"), ("C", "30")]);
    }

    #[test]
    fn from_iterator_collapses_duplicates() {
        let map: HeaderMap = vec![("Host", "a.example"), ("Host", "b.example")]
            .into_iter()
            .collect();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("Host"), Some("b.example"));
    }

    #[test]
    fn serializes_as_object() {
        let map = HeaderMap::from([("X", "1"), ("Y", "2")]);
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json, serde_json::json!({ "X": "1", "Y": "2" }));
    }
}

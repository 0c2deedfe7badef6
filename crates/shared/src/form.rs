//! Multi-valued form input.

/// Submitted form fields in arrival order.
///
/// A key may appear any number of times; every occurrence is kept so that
/// checkbox groups and repeated inputs survive intact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    entries: Vec<(String, String)>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` body.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn from_urlencoded(body: &[u8]) -> Self {
        url::form_urlencoded::parse(body)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// First value submitted under `key`.
    pub fn get_one(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First value under `key`, treating an empty string as absent.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get_one(key).filter(|value| !value.is_empty())
    }

    pub fn get_many(&self, key: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Distinct keys starting with `prefix`, in order of first appearance.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for (key, _) in &self.entries {
            if key.starts_with(prefix) && !keys.contains(&key.as_str()) {
                keys.push(key.as_str());
            }
        }
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for FieldSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;

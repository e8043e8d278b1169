use crate::upload::UploadedEntry;

/// Textual input of one bind call: key → values, in insertion order.
pub type ParameterSet = MultiMap<String>;

/// Uploaded input of one bind call: key → entries, in submission order.
pub type AttachmentSet = MultiMap<UploadedEntry>;

/// Multi-valued, string-keyed map that keeps first-insertion key order.
///
/// Form inputs are small; lookups scan linearly.
#[derive(Debug, Clone)]
pub struct MultiMap<V> {
    entries: Vec<(String, Vec<V>)>,
}

impl<V> Default for MultiMap<V> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<V> MultiMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one value under `key`, after any existing values.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<V>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1.push(value);
        } else {
            self.entries.push((key, vec![value]));
        }
    }

    /// Replace every value under `key`.
    pub fn set(&mut self, key: impl Into<String>, values: Vec<V>) {
        let key = key.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = values;
        } else {
            self.entries.push((key, values));
        }
    }

    /// Values under `key`. An empty value list reads as absent.
    pub fn get(&self, key: &str) -> Option<&[V]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
            .filter(|v| !v.is_empty())
    }

    pub fn first(&self, key: &str) -> Option<&V> {
        self.get(key).and_then(|v| v.first())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys that hold at least one value.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(k, _)| k)
    }

    /// Non-empty `(key, values)` groups, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[V])> {
        self.entries
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl MultiMap<String> {
    /// Build from `(key, values)` groups, e.g. an already-decoded form.
    pub fn from_multi<K, I, S>(groups: impl IntoIterator<Item = (K, I)>) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for (key, values) in groups {
            let key = key.into();
            for value in values {
                set.append(key.clone(), value);
            }
        }
        set
    }
}

impl<K: Into<String>, S: Into<String>> FromIterator<(K, S)> for MultiMap<String> {
    fn from_iter<T: IntoIterator<Item = (K, S)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (key, value) in iter {
            set.append(key, value);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_keeps_key_and_value_order() {
        let set: ParameterSet = [("b", "1"), ("a", "2"), ("b", "3")].into_iter().collect();
        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(set.get("b"), Some(&["1".to_string(), "3".to_string()][..]));
        assert_eq!(set.first("a").map(String::as_str), Some("2"));
    }

    #[test]
    fn empty_value_list_reads_as_absent() {
        let mut set = ParameterSet::new();
        set.set("k", Vec::new());
        assert!(set.get("k").is_none());
        assert!(!set.contains_key("k"));
        assert_eq!(set.iter().count(), 0);
        assert_eq!(set.keys().count(), 0);
        assert!(set.is_empty());

        set.append("j", "1");
        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["j"]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn from_multi_flattens_groups() {
        let set = ParameterSet::from_multi([("ids", vec!["1", "2"]), ("name", vec!["x"])]);
        assert_eq!(set.get("ids").map(<[String]>::len), Some(2));
        assert_eq!(set.len(), 2);
    }
}

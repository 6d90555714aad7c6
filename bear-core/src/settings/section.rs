//! Sections
//!
//! A section is the configuration scope a bear runs in: a name plus a bag of
//! string options. Loading sections from configuration files is somebody
//! else's job; the core only reads them.

use std::fmt;

use indexmap::IndexMap;

/// A named, case-insensitive option bag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    name: String,
    settings: IndexMap<String, String>,
}

impl Section {
    /// Create an empty section.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: IndexMap::new(),
        }
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set an option, replacing any previous value.
    pub fn set(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.settings.insert(normalize(key.as_ref()), value.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up an option by name, ignoring case.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings.get(&normalize(key)).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.settings.contains_key(&normalize(key))
    }

    /// Iterate over `(key, value)` pairs in insertion order. Keys are lowercase.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.settings.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_case_insensitive() {
        let section = Section::new("python").with("Max_Line_Length", "80");

        assert_eq!(section.get("max_line_length"), Some("80"));
        assert_eq!(section.get(" MAX_LINE_LENGTH "), Some("80"));
        assert!(section.contains("max_LINE_length"));
        assert_eq!(section.iter().collect::<Vec<_>>(), [("max_line_length", "80")]);
    }

    #[test]
    fn later_values_replace_earlier_ones() {
        let mut section = Section::new("all");
        section.set("use_spaces", "true");
        section.set("USE_SPACES", "false");

        assert_eq!(section.len(), 1);
        assert_eq!(section.get("use_spaces"), Some("false"));
        assert_eq!(section.to_string(), "all");
    }
}

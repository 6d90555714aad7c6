//! File Dictionary
//!
//! The corpus a bear analyzes: filename to lines, newlines retained.

use std::sync::Arc;

use indexmap::IndexMap;

/// An immutable, ordered mapping from filename to the file's lines.
///
/// Lines are stored behind an `Arc` so per-file tasks can carry them to a
/// worker without copying.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDict {
    files: IndexMap<String, Arc<[String]>>,
}

impl FileDict {
    /// An empty corpus.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, filename: &str) -> Option<&Arc<[String]>> {
        self.files.get(filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.files.contains_key(filename)
    }

    /// Iterate over `(filename, lines)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<[String]>)> {
        self.files.iter().map(|(name, lines)| (name.as_str(), lines))
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<K, L, S> FromIterator<(K, L)> for FileDict
where
    K: Into<String>,
    L: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, L)>>(iter: I) -> Self {
        let files: IndexMap<String, Arc<[String]>> = iter
            .into_iter()
            .map(|(name, lines)| {
                let lines: Arc<[String]> = lines.into_iter().map(Into::into).collect();
                (name.into(), lines)
            })
            .collect();
        Self { files }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_pairs() {
        let files: FileDict = [("a", vec!["x\n"]), ("b", vec![]), ("c", vec!["1\n", "2\n"])]
            .into_iter()
            .collect();

        assert_eq!(files.len(), 3);
        assert_eq!(files.filenames().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(files.get("c").map(|lines| lines.len()), Some(2));
        assert_eq!(files.get("a").map(|lines| lines[0].as_str()), Some("x\n"));
        assert!(files.get("missing").is_none());
    }

    #[test]
    fn empty_corpus() {
        let files = FileDict::new();
        assert!(files.is_empty());
        assert_eq!(files.iter().count(), 0);
    }
}

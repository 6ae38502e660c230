use std::path::{Path, PathBuf};

use super::names::ExerciseName;

/// A deployed bundle of exercise files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPackage {
    id: String,
    dir: PathBuf,
}

impl ContentPackage {
    pub fn new(id: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            dir: dir.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Root directory of the package on disk.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// One discovered exercise as listed in a content package catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub title: String,
    pub description: String,
    /// Zero-based discovery order. Counts every discovered file, so a
    /// replaced entry leaves a gap.
    pub order: usize,
}

/// Exercises of one content package, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<(ExerciseName, CatalogEntry)>,
    next_order: usize,
}

impl Catalog {
    /// Add an exercise. The title defaults to its identifier and the order is
    /// the number of exercises pushed before it.
    ///
    /// Two files can map to one identifier (`a/b.xml` and `a-b.xml`). The
    /// later one replaces the entry in place; returns `true` when that
    /// happened.
    pub fn push(&mut self, name: ExerciseName) -> bool {
        let entry = CatalogEntry {
            title: name.to_string(),
            description: String::new(),
            order: self.next_order,
        };
        self.next_order += 1;

        if let Some((_, existing)) = self.entries.iter_mut().find(|(known, _)| *known == name) {
            *existing = entry;
            return true;
        }
        self.entries.push((name, entry));
        false
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate.as_str() == name)
            .map(|(_, entry)| entry)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ExerciseName, &CatalogEntry)> {
        self.entries.iter().map(|(name, entry)| (name, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_discovery_order_and_default_titles() {
        let mut catalog = Catalog::default();
        catalog.push(ExerciseName::parse("b").expect("name"));
        catalog.push(ExerciseName::parse("a-c").expect("name"));

        let entry = catalog.get("a-c").expect("entry");
        assert_eq!(entry.order, 1);
        assert_eq!(entry.title, "a-c");
        assert_eq!(entry.description, "");
        assert_eq!(
            catalog.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>(),
            vec!["b", "a-c"]
        );
        assert!(!catalog.contains("a"));
    }

    #[test]
    fn a_repeated_identifier_replaces_the_earlier_entry() {
        let mut catalog = Catalog::default();
        assert!(!catalog.push(ExerciseName::parse("a-b").expect("name")));
        assert!(!catalog.push(ExerciseName::parse("c").expect("name")));
        assert!(catalog.push(ExerciseName::parse("a-b").expect("name")));

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("a-b").expect("entry").order, 2);
        assert_eq!(
            catalog.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>(),
            vec!["a-b", "c"]
        );
    }
}

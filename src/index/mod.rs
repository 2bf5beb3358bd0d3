//! In-memory search index built from fragment files.
//!
//! Mirrors what the documentation site's search box does: the typed text is
//! turned into a search id and matched as a prefix of entry keys.

pub mod codec;
mod fragment;
pub mod slug;
pub mod validate;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use codec::{ParseError, ParseErrorKind};
pub use fragment::group_fragments;
pub use validate::{Finding, FindingKind, Report, Severity};

use crate::models::{Category, Entry, FragmentName};

/// Errors loading fragments from disk.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("not a search index fragment: {0}")]
    NotAFragment(PathBuf),

    #[error("no search index fragments found in {0}")]
    NoFragments(PathBuf),

    #[error("invalid search directory pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Entries of a set of fragments, keyed by the fragment they came from.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    fragments: BTreeMap<FragmentName, Vec<Entry>>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index for one category, splitting entries into letter groups.
    pub fn from_entries(category: Category, entries: Vec<Entry>) -> Self {
        let mut index = Self::new();
        for (name, group) in group_fragments(category, entries) {
            index.insert_fragment(name, group);
        }
        index
    }

    /// Load every `<category>_<hex>.js` file in an `html/search` directory.
    pub fn load_dir(dir: &Path) -> Result<Self, IndexError> {
        let pattern = dir.join("*.js");
        let mut index = Self::new();

        for path in glob::glob(&pattern.to_string_lossy())?.filter_map(|p| p.ok()) {
            let Some(name) = fragment_name(&path) else {
                tracing::debug!("Skipping {}", path.display());
                continue;
            };
            let entries = read_fragment(&path)?;
            tracing::debug!("Loaded {} ({} entries)", name, entries.len());
            index.insert_fragment(name, entries);
        }

        if index.fragments.is_empty() {
            return Err(IndexError::NoFragments(dir.to_path_buf()));
        }
        Ok(index)
    }

    /// Load a single fragment file; its name decides category and group.
    pub fn load_file(path: &Path) -> Result<(FragmentName, Vec<Entry>), IndexError> {
        let name =
            fragment_name(path).ok_or_else(|| IndexError::NotAFragment(path.to_path_buf()))?;
        Ok((name, read_fragment(path)?))
    }

    /// Add or replace a fragment.
    pub fn insert_fragment(&mut self, name: FragmentName, entries: Vec<Entry>) {
        self.fragments.insert(name, entries);
    }

    pub fn fragments(&self) -> impl Iterator<Item = (&FragmentName, &[Entry])> {
        self.fragments.iter().map(|(n, e)| (n, e.as_slice()))
    }

    pub fn fragment(&self, name: &FragmentName) -> Option<&[Entry]> {
        self.fragments.get(name).map(Vec::as_slice)
    }

    pub fn categories(&self) -> Vec<Category> {
        self.fragments
            .keys()
            .map(|n| n.category)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// All entries of a category in key order.
    pub fn entries(&self, category: Category) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self
            .fragments
            .range(FragmentName::new(category, 0)..=FragmentName::new(category, u32::MAX))
            .flat_map(|(_, e)| e.iter())
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    pub fn get(&self, category: Category, key: &str) -> Option<&Entry> {
        self.fragments
            .range(FragmentName::new(category, 0)..=FragmentName::new(category, u32::MAX))
            .flat_map(|(_, e)| e.iter())
            .find(|e| e.key == key)
    }

    /// Entries whose key starts with the search id of `query`.
    ///
    /// Leading and trailing whitespace is ignored; an empty query matches
    /// nothing.
    pub fn search(&self, query: &str, category: Category, limit: Option<usize>) -> Vec<&Entry> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let prefix = slug::search_id(query);
        self.entries(category)
            .into_iter()
            .filter(|e| e.key.starts_with(&prefix))
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }

    /// Number of entries across all fragments.
    pub fn len(&self) -> usize {
        self.fragments.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }
}

fn fragment_name(path: &Path) -> Option<FragmentName> {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(FragmentName::parse)
}

fn read_fragment(path: &Path) -> Result<Vec<Entry>, IndexError> {
    let source = std::fs::read_to_string(path).map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    codec::parse(&source).map_err(|source| IndexError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

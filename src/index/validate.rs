//! Consistency checks over a loaded search index.

use std::collections::HashMap;
use std::fmt::Write as _;

use serde::Serialize;

use super::{slug, SearchIndex};
use crate::models::{Category, Entry, FragmentName};

const PAGE_EXTENSIONS: &[&str] = &[".html", ".xhtml", ".htm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Entry key is not the search id of a label it holds.
    KeyMismatch,
    DuplicateKey,
    /// Keys inside a fragment are not ascending.
    Unsorted,
    /// A fragment mixes keys with different first characters.
    MixedGroup,
    EmptyEntry,
    EmptySymbol,
    MalformedUrl,
    MissingPage,
    MissingAnchor,
}

impl FindingKind {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Unsorted => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeyMismatch => "key_mismatch",
            Self::DuplicateKey => "duplicate_key",
            Self::Unsorted => "unsorted",
            Self::MixedGroup => "mixed_group",
            Self::EmptyEntry => "empty_entry",
            Self::EmptySymbol => "empty_symbol",
            Self::MalformedUrl => "malformed_url",
            Self::MissingPage => "missing_page",
            Self::MissingAnchor => "missing_anchor",
        }
    }
}

/// A single problem found in a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub kind: FindingKind,
    pub fragment: FragmentName,
    pub key: Option<String>,
    pub message: String,
}

impl Finding {
    pub fn new(
        kind: FindingKind,
        fragment: FragmentName,
        key: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: kind.severity(),
            kind,
            fragment,
            key: key.map(str::to_string),
            message: message.into(),
        }
    }
}

/// Result of checking an index.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub fragments_checked: usize,
    pub entries_checked: usize,
    pub links_checked: usize,
    pub findings: Vec<Finding>,
}

impl Report {
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    /// Add findings, keeping them ordered by fragment then key.
    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        self.findings.extend(findings);
        self.sort();
    }

    fn sort(&mut self) {
        self.findings
            .sort_by(|a, b| (a.fragment, &a.key).cmp(&(b.fragment, &b.key)));
    }

    pub fn format_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Search index check");
        let _ = writeln!(out);
        let _ = writeln!(out, "Fragments checked: {}", self.fragments_checked);
        let _ = writeln!(out, "Entries checked: {}", self.entries_checked);
        let _ = writeln!(out, "Links checked: {}", self.links_checked);
        let _ = writeln!(out);

        if self.findings.is_empty() {
            let _ = writeln!(out, "No problems found.");
            return out;
        }

        for f in &self.findings {
            let _ = write!(out, "{}: {}", f.severity.as_str(), f.fragment);
            if let Some(key) = &f.key {
                let _ = write!(out, " [{}]", key);
            }
            let _ = writeln!(out, ": {} ({})", f.message, f.kind.as_str());
        }
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{} error(s), {} warning(s)",
            self.count(Severity::Error),
            self.count(Severity::Warning)
        );
        out
    }
}

/// Run the structural checks: key/label consistency, ordering, grouping,
/// duplicates and URL shape. Anchors are checked separately against the
/// HTML pages, see [`crate::pages::check_anchors`].
pub fn check(index: &SearchIndex) -> Report {
    let mut report = Report::default();
    let mut seen: HashMap<(Category, &str), FragmentName> = HashMap::new();

    for (name, entries) in index.fragments() {
        report.fragments_checked += 1;
        report.entries_checked += entries.len();
        report.links_checked += entries.iter().map(Entry::link_count).sum::<usize>();

        check_grouping(*name, entries, &mut report.findings);

        for entry in entries {
            if let Some(first) = seen.insert((name.category, entry.key.as_str()), *name) {
                report.findings.push(Finding::new(
                    FindingKind::DuplicateKey,
                    *name,
                    Some(&entry.key),
                    format!("key also present in {}", first),
                ));
            }
            check_entry(*name, entry, &mut report.findings);
        }
    }

    report.sort();
    report
}

fn check_grouping(name: FragmentName, entries: &[Entry], findings: &mut Vec<Finding>) {
    let group_char = entries.first().and_then(Entry::group_char);
    for pair in entries.windows(2) {
        if pair[1].key < pair[0].key {
            findings.push(Finding::new(
                FindingKind::Unsorted,
                name,
                Some(&pair[1].key),
                format!("comes after `{}`", pair[0].key),
            ));
        }
    }
    for entry in entries.iter().skip(1) {
        if entry.group_char() != group_char {
            findings.push(Finding::new(
                FindingKind::MixedGroup,
                name,
                Some(&entry.key),
                format!(
                    "fragment holds keys starting with `{}`",
                    group_char.unwrap_or(' ')
                ),
            ));
        }
    }
}

fn check_entry(name: FragmentName, entry: &Entry, findings: &mut Vec<Finding>) {
    let key = Some(entry.key.as_str());
    if entry.symbols.is_empty() {
        findings.push(Finding::new(FindingKind::EmptyEntry, name, key, "entry has no symbols"));
    }

    for symbol in &entry.symbols {
        let expected = slug::search_id(&symbol.label);
        if expected != entry.key {
            findings.push(Finding::new(
                FindingKind::KeyMismatch,
                name,
                key,
                format!("label `{}` has search id `{}`", symbol.label, expected),
            ));
        }
        if symbol.links.is_empty() {
            findings.push(Finding::new(
                FindingKind::EmptySymbol,
                name,
                key,
                format!("`{}` has no links", symbol.label),
            ));
        }
        for link in &symbol.links {
            let page = link.page();
            if !PAGE_EXTENSIONS.iter().any(|ext| page.ends_with(ext)) {
                findings.push(Finding::new(
                    FindingKind::MalformedUrl,
                    name,
                    key,
                    format!("`{}` does not point at an HTML page", link.anchor_url),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Link, Symbol};

    fn fragment(entries: Vec<Entry>) -> SearchIndex {
        let mut index = SearchIndex::new();
        index.insert_fragment(FragmentName::new(Category::All, 0), entries);
        index
    }

    fn entry(key: &str, label: &str, url: &str) -> Entry {
        Entry::new(key, vec![Symbol::new(label, vec![Link::new(url, "Scene")])])
    }

    fn kinds(report: &Report) -> Vec<FindingKind> {
        report.findings.iter().map(|f| f.kind).collect()
    }

    #[test]
    fn test_clean_fragment() {
        let report = check(&fragment(vec![
            entry("makeinstance", "makeInstance", "../class_scene.html#afe26"),
            entry("mesh", "Mesh", "../struct_mesh.html"),
        ]));
        assert!(report.findings.is_empty());
        assert_eq!(report.entries_checked, 2);
        assert_eq!(report.links_checked, 2);
        assert!(!report.has_errors());
    }

    #[test]
    fn test_key_mismatch() {
        let report = check(&fragment(vec![entry("main", "main.cpp", "../main_8cpp.html")]));
        assert_eq!(kinds(&report), vec![FindingKind::KeyMismatch]);
        assert!(report.findings[0].message.contains("main_2ecpp"));
        assert!(report.has_errors());
    }

    #[test]
    fn test_ordering_and_grouping() {
        let report = check(&fragment(vec![
            entry("mesh", "Mesh", "../a.html"),
            entry("material", "Material", "../a.html"),
            entry("sun", "sun", "../a.html"),
        ]));
        let kinds = kinds(&report);
        assert!(kinds.contains(&FindingKind::Unsorted));
        assert!(kinds.contains(&FindingKind::MixedGroup));
        assert_eq!(report.count(Severity::Warning), 1);
    }

    #[test]
    fn test_duplicates_across_fragments() {
        let mut index = fragment(vec![entry("mesh", "Mesh", "../a.html")]);
        index.insert_fragment(
            FragmentName::new(Category::All, 1),
            vec![entry("mesh", "Mesh", "../b.html")],
        );
        index.insert_fragment(
            FragmentName::new(Category::Classes, 0),
            vec![entry("mesh", "Mesh", "../a.html")],
        );
        let report = check(&index);
        assert_eq!(kinds(&report), vec![FindingKind::DuplicateKey]);
    }

    #[test]
    fn test_empty_and_malformed() {
        let report = check(&fragment(vec![
            Entry::new("a", vec![]),
            Entry::new("b", vec![Symbol::new("b", vec![])]),
            entry("c", "c", "../c.png#x"),
        ]));
        let kinds = kinds(&report);
        assert!(kinds.contains(&FindingKind::EmptyEntry));
        assert!(kinds.contains(&FindingKind::EmptySymbol));
        assert!(kinds.contains(&FindingKind::MalformedUrl));
    }

    #[test]
    fn test_format_text() {
        let report = check(&fragment(vec![entry("main", "main.cpp", "../main_8cpp.html")]));
        let text = report.format_text();
        assert!(text.contains("error: all_0.js [main]"));
        assert!(text.contains("1 error(s), 0 warning(s)"));
    }
}

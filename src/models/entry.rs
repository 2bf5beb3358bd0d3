use serde::{Deserialize, Serialize};

use crate::index::slug;

/// A single documentation target of a symbol.
///
/// Encoded in a fragment as `['../class_scene.html#afe26...',1,'Scene']`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Page path relative to the `search/` directory, with an optional
    /// `#anchor` fragment.
    pub anchor_url: String,
    /// Doxygen writes `1` for pages inside the generated site and `0` for
    /// links resolved through tag files. Kept as written.
    pub local: u8,
    /// Enclosing class or file, or a full signature for overloads.
    pub scope: String,
}

impl Link {
    pub fn new(anchor_url: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            anchor_url: anchor_url.into(),
            local: 1,
            scope: scope.into(),
        }
    }

    /// The page part of the URL, without the anchor.
    pub fn page(&self) -> &str {
        self.anchor_url
            .split_once('#')
            .map_or(self.anchor_url.as_str(), |(page, _)| page)
    }

    /// The anchor part of the URL, if any.
    pub fn anchor(&self) -> Option<&str> {
        self.anchor_url
            .split_once('#')
            .map(|(_, anchor)| anchor)
            .filter(|a| !a.is_empty())
    }

    /// Scope with HTML entities decoded.
    pub fn display_scope(&self) -> String {
        slug::decode_entities(&self.scope).into_owned()
    }
}

/// A label as shown in the search results, with every place it is documented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub label: String,
    pub links: Vec<Link>,
}

impl Symbol {
    pub fn new(label: impl Into<String>, links: Vec<Link>) -> Self {
        Self {
            label: label.into(),
            links,
        }
    }

    /// Label with HTML entities decoded.
    pub fn display_label(&self) -> String {
        slug::decode_entities(&self.label).into_owned()
    }
}

/// One row of a `searchData` table.
///
/// `key` is the search id of every symbol label in the row; the search
/// widget matches typed text against it as a prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub symbols: Vec<Symbol>,
}

impl Entry {
    pub fn new(key: impl Into<String>, symbols: Vec<Symbol>) -> Self {
        Self {
            key: key.into(),
            symbols,
        }
    }

    /// Build an entry for a single symbol, deriving the key from its label.
    pub fn for_symbol(symbol: Symbol) -> Self {
        Self {
            key: slug::search_id(&symbol.label),
            symbols: vec![symbol],
        }
    }

    /// First character of the key; decides the fragment the entry lives in.
    pub fn group_char(&self) -> Option<char> {
        self.key.chars().next()
    }

    pub fn link_count(&self) -> usize {
        self.symbols.iter().map(|s| s.links.len()).sum()
    }
}

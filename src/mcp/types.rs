//! Request and response types for MCP tools.

use rmcp::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::{DocSet, Entry};

// ============================================================
// Request Types
// ============================================================

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListDocSetsRequest {
    #[schemars(description = "Only return docsets whose name contains this text")]
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchSymbolsRequest {
    #[schemars(description = "Docset name or UUID")]
    pub docset: String,
    #[schemars(
        description = "Text typed into the search box. Matched as a prefix of symbol names, case-insensitive"
    )]
    pub query: String,
    #[schemars(
        description = "Index section: 'all' (default), 'classes', 'functions', 'files', 'variables', ..."
    )]
    #[serde(default)]
    pub category: Option<String>,
    #[schemars(description = "Maximum number of results (default 20)")]
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetSymbolRequest {
    #[schemars(description = "Docset name or UUID")]
    pub docset: String,
    #[schemars(description = "Search key of the entry, as returned by search_symbols")]
    pub key: String,
    #[schemars(description = "Index section, defaults to 'all'")]
    #[serde(default)]
    pub category: Option<String>,
}

// ============================================================
// Response Types
// ============================================================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DocSetInfo {
    pub id: String,
    pub name: String,
    pub source_path: Option<String>,
    pub updated_at: String,
}

impl From<DocSet> for DocSetInfo {
    fn from(d: DocSet) -> Self {
        Self {
            id: d.id.to_string(),
            name: d.name,
            source_path: d.source_path,
            updated_at: d.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DocSetListResponse {
    pub docsets: Vec<DocSetInfo>,
}

/// One search hit, summarised. Use get_symbol for every link.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SymbolHit {
    pub key: String,
    /// Display labels of the symbols under this key
    pub labels: Vec<String>,
    /// Distinct scopes the symbol is documented in
    pub scopes: Vec<String>,
    pub link_count: usize,
}

impl From<&Entry> for SymbolHit {
    fn from(entry: &Entry) -> Self {
        let mut scopes: Vec<String> = Vec::new();
        for link in entry.symbols.iter().flat_map(|s| s.links.iter()) {
            let scope = link.display_scope();
            if !scope.is_empty() && !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }
        Self {
            key: entry.key.clone(),
            labels: entry.symbols.iter().map(|s| s.display_label()).collect(),
            scopes,
            link_count: entry.link_count(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchSymbolsResponse {
    pub docset: String,
    pub query: String,
    pub category: String,
    pub results: Vec<SymbolHit>,
}

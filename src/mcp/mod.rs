//! MCP server exposing imported docsets to AI agents.

pub mod tree_render;
mod types;

pub use types::*;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use uuid::Uuid;

use crate::db::Database;
use crate::models::*;

const DEFAULT_LIMIT: usize = 20;

#[derive(Clone)]
pub struct McpServer {
    db: Database,
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            tool_router: Self::tool_router(),
        }
    }

    fn db_err(e: anyhow::Error) -> McpError {
        McpError::internal_error(format!("{:#}", e), None)
    }

    fn parse_category(category: Option<&str>) -> Result<Category, McpError> {
        match category {
            None => Ok(Category::All),
            Some(c) => Category::from_str(c)
                .ok_or_else(|| McpError::invalid_params(format!("Unknown category: {}", c), None)),
        }
    }

    /// Find a docset by UUID or by name.
    fn resolve_docset(&self, docset: &str) -> Result<DocSet, McpError> {
        let found = match Uuid::parse_str(docset) {
            Ok(id) => self.db.get_docset(id).map_err(Self::db_err)?,
            Err(_) => self.db.get_docset_by_name(docset).map_err(Self::db_err)?,
        };
        found.ok_or_else(|| McpError::invalid_params(format!("Docset not found: {}", docset), None))
    }

    // ============================================================
    // Tool logic, shared by the tools and the tests
    // ============================================================

    pub fn list_docsets_info(&self, filter: Option<&str>) -> Result<DocSetListResponse, McpError> {
        let docsets = self.db.list_docsets().map_err(Self::db_err)?;
        let filter = filter.map(str::to_lowercase);
        Ok(DocSetListResponse {
            docsets: docsets
                .into_iter()
                .filter(|d| {
                    filter
                        .as_deref()
                        .map_or(true, |f| d.name.to_lowercase().contains(f))
                })
                .map(DocSetInfo::from)
                .collect(),
        })
    }

    pub fn search_symbols_info(
        &self,
        req: &SearchSymbolsRequest,
    ) -> Result<SearchSymbolsResponse, McpError> {
        let docset = self.resolve_docset(&req.docset)?;
        let category = Self::parse_category(req.category.as_deref())?;
        let entries = self
            .db
            .search(
                docset.id,
                &req.query,
                category,
                Some(req.limit.unwrap_or(DEFAULT_LIMIT)),
            )
            .map_err(Self::db_err)?;

        Ok(SearchSymbolsResponse {
            docset: docset.name,
            query: req.query.clone(),
            category: category.as_str().to_string(),
            results: entries.iter().map(SymbolHit::from).collect(),
        })
    }

    pub fn symbol_tree(&self, req: &GetSymbolRequest) -> Result<String, McpError> {
        let docset = self.resolve_docset(&req.docset)?;
        let category = Self::parse_category(req.category.as_deref())?;
        let entry = self
            .db
            .get_entry(docset.id, category, &req.key)
            .map_err(Self::db_err)?
            .ok_or_else(|| {
                McpError::invalid_params(format!("No entry '{}' in {}", req.key, docset.name), None)
            })?;
        Ok(tree_render::render_entry(&entry))
    }
}

#[tool_router]
impl McpServer {
    #[tool(
        description = "List the documentation sets that have been imported. Returns id, name, source directory and last import time."
    )]
    async fn list_docsets(
        &self,
        params: Parameters<ListDocSetsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let result = self.list_docsets_info(params.0.filter.as_deref())?;

        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(
        description = "Search a documentation set the way its search box does: the query is matched as a case-insensitive prefix of class, function, variable and file names. Returns keys with their labels and scopes; use get_symbol for the documentation links."
    )]
    async fn search_symbols(
        &self,
        params: Parameters<SearchSymbolsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let result = self.search_symbols_info(&params.0)?;

        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(
        description = "Show every documentation link of a search key as a tree: one root per symbol label, one branch per page anchor with the scope it is documented in."
    )]
    async fn get_symbol(
        &self,
        params: Parameters<GetSymbolRequest>,
    ) -> Result<CallToolResult, McpError> {
        let tree = self.symbol_tree(&params.0)?;
        Ok(CallToolResult::success(vec![Content::text(tree)]))
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: "doxysearch".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            instructions: Some(
                r#"doxysearch answers "where is X documented?" for imported documentation sets.

1. list_docsets to see which documentation is available.
2. search_symbols with a name prefix ("mat" finds Material, materialId, ...).
3. get_symbol with a key from the results for the exact pages and anchors."#
                    .into(),
            ),
            ..Default::default()
        }
    }
}

pub async fn run_stdio_server(db: Database) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = McpServer::new(db);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use doxysearch::config::Config;
use doxysearch::index::{codec, validate, SearchIndex};
use doxysearch::mcp::tree_render;
use doxysearch::models::Category;
use doxysearch::pages::{self, DirPages, HttpPages};
use doxysearch::{api, db, mcp};

#[derive(Parser)]
#[command(name = "doxysearch")]
#[command(about = "Read, check, store and search Doxygen search-index fragments")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the fragments of an html/search directory
    Check {
        /// Directory holding the <category>_<hex>.js fragments
        dir: PathBuf,
        /// HTML root to resolve anchors against (default: parent of DIR)
        #[arg(long)]
        html: Option<PathBuf>,
        /// Resolve anchors against a published site instead of local files
        #[arg(long, conflicts_with = "html")]
        base_url: Option<String>,
        /// Skip resolving anchors
        #[arg(long)]
        no_anchors: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search fragments the way the documentation search box does
    Search {
        dir: PathBuf,
        query: String,
        #[arg(short, long, default_value = "all", value_parser = parse_category)]
        category: Category,
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Show every link of one search key
    Show {
        dir: PathBuf,
        key: String,
        #[arg(short, long, default_value = "all", value_parser = parse_category)]
        category: Category,
    },
    /// Rewrite a fragment in the generated layout
    Format {
        file: PathBuf,
        /// Overwrite the file instead of printing to stdout
        #[arg(short, long)]
        write: bool,
    },
    /// Import an html/search directory into the store
    Import { name: String, dir: PathBuf },
    /// List imported docsets
    Docsets,
    /// Remove an imported docset
    Remove { name: String },
    /// Start the HTTP API
    Serve {
        /// Port for HTTP API
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Start MCP server via stdio
    Mcp,
}

fn parse_category(s: &str) -> Result<Category, String> {
    Category::from_str(s).ok_or_else(|| format!("unknown category '{}'", s))
}

/// Initialize tracing with output to stderr; stdout carries command output
/// and, in MCP mode, the protocol.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "doxysearch=info,tower_http=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_db(config: &Config) -> anyhow::Result<db::Database> {
    let path = config.database_path()?;
    tracing::debug!("Opening database at {}", path.display());
    let db = db::Database::open(path)?;
    db.migrate()?;
    Ok(db)
}

fn load_index(dir: &Path) -> anyhow::Result<SearchIndex> {
    SearchIndex::load_dir(dir)
        .with_context(|| format!("Failed to load search index from {}", dir.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let config = Config::load();

    match cli.command {
        Commands::Check {
            dir,
            html,
            base_url,
            no_anchors,
            json,
        } => {
            let index = load_index(&dir)?;
            let mut report = validate::check(&index);

            if config.check_anchors && !no_anchors {
                let findings = match base_url {
                    Some(url) => pages::check_anchors(&index, &HttpPages::new(url)).await,
                    None => {
                        let root = html
                            .or_else(|| dir.parent().map(Path::to_path_buf))
                            .unwrap_or_else(|| PathBuf::from("."));
                        pages::check_anchors(&index, &DirPages::new(root)).await
                    }
                };
                report.extend(findings);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.format_text());
            }
            if report.has_errors() {
                std::process::exit(1);
            }
        }
        Commands::Search {
            dir,
            query,
            category,
            limit,
            json,
        } => {
            let index = load_index(&dir)?;
            let results = index.search(&query, category, Some(limit.unwrap_or(config.search_limit)));
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.is_empty() {
                println!("No matches");
            } else {
                for entry in results {
                    let labels: Vec<_> = entry.symbols.iter().map(|s| s.display_label()).collect();
                    println!("{:<32} {} ({} links)", entry.key, labels.join(", "), entry.link_count());
                }
            }
        }
        Commands::Show { dir, key, category } => {
            let index = load_index(&dir)?;
            let entry = index
                .get(category, &key)
                .ok_or_else(|| anyhow::anyhow!("No entry '{}' in {}", key, category))?;
            print!("{}", tree_render::render_entry(entry));
        }
        Commands::Format { file, write } => {
            let (name, entries) = SearchIndex::load_file(&file)?;
            let text = codec::write(&entries);
            if write {
                std::fs::write(&file, &text)
                    .with_context(|| format!("Failed to write {}", file.display()))?;
                tracing::info!("Rewrote {} ({} entries)", name, entries.len());
            } else {
                print!("{}", text);
            }
        }
        Commands::Import { name, dir } => {
            let db = open_db(&config)?;
            let docset = db.import_dir(&name, &dir)?;
            let stats = db.stats(docset.id)?;
            println!("Imported '{}' ({})", docset.name, docset.id);
            for c in stats.categories {
                println!("  {:<12} {:>6} entries {:>6} symbols", c.category, c.entries, c.symbols);
            }
        }
        Commands::Docsets => {
            let db = open_db(&config)?;
            let docsets = db.list_docsets()?;
            if docsets.is_empty() {
                println!("No docsets imported");
            }
            for d in docsets {
                println!(
                    "{}  {:<24} {}  {}",
                    d.id,
                    d.name,
                    d.updated_at.format("%Y-%m-%d %H:%M"),
                    d.source_path.unwrap_or_default()
                );
            }
        }
        Commands::Remove { name } => {
            let db = open_db(&config)?;
            let docset = db
                .get_docset_by_name(&name)?
                .ok_or_else(|| anyhow::anyhow!("Docset '{}' not found", name))?;
            db.delete_docset(docset.id)?;
            println!("Removed '{}'", docset.name);
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.port);
            let db = open_db(&config)?;
            let app = api::create_router(db);

            let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
            tracing::info!("doxysearch API listening on http://127.0.0.1:{}", port);

            axum::serve(listener, app).await?;
        }
        Commands::Mcp => {
            let db = open_db(&config)?;
            mcp::run_stdio_server(db).await?;
        }
    }

    Ok(())
}

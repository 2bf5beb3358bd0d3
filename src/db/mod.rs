mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::index::{slug, SearchIndex};
use crate::models::*;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // DocSet operations
    // ============================================================

    pub fn list_docsets(&self) -> Result<Vec<DocSet>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, source_path, created_at, updated_at
             FROM docsets ORDER BY name",
        )?;

        let docsets = stmt
            .query_map([], docset_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(docsets)
    }

    pub fn get_docset(&self, id: Uuid) -> Result<Option<DocSet>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let docset = conn
            .query_row(
                "SELECT id, name, source_path, created_at, updated_at
                 FROM docsets WHERE id = ?",
                [id.to_string()],
                docset_from_row,
            )
            .optional()?;
        Ok(docset)
    }

    pub fn get_docset_by_name(&self, name: &str) -> Result<Option<DocSet>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let docset = conn
            .query_row(
                "SELECT id, name, source_path, created_at, updated_at
                 FROM docsets WHERE name = ?",
                [name],
                docset_from_row,
            )
            .optional()?;
        Ok(docset)
    }

    pub fn create_docset(&self, input: CreateDocSetInput) -> Result<DocSet> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            anyhow::bail!("Docset name must not be empty");
        }
        if self.get_docset_by_name(&name)?.is_some() {
            anyhow::bail!("Docset '{}' already exists", name);
        }

        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO docsets (id, name, source_path, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &name,
                &input.source_path,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(DocSet {
            id,
            name,
            source_path: input.source_path,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn delete_docset(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM docsets WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    /// Import an `html/search` directory under `name`, creating the docset
    /// or replacing the entries of an existing one.
    pub fn import_dir(&self, name: &str, dir: &Path) -> Result<DocSet> {
        let index = SearchIndex::load_dir(dir)
            .with_context(|| format!("Failed to load search index from {}", dir.display()))?;
        let source_path = Some(dir.display().to_string());

        let docset = match self.get_docset_by_name(name.trim())? {
            Some(existing) => existing,
            None => self.create_docset(CreateDocSetInput {
                name: name.to_string(),
                source_path: source_path.clone(),
            })?,
        };

        let count = self.replace_entries(docset.id, &index, source_path.as_deref())?;
        tracing::info!(
            "Imported {} entries from {} fragments into '{}'",
            count,
            index.fragment_count(),
            docset.name
        );

        self.get_docset(docset.id)?
            .ok_or_else(|| anyhow::anyhow!("Docset not found after import"))
    }

    /// Replace every entry of a docset with the contents of `index`.
    /// Returns the number of entries stored.
    pub fn replace_entries(
        &self,
        docset_id: Uuid,
        index: &SearchIndex,
        source_path: Option<&str>,
    ) -> Result<usize> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        let now = Utc::now();

        let updated = tx.execute(
            "UPDATE docsets SET updated_at = ?, source_path = COALESCE(?, source_path) WHERE id = ?",
            (now.to_rfc3339(), source_path, docset_id.to_string()),
        )?;
        if updated == 0 {
            anyhow::bail!("Docset not found");
        }

        tx.execute("DELETE FROM entries WHERE docset_id = ?", [docset_id.to_string()])?;

        let mut count = 0;
        {
            let mut insert_entry = tx.prepare(
                "INSERT INTO entries (docset_id, category, fragment_group, position, search_key)
                 VALUES (?, ?, ?, ?, ?)",
            )?;
            let mut insert_symbol = tx.prepare(
                "INSERT INTO symbols (entry_id, position, label, links) VALUES (?, ?, ?, ?)",
            )?;

            for (name, entries) in index.fragments() {
                for (position, entry) in entries.iter().enumerate() {
                    insert_entry.execute((
                        docset_id.to_string(),
                        name.category.as_str(),
                        name.group,
                        position as i64,
                        &entry.key,
                    ))?;
                    let entry_id = tx.last_insert_rowid();

                    for (symbol_position, symbol) in entry.symbols.iter().enumerate() {
                        let links = serde_json::to_string(&symbol.links)?;
                        insert_symbol.execute((
                            entry_id,
                            symbol_position as i64,
                            &symbol.label,
                            links,
                        ))?;
                    }
                    count += 1;
                }
            }
        }

        tx.commit()?;
        Ok(count)
    }

    // ============================================================
    // Entry queries
    // ============================================================

    /// Entries of a category whose key starts with the search id of `query`,
    /// in key order.
    pub fn search(
        &self,
        docset_id: Uuid,
        query: &str,
        category: Category,
        limit: Option<usize>,
    ) -> Result<Vec<Entry>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let prefix = slug::search_id(query);
        let limit = limit.map_or(-1, |l| l as i64);

        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, search_key FROM entries
             WHERE docset_id = ?1 AND category = ?2 AND substr(search_key, 1, length(?3)) = ?3
             ORDER BY search_key, fragment_group, position
             LIMIT ?4",
        )?;
        let rows = stmt
            .query_map(
                (docset_id.to_string(), category.as_str(), &prefix, limit),
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, key)| load_entry(&conn, id, key))
            .collect()
    }

    pub fn get_entry(&self, docset_id: Uuid, category: Category, key: &str) -> Result<Option<Entry>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let row = conn
            .query_row(
                "SELECT id, search_key FROM entries
                 WHERE docset_id = ? AND category = ? AND search_key = ?
                 ORDER BY fragment_group, position LIMIT 1",
                (docset_id.to_string(), category.as_str(), key),
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        row.map(|(id, key)| load_entry(&conn, id, key)).transpose()
    }

    /// Every entry of a category, in key order.
    pub fn entries(&self, docset_id: Uuid, category: Category) -> Result<Vec<Entry>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, search_key FROM entries
             WHERE docset_id = ? AND category = ?
             ORDER BY search_key, fragment_group, position",
        )?;
        let rows = stmt
            .query_map((docset_id.to_string(), category.as_str()), |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, key)| load_entry(&conn, id, key))
            .collect()
    }

    /// Entries of one stored fragment in file order, or `None` if
    /// the docset has no such fragment.
    pub fn fragment(&self, docset_id: Uuid, name: FragmentName) -> Result<Option<Vec<Entry>>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, search_key FROM entries
             WHERE docset_id = ? AND category = ? AND fragment_group = ?
             ORDER BY position",
        )?;
        let rows = stmt
            .query_map(
                (docset_id.to_string(), name.category.as_str(), name.group),
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        if rows.is_empty() {
            return Ok(None);
        }
        let entries = rows
            .into_iter()
            .map(|(id, key)| load_entry(&conn, id, key))
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(entries))
    }

    /// Rebuild the in-memory index of a docset.
    pub fn load_index(&self, docset_id: Uuid) -> Result<SearchIndex> {
        let groups = {
            let conn = self.conn.lock().expect("database lock poisoned");
            let mut stmt = conn.prepare(
                "SELECT DISTINCT category, fragment_group FROM entries
                 WHERE docset_id = ? ORDER BY category, fragment_group",
            )?;
            let groups = stmt
                .query_map([docset_id.to_string()], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            groups
        };

        let mut index = SearchIndex::new();
        for (category, group) in groups {
            let Some(category) = Category::from_str(&category) else {
                tracing::warn!("Skipping unknown category '{}'", category);
                continue;
            };
            let name = FragmentName::new(category, group);
            if let Some(entries) = self.fragment(docset_id, name)? {
                index.insert_fragment(name, entries);
            }
        }
        Ok(index)
    }

    pub fn stats(&self, docset_id: Uuid) -> Result<DocSetStats> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT e.category, COUNT(DISTINCT e.id), COUNT(s.entry_id)
             FROM entries e LEFT JOIN symbols s ON s.entry_id = e.id
             WHERE e.docset_id = ?
             GROUP BY e.category ORDER BY e.category",
        )?;
        let rows = stmt
            .query_map([docset_id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut categories: Vec<CategoryCount> = rows
            .into_iter()
            .filter_map(|(category, entries, symbols)| {
                Some(CategoryCount {
                    category: Category::from_str(&category)?,
                    entries: entries as usize,
                    symbols: symbols as usize,
                })
            })
            .collect();
        categories.sort_by_key(|c| c.category);

        Ok(DocSetStats {
            docset_id,
            categories,
        })
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

/// Default database location in the platform data directory.
pub fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "doxysearch")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("doxysearch.db"))
}

fn load_entry(conn: &Connection, entry_id: i64, key: String) -> Result<Entry> {
    let mut stmt = conn.prepare_cached(
        "SELECT label, links FROM symbols WHERE entry_id = ? ORDER BY position",
    )?;
    let symbols = stmt
        .query_map([entry_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|(label, links)| {
            let links: Vec<Link> = serde_json::from_str(&links)
                .with_context(|| format!("Corrupt links for symbol '{}'", label))?;
            Ok(Symbol { label, links })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Entry { key, symbols })
}

fn docset_from_row(row: &Row<'_>) -> rusqlite::Result<DocSet> {
    Ok(DocSet {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        source_path: row.get(2)?,
        created_at: parse_datetime(row.get::<_, String>(3)?),
        updated_at: parse_datetime(row.get::<_, String>(4)?),
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Category;

/// A search directory imported into the store under a name.
///
/// Re-importing the same name replaces every entry: fragments are always
/// regenerated wholesale, so there is nothing to merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocSet {
    pub id: Uuid,
    pub name: String,
    /// Search directory the entries were last imported from.
    pub source_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new docset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocSetInput {
    pub name: String,
    pub source_path: Option<String>,
}

/// Input for importing a search directory over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportDocSetInput {
    pub name: String,
    /// Path of an `html/search` directory on the server.
    pub path: String,
}

/// Entry counts of a docset, per category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocSetStats {
    pub docset_id: Uuid,
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: Category,
    pub entries: usize,
    pub symbols: usize,
}

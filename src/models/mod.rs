//! Domain models for doxysearch.
//!
//! # Core Concepts
//!
//! - [`Entry`]: One row of a `searchData` table. An index key plus the
//!   symbols whose search id is that key.
//! - [`Symbol`]: A displayed label with the documentation links it resolves to.
//! - [`Link`]: An anchor URL into the generated HTML plus the scope shown
//!   next to it in search results.
//! - [`Category`] and [`FragmentName`]: Which index section and letter group
//!   a fragment file holds (`all_c.js`, `functions_c.js`, ...).
//! - [`DocSet`]: A named, persisted copy of a whole search directory.

mod category;
mod docset;
mod entry;

pub use category::*;
pub use docset::*;
pub use entry::*;

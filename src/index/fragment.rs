//! Splitting a category's entries into per-letter fragment files.

use crate::models::{Category, Entry, FragmentName};

/// Sort `entries` by key and split them by first key character.
///
/// Groups are numbered from 0 in order of first character, which is how the
/// fragment files of one category are named (`all_0.js`, `all_1.js`, ...).
/// Entries with an empty key are dropped; they can never match a search.
pub fn group_fragments(category: Category, mut entries: Vec<Entry>) -> Vec<(FragmentName, Vec<Entry>)> {
    entries.retain(|e| !e.key.is_empty());
    entries.sort_by(|a, b| a.key.cmp(&b.key));

    let mut groups: Vec<(FragmentName, Vec<Entry>)> = Vec::new();
    let mut current: Option<char> = None;
    for entry in entries {
        let first = entry.group_char();
        if first != current || groups.is_empty() {
            let index = groups.len() as u32;
            groups.push((FragmentName::new(category, index), Vec::new()));
            current = first;
        }
        if let Some((_, group)) = groups.last_mut() {
            group.push(entry);
        }
    }
    groups
}

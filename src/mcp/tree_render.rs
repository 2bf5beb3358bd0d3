//! ASCII tree rendering for search entries.

use crate::models::{Entry, Link};

const LOCAL: char = '●';
const EXTERNAL: char = '○';

/// A labelled node; roots are printed bare, children with a marker.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub label: String,
    pub marker: Option<char>,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(label: impl Into<String>, marker: Option<char>) -> Self {
        Self {
            label: label.into(),
            marker,
            children: Vec::new(),
        }
    }
}

/// Get the marker for a link: filled for pages of this site, hollow for
/// pages reached through a tag file.
fn link_marker(link: &Link) -> char {
    if link.local == 0 {
        EXTERNAL
    } else {
        LOCAL
    }
}

fn link_label(link: &Link) -> String {
    let scope = link.display_scope();
    if scope.is_empty() {
        link.anchor_url.clone()
    } else {
        format!("{} ({})", scope, link.anchor_url)
    }
}

/// One root per symbol of the entry, one child per link.
pub fn entry_tree(entry: &Entry) -> Vec<TreeNode> {
    entry
        .symbols
        .iter()
        .map(|symbol| TreeNode {
            label: symbol.display_label(),
            marker: None,
            children: symbol
                .links
                .iter()
                .map(|link| TreeNode::leaf(link_label(link), Some(link_marker(link))))
                .collect(),
        })
        .collect()
}

/// Render an entry's symbols and links.
///
/// Example output:
/// ```text
/// Material
/// ├── ● Material (../struct_material.html)
/// ├── ● Material::Material(glm::vec3 color) (../struct_material.html#a2f688c...)
/// └── ● Scene::material(uint i) (../class_scene.html#aa2532f...)
/// ```
pub fn render_entry(entry: &Entry) -> String {
    render_tree(&entry_tree(entry))
}

pub fn render_tree(nodes: &[TreeNode]) -> String {
    let mut output = String::new();
    for (i, node) in nodes.iter().enumerate() {
        let is_last = i == nodes.len() - 1;
        render_node(&mut output, node, "", is_last, true);
    }
    output
}

/// Recursively render a node and its children.
fn render_node(output: &mut String, node: &TreeNode, prefix: &str, is_last: bool, is_root: bool) {
    if is_root {
        output.push_str(&node.label);
        output.push('\n');
    } else {
        let branch = if is_last { "└── " } else { "├── " };
        output.push_str(prefix);
        output.push_str(branch);
        if let Some(marker) = node.marker {
            output.push(marker);
            output.push(' ');
        }
        output.push_str(&node.label);
        output.push('\n');
    }

    let child_prefix = if is_root {
        String::new()
    } else {
        let continuation = if is_last { "    " } else { "│   " };
        format!("{}{}", prefix, continuation)
    };

    for (i, child) in node.children.iter().enumerate() {
        let child_is_last = i == node.children.len() - 1;
        render_node(output, child, &child_prefix, child_is_last, false);
    }
}

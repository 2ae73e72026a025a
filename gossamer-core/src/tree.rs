//! Site tree building and rendering.
//!
//! The tree is derived from a snapshot of the result set restricted to the
//! seed's authority; it is never mutated elsewhere and can be rebuilt any
//! number of times.

use gossamer_crawler::resolve::same_authority;
use serde::Serialize;
use std::collections::HashMap;
use url::Url;

#[derive(Debug, Serialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub children: HashMap<String, TreeNode>,
}

impl TreeNode {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: HashMap::new(),
        }
    }

    fn child(&mut self, name: &str) -> &mut TreeNode {
        self.children
            .entry(name.to_string())
            .or_insert_with(|| TreeNode::new(name))
    }
}

/// Build the path hierarchy for the seed plus every discovered address on
/// the seed's authority. Inserting the same address twice is idempotent.
pub fn build_site_tree(seed: &Url, results: &[String]) -> TreeNode {
    let mut root = TreeNode::new("/");

    let addresses = std::iter::once(seed.as_str()).chain(results.iter().map(String::as_str));
    for address in addresses {
        let Ok(parsed) = Url::parse(address) else {
            continue;
        };
        if !same_authority(&parsed, seed) {
            continue;
        }
        insert_address(&mut root, &parsed);
    }

    root
}

fn insert_address(root: &mut TreeNode, url: &Url) {
    let suffix = url.query().map(|q| format!("?{q}")).unwrap_or_default();
    let segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();

    if segments.is_empty() {
        // A query on the authority root still gets a leaf of its own.
        if !suffix.is_empty() {
            root.child(&suffix);
        }
        return;
    }

    let mut current = root;
    let last = segments.len() - 1;
    for (i, segment) in segments.iter().enumerate() {
        let name = if i == last && !suffix.is_empty() {
            format!("{segment}{suffix}")
        } else {
            (*segment).to_string()
        };
        current = current.child(&name);
    }
}

/// Render with box-drawing connectors. Sibling order is lexicographic,
/// computed here rather than stored in the tree.
pub fn render_tree(node: &TreeNode) -> String {
    let mut out = String::new();
    render_children(node, "", &mut out);
    out
}

fn render_children(node: &TreeNode, prefix: &str, out: &mut String) {
    let mut names: Vec<&String> = node.children.keys().collect();
    names.sort();

    for (i, name) in names.iter().enumerate() {
        let last = i == names.len() - 1;
        let connector = if last { "└── " } else { "├── " };
        out.push_str(prefix);
        out.push_str(connector);
        out.push_str(name);
        out.push('\n');

        let child_prefix = if last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };
        render_children(&node.children[*name], &child_prefix, out);
    }
}

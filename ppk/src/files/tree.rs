//! Directory tree rendering
//!
//! Builds a name tree from the relative paths of the selected files, so only
//! directories that still contain a selected file ever show up, and renders
//! it as indented box-drawing text.

use std::collections::{BTreeMap, BTreeSet};

/// Name tree inferred from path segments
#[derive(Debug, Default)]
struct TreeNode {
    dirs: BTreeMap<String, TreeNode>,
    files: BTreeSet<String>,
}

impl TreeNode {
    fn insert(&mut self, segments: &[&str]) {
        match segments {
            [] => {}
            [file] => {
                self.files.insert((*file).to_string());
            }
            [dir, rest @ ..] => {
                self.dirs.entry((*dir).to_string()).or_default().insert(rest);
            }
        }
    }
}

/// Render the tree for `root_name` over the given POSIX-style relative paths.
///
/// Directories sort before files, both alphabetically. Directories carry a
/// trailing `/`; children connect with `├── `/`└── ` and continuation
/// prefixes `│   `/`    `.
pub fn render(root_name: &str, relative_paths: &[String]) -> String {
    let mut root = TreeNode::default();
    for path in relative_paths {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        root.insert(&segments);
    }

    let mut lines = vec![format!("{}/", root_name)];
    render_children(&root, "", &mut lines);
    lines.join("\n")
}

fn render_children(node: &TreeNode, prefix: &str, lines: &mut Vec<String>) {
    let child_count = node.dirs.len() + node.files.len();
    let mut index = 0;

    for (name, child) in &node.dirs {
        index += 1;
        let is_last = index == child_count;
        let connector = if is_last { "└── " } else { "├── " };
        lines.push(format!("{}{}{}/", prefix, connector, name));

        let next_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
        render_children(child, &next_prefix, lines);
    }

    for name in &node.files {
        index += 1;
        let is_last = index == child_count;
        let connector = if is_last { "└── " } else { "├── " };
        lines.push(format!("{}{}{}", prefix, connector, name));
    }
}

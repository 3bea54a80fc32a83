//! Hierarchical view of the flat store, for navigation.

use serde::{Deserialize, Serialize};

use crate::vfs::{is_folder_marker, marker_directory};

/// A node is a file iff `children` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    pub fn is_file(&self) -> bool {
        self.children.is_none()
    }

    fn file(name: &str, path: String) -> Self {
        Self {
            name: name.to_string(),
            path,
            children: None,
        }
    }

    fn folder(name: &str, path: String) -> Self {
        Self {
            name: name.to_string(),
            path,
            children: Some(Vec::new()),
        }
    }
}

/// Build the ordered forest for a set of store paths.
///
/// Children appear in the order their key was first registered, which is the
/// store's insertion order. Marker entries register their directory and are
/// never surfaced as files. When a path would need a file and a folder at the
/// same location, the first registration wins and the later path is dropped.
pub fn build_tree<'a, I>(paths: I) -> Vec<TreeNode>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut roots = Vec::new();
    for path in paths {
        if is_folder_marker(path) {
            if let Some(dir) = marker_directory(path) {
                insert_path(&mut roots, dir, true);
            }
        } else {
            insert_path(&mut roots, path, false);
        }
    }
    roots
}

fn insert_path(roots: &mut Vec<TreeNode>, path: &str, as_folder: bool) {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return;
    }

    let mut level = roots;
    let mut current = String::new();
    for (i, segment) in segments.iter().enumerate() {
        let last = i + 1 == segments.len();
        let wants_folder = !last || as_folder;
        if !current.is_empty() {
            current.push('/');
        }
        current.push_str(segment);

        let idx = match level.iter().position(|n| n.name == *segment) {
            Some(idx) => idx,
            None => {
                let node = if wants_folder {
                    TreeNode::folder(segment, current.clone())
                } else {
                    TreeNode::file(segment, current.clone())
                };
                level.push(node);
                level.len() - 1
            }
        };

        let node = &mut level[idx];
        if node.is_file() == wants_folder {
            tracing::warn!(
                path,
                conflict = %current,
                "path needs a file and a folder at the same location; keeping the first"
            );
            return;
        }
        if last {
            return;
        }
        match node.children {
            Some(ref mut children) => level = children,
            None => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(nodes: &[TreeNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn test_nested_paths_follow_insertion_order() {
        let tree = build_tree(["src/b.ts", "index.html", "src/a.ts", "lib/c.ts"]);
        assert_eq!(names(&tree), vec!["src", "index.html", "lib"]);
        let src = tree[0].children.as_ref().unwrap();
        assert_eq!(names(src), vec!["b.ts", "a.ts"]);
        assert_eq!(src[1].path, "src/a.ts");
        assert!(src[1].is_file());
        assert!(!tree[0].is_file());
    }

    #[test]
    fn test_markers_become_folders_not_files() {
        let tree = build_tree(["empty/.folder", "src/.folder", "src/main.ts"]);
        assert_eq!(names(&tree), vec!["empty", "src"]);
        assert_eq!(tree[0].children, Some(vec![]));
        assert_eq!(tree[0].path, "empty");
        let src = tree[1].children.as_ref().unwrap();
        assert_eq!(names(src), vec!["main.ts"]);
    }

    #[test]
    fn test_nested_marker_creates_intermediate_folders() {
        let tree = build_tree(["a/b/c/.folder"]);
        let b = &tree[0].children.as_ref().unwrap()[0];
        assert_eq!(b.path, "a/b");
        let c = &b.children.as_ref().unwrap()[0];
        assert_eq!(c.path, "a/b/c");
        assert_eq!(c.children, Some(vec![]));
    }

    #[test]
    fn test_file_folder_conflict_keeps_first() {
        let tree = build_tree(["a", "a/b.ts"]);
        assert_eq!(tree.len(), 1);
        assert!(tree[0].is_file());

        let tree = build_tree(["a/b.ts", "a"]);
        assert_eq!(tree.len(), 1);
        assert!(!tree[0].is_file());
    }

    #[test]
    fn test_serialized_form_omits_children_for_files() {
        let tree = build_tree(["src/a.ts"]);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "name": "src", "path": "src", "children": [
                    { "name": "a.ts", "path": "src/a.ts" }
                ]}
            ])
        );
    }
}

//! 目录树展开状态
//!
//! 树节点模型与展开/选中状态的采集和恢复

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// 目录树中的一个节点
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    /// 当前是否展开（只对目录有意义）
    pub expanded: bool,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(name: impl Into<String>, path: impl Into<String>, is_dir: bool) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_dir,
            expanded: false,
            children: Vec::new(),
        }
    }
}

/// 持久化的树视图状态（settings 表中的 JSON 值）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeViewState {
    #[serde(default)]
    pub open_paths: Vec<String>,
    #[serde(default)]
    pub selected_path: Option<String>,
}

/// 采集所有已展开节点的路径
///
/// 深度优先，只深入已展开的节点（与折叠子树无关的状态不采集）
pub fn collect_open_paths(root: &TreeNode) -> Vec<String> {
    let mut open = Vec::new();
    let mut stack: Vec<&TreeNode> = vec![root];

    while let Some(node) = stack.pop() {
        if node.expanded {
            open.push(node.path.clone());
            stack.extend(node.children.iter());
        }
    }

    open
}

/// 恢复展开状态并重新选中之前的节点
///
/// 返回仍然存在的选中路径；路径不存在时为 None（不报错）
pub fn restore_expansion(
    root: &mut TreeNode,
    open_paths: &HashSet<String>,
    selected_path: Option<&str>,
) -> Option<String> {
    let mut found_selected = None;
    let mut stack: Vec<&mut TreeNode> = vec![root];

    while let Some(node) = stack.pop() {
        if open_paths.contains(&node.path) {
            node.expanded = true;
        }
        if let Some(target) = selected_path {
            if node.path == target {
                found_selected = Some(node.path.clone());
            }
        }
        stack.extend(node.children.iter_mut());
    }

    found_selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> TreeNode {
        let mut root = TreeNode::new("root", "/root", true);
        let mut docs = TreeNode::new("docs", "/root/docs", true);
        docs.children
            .push(TreeNode::new("a.md", "/root/docs/a.md", false));
        root.children.push(docs);
        root.children.push(TreeNode::new("src", "/root/src", true));
        root
    }

    #[test]
    fn test_collect_only_expanded() {
        let mut tree = sample_tree();
        tree.expanded = true;
        tree.children[0].expanded = true;
        // src 保持折叠

        let open = collect_open_paths(&tree);
        assert!(open.contains(&"/root".to_string()));
        assert!(open.contains(&"/root/docs".to_string()));
        assert!(!open.contains(&"/root/src".to_string()));
    }

    #[test]
    fn test_collect_skips_collapsed_subtrees() {
        let mut tree = sample_tree();
        // root 折叠时，即使子节点标记展开也不采集
        tree.children[0].expanded = true;
        let open = collect_open_paths(&tree);
        assert!(open.is_empty());
    }

    #[test]
    fn test_restore_expansion_and_selection() {
        let mut tree = sample_tree();
        let open: HashSet<String> = ["/root".to_string(), "/root/docs".to_string()]
            .into_iter()
            .collect();

        let selected = restore_expansion(&mut tree, &open, Some("/root/docs/a.md"));
        assert!(tree.expanded);
        assert!(tree.children[0].expanded);
        assert!(!tree.children[1].expanded);
        assert_eq!(selected.as_deref(), Some("/root/docs/a.md"));
    }

    #[test]
    fn test_restore_missing_selected_is_noop() {
        let mut tree = sample_tree();
        let selected = restore_expansion(&mut tree, &HashSet::new(), Some("/gone.md"));
        assert_eq!(selected, None);
    }

    #[test]
    fn test_tree_view_state_json_roundtrip() {
        let state = TreeViewState {
            open_paths: vec!["/a".to_string()],
            selected_path: Some("/a/b.md".to_string()),
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: TreeViewState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.open_paths, state.open_paths);
        assert_eq!(back.selected_path, state.selected_path);
    }

    #[test]
    fn test_tree_view_state_tolerates_missing_fields() {
        let back: TreeViewState = serde_json::from_str("{}").unwrap();
        assert!(back.open_paths.is_empty());
        assert!(back.selected_path.is_none());
    }
}

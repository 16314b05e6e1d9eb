//! Walks over the branch graph: restack orders, stack chains and navigation.
//!
//! Every walk names branches by the first branch name of each node, and fails when a node it
//! needs to name has none.

use super::{NodeId, RepoData};
use crate::errors::GraphError;

/// Merge `branch_to_merge` into `branch_to_receive`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeAction {
    pub branch_to_merge: String,
    pub branch_to_receive: String,
}

/// Rebase the commits of `branch_to_rebase` after `old_parent_hash` onto `onto`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebaseAction {
    pub branch_to_rebase: String,
    pub onto: String,
    pub old_parent_hash: String,
}

/// A branch of a stack, from [stack_chain].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEntry {
    pub branch: String,
    pub node: NodeId,
}

/// Returns the first branch name of `id`.
pub fn branch_name_of(repo: &RepoData, id: NodeId) -> Result<&str, GraphError> {
    match repo.commit(id) {
        Some(commit) => commit.branch_name(),
        None => Err(GraphError::NoBranchName("root".to_string())),
    }
}

/// Depth-first merge walk. `remap` may replace the parent of an edge before it is named.
fn merge_walk(
    repo: &RepoData,
    node: NodeId,
    parent: Option<NodeId>,
    remap: &dyn Fn(NodeId) -> NodeId,
    actions: &mut Vec<MergeAction>,
) -> Result<(), GraphError> {
    if let Some(parent) = parent.map(remap) {
        actions.push(MergeAction {
            branch_to_merge: branch_name_of(repo, parent)?.to_string(),
            branch_to_receive: branch_name_of(repo, node)?.to_string(),
        });
    }
    for child in repo.children(node) {
        merge_walk(repo, child, Some(node), remap, actions)?;
    }
    Ok(())
}

/// Merges that bring every descendant of `start` up to date, parents first.
///
/// Each edge below `start` yields one action merging the parent branch into the child branch.
/// Children are visited in the order they were linked.
pub fn merge_order(repo: &RepoData, start: NodeId) -> Result<Vec<MergeAction>, GraphError> {
    let mut actions = Vec::new();
    merge_walk(repo, start, None, &|p| p, &mut actions)?;
    Ok(actions)
}

/// Merges that move the stack rooted at `stack_root` onto `dest`.
///
/// Same as [merge_order], with a first action merging `dest` into `stack_root`.
pub fn merge_order_onto(
    repo: &RepoData,
    stack_root: NodeId,
    dest: NodeId,
) -> Result<Vec<MergeAction>, GraphError> {
    let mut actions = Vec::new();
    merge_walk(repo, stack_root, Some(dest), &|p| p, &mut actions)?;
    Ok(actions)
}

/// Merges that re-home the descendants of the deleted branch `pruned` onto `master`.
///
/// Edges whose parent is `pruned` merge `master` instead. Deeper edges are left alone.
pub fn cleanup_merge_order(
    repo: &RepoData,
    pruned: NodeId,
    master: NodeId,
) -> Result<Vec<MergeAction>, GraphError> {
    let mut actions = Vec::new();
    let remap = |p: NodeId| if p == pruned { master } else { p };
    merge_walk(repo, pruned, None, &remap, &mut actions)?;
    Ok(actions)
}

/// Rebases that move `source` and its descendants onto `dest`.
///
/// ## Returns
/// - `Ok(actions)` - One action per node of the subtree, parents first. Each action keeps the
///   node's current parent commit as the upstream boundary.
/// - `Err(GraphError::NoParent)` - A node of the subtree hangs off the root.
pub fn rebase_order(
    repo: &RepoData,
    source: NodeId,
    dest: NodeId,
) -> Result<Vec<RebaseAction>, GraphError> {
    fn walk(
        repo: &RepoData,
        node: NodeId,
        target: NodeId,
        actions: &mut Vec<RebaseAction>,
    ) -> Result<(), GraphError> {
        let branch = branch_name_of(repo, node)?;
        let old_parent = repo
            .parent(node)
            .and_then(|p| repo.commit(p))
            .ok_or_else(|| GraphError::NoParent(branch.to_string()))?;
        actions.push(RebaseAction {
            branch_to_rebase: branch.to_string(),
            onto: branch_name_of(repo, target)?.to_string(),
            old_parent_hash: old_parent.hash.clone(),
        });
        for child in repo.children(node) {
            walk(repo, child, node, actions)?;
        }
        Ok(())
    }

    let mut actions = Vec::new();
    walk(repo, source, dest, &mut actions)?;
    Ok(actions)
}

/// The stack ending at `tip`: branches from `tip` down to, excluding, master.
///
/// ## Returns
/// - `Ok(entries)` - Tip first. The walk stops at the first effective-master node or the root.
/// - `Err(GraphError::AmbiguousBranchName)` - A branch of the stack shares its commit with
///   another branch, so pushing it would be ambiguous.
pub fn stack_chain(repo: &RepoData, tip: NodeId) -> Result<Vec<StackEntry>, GraphError> {
    let mut stack = Vec::new();
    let mut current = Some(tip);
    while let Some(node) = current {
        let Some(commit) = repo.commit(node) else {
            break;
        };
        if commit.is_effective_master() {
            break;
        }
        stack.push(StackEntry {
            branch: commit.single_branch_name()?.to_string(),
            node,
        });
        current = repo.parent(node);
    }
    Ok(stack)
}

/// The parent branch of `node`.
///
/// Fails with [GraphError::NoParent] when the parent is the synthetic root.
pub fn prev(repo: &RepoData, node: NodeId) -> Result<NodeId, GraphError> {
    match repo.parent(node) {
        Some(parent) if !repo.is_root(parent) => Ok(parent),
        _ => Err(GraphError::NoParent(node_label(repo, node))),
    }
}

/// The only child of `node`.
///
/// Fails with [GraphError::NoChild] on a leaf, and [GraphError::MultipleChildren] on a fork.
pub fn next(repo: &RepoData, node: NodeId) -> Result<NodeId, GraphError> {
    let mut children = repo.children(node);
    match (children.next(), children.next()) {
        (Some(child), None) => Ok(child),
        (None, _) => Err(GraphError::NoChild(node_label(repo, node))),
        (Some(_), Some(_)) => Err(GraphError::MultipleChildren(node_label(repo, node))),
    }
}

/// Follows [next] until a leaf. A leaf `node` is its own top.
pub fn top(repo: &RepoData, node: NodeId) -> Result<NodeId, GraphError> {
    let mut current = node;
    loop {
        match repo.children(current).len() {
            0 => return Ok(current),
            1 => current = next(repo, current)?,
            _ => return Err(GraphError::MultipleChildren(node_label(repo, current))),
        }
    }
}

fn node_label(repo: &RepoData, node: NodeId) -> String {
    branch_name_of(repo, node)
        .map(ToOwned::to_owned)
        .unwrap_or_else(|_| repo.node(node).label().to_string())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tree::test_support::graph;

    fn merge(from: &str, into: &str) -> MergeAction {
        MergeAction {
            branch_to_merge: from.into(),
            branch_to_receive: into.into(),
        }
    }

    /// main <- a <- (b, c), b <- d
    fn forked() -> RepoData {
        graph(&[
            ("m1", &["main"], 10, None),
            ("a1", &["a"], 20, Some("m1")),
            ("b1", &["b"], 30, Some("a1")),
            ("c1", &["c"], 40, Some("a1")),
            ("d1", &["d"], 50, Some("b1")),
        ])
    }

    #[test]
    fn merge_order_from_root_with_two_children() {
        let repo = graph(&[
            ("m1", &["main"], 10, None),
            ("r1", &["root-branch"], 20, Some("m1")),
            ("x1", &["x"], 30, Some("r1")),
            ("y1", &["y"], 40, Some("r1")),
        ]);
        let start = repo.require_branch("root-branch").unwrap();
        assert_eq!(
            merge_order(&repo, start).unwrap(),
            vec![merge("root-branch", "x"), merge("root-branch", "y")]
        );
    }

    #[test]
    fn merge_order_is_depth_first() {
        let repo = forked();
        let a = repo.require_branch("a").unwrap();
        assert_eq!(
            merge_order(&repo, a).unwrap(),
            vec![merge("a", "b"), merge("b", "d"), merge("a", "c")]
        );
    }

    #[test]
    fn merge_order_onto_starts_with_destination() {
        let repo = forked();
        let b = repo.require_branch("b").unwrap();
        let master = repo.master_node().unwrap();
        assert_eq!(
            merge_order_onto(&repo, b, master).unwrap(),
            vec![merge("main", "b"), merge("b", "d")]
        );
    }

    #[test]
    fn cleanup_remaps_only_the_pruned_parent() {
        let repo = forked();
        let a = repo.require_branch("a").unwrap();
        let master = repo.master_node().unwrap();
        assert_eq!(
            cleanup_merge_order(&repo, a, master).unwrap(),
            vec![merge("main", "b"), merge("b", "d"), merge("main", "c")]
        );

        let b = repo.require_branch("b").unwrap();
        assert_eq!(
            cleanup_merge_order(&repo, b, master).unwrap(),
            vec![merge("main", "d")]
        );
    }

    #[test]
    fn merge_needs_branch_names() {
        let repo = graph(&[
            ("m1", &["main"], 10, None),
            ("j1", &[], 5, Some("m1")),
            ("a1", &["a"], 20, Some("j1")),
        ]);
        assert_eq!(
            merge_order(&repo, repo.master_node().unwrap()),
            Err(GraphError::NoBranchName("j1".into()))
        );
    }

    #[test]
    fn rebase_order_keeps_old_parents() {
        let repo = forked();
        let b = repo.require_branch("b").unwrap();
        let c = repo.require_branch("c").unwrap();
        let actions = rebase_order(&repo, b, c).unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].branch_to_rebase, "b");
        assert_eq!(actions[0].onto, "c");
        assert!(actions[0].old_parent_hash.starts_with("a1"));
        assert_eq!(actions[1].branch_to_rebase, "d");
        assert_eq!(actions[1].onto, "b");
        assert!(actions[1].old_parent_hash.starts_with("b1"));
    }

    #[test]
    fn stack_chain_of_linear_stack() {
        let repo = graph(&[
            ("m1", &["main"], 10, None),
            ("s1", &["s1"], 20, Some("m1")),
            ("s2", &["s2"], 30, Some("s1")),
            ("s3", &["s3"], 40, Some("s2")),
        ]);
        let tip = repo.require_branch("s3").unwrap();
        let chain = stack_chain(&repo, tip)
            .unwrap()
            .into_iter()
            .map(|e| e.branch)
            .collect::<Vec<_>>();
        assert_eq!(chain, vec!["s3", "s2", "s1"]);
    }

    #[test]
    fn stack_chain_rejects_shared_commits() {
        let repo = graph(&[
            ("m1", &["main"], 10, None),
            ("s1", &["s1", "alias"], 20, Some("m1")),
        ]);
        let tip = repo.require_branch("s1").unwrap();
        assert!(matches!(
            stack_chain(&repo, tip),
            Err(GraphError::AmbiguousBranchName { .. })
        ));
        assert_eq!(stack_chain(&repo, repo.master_node().unwrap()), Ok(vec![]));
    }

    #[test]
    fn navigation() {
        let repo = forked();
        let master = repo.master_node().unwrap();
        let a = repo.require_branch("a").unwrap();
        let b = repo.require_branch("b").unwrap();
        let d = repo.require_branch("d").unwrap();

        assert_eq!(next(&repo, a), Err(GraphError::MultipleChildren("a".into())));
        assert_eq!(next(&repo, b), Ok(d));
        assert_eq!(next(&repo, d), Err(GraphError::NoChild("d".into())));
        assert_eq!(next(&repo, master), Ok(a));

        assert_eq!(prev(&repo, a), Ok(master));
        assert_eq!(prev(&repo, master), Err(GraphError::NoParent("main".into())));

        assert_eq!(top(&repo, b), Ok(d));
        assert_eq!(top(&repo, d), Ok(d));
        assert_eq!(top(&repo, master), Err(GraphError::MultipleChildren("a".into())));
    }
}

//! The branch graph: an arena of branch tips linked by their topological ancestry.
//!
//! A [RepoData] is built fresh for every command by [builder::build_repo_data] and is
//! read-only afterwards. Node `0` is the synthetic root, which carries no commit.

use crate::{
    errors::GraphError,
    git::{commit::CommitRecord, description::BranchDescription},
};
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;

pub mod builder;
pub mod fmt;
pub mod traversal;

/// Index of a node in a [RepoData] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A node of the branch graph: a branch tip, a junction on master's history, or the root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchNode {
    /// The commit of the node. [None] only for the synthetic root.
    pub commit: Option<CommitRecord>,
    parent: Option<NodeId>,
    /// Children keyed by commit hash, in the order they were linked.
    children: IndexMap<String, NodeId>,
}

impl BranchNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        self.children.values().copied()
    }

    /// The hash of the node's commit, or `root` for the synthetic root.
    pub fn label(&self) -> &str {
        self.commit.as_ref().map_or("root", |c| c.short_hash.as_str())
    }
}

/// Snapshot of the branch graph of a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoData {
    /// Name of the master branch.
    pub master_branch: String,
    nodes: Vec<BranchNode>,
    hash_to_node: HashMap<String, NodeId>,
    short_hash_to_node: HashMap<String, NodeId>,
    branch_to_node: HashMap<String, NodeId>,
}

impl RepoData {
    /// The synthetic root node.
    pub const ROOT: NodeId = NodeId(0);

    /// Creates a graph holding only the synthetic root.
    pub(crate) fn new(master_branch: impl Into<String>) -> Self {
        Self {
            master_branch: master_branch.into(),
            nodes: vec![BranchNode::default()],
            hash_to_node: HashMap::new(),
            short_hash_to_node: HashMap::new(),
            branch_to_node: HashMap::new(),
        }
    }

    /// Adds an unlinked node for `commit`, registering its hashes and branch names.
    ///
    /// Adding a commit that already has a node returns the existing node.
    pub(crate) fn add_node(&mut self, commit: CommitRecord) -> NodeId {
        if let Some(&id) = self.hash_to_node.get(&commit.hash) {
            return id;
        }

        let id = NodeId(self.nodes.len());
        self.hash_to_node.insert(commit.hash.clone(), id);
        self.short_hash_to_node.insert(commit.short_hash.clone(), id);
        for name in &commit.branch_names {
            self.branch_to_node.insert(name.clone(), id);
        }
        self.nodes.push(BranchNode {
            commit: Some(commit),
            ..Default::default()
        });
        id
    }

    /// Links `child` under `parent`.
    ///
    /// ## Returns
    /// - `Ok(())` - The edge exists. Linking the same edge twice is a no-op.
    /// - `Err(GraphError::AlreadyLinked)` - `child` already has another parent.
    /// - `Err(GraphError::Cycle)` - `child` is `parent` or one of its ancestors.
    pub(crate) fn link(&mut self, child: NodeId, parent: NodeId) -> Result<(), GraphError> {
        if let Some(existing) = self.nodes[child.0].parent {
            if existing == parent {
                return Ok(());
            }
            return Err(GraphError::AlreadyLinked {
                child: self.nodes[child.0].label().to_string(),
                existing: self.nodes[existing.0].label().to_string(),
                parent: self.nodes[parent.0].label().to_string(),
            });
        }
        if child == Self::ROOT || child == parent || self.ancestors(parent).any(|a| a == child) {
            return Err(GraphError::Cycle {
                child: self.nodes[child.0].label().to_string(),
                parent: self.nodes[parent.0].label().to_string(),
            });
        }

        let key = self.nodes[child.0]
            .commit
            .as_ref()
            .map(|c| c.hash.clone())
            .unwrap_or_default();
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(key, child);
        Ok(())
    }

    /// Attaches stored descriptions to the commits of the branches they belong to.
    ///
    /// A commit carries one description. When several branches point at it, the description
    /// of its first branch name is kept and the others are dropped.
    pub(crate) fn attach_descriptions(&mut self, descriptions: HashMap<String, BranchDescription>) {
        for (branch, description) in descriptions {
            let Some(&id) = self.branch_to_node.get(&branch) else {
                continue;
            };
            let Some(commit) = self.nodes[id.0].commit.as_mut() else {
                continue;
            };
            if commit.branch_names.first() == Some(&branch) || commit.description.is_none() {
                commit.description = Some(description);
            } else {
                debug!(
                    branch = %branch,
                    kept = ?commit.branch_names.first(),
                    "Dropping description of a branch sharing its commit"
                );
            }
        }
    }

    pub fn node(&self, id: NodeId) -> &BranchNode {
        &self.nodes[id.0]
    }

    /// Returns the commit of `id`, or [None] for the root.
    pub fn commit(&self, id: NodeId) -> Option<&CommitRecord> {
        self.nodes[id.0].commit.as_ref()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        self.nodes[id.0].children()
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        id == Self::ROOT
    }

    /// Number of nodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Iterates over every node id, the root first.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Iterates over the strict ancestors of `id`, nearest first, ending at the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = self.parent(id);
        // Bounded by the node count, so a corrupted graph cannot loop forever.
        let mut budget = self.nodes.len();
        std::iter::from_fn(move || {
            let current = next?;
            if budget == 0 {
                return None;
            }
            budget -= 1;
            next = self.parent(current);
            Some(current)
        })
    }

    pub fn node_by_hash(&self, hash: &str) -> Option<NodeId> {
        self.hash_to_node.get(hash).copied()
    }

    pub fn node_by_short_hash(&self, short_hash: &str) -> Option<NodeId> {
        self.short_hash_to_node.get(short_hash).copied()
    }

    pub fn node_by_branch(&self, branch: &str) -> Option<NodeId> {
        self.branch_to_node.get(branch).copied()
    }

    /// Returns the node of `branch`, failing when the branch is not in the graph.
    pub fn require_branch(&self, branch: &str) -> Result<NodeId, GraphError> {
        self.node_by_branch(branch)
            .ok_or_else(|| GraphError::UnknownBranch(branch.to_string()))
    }

    /// The node of the master branch.
    pub fn master_node(&self) -> Option<NodeId> {
        self.node_by_branch(&self.master_branch)
    }

}

#[cfg(test)]
pub(crate) mod test_support {
    //! Hand-built graphs for the tests of the tree modules.

    use super::{NodeId, RepoData};
    use crate::git::commit::CommitRecord;

    /// A commit with `names` as branch names and `timestamp` as commit time.
    pub(crate) fn commit(hash: &str, names: &[&str], timestamp: i64) -> CommitRecord {
        CommitRecord {
            hash: format!("{}{}", hash, "0".repeat(40 - hash.len().min(40))),
            short_hash: hash.to_string(),
            author: "Ada".to_string(),
            relative_time: "1 day ago".to_string(),
            timestamp,
            ref_names: names.iter().map(|n| n.to_string()).collect(),
            branch_names: names.iter().map(|n| n.to_string()).collect(),
            is_head: false,
            title: format!("commit {}", hash),
            body: String::new(),
            is_master: names.contains(&"main"),
            is_part_of_master: false,
            description: None,
        }
    }

    /// Builds a graph from `(hash, names, timestamp, parent hash)` tuples, in order.
    /// A parent of `None` links under the root.
    pub(crate) fn graph(nodes: &[(&str, &[&str], i64, Option<&str>)]) -> RepoData {
        let mut repo = RepoData::new("main");
        for (hash, names, timestamp, parent) in nodes {
            let record = commit(hash, names, *timestamp);
            let full_parent = parent.map(|p| commit(p, &[], 0).hash);
            let id = repo.add_node(record);
            let parent_id: NodeId = match full_parent {
                Some(p) => repo.node_by_hash(&p).unwrap(),
                None => RepoData::ROOT,
            };
            repo.link(id, parent_id).unwrap();
        }
        repo
    }
}

#[cfg(test)]
mod test {
    use super::{test_support::*, RepoData};
    use crate::{errors::GraphError, git::description::BranchDescription};
    use std::collections::HashMap;

    #[test]
    fn lookups() {
        let repo = graph(&[
            ("m1", &["main"], 10, None),
            ("a1", &["feature-a", "alias"], 20, Some("m1")),
        ]);
        let master = repo.master_node().unwrap();
        let a = repo.require_branch("alias").unwrap();
        assert_eq!(repo.node_by_branch("feature-a"), Some(a));
        assert_eq!(repo.node_by_short_hash("a1"), Some(a));
        assert_eq!(repo.parent(a), Some(master));
        assert_eq!(repo.children(master).collect::<Vec<_>>(), vec![a]);
        assert_eq!(
            repo.require_branch("nope"),
            Err(GraphError::UnknownBranch("nope".into()))
        );
        assert_eq!(repo.len(), 3);
    }

    #[test]
    fn relinking_and_cycles_are_rejected() {
        let mut repo = graph(&[
            ("m1", &["main"], 10, None),
            ("a1", &["feature-a"], 20, Some("m1")),
        ]);
        let master = repo.master_node().unwrap();
        let a = repo.require_branch("feature-a").unwrap();

        assert_eq!(repo.link(a, master), Ok(()));
        assert!(matches!(
            repo.link(a, RepoData::ROOT),
            Err(GraphError::AlreadyLinked { .. })
        ));

        let b = repo.add_node(commit("b1", &["feature-b"], 30));
        assert!(matches!(repo.link(b, b), Err(GraphError::Cycle { .. })));
        assert!(matches!(
            repo.link(RepoData::ROOT, b),
            Err(GraphError::Cycle { .. })
        ));
        assert_eq!(repo.children(master).len(), 1);
    }

    #[test]
    fn ancestors_end_at_root() {
        let repo = graph(&[
            ("m1", &["main"], 10, None),
            ("a1", &["a"], 20, Some("m1")),
            ("b1", &["b"], 30, Some("a1")),
        ]);
        let b = repo.require_branch("b").unwrap();
        let ancestors = repo.ancestors(b).collect::<Vec<_>>();
        assert_eq!(ancestors.len(), 3);
        assert_eq!(ancestors.last(), Some(&RepoData::ROOT));
    }

    #[test]
    fn descriptions_attach_to_branch_commits() {
        let mut repo = graph(&[
            ("m1", &["main"], 10, None),
            ("a1", &["a"], 20, Some("m1")),
        ]);
        repo.attach_descriptions(HashMap::from([
            ("a".to_string(), BranchDescription::from_title("Described")),
            ("gone".to_string(), BranchDescription::from_title("Stale")),
        ]));
        let a = repo.require_branch("a").unwrap();
        assert_eq!(repo.commit(a).unwrap().display_title(), "Described");
        assert!(repo.commit(RepoData::ROOT).is_none());
    }

    #[test]
    fn first_branch_description_wins_on_shared_commits() {
        let mut repo = graph(&[
            ("m1", &["main"], 10, None),
            ("a1", &["a", "b"], 20, Some("m1")),
        ]);
        repo.attach_descriptions(HashMap::from([
            ("b".to_string(), BranchDescription::from_title("From b")),
            ("a".to_string(), BranchDescription::from_title("From a")),
        ]));
        let a = repo.require_branch("a").unwrap();
        assert_eq!(repo.node_by_branch("b"), Some(a));
        assert_eq!(repo.commit(a).unwrap().display_title(), "From a");

        let mut repo = graph(&[
            ("m1", &["main"], 10, None),
            ("a1", &["a", "b"], 20, Some("m1")),
        ]);
        repo.attach_descriptions(HashMap::from([(
            "b".to_string(),
            BranchDescription::from_title("From b"),
        )]));
        let b = repo.require_branch("b").unwrap();
        assert_eq!(repo.commit(b).unwrap().display_title(), "From b");
    }
}

//! Reconstruction of the branch graph from the `git show-branch` dump.
//!
//! The dump only says which branch histories contain each commit. Turning it into one-hop
//! parent edges happens in three phases:
//!
//! 1. [plan_graph] scans each branch column for the first marked row after the branch's own
//!    tip, and records what kind of parent it names (master, a junction on master's history,
//!    another branch, or nothing).
//! 2. [build_repo_data] creates one node per planned commit. Junctions are annotated as part
//!    of master before any node exists.
//! 3. Edges are linked: the junctions into a chain under master, each branch under its
//!    planned parent, and every node left over under the root.
//!
//! The first matching row wins. Nothing tries to pick between several plausible parents.

use super::{NodeId, RepoData};
use crate::{
    errors::GraphError,
    git::{commit::CommitRecord, show_branch::BranchDump},
};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// The inputs of [plan_graph], all fetched up front by the `git` adapter.
#[derive(Debug, Clone, Copy)]
pub struct GraphInput<'a> {
    /// Name of the master branch.
    pub master: &'a str,
    /// Local branches and the full hashes of their tips.
    pub branch_tips: &'a [(String, String)],
    pub dump: &'a BranchDump,
    /// Full hashes of the relative references returned by [junction_candidates].
    pub resolved: &'a HashMap<String, String>,
}

/// The parent a branch tip was assigned in the planning phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentPlan {
    Master,
    /// A commit of master's history, by full hash.
    Junction(String),
    /// Another branch tip, by full hash.
    Branch(String),
    Root,
}

/// Parent assignments of every branch tip, computed from the dump alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphPlan {
    master: String,
    master_hash: String,
    /// Branch tip hashes and their parents, in column order.
    edges: Vec<(String, ParentPlan)>,
    /// Every junction hash, in the order it was first used.
    junctions: Vec<String>,
    /// Junctions found in master's column, newest first.
    junction_chain: Vec<String>,
}

impl GraphPlan {
    /// Hashes whose commit metadata [build_repo_data] needs.
    pub fn required_hashes(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        std::iter::once(&self.master_hash)
            .chain(self.edges.iter().map(|(hash, _)| hash))
            .chain(self.junctions.iter())
            .map(String::as_str)
            .filter(|h| seen.insert(*h))
            .collect()
    }

    pub fn edges(&self) -> &[(String, ParentPlan)] {
        &self.edges
    }
}

fn master_relative_pattern(master: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"^{}(?:[~^]\d*)+$", regex::escape(master)))
}

fn is_relative(reference: &str) -> bool {
    reference.contains(['~', '^'])
}

/// Returns the relative references of the dump that may become junctions: the ones naming a
/// commit of master's history. Their hashes go into [GraphInput::resolved].
pub fn junction_candidates(dump: &BranchDump, master: &str) -> Vec<String> {
    let BranchDump::Columns { rows, .. } = dump else {
        return Vec::new();
    };
    let Ok(master_relative) = master_relative_pattern(master) else {
        return Vec::new();
    };
    let master_column = dump.column_of(master);

    let mut seen = HashSet::new();
    rows.iter()
        .filter(|row| is_relative(&row.reference))
        .filter(|row| {
            master_relative.is_match(&row.reference)
                || master_column.is_some_and(|c| row.is_marked(c))
        })
        .filter(|row| seen.insert(row.reference.as_str()))
        .map(|row| row.reference.clone())
        .collect()
}

/// Phase one: assigns a parent to every branch tip from the dump.
///
/// ## Returns
/// - `Ok(plan)` - One parent per distinct branch tip other than master's commit.
/// - `Err(GraphError::MissingColumn)` - Master has no column in the dump.
/// - `Err(GraphError::UnresolvedReference)` - A branch or junction reference has no hash.
/// - `Err(GraphError::UnknownBranch)` - A row names something that is not a local branch.
pub fn plan_graph(input: &GraphInput<'_>) -> Result<GraphPlan, GraphError> {
    let GraphInput {
        master,
        branch_tips,
        dump,
        resolved,
    } = *input;

    let tips = branch_tips
        .iter()
        .map(|(name, hash)| (name.as_str(), hash.as_str()))
        .collect::<HashMap<_, _>>();
    let master_hash = *tips
        .get(master)
        .ok_or_else(|| GraphError::UnresolvedReference(master.to_string()))?;
    let mut plan = GraphPlan {
        master: master.to_string(),
        master_hash: master_hash.to_string(),
        edges: Vec::new(),
        junctions: Vec::new(),
        junction_chain: Vec::new(),
    };

    let (columns, rows) = match dump {
        BranchDump::Single { reference } => {
            let hash = *tips
                .get(reference.as_str())
                .ok_or_else(|| GraphError::UnresolvedReference(reference.clone()))?;
            if hash != master_hash {
                plan.edges.push((hash.to_string(), ParentPlan::Root));
            }
            return Ok(plan);
        }
        BranchDump::Columns { columns, rows } => (columns, rows),
    };

    let master_column = dump
        .column_of(master)
        .ok_or_else(|| GraphError::MissingColumn(master.to_string()))?;
    let master_relative = master_relative_pattern(master)
        .map_err(|_| GraphError::UnresolvedReference(master.to_string()))?;
    let hash_of = |reference: &str| {
        tips.get(reference)
            .copied()
            .or_else(|| resolved.get(reference).map(String::as_str))
    };

    let mut planned = HashSet::new();
    for (column, branch) in columns.iter().enumerate() {
        if branch == master {
            continue;
        }
        let hash = *tips
            .get(branch.as_str())
            .ok_or_else(|| GraphError::UnresolvedReference(branch.clone()))?;
        if hash == master_hash || !planned.insert(hash) {
            trace!(branch = %branch, "Branch shares its commit with a planned node");
            continue;
        }

        let mut parent = ParentPlan::Root;
        let mut seen_self = false;
        for row in rows.iter().filter(|row| row.is_marked(column)) {
            let reference = row.reference.as_str();
            let row_hash = hash_of(reference);
            let is_self = reference == branch.as_str() || row_hash == Some(hash);
            if !seen_self {
                seen_self = is_self;
                continue;
            }
            if is_self {
                continue;
            }

            if reference == master || row_hash == Some(master_hash) {
                parent = ParentPlan::Master;
                break;
            }
            if is_relative(reference) {
                if !master_relative.is_match(reference) && !row.is_marked(master_column) {
                    continue;
                }
                let junction = resolved
                    .get(reference)
                    .ok_or_else(|| GraphError::UnresolvedReference(reference.to_string()))?;
                parent = if tips.values().any(|tip| tip == junction) {
                    ParentPlan::Branch(junction.clone())
                } else {
                    if !plan.junctions.contains(junction) {
                        plan.junctions.push(junction.clone());
                    }
                    ParentPlan::Junction(junction.clone())
                };
                break;
            }
            let parent_hash = tips
                .get(reference)
                .ok_or_else(|| GraphError::UnknownBranch(reference.to_string()))?;
            parent = ParentPlan::Branch(parent_hash.to_string());
            break;
        }

        debug!(branch = %branch, ?parent, "Planned parent");
        plan.edges.push((hash.to_string(), parent));
    }

    // Master's own column orders the junctions along its history.
    let mut seen_master = false;
    for row in rows.iter().filter(|row| row.is_marked(master_column)) {
        let row_hash = hash_of(row.reference.as_str());
        if !seen_master {
            seen_master = row.reference == master || row_hash == Some(master_hash);
            continue;
        }
        if let Some(junction) = row_hash.filter(|h| plan.junctions.iter().any(|j| j == h)) {
            if !plan.junction_chain.iter().any(|j| j == junction) {
                plan.junction_chain.push(junction.to_string());
            }
        }
    }

    Ok(plan)
}

/// Phases two and three: creates the nodes of `plan` from `records` and links them.
///
/// ## Returns
/// - `Ok(repo)` - The graph. Every non-root node has exactly one parent.
/// - `Err(GraphError::MissingCommit)` - A planned hash has no record.
/// - `Err(GraphError::Cycle)` - The planned edges loop.
pub fn build_repo_data(
    plan: &GraphPlan,
    records: Vec<CommitRecord>,
) -> Result<RepoData, GraphError> {
    let mut records = records
        .into_iter()
        .map(|r| (r.hash.clone(), r))
        .collect::<HashMap<_, _>>();

    // Annotate junctions before any node exists.
    for junction in &plan.junctions {
        records
            .get_mut(junction)
            .ok_or_else(|| GraphError::MissingCommit(junction.clone()))?
            .is_part_of_master = true;
    }

    let mut repo = RepoData::new(plan.master.clone());
    let mut take = |repo: &mut RepoData, hash: &str| -> Result<NodeId, GraphError> {
        if let Some(id) = repo.node_by_hash(hash) {
            return Ok(id);
        }
        let record = records
            .remove(hash)
            .ok_or_else(|| GraphError::MissingCommit(hash.to_string()))?;
        Ok(repo.add_node(record))
    };

    let master = take(&mut repo, &plan.master_hash)?;
    let chain = plan
        .junction_chain
        .iter()
        .map(|hash| take(&mut repo, hash))
        .collect::<Result<Vec<_>, _>>()?;
    for junction in &plan.junctions {
        take(&mut repo, junction)?;
    }
    let edges = plan
        .edges
        .iter()
        .map(|(hash, parent)| -> Result<_, GraphError> { Ok((take(&mut repo, hash)?, parent)) })
        .collect::<Result<Vec<_>, _>>()?;

    // Master hangs off its newest junction, each junction off the next older one.
    let mut child = master;
    for &junction in &chain {
        repo.link(child, junction)?;
        child = junction;
    }
    repo.link(child, RepoData::ROOT)?;

    for (tip, parent) in edges {
        let parent = match parent {
            ParentPlan::Master => master,
            ParentPlan::Junction(hash) | ParentPlan::Branch(hash) => repo
                .node_by_hash(hash)
                .ok_or_else(|| GraphError::MissingCommit(hash.clone()))?,
            ParentPlan::Root => RepoData::ROOT,
        };
        repo.link(tip, parent)?;
    }

    let orphans = repo
        .node_ids()
        .filter(|&id| !repo.is_root(id) && repo.parent(id).is_none())
        .collect::<Vec<_>>();
    for orphan in orphans {
        repo.link(orphan, RepoData::ROOT)?;
    }

    Ok(repo)
}

//! Protocol graph: dependency structure and step numbering of protocol nodes.
//!
//! Edges come from connector bindings between two distinct protocol nodes.
//! Steps are assigned with Kahn's algorithm, processing the whole ready
//! queue as one batch per round. Members of a parallel group are pulled
//! into the batch of whichever member becomes ready first, so siblings
//! always share a step number.

use crate::shapes::{Shape, ShapeId};
use std::collections::{HashMap, HashSet};

/// Result of numbering a protocol graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepNumbering {
    /// 1-based step number for every protocol node.
    pub steps: HashMap<ShapeId, u32>,
    /// Nodes left over by the topological pass (cycle members and anything
    /// downstream of a cycle), numbered after the last resolved step in
    /// document order.
    pub unresolved: Vec<ShapeId>,
}

impl StepNumbering {
    pub fn step(&self, id: &ShapeId) -> Option<u32> {
        self.steps.get(id).copied()
    }

    /// True when every node was ordered by its dependencies.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Directed graph over the protocol nodes of a shape list.
#[derive(Debug, Clone, Default)]
pub struct ProtocolGraph {
    /// Node ids in store order.
    nodes: Vec<ShapeId>,
    index: HashMap<ShapeId, usize>,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
    /// Parallel group tag per node.
    group_of: Vec<Option<String>>,
    groups: HashMap<String, Vec<usize>>,
}

impl ProtocolGraph {
    /// Build the graph from a shape list.
    pub fn from_shapes(shapes: &[Shape]) -> Self {
        let mut graph = Self::default();

        for shape in shapes {
            let Some(node) = shape.as_protocol_node() else { continue };
            let idx = graph.nodes.len();
            graph.nodes.push(shape.id().clone());
            graph.index.insert(shape.id().clone(), idx);
            graph.group_of.push(node.parallel_group_id.clone());
            if let Some(group) = &node.parallel_group_id {
                graph.groups.entry(group.clone()).or_default().push(idx);
            }
        }
        graph.successors = vec![Vec::new(); graph.nodes.len()];
        graph.predecessors = vec![Vec::new(); graph.nodes.len()];

        let mut seen = HashSet::new();
        let edges = shapes.iter().filter_map(|s| s.connector()).filter_map(|c| c.edge());
        for (from, to) in edges {
            let (Some(&from), Some(&to)) = (graph.index.get(from), graph.index.get(to)) else {
                continue;
            };
            if seen.insert((from, to)) {
                graph.successors[from].push(to);
                graph.predecessors[to].push(from);
            }
        }

        log::debug!(
            "Built protocol graph: {} nodes, {} edges, {} parallel groups",
            graph.nodes.len(),
            seen.len(),
            graph.groups.len()
        );
        graph
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.index.contains_key(id)
    }

    /// Number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.successors.iter().map(Vec::len).sum()
    }

    /// Direct upstream dependencies of a node.
    pub fn predecessors(&self, id: &ShapeId) -> Vec<ShapeId> {
        self.neighbours(id, &self.predecessors)
    }

    /// Direct downstream dependents of a node.
    pub fn successors(&self, id: &ShapeId) -> Vec<ShapeId> {
        self.neighbours(id, &self.successors)
    }

    fn neighbours(&self, id: &ShapeId, adjacency: &[Vec<usize>]) -> Vec<ShapeId> {
        self.index
            .get(id)
            .map(|&idx| adjacency[idx].iter().map(|&n| self.nodes[n].clone()).collect())
            .unwrap_or_default()
    }

    /// Run the batched topological pass. Returns the batches in order and
    /// the per-node visited flags.
    fn batches(&self) -> (Vec<Vec<usize>>, Vec<bool>) {
        let n = self.nodes.len();
        let mut in_degree: Vec<usize> = self.predecessors.iter().map(Vec::len).collect();
        let mut visited = vec![false; n];
        let mut queue: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut batches = Vec::new();

        while !queue.is_empty() {
            let mut batch = Vec::new();
            for idx in std::mem::take(&mut queue) {
                if visited[idx] {
                    continue;
                }
                visited[idx] = true;
                batch.push(idx);

                if let Some(group) = &self.group_of[idx] {
                    for &sibling in &self.groups[group] {
                        if !visited[sibling] {
                            visited[sibling] = true;
                            batch.push(sibling);
                        }
                    }
                }
            }
            if batch.is_empty() {
                continue;
            }

            for &idx in &batch {
                for &succ in &self.successors[idx] {
                    in_degree[succ] = in_degree[succ].saturating_sub(1);
                    if in_degree[succ] == 0 && !visited[succ] {
                        queue.push(succ);
                    }
                }
            }
            batches.push(batch);
        }

        (batches, visited)
    }

    /// Assign 1-based display step numbers.
    pub fn step_numbers(&self) -> StepNumbering {
        let (batches, visited) = self.batches();
        let mut numbering = StepNumbering::default();

        let mut step = 1u32;
        for batch in &batches {
            for &idx in batch {
                numbering.steps.insert(self.nodes[idx].clone(), step);
            }
            step += 1;
        }

        for (idx, _) in visited.iter().enumerate().filter(|(_, v)| !**v) {
            numbering.steps.insert(self.nodes[idx].clone(), step);
            numbering.unresolved.push(self.nodes[idx].clone());
            step += 1;
        }

        if !numbering.unresolved.is_empty() {
            log::warn!(
                "Protocol graph has a cycle: {} step(s) could not be ordered \
                 and were numbered last",
                numbering.unresolved.len()
            );
        }
        numbering
    }

    /// Steps grouped by execution round; nodes within a round may run
    /// concurrently. Unresolved nodes are not included.
    pub fn execution_plan(&self) -> Vec<Vec<ShapeId>> {
        let (batches, _) = self.batches();
        batches
            .into_iter()
            .map(|batch| batch.into_iter().map(|idx| self.nodes[idx].clone()).collect())
            .collect()
    }
}

/// Convenience wrapper: number the protocol nodes of a shape list.
pub fn step_numbers(shapes: &[Shape]) -> StepNumbering {
    ProtocolGraph::from_shapes(shapes).step_numbers()
}

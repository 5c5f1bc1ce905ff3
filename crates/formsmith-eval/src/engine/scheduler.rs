use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::graph::{DependencyGraph, NodeId};
use formsmith_common::CycleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Colour {
    Unvisited,
    InProgress,
    Done,
}

pub(crate) struct Scheduler<'a> {
    graph: &'a DependencyGraph,
}

impl<'a> Scheduler<'a> {
    pub(crate) fn new(graph: &'a DependencyGraph) -> Self {
        Self { graph }
    }

    /// Evaluation order of the derived nodes, or the first cycle found.
    pub(crate) fn create_schedule(&self) -> Result<Vec<NodeId>, CycleError> {
        // 1. Reject cycles with a three-colour DFS in field order
        self.detect_cycle()?;

        // 2. Order the acyclic graph with Kahn's algorithm
        Ok(self.topological_order())
    }

    fn detect_cycle(&self) -> Result<(), CycleError> {
        let n = self.graph.len();
        let mut colour = vec![Colour::Unvisited; n];
        let mut path = Vec::new();

        for start in 0..n {
            if colour[start] == Colour::Unvisited {
                self.visit(NodeId(start as u32), &mut colour, &mut path)?;
            }
        }
        Ok(())
    }

    fn visit(
        &self,
        node: NodeId,
        colour: &mut [Colour],
        path: &mut Vec<NodeId>,
    ) -> Result<(), CycleError> {
        colour[node.as_index()] = Colour::InProgress;
        path.push(node);

        for &child in &self.graph.nodes()[node.as_index()].children {
            match colour[child.as_index()] {
                Colour::Unvisited => self.visit(child, colour, path)?,
                Colour::InProgress => {
                    // Back-edge: the cycle is the path suffix starting at `child`.
                    let from = path.iter().position(|&n| n == child).unwrap_or(0);
                    let ids = path[from..]
                        .iter()
                        .map(|&n| self.graph.field_id(n).to_string())
                        .collect();
                    return Err(CycleError::new(ids));
                }
                Colour::Done => {}
            }
        }

        path.pop();
        colour[node.as_index()] = Colour::Done;
        Ok(())
    }

    /// Kahn's algorithm; among ready nodes the one earliest in field order
    /// goes first.
    fn topological_order(&self) -> Vec<NodeId> {
        let nodes = self.graph.nodes();
        let mut in_degree: Vec<usize> = nodes.iter().map(|n| n.parents.len()).collect();
        let mut ready: BinaryHeap<Reverse<NodeId>> = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.parents.is_empty())
            .map(|(i, _)| Reverse(NodeId(i as u32)))
            .collect();

        let mut order = Vec::with_capacity(nodes.len());
        while let Some(Reverse(node)) = ready.pop() {
            let entry = &nodes[node.as_index()];
            if entry.derived {
                order.push(node);
            }
            for &child in &entry.children {
                in_degree[child.as_index()] -= 1;
                if in_degree[child.as_index()] == 0 {
                    ready.push(Reverse(child));
                }
            }
        }
        order
    }
}

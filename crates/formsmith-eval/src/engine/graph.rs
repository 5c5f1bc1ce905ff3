use formsmith_common::CycleError;
use formsmith_schema::FormSchema;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use super::scheduler::Scheduler;

/// Index of a node inside a [`DependencyGraph`].
///
/// Nodes are numbered in schema field order, so comparing ids compares field
/// positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub fn as_index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) field_id: String,
    pub(crate) derived: bool,
    /// Fields this node reads from (edges point parent -> child).
    pub(crate) parents: SmallVec<[NodeId; 4]>,
    pub(crate) children: SmallVec<[NodeId; 4]>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error(transparent)]
    Cycle(#[from] CycleError),
    #[error("field `{field}` references unknown parent `{parent}`")]
    UnknownParent { field: String, parent: String },
}

/// Dependency graph among the derived fields of one schema snapshot.
///
/// Built once per schema change and never mutated; rebuild it when the
/// schema changes.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
    index: FxHashMap<String, NodeId>,
    /// Derived nodes, parents before children, ties by field order.
    order: Vec<NodeId>,
}

impl DependencyGraph {
    /// Build the graph for `schema`, failing on unknown parents and cycles.
    pub fn build(schema: &FormSchema) -> Result<Self, GraphError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("graph_build", fields = schema.fields.len()).entered();

        let known: FxHashSet<&str> = schema.fields.iter().map(|f| f.id.as_str()).collect();

        let mut referenced: FxHashSet<&str> = FxHashSet::default();
        for field in schema.derived_fields() {
            for parent in field.parent_ids() {
                if !known.contains(parent.as_str()) {
                    return Err(GraphError::UnknownParent {
                        field: field.id.clone(),
                        parent: parent.clone(),
                    });
                }
                referenced.insert(parent.as_str());
            }
        }

        // Duplicate field ids share one node; the first definition wins.
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut nodes = Vec::new();
        let mut index = FxHashMap::default();
        for field in &schema.fields {
            if !seen.insert(field.id.as_str()) {
                continue;
            }
            let derived = field.is_derived();
            if derived || referenced.contains(field.id.as_str()) {
                index.insert(field.id.clone(), NodeId(nodes.len() as u32));
                nodes.push(Node {
                    field_id: field.id.clone(),
                    derived,
                    parents: SmallVec::new(),
                    children: SmallVec::new(),
                });
            }
        }

        let mut wired: FxHashSet<NodeId> = FxHashSet::default();
        for field in schema.derived_fields() {
            let Some(&child) = index.get(&field.id) else {
                continue;
            };
            if !nodes[child.as_index()].derived || !wired.insert(child) {
                continue;
            }
            for parent in field.parent_ids() {
                let Some(&p) = index.get(parent) else {
                    continue;
                };
                if nodes[child.as_index()].parents.contains(&p) {
                    continue;
                }
                nodes[child.as_index()].parents.push(p);
                nodes[p.as_index()].children.push(child);
            }
        }

        let mut graph = DependencyGraph {
            nodes,
            index,
            order: Vec::new(),
        };
        let order = Scheduler::new(&graph).create_schedule()?;
        graph.order = order;
        Ok(graph)
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_id(&self, field_id: &str) -> Option<NodeId> {
        self.index.get(field_id).copied()
    }

    pub fn field_id(&self, node: NodeId) -> &str {
        &self.nodes[node.as_index()].field_id
    }

    /// Whether `field_id` takes part in any derivation.
    pub fn contains(&self, field_id: &str) -> bool {
        self.index.contains_key(field_id)
    }

    pub fn is_derived(&self, field_id: &str) -> bool {
        self.node_id(field_id)
            .is_some_and(|n| self.nodes[n.as_index()].derived)
    }

    /// Derived fields in evaluation order.
    pub fn topological_order(&self) -> Vec<&str> {
        self.order.iter().map(|&n| self.field_id(n)).collect()
    }

    /// Direct parents of `field_id`, in formula declaration order.
    pub fn parents(&self, field_id: &str) -> Vec<&str> {
        self.node_id(field_id)
            .map(|n| {
                self.nodes[n.as_index()]
                    .parents
                    .iter()
                    .map(|&p| self.field_id(p))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fields that read `field_id` directly.
    pub fn dependents(&self, field_id: &str) -> Vec<&str> {
        self.node_id(field_id)
            .map(|n| {
                self.nodes[n.as_index()]
                    .children
                    .iter()
                    .map(|&c| self.field_id(c))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Derived fields transitively reachable from `field_id`, in evaluation
    /// order. `field_id` itself is not included.
    pub fn affected_by(&self, field_id: &str) -> Vec<&str> {
        let Some(start) = self.node_id(field_id) else {
            return Vec::new();
        };

        let mut reached: FxHashSet<NodeId> = FxHashSet::default();
        let mut stack: SmallVec<[NodeId; 16]> = SmallVec::new();
        stack.push(start);
        while let Some(n) = stack.pop() {
            for &child in &self.nodes[n.as_index()].children {
                if reached.insert(child) {
                    stack.push(child);
                }
            }
        }

        self.order
            .iter()
            .filter(|&&n| n != start && reached.contains(&n))
            .map(|&n| self.field_id(n))
            .collect()
    }
}

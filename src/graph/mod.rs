//! Package dependency graph.
//!
//! Nodes live in a single graph-owned arena; dependency and dependent edges
//! are stored as indices into it, so back-references never own anything and
//! cycle detection is a reachability walk over indices.

pub mod traversal;

pub use traversal::{order, OrderingMode};

use crate::core::{DockhandError, DockhandResult};
use crate::package::PackageId;
use std::collections::{BTreeSet, HashMap};

/// Index of a node in the graph's arena
pub type NodeId = usize;

/// Node in the package graph
#[derive(Debug, Clone)]
pub struct PackageGraphNode {
    pub package: PackageId,
    pub resolved_version: String,
    /// Packages this node depends on
    pub dependencies: BTreeSet<NodeId>,
    /// Inverse of `dependencies`, maintained incrementally by `add_edge`
    pub dependents: BTreeSet<NodeId>,
}

/// A flat entry from the external resolver: one package, its concrete
/// version, and the names of its direct dependencies.
#[derive(Debug, Clone)]
pub struct ResolvedPackage {
    pub package: PackageId,
    pub version: String,
    pub dependencies: Vec<String>,
}

/// Directed acyclic graph of package identities connected by dependency edges
#[derive(Debug, Clone, Default)]
pub struct PackageGraph {
    nodes: Vec<PackageGraphNode>,
    index: HashMap<String, NodeId>,
}

impl PackageGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the graph. Adding an existing name is a no-op that
    /// returns the existing node's id (rebuilds from a flat resolver list
    /// must be idempotent).
    pub fn add_node(&mut self, package: PackageId, resolved_version: impl Into<String>) -> NodeId {
        let key = package.key();
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(PackageGraphNode {
            package,
            resolved_version: resolved_version.into(),
            dependencies: BTreeSet::new(),
            dependents: BTreeSet::new(),
        });
        self.index.insert(key, id);
        id
    }

    /// Add a dependency edge from `dependent` to `dependency`.
    ///
    /// Fails with `CycleDetected` if the edge would create a path back to
    /// the dependent. Re-adding an existing edge is a no-op.
    pub fn add_edge(&mut self, dependent: NodeId, dependency: NodeId) -> DockhandResult<()> {
        if dependent >= self.nodes.len() || dependency >= self.nodes.len() {
            return Err(DockhandError::Package(
                "Edge references a node not present in the graph".to_string(),
            ));
        }
        if self.nodes[dependent].dependencies.contains(&dependency) {
            return Ok(());
        }
        if dependent == dependency || self.reachable(dependency, dependent) {
            return Err(DockhandError::CycleDetected(format!(
                "{} -> {}",
                self.nodes[dependent].package.name, self.nodes[dependency].package.name
            )));
        }
        self.nodes[dependent].dependencies.insert(dependency);
        self.nodes[dependency].dependents.insert(dependent);
        Ok(())
    }

    /// Depth-first reachability from `from` to `to` along dependency edges
    fn reachable(&self, from: NodeId, to: NodeId) -> bool {
        let mut stack = vec![from];
        let mut visited = BTreeSet::new();
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if visited.insert(id) {
                stack.extend(self.nodes[id].dependencies.iter().copied());
            }
        }
        false
    }

    /// Look up a node by package name (case-insensitive)
    pub fn get_node(&self, name: &str) -> Option<&PackageGraphNode> {
        self.index
            .get(&name.to_lowercase())
            .map(|&id| &self.nodes[id])
    }

    /// Look up a node's arena index by package name
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.index.get(&name.to_lowercase()).copied()
    }

    /// All nodes, in arena order
    pub fn nodes(&self) -> &[PackageGraphNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Build a graph from the external resolver's flat dependency list.
    ///
    /// A dependency name with no entry of its own is rejected: the resolver
    /// must emit a closed node set.
    pub fn from_resolved(resolved: &[ResolvedPackage]) -> DockhandResult<Self> {
        let mut graph = Self::new();
        for entry in resolved {
            graph.add_node(entry.package.clone(), entry.version.clone());
        }
        for entry in resolved {
            let from = graph
                .node_id(&entry.package.name)
                .ok_or_else(|| DockhandError::Package(entry.package.name.clone()))?;
            for dep in &entry.dependencies {
                let to = graph.node_id(dep).ok_or_else(|| {
                    DockhandError::Resolution(format!(
                        "'{}' depends on '{}' which the resolver did not produce",
                        entry.package.name, dep
                    ))
                })?;
                graph.add_edge(from, to)?;
            }
        }
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> PackageId {
        PackageId::new(name, "")
    }

    #[test]
    fn test_add_node_idempotent() {
        let mut graph = PackageGraph::new();
        let a = graph.add_node(id("pkg"), "1.0.0");
        let b = graph.add_node(id("PKG"), "2.0.0");
        assert_eq!(a, b);
        assert_eq!(graph.len(), 1);
        // First insertion wins
        assert_eq!(graph.get_node("pkg").unwrap().resolved_version, "1.0.0");
    }

    #[test]
    fn test_add_edge_maintains_inverse() {
        let mut graph = PackageGraph::new();
        let a = graph.add_node(id("a"), "1.0.0");
        let b = graph.add_node(id("b"), "1.0.0");
        graph.add_edge(a, b).unwrap();

        assert!(graph.get_node("a").unwrap().dependencies.contains(&b));
        assert!(graph.get_node("b").unwrap().dependents.contains(&a));
    }

    #[test]
    fn test_add_edge_idempotent() {
        let mut graph = PackageGraph::new();
        let a = graph.add_node(id("a"), "1.0.0");
        let b = graph.add_node(id("b"), "1.0.0");
        graph.add_edge(a, b).unwrap();
        graph.add_edge(a, b).unwrap();
        assert_eq!(graph.get_node("a").unwrap().dependencies.len(), 1);
    }

    #[test]
    fn test_self_edge_is_a_cycle() {
        let mut graph = PackageGraph::new();
        let a = graph.add_node(id("a"), "1.0.0");
        let result = graph.add_edge(a, a);
        assert!(matches!(result, Err(DockhandError::CycleDetected(_))));
    }

    #[test]
    fn test_cycle_detected_on_back_edge() {
        let mut graph = PackageGraph::new();
        let a = graph.add_node(id("a"), "1.0.0");
        let b = graph.add_node(id("b"), "1.0.0");
        let c = graph.add_node(id("c"), "1.0.0");
        graph.add_edge(a, b).unwrap();
        graph.add_edge(b, c).unwrap();

        let result = graph.add_edge(c, a);
        assert!(matches!(result, Err(DockhandError::CycleDetected(_))));
        // The failed edge must not be half-inserted
        assert!(graph.get_node("c").unwrap().dependencies.is_empty());
        assert!(graph.get_node("a").unwrap().dependents.is_empty());
    }

    #[test]
    fn test_from_resolved_builds_closed_graph() {
        let resolved = vec![
            ResolvedPackage {
                package: id("b"),
                version: "2.0.0".to_string(),
                dependencies: vec!["a".to_string()],
            },
            ResolvedPackage {
                package: id("a"),
                version: "1.0.0".to_string(),
                dependencies: vec![],
            },
        ];
        let graph = PackageGraph::from_resolved(&resolved).unwrap();
        assert_eq!(graph.len(), 2);
        let b = graph.get_node("b").unwrap();
        assert_eq!(b.dependencies.len(), 1);
    }

    #[test]
    fn test_from_resolved_rejects_dangling_dependency() {
        let resolved = vec![ResolvedPackage {
            package: id("b"),
            version: "2.0.0".to_string(),
            dependencies: vec!["missing".to_string()],
        }];
        let result = PackageGraph::from_resolved(&resolved);
        assert!(matches!(result, Err(DockhandError::Resolution(_))));
    }

    #[test]
    fn test_from_resolved_cycle_fails() {
        let resolved = vec![
            ResolvedPackage {
                package: id("a"),
                version: "1.0.0".to_string(),
                dependencies: vec!["b".to_string()],
            },
            ResolvedPackage {
                package: id("b"),
                version: "1.0.0".to_string(),
                dependencies: vec!["c".to_string()],
            },
            ResolvedPackage {
                package: id("c"),
                version: "1.0.0".to_string(),
                dependencies: vec!["a".to_string()],
            },
        ];
        let result = PackageGraph::from_resolved(&resolved);
        assert!(matches!(result, Err(DockhandError::CycleDetected(_))));
    }
}

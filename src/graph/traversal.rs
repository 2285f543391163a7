//! Deterministic linear orderings over a package graph.
//!
//! The graph itself never orders anything; installs and uninstalls need
//! different orderings over the same graph, so ordering is a read-only query.

use super::{NodeId, PackageGraph};
use crate::core::{DockhandError, DockhandResult};
use crate::package::PackageId;
use std::collections::BTreeSet;

/// Direction of a graph ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingMode {
    /// Dependents before dependencies — the uninstall order
    TopToBottom,
    /// Dependencies before dependents — the install order
    BottomToTop,
    /// Only nodes with zero dependents (explicitly requested packages)
    TopPackagesOnly,
}

/// Compute a deterministic ordering of the graph's packages.
///
/// Ties among ready nodes are broken by ascending package name. Cycles are
/// re-validated here even though edge insertion should have prevented them;
/// a leftover strongly-connected remainder fails with `CycleDetected`
/// naming the involved packages.
pub fn order(graph: &PackageGraph, mode: OrderingMode) -> DockhandResult<Vec<PackageId>> {
    match mode {
        OrderingMode::BottomToTop => kahn(graph, Direction::Dependencies),
        OrderingMode::TopToBottom => kahn(graph, Direction::Dependents),
        OrderingMode::TopPackagesOnly => {
            let mut tops: Vec<&PackageId> = graph
                .nodes()
                .iter()
                .filter(|n| n.dependents.is_empty())
                .map(|n| &n.package)
                .collect();
            tops.sort();
            Ok(tops.into_iter().cloned().collect())
        }
    }
}

enum Direction {
    /// A node is ready once all its dependencies have been emitted
    Dependencies,
    /// A node is ready once all its dependents have been emitted
    Dependents,
}

fn kahn(graph: &PackageGraph, direction: Direction) -> DockhandResult<Vec<PackageId>> {
    let nodes = graph.nodes();
    let mut remaining: Vec<usize> = (0..nodes.len())
        .map(|id| match direction {
            Direction::Dependencies => nodes[id].dependencies.len(),
            Direction::Dependents => nodes[id].dependents.len(),
        })
        .collect();

    // Ready set keyed by (name, id) so ties break by ascending name
    let mut ready: BTreeSet<(String, NodeId)> = (0..nodes.len())
        .filter(|&id| remaining[id] == 0)
        .map(|id| (nodes[id].package.key(), id))
        .collect();

    let mut ordered = Vec::with_capacity(nodes.len());
    while let Some(entry) = ready.iter().next().cloned() {
        ready.remove(&entry);
        let (_, id) = entry;
        ordered.push(nodes[id].package.clone());
        let downstream = match direction {
            Direction::Dependencies => &nodes[id].dependents,
            Direction::Dependents => &nodes[id].dependencies,
        };
        for &next in downstream {
            remaining[next] -= 1;
            if remaining[next] == 0 {
                ready.insert((nodes[next].package.key(), next));
            }
        }
    }

    if ordered.len() != nodes.len() {
        let mut stuck: Vec<&str> = (0..nodes.len())
            .filter(|&id| remaining[id] > 0)
            .map(|id| nodes[id].package.name.as_str())
            .collect();
        stuck.sort_unstable();
        return Err(DockhandError::CycleDetected(stuck.join(", ")));
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> PackageId {
        PackageId::new(name, "")
    }

    /// a <- b <- c, plus d depending on a
    fn diamond_free_graph() -> PackageGraph {
        let mut graph = PackageGraph::new();
        let a = graph.add_node(id("a"), "1.0.0");
        let b = graph.add_node(id("b"), "1.0.0");
        let c = graph.add_node(id("c"), "1.0.0");
        let d = graph.add_node(id("d"), "1.0.0");
        graph.add_edge(b, a).unwrap();
        graph.add_edge(c, b).unwrap();
        graph.add_edge(d, a).unwrap();
        graph
    }

    fn position(ordered: &[PackageId], name: &str) -> usize {
        ordered.iter().position(|p| p.name == name).unwrap()
    }

    #[test]
    fn test_bottom_to_top_dependencies_first() {
        let graph = diamond_free_graph();
        let ordered = order(&graph, OrderingMode::BottomToTop).unwrap();
        assert_eq!(ordered.len(), 4);
        assert!(position(&ordered, "a") < position(&ordered, "b"));
        assert!(position(&ordered, "b") < position(&ordered, "c"));
        assert!(position(&ordered, "a") < position(&ordered, "d"));
    }

    #[test]
    fn test_top_to_bottom_dependents_first() {
        let graph = diamond_free_graph();
        let ordered = order(&graph, OrderingMode::TopToBottom).unwrap();
        assert!(position(&ordered, "c") < position(&ordered, "b"));
        assert!(position(&ordered, "b") < position(&ordered, "a"));
        assert!(position(&ordered, "d") < position(&ordered, "a"));
    }

    #[test]
    fn test_order_is_deterministic() {
        let graph = diamond_free_graph();
        let first = order(&graph, OrderingMode::BottomToTop).unwrap();
        let second = order(&graph, OrderingMode::BottomToTop).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_ties_break_by_ascending_name() {
        let mut graph = PackageGraph::new();
        graph.add_node(id("zeta"), "1.0.0");
        graph.add_node(id("alpha"), "1.0.0");
        graph.add_node(id("mid"), "1.0.0");
        let ordered = order(&graph, OrderingMode::BottomToTop).unwrap();
        let names: Vec<&str> = ordered.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_top_packages_only() {
        let graph = diamond_free_graph();
        let tops = order(&graph, OrderingMode::TopPackagesOnly).unwrap();
        let names: Vec<&str> = tops.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["c", "d"]);
    }

    #[test]
    fn test_empty_graph_orders_empty() {
        let graph = PackageGraph::new();
        assert!(order(&graph, OrderingMode::BottomToTop).unwrap().is_empty());
        assert!(order(&graph, OrderingMode::TopPackagesOnly)
            .unwrap()
            .is_empty());
    }
}

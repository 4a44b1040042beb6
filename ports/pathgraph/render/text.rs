/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Terminal listing of a graph.

use std::fmt::Write;

use crate::graph::Graph;
use crate::pathfinding::Path;
use crate::util::format_path;

/// Adjacency listing of `graph`. Nodes and edges on `path` are marked with `*`.
pub fn describe(graph: &Graph, path: Option<&Path>) -> String {
    let mut out = String::new();
    if graph.node_count() == 0 {
        out.push_str("Graph is empty\n");
        return out;
    }

    let _ = writeln!(
        out,
        "Nodes: {}, edges: {}",
        graph.node_count(),
        graph.edge_count()
    );

    let on_path = |id| path.is_some_and(|p| p.contains(id));
    let edge_on_path = |a, b| path.is_some_and(|p| p.contains_edge(a, b));

    for id in graph.node_ids() {
        let marker = if on_path(id) { '*' } else { ' ' };
        let neighbors = graph
            .neighbor_ids(id)
            .into_iter()
            .map(|n| {
                let weight = graph.edge_weight(id, n).unwrap_or_default();
                let mark = if edge_on_path(id, n) { "*" } else { "" };
                format!("{n} (w={weight}){mark}")
            })
            .collect::<Vec<_>>();
        if neighbors.is_empty() {
            let _ = writeln!(out, "{marker} {id}: -");
        } else {
            let _ = writeln!(out, "{marker} {id}: {}", neighbors.join(", "));
        }
    }

    match path {
        Some(p) if p.is_empty() => out.push_str("Path: none\n"),
        Some(p) => {
            let _ = writeln!(out, "Path: {} (cost {})", format_path(&p.nodes), p.cost);
        },
        None => {},
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Graph {
        let mut graph = Graph::new();
        for _ in 0..4 {
            graph.add_node();
        }
        graph.add_edge(0, 1, 1).unwrap();
        graph.add_edge(1, 2, 2).unwrap();
        graph
    }

    #[test]
    fn test_describe_empty() {
        assert_eq!(describe(&Graph::new(), None), "Graph is empty\n");
    }

    #[test]
    fn test_describe_lists_adjacency() {
        let text = describe(&sample(), None);
        assert!(text.starts_with("Nodes: 4, edges: 2\n"));
        assert!(text.contains("  1: 0 (w=1), 2 (w=2)\n"));
        assert!(text.contains("  3: -\n"));
        assert!(!text.contains('*'));
        assert!(!text.contains("Path:"));
    }

    #[test]
    fn test_describe_marks_path() {
        let path = Path {
            nodes: vec![0, 1, 2],
            cost: 3.0,
            expanded: 2,
        };
        let text = describe(&sample(), Some(&path));
        assert!(text.contains("* 0: 1 (w=1)*\n"));
        assert!(text.contains("* 1: 0 (w=1)*, 2 (w=2)*\n"));
        assert!(text.contains("  3: -\n"));
        assert!(text.contains("Path: 0 -> 1 -> 2 (cost 3)\n"));
    }

    #[test]
    fn test_describe_unreachable_path() {
        let text = describe(&sample(), Some(&Path::unreachable(1)));
        assert!(text.contains("Path: none\n"));
        assert!(!text.contains('*'));
    }
}

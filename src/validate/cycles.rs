//! Cycle detection over the `blocked_by` relation.
//!
//! Iterative depth-first search with an explicit colour map and work stack,
//! so very deep dependency chains never touch the call stack.

use crate::plan::TaskGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Not visited yet.
    White,
    /// On the current DFS stack.
    Grey,
    /// Fully explored.
    Black,
}

/// Returns every cycle reachable in the graph.
///
/// Each cycle is the path from the first node of the cycle, through the
/// stack, back to itself (`["A", "B", "C", "A"]`). Roots are scanned in
/// declaration order. Self edges and edges to unknown tasks are skipped;
/// they are reported by their own checks.
#[must_use]
pub fn find_cycles(graph: &TaskGraph) -> Vec<Vec<String>> {
    let tasks = graph.tasks();
    let adjacency: Vec<Vec<usize>> = tasks
        .iter()
        .enumerate()
        .map(|(pos, task)| {
            let mut deps: Vec<usize> = Vec::with_capacity(task.blocked_by.len());
            for dep in &task.blocked_by {
                if let Some(dep_pos) = graph.position(dep) {
                    if dep_pos != pos && !deps.contains(&dep_pos) {
                        deps.push(dep_pos);
                    }
                }
            }
            deps
        })
        .collect();

    let mut color = vec![Color::White; tasks.len()];
    let mut cycles = Vec::new();

    for root in 0..tasks.len() {
        if color[root] != Color::White {
            continue;
        }
        color[root] = Color::Grey;
        // (node, index of the next dependency to explore)
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let next = adjacency[node].get(frame.1).copied();
            frame.1 += 1;

            let Some(dep) = next else {
                color[node] = Color::Black;
                stack.pop();
                continue;
            };

            match color[dep] {
                Color::White => {
                    color[dep] = Color::Grey;
                    stack.push((dep, 0));
                }
                Color::Grey => {
                    let start = stack.iter().position(|&(n, _)| n == dep).unwrap_or(0);
                    let mut path: Vec<String> =
                        stack[start..].iter().map(|&(n, _)| tasks[n].id.clone()).collect();
                    path.push(tasks[dep].id.clone());
                    cycles.push(path);
                }
                Color::Black => {}
            }
        }
    }

    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::fixtures::graph;

    #[test]
    fn three_node_cycle_returns_to_start() {
        let g = graph(&[("A", &["B"]), ("B", &["C"]), ("C", &["A"])]);
        let cycles = find_cycles(&g);
        assert_eq!(cycles, vec![vec!["A", "B", "C", "A"]]);
    }

    #[test]
    fn acyclic_diamond_has_no_cycles() {
        let g = graph(&[("a", &[]), ("b", &["a"]), ("c", &["a"]), ("d", &["b", "c"])]);
        assert!(find_cycles(&g).is_empty());
    }

    #[test]
    fn reports_disjoint_cycles_from_every_root() {
        let g = graph(&[("a", &["b"]), ("b", &["a"]), ("x", &[]), ("y", &["z"]), ("z", &["y"])]);
        let cycles = find_cycles(&g);
        assert_eq!(cycles, vec![vec!["a", "b", "a"], vec!["y", "z", "y"]]);
    }

    #[test]
    fn ignores_self_and_dangling_edges() {
        let g = graph(&[("a", &["a", "ghost"]), ("b", &["a"])]);
        assert!(find_cycles(&g).is_empty());
    }

    #[test]
    fn long_chain_does_not_recurse() {
        let ids: Vec<String> = (0..50_000).map(|i| format!("t{i}")).collect();
        let deps: Vec<Vec<&str>> = (0..ids.len())
            .map(|i| if i == 0 { Vec::new() } else { vec![ids[i - 1].as_str()] })
            .collect();
        let specs: Vec<(&str, &[&str])> =
            ids.iter().zip(&deps).map(|(id, d)| (id.as_str(), d.as_slice())).collect();
        let g = graph(&specs);
        assert!(find_cycles(&g).is_empty());
    }
}

//! Directed graph helpers over table names.

use std::collections::{HashMap, HashSet};

/// Build adjacency lookup: vertex -> outgoing targets, in edge order.
pub fn build_adjacency<'a>(edges: &[(&'a str, &'a str)]) -> HashMap<&'a str, Vec<&'a str>> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for &(from, to) in edges {
        adjacency.entry(from).or_default().push(to);
    }
    adjacency
}

/// Find simple cycles by DFS from every vertex in `vertices` order.
///
/// A cycle is reported as the vertex sequence starting at the vertex the
/// DFS started from. Every rotation of one cycle is reported once, at its
/// first discovery. Self-loops are not cycles.
pub fn find_cycles<'a>(vertices: &[&'a str], edges: &[(&'a str, &'a str)]) -> Vec<Vec<String>> {
    let adjacency = build_adjacency(edges);
    let mut found: Vec<Vec<&str>> = Vec::new();

    for &start in vertices {
        let mut visited: HashSet<&str> = HashSet::from([start]);
        let mut path = Vec::new();
        walk(start, start, &adjacency, &mut path, &mut visited, &mut found);
    }

    let mut seen: HashSet<Vec<&str>> = HashSet::new();
    found
        .into_iter()
        .filter(|cycle| seen.insert(normalize_rotation(cycle)))
        .map(|cycle| cycle.into_iter().map(str::to_string).collect())
        .collect()
}

fn walk<'a>(
    start: &'a str,
    current: &'a str,
    adjacency: &HashMap<&'a str, Vec<&'a str>>,
    path: &mut Vec<&'a str>,
    visited: &mut HashSet<&'a str>,
    found: &mut Vec<Vec<&'a str>>,
) {
    let Some(targets) = adjacency.get(current) else {
        return;
    };

    for &next in targets {
        if next == start && !path.is_empty() {
            let mut cycle = path.clone();
            cycle.push(current);
            found.push(cycle);
            continue;
        }
        if !visited.insert(next) {
            continue;
        }
        path.push(current);
        walk(start, next, adjacency, path, visited, found);
        path.pop();
        visited.remove(next);
    }
}

/// Rotate `cycle` so it begins at its smallest vertex.
fn normalize_rotation<'a>(cycle: &[&'a str]) -> Vec<&'a str> {
    let pivot = cycle
        .iter()
        .enumerate()
        .min_by_key(|&(_, v)| *v)
        .map_or(0, |(i, _)| i);
    cycle[pivot..].iter().chain(&cycle[..pivot]).copied().collect()
}

//! Path extension with false-positive branch suppression.
//!
//! A membership filter admits phantom k-mers, and each phantom shows up as a
//! short dead-end branch hanging off the real graph. Before extension
//! follows or stops at a fork, every candidate neighbour is probed with a
//! bounded look-ahead: only neighbours that head a path of at least k + 1
//! vertices count as true branches, which rejects nearly all phantom tips.

use crate::graph::{Direction, ImplicitDbg, Vertex};
use crate::path::Path;
use ahash::AHashSet;

/// Minimum onward path length for a branch to be considered real.
#[inline]
pub fn min_branch_len(k: usize) -> usize {
    k + 1
}

/// True iff a path of at least `depth` vertices starts at `start` and runs
/// in `dir`. A revisit of any vertex already seen by this probe is a cycle
/// and counts as success.
fn look_ahead(
    graph: &ImplicitDbg<'_>,
    start: &Vertex,
    dir: Direction,
    depth: usize,
    visited: &mut AHashSet<Vertex>,
) -> bool {
    if depth <= 1 {
        return true;
    }
    for neighbor in graph.neighbors(start, dir) {
        if !visited.insert(neighbor.clone()) {
            return true;
        }
        if look_ahead(graph, &neighbor, dir, depth - 1, visited) {
            return true;
        }
    }
    false
}

/// The d-neighbours of `v` that head a path of at least `min_len` vertices
/// in `dir`. Neighbours failing the probe are presumed filter false
/// positives and dropped.
pub fn true_branches(
    graph: &ImplicitDbg<'_>,
    v: &Vertex,
    dir: Direction,
    min_len: usize,
) -> Vec<Vertex> {
    graph
        .neighbors(v, dir)
        .into_iter()
        .filter(|w| {
            let mut visited = AHashSet::new();
            visited.insert(w.clone());
            look_ahead(graph, w, dir, min_len, &mut visited)
        })
        .collect()
}

/// Why an extension stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtendResult {
    /// No true neighbour remained.
    DeadEnd,
    /// Two or more true neighbours: a real fork.
    Branch,
    /// The sole true neighbour was already on the path.
    Cycle,
}

/// Walk `path` in `dir` until a dead end, a real branch, or a cycle.
///
/// The visited set is seeded with the path's current vertices, so a walk
/// that returns to the path stops rather than looping forever.
pub fn extend_path(
    path: &mut Path,
    dir: Direction,
    graph: &ImplicitDbg<'_>,
    min_len: usize,
) -> ExtendResult {
    let mut visited: AHashSet<Vertex> = path.iter().cloned().collect();
    loop {
        let u = path
            .terminal(dir)
            .expect("extension needs a non-empty seed path")
            .clone();
        let branches = true_branches(graph, &u, dir, min_len);
        match branches.as_slice() {
            [] => return ExtendResult::DeadEnd,
            [w] => {
                if visited.contains(w) {
                    return ExtendResult::Cycle;
                }
                visited.insert(w.clone());
                path.push(dir, w.clone());
            }
            _ => return ExtendResult::Branch,
        }
    }
}

/// Chop-then-extend for a read's terminal sub-path.
///
/// A read endpoint may itself sit on a phantom k-mer, which would stall
/// extension at an artificial dead end one step in. Trimming
/// min(|p|-1, min_len) vertices from the end being extended backs the seed
/// off any such tip before walking outward.
pub fn extend_with_chop(
    path: &mut Path,
    dir: Direction,
    graph: &ImplicitDbg<'_>,
    min_len: usize,
) -> ExtendResult {
    let chop = (path.len() - 1).min(min_len);
    path.chop(dir, chop);
    extend_path(path, dir, graph, min_len)
}

/// Split a path at internal branching vertices.
///
/// A vertex with more than one true in-neighbour or more than one true
/// out-neighbour closes the current sub-path and opens the next one, with
/// the branching vertex duplicated across the boundary. A trailing
/// sub-path holding only a duplicated boundary vertex is dropped; an
/// unsplit single-vertex path is kept so that length-k reads still seed
/// extension.
pub fn split_path(path: &Path, graph: &ImplicitDbg<'_>, min_len: usize) -> Vec<Path> {
    let mut out = Vec::new();
    let mut current = Path::new();
    for v in path.iter() {
        current.push_back(v.clone());
        let in_degree = true_branches(graph, v, Direction::Reverse, min_len).len();
        let out_degree = true_branches(graph, v, Direction::Forward, min_len).len();
        if in_degree > 1 || out_degree > 1 {
            out.push(std::mem::take(&mut current));
            current.push_back(v.clone());
        }
    }
    if out.is_empty() {
        out.push(current);
    } else if current.len() > 1 {
        out.push(current);
    }
    out
}

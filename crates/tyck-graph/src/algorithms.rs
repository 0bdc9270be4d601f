//! Cycle-safe graph algorithms.
//!
//! All walks honor the declared traversal direction of each relation and,
//! unless a filter overrides it, only follow edges whose cache state is
//! `LinkExists` (facts and memoized positive results).

use std::rc::Rc;

use fixedbitset::FixedBitSet;
use tyck_common::TypeHandle;

use crate::edge::{EdgeCacheState, RelationMask, TypeEdge};
use crate::graph::TypeGraph;

/// Predicate deciding whether a walk may use an edge.
pub type EdgeFilter<'a> = &'a dyn Fn(&TypeEdge) -> bool;

fn default_filter(edge: &TypeEdge) -> bool {
    edge.caching() == EdgeCacheState::LinkExists
}

fn usable(edge: &TypeEdge, mask: RelationMask, filter: Option<EdgeFilter<'_>>) -> bool {
    if !mask.contains(edge.relation.mask()) {
        return false;
    }
    match filter {
        Some(f) => f(edge),
        None => default_filter(edge),
    }
}

/// Edges leading away from `handle` under `mask` and `filter`, paired with
/// the neighbor they reach.
fn neighbors(
    graph: &TypeGraph,
    handle: TypeHandle,
    mask: RelationMask,
    filter: Option<EdgeFilter<'_>>,
) -> Vec<(Rc<TypeEdge>, TypeHandle)> {
    let mut result = Vec::new();
    for edge in graph
        .outgoing_edges(handle)
        .into_iter()
        .chain(graph.incoming_edges(handle))
    {
        if !usable(&edge, mask, filter) {
            continue;
        }
        if let Some(next) = edge.neighbor_of(handle) {
            result.push((edge, next));
        }
    }
    result
}

/// Every type reachable from `start` over the masked relations, excluding
/// `start` itself unless a cycle leads back to it.
#[must_use]
pub fn collect_reachable(
    graph: &TypeGraph,
    start: TypeHandle,
    mask: RelationMask,
    filter: Option<EdgeFilter<'_>>,
) -> Vec<TypeHandle> {
    let mut visited = FixedBitSet::with_capacity(graph.arena_len());
    let mut result = Vec::new();
    let mut work = vec![start];
    visited.insert(start.index());
    while let Some(current) = work.pop() {
        for (_, next) in neighbors(graph, current, mask, filter) {
            if !visited.put(next.index()) {
                result.push(next);
                work.push(next);
            }
        }
    }
    result
}

/// Whether a path of usable edges leads from `from` to `to`.
#[must_use]
pub fn exists_edge_path(
    graph: &TypeGraph,
    from: TypeHandle,
    to: TypeHandle,
    mask: RelationMask,
    filter: Option<EdgeFilter<'_>>,
) -> bool {
    if from == to {
        return true;
    }
    let mut visited = FixedBitSet::with_capacity(graph.arena_len());
    let mut work = vec![from];
    visited.insert(from.index());
    while let Some(current) = work.pop() {
        for (_, next) in neighbors(graph, current, mask, filter) {
            if next == to {
                return true;
            }
            if !visited.put(next.index()) {
                work.push(next);
            }
        }
    }
    false
}

/// The edges of a shortest path from `from` to `to`, or empty when none
/// exists. A trivial query (`from == to`) yields an empty path as well.
#[must_use]
pub fn edge_path(
    graph: &TypeGraph,
    from: TypeHandle,
    to: TypeHandle,
    mask: RelationMask,
    filter: Option<EdgeFilter<'_>>,
) -> Vec<Rc<TypeEdge>> {
    if from == to {
        return Vec::new();
    }
    let mut visited = FixedBitSet::with_capacity(graph.arena_len());
    let mut predecessor: Vec<Option<(TypeHandle, Rc<TypeEdge>)>> = vec![None; graph.arena_len()];
    let mut queue = std::collections::VecDeque::new();
    queue.push_back(from);
    visited.insert(from.index());
    while let Some(current) = queue.pop_front() {
        for (edge, next) in neighbors(graph, current, mask, filter) {
            if visited.put(next.index()) {
                continue;
            }
            predecessor[next.index()] = Some((current, Rc::clone(&edge)));
            if next == to {
                // Walk predecessors back to the start.
                let mut path = Vec::new();
                let mut cursor = to;
                while cursor != from {
                    let (prev, step) = predecessor[cursor.index()]
                        .clone()
                        .expect("predecessor chain is complete");
                    path.push(step);
                    cursor = prev;
                }
                path.reverse();
                return path;
            }
            queue.push_back(next);
        }
    }
    Vec::new()
}

//! Object graph optimization: structural deduplication.
//!
//! Reachable objects are partitioned into equivalence classes by
//! structural signature; one canonical representative survives per class,
//! every reference is rewritten to it, and the surviving objects are
//! renumbered densely. The compressed container encoding itself lives in
//! [`crate::writer`]; together the two passes implement the size
//! optimization.
//!
//! Optimization never mutates the graph on failure: all analysis runs
//! first and the arena is only rebuilt once it cannot fail anymore.

mod signature;

pub use signature::{compute_signatures, cyclic_set, reachable_set, Signature};

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::graph::{ObjectGraph, ObjId};

/// Summary of one optimization pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OptimizeStats {
    /// Objects in the arena before the pass
    pub objects_before: usize,

    /// Objects surviving the pass
    pub objects_after: usize,

    /// Duplicates merged into their class representative
    pub duplicates_merged: usize,

    /// Objects dropped because nothing reachable referenced them
    pub unreachable_dropped: usize,
}

/// Deduplicate and renumber the graph in place.
///
/// On error (dangling reference) the graph is untouched. Deterministic:
/// class representatives are the lowest object id in each class, and
/// survivors keep their relative order.
pub fn optimize(graph: &mut ObjectGraph) -> Result<OptimizeStats> {
    let n = graph.len();
    let reachable = reachable_set(graph)?;
    let cyclic = cyclic_set(graph, &reachable);
    let signatures = compute_signatures(graph, &reachable, &cyclic);

    // Partition into equivalence classes; ascending id order makes the
    // lowest id the representative.
    let mut representative: BTreeMap<Signature, ObjId> = BTreeMap::new();
    let mut canonical: Vec<ObjId> = (0..n).collect();
    let mut duplicates = 0usize;
    for id in 0..n {
        let Some(sig) = signatures[id] else { continue };
        let canon = *representative.entry(sig).or_insert(id);
        canonical[id] = canon;
        if canon != id {
            duplicates += 1;
        }
    }

    // Dense renumbering of the survivors, in ascending old-id order.
    let mut new_id = vec![usize::MAX; n];
    let mut survivors = Vec::new();
    for id in 0..n {
        if reachable[id] && canonical[id] == id {
            new_id[id] = survivors.len();
            survivors.push(id);
        }
    }

    let mut objects = Vec::with_capacity(survivors.len());
    for &id in &survivors {
        let mut object = graph.objects[id].clone();
        object.map_refs(&|r| new_id[canonical[r]]);
        objects.push(object);
    }

    let stats = OptimizeStats {
        objects_before: n,
        objects_after: objects.len(),
        duplicates_merged: duplicates,
        unreachable_dropped: reachable.iter().filter(|r| !**r).count(),
    };

    graph.objects = objects;
    graph.root = new_id[canonical[graph.root]];
    graph.info = graph.info.map(|info| new_id[canonical[info]]);

    Ok(stats)
}

//! Structural signatures over the object graph.
//!
//! A signature captures an object's type tag, its payload shape, and the
//! signatures of its children, post-order, so equal subtrees hash
//! identically anywhere in the graph. Objects that sit on a reference
//! cycle (the page tree's parent links) receive identity-unique
//! signatures and are therefore never merged.

use md5::{Digest, Md5};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::graph::{Object, ObjectGraph, ObjId};

/// 128-bit structural signature.
pub type Signature = [u8; 16];

/// Roots of the graph walk: the catalog plus the info dictionary.
fn roots(graph: &ObjectGraph) -> Vec<ObjId> {
    let mut roots = vec![graph.root];
    if let Some(info) = graph.info {
        roots.push(info);
    }
    roots
}

fn children(object: &Object) -> Vec<ObjId> {
    let mut out = Vec::new();
    object.for_each_ref(&mut |id| out.push(id));
    out
}

/// Objects reachable from the roots.
///
/// Fails on a dangling reference; the graph is left untouched by callers
/// on error.
pub fn reachable_set(graph: &ObjectGraph) -> Result<Vec<bool>> {
    let n = graph.len();
    let mut reachable = vec![false; n];
    let mut stack = Vec::new();

    for root in roots(graph) {
        if root >= n {
            return Err(Error::Optimization(format!(
                "root object {} is out of bounds",
                root
            )));
        }
        stack.push(root);
    }

    while let Some(id) = stack.pop() {
        if reachable[id] {
            continue;
        }
        reachable[id] = true;
        for child in children(&graph.objects[id]) {
            if child >= n {
                return Err(Error::Optimization(format!(
                    "object {} ({}) references missing object {}",
                    id + 1,
                    graph.objects[id].type_tag(),
                    child + 1
                )));
            }
            if !reachable[child] {
                stack.push(child);
            }
        }
    }

    Ok(reachable)
}

/// Objects participating in a reference cycle.
///
/// Iterative depth-first walk with an explicit path stack: every back edge
/// marks the whole path segment from its target to the current node.
pub fn cyclic_set(graph: &ObjectGraph, reachable: &[bool]) -> Vec<bool> {
    let n = graph.len();
    let mut color = vec![0u8; n]; // 0 = unvisited, 1 = on path, 2 = done
    let mut cyclic = vec![false; n];
    let mut path: Vec<ObjId> = Vec::new();
    let mut path_pos: Vec<usize> = vec![usize::MAX; n];
    let mut frames: Vec<(ObjId, Vec<ObjId>, usize)> = Vec::new();

    for start in roots(graph) {
        if color[start] != 0 {
            continue;
        }
        color[start] = 1;
        path_pos[start] = path.len();
        path.push(start);
        frames.push((start, children(&graph.objects[start]), 0));

        loop {
            // Advance the top frame; the borrow must end before the
            // frame stack is mutated below.
            let step = match frames.last_mut() {
                None => break,
                Some(frame) => {
                    if frame.2 < frame.1.len() {
                        let child = frame.1[frame.2];
                        frame.2 += 1;
                        Some(child)
                    } else {
                        None
                    }
                }
            };

            match step {
                Some(child) => {
                    if !reachable[child] {
                        continue;
                    }
                    match color[child] {
                        0 => {
                            color[child] = 1;
                            path_pos[child] = path.len();
                            path.push(child);
                            frames.push((child, children(&graph.objects[child]), 0));
                        }
                        1 => {
                            // Back edge: everything from the target to here
                            // is on a cycle, the self-loop case included.
                            for &node in &path[path_pos[child]..] {
                                cyclic[node] = true;
                            }
                        }
                        _ => {}
                    }
                }
                None => {
                    let (id, _, _) = frames.pop().expect("frame checked above");
                    color[id] = 2;
                    path_pos[id] = usize::MAX;
                    path.pop();
                }
            }
        }
    }

    cyclic
}

/// Compute signatures for all reachable objects.
///
/// Stream payloads are digested in parallel first; the structural combine
/// is a sequential memoized walk, so results do not depend on scheduling.
pub fn compute_signatures(
    graph: &ObjectGraph,
    reachable: &[bool],
    cyclic: &[bool],
) -> Vec<Option<Signature>> {
    let n = graph.len();

    let payload_digests: Vec<Option<Signature>> = graph
        .objects
        .par_iter()
        .enumerate()
        .map(|(id, object)| match object {
            Object::Stream { data, .. } if reachable[id] => {
                let mut hasher = Md5::new();
                hasher.update(data);
                Some(hasher.finalize().into())
            }
            _ => None,
        })
        .collect();

    let mut signatures: Vec<Option<Signature>> = vec![None; n];
    for id in 0..n {
        if reachable[id] {
            signature_of(graph, id, cyclic, &payload_digests, &mut signatures);
        }
    }
    signatures
}

fn signature_of(
    graph: &ObjectGraph,
    id: ObjId,
    cyclic: &[bool],
    payloads: &[Option<Signature>],
    memo: &mut Vec<Option<Signature>>,
) -> Signature {
    if let Some(sig) = memo[id] {
        return sig;
    }

    let mut hasher = Md5::new();
    if cyclic[id] {
        hasher.update(b"cycle:");
        hasher.update((id as u64).to_le_bytes());
    } else if let Object::Stream { dict, data } = &graph.objects[id] {
        // Streams never nest, so the payload digest lookup happens here
        // where the arena id is known.
        hasher.update(b"T");
        for (key, value) in dict {
            hasher.update(key.as_bytes());
            hasher.update([0]);
            hash_value(value, graph, cyclic, payloads, memo, &mut hasher);
        }
        hasher.update(b"$");
        let digest = payloads[id].unwrap_or_else(|| {
            let mut h = Md5::new();
            h.update(data);
            h.finalize().into()
        });
        hasher.update(digest);
    } else {
        hash_value(&graph.objects[id], graph, cyclic, payloads, memo, &mut hasher);
    }

    let sig: Signature = hasher.finalize().into();
    memo[id] = Some(sig);
    sig
}

fn hash_value(
    value: &Object,
    graph: &ObjectGraph,
    cyclic: &[bool],
    payloads: &[Option<Signature>],
    memo: &mut Vec<Option<Signature>>,
    hasher: &mut Md5,
) {
    match value {
        Object::Null => hasher.update(b"N"),
        Object::Boolean(v) => hasher.update(if *v { b"B1" } else { b"B0" }),
        Object::Integer(v) => {
            hasher.update(b"I");
            hasher.update(v.to_le_bytes());
        }
        Object::Real(v) => {
            hasher.update(b"R");
            hasher.update(v.to_bits().to_le_bytes());
        }
        Object::Name(name) => {
            hasher.update(b"/");
            hasher.update(name.as_bytes());
            hasher.update([0]);
        }
        Object::Text(text) => {
            hasher.update(b"S");
            hasher.update((text.len() as u64).to_le_bytes());
            hasher.update(text.as_bytes());
        }
        Object::Array(items) => {
            hasher.update(b"A");
            hasher.update((items.len() as u64).to_le_bytes());
            for item in items {
                hash_value(item, graph, cyclic, payloads, memo, hasher);
            }
        }
        Object::Dictionary(dict) => {
            hasher.update(b"D");
            hasher.update((dict.len() as u64).to_le_bytes());
            for (key, value) in dict {
                hasher.update(key.as_bytes());
                hasher.update([0]);
                hash_value(value, graph, cyclic, payloads, memo, hasher);
            }
        }
        Object::Stream { dict, data } => {
            hasher.update(b"T");
            for (key, value) in dict {
                hasher.update(key.as_bytes());
                hasher.update([0]);
                hash_value(value, graph, cyclic, payloads, memo, hasher);
            }
            hasher.update(b"$");
            let mut h = Md5::new();
            h.update(data);
            let digest: Signature = h.finalize().into();
            hasher.update(digest);
        }
        Object::Reference(child) => {
            hasher.update(b"@");
            let sig = signature_of(graph, *child, cyclic, payloads, memo);
            hasher.update(sig);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Dict;

    fn font(base: &str) -> Object {
        let mut d = Dict::new();
        d.insert("Type".into(), Object::Name("Font".into()));
        d.insert("BaseFont".into(), Object::Name(base.into()));
        Object::Dictionary(d)
    }

    fn tiny_graph() -> ObjectGraph {
        let mut graph = ObjectGraph::new();
        let catalog = graph.add(Object::Null);
        let a = graph.add(font("Helvetica"));
        let b = graph.add(font("Helvetica"));
        let c = graph.add(font("Courier"));

        let mut d = Dict::new();
        d.insert("Type".into(), Object::Name("Catalog".into()));
        d.insert(
            "Kids".into(),
            Object::Array(vec![
                Object::Reference(a),
                Object::Reference(b),
                Object::Reference(c),
            ]),
        );
        graph.objects[catalog] = Object::Dictionary(d);
        graph.root = catalog;
        graph
    }

    #[test]
    fn test_identical_objects_share_signature() {
        let graph = tiny_graph();
        let reachable = reachable_set(&graph).unwrap();
        let cyclic = cyclic_set(&graph, &reachable);
        let sigs = compute_signatures(&graph, &reachable, &cyclic);

        assert_eq!(sigs[1], sigs[2]);
        assert_ne!(sigs[1], sigs[3]);
    }

    #[test]
    fn test_dangling_reference_detected() {
        let mut graph = ObjectGraph::new();
        let catalog = graph.add(Object::Reference(99));
        graph.root = catalog;

        let result = reachable_set(&graph);
        assert!(matches!(result, Err(Error::Optimization(_))));
    }

    #[test]
    fn test_cycle_members_never_share() {
        // Two structurally identical two-node cycles.
        let mut graph = ObjectGraph::new();
        let catalog = graph.add(Object::Null);
        let a1 = graph.add(Object::Null);
        let a2 = graph.add(Object::Reference(1));
        graph.objects[a1] = Object::Reference(a2);
        let b1 = graph.add(Object::Null);
        let b2 = graph.add(Object::Reference(3));
        graph.objects[b1] = Object::Reference(b2);
        graph.objects[catalog] = Object::Array(vec![Object::Reference(a1), Object::Reference(b1)]);
        graph.root = catalog;

        let reachable = reachable_set(&graph).unwrap();
        let cyclic = cyclic_set(&graph, &reachable);
        assert!(cyclic[a1] && cyclic[a2] && cyclic[b1] && cyclic[b2]);
        assert!(!cyclic[catalog]);

        let sigs = compute_signatures(&graph, &reachable, &cyclic);
        assert_ne!(sigs[a1], sigs[b1]);
    }

    #[test]
    fn test_signatures_position_independent() {
        // The same subtree reached through different paths hashes the same.
        let mut graph = ObjectGraph::new();
        let catalog = graph.add(Object::Null);
        let leaf = graph.add(font("Symbol"));
        let left = graph.add(Object::Array(vec![Object::Reference(leaf)]));
        let right = graph.add(Object::Array(vec![Object::Reference(leaf)]));
        graph.objects[catalog] =
            Object::Array(vec![Object::Reference(left), Object::Reference(right)]);
        graph.root = catalog;

        let reachable = reachable_set(&graph).unwrap();
        let cyclic = cyclic_set(&graph, &reachable);
        let sigs = compute_signatures(&graph, &reachable, &cyclic);
        assert_eq!(sigs[left], sigs[right]);
    }

    #[test]
    fn test_unreachable_objects_skipped() {
        let mut graph = tiny_graph();
        graph.add(font("Orphan"));
        let reachable = reachable_set(&graph).unwrap();
        assert!(!reachable[4]);

        let cyclic = cyclic_set(&graph, &reachable);
        let sigs = compute_signatures(&graph, &reachable, &cyclic);
        assert!(sigs[4].is_none());
    }
}

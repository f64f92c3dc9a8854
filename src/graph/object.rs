//! Object graph arena and value types.

use std::collections::BTreeMap;

/// Arena index of an indirect object. Object numbers in the serialized
/// file are `id + 1`; generation is always 0.
pub type ObjId = usize;

/// Dictionary with deterministic key order.
pub type Dict = BTreeMap<String, Object>;

/// A value in the output document's object graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    /// A name token (serialized with a leading slash)
    Name(String),
    /// A literal string
    Text(String),
    Array(Vec<Object>),
    Dictionary(Dict),
    /// A stream: dictionary plus raw payload bytes
    Stream { dict: Dict, data: Vec<u8> },
    /// Reference to another indirect object by arena index
    Reference(ObjId),
}

impl Object {
    /// Short type tag used in signatures and diagnostics.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Object::Null => "null",
            Object::Boolean(_) => "bool",
            Object::Integer(_) => "int",
            Object::Real(_) => "real",
            Object::Name(_) => "name",
            Object::Text(_) => "text",
            Object::Array(_) => "array",
            Object::Dictionary(_) => "dict",
            Object::Stream { .. } => "stream",
            Object::Reference(_) => "ref",
        }
    }

    /// Whether this object is a stream.
    pub fn is_stream(&self) -> bool {
        matches!(self, Object::Stream { .. })
    }

    /// Visit every reference contained in this object, depth-first.
    pub fn for_each_ref(&self, f: &mut impl FnMut(ObjId)) {
        match self {
            Object::Reference(id) => f(*id),
            Object::Array(items) => {
                for item in items {
                    item.for_each_ref(f);
                }
            }
            Object::Dictionary(dict) | Object::Stream { dict, .. } => {
                for value in dict.values() {
                    value.for_each_ref(f);
                }
            }
            _ => {}
        }
    }

    /// Rewrite every contained reference through the given map.
    pub fn map_refs(&mut self, f: &impl Fn(ObjId) -> ObjId) {
        match self {
            Object::Reference(id) => *id = f(*id),
            Object::Array(items) => {
                for item in items {
                    item.map_refs(f);
                }
            }
            Object::Dictionary(dict) | Object::Stream { dict, .. } => {
                for value in dict.values_mut() {
                    value.map_refs(f);
                }
            }
            _ => {}
        }
    }
}

/// The document object graph: an arena plus the catalog root.
#[derive(Debug, Clone)]
pub struct ObjectGraph {
    /// Arena of indirect objects
    pub objects: Vec<Object>,

    /// The document catalog
    pub root: ObjId,

    /// Optional document information dictionary
    pub info: Option<ObjId>,
}

impl ObjectGraph {
    /// Create an empty graph. The root must be set by the builder.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            root: 0,
            info: None,
        }
    }

    /// Add an object, returning its arena index.
    pub fn add(&mut self, object: Object) -> ObjId {
        self.objects.push(object);
        self.objects.len() - 1
    }

    /// Number of objects in the arena.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Get an object by id.
    pub fn get(&self, id: ObjId) -> Option<&Object> {
        self.objects.get(id)
    }

    /// Sum of stream payload sizes, a rough size indicator.
    pub fn payload_bytes(&self) -> usize {
        self.objects
            .iter()
            .map(|o| match o {
                Object::Stream { data, .. } => data.len(),
                _ => 0,
            })
            .sum()
    }
}

impl Default for ObjectGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_ids_are_dense() {
        let mut graph = ObjectGraph::new();
        let a = graph.add(Object::Integer(1));
        let b = graph.add(Object::Integer(2));
        assert_eq!((a, b), (0, 1));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_for_each_ref_walks_nested() {
        let mut dict = Dict::new();
        dict.insert(
            "Kids".into(),
            Object::Array(vec![Object::Reference(3), Object::Reference(7)]),
        );
        dict.insert("Parent".into(), Object::Reference(1));
        let obj = Object::Dictionary(dict);

        let mut seen = Vec::new();
        obj.for_each_ref(&mut |id| seen.push(id));
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 3, 7]);
    }

    #[test]
    fn test_map_refs_rewrites() {
        let mut obj = Object::Array(vec![Object::Reference(5), Object::Integer(9)]);
        obj.map_refs(&|id| id + 10);
        assert_eq!(
            obj,
            Object::Array(vec![Object::Reference(15), Object::Integer(9)])
        );
    }
}

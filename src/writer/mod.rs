//! Serialization of the object graph to output bytes.
//!
//! Two modes share one entry point:
//!
//! - **classic**: every object written individually, followed by a plain
//!   cross-reference table and trailer;
//! - **compressed**: non-stream objects grouped into deflate-compressed
//!   object containers, with the cross-reference encoded as a compressed
//!   stream. Object containers require the cross-reference stream, so
//!   enabling one enables the other.
//!
//! Output is byte-for-byte deterministic for a given graph and options.

mod serialize;

pub use serialize::serialize_object;

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Error, Result};
use crate::graph::{Dict, Object, ObjectGraph};

/// Options controlling serialization.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Group non-stream objects into compressed object containers.
    pub use_object_streams: bool,

    /// Encode the cross-reference table as a compressed stream.
    pub use_xref_streams: bool,

    /// Deflate level for containers and the cross-reference stream (0-9).
    pub compression_level: u32,

    /// Maximum objects per container stream.
    pub max_objects_per_stream: usize,
}

impl WriteOptions {
    /// Classic layout: plain bodies, plain cross-reference table.
    pub fn classic() -> Self {
        Self {
            use_object_streams: false,
            use_xref_streams: false,
            compression_level: 6,
            max_objects_per_stream: 100,
        }
    }

    /// Fully compressed layout: object containers plus xref stream.
    pub fn compressed() -> Self {
        Self {
            use_object_streams: true,
            use_xref_streams: true,
            ..Self::classic()
        }
    }

    /// Set the deflate level.
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }

    /// Set the container capacity.
    pub fn with_max_objects_per_stream(mut self, max: usize) -> Self {
        self.max_objects_per_stream = max.max(1);
        self
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self::classic()
    }
}

const HEADER: &[u8] = b"%PDF-1.5\n%\xE2\xE3\xCF\xD3\n";

/// Serialize a graph to bytes.
pub fn write_graph(graph: &ObjectGraph, options: &WriteOptions) -> Result<Vec<u8>> {
    if graph.is_empty() {
        return Err(Error::Optimization("cannot write an empty graph".into()));
    }
    if graph.get(graph.root).is_none() {
        return Err(Error::Optimization(format!(
            "catalog object {} is out of bounds",
            graph.root
        )));
    }

    if options.use_object_streams || options.use_xref_streams {
        write_compressed(graph, options)
    } else {
        write_classic(graph)
    }
}

fn write_classic(graph: &ObjectGraph) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(HEADER);

    let mut offsets = Vec::with_capacity(graph.len());
    for (id, object) in graph.objects.iter().enumerate() {
        offsets.push(out.len());
        let _ = write!(out, "{} 0 obj\n", id + 1);
        serialize_object(object, &mut out);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = out.len();
    let size = graph.len() + 1;
    let _ = write!(out, "xref\n0 {}\n", size);
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        let _ = write!(out, "{:010} 00000 n \n", offset);
    }

    let mut trailer = Dict::new();
    trailer.insert("Size".into(), Object::Integer(size as i64));
    trailer.insert("Root".into(), Object::Reference(graph.root));
    if let Some(info) = graph.info {
        trailer.insert("Info".into(), Object::Reference(info));
    }
    out.extend_from_slice(b"trailer\n");
    serialize_object(&Object::Dictionary(trailer), &mut out);
    let _ = write!(out, "\nstartxref\n{}\n%%EOF\n", xref_offset);

    Ok(out)
}

/// Cross-reference entry for the compressed layout.
enum XrefEntry {
    /// Object written directly at a byte offset
    Direct { offset: usize },
    /// Object stored in a container: (container object number, index)
    InContainer { container: usize, index: usize },
}

fn write_compressed(graph: &ObjectGraph, options: &WriteOptions) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(HEADER);

    let n = graph.len();
    // Arena objects keep numbers 1..=n; containers and the xref stream are
    // appended after, so references never need rewriting here.
    let mut entries: Vec<Option<XrefEntry>> = (0..n).map(|_| None).collect();

    // Streams cannot live inside a container; write them directly.
    let mut container_members: Vec<usize> = Vec::new();
    for (id, object) in graph.objects.iter().enumerate() {
        if object.is_stream() {
            entries[id] = Some(XrefEntry::Direct { offset: out.len() });
            let _ = write!(out, "{} 0 obj\n", id + 1);
            serialize_object(object, &mut out);
            out.extend_from_slice(b"\nendobj\n");
        } else {
            container_members.push(id);
        }
    }

    // Pack the rest into object containers.
    let mut next_number = n + 1;
    let mut container_offsets: Vec<(usize, usize)> = Vec::new(); // (number, offset)
    for chunk in container_members.chunks(options.max_objects_per_stream) {
        let mut header = Vec::new();
        let mut bodies = Vec::new();
        for (index, &id) in chunk.iter().enumerate() {
            let _ = write!(header, "{} {} ", id + 1, bodies.len());
            serialize_object(&graph.objects[id], &mut bodies);
            bodies.push(b'\n');
            entries[id] = Some(XrefEntry::InContainer {
                container: next_number,
                index,
            });
        }

        let first = header.len();
        let mut payload = header;
        payload.extend_from_slice(&bodies);
        let compressed = deflate(&payload, options.compression_level);

        let mut dict = Dict::new();
        dict.insert("Type".into(), Object::Name("ObjStm".into()));
        dict.insert("N".into(), Object::Integer(chunk.len() as i64));
        dict.insert("First".into(), Object::Integer(first as i64));
        dict.insert("Filter".into(), Object::Name("FlateDecode".into()));
        dict.insert("Length".into(), Object::Integer(compressed.len() as i64));

        container_offsets.push((next_number, out.len()));
        let _ = write!(out, "{} 0 obj\n", next_number);
        serialize_object(
            &Object::Stream {
                dict,
                data: compressed,
            },
            &mut out,
        );
        out.extend_from_slice(b"\nendobj\n");
        next_number += 1;
    }

    // Cross-reference stream covers object 0, the arena, the containers,
    // and itself. W = [1 4 2]: type, offset/container, generation/index.
    let xref_number = next_number;
    let size = xref_number + 1;
    let xref_offset = out.len();

    let mut rows: Vec<u8> = Vec::with_capacity(size * 7);
    push_row(&mut rows, 0, 0, 65535);
    for entry in &entries {
        match entry {
            Some(XrefEntry::Direct { offset }) => push_row(&mut rows, 1, *offset as u32, 0),
            Some(XrefEntry::InContainer { container, index }) => {
                push_row(&mut rows, 2, *container as u32, *index as u16)
            }
            // Unreachable arena slots would be a builder bug; keep the
            // row shape valid regardless.
            None => push_row(&mut rows, 0, 0, 65535),
        }
    }
    for &(_, offset) in &container_offsets {
        push_row(&mut rows, 1, offset as u32, 0);
    }
    push_row(&mut rows, 1, xref_offset as u32, 0);

    let compressed_rows = deflate(&rows, options.compression_level);
    let mut xref_dict = Dict::new();
    xref_dict.insert("Type".into(), Object::Name("XRef".into()));
    xref_dict.insert("Size".into(), Object::Integer(size as i64));
    xref_dict.insert(
        "W".into(),
        Object::Array(vec![
            Object::Integer(1),
            Object::Integer(4),
            Object::Integer(2),
        ]),
    );
    xref_dict.insert("Root".into(), Object::Reference(graph.root));
    if let Some(info) = graph.info {
        xref_dict.insert("Info".into(), Object::Reference(info));
    }
    xref_dict.insert("Filter".into(), Object::Name("FlateDecode".into()));
    xref_dict.insert(
        "Length".into(),
        Object::Integer(compressed_rows.len() as i64),
    );

    let _ = write!(out, "{} 0 obj\n", xref_number);
    serialize_object(
        &Object::Stream {
            dict: xref_dict,
            data: compressed_rows,
        },
        &mut out,
    );
    out.extend_from_slice(b"\nendobj\n");

    let _ = write!(out, "startxref\n{}\n%%EOF\n", xref_offset);
    Ok(out)
}

fn push_row(rows: &mut Vec<u8>, kind: u8, field2: u32, field3: u16) {
    rows.push(kind);
    rows.extend_from_slice(&field2.to_be_bytes());
    rows.extend_from_slice(&field3.to_be_bytes());
}

fn deflate(data: &[u8], level: u32) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data).expect("in-memory deflate");
    encoder.finish().expect("in-memory deflate")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ObjectGraph;

    /// A small synthetic graph: catalog, page tree, one page, fonts.
    fn sample_graph() -> ObjectGraph {
        let mut graph = ObjectGraph::new();
        let catalog = graph.add(Object::Null);
        let pages = graph.add(Object::Null);

        let mut font = Dict::new();
        font.insert("Type".into(), Object::Name("Font".into()));
        font.insert("Subtype".into(), Object::Name("Type1".into()));
        font.insert("BaseFont".into(), Object::Name("Helvetica".into()));
        let font_id = graph.add(Object::Dictionary(font));

        let mut content_dict = Dict::new();
        content_dict.insert("Length".into(), Object::Integer(10));
        let content = graph.add(Object::Stream {
            dict: content_dict,
            data: b"BT ET ....".to_vec(),
        });

        let mut resources = Dict::new();
        let mut fonts = Dict::new();
        fonts.insert("F1".into(), Object::Reference(font_id));
        resources.insert("Font".into(), Object::Dictionary(fonts));
        let resources_id = graph.add(Object::Dictionary(resources));

        let mut page = Dict::new();
        page.insert("Type".into(), Object::Name("Page".into()));
        page.insert("Parent".into(), Object::Reference(pages));
        page.insert("Contents".into(), Object::Reference(content));
        page.insert("Resources".into(), Object::Reference(resources_id));
        let page_id = graph.add(Object::Dictionary(page));

        let mut pages_dict = Dict::new();
        pages_dict.insert("Type".into(), Object::Name("Pages".into()));
        pages_dict.insert("Count".into(), Object::Integer(1));
        pages_dict.insert(
            "Kids".into(),
            Object::Array(vec![Object::Reference(page_id)]),
        );
        graph.objects[pages] = Object::Dictionary(pages_dict);

        let mut catalog_dict = Dict::new();
        catalog_dict.insert("Type".into(), Object::Name("Catalog".into()));
        catalog_dict.insert("Pages".into(), Object::Reference(pages));
        graph.objects[catalog] = Object::Dictionary(catalog_dict);
        graph.root = catalog;
        graph
    }

    #[test]
    fn test_classic_layout_markers() {
        let bytes = write_graph(&sample_graph(), &WriteOptions::classic()).unwrap();
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.starts_with("%PDF-1.5"));
        assert!(text.contains("1 0 obj"));
        assert!(text.contains("xref"));
        assert!(text.contains("trailer"));
        assert!(text.contains("/Root 1 0 R"));
        assert!(text.trim_end().ends_with("%%EOF"));
    }

    #[test]
    fn test_compressed_layout_markers() {
        let bytes = write_graph(&sample_graph(), &WriteOptions::compressed()).unwrap();
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.contains("/ObjStm"));
        assert!(text.contains("/XRef"));
        assert!(!text.contains("trailer"));
        // Non-stream objects no longer appear as individual bodies.
        assert!(!text.contains("1 0 obj\n<< /Pages"));
    }

    #[test]
    fn test_deterministic_output() {
        let graph = sample_graph();
        for options in [WriteOptions::classic(), WriteOptions::compressed()] {
            let a = write_graph(&graph, &options).unwrap();
            let b = write_graph(&graph, &options).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_compressed_smaller_for_repetitive_graphs() {
        let mut graph = sample_graph();
        for i in 0..60 {
            let mut d = Dict::new();
            d.insert("Type".into(), Object::Name("Font".into()));
            d.insert("Subtype".into(), Object::Name("Type1".into()));
            d.insert("BaseFont".into(), Object::Name(format!("Face{}", i % 4)));
            graph.add(Object::Dictionary(d));
        }

        let classic = write_graph(&graph, &WriteOptions::classic()).unwrap();
        let compressed = write_graph(&graph, &WriteOptions::compressed()).unwrap();
        assert!(compressed.len() < classic.len());
    }

    #[test]
    fn test_empty_graph_rejected() {
        let graph = ObjectGraph::new();
        assert!(write_graph(&graph, &WriteOptions::classic()).is_err());
    }

    #[test]
    fn test_container_capacity_respected() {
        let mut graph = sample_graph();
        for _ in 0..25 {
            graph.add(Object::Integer(7));
        }
        let options = WriteOptions::compressed().with_max_objects_per_stream(10);
        let bytes = write_graph(&graph, &options).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        // More than ten non-stream objects forces multiple containers.
        assert!(text.matches("/ObjStm").count() >= 2);
    }
}

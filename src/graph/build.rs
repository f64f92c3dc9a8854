//! Build an object graph from a fixed document.
//!
//! Produces the standard shape: catalog → page tree → page dictionaries,
//! with one shared resources dictionary (fonts and image XObjects pooled
//! once) and one compressed content stream per page. Output is fully
//! deterministic: dictionary keys are ordered, resource names are derived
//! from sorted ids, and no timestamp is ever invented.

use std::collections::BTreeMap;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::{Dict, Object, ObjectGraph};
use crate::fixed::{FixedDocument, FixedPage, PlacedElement};

/// Fixed deflate level for content streams; part of the determinism
/// contract, do not derive from configuration.
const CONTENT_COMPRESSION: u32 = 6;

/// Build the complete object graph for a fixed document.
pub fn build_graph(doc: &FixedDocument) -> ObjectGraph {
    let mut graph = ObjectGraph::new();

    // Reserve catalog and page-tree slots so pages can point back at them.
    let catalog_id = graph.add(Object::Null);
    let pages_id = graph.add(Object::Null);

    // Font objects, one per pooled spec, named /F1.. by pool index.
    let mut font_dict = Dict::new();
    for (i, spec) in doc.fonts.iter().enumerate() {
        let font_id = graph.add(Object::Dictionary(dict([
            ("Type", Object::Name("Font".into())),
            ("Subtype", Object::Name("Type1".into())),
            ("BaseFont", Object::Name(spec.postscript_name().into())),
            ("Encoding", Object::Name("WinAnsiEncoding".into())),
        ])));
        font_dict.insert(format!("F{}", i + 1), Object::Reference(font_id));
    }

    // Image XObjects, named /Im1.. by sorted resource id.
    let mut xobject_dict = Dict::new();
    let mut image_names: BTreeMap<&str, String> = BTreeMap::new();
    for (i, (res_id, resource)) in doc.resources.iter().enumerate() {
        let name = format!("Im{}", i + 1);
        let mut stream_dict = dict([
            ("Type", Object::Name("XObject".into())),
            ("Subtype", Object::Name("Image".into())),
            (
                "Width",
                Object::Integer(resource.width.unwrap_or(1) as i64),
            ),
            (
                "Height",
                Object::Integer(resource.height.unwrap_or(1) as i64),
            ),
            ("ColorSpace", Object::Name("DeviceRGB".into())),
            ("BitsPerComponent", Object::Integer(8)),
        ]);

        // JPEG passes through as DCT; other payloads are carried
        // deflate-wrapped for the downstream consumer.
        let is_jpeg = resource.mime_type == "image/jpeg"
            || crate::model::Resource::detect_mime_type(&resource.data) == Some("image/jpeg");
        let data = if is_jpeg {
            stream_dict.insert("Filter".into(), Object::Name("DCTDecode".into()));
            resource.data.clone()
        } else {
            stream_dict.insert("Filter".into(), Object::Name("FlateDecode".into()));
            deflate(&resource.data)
        };
        stream_dict.insert("Length".into(), Object::Integer(data.len() as i64));

        let img_id = graph.add(Object::Stream {
            dict: stream_dict,
            data,
        });
        xobject_dict.insert(name.clone(), Object::Reference(img_id));
        image_names.insert(res_id.as_str(), name);
    }

    // One shared resources dictionary referenced by every page.
    let mut resources = Dict::new();
    if !font_dict.is_empty() {
        resources.insert("Font".into(), Object::Dictionary(font_dict));
    }
    if !xobject_dict.is_empty() {
        resources.insert("XObject".into(), Object::Dictionary(xobject_dict));
    }
    let resources_id = graph.add(Object::Dictionary(resources));

    // Page dictionaries with compressed content streams.
    let mut kids = Vec::with_capacity(doc.pages.len());
    for page in &doc.pages {
        let content = page_content(page, &image_names);
        let compressed = deflate(&content);
        let content_id = graph.add(Object::Stream {
            dict: dict([
                ("Filter", Object::Name("FlateDecode".into())),
                ("Length", Object::Integer(compressed.len() as i64)),
            ]),
            data: compressed,
        });

        let page_id = graph.add(Object::Dictionary(dict([
            ("Type", Object::Name("Page".into())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(page.width as f64),
                    Object::Real(page.height as f64),
                ]),
            ),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
        ])));
        kids.push(Object::Reference(page_id));
    }

    graph.objects[pages_id] = Object::Dictionary(dict([
        ("Type", Object::Name("Pages".into())),
        ("Count", Object::Integer(kids.len() as i64)),
        ("Kids", Object::Array(kids)),
    ]));

    graph.objects[catalog_id] = Object::Dictionary(dict([
        ("Type", Object::Name("Catalog".into())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    graph.root = catalog_id;

    // Information dictionary only when the source carried metadata; dates
    // come from the input document, never from the clock.
    if doc.metadata.is_empty() {
        return graph;
    }
    let mut info = Dict::new();
    if let Some(ref title) = doc.metadata.title {
        info.insert("Title".into(), Object::Text(title.clone()));
    }
    if let Some(ref author) = doc.metadata.author {
        info.insert("Author".into(), Object::Text(author.clone()));
    }
    if let Some(ref subject) = doc.metadata.subject {
        info.insert("Subject".into(), Object::Text(subject.clone()));
    }
    if let Some(ref keywords) = doc.metadata.keywords {
        info.insert("Keywords".into(), Object::Text(keywords.clone()));
    }
    if let Some(ref creator) = doc.metadata.creator {
        info.insert("Creator".into(), Object::Text(creator.clone()));
    }
    if let Some(created) = doc.metadata.created {
        info.insert(
            "CreationDate".into(),
            Object::Text(created.format("D:%Y%m%d%H%M%SZ").to_string()),
        );
    }
    if let Some(modified) = doc.metadata.modified {
        info.insert(
            "ModDate".into(),
            Object::Text(modified.format("D:%Y%m%d%H%M%SZ").to_string()),
        );
    }
    if !info.is_empty() {
        info.insert("Producer".into(), Object::Text("topdf".into()));
        graph.info = Some(graph.add(Object::Dictionary(info)));
    }

    graph
}

/// Render a page's placed elements into content-stream operators.
fn page_content(page: &FixedPage, image_names: &BTreeMap<&str, String>) -> Vec<u8> {
    let mut ops = Vec::new();
    for element in &page.elements {
        match element {
            PlacedElement::Text(line) => {
                ops.extend_from_slice(b"BT\n");
                let _ = write!(ops, "{} {} Td\n", num(line.x), num(line.y));
                for segment in &line.segments {
                    let _ = write!(ops, "/F{} {} Tf\n", segment.font + 1, num(segment.size));
                    ops.push(b'(');
                    escape_text(&segment.text, &mut ops);
                    ops.extend_from_slice(b") Tj\n");
                }
                ops.extend_from_slice(b"ET\n");
            }
            PlacedElement::Image {
                resource_id,
                x,
                y,
                width,
                height,
            } => {
                let name = image_names
                    .get(resource_id.as_str())
                    .expect("image pooled during pagination");
                let _ = write!(
                    ops,
                    "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
                    num(*width),
                    num(*height),
                    num(*x),
                    num(*y),
                    name
                );
            }
            PlacedElement::Rule { x, y, width } => {
                let _ = write!(
                    ops,
                    "q\n0.5 w\n{} {} m\n{} {} l\nS\nQ\n",
                    num(*x),
                    num(*y),
                    num(*x + *width),
                    num(*y)
                );
            }
        }
    }
    ops
}

/// Deterministic number formatting: integers stay integral, reals keep at
/// most two decimals with trailing zeros trimmed.
pub(crate) fn num(v: f32) -> String {
    if (v - v.round()).abs() < 0.005 {
        format!("{}", v.round() as i64)
    } else {
        let s = format!("{:.2}", v);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Escape text into a PDF literal string, one byte per character.
///
/// Characters outside the single-byte range degrade to '?'; full Unicode
/// text output is the concern of an embedding-capable encoder.
fn escape_text(text: &str, out: &mut Vec<u8>) {
    for c in text.chars() {
        let code = c as u32;
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            _ if (0x20..0x7F).contains(&code) => out.push(c as u8),
            _ if code <= 0xFF => {
                let _ = write!(out, "\\{:03o}", code);
            }
            _ => out.push(b'?'),
        }
    }
}

/// Zlib-compress with the fixed content level.
pub(crate) fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(CONTENT_COMPRESSION));
    // Writing to a Vec cannot fail.
    encoder.write_all(data).expect("in-memory deflate");
    encoder.finish().expect("in-memory deflate")
}

fn dict<const N: usize>(entries: [(&str, Object); N]) -> Dict {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{resolve, Margins};
    use crate::model::{FlowDocument, Paragraph, Resource};
    use crate::paginate::paginate;

    fn sample_fixed() -> FixedDocument {
        let mut doc = FlowDocument::new();
        doc.metadata.title = Some("Sample".into());
        doc.add_paragraph(Paragraph::heading("Title", 1));
        doc.add_paragraph(Paragraph::with_text("Body text."));
        paginate(&doc, resolve("A4", "Portrait"), Margins::default(), false).unwrap()
    }

    #[test]
    fn test_graph_has_catalog_and_pages() {
        let graph = build_graph(&sample_fixed());
        match graph.get(graph.root) {
            Some(Object::Dictionary(d)) => {
                assert_eq!(d.get("Type"), Some(&Object::Name("Catalog".into())));
            }
            other => panic!("expected catalog dictionary, got {:?}", other),
        }
    }

    #[test]
    fn test_pages_reference_shared_resources() {
        let mut doc = FlowDocument::new();
        for _ in 0..120 {
            doc.add_paragraph(Paragraph::with_text(
                "enough text to spread across more than one page, repeated",
            ));
        }
        let fixed = paginate(&doc, resolve("A4", "Portrait"), Margins::default(), false).unwrap();
        assert!(fixed.page_count() > 1);

        let graph = build_graph(&fixed);
        let mut resource_refs = Vec::new();
        for obj in &graph.objects {
            if let Object::Dictionary(d) = obj {
                if d.get("Type") == Some(&Object::Name("Page".into())) {
                    if let Some(Object::Reference(id)) = d.get("Resources") {
                        resource_refs.push(*id);
                    }
                }
            }
        }
        assert!(resource_refs.len() > 1);
        assert!(resource_refs.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_image_stored_once_per_id() {
        let mut doc = FlowDocument::new();
        doc.add_resource(
            "logo",
            Resource::jpeg(vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3, 4]).with_dimensions(100, 80),
        );
        doc.add_block(crate::model::Block::image_with_size("logo", 100.0, 80.0));
        doc.add_block(crate::model::Block::image_with_size("logo", 100.0, 80.0));
        let fixed = paginate(&doc, resolve("A4", "Portrait"), Margins::default(), false).unwrap();

        let graph = build_graph(&fixed);
        let image_streams = graph
            .objects
            .iter()
            .filter(|o| match o {
                Object::Stream { dict, .. } => {
                    dict.get("Subtype") == Some(&Object::Name("Image".into()))
                }
                _ => false,
            })
            .count();
        assert_eq!(image_streams, 1);
    }

    #[test]
    fn test_build_is_deterministic() {
        let fixed = sample_fixed();
        let a = build_graph(&fixed);
        let b = build_graph(&fixed);
        assert_eq!(a.len(), b.len());
        assert_eq!(a.objects, b.objects);
    }

    #[test]
    fn test_no_metadata_means_no_info_dict() {
        let mut doc = FlowDocument::new();
        doc.add_paragraph(Paragraph::with_text("plain"));
        let fixed = paginate(&doc, resolve("A4", "Portrait"), Margins::default(), false).unwrap();
        let graph = build_graph(&fixed);
        assert!(graph.info.is_none());
    }

    #[test]
    fn test_num_formatting() {
        assert_eq!(num(72.0), "72");
        assert_eq!(num(770.4), "770.4");
        assert_eq!(num(0.5), "0.5");
        assert_eq!(num(595.0), "595");
    }
}

//! End-to-end pipeline tests.

use std::fs;

use topdf::{convert_file, paginate_file, ConversionOptions, Error, Pipeline, PipelineStep};

const THREE_PARAGRAPHS: &str = "First short paragraph.\n\n\
    Second short paragraph with a little more text in it.\n\n\
    Third short paragraph.";

fn write_input(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn three_paragraphs_fit_one_a4_page() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, "doc.txt", THREE_PARAGRAPHS);
    let output = dir.path().join("doc.pdf");

    let report = convert_file(&input, &output, &ConversionOptions::new()).unwrap();

    assert_eq!(report.page_count, 1);
    assert!(!report.optimized);
    let bytes = fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    assert_eq!(bytes.len() as u64, report.output_bytes);
}

#[test]
fn landscape_needs_no_more_pages_than_portrait() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, "doc.txt", THREE_PARAGRAPHS);

    let portrait = convert_file(
        &input,
        dir.path().join("p.pdf"),
        &ConversionOptions::new().with_orientation_name("Portrait"),
    )
    .unwrap();
    let landscape = convert_file(
        &input,
        dir.path().join("l.pdf"),
        &ConversionOptions::new().with_orientation_name("Landscape"),
    )
    .unwrap();

    assert!(landscape.page_count <= portrait.page_count);
}

#[test]
fn missing_input_fails_without_touching_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("never.pdf");

    let result = convert_file(
        dir.path().join("missing.txt"),
        &output,
        &ConversionOptions::new(),
    );

    assert!(matches!(result, Err(Error::InputNotFound(_))));
    assert!(!output.exists());
}

#[test]
fn missing_input_does_not_replace_existing_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("keep.pdf");
    fs::write(&output, b"precious").unwrap();

    let result = convert_file(
        dir.path().join("missing.txt"),
        &output,
        &ConversionOptions::new(),
    );

    assert!(result.is_err());
    assert_eq!(fs::read(&output).unwrap(), b"precious");
}

#[test]
fn unknown_option_names_fall_back_to_a4_portrait() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, "doc.txt", THREE_PARAGRAPHS);

    let options = ConversionOptions::new()
        .with_page_size_name("Tabloid")
        .with_orientation_name("Diagonal");
    let fixed = paginate_file(&input, &options).unwrap();

    assert_eq!(fixed.geometry.width, 595.0);
    assert_eq!(fixed.geometry.height, 842.0);
}

#[test]
fn optimized_output_is_not_larger() {
    let dir = tempfile::tempdir().unwrap();
    // Identical paragraphs make consecutive full pages byte-identical, so
    // deduplication collapses their content streams.
    let content = "The same paragraph repeated throughout the document.\n\n".repeat(150);
    let input = write_input(&dir, "doc.txt", &content);

    let plain = convert_file(
        &input,
        dir.path().join("plain.pdf"),
        &ConversionOptions::new(),
    )
    .unwrap();
    let optimized = convert_file(
        &input,
        dir.path().join("opt.pdf"),
        &ConversionOptions::new().optimize(true),
    )
    .unwrap();

    assert!(optimized.output_bytes <= plain.output_bytes);
    assert!(optimized.optimized);
    assert!(optimized.optimize.is_some());
}

#[test]
fn conversion_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, "doc.md", "# Title\n\nBody paragraph.\n\n---\n\nMore.");

    let options = ConversionOptions::new().optimize(true);
    convert_file(&input, dir.path().join("a.pdf"), &options).unwrap();
    convert_file(&input, dir.path().join("b.pdf"), &options).unwrap();

    let a = fs::read(dir.path().join("a.pdf")).unwrap();
    let b = fs::read(dir.path().join("b.pdf")).unwrap();
    assert_eq!(a, b);
}

#[test]
fn empty_input_fails_with_empty_document() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, "empty.txt", "");

    let result = convert_file(
        &input,
        dir.path().join("out.pdf"),
        &ConversionOptions::new(),
    );
    assert!(matches!(result, Err(Error::EmptyDocument)));
}

#[test]
fn unsupported_extension_fails_decode() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, "doc.xyz", "content");

    let result = convert_file(
        &input,
        dir.path().join("out.pdf"),
        &ConversionOptions::new(),
    );
    assert!(matches!(result, Err(Error::Decode(_))));
}

#[test]
fn observer_reports_steps_in_pipeline_order() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, "doc.txt", THREE_PARAGRAPHS);
    let output = dir.path().join("doc.pdf");

    let mut steps = Vec::new();
    Pipeline::new()
        .convert_with_observer(
            &input,
            &output,
            &ConversionOptions::new().optimize(true),
            |s| steps.push(s),
        )
        .unwrap();

    assert_eq!(
        steps,
        vec![
            PipelineStep::Validate,
            PipelineStep::Decode,
            PipelineStep::Resolve,
            PipelineStep::Paginate,
            PipelineStep::Stage,
            PipelineStep::Optimize,
            PipelineStep::Finalize,
        ]
    );
}

#[test]
fn no_staging_files_survive_success() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, "doc.txt", THREE_PARAGRAPHS);
    let output = dir.path().join("doc.pdf");

    convert_file(&input, &output, &ConversionOptions::new().optimize(true)).unwrap();

    let leftovers = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().contains("stage"))
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn markdown_structure_survives_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        &dir,
        "doc.md",
        "# Heading\n\nIntro paragraph.\n\n| A | B |\n| --- | --- |\n| 1 | 2 |",
    );

    let fixed = paginate_file(&input, &ConversionOptions::new()).unwrap();
    let text = fixed.plain_text();
    assert!(text.contains("Heading"));
    assert!(text.contains("Intro paragraph."));
    assert!(text.contains('1') && text.contains('2'));
}

//! Conversion pipeline orchestration.
//!
//! Sequences validation → decode → geometry resolution → pagination →
//! staging → optional optimization → atomic replacement of the output
//! path. Staging files are `tempfile` handles created next to the output,
//! so they are removed on every exit path; the destination is only ever
//! touched by the final atomic persist, and a pre-existing file at the
//! output path survives any failure.
//!
//! Concurrent conversions targeting the same output path are not
//! serialized; the atomic rename makes the result last-writer-wins.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::decode::DecoderRegistry;
use crate::error::{Error, Result};
use crate::graph::{build_graph, ObjectGraph};
use crate::layout::ConversionOptions;
use crate::optimize::{optimize, OptimizeStats};
use crate::paginate::paginate;
use crate::writer::{write_graph, WriteOptions};

use serde::Serialize;

/// Pipeline stages, reported to observers as each begins.
///
/// Progress, if surfaced at all, is derived from these completions; the
/// pipeline itself never fabricates progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    Validate,
    Decode,
    Resolve,
    Paginate,
    Stage,
    Optimize,
    Finalize,
}

impl PipelineStep {
    /// Total number of steps, for observer-driven progress displays.
    pub const COUNT: u64 = 7;
}

impl std::fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStep::Validate => "validate input",
            PipelineStep::Decode => "decode",
            PipelineStep::Resolve => "resolve layout",
            PipelineStep::Paginate => "paginate",
            PipelineStep::Stage => "stage output",
            PipelineStep::Optimize => "optimize",
            PipelineStep::Finalize => "finalize",
        };
        write!(f, "{}", name)
    }
}

/// Summary returned by a successful conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertReport {
    /// Pages in the produced document
    pub page_count: u32,

    /// Size of the final artifact in bytes
    pub output_bytes: u64,

    /// Whether the final artifact is the optimized one
    pub optimized: bool,

    /// Optimizer statistics when optimization ran and was kept
    pub optimize: Option<OptimizeStats>,

    /// Non-fatal degradations (e.g. optimization skipped)
    pub warnings: Vec<String>,
}

impl ConvertReport {
    /// Serialize the report as pretty JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("report serialization")
    }
}

/// The conversion pipeline with its decoder registry.
pub struct Pipeline {
    registry: DecoderRegistry,
}

impl Pipeline {
    /// Pipeline with the built-in decoders.
    pub fn new() -> Self {
        Self {
            registry: DecoderRegistry::with_defaults(),
        }
    }

    /// Pipeline with a caller-supplied decoder registry.
    pub fn with_registry(registry: DecoderRegistry) -> Self {
        Self { registry }
    }

    /// Convert `input` to a paginated document at `output`.
    pub fn convert(
        &self,
        input: &Path,
        output: &Path,
        options: &ConversionOptions,
    ) -> Result<ConvertReport> {
        self.convert_with_observer(input, output, options, |_| {})
    }

    /// Convert, reporting each pipeline step to the observer as it starts.
    pub fn convert_with_observer(
        &self,
        input: &Path,
        output: &Path,
        options: &ConversionOptions,
        mut on_step: impl FnMut(PipelineStep),
    ) -> Result<ConvertReport> {
        on_step(PipelineStep::Validate);
        if !input.is_file() {
            return Err(Error::InputNotFound(input.to_path_buf()));
        }
        // Cheap magic-byte sniff to reject binary garbage early; an empty
        // file is still handed to the decoder so it surfaces as an empty
        // document rather than an unknown format.
        if fs::metadata(input)?.len() > 0 {
            crate::detect::detect_format_from_path(input)?;
        }

        on_step(PipelineStep::Decode);
        let flow = self.registry.decode_file(input)?;

        on_step(PipelineStep::Resolve);
        let geometry = options.geometry();
        log::debug!(
            "resolved layout: {} {} -> {}x{}pt",
            options.page_size,
            options.orientation,
            geometry.width,
            geometry.height
        );

        on_step(PipelineStep::Paginate);
        let fixed = paginate(&flow, geometry, options.margins, options.preserve_formatting)?;
        let page_count = fixed.page_count();
        log::info!("paginated {} blocks into {} pages", flow.block_count(), page_count);

        let graph = build_graph(&fixed);
        log::debug!(
            "object graph: {} objects, {} stream payload bytes",
            graph.len(),
            graph.payload_bytes()
        );
        let outcome = persist_graph(graph, output, options, &mut on_step)?;

        Ok(ConvertReport {
            page_count,
            output_bytes: outcome.output_bytes,
            optimized: outcome.optimized,
            optimize: outcome.stats,
            warnings: outcome.warnings,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of staging and persisting a graph.
#[derive(Debug)]
pub struct PersistOutcome {
    pub output_bytes: u64,
    pub optimized: bool,
    pub stats: Option<OptimizeStats>,
    pub warnings: Vec<String>,
}

/// Stage a graph next to `output` and atomically persist the winner.
///
/// Writes the classic serialization to a staging file first; if
/// optimization is requested, deduplicates a scratch copy and stages the
/// compressed serialization, falling back to the plain artifact on an
/// optimization error unless the options require optimization to succeed.
/// The file at `output` is replaced atomically (store-then-swap); staging
/// files never outlive this call.
pub fn persist_graph(
    graph: ObjectGraph,
    output: &Path,
    options: &ConversionOptions,
    on_step: &mut impl FnMut(PipelineStep),
) -> Result<PersistOutcome> {
    on_step(PipelineStep::Stage);
    let plain = write_graph(&graph, &WriteOptions::classic())?;

    let out_dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(out_dir)?;

    let mut staged = stage_file(out_dir)?;
    staged.write_all(&plain)?;
    staged.flush()?;

    let mut winner = staged;
    let mut output_bytes = plain.len() as u64;
    let mut optimized = false;
    let mut stats = None;
    let mut warnings = Vec::new();

    if options.optimize {
        on_step(PipelineStep::Optimize);
        match optimize_and_encode(&graph) {
            Ok((pass_stats, bytes)) => {
                if bytes.len() as u64 <= output_bytes {
                    let mut staged_opt = stage_file(out_dir)?;
                    staged_opt.write_all(&bytes)?;
                    staged_opt.flush()?;
                    // Dropping the plain staging file removes it.
                    winner = staged_opt;
                    output_bytes = bytes.len() as u64;
                    optimized = true;
                    stats = Some(pass_stats);
                } else {
                    log::warn!(
                        "optimized artifact ({} bytes) larger than plain ({} bytes); keeping plain",
                        bytes.len(),
                        output_bytes
                    );
                    warnings.push("optimization produced no size win; kept plain output".into());
                }
            }
            Err(e) if e.is_recoverable() && !options.require_optimization => {
                log::warn!("optimization failed: {}; keeping non-optimized output", e);
                warnings.push(format!("optimization skipped: {}", e));
            }
            Err(e) => return Err(e),
        }
    }

    on_step(PipelineStep::Finalize);
    winner
        .persist(output)
        .map_err(|e| Error::Io(e.error))?;

    Ok(PersistOutcome {
        output_bytes,
        optimized,
        stats,
        warnings,
    })
}

fn stage_file(dir: &Path) -> Result<tempfile::NamedTempFile> {
    tempfile::Builder::new()
        .prefix(".topdf-stage-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(Error::Io)
}

/// Deduplicate a scratch copy of the graph and serialize it compressed.
fn optimize_and_encode(graph: &ObjectGraph) -> Result<(OptimizeStats, Vec<u8>)> {
    let mut scratch = graph.clone();
    let stats = optimize(&mut scratch)?;
    let bytes = write_graph(&scratch, &WriteOptions::compressed())?;
    log::debug!(
        "optimization merged {} duplicates, dropped {} unreachable objects",
        stats.duplicates_merged,
        stats.unreachable_dropped
    );
    Ok((stats, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Object;
    use std::fs;

    fn sample_graph() -> ObjectGraph {
        let mut doc = crate::model::FlowDocument::new();
        doc.add_paragraph(crate::model::Paragraph::with_text("Staging test."));
        let fixed = paginate(
            &doc,
            crate::layout::resolve("A4", "Portrait"),
            crate::layout::Margins::default(),
            false,
        )
        .unwrap();
        build_graph(&fixed)
    }

    fn staging_leftovers(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_string_lossy()
                    .starts_with(".topdf-stage-")
            })
            .count()
    }

    #[test]
    fn test_persist_plain() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.pdf");
        let outcome = persist_graph(
            sample_graph(),
            &out,
            &ConversionOptions::new(),
            &mut |_| {},
        )
        .unwrap();

        assert!(out.is_file());
        assert_eq!(fs::metadata(&out).unwrap().len(), outcome.output_bytes);
        assert_eq!(staging_leftovers(dir.path()), 0);
    }

    #[test]
    fn test_optimization_failure_falls_back_to_plain() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.pdf");

        // Corrupt the graph with a dangling reference: the classic writer
        // does not chase references, but the optimizer does.
        let mut graph = sample_graph();
        graph.objects[0] = Object::Array(vec![Object::Reference(0), Object::Reference(9999)]);

        let outcome = persist_graph(
            graph,
            &out,
            &ConversionOptions::new().optimize(true),
            &mut |_| {},
        )
        .unwrap();

        assert!(!outcome.optimized);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(out.is_file());
        let bytes = fs::read(&out).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(staging_leftovers(dir.path()), 0);
    }

    #[test]
    fn test_required_optimization_failure_is_fatal_and_clean() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.pdf");
        fs::write(&out, b"previous artifact").unwrap();

        let mut graph = sample_graph();
        graph.objects[0] = Object::Array(vec![Object::Reference(9999)]);

        let result = persist_graph(
            graph,
            &out,
            &ConversionOptions::new().optimize(true).require_optimization(true),
            &mut |_| {},
        );

        assert!(matches!(result, Err(Error::Optimization(_))));
        // The pre-existing output file is untouched and staging is clean.
        assert_eq!(fs::read(&out).unwrap(), b"previous artifact");
        assert_eq!(staging_leftovers(dir.path()), 0);
    }

    #[test]
    fn test_persist_replaces_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.pdf");
        fs::write(&out, b"old contents").unwrap();

        persist_graph(sample_graph(), &out, &ConversionOptions::new(), &mut |_| {}).unwrap();
        let bytes = fs::read(&out).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_observer_sees_steps_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.pdf");
        let mut steps = Vec::new();
        persist_graph(
            sample_graph(),
            &out,
            &ConversionOptions::new().optimize(true),
            &mut |s| steps.push(s),
        )
        .unwrap();

        assert_eq!(
            steps,
            vec![
                PipelineStep::Stage,
                PipelineStep::Optimize,
                PipelineStep::Finalize
            ]
        );
    }
}

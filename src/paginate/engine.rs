//! Page packing: flow blocks into fixed pages.

use rayon::prelude::*;
use unicode_normalization::UnicodeNormalization;

use super::measure::{wrap, WrappedLine};
use crate::error::{Error, Result};
use crate::fixed::{FixedDocument, FixedPage, FontFamily, FontSpec, PlacedElement, TextLine, TextSegment};
use crate::layout::{Margins, PageGeometry};
use crate::model::{Alignment, Block, FlowDocument, InlineContent, Paragraph, Table};

/// Default body font size in points.
const BODY_SIZE: f32 = 12.0;

/// Heading sizes by level (1-6).
const HEADING_SIZES: [f32; 6] = [24.0, 18.0, 15.0, 13.0, 12.0, 11.0];

/// Default line spacing multiplier.
const LINE_SPACING: f32 = 1.2;

/// Horizontal cell padding inside tables.
const CELL_PADDING: f32 = 3.0;

/// Vertical breathing room around rules and images.
const BLOCK_GAP: f32 = 6.0;

/// Break rules applied when a paragraph splits across pages.
#[derive(Debug, Clone)]
pub struct PaginationRules {
    /// Minimum lines kept on the page before a break (orphan control)
    pub min_lines_before_break: usize,
    /// Minimum lines carried to the next page (widow control)
    pub min_lines_after_break: usize,
    /// Keep a heading on the same page as the following content
    pub keep_heading_with_next: bool,
}

impl Default for PaginationRules {
    fn default() -> Self {
        Self {
            min_lines_before_break: 2,
            min_lines_after_break: 2,
            keep_heading_with_next: true,
        }
    }
}

/// Paginate a flow document into fixed pages.
///
/// Deterministic for a given input: block measurement runs in parallel but
/// packing walks blocks strictly in document order. Fails on an empty
/// document or on an unbreakable element that can never fit the geometry.
pub fn paginate(
    doc: &FlowDocument,
    geometry: PageGeometry,
    margins: Margins,
    preserve_formatting: bool,
) -> Result<FixedDocument> {
    if doc.is_empty() {
        return Err(Error::EmptyDocument);
    }
    if geometry.width <= 0.0 || geometry.height <= 0.0 {
        return Err(Error::Geometry(format!(
            "non-positive page dimensions: {}x{}",
            geometry.width, geometry.height
        )));
    }

    let content_w = geometry.content_width(margins);
    let content_h = geometry.content_height(margins);
    if content_w <= 0.0 || content_h <= 0.0 {
        return Err(Error::Geometry(
            "margins leave no usable content area".into(),
        ));
    }

    let prepared: Result<Vec<Prepared>> = doc
        .blocks
        .par_iter()
        .enumerate()
        .map(|(i, block)| prepare_block(i, block, doc, content_w, content_h, preserve_formatting))
        .collect();
    let prepared = prepared?;

    let mut packer = Packer::new(doc, geometry, margins);
    for (i, block) in prepared.iter().enumerate() {
        packer.place(i, block, &prepared)?;
    }
    packer.finish()
}

/// A block measured and wrapped, ready for packing.
enum Prepared {
    Lines {
        lines: Vec<WrappedLine>,
        leading: f32,
        space_before: f32,
        space_after: f32,
        alignment: Alignment,
        heading: bool,
    },
    Table {
        rows: Vec<PreparedRow>,
        col_offsets: Vec<f32>,
        width: f32,
        height: f32,
        header_rows: usize,
        leading: f32,
    },
    Image {
        resource_id: String,
        width: f32,
        height: f32,
    },
    Rule,
    PageBreak,
    Skip,
}

struct PreparedRow {
    cells: Vec<Vec<WrappedLine>>,
    height: f32,
}

fn prepare_block(
    index: usize,
    block: &Block,
    doc: &FlowDocument,
    content_w: f32,
    content_h: f32,
    preserve: bool,
) -> Result<Prepared> {
    match block {
        Block::Paragraph(p) => Ok(prepare_paragraph(p, content_w, preserve)),
        Block::Table(t) => prepare_table(index, t, content_w, content_h, preserve),
        Block::Image {
            resource_id,
            width,
            height,
            ..
        } => prepare_image(index, resource_id, *width, *height, doc, content_w, content_h),
        Block::HorizontalRule => Ok(Prepared::Rule),
        Block::PageBreak => Ok(Prepared::PageBreak),
    }
}

/// Resolve the effective font and size of one run within a paragraph.
fn run_style(
    run_style: &crate::model::TextStyle,
    paragraph: &Paragraph,
    preserve: bool,
) -> (FontSpec, f32) {
    let family = if preserve {
        run_style
            .font_name
            .as_deref()
            .map(FontFamily::from_name)
            .unwrap_or(FontFamily::Helvetica)
    } else {
        // Normalized mode collapses custom families to the standard one.
        FontFamily::Helvetica
    };

    let mut spec = FontSpec {
        family,
        bold: run_style.bold,
        italic: run_style.italic,
    };

    let default_size = paragraph
        .heading_level()
        .map(|lvl| HEADING_SIZES[(lvl as usize).saturating_sub(1).min(5)])
        .unwrap_or(BODY_SIZE);
    let size = run_style.font_size.unwrap_or(default_size);

    // Headings render bold in either mode.
    if paragraph.is_heading() {
        spec.bold = true;
    }

    (spec, size)
}

fn prepare_paragraph(p: &Paragraph, content_w: f32, preserve: bool) -> Prepared {
    let mut runs: Vec<(FontSpec, f32, String)> = Vec::new();
    for item in &p.content {
        match item {
            InlineContent::Text(run) => {
                let (spec, size) = run_style(&run.style, p, preserve);
                let text = if preserve {
                    run.text.clone()
                } else {
                    normalize_text(&run.text)
                };
                runs.push((spec, size, text));
            }
            InlineContent::LineBreak => {
                if let Some(last) = runs.last_mut() {
                    last.2.push('\n');
                } else {
                    let (spec, size) = run_style(&Default::default(), p, preserve);
                    runs.push((spec, size, "\n".into()));
                }
            }
        }
    }

    let borrowed: Vec<(FontSpec, f32, &str)> =
        runs.iter().map(|(s, z, t)| (*s, *z, t.as_str())).collect();
    let lines = wrap(&borrowed, content_w);
    if lines.is_empty() {
        return Prepared::Skip;
    }

    let base_size = lines.iter().map(|l| l.max_size()).fold(0.0, f32::max);
    let spacing = if preserve {
        p.style.line_spacing.unwrap_or(LINE_SPACING)
    } else {
        LINE_SPACING
    };
    let heading = p.is_heading();

    let default_before = if heading { base_size * 0.6 } else { 0.0 };
    let default_after = if heading { base_size * 0.3 } else { base_size * 0.5 };
    let (space_before, space_after) = if preserve {
        (
            p.style.space_before.unwrap_or(default_before),
            p.style.space_after.unwrap_or(default_after),
        )
    } else {
        (default_before, default_after)
    };

    Prepared::Lines {
        lines,
        leading: base_size * spacing,
        space_before,
        space_after,
        alignment: p.style.alignment,
        heading,
    }
}

fn prepare_table(
    index: usize,
    table: &Table,
    content_w: f32,
    content_h: f32,
    preserve: bool,
) -> Result<Prepared> {
    if table.is_empty() {
        return Ok(Prepared::Skip);
    }

    let cols = table.column_count();
    let widths: Vec<f32> = match &table.column_widths {
        Some(w) => w.clone(),
        None => vec![content_w / cols as f32; cols],
    };
    let width: f32 = widths.iter().sum();
    if width > content_w + 0.5 {
        return Err(Error::Conversion(format!(
            "block {}: table width {:.0}pt exceeds usable width {:.0}pt",
            index, width, content_w
        )));
    }

    let mut col_offsets = Vec::with_capacity(cols);
    let mut x = 0.0;
    for w in &widths {
        col_offsets.push(x);
        x += w;
    }

    let leading = BODY_SIZE * LINE_SPACING;
    let mut rows = Vec::with_capacity(table.row_count());
    for (row_idx, row) in table.rows.iter().enumerate() {
        let header = row_idx < table.header_rows as usize;
        let mut cells = Vec::with_capacity(cols);
        let mut max_lines = 1usize;
        for (col, cell) in row.cells.iter().enumerate() {
            let cell_w = (widths[col] - 2.0 * CELL_PADDING).max(1.0);
            let mut para = cell.content.clone();
            if header {
                for item in &mut para.content {
                    if let InlineContent::Text(run) = item {
                        run.style.bold = true;
                    }
                }
            }
            let prepared = prepare_paragraph(&para, cell_w, preserve);
            let lines = match prepared {
                Prepared::Lines { lines, .. } => lines,
                _ => Vec::new(),
            };
            max_lines = max_lines.max(lines.len());
            cells.push(lines);
        }
        rows.push(PreparedRow {
            cells,
            height: max_lines as f32 * leading + 2.0 * CELL_PADDING,
        });
    }

    let height: f32 = rows.iter().map(|r| r.height).sum();
    if height > content_h {
        return Err(Error::Conversion(format!(
            "block {}: table height {:.0}pt exceeds a full page ({:.0}pt usable)",
            index, height, content_h
        )));
    }

    Ok(Prepared::Table {
        rows,
        col_offsets,
        width,
        height,
        header_rows: table.header_rows as usize,
        leading,
    })
}

fn prepare_image(
    index: usize,
    resource_id: &str,
    width: Option<f32>,
    height: Option<f32>,
    doc: &FlowDocument,
    content_w: f32,
    content_h: f32,
) -> Result<Prepared> {
    let resource = doc.get_resource(resource_id).ok_or_else(|| {
        Error::Conversion(format!(
            "block {}: references unknown resource {:?}",
            index, resource_id
        ))
    })?;

    // Natural size falls back to pixel dimensions at 96 dpi.
    let natural_w = resource.width.map(|p| p as f32 * 72.0 / 96.0);
    let natural_h = resource.height.map(|p| p as f32 * 72.0 / 96.0);
    let mut w = width.or(natural_w).unwrap_or(content_w / 2.0);
    let mut h = height.or(natural_h).unwrap_or(w * 0.75);
    if w <= 0.0 || h <= 0.0 {
        return Err(Error::Conversion(format!(
            "block {}: image has non-positive dimensions",
            index
        )));
    }

    // Images scale down to the usable width rather than failing.
    if w > content_w {
        let factor = content_w / w;
        w = content_w;
        h *= factor;
    }
    if h > content_h {
        return Err(Error::Conversion(format!(
            "block {}: image height {:.0}pt exceeds a full page ({:.0}pt usable)",
            index, h, content_h
        )));
    }

    Ok(Prepared::Image {
        resource_id: resource_id.to_string(),
        width: w,
        height: h,
    })
}

/// NFC normalization plus whitespace collapse for the normalized mode.
fn normalize_text(text: &str) -> String {
    let nfc: String = text.nfc().collect();
    let mut out = String::with_capacity(nfc.len());
    let mut last_ws = false;
    for c in nfc.chars() {
        if c.is_whitespace() {
            if !last_ws {
                out.push(' ');
            }
            last_ws = true;
        } else {
            out.push(c);
            last_ws = false;
        }
    }
    out
}

/// Sequential packer: walks prepared blocks in order, closing pages as the
/// vertical extent is exhausted.
struct Packer<'a> {
    doc: &'a FlowDocument,
    geometry: PageGeometry,
    margins: Margins,
    rules: PaginationRules,
    out: FixedDocument,
    page: FixedPage,
    /// Current baseline cursor, measured from the bottom of the page.
    y: f32,
}

impl<'a> Packer<'a> {
    fn new(doc: &'a FlowDocument, geometry: PageGeometry, margins: Margins) -> Self {
        let mut out = FixedDocument::new(geometry, margins);
        out.metadata = doc.metadata.clone();
        Self {
            doc,
            geometry,
            margins,
            rules: PaginationRules::default(),
            out,
            page: FixedPage::new(1, geometry.width, geometry.height),
            y: geometry.height - margins.top,
        }
    }

    fn available(&self) -> f32 {
        self.y - self.margins.bottom
    }

    fn new_page(&mut self) {
        let number = self.page.number + 1;
        let finished = std::mem::replace(
            &mut self.page,
            FixedPage::new(number, self.geometry.width, self.geometry.height),
        );
        self.out.pages.push(finished);
        self.y = self.geometry.height - self.margins.top;
    }

    fn place(&mut self, index: usize, block: &Prepared, all: &[Prepared]) -> Result<()> {
        match block {
            Prepared::Skip => Ok(()),
            Prepared::PageBreak => {
                if !self.page.is_empty() {
                    self.new_page();
                }
                Ok(())
            }
            Prepared::Rule => {
                if self.available() < 2.0 * BLOCK_GAP && !self.page.is_empty() {
                    self.new_page();
                }
                self.y -= BLOCK_GAP;
                self.page.push(PlacedElement::Rule {
                    x: self.margins.left,
                    y: self.y,
                    width: self.geometry.content_width(self.margins),
                });
                self.y -= BLOCK_GAP;
                Ok(())
            }
            Prepared::Image {
                resource_id,
                width,
                height,
            } => {
                let resource = self.doc.get_resource(resource_id).ok_or_else(|| {
                    Error::Conversion(format!(
                        "block {}: references unknown resource {:?}",
                        index, resource_id
                    ))
                })?;
                if *height > self.available() {
                    if self.page.is_empty() {
                        return Err(Error::Conversion(format!(
                            "block {}: image does not fit an empty page",
                            index
                        )));
                    }
                    self.new_page();
                }
                self.y -= height + BLOCK_GAP;
                self.page.push(PlacedElement::Image {
                    resource_id: resource_id.clone(),
                    x: self.margins.left,
                    y: self.y + BLOCK_GAP,
                    width: *width,
                    height: *height,
                });
                self.out.pool_resource(resource_id.clone(), resource.clone());
                Ok(())
            }
            Prepared::Table {
                rows,
                col_offsets,
                width,
                height,
                header_rows,
                leading,
            } => {
                // Unbreakable: carry over whole, even if that leaves a
                // partial page.
                if *height > self.available() && !self.page.is_empty() {
                    self.new_page();
                }
                self.place_table(rows, col_offsets, *width, *header_rows, *leading);
                Ok(())
            }
            Prepared::Lines {
                lines,
                leading,
                space_before,
                space_after,
                alignment,
                heading,
            } => {
                self.place_lines(
                    lines,
                    *leading,
                    *space_before,
                    *space_after,
                    *alignment,
                    *heading,
                    index,
                    all,
                );
                Ok(())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn place_lines(
        &mut self,
        lines: &[WrappedLine],
        leading: f32,
        space_before: f32,
        space_after: f32,
        alignment: Alignment,
        heading: bool,
        index: usize,
        all: &[Prepared],
    ) {
        if !self.page.is_empty() {
            self.y -= space_before;
        }

        // Keep a heading attached to at least the first lines of what
        // follows it.
        if heading && self.rules.keep_heading_with_next && !self.page.is_empty() {
            let needed = lines.len() as f32 * leading + next_block_lead(index, all);
            if needed > self.available() {
                self.new_page();
            }
        }

        let mut remaining: &[WrappedLine] = lines;
        while !remaining.is_empty() {
            let fits = (self.available() / leading).floor() as usize;
            if fits >= remaining.len() {
                self.emit_lines(remaining, leading, alignment);
                remaining = &[];
            } else {
                let take = self.split_point(fits, remaining.len());
                if take == 0 {
                    if self.page.is_empty() {
                        // Degenerate geometry: place line by line rather
                        // than loop forever.
                        let take = fits.max(1).min(remaining.len());
                        self.emit_lines(&remaining[..take], leading, alignment);
                        remaining = &remaining[take..];
                    }
                    self.new_page();
                } else {
                    self.emit_lines(&remaining[..take], leading, alignment);
                    remaining = &remaining[take..];
                    self.new_page();
                }
            }
        }

        self.y -= space_after;
    }

    /// Lines to keep on this page honoring widow/orphan minimums.
    fn split_point(&self, fits: usize, total: usize) -> usize {
        if fits < self.rules.min_lines_before_break {
            return 0;
        }
        let mut take = fits;
        if total - take < self.rules.min_lines_after_break {
            take = total.saturating_sub(self.rules.min_lines_after_break);
        }
        if take < self.rules.min_lines_before_break {
            return 0;
        }
        take
    }

    fn emit_lines(&mut self, lines: &[WrappedLine], leading: f32, alignment: Alignment) {
        let content_w = self.geometry.content_width(self.margins);
        for line in lines {
            self.y -= leading;
            let x = match alignment {
                Alignment::Center => self.margins.left + (content_w - line.width) / 2.0,
                Alignment::Right => self.margins.left + content_w - line.width,
                Alignment::Left | Alignment::Justify => self.margins.left,
            };
            let segments = line
                .fragments
                .iter()
                .map(|f| TextSegment {
                    font: self.out.intern_font(f.spec),
                    size: f.size,
                    text: f.text.clone(),
                })
                .collect();
            self.page.push(PlacedElement::Text(TextLine {
                x,
                y: self.y,
                segments,
            }));
        }
    }

    fn place_table(
        &mut self,
        rows: &[PreparedRow],
        col_offsets: &[f32],
        width: f32,
        header_rows: usize,
        leading: f32,
    ) {
        for (row_idx, row) in rows.iter().enumerate() {
            let row_top = self.y - CELL_PADDING;
            for (col, cell_lines) in row.cells.iter().enumerate() {
                let x0 = self.margins.left + col_offsets[col] + CELL_PADDING;
                let mut cell_y = row_top;
                for line in cell_lines {
                    cell_y -= leading;
                    let segments = line
                        .fragments
                        .iter()
                        .map(|f| TextSegment {
                            font: self.out.intern_font(f.spec),
                            size: f.size,
                            text: f.text.clone(),
                        })
                        .collect();
                    self.page.push(PlacedElement::Text(TextLine {
                        x: x0,
                        y: cell_y,
                        segments,
                    }));
                }
            }
            self.y -= row.height;
            if header_rows > 0 && row_idx + 1 == header_rows {
                self.page.push(PlacedElement::Rule {
                    x: self.margins.left,
                    y: self.y,
                    width,
                });
            }
        }
        self.y -= BLOCK_GAP;
    }

    fn finish(mut self) -> Result<FixedDocument> {
        if !self.page.is_empty() {
            self.out.pages.push(self.page);
        }
        if self.out.pages.is_empty() {
            return Err(Error::EmptyDocument);
        }
        Ok(self.out)
    }
}

/// Leading of the first lines of the next placeable block, used for
/// keep-with-next decisions.
fn next_block_lead(index: usize, all: &[Prepared]) -> f32 {
    for block in all.iter().skip(index + 1) {
        match block {
            Prepared::Skip => continue,
            Prepared::Lines { leading, .. } => return 2.0 * leading,
            Prepared::Table { rows, .. } => {
                return rows.first().map(|r| r.height).unwrap_or(0.0)
            }
            Prepared::Image { height, .. } => return *height,
            Prepared::Rule | Prepared::PageBreak => return 0.0,
        }
    }
    0.0
}

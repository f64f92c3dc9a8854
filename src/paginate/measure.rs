//! Text measurement and line wrapping.
//!
//! Widths come from a static per-character table in 1/1000 em units for the
//! standard sans family, with family factors for serif and a fixed advance
//! for monospace. An intentional approximation: exact glyph metrics belong
//! to a rasterizer, while static tables are deterministic and close enough
//! to decide line and page breaks.

use crate::fixed::{FontFamily, FontSpec};

/// Helvetica advance widths for ASCII 0x20..=0x7E, in 1/1000 em.
#[rustfmt::skip]
const SANS_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278,
    584, 584, 584, 556, 1015, 667, 667, 722, 722, 667, 611, 778, 722, 278,
    500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556,
    278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
    278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Fallback advance for characters outside the table, in 1/1000 em.
const DEFAULT_WIDTH: u16 = 556;

/// Monospace advance, in 1/1000 em.
const MONO_WIDTH: u16 = 600;

/// Serif families run slightly narrower than the sans table.
const SERIF_FACTOR: f32 = 0.95;

/// Bold adds a little advance across families.
const BOLD_FACTOR: f32 = 1.02;

/// Advance width of one character in em units.
pub fn char_width_em(c: char, spec: FontSpec) -> f32 {
    let base = match spec.family {
        FontFamily::Courier => MONO_WIDTH,
        _ => {
            let code = c as u32;
            if (0x20..=0x7E).contains(&code) {
                SANS_WIDTHS[(code - 0x20) as usize]
            } else {
                DEFAULT_WIDTH
            }
        }
    };

    let mut em = base as f32 / 1000.0;
    if spec.family == FontFamily::Times {
        em *= SERIF_FACTOR;
    }
    if spec.bold && spec.family != FontFamily::Courier {
        em *= BOLD_FACTOR;
    }
    em
}

/// Width of a string in points at the given size.
pub fn text_width(text: &str, spec: FontSpec, size: f32) -> f32 {
    text.chars().map(|c| char_width_em(c, spec)).sum::<f32>() * size
}

/// A styled fragment of a single word.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub spec: FontSpec,
    pub size: f32,
    pub text: String,
}

impl Fragment {
    fn width(&self) -> f32 {
        text_width(&self.text, self.spec, self.size)
    }
}

/// A wrapped line: styled fragments painted left to right.
#[derive(Debug, Clone, Default)]
pub struct WrappedLine {
    pub fragments: Vec<Fragment>,
    pub width: f32,
}

impl WrappedLine {
    /// Tallest font size on the line (0 for an empty line).
    pub fn max_size(&self) -> f32 {
        self.fragments.iter().map(|f| f.size).fold(0.0, f32::max)
    }
}

/// A word assembled across run boundaries.
#[derive(Debug, Clone, Default)]
struct Word {
    fragments: Vec<Fragment>,
    width: f32,
}

impl Word {
    fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    fn push_char(&mut self, c: char, spec: FontSpec, size: f32) {
        self.width += char_width_em(c, spec) * size;
        match self.fragments.last_mut() {
            Some(f) if f.spec == spec && f.size == size => f.text.push(c),
            _ => self.fragments.push(Fragment {
                spec,
                size,
                text: c.to_string(),
            }),
        }
    }
}

/// Greedy line wrap of styled runs to a maximum width in points.
///
/// Words keep their internal style boundaries; a word wider than the whole
/// line is hard-broken at character granularity rather than overflowing.
/// An explicit `\n` in a run forces a break.
pub fn wrap(runs: &[(FontSpec, f32, &str)], max_width: f32) -> Vec<WrappedLine> {
    let mut words: Vec<Word> = Vec::new();
    let mut breaks: Vec<usize> = Vec::new(); // word indices before which a hard break occurs
    let mut current = Word::default();

    for &(spec, size, text) in runs {
        for c in text.chars() {
            if c == '\n' {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
                breaks.push(words.len());
            } else if c.is_whitespace() {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            } else {
                current.push_char(c, spec, size);
            }
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    let mut lines: Vec<WrappedLine> = Vec::new();
    let mut line = WrappedLine::default();

    for (i, word) in words.into_iter().enumerate() {
        if breaks.contains(&i) && !line.fragments.is_empty() {
            lines.push(std::mem::take(&mut line));
        }

        let space = match word.fragments.first() {
            Some(f) if !line.fragments.is_empty() => char_width_em(' ', f.spec) * f.size,
            _ => 0.0,
        };

        if line.width + space + word.width <= max_width || line.fragments.is_empty() {
            if word.width > max_width {
                hard_break(word, max_width, &mut line, &mut lines);
            } else {
                append_word(&mut line, word, space);
            }
        } else {
            lines.push(std::mem::take(&mut line));
            if word.width > max_width {
                hard_break(word, max_width, &mut line, &mut lines);
            } else {
                append_word(&mut line, word, 0.0);
            }
        }
    }
    if !line.fragments.is_empty() {
        lines.push(line);
    }

    lines
}

fn append_word(line: &mut WrappedLine, word: Word, space: f32) {
    if space > 0.0 {
        let first = &word.fragments[0];
        push_fragment(
            line,
            Fragment {
                spec: first.spec,
                size: first.size,
                text: " ".into(),
            },
        );
        line.width += space;
    }
    line.width += word.width;
    for frag in word.fragments {
        push_fragment(line, frag);
    }
}

/// Append a fragment, merging into the previous one when styles match.
fn push_fragment(line: &mut WrappedLine, frag: Fragment) {
    match line.fragments.last_mut() {
        Some(f) if f.spec == frag.spec && f.size == frag.size => f.text.push_str(&frag.text),
        _ => line.fragments.push(frag),
    }
}

/// Split an over-long word across as many lines as needed.
fn hard_break(word: Word, max_width: f32, line: &mut WrappedLine, lines: &mut Vec<WrappedLine>) {
    for frag in word.fragments {
        for c in frag.text.chars() {
            let w = char_width_em(c, frag.spec) * frag.size;
            if line.width + w > max_width && !line.fragments.is_empty() {
                lines.push(std::mem::take(line));
            }
            match line.fragments.last_mut() {
                Some(f) if f.spec == frag.spec && f.size == frag.size => f.text.push(c),
                _ => line.fragments.push(Fragment {
                    spec: frag.spec,
                    size: frag.size,
                    text: c.to_string(),
                }),
            }
            line.width += w;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular() -> FontSpec {
        FontSpec::regular()
    }

    #[test]
    fn test_char_width_table() {
        // 'i' is narrow, 'W' is wide.
        assert!(char_width_em('i', regular()) < char_width_em('W', regular()));
        // Monospace is uniform.
        let mono = FontSpec {
            family: FontFamily::Courier,
            bold: false,
            italic: false,
        };
        assert_eq!(char_width_em('i', mono), char_width_em('W', mono));
    }

    #[test]
    fn test_text_width_scales_with_size() {
        let w12 = text_width("Hello", regular(), 12.0);
        let w24 = text_width("Hello", regular(), 24.0);
        assert!((w24 - 2.0 * w12).abs() < 0.001);
    }

    #[test]
    fn test_wrap_single_line() {
        let lines = wrap(&[(regular(), 12.0, "Hello world")], 500.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "Hello world");
    }

    #[test]
    fn test_wrap_breaks_on_width() {
        // ~33pt per word at 12pt; 80pt fits two words per line at most.
        let lines = wrap(&[(regular(), 12.0, "aaaa bbbb cccc dddd")], 80.0);
        assert!(lines.len() >= 2);
        for line in &lines {
            assert!(line.width <= 80.0 + 0.001);
        }
    }

    #[test]
    fn test_wrap_wider_lines_fewer_breaks() {
        let text = "one two three four five six seven eight nine ten";
        let narrow = wrap(&[(regular(), 12.0, text)], 100.0);
        let wide = wrap(&[(regular(), 12.0, text)], 400.0);
        assert!(wide.len() <= narrow.len());
    }

    #[test]
    fn test_wrap_hard_breaks_long_word() {
        let word = "x".repeat(200);
        let lines = wrap(&[(regular(), 12.0, word.as_str())], 60.0);
        assert!(lines.len() > 1);
        let total: usize = lines.iter().map(|l| line_text(l).len()).sum();
        assert_eq!(total, 200);
    }

    #[test]
    fn test_wrap_explicit_newline() {
        let lines = wrap(&[(regular(), 12.0, "alpha\nbeta")], 500.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(line_text(&lines[0]), "alpha");
        assert_eq!(line_text(&lines[1]), "beta");
    }

    #[test]
    fn test_wrap_keeps_style_boundaries() {
        let bold = FontSpec {
            bold: true,
            ..regular()
        };
        let lines = wrap(&[(regular(), 12.0, "plain "), (bold, 12.0, "bold")], 500.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].fragments.len(), 2);
        assert!(lines[0].fragments[1].spec.bold);
    }

    #[test]
    fn test_wrap_is_deterministic() {
        let runs = [(regular(), 12.0, "the quick brown fox jumps over the lazy dog")];
        let a = wrap(&runs, 150.0);
        let b = wrap(&runs, 150.0);
        assert_eq!(a.len(), b.len());
        for (la, lb) in a.iter().zip(&b) {
            assert_eq!(line_text(la), line_text(lb));
        }
    }

    fn line_text(line: &WrappedLine) -> String {
        line.fragments.iter().map(|f| f.text.as_str()).collect()
    }
}

//! Text measurement and wrapping used to size cells.
//!
//! Glyph shaping is outside of this crate: sizing only needs to know how wide
//! a run of text is and how far apart lines are. Anything that can answer those
//! two questions implements [TextMeasure], whether that is a parsed TrueType
//! face ([Font](crate::Font)) or a fixed-advance approximation ([FixedAdvance]).

use crate::units::Pt;
use id_arena::{Arena, Id};

const TABSIZE: usize = 4;

/// Horizontal and vertical metrics for one typeface
pub trait TextMeasure {
    /// Width of `text` set on a single line at `size`
    fn text_width(&self, text: &str, size: Pt) -> Pt;

    /// Distance between the baselines of two consecutive lines at `size`
    fn line_height(&self, size: Pt) -> Pt;
}

/// A measure where every character advances by the same fraction of the font
/// size, useful when no font file is at hand
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FixedAdvance {
    /// Advance of one character, as a fraction of the font size
    pub advance: f32,
    /// Line height, as a fraction of the font size
    pub leading: f32,
}

impl Default for FixedAdvance {
    fn default() -> Self {
        FixedAdvance {
            advance: 0.6,
            leading: 1.2,
        }
    }
}

impl TextMeasure for FixedAdvance {
    fn text_width(&self, text: &str, size: Pt) -> Pt {
        size * (self.advance * text.chars().count() as f32)
    }

    fn line_height(&self, size: Pt) -> Pt {
        size * self.leading
    }
}

/// Identifies a typeface stored in a [FontBook]
pub type FontId = Id<Box<dyn TextMeasure>>;

/// Which face and size a cell is set in
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct CellFont {
    pub id: FontId,
    pub size: Pt,
}

/// Storage for every typeface used by a table. Cells refer to faces by
/// [FontId], which stays valid for as long as the book lives.
#[derive(Default)]
pub struct FontBook {
    faces: Arena<Box<dyn TextMeasure>>,
}

impl FontBook {
    pub fn new() -> FontBook {
        FontBook::default()
    }

    /// Add a face to the book, returning the id cells use to refer to it
    pub fn add<M: TextMeasure + 'static>(&mut self, face: M) -> FontId {
        self.faces.alloc(Box::new(face))
    }

    pub fn get(&self, id: FontId) -> &dyn TextMeasure {
        self.faces[id].as_ref()
    }

    pub fn line_height(&self, font: CellFont) -> Pt {
        self.get(font.id).line_height(font.size)
    }
}

/// Replace tabs and normalize newlines so that measuring sees the same text
/// that will be painted
fn normalize(text: &str) -> String {
    text.replace('\t', &" ".repeat(TABSIZE))
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

/// Breaks `text` into the lines it occupies when set into a box `max_width`
/// wide. Lines break at whitespace where possible; a word wider than the box
/// is broken between characters so that nothing overflows. Explicit newlines
/// always start a new line. Without `wrap`, only explicit newlines break.
///
/// Empty text occupies no lines.
pub fn wrap_lines(
    text: &str,
    max_width: Pt,
    measure: &dyn TextMeasure,
    size: Pt,
    wrap: bool,
) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let text = normalize(text);

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        if !wrap {
            lines.push(paragraph.to_string());
            continue;
        }

        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };
            if measure.text_width(&candidate, size).fits_in(max_width) {
                line = candidate;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }

            // the word alone may still be too wide: break between characters
            for ch in word.chars() {
                line.push(ch);
                if line.chars().count() > 1 && !measure.text_width(&line, size).fits_in(max_width)
                {
                    line.pop();
                    lines.push(std::mem::take(&mut line));
                    line.push(ch);
                }
            }
        }
        lines.push(line);
    }
    lines
}

/// Height of `text` once wrapped into a box `max_width` wide
pub fn wrapped_height(
    text: &str,
    max_width: Pt,
    measure: &dyn TextMeasure,
    size: Pt,
    wrap: bool,
) -> Pt {
    let lines = wrap_lines(text, max_width, measure, size, wrap).len();
    measure.line_height(size) * lines as f32
}

/// Width of the widest explicit line of `text`; the width a cell wants when it
/// is never wrapped
pub fn unwrapped_width(text: &str, measure: &dyn TextMeasure, size: Pt) -> Pt {
    normalize(text)
        .split('\n')
        .map(|line| measure.text_width(line, size))
        .fold(Pt::ZERO, Pt::max)
}

/// Width of the widest single word of `text`; the narrowest a wrapping cell
/// can get without breaking inside words
pub fn longest_word_width(text: &str, measure: &dyn TextMeasure, size: Pt) -> Pt {
    normalize(text)
        .split_whitespace()
        .map(|word| measure.text_width(word, size))
        .fold(Pt::ZERO, Pt::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 10pt text, 5pt per character, 10pt lines
    fn mono() -> FixedAdvance {
        FixedAdvance {
            advance: 0.5,
            leading: 1.0,
        }
    }

    #[test]
    fn wraps_at_whitespace() {
        let lines = wrap_lines("aaa bbb ccc", Pt(35.0), &mono(), Pt(10.0), true);
        assert_eq!(lines, vec!["aaa bbb", "ccc"]);
    }

    #[test]
    fn breaks_long_words_between_characters() {
        let lines = wrap_lines("abcdefghij", Pt(25.0), &mono(), Pt(10.0), true);
        assert_eq!(lines, vec!["abcde", "fghij"]);
    }

    #[test]
    fn explicit_newlines_are_kept_without_wrapping() {
        let lines = wrap_lines("one two\r\nthree", Pt(10.0), &mono(), Pt(10.0), false);
        assert_eq!(lines, vec!["one two", "three"]);
        assert_eq!(
            wrapped_height("one\n\nthree", Pt(100.0), &mono(), Pt(10.0), true),
            Pt(30.0)
        );
    }

    #[test]
    fn empty_text_has_no_height() {
        assert_eq!(wrapped_height("", Pt(100.0), &mono(), Pt(10.0), true), Pt::ZERO);
    }

    #[test]
    fn long_paragraphs_fill_the_box() {
        let text = lipsum::lipsum(120);
        let lines = wrap_lines(&text, Pt(200.0), &mono(), Pt(10.0), true);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(mono().text_width(line, Pt(10.0)).fits_in(Pt(200.0)));
        }
    }

    #[test]
    fn natural_widths() {
        assert_eq!(unwrapped_width("ab\nabcd", &mono(), Pt(10.0)), Pt(20.0));
        assert_eq!(longest_word_width("a abc ab", &mono(), Pt(10.0)), Pt(15.0));
    }

    #[test]
    fn font_book_hands_out_stable_ids() {
        let mut book = FontBook::new();
        let small = book.add(FixedAdvance::default());
        let wide = book.add(FixedAdvance {
            advance: 1.0,
            leading: 2.0,
        });
        let font = CellFont {
            id: wide,
            size: Pt(10.0),
        };
        assert_eq!(book.line_height(font), Pt(20.0));
        assert!(book.get(small).text_width("ab", Pt(10.0)).approx_eq(Pt(12.0)));
    }
}

//! Band elements other than tables.

use crate::colour::Colour;
use crate::flow::{Fragment, Placeable, PlacementFrame, PlacementResult};
use crate::measure::{wrap_lines, CellFont, FontBook};
use crate::rect::Rect;
use crate::units::{Pt, EPSILON};
use crate::LayoutError;
use std::rc::Rc;

/// A block of wrapped text. Growable text continues line by line into the
/// following frames; fixed text is clipped to its design rectangle.
pub struct TextElement {
    text: String,
    font: CellFont,
    fonts: Rc<FontBook>,
    grow: bool,
    lines: Option<Vec<String>>,
    next_line: usize,
}

impl TextElement {
    pub fn new<S: ToString>(text: S, font: CellFont, fonts: Rc<FontBook>) -> TextElement {
        TextElement {
            text: text.to_string(),
            font,
            fonts,
            grow: true,
            lines: None,
            next_line: 0,
        }
    }

    /// Keep the text inside its design rectangle
    pub fn fixed(mut self) -> TextElement {
        self.grow = false;
        self
    }

    /// Lines not placed yet
    pub fn remaining_lines(&self) -> Option<usize> {
        self.lines
            .as_ref()
            .map(|lines| lines.len() - self.next_line)
    }
}

impl Placeable for TextElement {
    fn try_place(&mut self, frame: &PlacementFrame) -> Result<PlacementResult, LayoutError> {
        let area = frame.area;
        // wrapped once, at the width of the first frame
        let lines = self.lines.get_or_insert_with(|| {
            wrap_lines(
                &self.text,
                area.width(),
                self.fonts.get(self.font.id),
                self.font.size,
                true,
            )
        });
        let left = lines.len() - self.next_line;
        if left == 0 {
            return Ok(PlacementResult::finished());
        }

        let line_height = self.fonts.line_height(self.font);
        let mut fit = if line_height > Pt::ZERO {
            ((area.height() + Pt(EPSILON)) / line_height).floor() as usize
        } else {
            left
        };
        if fit == 0 && frame.at_top {
            fit = 1;
        }
        let count = fit.min(left);
        if count == 0 {
            return Ok(if self.grow {
                PlacementResult::deferred()
            } else {
                PlacementResult::finished()
            });
        }

        let first = self.next_line;
        let height = line_height * count as f32;
        let fragment = Fragment::Lines {
            first,
            lines: lines[first..first + count].to_vec(),
            rect: Rect::new(area.x1, area.y1, area.width(), height),
        };
        self.next_line = if self.grow { first + count } else { lines.len() };

        Ok(PlacementResult {
            height,
            fragments: vec![fragment],
            more: self.next_line < lines.len(),
        })
    }

    fn can_grow(&self) -> bool {
        self.grow
    }

    fn reset_print(&mut self) {
        self.lines = None;
        self.next_line = 0;
    }
}

/// A picture of a fixed size. It is never split: when it does not fit the
/// frame it waits for the next one, unless it already sits at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageElement {
    width: Pt,
    height: Pt,
    placed: bool,
}

impl ImageElement {
    pub fn new<W: Into<Pt>, H: Into<Pt>>(width: W, height: H) -> ImageElement {
        ImageElement {
            width: width.into(),
            height: height.into(),
            placed: false,
        }
    }
}

impl Placeable for ImageElement {
    fn try_place(&mut self, frame: &PlacementFrame) -> Result<PlacementResult, LayoutError> {
        if self.placed {
            return Ok(PlacementResult::finished());
        }
        let area = frame.area;
        if !self.height.fits_in(area.height()) && !frame.at_top {
            return Ok(PlacementResult::deferred());
        }
        self.placed = true;
        let height = self.height.min(area.height());
        Ok(PlacementResult {
            height,
            fragments: vec![Fragment::Block {
                rect: Rect::new(area.x1, area.y1, self.width.min(area.width()), height),
            }],
            more: false,
        })
    }

    fn can_grow(&self) -> bool {
        false
    }

    fn reset_print(&mut self) {
        self.placed = false;
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Ellipse,
    Line,
}

/// A vector shape filling its design rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeElement {
    pub kind: ShapeKind,
    pub stroke: Option<Colour>,
    pub fill: Option<Colour>,
    placed: bool,
}

impl ShapeElement {
    pub fn new(kind: ShapeKind) -> ShapeElement {
        ShapeElement {
            kind,
            stroke: Some(Colour::default()),
            fill: None,
            placed: false,
        }
    }

    pub fn with_fill(mut self, fill: Colour) -> ShapeElement {
        self.fill = Some(fill);
        self
    }
}

impl Placeable for ShapeElement {
    fn try_place(&mut self, frame: &PlacementFrame) -> Result<PlacementResult, LayoutError> {
        if self.placed {
            return Ok(PlacementResult::finished());
        }
        self.placed = true;
        Ok(PlacementResult {
            height: frame.area.height(),
            fragments: vec![Fragment::Block { rect: frame.area }],
            more: false,
        })
    }

    fn can_grow(&self) -> bool {
        false
    }

    fn reset_print(&mut self) {
        self.placed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::FixedAdvance;

    fn text(value: &str) -> TextElement {
        let mut fonts = FontBook::new();
        let id = fonts.add(FixedAdvance {
            advance: 0.5,
            leading: 1.0,
        });
        let font = CellFont {
            id,
            size: Pt(10.0),
        };
        TextElement::new(value, font, Rc::new(fonts))
    }

    fn frame(height: f32, at_top: bool) -> PlacementFrame {
        let area = Rect::new(Pt::ZERO, Pt::ZERO, Pt(50.0), Pt(height));
        PlacementFrame {
            area,
            following: vec![area],
            at_top,
        }
    }

    #[test]
    fn text_continues_line_by_line() {
        // 10 characters per line, three lines
        let mut element = text("aaaa bbbb cccc dddd eeee ffff");
        let first = element.try_place(&frame(25.0, true)).expect("text is placed");
        assert_eq!(first.height, Pt(20.0));
        assert!(first.more);
        assert_eq!(element.remaining_lines(), Some(1));

        let second = element.try_place(&frame(25.0, true)).expect("text is placed");
        assert_eq!(second.height, Pt(10.0));
        assert!(!second.more);
        match &second.fragments[0] {
            Fragment::Lines { first, lines, .. } => {
                assert_eq!(*first, 2);
                assert_eq!(lines, &vec!["eeee ffff".to_string()]);
            }
            other => panic!("unexpected fragment {other:?}"),
        }
    }

    #[test]
    fn long_text_is_placed_exactly_once() {
        let source = lipsum::lipsum(120);
        let mut element = text(&source);
        let mut placed = Vec::new();
        loop {
            let result = element.try_place(&frame(95.0, true)).expect("text is placed");
            for fragment in &result.fragments {
                if let Fragment::Lines { first, lines, .. } = fragment {
                    assert_eq!(*first, placed.len());
                    placed.extend(lines.iter().cloned());
                }
            }
            if !result.more {
                break;
            }
        }
        let all = wrap_lines(
            &source,
            Pt(50.0),
            &FixedAdvance {
                advance: 0.5,
                leading: 1.0,
            },
            Pt(10.0),
            true,
        );
        assert!(all.len() > 9);
        assert_eq!(placed, all);
    }

    #[test]
    fn text_waits_unless_at_the_top() {
        let mut element = text("aaaa");
        assert_eq!(
            element.try_place(&frame(5.0, false)).expect("text is placed"),
            PlacementResult::deferred()
        );
        let forced = element.try_place(&frame(5.0, true)).expect("text is placed");
        assert_eq!(forced.height, Pt(10.0));
        assert!(!forced.more);
    }

    #[test]
    fn fixed_text_is_clipped() {
        let mut element = text("aaaa bbbb cccc dddd eeee ffff").fixed();
        let result = element.try_place(&frame(15.0, false)).expect("text is placed");
        assert_eq!(result.height, Pt(10.0));
        assert!(!result.more);
        assert!(!element.can_grow());
    }

    #[test]
    fn images_are_never_split() {
        let mut image = ImageElement::new(40.0, 30.0);
        assert!(image.try_place(&frame(20.0, false)).expect("placed").more);
        let placed = image.try_place(&frame(40.0, false)).expect("placed");
        assert_eq!(placed.height, Pt(30.0));
        assert_eq!(
            placed.fragments,
            vec![Fragment::Block {
                rect: Rect::new(Pt::ZERO, Pt::ZERO, Pt(40.0), Pt(30.0))
            }]
        );
        image.reset_print();
        let forced = image.try_place(&frame(20.0, true)).expect("placed");
        assert_eq!(forced.height, Pt(20.0));
    }

    #[test]
    fn shapes_fill_their_slot() {
        let mut shape = ShapeElement::new(ShapeKind::Ellipse);
        let result = shape.try_place(&frame(12.0, false)).expect("placed");
        assert_eq!(result.height, Pt(12.0));
        assert!(shape.try_place(&frame(12.0, false)).expect("placed").fragments.is_empty());
    }
}

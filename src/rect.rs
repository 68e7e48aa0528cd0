use crate::units::*;

/// A rectangle in layout space, specified by two opposite corners. Layout space
/// has its origin at the top-left of a page and `y` grows downward, the way
/// rows and band elements are stacked; [paint_region](crate::render::paint_region)
/// flips it into PDF space when drawing.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Rect {
    /// The x-coordinate of the top-left corner.
    pub x1: Pt,
    /// The y-coordinate of the top-left corner.
    pub y1: Pt,
    /// The x-coordinate of the bottom-right corner.
    pub x2: Pt,
    /// The y-coordinate of the bottom-right corner.
    pub y2: Pt,
}

impl Rect {
    /// Create a rectangle from its top-left corner and size
    pub fn new(x: Pt, y: Pt, width: Pt, height: Pt) -> Rect {
        Rect {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y + height,
        }
    }

    pub fn width(&self) -> Pt {
        self.x2 - self.x1
    }

    pub fn height(&self) -> Pt {
        self.y2 - self.y1
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= Pt::ZERO || self.height() <= Pt::ZERO
    }

    /// The same rectangle moved by `(dx, dy)`
    pub fn translate(&self, dx: Pt, dy: Pt) -> Rect {
        Rect {
            x1: self.x1 + dx,
            y1: self.y1 + dy,
            x2: self.x2 + dx,
            y2: self.y2 + dy,
        }
    }

    /// The same top-left corner with a different height
    pub fn with_height(&self, height: Pt) -> Rect {
        Rect {
            y2: self.y1 + height,
            ..*self
        }
    }

    /// The overlapping part of two rectangles, if any
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        };
        if r.x2 < r.x1 || r.y2 < r.y1 {
            None
        } else {
            Some(r)
        }
    }

    /// Convert into PDF user space (origin bottom-left) for a page of the
    /// given height
    pub fn to_pdf(&self, page_height: Pt) -> pdf_writer::Rect {
        pdf_writer::Rect {
            x1: self.x1.0,
            y1: (page_height - self.y2).0,
            x2: self.x2.0,
            y2: (page_height - self.y1).0,
        }
    }
}

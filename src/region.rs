//! Regions of a paginated grid and the geometry consumers query for them.

use crate::rect::Rect;
use crate::sizer::GridLayoutState;
use crate::units::Pt;
use std::collections::HashSet;

/// The space available to a table in one frame of a page
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Frame {
    pub width: Pt,
    pub height: Pt,
}

impl Frame {
    pub fn new<W: Into<Pt>, H: Into<Pt>>(width: W, height: H) -> Frame {
        Frame {
            width: width.into(),
            height: height.into(),
        }
    }

    /// The frame available inside a layout rectangle
    pub fn of(rect: &Rect) -> Frame {
        Frame {
            width: rect.width().non_negative(),
            height: rect.height().non_negative(),
        }
    }
}

/// The frame a table starts in, followed by the frames it continues into.
/// The following frames repeat cyclically, the way page templates do.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSequence {
    first: Frame,
    following: Vec<Frame>,
}

impl FrameSequence {
    pub fn new(first: Frame, following: Vec<Frame>) -> FrameSequence {
        FrameSequence { first, following }
    }

    /// Every frame is the same size
    pub fn uniform(frame: Frame) -> FrameSequence {
        FrameSequence::new(frame, Vec::new())
    }

    /// The frame at `index`, 0 being the first frame
    pub fn get(&self, index: usize) -> Frame {
        if index == 0 || self.following.is_empty() {
            self.first
        } else {
            self.following[(index - 1) % self.following.len()]
        }
    }
}

/// A rectangle of data cells in layout index space. Header rows and columns
/// are not part of it; they repeat implicitly on every region.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Region {
    /// First column
    pub x: usize,
    /// First layout row
    pub y: usize,
    /// Number of columns
    pub width: usize,
    /// Number of layout rows
    pub height: usize,
}

impl Region {
    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.y..self.y + self.height).contains(&row) && (self.x..self.x + self.width).contains(&col)
    }
}

/// One entry of a paginated table
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RegionItem {
    Region(Region),
    /// Forced break: nothing more of the table goes into the current frame
    AreaBreak,
}

/// A cell (or span) that has to be painted for a region
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PaintCell {
    /// Layout row of the anchor
    pub row: usize,
    /// Column of the anchor
    pub col: usize,
    /// Full extent of the span, which may reach outside of the region
    pub bounds: Rect,
    /// The visible part of `bounds`
    pub clip: Rect,
    /// Whether the anchor lies inside the region. A span that crosses region
    /// boundaries is painted clipped wherever it is visible, but only the
    /// region holding its anchor owns it.
    pub owned: bool,
}

/// Geometry of one region, relative to the region's top-left corner.
///
/// Everything here is a pure function of the sized grid, so a consumer may
/// query it again at any time and gets the same answer.
#[derive(Debug, Copy, Clone)]
pub struct RegionGeometry<'a> {
    state: &'a GridLayoutState,
    region: Region,
}

impl<'a> RegionGeometry<'a> {
    pub fn new(state: &'a GridLayoutState, region: Region) -> Self {
        RegionGeometry { state, region }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// The grid source row a layout row shows
    pub fn source_row(&self, row: usize) -> usize {
        self.state.row_map().origin(row).source
    }

    pub fn header_width(&self) -> Pt {
        self.state.header_width()
    }

    pub fn header_height(&self) -> Pt {
        self.state.header_height()
    }

    /// Width of the data columns
    pub fn data_width(&self) -> Pt {
        let Region { x, width, .. } = self.region;
        self.state.col_widths()[x..x + width].iter().copied().sum()
    }

    /// Height of the data rows
    pub fn data_height(&self) -> Pt {
        let Region { y, height, .. } = self.region;
        self.state.row_heights()[y..y + height].iter().copied().sum()
    }

    pub fn width(&self) -> Pt {
        self.header_width() + self.data_width()
    }

    pub fn height(&self) -> Pt {
        self.header_height() + self.data_height()
    }

    fn col_x(&self, col: usize) -> Pt {
        offset(self.state.col_widths(), self.state.header_cols(), self.region.x, col)
    }

    fn row_y(&self, row: usize) -> Pt {
        offset(self.state.row_heights(), self.state.header_rows(), self.region.y, row)
    }

    /// Bounds of the cell, or of the whole span the cell belongs to. Spans
    /// reaching outside of the region get bounds outside of it too, with
    /// negative offsets for the part before the region.
    pub fn cell_bounds(&self, row: usize, col: usize) -> Rect {
        let (row, col) = self.state.spans().anchor(row, col);
        let extent = self.state.spans().extent(row, col);
        let widths = self.state.col_widths();
        let heights = self.state.row_heights();
        let last_col = (col + extent.cols).min(widths.len());
        let last_row = (row + extent.rows).min(heights.len());
        Rect::new(
            self.col_x(col),
            self.row_y(row),
            widths[col..last_col].iter().copied().sum(),
            heights[row..last_row].iter().copied().sum(),
        )
    }

    /// The part of the cell's bounds that is visible in this region: header
    /// cells are clipped to the header band, data cells to the data area
    pub fn cell_clip(&self, row: usize, col: usize) -> Rect {
        let (anchor_row, anchor_col) = self.state.spans().anchor(row, col);
        let (x1, x2) = if anchor_col < self.state.header_cols() {
            (Pt::ZERO, self.header_width())
        } else {
            (self.header_width(), self.width())
        };
        let (y1, y2) = if anchor_row < self.state.header_rows() {
            (Pt::ZERO, self.header_height())
        } else {
            (self.header_height(), self.height())
        };
        let area = Rect { x1, y1, x2, y2 };
        let bounds = self.cell_bounds(row, col);
        bounds
            .intersect(&area)
            .unwrap_or_else(|| bounds.with_height(Pt::ZERO))
    }

    /// Every distinct anchor that is visible in this region, header cells
    /// first, in reading order
    pub fn paint_cells(&self) -> Vec<PaintCell> {
        let rows = (0..self.state.header_rows()).chain(self.region.y..self.region.y + self.region.height);
        let cols: Vec<usize> = (0..self.state.header_cols())
            .chain(self.region.x..self.region.x + self.region.width)
            .collect();

        let mut seen = HashSet::new();
        let mut cells = Vec::new();
        for row in rows {
            for &col in &cols {
                let (anchor_row, anchor_col) = self.state.spans().anchor(row, col);
                if !seen.insert((anchor_row, anchor_col)) {
                    continue;
                }
                let clip = self.cell_clip(row, col);
                if clip.is_empty() {
                    continue;
                }
                let owned = (anchor_row < self.state.header_rows()
                    || (self.region.y..self.region.y + self.region.height).contains(&anchor_row))
                    && (anchor_col < self.state.header_cols()
                        || (self.region.x..self.region.x + self.region.width).contains(&anchor_col));
                cells.push(PaintCell {
                    row: anchor_row,
                    col: anchor_col,
                    bounds: self.cell_bounds(row, col),
                    clip,
                    owned,
                });
            }
        }
        cells
    }
}

/// Offset of `index` along one axis of a region whose data part starts at
/// `start`, after `headers` repeated header entries
fn offset(sizes: &[Pt], headers: usize, start: usize, index: usize) -> Pt {
    let before = |range: std::ops::Range<usize>| -> Pt { sizes[range].iter().copied().sum() };
    if index < headers {
        return before(0..index);
    }
    let header = before(0..headers);
    if index >= start {
        header + before(start..index)
    } else {
        header - before(index..start)
    }
}

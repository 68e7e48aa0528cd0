//! The tabular data model consumed by the sizer and the paginator.
//!
//! Cell values and attributes come from an external formatting layer which is
//! queried lazily through [GridSource]. [Grid] is an in-memory implementation
//! for callers that already have every value at hand.

use crate::colour::Colour;
use crate::measure::CellFont;
use crate::units::Pt;
use crate::LayoutError;

/// Space between a cell's edges and its content. The values are applied in
/// the same order as CSS margins.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Insets {
    pub top: Pt,
    pub right: Pt,
    pub bottom: Pt,
    pub left: Pt,
}

impl Insets {
    /// Create insets by specifying individual components in a clockwise fashion
    /// starting at the top
    pub fn trbl(top: Pt, right: Pt, bottom: Pt, left: Pt) -> Insets {
        Insets {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Create insets where all values are equal
    pub fn all<D: Into<Pt>>(value: D) -> Insets {
        let value: Pt = value.into();
        Insets::trbl(value, value, value, value)
    }

    /// Create insets by specifying different values for vertical (top and bottom)
    /// and horizontal (left and right) insets
    pub fn symmetric(vertical: Pt, horizontal: Pt) -> Insets {
        Insets::trbl(vertical, horizontal, vertical, horizontal)
    }

    pub fn horizontal(&self) -> Pt {
        self.left + self.right
    }

    pub fn vertical(&self) -> Pt {
        self.top + self.bottom
    }
}

/// One edge of a cell border
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct BorderSpec {
    pub width: Pt,
    pub colour: Colour,
    /// Only meaningful on a top edge: the row starts on a new frame
    pub page_break: bool,
}

impl BorderSpec {
    pub fn solid(width: Pt) -> BorderSpec {
        BorderSpec {
            width,
            ..BorderSpec::default()
        }
    }

    /// An invisible top edge that forces a page break before its row
    pub fn page_break() -> BorderSpec {
        BorderSpec {
            page_break: true,
            ..BorderSpec::default()
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Borders {
    pub top: BorderSpec,
    pub right: BorderSpec,
    pub bottom: BorderSpec,
    pub left: BorderSpec,
}

impl Borders {
    pub fn all(edge: BorderSpec) -> Borders {
        Borders {
            top: edge,
            right: edge,
            bottom: edge,
            left: edge,
        }
    }
}

/// How many columns and rows a cell covers, anchored at its top-left cell
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SpanSize {
    pub cols: usize,
    pub rows: usize,
}

/// A row height or column width as declared by the data layer
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub enum Dimension {
    /// Computed from the content
    #[default]
    Auto,
    /// Used verbatim; a fixed column width of zero hides the column
    Fixed(Pt),
    /// Computed from the content, but never smaller than the given value
    Minimum(Pt),
    /// Columns only: takes a share of whatever width the other columns leave
    Remainder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: String,
    pub font: CellFont,
    pub insets: Insets,
    /// Whether the value may be wrapped at whitespace to fit the column
    pub wrap: bool,
    pub borders: Borders,
    pub background: Option<Colour>,
    /// Set on the anchor of a spanned cell; ignored on covered cells
    pub span: Option<SpanSize>,
    /// Overrides the measured preferred content width
    pub preferred_width: Option<Pt>,
    /// Overrides the measured minimum content width
    pub min_width: Option<Pt>,
}

impl Cell {
    pub fn new<S: ToString>(value: S, font: CellFont) -> Cell {
        Cell {
            value: value.to_string(),
            font,
            insets: Insets::default(),
            wrap: true,
            borders: Borders::default(),
            background: None,
            span: None,
            preferred_width: None,
            min_width: None,
        }
    }

    pub fn spanning(mut self, cols: usize, rows: usize) -> Cell {
        self.span = Some(SpanSize {
            cols: cols.max(1),
            rows: rows.max(1),
        });
        self
    }

    pub fn with_insets(mut self, insets: Insets) -> Cell {
        self.insets = insets;
        self
    }

    pub fn with_borders(mut self, borders: Borders) -> Cell {
        self.borders = borders;
        self
    }

    pub fn no_wrap(mut self) -> Cell {
        self.wrap = false;
        self
    }

    pub fn span_size(&self) -> SpanSize {
        self.span.unwrap_or(SpanSize { cols: 1, rows: 1 })
    }
}

/// The input contract from the data and formatting layer. Every query may be
/// answered lazily; `cell` is where formatting happens and where it can fail.
pub trait GridSource {
    fn row_count(&self) -> usize;

    fn col_count(&self) -> usize;

    /// Number of leading rows repeated on every region
    fn header_rows(&self) -> usize {
        0
    }

    /// Number of leading columns repeated on every region
    fn header_cols(&self) -> usize {
        0
    }

    fn row_height(&self, _row: usize) -> Dimension {
        Dimension::Auto
    }

    fn col_width(&self, _col: usize) -> Dimension {
        Dimension::Auto
    }

    fn cell(&self, row: usize, col: usize) -> Result<Cell, LayoutError>;
}

/// A grid whose cells are all held in memory, stored row by row
#[derive(Debug, Clone)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    row_heights: Vec<Dimension>,
    col_widths: Vec<Dimension>,
    header_rows: usize,
    header_cols: usize,
}

impl Grid {
    /// A `rows` × `cols` grid of empty cells set in `font`
    pub fn new(rows: usize, cols: usize, font: CellFont) -> Grid {
        Grid {
            rows,
            cols,
            cells: vec![Cell::new("", font); rows * cols],
            row_heights: vec![Dimension::Auto; rows],
            col_widths: vec![Dimension::Auto; cols],
            header_rows: 0,
            header_cols: 0,
        }
    }

    /// A grid built from rows of values
    pub fn from_values<S: ToString>(values: &[Vec<S>], font: CellFont) -> Grid {
        let cols = values.iter().map(Vec::len).max().unwrap_or(0);
        let mut grid = Grid::new(values.len(), cols, font);
        for (r, row) in values.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                grid.cells[r * cols + c].value = value.to_string();
            }
        }
        grid
    }

    /// The one-cell table shown in place of a table whose content could not be
    /// formatted
    pub fn diagnostic<S: ToString>(message: S, font: CellFont) -> Grid {
        let mut grid = Grid::new(1, 1, font);
        grid.cells[0].value = message.to_string();
        grid.col_widths[0] = Dimension::Remainder;
        grid
    }

    pub fn with_headers(mut self, rows: usize, cols: usize) -> Grid {
        self.header_rows = rows.min(self.rows);
        self.header_cols = cols.min(self.cols);
        self
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get_mut(row * self.cols + col)
    }

    /// Replace the cell at `(row, col)`; out of range coordinates are ignored
    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        if let Some(c) = self.cell_mut(row, col) {
            *c = cell;
        }
    }

    pub fn set_value<S: ToString>(&mut self, row: usize, col: usize, value: S) {
        if let Some(c) = self.cell_mut(row, col) {
            c.value = value.to_string();
        }
    }

    /// Make the cell at `(row, col)` cover `cols` × `rows` cells
    pub fn set_span(&mut self, row: usize, col: usize, cols: usize, rows: usize) {
        if let Some(c) = self.cell_mut(row, col) {
            c.span = Some(SpanSize {
                cols: cols.max(1),
                rows: rows.max(1),
            });
        }
    }

    pub fn set_row_height(&mut self, row: usize, height: Dimension) {
        if let Some(h) = self.row_heights.get_mut(row) {
            *h = height;
        }
    }

    pub fn set_col_width(&mut self, col: usize, width: Dimension) {
        if let Some(w) = self.col_widths.get_mut(col) {
            *w = width;
        }
    }

    /// Set a top border that breaks the page on every cell of `row`
    pub fn set_page_break_before(&mut self, row: usize) {
        for col in 0..self.cols {
            if let Some(c) = self.cell_mut(row, col) {
                c.borders.top.page_break = true;
            }
        }
    }
}

impl GridSource for Grid {
    fn row_count(&self) -> usize {
        self.rows
    }

    fn col_count(&self) -> usize {
        self.cols
    }

    fn header_rows(&self) -> usize {
        self.header_rows
    }

    fn header_cols(&self) -> usize {
        self.header_cols
    }

    fn row_height(&self, row: usize) -> Dimension {
        self.row_heights.get(row).copied().unwrap_or_default()
    }

    fn col_width(&self, col: usize) -> Dimension {
        self.col_widths.get(col).copied().unwrap_or_default()
    }

    fn cell(&self, row: usize, col: usize) -> Result<Cell, LayoutError> {
        if row >= self.rows || col >= self.cols {
            return Err(LayoutError::CellOutOfRange { row, col });
        }
        Ok(self.cells[row * self.cols + col].clone())
    }
}

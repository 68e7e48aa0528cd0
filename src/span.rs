//! Span membership for every cell of the laid out grid.
//!
//! Regions address *layout rows*. They start out identical to the source rows
//! of the grid, but the paginator may replace one layout row by several
//! synthetic sub-rows when a row is too tall for any frame. [RowMap] tracks
//! where every layout row came from, and [SpanIndex] records, per layout cell,
//! which rectangular span it belongs to. A cell of a split row becomes a
//! vertical span over the sub-rows, so its content is painted across them.

use crate::grid::SpanSize;
use log::warn;

/// Where a layout row came from
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RowOrigin {
    /// Row index in the grid source
    pub source: usize,
    /// Which piece of the source row this is, starting at 0
    pub part: usize,
    /// How many pieces the source row was split into
    pub parts: usize,
}

/// Mapping between source rows and layout rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowMap {
    origins: Vec<RowOrigin>,
    /// first layout row of every source row
    starts: Vec<usize>,
}

impl RowMap {
    /// One layout row per source row
    pub fn identity(rows: usize) -> RowMap {
        RowMap {
            origins: (0..rows)
                .map(|source| RowOrigin {
                    source,
                    part: 0,
                    parts: 1,
                })
                .collect(),
            starts: (0..rows).collect(),
        }
    }

    pub fn layout_rows(&self) -> usize {
        self.origins.len()
    }

    pub fn source_rows(&self) -> usize {
        self.starts.len()
    }

    pub fn origin(&self, layout_row: usize) -> RowOrigin {
        self.origins[layout_row]
    }

    /// First layout row of a source row
    pub fn first(&self, source_row: usize) -> usize {
        self.starts[source_row]
    }

    /// Last layout row of a source row
    pub fn last(&self, source_row: usize) -> usize {
        let origin = self.origins[self.starts[source_row]];
        self.starts[source_row] + origin.parts - 1
    }

    /// Replace the layout row `layout_row` (which must not already be split)
    /// by `parts` sub-rows. Every later layout row moves down by `parts - 1`.
    pub(crate) fn split(&mut self, layout_row: usize, parts: usize) {
        let origin = self.origins[layout_row];
        debug_assert_eq!(origin.parts, 1, "split rows are not split again");
        if parts <= 1 {
            return;
        }

        let pieces = (0..parts).map(|part| RowOrigin {
            source: origin.source,
            part,
            parts,
        });
        self.origins
            .splice(layout_row..=layout_row, pieces)
            .for_each(drop);
        for start in self.starts.iter_mut().skip(origin.source + 1) {
            *start += parts - 1;
        }
    }
}

/// Span membership of one layout cell
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SpanCell {
    /// Columns between the anchor and this cell
    pub dx: usize,
    /// Layout rows between the anchor and this cell
    pub dy: usize,
    /// Columns covered by the whole span
    pub cols: usize,
    /// Layout rows covered by the whole span
    pub rows: usize,
}

impl SpanCell {
    pub fn is_anchor(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

/// Which span, if any, every layout cell belongs to. Cells that are not part
/// of a span larger than one cell have no entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanIndex {
    rows: usize,
    cols: usize,
    cells: Vec<Option<SpanCell>>,
}

impl SpanIndex {
    /// Build the index from the source spans (anchored at source coordinates)
    /// and the current row map
    pub fn build(spans: &[(usize, usize, SpanSize)], rows: &RowMap, cols: usize) -> SpanIndex {
        let mut index = SpanIndex {
            rows: rows.layout_rows(),
            cols,
            cells: vec![None; rows.layout_rows() * cols],
        };
        let source_rows = rows.source_rows();

        for &(row, col, size) in spans {
            if row >= source_rows || col >= cols {
                continue;
            }
            let last_row = (row + size.rows).min(source_rows) - 1;
            let last_col = (col + size.cols).min(cols) - 1;
            let top = rows.first(row);
            let bottom = rows.last(last_row);
            if !index.insert(top, col, bottom - top + 1, last_col - col + 1) {
                warn!("span at ({row}, {col}) overlaps an earlier span and is ignored");
            }
        }

        // cells of split rows that are not already part of a span cover their
        // sub-rows on their own
        for source in 0..source_rows {
            let top = rows.first(source);
            let height = rows.last(source) - top + 1;
            if height < 2 {
                continue;
            }
            for col in 0..cols {
                if index.get(top, col).is_none() {
                    index.insert(top, col, height, 1);
                }
            }
        }

        index
    }

    fn insert(&mut self, row: usize, col: usize, rows: usize, cols: usize) -> bool {
        if rows * cols <= 1 {
            return true;
        }
        let free = (row..row + rows)
            .all(|r| (col..col + cols).all(|c| self.cells[r * self.cols + c].is_none()));
        if !free {
            return false;
        }
        for dy in 0..rows {
            for dx in 0..cols {
                self.cells[(row + dy) * self.cols + col + dx] = Some(SpanCell { dx, dy, cols, rows });
            }
        }
        true
    }

    /// Span membership of the layout cell `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> Option<SpanCell> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells[row * self.cols + col]
    }

    /// The anchor of the span `(row, col)` belongs to; the cell itself when it
    /// is not part of a span
    pub fn anchor(&self, row: usize, col: usize) -> (usize, usize) {
        match self.get(row, col) {
            Some(span) => (row - span.dy, col - span.dx),
            None => (row, col),
        }
    }

    /// Whether `(row, col)` is covered by a span anchored elsewhere
    pub fn is_covered(&self, row: usize, col: usize) -> bool {
        self.get(row, col).is_some_and(|span| !span.is_anchor())
    }

    /// Size of the span anchored at `(row, col)`, or 1×1
    pub fn extent(&self, row: usize, col: usize) -> SpanSize {
        match self.get(row, col) {
            Some(span) => SpanSize {
                cols: span.cols,
                rows: span.rows,
            },
            None => SpanSize { cols: 1, rows: 1 },
        }
    }

    /// Anchor coordinates and extents of every span
    pub fn spans(&self) -> impl Iterator<Item = (usize, usize, SpanCell)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            cell.filter(SpanCell::is_anchor)
                .map(|span| (i / self.cols, i % self.cols, span))
        })
    }

    /// Whether a span crosses the boundary between layout rows `row - 1` and
    /// `row`
    pub fn crosses_row_boundary(&self, row: usize) -> bool {
        row > 0
            && row < self.rows
            && (0..self.cols).any(|col| self.get(row, col).is_some_and(|span| span.dy > 0))
    }
}

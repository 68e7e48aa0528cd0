//! Column widths and row heights.
//!
//! [GridSizer::validate] rebuilds a [GridLayoutState] from a [GridSource]: it
//! reads every cell once, builds the [SpanIndex], then sizes columns and rows.
//! Nothing about pages is known here; the paginator later mutates the row
//! arrays in place when it has to split a row.

use crate::config::{LayoutConfig, LayoutPolicy};
use crate::grid::{Cell, Dimension, GridSource, SpanSize};
use crate::measure::{longest_word_width, unwrapped_width, wrapped_height, FontBook};
use crate::span::{RowMap, SpanIndex};
use crate::units::Pt;
use crate::LayoutError;
use log::{debug, warn};
use std::collections::HashMap;

#[derive(Debug, Copy, Clone, PartialEq)]
struct CachedHeight {
    /// length of the value the height was measured for
    len: usize,
    /// width the value was wrapped into
    width: Pt,
    height: Pt,
}

/// Wrapped content heights keyed by layout `(row, col)`.
///
/// Measuring is the expensive part of sizing and a table is validated again
/// whenever anything about it changes, so heights survive validate passes.
/// An entry is stale once the value at its coordinate has a different length
/// or is wrapped into a different width. Keys are layout coordinates, so they
/// are remapped explicitly whenever the layout rows move.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeightCache {
    entries: HashMap<(usize, usize), CachedHeight>,
}

impl HeightCache {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The cached height at `(row, col)`, regardless of staleness
    pub fn peek(&self, row: usize, col: usize) -> Option<Pt> {
        self.entries.get(&(row, col)).map(|e| e.height)
    }

    fn get(&self, row: usize, col: usize, len: usize, width: Pt) -> Option<Pt> {
        self.entries
            .get(&(row, col))
            .filter(|e| e.len == len && e.width.approx_eq(width))
            .map(|e| e.height)
    }

    fn insert(&mut self, row: usize, col: usize, len: usize, width: Pt, height: Pt) {
        self.entries
            .insert((row, col), CachedHeight { len, width, height });
    }

    pub fn invalidate(&mut self, row: usize, col: usize) {
        self.entries.remove(&(row, col));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Layout row `row` was replaced by `parts` sub-rows: entries below it
    /// move down with their rows. The entry of the split row itself stays on
    /// the first sub-row, which is where the cell is anchored now.
    pub(crate) fn remap_split(&mut self, row: usize, parts: usize) {
        if parts <= 1 {
            return;
        }
        let shift = parts - 1;
        self.entries = self
            .entries
            .drain()
            .map(|((r, c), entry)| {
                let r = if r > row { r + shift } else { r };
                ((r, c), entry)
            })
            .collect();
    }

    /// Fold entries keyed by the layout rows of `rows` back onto source rows,
    /// ahead of a validate pass that starts over from unsplit rows
    pub(crate) fn restore(&mut self, rows: &RowMap) {
        let layout_rows = rows.layout_rows();
        self.entries = self
            .entries
            .drain()
            .filter_map(|((r, c), entry)| {
                if r >= layout_rows {
                    return None;
                }
                let origin = rows.origin(r);
                (origin.part == 0).then_some(((origin.source, c), entry))
            })
            .collect();
    }
}

/// Everything the paginator and the region consumers need to know about a
/// sized grid. Owned by one table element and passed by reference; it is
/// rebuilt by every validate pass and mutated in place when rows are split.
#[derive(Debug, Clone, Default)]
pub struct GridLayoutState {
    pub(crate) col_widths: Vec<Pt>,
    pub(crate) col_borders: Vec<Pt>,
    pub(crate) row_heights: Vec<Pt>,
    pub(crate) row_borders: Vec<Pt>,
    pub(crate) row_dims: Vec<Dimension>,
    pub(crate) row_breaks: Vec<bool>,
    pub(crate) line_heights: Vec<Pt>,
    pub(crate) rows: RowMap,
    pub(crate) spans: SpanIndex,
    pub(crate) source_spans: Vec<(usize, usize, SpanSize)>,
    pub(crate) cache: HeightCache,
    pub(crate) header_rows: usize,
    pub(crate) header_cols: usize,
}

impl GridLayoutState {
    pub fn new() -> GridLayoutState {
        GridLayoutState::default()
    }

    /// Number of layout rows, including header rows and split sub-rows
    pub fn row_count(&self) -> usize {
        self.row_heights.len()
    }

    pub fn col_count(&self) -> usize {
        self.col_widths.len()
    }

    pub fn header_rows(&self) -> usize {
        self.header_rows
    }

    pub fn header_cols(&self) -> usize {
        self.header_cols
    }

    pub fn col_widths(&self) -> &[Pt] {
        &self.col_widths
    }

    pub fn row_heights(&self) -> &[Pt] {
        &self.row_heights
    }

    /// Thickness of the border on the leading edge of every column; part of
    /// the column width
    pub fn col_borders(&self) -> &[Pt] {
        &self.col_borders
    }

    /// Thickness of the border on the top edge of every row; part of the
    /// row height
    pub fn row_borders(&self) -> &[Pt] {
        &self.row_borders
    }

    pub fn spans(&self) -> &SpanIndex {
        &self.spans
    }

    pub fn row_map(&self) -> &RowMap {
        &self.rows
    }

    pub fn height_cache(&self) -> &HeightCache {
        &self.cache
    }

    /// Width of the repeated header columns
    pub fn header_width(&self) -> Pt {
        self.col_widths[..self.header_cols].iter().copied().sum()
    }

    /// Height of the repeated header rows
    pub fn header_height(&self) -> Pt {
        self.row_heights[..self.header_rows].iter().copied().sum()
    }

    pub fn table_width(&self) -> Pt {
        self.col_widths.iter().copied().sum()
    }

    /// Whether an explicit page break precedes layout row `row`
    pub fn breaks_before(&self, row: usize) -> bool {
        self.row_breaks.get(row).copied().unwrap_or(false)
    }

    /// The tallest line height used in layout row `row`
    pub fn line_height(&self, row: usize) -> Pt {
        self.line_heights.get(row).copied().unwrap_or_default()
    }

    pub(crate) fn row_dim(&self, row: usize) -> Dimension {
        self.row_dims.get(row).copied().unwrap_or_default()
    }

    /// Replace layout row `row` by sub-rows of the given heights. Every
    /// per-row array is updated, the span index is rebuilt from the new row
    /// map, and cached heights are remapped to the rows they belong to now.
    pub(crate) fn split_row(&mut self, row: usize, heights: &[Pt]) {
        let parts = heights.len();
        if parts <= 1 || row >= self.row_count() {
            return;
        }
        debug!("splitting layout row {row} into {parts} parts");

        self.rows.split(row, parts);
        self.row_heights
            .splice(row..=row, heights.iter().copied())
            .for_each(drop);

        let border = self.row_borders[row];
        self.row_borders
            .splice(
                row..=row,
                std::iter::once(border).chain(std::iter::repeat(Pt::ZERO).take(parts - 1)),
            )
            .for_each(drop);

        let dims = match self.row_dims[row] {
            Dimension::Fixed(_) => heights.iter().map(|h| Dimension::Fixed(*h)).collect(),
            dim => vec![dim; parts],
        };
        self.row_dims.splice(row..=row, dims).for_each(drop);

        let brk = self.row_breaks[row];
        self.row_breaks
            .splice(
                row..=row,
                std::iter::once(brk).chain(std::iter::repeat(false).take(parts - 1)),
            )
            .for_each(drop);

        let line = self.line_heights[row];
        self.line_heights
            .splice(row..=row, std::iter::repeat(line).take(parts))
            .for_each(drop);

        self.cache.remap_split(row, parts);
        self.spans = SpanIndex::build(&self.source_spans, &self.rows, self.col_count());
    }
}

/// Computes column widths and row heights for one grid
pub struct GridSizer<'a> {
    grid: &'a dyn GridSource,
    fonts: &'a FontBook,
    config: &'a LayoutConfig,
}

impl<'a> GridSizer<'a> {
    pub fn new(grid: &'a dyn GridSource, fonts: &'a FontBook, config: &'a LayoutConfig) -> Self {
        GridSizer {
            grid,
            fonts,
            config,
        }
    }

    /// Rebuild `state` for a table that may be `available_width` wide.
    ///
    /// Fails only when the grid source cannot produce a cell.
    pub fn validate(
        &self,
        state: &mut GridLayoutState,
        available_width: Pt,
    ) -> Result<(), LayoutError> {
        let rows = self.grid.row_count();
        let cols = self.grid.col_count();

        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(self.grid.cell(row, col)?);
            }
        }

        // splits belong to the previous pass; start over from source rows
        if state.rows.layout_rows() != state.rows.source_rows() {
            state.cache.restore(&state.rows);
        }
        state.rows = RowMap::identity(rows);
        state.header_rows = self.grid.header_rows().min(rows);
        state.header_cols = self.grid.header_cols().min(cols);
        state.source_spans = cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| {
                cell.span
                    .filter(|s| s.cols > 1 || s.rows > 1)
                    .map(|s| (i / cols, i % cols, s))
            })
            .collect();
        state.spans = SpanIndex::build(&state.source_spans, &state.rows, cols);

        let cell = |row: usize, col: usize| &cells[row * cols + col];

        state.col_borders = (0..cols)
            .map(|col| {
                (0..rows)
                    .filter(|&row| !state.spans.is_covered(row, col))
                    .map(|row| cell(row, col).borders.left.width)
                    .fold(Pt::ZERO, Pt::max)
            })
            .collect();
        state.row_borders = (0..rows)
            .map(|row| {
                (0..cols)
                    .filter(|&col| !state.spans.is_covered(row, col))
                    .map(|col| cell(row, col).borders.top.width)
                    .fold(Pt::ZERO, Pt::max)
            })
            .collect();
        state.row_breaks = (0..rows)
            .map(|row| {
                (0..cols).any(|col| {
                    !state.spans.is_covered(row, col) && cell(row, col).borders.top.page_break
                })
            })
            .collect();
        state.row_dims = (0..rows).map(|row| self.grid.row_height(row)).collect();

        state.col_widths = self.size_columns(state, &cells, available_width);
        self.size_rows(state, &cells);

        debug!(
            "validated {rows}x{cols} grid: width {}, height {}",
            state.table_width(),
            state.row_heights.iter().copied().sum::<Pt>()
        );
        Ok(())
    }

    /// Preferred and minimum width of one cell, padding and insets included
    fn cell_widths(&self, cell: &Cell) -> (Pt, Pt) {
        let measure = self.fonts.get(cell.font.id);
        let extra = cell.insets.horizontal() + self.config.cell_padding * 2.0;

        let preferred = cell
            .preferred_width
            .unwrap_or_else(|| unwrapped_width(&cell.value, measure, cell.font.size));
        let minimum = match cell.min_width {
            Some(min) => min,
            None if cell.wrap => longest_word_width(&cell.value, measure, cell.font.size),
            None => preferred,
        };

        (preferred.max(minimum) + extra, minimum + extra)
    }

    fn size_columns(&self, state: &GridLayoutState, cells: &[Cell], available: Pt) -> Vec<Pt> {
        let rows = state.rows.layout_rows();
        let cols = self.grid.col_count();
        let dims: Vec<Dimension> = (0..cols).map(|col| self.grid.col_width(col)).collect();

        let mut preferred = vec![Pt::ZERO; cols];
        let mut minimum = vec![Pt::ZERO; cols];
        let mut span_preferred = vec![Pt::ZERO; cols];
        let mut span_minimum = vec![Pt::ZERO; cols];

        let sampled = rows.min(state.header_rows + self.config.sample_rows);
        for row in 0..sampled {
            for col in 0..cols {
                if state.spans.is_covered(row, col) || dims[col] == Dimension::Fixed(Pt::ZERO) {
                    continue;
                }
                let (pref, min) = self.cell_widths(&cells[row * cols + col]);
                let width = state.spans.extent(row, col).cols;
                if width == 1 {
                    preferred[col] = preferred[col].max(pref);
                    minimum[col] = minimum[col].max(min);
                } else {
                    for covered in col..col + width {
                        span_preferred[covered] = span_preferred[covered].max(pref / width as f32);
                        span_minimum[covered] = span_minimum[covered].max(min / width as f32);
                    }
                }
            }
        }
        for col in 0..cols {
            preferred[col] = preferred[col].max(span_preferred[col]) + state.col_borders[col];
            minimum[col] = minimum[col].max(span_minimum[col]) + state.col_borders[col];
            if let Dimension::Minimum(floor) = dims[col] {
                preferred[col] = preferred[col].max(floor);
                minimum[col] = minimum[col].max(floor);
            }
        }

        let mut widths = vec![Pt::ZERO; cols];
        let mut flexible = Vec::new();
        let mut remainder = Vec::new();
        let mut fixed_total = Pt::ZERO;
        for (col, dim) in dims.iter().enumerate() {
            match dim {
                Dimension::Fixed(w) => {
                    widths[col] = w.non_negative();
                    fixed_total += widths[col];
                }
                Dimension::Remainder => remainder.push(col),
                Dimension::Auto | Dimension::Minimum(_) => flexible.push(col),
            }
        }
        let visible = dims
            .iter()
            .filter(|d| **d != Dimension::Fixed(Pt::ZERO))
            .count();
        let target = (available - fixed_total).non_negative();

        let pref: Vec<Pt> = flexible.iter().map(|&c| preferred[c]).collect();
        let min: Vec<Pt> = flexible.iter().map(|&c| minimum[c]).collect();
        let flex_widths: Vec<Pt> = match self.config.policy {
            LayoutPolicy::FitContent => pref
                .iter()
                .map(|&w| {
                    if w > available {
                        warn!("column of preferred width {w} is clamped to {available}");
                        available
                    } else {
                        w
                    }
                })
                .collect(),
            LayoutPolicy::EqualWidth => {
                let share = target / (flexible.len() + remainder.len()).max(1) as f32;
                vec![share; flexible.len()]
            }
            LayoutPolicy::FitPage if remainder.is_empty() => fit_exactly(&pref, &min, target),
            LayoutPolicy::FitPage | LayoutPolicy::FitContentPage => {
                if pref.iter().copied().sum::<Pt>() > target {
                    fit_exactly(&pref, &min, target)
                } else {
                    pref
                }
            }
            LayoutPolicy::FitContentOnePage => {
                if pref.iter().copied().sum::<Pt>() > target {
                    shrink_toward_minimum(&pref, &min, target)
                } else {
                    pref
                }
            }
        };
        for (&col, width) in flexible.iter().zip(flex_widths) {
            widths[col] = width;
        }

        if !remainder.is_empty() {
            let used: Pt = widths.iter().copied().sum();
            let share = (available - used).non_negative() / remainder.len() as f32;
            let floor = available / visible.max(1) as f32 / 2.0;
            let share = if self.config.policy == LayoutPolicy::EqualWidth {
                target / (flexible.len() + remainder.len()) as f32
            } else {
                share.max(floor)
            };
            for &col in &remainder {
                widths[col] = share;
            }
        }

        if widths.iter().copied().sum::<Pt>() <= Pt::ZERO && visible > 0 {
            warn!("table has no width, every visible column is set to 1pt");
            for (col, dim) in dims.iter().enumerate() {
                if *dim != Dimension::Fixed(Pt::ZERO) {
                    widths[col] = Pt(1.0);
                }
            }
        }

        widths
    }

    fn size_rows(&self, state: &mut GridLayoutState, cells: &[Cell]) {
        let rows = state.rows.layout_rows();
        let cols = state.col_widths.len();
        let padding = self.config.cell_padding * 2.0;

        state.row_heights = vec![Pt::ZERO; rows];
        state.line_heights = vec![Pt::ZERO; rows];

        for row in 0..rows {
            let mut content = Pt::ZERO;
            for col in 0..cols {
                if state.spans.is_covered(row, col) {
                    continue;
                }
                let cell = &cells[row * cols + col];
                state.line_heights[row] = state.line_heights[row].max(self.fonts.line_height(cell.font));
                let extent = state.spans.extent(row, col);
                if extent.rows > 1 {
                    continue;
                }
                if let Some(height) = self.cell_height(state, row, col, cell, extent.cols) {
                    content = content.max(height + cell.insets.vertical() + padding);
                }
            }

            state.row_heights[row] = match state.row_dims[row] {
                Dimension::Fixed(h) => h.non_negative(),
                Dimension::Minimum(floor) => (content + state.row_borders[row]).max(floor),
                Dimension::Auto | Dimension::Remainder => content + state.row_borders[row],
            };
        }

        let spans: Vec<_> = state
            .spans
            .spans()
            .filter(|(_, _, span)| span.rows > 1)
            .collect();
        for (row, col, span) in spans {
            let cell = &cells[row * cols + col];
            if let Some(content) = self.cell_height(state, row, col, cell, span.cols) {
                self.distribute_span_height(state, row, span.rows, cell, content);
            }
        }
    }

    /// Wrapped content height of a cell `span_cols` columns wide, or `None`
    /// when the cell is hidden
    fn cell_height(
        &self,
        state: &mut GridLayoutState,
        row: usize,
        col: usize,
        cell: &Cell,
        span_cols: usize,
    ) -> Option<Pt> {
        let width: Pt = state.col_widths[col..col + span_cols].iter().copied().sum();
        if width <= Pt::ZERO {
            return None;
        }
        let inner = (width
            - state.col_borders[col]
            - cell.insets.horizontal()
            - self.config.cell_padding * 2.0)
            .non_negative();

        let len = cell.value.len();
        if let Some(height) = state.cache.get(row, col, len, inner) {
            return Some(height);
        }
        let measure = self.fonts.get(cell.font.id);
        let height = wrapped_height(&cell.value, inner, measure, cell.font.size, cell.wrap);
        state.cache.insert(row, col, len, inner, height);
        Some(height)
    }

    /// Grow the rows covered by a vertical span so that together they hold
    /// the span's content. Every share is a whole number of lines, so a
    /// forced row boundary never cuts through a line of text.
    fn distribute_span_height(
        &self,
        state: &mut GridLayoutState,
        row: usize,
        rows: usize,
        cell: &Cell,
        content: Pt,
    ) {
        let covered = row..row + rows;
        let flexible: Vec<usize> = covered
            .clone()
            .filter(|&r| !matches!(state.row_dims[r], Dimension::Fixed(_)))
            .collect();
        let fixed: Pt = covered
            .clone()
            .filter(|r| !flexible.contains(r))
            .map(|r| state.row_heights[r])
            .sum();
        let (Some(&first), Some(&last)) = (flexible.first(), flexible.last()) else {
            let current: Pt = covered.map(|r| state.row_heights[r]).sum();
            if current < content {
                warn!("span at row {row} does not fit its fixed rows, content is clipped");
            }
            return;
        };

        let line = self.fonts.line_height(cell.font);
        let remaining = (content - fixed).non_negative();
        let lines = if line > Pt::ZERO {
            (remaining / line).ceil() as usize
        } else {
            0
        };

        let n = flexible.len();
        for (i, &r) in flexible.iter().enumerate() {
            let mut share = if line > Pt::ZERO {
                let count = lines / n + usize::from(i < lines % n);
                line * count as f32
            } else {
                remaining / n as f32
            };
            if r == first {
                share += cell.insets.top + self.config.cell_padding + state.row_borders[r];
            }
            if r == last {
                share += cell.insets.bottom + self.config.cell_padding;
            }
            state.row_heights[r] = state.row_heights[r].max(share);
        }
    }
}

/// Widths between minimum and preferred that sum to exactly `target`. With no
/// width left at all, the columns keep their minimum widths instead.
fn fit_exactly(preferred: &[Pt], minimum: &[Pt], target: Pt) -> Vec<Pt> {
    if preferred.is_empty() {
        return Vec::new();
    }
    if target.fits_in(Pt::ZERO) {
        warn!("fixed columns take the whole frame, the others keep their minimum widths");
        return minimum.to_vec();
    }
    let sum_min: Pt = minimum.iter().copied().sum();
    let sum_pref: Pt = preferred.iter().copied().sum();
    let equal = target / preferred.len() as f32;

    let mut widths: Vec<Pt> = if sum_min.fits_in(target) && target < sum_pref {
        // between minimum and preferred
        let t = (target - sum_min) / (sum_pref - sum_min);
        preferred
            .iter()
            .zip(minimum)
            .map(|(&p, &m)| m + (p - m) * t)
            .collect()
    } else if target <= sum_pref {
        // too wide even at minimum: shrink proportional to the minimum
        if sum_min > Pt::ZERO {
            minimum.iter().map(|&m| m * (target / sum_min)).collect()
        } else {
            vec![equal; preferred.len()]
        }
    } else if sum_pref > Pt::ZERO {
        // too narrow: grow proportional to the preferred width
        preferred.iter().map(|&p| p * (target / sum_pref)).collect()
    } else {
        vec![equal; preferred.len()]
    };

    // the last column absorbs whatever rounding left over
    let last = widths.len() - 1;
    let others: Pt = widths[..last].iter().copied().sum();
    widths[last] = (target - others).non_negative();
    widths
}

/// Preferred widths squeezed toward the minimum widths until they fit
/// `target`, but never below the minimum
fn shrink_toward_minimum(preferred: &[Pt], minimum: &[Pt], target: Pt) -> Vec<Pt> {
    let sum_min: Pt = minimum.iter().copied().sum();
    if target <= sum_min {
        warn!("table is wider than the frame even at minimum widths and is split column-wise");
        return minimum.to_vec();
    }
    fit_exactly(preferred, minimum, target)
}

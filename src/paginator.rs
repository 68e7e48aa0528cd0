//! Splitting a sized grid into regions that fit a sequence of frames.
//!
//! [RegionPaginator] is an iterator: every call to `next` decides as much as
//! it has to and hands out the next [RegionItem]. Stopping after any item and
//! resuming later yields exactly what an uninterrupted pass would have.
//!
//! Rows are taken top to bottom. A run of rows that fits the current frame
//! becomes one region per column group (a table wider than the frame is split
//! column-wise, left to right). Three rules can end a run early or move it,
//! checked in this order:
//!
//! 1. a row whose top border carries the page-break flag starts a new frame;
//! 2. a table does not leave its first data row alone at the bottom of a frame
//!    when the next frame takes at least two;
//! 3. the last data row does not end up alone in a frame of its own.
//!
//! A row too tall for any frame is split into sub-rows in place; see
//! [GridLayoutState::split_row].

use crate::config::LayoutConfig;
use crate::gate::CancelToken;
use crate::grid::Dimension;
use crate::region::{FrameSequence, Region, RegionItem};
use crate::sizer::GridLayoutState;
use crate::units::Pt;
use log::{debug, trace, warn};
use std::collections::VecDeque;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Phase {
    /// Building regions from whole rows
    Scanning,
    /// The row is taller than a whole frame and is broken up next
    SplittingRow { row: usize },
    Done,
}

/// Produces the regions of one table, in reading order
pub struct RegionPaginator<'a> {
    state: &'a mut GridLayoutState,
    config: &'a LayoutConfig,
    frames: FrameSequence,
    cancel: CancelToken,
    phase: Phase,
    /// index of the current frame
    frame: usize,
    /// height left in the current frame
    remaining: Pt,
    /// whether anything was placed in the current frame
    used: bool,
    /// next layout row to place
    row: usize,
    orphan_checked: bool,
    /// queued items with the frame each belongs to
    pending: VecDeque<(RegionItem, usize)>,
    /// frame of the item handed out last
    item_frame: usize,
}

impl<'a> RegionPaginator<'a> {
    pub fn new(
        state: &'a mut GridLayoutState,
        config: &'a LayoutConfig,
        frames: FrameSequence,
        cancel: CancelToken,
    ) -> RegionPaginator<'a> {
        let remaining = frames.get(0).height;
        let row = state.header_rows();
        RegionPaginator {
            state,
            config,
            frames,
            cancel,
            phase: Phase::Scanning,
            frame: 0,
            remaining,
            used: false,
            row,
            orphan_checked: false,
            pending: VecDeque::new(),
            item_frame: 0,
        }
    }

    /// Index of the frame the paginator is currently filling
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Index of the frame the item returned last by `next` goes into. An
    /// area break belongs to the frame it ends.
    pub fn item_frame(&self) -> usize {
        self.item_frame
    }

    fn next_frame(&mut self) {
        self.frame += 1;
        self.remaining = self.frames.get(self.frame).height;
        self.used = false;
        trace!("continuing in frame {}", self.frame);
    }

    /// Height left for data rows in a fresh frame
    fn frame_budget(&self, frame: usize) -> Pt {
        self.frames.get(frame).height - self.state.header_height()
    }

    /// Height left for data rows in the current frame
    fn budget(&self) -> Pt {
        self.remaining - self.state.header_height()
    }

    fn is_split(&self, row: usize) -> bool {
        row < self.state.row_count() && self.state.row_map().origin(row).parts > 1
    }

    /// Whether `row` is a part of a split row with more parts after it
    fn continues(&self, row: usize) -> bool {
        if row >= self.state.row_count() {
            return false;
        }
        let origin = self.state.row_map().origin(row);
        origin.part + 1 < origin.parts
    }

    /// How many rows from `start` fit `budget`, keeping the continuation
    /// reserve free. An explicit break ends the run before its row.
    fn fit_rows(&self, start: usize, budget: Pt) -> usize {
        let limit = budget - self.config.continuation_reserve;
        let heights = self.state.row_heights();
        let mut used = Pt::ZERO;
        let mut count = 0;
        for row in start..heights.len() {
            if self.cancel.is_cancelled() || (row > start && self.state.breaks_before(row)) {
                break;
            }
            if !(used + heights[row]).fits_in(limit) {
                break;
            }
            used += heights[row];
            count += 1;
        }
        count
    }

    /// Data columns grouped so that each group fits `width` next to the
    /// header columns; every group has at least one column
    fn column_groups(&self, width: Pt) -> Vec<(usize, usize)> {
        let cols = self.state.col_count();
        let first = self.state.header_cols();
        if first >= cols {
            return vec![(first, 0)];
        }
        let available = width - self.state.header_width();
        let widths = self.state.col_widths();

        let mut groups = Vec::new();
        let mut start = first;
        let mut used = Pt::ZERO;
        for col in first..cols {
            if col > start && !(used + widths[col]).fits_in(available) {
                groups.push((start, col - start));
                start = col;
                used = Pt::ZERO;
            }
            used += widths[col];
        }
        groups.push((start, cols - start));
        groups
    }

    /// Queue the regions of the rows `row..row + rows`, one per column group.
    /// Groups after the first go below the previous one when they fit,
    /// otherwise into the next frame. The groups of a part with more parts
    /// after it take a frame each, the way [Self::split] planned them.
    fn emit(&mut self, row: usize, rows: usize) {
        let height = self.state.header_height()
            + self.state.row_heights()[row..row + rows].iter().copied().sum::<Pt>();
        let frame_width = self.frames.get(self.frame).width;
        let available = frame_width - self.state.header_width();
        let own_frames = rows == 1 && self.continues(row);
        let groups = self.column_groups(frame_width);
        for (i, (x, width)) in groups.into_iter().enumerate() {
            if i > 0 && (own_frames || !height.fits_in(self.remaining)) {
                self.next_frame();
                if !height.fits_in(self.remaining) {
                    warn!("rows {row}..{} do not fit the frame and are clipped", row + rows);
                }
            }
            if width == 1 && !self.state.col_widths()[x].fits_in(available) {
                warn!("column {x} is wider than the frame and is clipped");
            }
            let region = Region {
                x,
                y: row,
                width,
                height: rows,
            };
            self.pending.push_back((RegionItem::Region(region), self.frame));
            self.remaining = (self.remaining - height).non_negative();
            self.used = true;
        }
        self.row = row + rows;
    }

    fn scan(&mut self) {
        let rows = self.state.row_count();
        if self.row >= rows {
            if self.state.header_rows() == rows && rows > 0 && self.state.col_count() > 0 {
                // headers only: they still get painted
                self.emit(rows, 0);
            }
            self.phase = Phase::Done;
            return;
        }

        let budget = self.budget();
        let data_rows = rows - self.state.header_rows();

        if !self.orphan_checked && self.config.orphan_control {
            self.orphan_checked = true;
            if self.row == self.state.header_rows()
                && data_rows >= 2
                && self.fit_rows(self.row, budget) == 1
                && self.fit_rows(self.row, self.frame_budget(self.frame + 1)) >= 2
            {
                debug!("moving the first row of the table to the next frame");
                self.pending.push_back((RegionItem::AreaBreak, self.frame));
                self.next_frame();
                return;
            }
        }

        let mut count = self.fit_rows(self.row, budget);
        if self.cancel.is_cancelled() {
            return;
        }
        if count == 0 {
            let fresh = if self.used {
                self.frame_budget(self.frame + 1)
            } else {
                budget
            };
            if self.used && self.fit_rows(self.row, fresh) > 0 {
                self.next_frame();
            } else {
                self.phase = Phase::SplittingRow { row: self.row };
            }
            return;
        }

        if self.continues(self.row) {
            // a part fills the frames planned for it, the next part starts afresh
            self.emit(self.row, 1);
            self.next_frame();
            return;
        }

        let end = self.row + count;
        let explicit = end < rows && self.state.breaks_before(end);
        let mut moved = false;
        if !explicit
            && self.config.widow_control
            && rows - end == 1
            && !self.is_split(end)
            && !self.is_split(end - 1)
        {
            let heights = self.state.row_heights();
            let used: Pt = heights[self.row..end].iter().copied().sum();
            if (used + heights[end]).fits_in(budget) {
                trace!("taking the last row {end} into the region");
                count += 1;
            } else if count >= 3 {
                trace!("moving row {} forward to keep the last row company", end - 1);
                count -= 1;
                moved = true;
            }
        }

        self.emit(self.row, count);
        if explicit {
            self.pending.push_back((RegionItem::AreaBreak, self.frame));
            self.next_frame();
        } else if moved {
            self.next_frame();
        }
    }

    /// Break `row` into parts: the first takes what is left of the current
    /// frame, every other part a whole frame. When the table is also split by
    /// columns, each column group of a part takes a frame of its own and the
    /// part is planned to fit the smallest of them. Parts end on whole lines of
    /// the row's text unless the row has a fixed height.
    fn split(&mut self, row: usize) {
        self.phase = Phase::Scanning;
        if self.is_split(row) {
            // parts are never split again
            warn!("part of row {row} does not fit its frame and is clipped");
            self.emit(row, 1);
            self.next_frame();
            return;
        }
        let reserve = self.config.continuation_reserve;
        let line = match self.state.row_dim(row) {
            Dimension::Fixed(_) => Pt::ZERO,
            _ => self.state.line_height(row),
        };
        let round = |budget: Pt| {
            if line > Pt::ZERO {
                line * (budget / line).floor()
            } else {
                budget
            }
        };

        if round(self.budget() - reserve) <= Pt::ZERO && self.used {
            self.next_frame();
        }

        let mut parts = Vec::new();
        let mut left = self.state.row_heights()[row];
        let mut budget = self.budget();
        let mut frame = self.frame;
        loop {
            let groups = self.column_groups(self.frames.get(frame).width).len();
            let smallest = (1..groups)
                .map(|group| self.frame_budget(frame + group))
                .fold(budget, |smallest, budget| smallest.min(budget));
            let part = round(smallest - reserve);
            if part <= Pt::ZERO {
                parts.clear();
                break;
            }
            if left.fits_in(part) {
                parts.push(left);
                break;
            }
            parts.push(part);
            left -= part;
            frame += groups;
            budget = self.frame_budget(frame);
        }

        if parts.len() < 2 {
            warn!("row {row} does not fit any frame and is clipped");
            self.emit(row, 1);
            self.next_frame();
            return;
        }
        debug!("row {row} is split into {} parts", parts.len());
        self.state.split_row(row, &parts);
    }
}

impl Iterator for RegionPaginator<'_> {
    type Item = RegionItem;

    fn next(&mut self) -> Option<RegionItem> {
        loop {
            if self.cancel.is_cancelled() {
                if self.phase != Phase::Done {
                    debug!("pagination cancelled at row {}", self.row);
                }
                self.pending.clear();
                self.phase = Phase::Done;
                return None;
            }
            if let Some((item, frame)) = self.pending.pop_front() {
                self.item_frame = frame;
                return Some(item);
            }
            match self.phase {
                Phase::Scanning => self.scan(),
                Phase::SplittingRow { row } => self.split(row),
                Phase::Done => return None,
            }
        }
    }
}

//! A table as an element of a band.
//!
//! [TableElement] owns everything the layout of one table needs between
//! frames: the sized [GridLayoutState], the regions produced for the frames it
//! was validated against, and a cursor into them. Placing the table hands out
//! regions from the cursor onward, so printing can stop after any frame and
//! pick up again later. Each placement is one frame of the sequence the table
//! was validated against and gets the regions planned for that frame.

use crate::config::LayoutConfig;
use crate::flow::{Fragment, Placeable, PlacementFrame, PlacementResult};
use crate::gate::{CancelToken, DeferredGrid, SharedGrid};
use crate::grid::{Grid, GridSource};
use crate::measure::{CellFont, FontBook};
use crate::paginator::RegionPaginator;
use crate::rect::Rect;
use crate::region::{Frame, FrameSequence, RegionGeometry, RegionItem};
use crate::sizer::{GridLayoutState, GridSizer};
use crate::units::Pt;
use crate::LayoutError;
use log::{debug, warn};
use std::rc::Rc;
use std::sync::Arc;

enum Source {
    Static(Box<dyn GridSource>),
    /// Produced by another thread; `grid` is filled in once the gate opens
    Deferred {
        gate: Arc<DeferredGrid>,
        grid: Option<SharedGrid>,
    },
}

/// The grid layout reads from: the diagnostic grid once the source failed,
/// otherwise the source if its data is at hand
fn current_grid<'a>(source: &'a Source, substitute: &'a Option<Grid>) -> Option<&'a dyn GridSource> {
    if let Some(grid) = substitute {
        return Some(grid);
    }
    match source {
        Source::Static(grid) => Some(grid.as_ref()),
        Source::Deferred { grid, .. } => grid.as_ref().map(|g| g.as_ref() as &dyn GridSource),
    }
}

/// Size `grid` and paginate it over `frames`. Every item comes with the index
/// of the frame it goes into.
fn layout(
    state: &mut GridLayoutState,
    fonts: &FontBook,
    config: &LayoutConfig,
    cancel: &CancelToken,
    grid: &dyn GridSource,
    frames: &FrameSequence,
) -> Result<(Vec<RegionItem>, Vec<usize>), LayoutError> {
    GridSizer::new(grid, fonts, config).validate(state, frames.get(0).width)?;
    let mut paginator = RegionPaginator::new(state, config, frames.clone(), cancel.clone());
    let mut items = Vec::new();
    let mut item_frames = Vec::new();
    while let Some(item) = paginator.next() {
        items.push(item);
        item_frames.push(paginator.item_frame());
    }
    Ok((items, item_frames))
}

/// A table placed in a band
pub struct TableElement {
    source: Source,
    /// Shown instead of the source after its formatting failed
    substitute: Option<Grid>,
    fonts: Rc<FontBook>,
    /// Font of the diagnostic grid
    font: CellFont,
    config: LayoutConfig,
    state: GridLayoutState,
    regions: Vec<RegionItem>,
    /// frame index of every item in `regions`
    region_frames: Vec<usize>,
    cursor: usize,
    /// frame index of the next placement
    frame: usize,
    frames: Option<FrameSequence>,
    dirty: bool,
    cancel: CancelToken,
}

impl TableElement {
    /// A table showing `grid`. `font` is used if the grid cannot be formatted
    /// and a diagnostic is shown instead.
    pub fn new<G: GridSource + 'static>(grid: G, fonts: Rc<FontBook>, font: CellFont) -> TableElement {
        TableElement::with_source(Source::Static(Box::new(grid)), fonts, font, CancelToken::new())
    }

    /// A table whose data is published through `gate` by another thread.
    /// Layout blocks until the data is there; cancelling the gate leaves the
    /// table empty.
    pub fn deferred(gate: Arc<DeferredGrid>, fonts: Rc<FontBook>, font: CellFont) -> TableElement {
        let cancel = gate.cancel_token();
        TableElement::with_source(Source::Deferred { gate, grid: None }, fonts, font, cancel)
    }

    fn with_source(source: Source, fonts: Rc<FontBook>, font: CellFont, cancel: CancelToken) -> TableElement {
        TableElement {
            source,
            substitute: None,
            fonts,
            font,
            config: LayoutConfig::default(),
            state: GridLayoutState::new(),
            regions: Vec::new(),
            region_frames: Vec::new(),
            cursor: 0,
            frame: 0,
            frames: None,
            dirty: true,
            cancel,
        }
    }

    pub fn with_config(mut self, config: LayoutConfig) -> TableElement {
        self.config = config;
        self.dirty = true;
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// The grid being laid out, if its data is available
    pub fn grid(&self) -> Option<&dyn GridSource> {
        current_grid(&self.source, &self.substitute)
    }

    pub fn state(&self) -> &GridLayoutState {
        &self.state
    }

    /// Size the table and produce its regions for `frames`. Nothing is done
    /// if the table was already validated against the same frames and has
    /// not changed since.
    ///
    /// A source failing to format a cell is replaced by a one-cell grid
    /// showing the failure, and layout is tried once more.
    pub fn validate(&mut self, frames: FrameSequence) -> Result<(), LayoutError> {
        if !self.dirty && self.frames.as_ref() == Some(&frames) {
            return Ok(());
        }
        self.regions.clear();
        self.region_frames.clear();
        self.cursor = 0;
        self.frame = 0;
        self.frames = Some(frames.clone());
        self.dirty = false;

        if self.cancel.is_cancelled() {
            debug!("table was cancelled before layout");
            return Ok(());
        }
        if let Source::Deferred { gate, grid } = &mut self.source {
            if grid.is_none() {
                debug!("waiting for deferred table data");
                *grid = gate.wait();
            }
        }

        let Some(grid) = current_grid(&self.source, &self.substitute) else {
            debug!("table data never arrived");
            return Ok(());
        };
        let result = layout(
            &mut self.state,
            &self.fonts,
            &self.config,
            &self.cancel,
            grid,
            &frames,
        );
        (self.regions, self.region_frames) = match result {
            Err(LayoutError::Script { row, col, message }) if self.substitute.is_none() => {
                warn!("cell ({row}, {col}) could not be formatted, showing the error instead: {message}");
                let diagnostic = self
                    .substitute
                    .insert(Grid::diagnostic(message, self.font));
                layout(
                    &mut self.state,
                    &self.fonts,
                    &self.config,
                    &self.cancel,
                    &*diagnostic,
                    &frames,
                )?
            }
            result => result?,
        };
        debug!("table laid out into {} regions", self.regions.len());
        Ok(())
    }

    /// Every item produced by the last validate pass
    pub fn regions(&self) -> &[RegionItem] {
        &self.regions
    }

    pub fn region(&self, index: usize) -> Result<RegionItem, LayoutError> {
        self.regions
            .get(index)
            .copied()
            .ok_or(LayoutError::RegionIndex {
                index,
                len: self.regions.len(),
            })
    }

    /// Geometry of the region at `index`, or `None` for an area break
    pub fn geometry(&self, index: usize) -> Result<Option<RegionGeometry<'_>>, LayoutError> {
        Ok(match self.region(index)? {
            RegionItem::Region(region) => Some(RegionGeometry::new(&self.state, region)),
            RegionItem::AreaBreak => None,
        })
    }

    /// Index of the next item to place
    pub fn current_region(&self) -> usize {
        self.cursor
    }

    /// Continue placing from the item at `index`. `index` may be the end of
    /// the sequence, which finishes the table.
    pub fn rewind(&mut self, index: usize) -> Result<(), LayoutError> {
        if index > self.regions.len() {
            return Err(LayoutError::RegionIndex {
                index,
                len: self.regions.len(),
            });
        }
        self.cursor = index;
        self.frame = match self.region_frames.get(index) {
            Some(&frame) => frame,
            None => self.region_frames.last().map_or(0, |last| last + 1),
        };
        Ok(())
    }

    /// Regions still to be placed; none once the table is cancelled
    pub fn remaining_regions(&self) -> usize {
        if self.cancel.is_cancelled() {
            return 0;
        }
        self.regions[self.cursor..]
            .iter()
            .filter(|item| matches!(item, RegionItem::Region(_)))
            .count()
    }

    /// The content changed: the next placement sizes the table again
    pub fn invalidate(&mut self) {
        self.dirty = true;
        self.substitute = None;
    }

    pub fn cancel(&self) {
        match &self.source {
            Source::Deferred { gate, .. } => gate.cancel(),
            Source::Static(_) => self.cancel.cancel(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Placeable for TableElement {
    fn try_place(&mut self, frame: &PlacementFrame) -> Result<PlacementResult, LayoutError> {
        if self.dirty || self.frames.is_none() {
            let following = frame.following.iter().map(Frame::of).collect();
            self.validate(FrameSequence::new(Frame::of(&frame.area), following))?;
        }
        if self.remaining_regions() == 0 {
            self.cursor = self.regions.len();
            return Ok(PlacementResult::finished());
        }

        // items planned for this frame or an earlier one are due
        let current = self.frame;
        self.frame += 1;
        let area = frame.area;
        let mut used = Pt::ZERO;
        let mut fragments = Vec::new();
        while self.cursor < self.regions.len() && self.region_frames[self.cursor] <= current {
            let region = match self.regions[self.cursor] {
                RegionItem::AreaBreak => {
                    self.cursor += 1;
                    if fragments.is_empty() {
                        continue;
                    }
                    break;
                }
                RegionItem::Region(region) => region,
            };
            let geometry = RegionGeometry::new(&self.state, region);
            let mut height = geometry.height();
            if !(used + height).fits_in(area.height()) {
                if !fragments.is_empty() || !frame.at_top {
                    break;
                }
                warn!(
                    "rows {}..{} are taller than the frame and are clipped",
                    region.y,
                    region.y + region.height
                );
                height = area.height();
            }
            fragments.push(Fragment::Region {
                region,
                rect: Rect::new(area.x1, area.y1 + used, geometry.width(), height),
            });
            used += height;
            self.cursor += 1;
        }

        if fragments.is_empty() {
            return Ok(if self.remaining_regions() > 0 {
                debug!("table waits for frame {}", current + 1);
                PlacementResult::deferred()
            } else {
                PlacementResult::finished()
            });
        }
        Ok(PlacementResult {
            height: used,
            fragments,
            more: self.remaining_regions() > 0,
        })
    }

    fn can_grow(&self) -> bool {
        true
    }

    fn reset_print(&mut self) {
        // the band may start over in frames of a different size
        self.dirty = true;
        self.cursor = 0;
        self.frame = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutPolicy;
    use crate::flow::{
        paginate_band, Band, BandElement, FlowFlags, FlowPlacer, FlowStatus, FrameSet, PrintCursor,
    };
    use crate::grid::{Cell, Dimension};
    use crate::measure::FixedAdvance;
    use crate::region::Region;
    use std::thread;
    use std::time::Duration;

    // 10pt text: 5pt per character, 10pt per line
    fn fonts() -> (FontBook, CellFont) {
        let mut fonts = FontBook::new();
        let id = fonts.add(FixedAdvance {
            advance: 0.5,
            leading: 1.0,
        });
        (
            fonts,
            CellFont {
                id,
                size: Pt(10.0),
            },
        )
    }

    fn config() -> LayoutConfig {
        let mut config = LayoutConfig::new();
        config
            .policy(LayoutPolicy::FitContent)
            .cell_padding(Pt::ZERO)
            .gate_poll(Duration::from_millis(5));
        config
    }

    /// One header row and `rows - 1` data rows, 2 columns of 100 × 20
    fn grid(font: CellFont, rows: usize) -> Grid {
        let mut grid = Grid::new(rows, 2, font).with_headers(1, 0);
        for col in 0..2 {
            grid.set_col_width(col, Dimension::Fixed(Pt(100.0)));
        }
        for row in 0..rows {
            grid.set_row_height(row, Dimension::Fixed(Pt(20.0)));
        }
        grid
    }

    fn table_of(grid: Grid, fonts: FontBook, font: CellFont) -> TableElement {
        TableElement::new(grid, Rc::new(fonts), font).with_config(config())
    }

    fn table() -> TableElement {
        let (fonts, font) = fonts();
        table_of(grid(font, 6), fonts, font)
    }

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::new(Pt(x), Pt(y), Pt(w), Pt(h))
    }

    fn frames() -> FrameSequence {
        FrameSequence::uniform(Frame::new(300.0, 100.0))
    }

    fn placement_frame() -> PlacementFrame {
        let area = Rect::new(Pt::ZERO, Pt::ZERO, Pt(300.0), Pt(100.0));
        PlacementFrame {
            area,
            following: vec![area],
            at_top: true,
        }
    }

    fn region(x: usize, y: usize, width: usize, height: usize) -> RegionItem {
        RegionItem::Region(Region {
            x,
            y,
            width,
            height,
        })
    }

    struct Broken {
        font: CellFont,
    }

    impl GridSource for Broken {
        fn row_count(&self) -> usize {
            2
        }

        fn col_count(&self) -> usize {
            1
        }

        fn cell(&self, row: usize, col: usize) -> Result<Cell, LayoutError> {
            if row == 1 {
                return Err(LayoutError::Script {
                    row,
                    col,
                    message: "division by zero".to_string(),
                });
            }
            Ok(Cell::new("ok", self.font))
        }
    }

    #[test]
    fn regions_are_placed_frame_by_frame() {
        let mut table = table();
        let first = table.try_place(&placement_frame()).expect("table is placed");
        // the last row keeps company on the second frame
        assert_eq!(table.regions(), &[region(0, 1, 2, 3), region(0, 4, 2, 2)]);
        assert_eq!(first.height, Pt(80.0));
        assert!(first.more);
        assert_eq!(
            first.fragments,
            vec![Fragment::Region {
                region: Region {
                    x: 0,
                    y: 1,
                    width: 2,
                    height: 3
                },
                rect: Rect::new(Pt::ZERO, Pt::ZERO, Pt(200.0), Pt(80.0)),
            }]
        );
        assert_eq!(table.remaining_regions(), 1);

        let second = table.try_place(&placement_frame()).expect("table is placed");
        assert_eq!(second.height, Pt(60.0));
        assert!(!second.more);
        assert_eq!(table.remaining_regions(), 0);
    }

    #[test]
    fn validating_again_gives_the_same_regions() {
        let mut table = table();
        table.validate(frames()).expect("table is valid");
        let before = table.regions().to_vec();
        table.validate(frames()).expect("table is valid");
        assert_eq!(table.regions(), before.as_slice());
        table.invalidate();
        table.validate(frames()).expect("table is valid");
        assert_eq!(table.regions(), before.as_slice());
    }

    #[test]
    fn rewinding_places_regions_again() {
        let mut table = table();
        table.try_place(&placement_frame()).expect("table is placed");
        table.try_place(&placement_frame()).expect("table is placed");
        assert_eq!(table.current_region(), 2);

        table.rewind(1).expect("index is in range");
        let again = table.try_place(&placement_frame()).expect("table is placed");
        assert_eq!(again.height, Pt(60.0));
        assert!(matches!(
            table.rewind(5),
            Err(LayoutError::RegionIndex { index: 5, len: 2 })
        ));
    }

    #[test]
    fn lookups_past_the_end_are_errors() {
        let mut table = table();
        table.validate(frames()).expect("table is valid");
        assert_eq!(table.region(1).expect("in range"), region(0, 4, 2, 2));
        let geometry = table.geometry(0).expect("in range").expect("not a break");
        assert_eq!(geometry.height(), Pt(80.0));
        assert!(matches!(
            table.region(7),
            Err(LayoutError::RegionIndex { index: 7, len: 2 })
        ));
    }

    #[test]
    fn formatting_errors_are_shown_in_place_of_the_table() {
        let (fonts, font) = fonts();
        let mut table = TableElement::new(Broken { font }, Rc::new(fonts), font).with_config(config());
        table.validate(frames()).expect("the error is substituted");

        assert_eq!(table.regions(), &[region(0, 0, 1, 1)]);
        let shown = table.grid().expect("grid is available").cell(0, 0).expect("in range");
        assert_eq!(shown.value, "division by zero");
    }

    #[test]
    fn source_contract_violations_are_returned() {
        struct Short;

        impl GridSource for Short {
            fn row_count(&self) -> usize {
                1
            }

            fn col_count(&self) -> usize {
                1
            }

            fn cell(&self, row: usize, col: usize) -> Result<Cell, LayoutError> {
                Err(LayoutError::CellOutOfRange { row, col })
            }
        }

        let (fonts, font) = fonts();
        let mut table = TableElement::new(Short, Rc::new(fonts), font);
        assert!(matches!(
            table.validate(frames()),
            Err(LayoutError::CellOutOfRange { row: 0, col: 0 })
        ));
    }

    #[test]
    fn cancelled_tables_have_nothing_left() {
        let mut table = table();
        table.validate(frames()).expect("table is valid");
        table.cancel();
        assert!(table.is_cancelled());
        assert_eq!(table.remaining_regions(), 0);
        assert_eq!(
            table.try_place(&placement_frame()).expect("nothing to place"),
            PlacementResult::finished()
        );
    }

    #[test]
    fn deferred_data_is_waited_for() {
        let (fonts, font) = fonts();
        let config = config();
        let gate = Arc::new(DeferredGrid::for_config(&config));
        let mut table = TableElement::deferred(gate.clone(), Rc::new(fonts), font).with_config(config);

        let producer = {
            let gate = gate.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                let data: SharedGrid = Arc::new(grid(font, 6));
                gate.publish(data)
            })
        };
        table.validate(frames()).expect("table is valid");
        assert!(producer.join().expect("producer finished"));
        assert_eq!(table.regions().len(), 2);
    }

    #[test]
    fn cancelled_gates_leave_the_table_empty() {
        let (fonts, font) = fonts();
        let config = config();
        let gate = Arc::new(DeferredGrid::for_config(&config));
        let mut table = TableElement::deferred(gate, Rc::new(fonts), font).with_config(config);
        table.cancel();

        table.validate(frames()).expect("nothing to lay out");
        assert!(table.grid().is_none());
        assert!(table.regions().is_empty());
    }

    #[test]
    fn first_rows_left_alone_move_to_the_next_frame() {
        let (fonts, font) = fonts();
        let mut band = Band::new();
        let id = band.add(BandElement::new(
            rect(0.0, 0.0, 200.0, 20.0),
            table_of(grid(font, 4), fonts, font),
        ));
        let small = rect(0.0, 0.0, 220.0, 45.0);
        let large = rect(300.0, 0.0, 220.0, 100.0);
        let flags = FlowFlags {
            at_top: true,
            ..FlowFlags::default()
        };

        // only the first data row would fit under the header
        let first = FlowPlacer::print_fixed_container(&mut band, small, &[large, small], flags)
            .expect("band is placed");
        assert_eq!(first.status, FlowStatus::MoreElem);
        assert!(first.placements.is_empty());

        let flags = FlowFlags {
            continuation: true,
            ..flags
        };
        let second = FlowPlacer::print_fixed_container(&mut band, large, &[small, large], flags)
            .expect("band is placed");
        assert_eq!(second.status, FlowStatus::Completed);
        assert_eq!(second.placements[0].element, id);
        assert_eq!(
            second.placements[0].fragments,
            vec![Fragment::Region {
                region: Region {
                    x: 0,
                    y: 1,
                    width: 2,
                    height: 3
                },
                rect: rect(300.0, 0.0, 200.0, 80.0),
            }]
        );
    }

    #[test]
    fn bands_skip_the_frame_the_first_rows_leave() {
        let (fonts, font) = fonts();
        let mut band = Band::new();
        band.add(BandElement::new(
            rect(0.0, 0.0, 200.0, 20.0),
            table_of(grid(font, 4), fonts, font),
        ));
        let frames = FrameSet::new(vec![
            rect(0.0, 0.0, 220.0, 45.0),
            rect(300.0, 0.0, 220.0, 100.0),
        ]);
        let mut cursor = PrintCursor::new(frames);

        let placed = paginate_band(&mut band, &mut cursor).expect("band is placed");
        assert_eq!(placed.len(), 1);
        assert_eq!((placed[0].page, placed[0].frame), (0, 1));
        assert_eq!(placed[0].placements[0].fragments.len(), 1);
    }

    #[test]
    fn regions_follow_frames_of_different_sizes() {
        let (fonts, font) = fonts();
        let mut grid = Grid::new(20, 1, font);
        grid.set_col_width(0, Dimension::Fixed(Pt(100.0)));
        for row in 0..20 {
            grid.set_row_height(row, Dimension::Fixed(Pt(20.0)));
        }
        let mut band = Band::new();
        band.add(BandElement::new(rect(0.0, 0.0, 100.0, 20.0), table_of(grid, fonts, font)));
        let frames = FrameSet::new(vec![
            rect(0.0, 0.0, 100.0, 60.0),
            rect(200.0, 0.0, 100.0, 200.0),
        ]);
        let mut cursor = PrintCursor::new(frames.clone());

        let placed = paginate_band(&mut band, &mut cursor).expect("band is placed");
        let mut heights = Vec::new();
        for frame in &placed {
            let limit = frames.get(frame.frame);
            for fragment in &frame.placements[0].fragments {
                let rect = fragment.rect();
                assert!(rect.y2 <= limit.y2, "{rect:?} leaves frame {}", frame.frame);
                heights.push((frame.page, frame.frame, rect.height()));
            }
        }
        assert_eq!(
            heights,
            vec![
                (0, 0, Pt(60.0)),
                (0, 1, Pt(200.0)),
                (1, 0, Pt(60.0)),
                (1, 1, Pt(80.0))
            ]
        );
    }

    #[test]
    fn regions_taller_than_the_frame_are_clipped_to_it() {
        let (fonts, font) = fonts();
        let mut table = table_of(grid(font, 3), fonts, font);
        table
            .validate(FrameSequence::uniform(Frame::new(300.0, 100.0)))
            .expect("table is valid");
        let area = rect(0.0, 0.0, 300.0, 30.0);
        let placed = table
            .try_place(&PlacementFrame {
                area,
                following: vec![area],
                at_top: true,
            })
            .expect("table is placed");
        assert_eq!(placed.height, Pt(30.0));
        assert_eq!(placed.fragments[0].rect(), rect(0.0, 0.0, 200.0, 30.0));
        assert!(!placed.more);
    }
}

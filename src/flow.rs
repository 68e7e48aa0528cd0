//! Placing the elements of a fixed band across frames and pages.
//!
//! A [Band] holds elements at fixed design positions. Printing it into a
//! frame ([FlowPlacer::print_fixed_container]) places every element that
//! fits, lets growable elements (tables, flowing text) take the rest of the
//! frame, pushes elements below a grown one out of its way, and reports
//! whether the band is finished. [paginate_band] drives that over a
//! [PrintCursor] until the band is complete.

use crate::rect::Rect;
use crate::region::Region;
use crate::units::{Pt, EPSILON};
use crate::LayoutError;
use id_arena::{Arena, Id};
use log::{debug, trace, warn};

/// The space an element may use in the current frame
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementFrame {
    /// Where the element goes now; growable elements get everything down to
    /// the bottom of the frame
    pub area: Rect,
    /// The same slot in the frames that follow, in the order they are filled,
    /// for elements that continue. They repeat from the start once used up.
    pub following: Vec<Rect>,
    /// Nothing else sits above the element in this frame, so it has to
    /// place something to make progress
    pub at_top: bool,
}

/// A piece of an element placed in a frame, in page layout space
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// One region of a table
    Region { region: Region, rect: Rect },
    /// Consecutive lines of a text, starting at line `first`
    Lines {
        first: usize,
        lines: Vec<String>,
        rect: Rect,
    },
    /// An opaque box: an image or a shape
    Block { rect: Rect },
}

impl Fragment {
    pub fn rect(&self) -> Rect {
        match self {
            Fragment::Region { rect, .. } | Fragment::Lines { rect, .. } | Fragment::Block { rect } => {
                *rect
            }
        }
    }

    fn translate(&mut self, dx: Pt, dy: Pt) {
        match self {
            Fragment::Region { rect, .. } | Fragment::Lines { rect, .. } | Fragment::Block { rect } => {
                *rect = rect.translate(dx, dy)
            }
        }
    }
}

/// What an element placed in one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementResult {
    /// Height used, from the top of the offered area
    pub height: Pt,
    pub fragments: Vec<Fragment>,
    /// Whether the element continues in the next frame
    pub more: bool,
}

impl PlacementResult {
    /// Nothing was placed, but the element still has content
    pub fn deferred() -> PlacementResult {
        PlacementResult {
            height: Pt::ZERO,
            fragments: Vec::new(),
            more: true,
        }
    }

    /// Nothing was placed and nothing is left
    pub fn finished() -> PlacementResult {
        PlacementResult::default()
    }
}

/// Anything a band can hold
pub trait Placeable {
    /// Place as much as fits `frame`, continuing from wherever the previous
    /// call stopped
    fn try_place(&mut self, frame: &PlacementFrame) -> Result<PlacementResult, LayoutError>;

    /// Whether the element may extend below its design rectangle
    fn can_grow(&self) -> bool;

    /// Forget any progress, so the next placement starts from the beginning
    fn reset_print(&mut self);
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum VerticalAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

pub type ElementId = Id<BandElement>;

/// An element at a fixed position within its band
pub struct BandElement {
    design: Rect,
    valign: VerticalAlign,
    content: Box<dyn Placeable>,
    printed: bool,
    continuation: bool,
    shift: Pt,
}

impl BandElement {
    /// An element whose design rectangle is `design`, relative to the top-left
    /// of the band
    pub fn new<P: Placeable + 'static>(design: Rect, content: P) -> BandElement {
        BandElement {
            design,
            valign: VerticalAlign::default(),
            content: Box::new(content),
            printed: false,
            continuation: false,
            shift: Pt::ZERO,
        }
    }

    /// Align the content within the design rectangle; only used by elements
    /// that cannot grow
    pub fn with_valign(mut self, valign: VerticalAlign) -> BandElement {
        self.valign = valign;
        self
    }

    pub fn design(&self) -> Rect {
        self.design
    }

    pub fn is_printed(&self) -> bool {
        self.printed
    }

    pub fn is_continuation(&self) -> bool {
        self.continuation
    }

    /// How far growing elements above have pushed this one down
    pub fn shift(&self) -> Pt {
        self.shift
    }

    pub fn content(&self) -> &dyn Placeable {
        self.content.as_ref()
    }

    pub fn content_mut(&mut self) -> &mut dyn Placeable {
        self.content.as_mut()
    }

    fn reset_print(&mut self) {
        self.printed = false;
        self.continuation = false;
        self.shift = Pt::ZERO;
        self.content.reset_print();
    }
}

/// A fixed-position group of elements printed together
#[derive(Default)]
pub struct Band {
    elements: Arena<BandElement>,
    order: Vec<ElementId>,
    /// the design position shown at the top of the current frame
    offset: Pt,
}

impl Band {
    pub fn new() -> Band {
        Band::default()
    }

    pub fn add(&mut self, element: BandElement) -> ElementId {
        let id = self.elements.alloc(element);
        self.order.push(id);
        id
    }

    pub fn get(&self, id: ElementId) -> Option<&BandElement> {
        self.elements.get(id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut BandElement> {
        self.elements.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.len() == 0
    }

    pub fn is_complete(&self) -> bool {
        self.elements.iter().all(|(_, e)| e.printed)
    }

    /// Start printing the band over from its first element
    pub fn reset_print(&mut self) {
        self.offset = Pt::ZERO;
        for (_, element) in self.elements.iter_mut() {
            element.reset_print();
        }
    }

    /// Element ids ordered by design position, top to bottom then left to
    /// right
    fn sorted(&self) -> Vec<ElementId> {
        let mut order = self.order.clone();
        order.sort_by(|a, b| {
            let (a, b) = (self.elements[*a].design, self.elements[*b].design);
            a.y1.0.total_cmp(&b.y1.0).then(a.x1.0.total_cmp(&b.x1.0))
        });
        order
    }

    /// The design position that goes to the top of the next frame: the
    /// bottom of the highest continuation, or else the highest element still
    /// waiting to be printed
    fn next_offset(&self) -> Pt {
        let continuation = self
            .elements
            .iter()
            .filter(|(_, e)| e.continuation)
            .map(|(_, e)| e.design.y2 + e.shift)
            .reduce(Pt::min);
        continuation.unwrap_or_else(|| {
            self.elements
                .iter()
                .filter(|(_, e)| !e.printed)
                .map(|(_, e)| e.design.y1 + e.shift)
                .reduce(Pt::min)
                .unwrap_or(self.offset)
        })
    }
}

/// How far printing a band got in one frame
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FlowStatus {
    /// Every element is printed
    Completed,
    /// Elements below the frame are still waiting
    MoreElem,
    /// An element continues into the next frame
    MoreFlow,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct FlowFlags {
    /// The band was already started in an earlier frame
    pub continuation: bool,
    /// The frame is empty above the band
    pub at_top: bool,
    /// There is no next frame: elements that place nothing are dropped
    pub single_page: bool,
}

/// Where one element went in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub element: ElementId,
    /// The element's print bounds; for continuing elements they reach down to
    /// the bottom of the flowing content
    pub bounds: Rect,
    pub fragments: Vec<Fragment>,
    pub continued: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowOutcome {
    pub status: FlowStatus,
    pub placements: Vec<Placement>,
    /// Lowest point reached by the band in the frame
    pub bottom: Pt,
}

/// Lays out fixed bands
pub struct FlowPlacer;

impl FlowPlacer {
    /// Print as much of `band` as fits `area`. `following` are the frames the
    /// band continues in when it does not fit, starting with the next one.
    pub fn print_fixed_container(
        band: &mut Band,
        area: Rect,
        following: &[Rect],
        flags: FlowFlags,
    ) -> Result<FlowOutcome, LayoutError> {
        if !flags.continuation {
            band.reset_print();
        }
        let offset = band.offset;
        let order = band.sorted();

        let mut placements: Vec<Placement> = Vec::new();
        let mut bottom = area.y1;
        let mut more_bottom: Option<Pt> = None;
        // elements designed at or below this wait for a continuation above them
        let mut barrier: Option<Pt> = None;

        for (i, &id) in order.iter().enumerate() {
            let element = &mut band.elements[id];
            if element.printed {
                continue;
            }
            if barrier.is_some_and(|limit| element.design.y1.0 >= limit.0 - EPSILON) {
                trace!("element at {} waits for the element above it", element.design.y1);
                continue;
            }

            let top = area.y1 + element.design.y1 + element.shift - offset;
            let y = top.max(area.y1);
            if y >= area.y2 {
                trace!("element at {} is below the frame", element.design.y1);
                continue;
            }

            let x = area.x1 + element.design.x1;
            let width = element.design.width();
            let grows = element.content.can_grow();
            let slot_bottom = if grows {
                area.y2
            } else {
                (top + element.design.height()).min(area.y2)
            };
            let slot = Rect::new(x, y, width, (slot_bottom - y).non_negative());
            let frame = PlacementFrame {
                area: slot,
                following: following
                    .iter()
                    .map(|next| {
                        Rect::new(next.x1 + element.design.x1, next.y1, width, next.height())
                    })
                    .collect(),
                at_top: flags.at_top && y.approx_eq(area.y1),
            };

            let mut result = element.content.try_place(&frame)?;
            if result.fragments.is_empty() && result.more {
                if flags.single_page {
                    warn!(
                        "element at {} fits nowhere and is skipped",
                        element.design.y1
                    );
                    element.printed = true;
                    continue;
                }
                debug!("element at {} is retried in the next frame", element.design.y1);
                let limit = element.design.y2;
                barrier = Some(barrier.map_or(limit, |b| b.min(limit)));
                continue;
            }

            let bounds = if grows {
                Rect::new(x, y, width, result.height)
            } else {
                let free = (slot.height() - result.height).non_negative();
                let dy = match element.valign {
                    VerticalAlign::Top => Pt::ZERO,
                    VerticalAlign::Center => free / 2.0,
                    VerticalAlign::Bottom => free,
                };
                for fragment in result.fragments.iter_mut() {
                    fragment.translate(Pt::ZERO, dy);
                }
                slot
            };
            bottom = bottom.max(bounds.y2);

            if result.more {
                element.continuation = true;
                let content_bottom = y + result.height;
                more_bottom = Some(more_bottom.map_or(content_bottom, |b| b.max(content_bottom)));
                let limit = element.design.y2;
                barrier = Some(barrier.map_or(limit, |b| b.min(limit)));
            } else {
                element.printed = true;
                element.continuation = false;
            }

            // push whatever lies below out of the way of a grown element
            let grown_bottom = y + result.height;
            if grows && grown_bottom > top + element.design.height() {
                let design_bottom = element.design.y2;
                let next_top = order[i + 1..]
                    .iter()
                    .map(|id| &band.elements[*id])
                    .filter(|e| !e.printed && e.design.y1.0 >= design_bottom.0 - EPSILON)
                    .map(|e| area.y1 + e.design.y1 + e.shift - offset)
                    .reduce(Pt::min);
                if let Some(next_top) = next_top {
                    let overlap = grown_bottom - next_top;
                    if overlap > Pt::ZERO {
                        trace!("pushing elements below {design_bottom} down by {overlap}");
                        for &other in &order[i + 1..] {
                            let other = &mut band.elements[other];
                            if other.design.y1.0 >= design_bottom.0 - EPSILON {
                                other.shift += overlap;
                            }
                        }
                    }
                }
            }

            placements.push(Placement {
                element: id,
                bounds,
                fragments: result.fragments,
                continued: result.more,
            });
        }

        if let Some(more_bottom) = more_bottom {
            for placement in placements.iter_mut().filter(|p| p.continued) {
                placement.bounds.y2 = placement.bounds.y2.max(more_bottom);
            }
            bottom = bottom.max(more_bottom);
        }

        let status = if band.is_complete() {
            FlowStatus::Completed
        } else if band.elements.iter().any(|(_, e)| e.continuation) {
            FlowStatus::MoreFlow
        } else {
            FlowStatus::MoreElem
        };
        if status != FlowStatus::Completed {
            band.offset = band.next_offset();
        }

        Ok(FlowOutcome {
            status,
            placements,
            bottom,
        })
    }
}

/// The frames of a page, filled one after the other. Every page has the same
/// frames.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSet {
    frames: Vec<Rect>,
}

impl FrameSet {
    /// Frames in the order they are filled; at least one frame is needed
    pub fn new(frames: Vec<Rect>) -> FrameSet {
        FrameSet { frames }
    }

    pub fn single(frame: Rect) -> FrameSet {
        FrameSet::new(vec![frame])
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Rect {
        if self.frames.is_empty() {
            return Rect::default();
        }
        self.frames[index % self.frames.len()]
    }
}

/// Where the next band goes: a page, a frame on it, and a position in the
/// frame
#[derive(Debug, Clone, PartialEq)]
pub struct PrintCursor {
    frames: FrameSet,
    page: usize,
    frame: usize,
    y: Pt,
}

impl PrintCursor {
    pub fn new(frames: FrameSet) -> PrintCursor {
        let y = frames.get(0).y1;
        PrintCursor {
            frames,
            page: 0,
            frame: 0,
            y,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn y(&self) -> Pt {
        self.y
    }

    /// What is left of the current frame
    pub fn area(&self) -> Rect {
        let frame = self.frames.get(self.frame);
        Rect {
            y1: self.y.min(frame.y2),
            ..frame
        }
    }

    /// One round of frames after the current one, starting with the next,
    /// possibly on the next page
    pub fn following(&self) -> Vec<Rect> {
        (1..=self.frames.len())
            .map(|i| self.frames.get(self.frame + i))
            .collect()
    }

    pub fn remaining(&self) -> Pt {
        self.area().height()
    }

    /// Whether nothing was placed in the current frame yet
    pub fn at_top(&self) -> bool {
        self.y.approx_eq(self.frames.get(self.frame).y1)
    }

    /// Continue in the next frame, starting a new page after the last one
    pub fn advance(&mut self) {
        self.frame += 1;
        if self.frame >= self.frames.len() {
            self.frame = 0;
            self.page += 1;
        }
        self.y = self.frames.get(self.frame).y1;
    }

    /// Move down within the current frame
    pub fn move_to(&mut self, y: Pt) {
        self.y = y.max(self.y);
    }
}

/// Everything placed in one frame of one page
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlacements {
    pub page: usize,
    pub frame: usize,
    pub placements: Vec<Placement>,
}

/// Print `band` from the cursor onward until it is complete, leaving the
/// cursor just below the band
pub fn paginate_band(
    band: &mut Band,
    cursor: &mut PrintCursor,
) -> Result<Vec<FramePlacements>, LayoutError> {
    let mut frames = Vec::new();
    let mut flags = FlowFlags::default();
    // empty frames in a row, counted from their top
    let mut stalled = 0;
    loop {
        flags.at_top = cursor.at_top();
        let area = cursor.area();
        let following = cursor.following();
        let mut outcome = FlowPlacer::print_fixed_container(band, area, &following, flags)?;
        flags.continuation = true;

        if outcome.placements.is_empty() && outcome.status != FlowStatus::Completed && flags.at_top {
            stalled += 1;
            // a waiting element gets every frame of a page once before it is dropped
            if stalled > following.len() {
                warn!("band makes no progress on page {}", cursor.page());
                let single = FlowFlags {
                    single_page: true,
                    ..flags
                };
                outcome = FlowPlacer::print_fixed_container(band, area, &following, single)?;
                stalled = 0;
            }
        } else {
            stalled = 0;
        }

        if !outcome.placements.is_empty() {
            frames.push(FramePlacements {
                page: cursor.page(),
                frame: cursor.frame(),
                placements: outcome.placements,
            });
        }
        match outcome.status {
            FlowStatus::Completed => {
                cursor.move_to(outcome.bottom);
                return Ok(frames);
            }
            FlowStatus::MoreElem | FlowStatus::MoreFlow => cursor.advance(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Takes a fixed height, growing past its design rectangle
    struct Grower {
        height: Pt,
    }

    impl Placeable for Grower {
        fn try_place(&mut self, frame: &PlacementFrame) -> Result<PlacementResult, LayoutError> {
            Ok(PlacementResult {
                height: self.height,
                fragments: vec![Fragment::Block {
                    rect: frame.area.with_height(self.height),
                }],
                more: false,
            })
        }

        fn can_grow(&self) -> bool {
            true
        }

        fn reset_print(&mut self) {}
    }

    /// Fills its slot
    struct Fill;

    impl Placeable for Fill {
        fn try_place(&mut self, frame: &PlacementFrame) -> Result<PlacementResult, LayoutError> {
            Ok(PlacementResult {
                height: frame.area.height(),
                fragments: vec![Fragment::Block { rect: frame.area }],
                more: false,
            })
        }

        fn can_grow(&self) -> bool {
            false
        }

        fn reset_print(&mut self) {}
    }

    /// Growable content of `total` lines of 10pt
    struct Lines {
        total: usize,
        next: usize,
    }

    impl Placeable for Lines {
        fn try_place(&mut self, frame: &PlacementFrame) -> Result<PlacementResult, LayoutError> {
            let fit = ((frame.area.height() / Pt(10.0)) as usize).min(self.total - self.next);
            if fit == 0 {
                return Ok(PlacementResult::deferred());
            }
            let first = self.next;
            self.next += fit;
            Ok(PlacementResult {
                height: Pt(10.0) * fit as f32,
                fragments: vec![Fragment::Lines {
                    first,
                    lines: vec![String::new(); fit],
                    rect: frame.area.with_height(Pt(10.0) * fit as f32),
                }],
                more: self.next < self.total,
            })
        }

        fn can_grow(&self) -> bool {
            true
        }

        fn reset_print(&mut self) {
            self.next = 0;
        }
    }

    /// Never finds room
    struct Never;

    impl Placeable for Never {
        fn try_place(&mut self, _frame: &PlacementFrame) -> Result<PlacementResult, LayoutError> {
            Ok(PlacementResult::deferred())
        }

        fn can_grow(&self) -> bool {
            false
        }

        fn reset_print(&mut self) {}
    }

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::new(Pt(x), Pt(y), Pt(w), Pt(h))
    }

    fn print(band: &mut Band, area: Rect, flags: FlowFlags) -> FlowOutcome {
        FlowPlacer::print_fixed_container(band, area, &[area], flags).expect("band is placed")
    }

    fn bounds(outcome: &FlowOutcome, id: ElementId) -> Rect {
        outcome
            .placements
            .iter()
            .find(|p| p.element == id)
            .map(|p| p.bounds)
            .expect("element was placed")
    }

    #[test]
    fn grown_elements_push_the_ones_below() {
        let mut band = Band::new();
        let grower = band.add(BandElement::new(
            rect(0.0, 0.0, 50.0, 5.0),
            Grower { height: Pt(15.0) },
        ));
        let beside = band.add(BandElement::new(rect(60.0, 0.0, 30.0, 5.0), Fill));
        let below = band.add(BandElement::new(rect(0.0, 10.0, 50.0, 30.0), Fill));

        let area = rect(0.0, 0.0, 100.0, 100.0);
        let outcome = print(&mut band, area, FlowFlags::default());

        assert_eq!(outcome.status, FlowStatus::Completed);
        assert_eq!(bounds(&outcome, grower), rect(0.0, 0.0, 50.0, 15.0));
        assert_eq!(bounds(&outcome, beside), rect(60.0, 0.0, 30.0, 5.0));
        assert_eq!(bounds(&outcome, below), rect(0.0, 15.0, 50.0, 30.0));
        assert_eq!(band.get(below).map(BandElement::shift), Some(Pt(5.0)));
        assert_eq!(band.get(beside).map(BandElement::shift), Some(Pt::ZERO));
        assert_eq!(outcome.bottom, Pt(45.0));
    }

    #[test]
    fn fixed_elements_are_aligned_in_their_slot() {
        let mut band = Band::new();
        let bottom = band.add(
            BandElement::new(
                rect(0.0, 0.0, 50.0, 40.0),
                Grower { height: Pt(10.0) },
            )
            .with_valign(VerticalAlign::Bottom),
        );
        let area = rect(0.0, 0.0, 100.0, 100.0);
        let outcome = print(&mut band, area, FlowFlags::default());
        // growable elements ignore alignment
        assert_eq!(bounds(&outcome, bottom), rect(0.0, 0.0, 50.0, 10.0));

        struct Short;
        impl Placeable for Short {
            fn try_place(&mut self, frame: &PlacementFrame) -> Result<PlacementResult, LayoutError> {
                Ok(PlacementResult {
                    height: Pt(10.0),
                    fragments: vec![Fragment::Block {
                        rect: frame.area.with_height(Pt(10.0)),
                    }],
                    more: false,
                })
            }
            fn can_grow(&self) -> bool {
                false
            }
            fn reset_print(&mut self) {}
        }

        let mut band = Band::new();
        let centered = band.add(
            BandElement::new(rect(0.0, 20.0, 50.0, 40.0), Short).with_valign(VerticalAlign::Center),
        );
        let outcome = print(&mut band, area, FlowFlags::default());
        let placement = &outcome.placements[0];
        assert_eq!(placement.element, centered);
        assert_eq!(placement.fragments[0].rect(), rect(0.0, 35.0, 50.0, 10.0));
    }

    #[test]
    fn continuations_hold_back_the_elements_below() {
        let mut band = Band::new();
        let text = band.add(BandElement::new(
            rect(0.0, 0.0, 100.0, 10.0),
            Lines { total: 8, next: 0 },
        ));
        let beside = band.add(BandElement::new(rect(120.0, 0.0, 30.0, 20.0), Fill));
        let after = band.add(BandElement::new(rect(0.0, 20.0, 100.0, 10.0), Fill));

        let area = rect(0.0, 0.0, 200.0, 50.0);
        let flags = FlowFlags {
            at_top: true,
            ..FlowFlags::default()
        };
        let first = print(&mut band, area, flags);
        assert_eq!(first.status, FlowStatus::MoreFlow);
        assert_eq!(first.placements.len(), 2);
        assert!(band.get(beside).is_some_and(BandElement::is_printed));
        assert!(!band.get(after).is_some_and(BandElement::is_printed));
        // the continuation's bounds reach the bottom of its content
        assert_eq!(bounds(&first, text), rect(0.0, 0.0, 100.0, 50.0));

        let flags = FlowFlags {
            continuation: true,
            at_top: true,
            ..FlowFlags::default()
        };
        let second = print(&mut band, area, flags);
        assert_eq!(second.status, FlowStatus::Completed);
        assert_eq!(bounds(&second, text), rect(0.0, 0.0, 100.0, 30.0));
        // the gap between the text and the element below is kept
        assert_eq!(bounds(&second, after), rect(0.0, 40.0, 100.0, 10.0));
    }

    #[test]
    fn elements_below_the_frame_wait_for_the_next() {
        let mut band = Band::new();
        let top = band.add(BandElement::new(rect(0.0, 0.0, 50.0, 10.0), Fill));
        let low = band.add(BandElement::new(rect(0.0, 150.0, 50.0, 10.0), Fill));
        let area = rect(0.0, 0.0, 100.0, 100.0);
        let flags = FlowFlags {
            at_top: true,
            ..FlowFlags::default()
        };

        let first = print(&mut band, area, flags);
        assert_eq!(first.status, FlowStatus::MoreElem);
        assert_eq!(bounds(&first, top), rect(0.0, 0.0, 50.0, 10.0));
        assert_eq!(first.placements.len(), 1);

        let flags = FlowFlags {
            continuation: true,
            ..flags
        };
        let second = print(&mut band, area, flags);
        assert_eq!(second.status, FlowStatus::Completed);
        // the waiting element starts the next frame
        assert_eq!(bounds(&second, low), rect(0.0, 0.0, 50.0, 10.0));
    }

    #[test]
    fn elements_placing_nothing_hold_back_the_ones_below() {
        let mut band = Band::new();
        let stuck = band.add(BandElement::new(rect(0.0, 0.0, 50.0, 10.0), Never));
        let below = band.add(BandElement::new(rect(0.0, 20.0, 50.0, 10.0), Fill));
        let area = rect(0.0, 0.0, 100.0, 100.0);
        let flags = FlowFlags {
            at_top: true,
            ..FlowFlags::default()
        };

        let outcome = print(&mut band, area, flags);
        assert_eq!(outcome.status, FlowStatus::MoreElem);
        assert!(outcome.placements.is_empty());
        assert!(!band.get(stuck).is_some_and(BandElement::is_printed));

        let single = FlowFlags {
            continuation: true,
            single_page: true,
            ..flags
        };
        let outcome = print(&mut band, area, single);
        assert_eq!(outcome.status, FlowStatus::Completed);
        assert!(band.get(stuck).is_some_and(BandElement::is_printed));
        assert_eq!(outcome.placements.len(), 1);
        assert_eq!(bounds(&outcome, below), rect(0.0, 20.0, 50.0, 10.0));
    }

    #[test]
    fn stuck_elements_are_dropped_after_a_page_of_empty_frames() {
        let mut band = Band::new();
        band.add(BandElement::new(rect(0.0, 0.0, 50.0, 10.0), Never));
        let below = band.add(BandElement::new(rect(0.0, 20.0, 50.0, 10.0), Fill));
        let mut cursor = PrintCursor::new(FrameSet::single(rect(0.0, 0.0, 100.0, 100.0)));

        let frames = paginate_band(&mut band, &mut cursor).expect("band is placed");
        assert_eq!(frames.len(), 1);
        assert_eq!((frames[0].page, frames[0].frame), (1, 0));
        assert_eq!(frames[0].placements[0].element, below);
        assert_eq!(frames[0].placements[0].bounds, rect(0.0, 20.0, 50.0, 10.0));
        assert_eq!(cursor.y(), Pt(30.0));
    }

    #[test]
    fn bands_run_over_frames_and_pages() {
        let mut band = Band::new();
        let text = band.add(BandElement::new(
            rect(0.0, 0.0, 100.0, 10.0),
            Lines { total: 25, next: 0 },
        ));
        let frames = FrameSet::new(vec![
            rect(0.0, 0.0, 100.0, 50.0),
            rect(120.0, 0.0, 100.0, 50.0),
        ]);
        let mut cursor = PrintCursor::new(frames);
        assert_eq!(
            cursor.following(),
            vec![rect(120.0, 0.0, 100.0, 50.0), rect(0.0, 0.0, 100.0, 50.0)]
        );

        let placed = paginate_band(&mut band, &mut cursor).expect("band is placed");
        let visited: Vec<(usize, usize)> = placed.iter().map(|f| (f.page, f.frame)).collect();
        assert_eq!(visited, vec![(0, 0), (0, 1), (1, 0), (1, 1), (2, 0)]);
        for frame in &placed {
            let placement = &frame.placements[0];
            assert_eq!(placement.element, text);
            assert_eq!(placement.fragments[0].rect().height(), Pt(50.0));
        }
        assert_eq!(placed[1].placements[0].fragments[0].rect().x1, Pt(120.0));
        assert_eq!((cursor.page(), cursor.frame(), cursor.y()), (2, 0, Pt(50.0)));
    }
}

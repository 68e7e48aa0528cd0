//! Sizing and pagination of tables for paged documents.
//!
//! A [Grid] (or any other [GridSource]) is sized by [GridSizer], split into
//! page-sized [Region]s by [RegionPaginator], and placed together with the
//! other elements of its [Band] by [FlowPlacer]. [paginate_band] drives a band
//! across as many frames and pages as it needs:
//!
//! ```
//! use grid_flow::*;
//! use std::rc::Rc;
//!
//! let mut fonts = FontBook::new();
//! let font = CellFont {
//!     id: fonts.add(FixedAdvance::default()),
//!     size: Pt(10.0),
//! };
//! let grid = Grid::from_values(
//!     &[vec!["part", "qty"], vec!["bolts", "12"], vec!["nuts", "40"]],
//!     font,
//! )
//! .with_headers(1, 0);
//!
//! let mut band = Band::new();
//! let table = band.add(BandElement::new(
//!     Rect::new(Pt(0.0), Pt(0.0), Pt(300.0), Pt(50.0)),
//!     TableElement::new(grid, Rc::new(fonts), font),
//! ));
//!
//! let page = Rect::new(Pt(36.0), Pt(36.0), Pt(300.0), Pt(400.0));
//! let mut cursor = PrintCursor::new(FrameSet::single(page));
//! let frames = paginate_band(&mut band, &mut cursor)?;
//! assert_eq!(frames.len(), 1);
//! assert_eq!(frames[0].placements[0].element, table);
//! # Ok::<(), LayoutError>(())
//! ```

mod colour;
pub use colour::*;

mod config;
pub use config::*;

mod elements;
pub use elements::*;

mod flow;
pub use flow::*;

mod font;
pub use font::*;

mod gate;
pub use gate::*;

mod grid;
pub use grid::*;

mod measure;
pub use measure::*;

mod paginator;
pub use paginator::*;

mod rect;
pub use rect::*;

mod region;
pub use region::*;

/// Painting placed regions and shapes with [pdf_writer]
pub mod render;

mod sizer;
pub use sizer::*;

mod span;
pub use span::*;

mod table;
pub use table::*;

mod units;
pub use units::*;

mod error;
pub use error::*;

/// Re-export PDF-writer functionality, mostly for custom [pdf_writer::Content] generation
pub use pdf_writer;

//! Painting placed regions and shapes into PDF content streams.
//!
//! Only geometry is painted here: cell backgrounds and borders, clipped to
//! what each region shows. Setting the cell text is left to whoever shapes
//! glyphs.

use crate::elements::{ShapeElement, ShapeKind};
use crate::flow::Fragment;
use crate::grid::GridSource;
use crate::rect::Rect;
use crate::region::RegionGeometry;
use crate::table::TableElement;
use crate::units::Pt;
use crate::LayoutError;
use pdf_writer::Content;
use std::io::Write;

/// Control point distance for approximating a quarter ellipse with a cubic
/// Bézier curve
const KAPPA: f32 = 0.552_284_7;

/// Paint the cells of one region placed at `placed` (layout space) on a page
/// `page_height` tall
pub fn paint_region(
    content: &mut Content,
    geometry: &RegionGeometry,
    grid: &dyn GridSource,
    placed: &Rect,
    page_height: Pt,
) -> Result<(), LayoutError> {
    for cell in geometry.paint_cells() {
        let source = grid.cell(geometry.source_row(cell.row), cell.col)?;
        let bounds = cell.bounds.translate(placed.x1, placed.y1).to_pdf(page_height);
        let clip = cell.clip.translate(placed.x1, placed.y1).to_pdf(page_height);

        content.save_state();
        content.rect(clip.x1, clip.y1, clip.x2 - clip.x1, clip.y2 - clip.y1);
        content.clip_nonzero();
        content.end_path();

        if let Some(background) = source.background {
            background.apply_fill(content);
            content.rect(bounds.x1, bounds.y1, bounds.x2 - bounds.x1, bounds.y2 - bounds.y1);
            content.fill_nonzero();
        }

        let borders = source.borders;
        let edges = [
            (borders.top, (bounds.x1, bounds.y2), (bounds.x2, bounds.y2)),
            (borders.right, (bounds.x2, bounds.y2), (bounds.x2, bounds.y1)),
            (borders.bottom, (bounds.x1, bounds.y1), (bounds.x2, bounds.y1)),
            (borders.left, (bounds.x1, bounds.y1), (bounds.x1, bounds.y2)),
        ];
        for (edge, from, to) in edges {
            if edge.width <= Pt::ZERO {
                continue;
            }
            edge.colour.apply_stroke(content);
            content.set_line_width(edge.width.into());
            content.move_to(from.0, from.1);
            content.line_to(to.0, to.1);
            content.stroke();
        }

        content.restore_state();
    }
    Ok(())
}

/// Paint every region fragment `table` placed in a frame
pub fn paint_table(
    content: &mut Content,
    table: &TableElement,
    fragments: &[Fragment],
    page_height: Pt,
) -> Result<(), LayoutError> {
    let Some(grid) = table.grid() else {
        return Ok(());
    };
    for fragment in fragments {
        if let Fragment::Region { region, rect } = fragment {
            let geometry = RegionGeometry::new(table.state(), *region);
            paint_region(content, &geometry, grid, rect, page_height)?;
        }
    }
    Ok(())
}

/// Paint `shape` into `rect` (layout space)
pub fn paint_shape(content: &mut Content, shape: &ShapeElement, rect: &Rect, page_height: Pt) {
    let r = rect.to_pdf(page_height);
    let (w, h) = (r.x2 - r.x1, r.y2 - r.y1);

    content.save_state();
    if let Some(fill) = shape.fill {
        fill.apply_fill(content);
    }
    if let Some(stroke) = shape.stroke {
        stroke.apply_stroke(content);
    }

    match shape.kind {
        ShapeKind::Rectangle => {
            content.rect(r.x1, r.y1, w, h);
        }
        ShapeKind::Ellipse => {
            let (rx, ry) = (w / 2.0, h / 2.0);
            let (cx, cy) = (r.x1 + rx, r.y1 + ry);
            let (kx, ky) = (rx * KAPPA, ry * KAPPA);
            content.move_to(cx + rx, cy);
            content.cubic_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry);
            content.cubic_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy);
            content.cubic_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry);
            content.cubic_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy);
            content.close_path();
        }
        ShapeKind::Line => {
            // top-left to bottom-right of the layout rectangle
            content.move_to(r.x1, r.y2);
            content.line_to(r.x2, r.y1);
        }
    }

    let fill = shape.fill.is_some() && shape.kind != ShapeKind::Line;
    match (fill, shape.stroke.is_some()) {
        (true, true) => content.fill_nonzero_and_stroke(),
        (true, false) => content.fill_nonzero(),
        (false, true) => content.stroke(),
        (false, false) => content.end_path(),
    };
    content.restore_state();
}

/// Write the operators of `content` to `w`, wrapped in their own graphics
/// state
#[allow(clippy::write_with_newline)]
pub fn write_content<W: Write>(w: &mut W, content: Content) -> Result<(), LayoutError> {
    write!(w, "q\n")?;
    w.write_all(content.finish().as_slice())?;
    write!(w, "\nQ\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::colours;
    use crate::config::{LayoutConfig, LayoutPolicy};
    use crate::grid::{BorderSpec, Borders, Dimension, Grid};
    use crate::measure::{CellFont, FixedAdvance, FontBook};
    use crate::region::Region;
    use crate::sizer::{GridLayoutState, GridSizer};

    fn operators(content: Content) -> Vec<String> {
        String::from_utf8_lossy(&content.finish())
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn cells_are_clipped_filled_and_bordered() {
        let mut fonts = FontBook::new();
        let font = CellFont {
            id: fonts.add(FixedAdvance::default()),
            size: Pt(10.0),
        };
        let mut grid = Grid::new(1, 1, font);
        grid.set_col_width(0, Dimension::Fixed(Pt(100.0)));
        grid.set_row_height(0, Dimension::Fixed(Pt(20.0)));
        if let Some(cell) = grid.cell_mut(0, 0) {
            cell.background = Some(colours::RED);
            cell.borders = Borders::all(BorderSpec::solid(Pt(1.0)));
        }

        let mut config = LayoutConfig::new();
        config.policy(LayoutPolicy::FitContent).cell_padding(Pt::ZERO);
        let mut state = GridLayoutState::new();
        GridSizer::new(&grid, &fonts, &config)
            .validate(&mut state, Pt(500.0))
            .expect("grid is valid");

        let geometry = RegionGeometry::new(&state, Region { x: 0, y: 0, width: 1, height: 1 });
        let placed = Rect::new(Pt(10.0), Pt(20.0), geometry.width(), geometry.height());
        let mut content = Content::new();
        paint_region(&mut content, &geometry, &grid, &placed, Pt(200.0)).expect("cell is painted");

        let ops = operators(content);
        assert_eq!(ops.first().map(String::as_str), Some("q"));
        assert!(ops.iter().any(|op| op == "W"));
        assert!(ops.iter().any(|op| op == "1 0 0 rg"));
        assert_eq!(ops.iter().filter(|op| *op == "S").count(), 4);
        assert_eq!(ops.last().map(String::as_str), Some("Q"));
    }

    #[test]
    fn shapes_without_paint_only_end_the_path() {
        let mut shape = ShapeElement::new(ShapeKind::Rectangle);
        shape.stroke = None;
        let mut content = Content::new();
        paint_shape(
            &mut content,
            &shape,
            &Rect::new(Pt::ZERO, Pt::ZERO, Pt(10.0), Pt(10.0)),
            Pt(100.0),
        );
        let ops = operators(content);
        assert!(ops.iter().any(|op| op == "n"));
        assert!(!ops.iter().any(|op| op == "S"));
    }

    #[test]
    fn ellipses_are_closed_curves() {
        let shape = ShapeElement::new(ShapeKind::Ellipse).with_fill(colours::WHITE);
        let mut content = Content::new();
        paint_shape(
            &mut content,
            &shape,
            &Rect::new(Pt::ZERO, Pt::ZERO, Pt(20.0), Pt(10.0)),
            Pt(100.0),
        );
        let ops = operators(content);
        assert_eq!(ops.iter().filter(|op| op.ends_with(" c")).count(), 4);
        assert!(ops.iter().any(|op| op == "h"));
        assert!(ops.iter().any(|op| op == "B"));
    }

    #[test]
    fn content_is_written_in_its_own_graphics_state() {
        let mut content = Content::new();
        content.rect(0.0, 0.0, 1.0, 1.0);
        let mut out: Vec<u8> = Vec::new();
        write_content(&mut out, content).expect("vec writes succeed");
        let text = String::from_utf8(out).expect("operators are ascii");
        assert!(text.starts_with("q\n"));
        assert!(text.ends_with("\nQ\n"));
    }

    #[test]
    fn writer_failures_are_reported() {
        struct Full;

        impl Write for Full {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk full"))
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let result = write_content(&mut Full, Content::new());
        assert!(matches!(result, Err(LayoutError::Io(_))));
    }
}

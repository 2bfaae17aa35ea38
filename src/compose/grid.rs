//! Slip grid geometry for one page size and aspect ratio policy.

use crate::config::{AspectRatio, PageSize};
use crate::geometry::Rect;
use serde::Serialize;

/// Where one slip lands on its page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutCell {
    /// Zero-based page number
    pub page: usize,
    /// Slot within the page, row-major from the top-left
    pub slot: usize,
    /// Left edge
    pub x: f32,
    /// Bottom edge
    pub y: f32,
    /// Slip width
    pub width: f32,
    /// Slip height
    pub height: f32,
}

impl LayoutCell {
    /// The cell as a rectangle.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// A uniform grid of slips.
///
/// Slips keep the canvas aspect ratio exactly. The scale is the largest one
/// at which all columns fit across and all rows fit down the page inside the
/// outer margin with at least `min_gap` between neighbors. Leftover space is
/// then spread evenly: the same gap before, between and after the columns,
/// and likewise for rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridLayout {
    page_width: f32,
    page_height: f32,
    columns: usize,
    rows: usize,
    scale: f32,
    slip_width: f32,
    slip_height: f32,
    gap_x: f32,
    gap_y: f32,
}

impl GridLayout {
    /// Lay out slips of `canvas` size (template units) on `page`.
    pub fn new(
        page: PageSize,
        aspect: AspectRatio,
        canvas: (f32, f32),
        margin: f32,
        min_gap: f32,
    ) -> Self {
        let (page_width, page_height) = page.dimensions();
        let (columns, rows) = aspect.grid();
        let (canvas_width, canvas_height) = (canvas.0.max(1.0), canvas.1.max(1.0));

        let avail_x = page_width - 2.0 * margin - (columns - 1) as f32 * min_gap;
        let avail_y = page_height - 2.0 * margin - (rows - 1) as f32 * min_gap;
        let fit_x = avail_x / (columns as f32 * canvas_width);
        let fit_y = avail_y / (rows as f32 * canvas_height);
        let scale = fit_x.min(fit_y).max(0.0);

        let slip_width = canvas_width * scale;
        let slip_height = canvas_height * scale;
        let gap_x = (page_width - columns as f32 * slip_width) / (columns + 1) as f32;
        let gap_y = (page_height - rows as f32 * slip_height) / (rows + 1) as f32;

        Self {
            page_width,
            page_height,
            columns,
            rows,
            scale,
            slip_width,
            slip_height,
            gap_x,
            gap_y,
        }
    }

    /// Uniform template-to-page scale.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Page width and height.
    pub fn page_size(&self) -> (f32, f32) {
        (self.page_width, self.page_height)
    }

    /// Columns and rows.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    /// Slots per page.
    pub fn slots_per_page(&self) -> usize {
        self.columns * self.rows
    }

    /// Horizontal and vertical gap.
    pub fn gaps(&self) -> (f32, f32) {
        (self.gap_x, self.gap_y)
    }

    /// Page that record `index` lands on.
    pub fn page_of(&self, index: usize) -> usize {
        index / self.slots_per_page()
    }

    /// Pages needed for `records` slips.
    pub fn page_count(&self, records: usize) -> usize {
        records.div_ceil(self.slots_per_page())
    }

    /// Cell of record `index`. Row 0 is at the top of the page.
    pub fn cell(&self, index: usize) -> LayoutCell {
        let slot = index % self.slots_per_page();
        let (col, row) = (slot % self.columns, slot / self.columns);
        let x = self.gap_x + col as f32 * (self.slip_width + self.gap_x);
        let y = self.page_height - (row + 1) as f32 * (self.slip_height + self.gap_y);
        LayoutCell {
            page: self.page_of(index),
            slot,
            x,
            y,
            width: self.slip_width,
            height: self.slip_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_scale_preserves_aspect() {
        let grid = GridLayout::new(PageSize::A4, AspectRatio::Portrait, (260.0, 210.0), 20.0, 8.0);
        let cell = grid.cell(0);
        assert!(approx(cell.width / cell.height, 260.0 / 210.0));
        assert!(approx(cell.width, 260.0 * grid.scale()));
    }

    #[test]
    fn test_binding_axis() {
        // Portrait on A4: 2 columns of 260 wide bind before 3 rows of 210
        let grid = GridLayout::new(PageSize::A4, AspectRatio::Portrait, (260.0, 210.0), 20.0, 8.0);
        let expected = (595.28 - 40.0 - 8.0) / 520.0;
        assert!(approx(grid.scale(), expected));
    }

    #[test]
    fn test_even_gaps_and_all_cells_on_page() {
        for aspect in [AspectRatio::Square, AspectRatio::Portrait] {
            for page in [PageSize::A4, PageSize::Legal] {
                let grid = GridLayout::new(page, aspect, (260.0, 210.0), 20.0, 8.0);
                let (w, h) = grid.page_size();
                let page_rect = Rect::new(0.0, 0.0, w, h);
                let (gx, gy) = grid.gaps();
                assert!(gx >= 8.0 / 2.0 && gy >= 8.0 / 2.0);

                let last = grid.cell(grid.slots_per_page() - 1);
                assert!(approx(w - last.rect().right(), gx));
                assert!(approx(last.y, gy));
                for i in 0..grid.slots_per_page() {
                    assert!(page_rect.contains_rect(&grid.cell(i).rect()));
                }
            }
        }
    }

    #[test]
    fn test_cells_do_not_overlap() {
        let grid = GridLayout::new(PageSize::A4, AspectRatio::Square, (300.0, 300.0), 20.0, 8.0);
        let cells: Vec<Rect> = (0..12).map(|i| grid.cell(i).rect().inset(0.01)).collect();
        for (i, a) in cells.iter().enumerate() {
            for b in &cells[i + 1..] {
                assert!(!a.intersects(b));
            }
        }
    }

    #[test]
    fn test_pagination() {
        let grid = GridLayout::new(PageSize::A4, AspectRatio::Portrait, (225.0, 300.0), 20.0, 8.0);
        assert_eq!(grid.slots_per_page(), 6);
        assert_eq!(grid.page_count(13), 3);
        assert_eq!(grid.page_of(5), 0);
        assert_eq!(grid.page_of(6), 1);
        assert_eq!(grid.page_of(12), 2);
        assert_eq!(grid.cell(12).slot, 0);
        assert_eq!(grid.cell(7), LayoutCell { page: 1, slot: 1, ..grid.cell(1) });
    }

    #[test]
    fn test_row_zero_is_top() {
        let grid = GridLayout::new(PageSize::Legal, AspectRatio::Square, (300.0, 300.0), 20.0, 8.0);
        assert!(grid.cell(0).y > grid.cell(3).y);
        assert_eq!(grid.cell(0).x, grid.cell(3).x);
        assert!(grid.cell(1).x > grid.cell(0).x);
    }
}

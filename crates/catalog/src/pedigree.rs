//! The three-column pedigree grid.
//!
//! One column per generation. Generation `g` of `G` gives each entry a span
//! of `2^(G-g)` rows, and the entry is centered vertically on its span, so
//! every parent pair sits directly beside its child.

use studbook_core::Ancestor;
use studbook_core::lineage::{SlotPosition, generation_of};
use studbook_layout::{Canvas, Cursor, Font, TextOp, fit_text};

pub const ROW_HEIGHT: f32 = 10.0;
const CELL_PADDING: f32 = 4.0;

/// Rows needed for a lineage of `len` slots.
pub fn grid_rows(len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    1 << generation_of(len - 1)
}

/// Height of the grid for a lineage of `len` slots.
pub fn grid_height(len: usize) -> f32 {
    grid_rows(len) as f32 * ROW_HEIGHT
}

/// Draw every slot and return the `y` just below the grid.
pub fn draw_pedigree(ancestors: &[Ancestor], origin: Cursor, width: f32, canvas: &mut dyn Canvas) -> f32 {
    if ancestors.is_empty() {
        return origin.y;
    }
    let generations = generation_of(ancestors.len() - 1);
    let column_width = width / generations as f32;

    for (index, ancestor) in ancestors.iter().enumerate() {
        let SlotPosition { generation, position } = SlotPosition::of(index);
        let (font, size) = if generation == 1 { (Font::Bold, 8.0) } else { (Font::Regular, 7.0) };

        let span = 1usize << (generations - generation);
        let center = (position * span) as f32 * ROW_HEIGHT + span as f32 * ROW_HEIGHT / 2.0;
        let text = fit_text(&ancestor.label(), font, size, column_width - CELL_PADDING);
        if text.is_empty() {
            continue;
        }
        canvas.draw_text(TextOp {
            text,
            font,
            size,
            x: origin.x + (generation - 1) as f32 * column_width,
            y: origin.y + center - font.height_at(size) / 2.0,
        });
    }
    origin.y + grid_height(ancestors.len())
}

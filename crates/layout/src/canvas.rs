//! Drawing surface, cursor and page geometry.
//!
//! Coordinates are points measured from the top-left corner of the page; a
//! text operation's `y` is the top of its line box. The PDF writer converts
//! to baselines on replay.

use crate::font::Font;

/// One positioned text draw.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOp {
    pub text: String,
    pub font: Font,
    pub size: f32,
    pub x: f32,
    pub y: f32,
}

/// Anything text can be drawn onto.
pub trait Canvas {
    fn draw_text(&mut self, op: TextOp);
}

/// A canvas that records its operations for later replay.
///
/// Pages are assembled into recordings so several subjects can be laid out
/// concurrently and then written into one document in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedPage {
    pub ops: Vec<TextOp>,
}

impl RecordedPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Every drawn string, in draw order, separated by newlines.
    pub fn text(&self) -> String {
        self.ops
            .iter()
            .map(|op| op.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.ops.iter().any(|op| op.text.contains(needle))
    }

    /// Lowest point reached by any line box.
    pub fn bottom(&self) -> f32 {
        self.ops
            .iter()
            .map(|op| op.y + op.font.height_at(op.size))
            .fold(0.0, f32::max)
    }
}

impl Canvas for RecordedPage {
    fn draw_text(&mut self, op: TextOp) {
        self.ops.push(op);
    }
}

/// Current drawing position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cursor {
    pub x: f32,
    pub y: f32,
}

impl Cursor {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn advance(&mut self, dy: f32) {
        self.y += dy;
    }
}

/// Physical page size and margins, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl PageGeometry {
    /// 5.5 x 8.5 inch sale-catalog page.
    pub const HALF_LETTER: PageGeometry = PageGeometry {
        width: 396.0,
        height: 612.0,
        margin_top: 24.0,
        margin_bottom: 24.0,
        margin_left: 22.0,
        margin_right: 22.0,
    };

    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    /// The lowest `y` content may reach.
    pub fn content_bottom(&self) -> f32 {
        self.height - self.margin_bottom
    }

    pub fn top_left(&self) -> Cursor {
        Cursor::new(self.margin_left, self.margin_top)
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::HALF_LETTER
    }
}

const ELLIPSIS: &str = "...";

/// Truncate `text` with `...` so it fits `width` at the given font/size.
/// Returns an empty string when not even the ellipsis fits.
pub fn fit_text(text: &str, font: Font, size: f32, width: f32) -> String {
    if font.width_of(text, size) <= width {
        return text.to_string();
    }
    let budget = width - font.width_of(ELLIPSIS, size);
    if budget < 0.0 {
        return String::new();
    }
    let mut used = 0.0;
    let mut end = 0;
    for (idx, c) in text.char_indices() {
        let w = font.width_of(c.encode_utf8(&mut [0; 4]), size);
        if used + w > budget {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }
    format!("{}{ELLIPSIS}", text[..end].trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(fit_text("Sky Bolt", Font::Regular, 8.0, 200.0), "Sky Bolt");
    }

    #[test]
    fn long_text_is_truncated_to_width() {
        let text = "Northern Lass Of The Windswept Highlands";
        let fitted = fit_text(text, Font::Regular, 8.0, 60.0);
        assert!(fitted.ends_with("..."));
        assert!(Font::Regular.width_of(&fitted, 8.0) <= 60.0);
        assert!(text.starts_with(fitted.trim_end_matches("...")));
    }

    #[test]
    fn no_room_for_ellipsis() {
        assert_eq!(fit_text("Sky Bolt", Font::Regular, 8.0, 2.0), "");
    }

    #[test]
    fn recorded_page_tracks_bottom() {
        let mut page = RecordedPage::new();
        page.draw_text(TextOp {
            text: "1st Dam".into(),
            font: Font::Bold,
            size: 10.0,
            x: 22.0,
            y: 100.0,
        });
        assert!(page.contains("Dam"));
        assert!((page.bottom() - 109.0).abs() < 1e-4);
    }

    #[test]
    fn half_letter_content_area() {
        let g = PageGeometry::HALF_LETTER;
        assert_eq!(g.content_width(), 352.0);
        assert_eq!(g.content_bottom(), 588.0);
    }
}

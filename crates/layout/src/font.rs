//! Built-in Times font metrics.
//!
//! Advance widths are the Adobe AFM values for printable ASCII, in
//! thousandths of the font size. Anything outside that range measures as a
//! digit, except the no-break space which measures as a space.

use std::fmt;

/// Ascender and descender shared by the three Times faces.
const ASCENDER: f32 = 683.0;
const DESCENDER: f32 = -217.0;
const FALLBACK_WIDTH: u16 = 500;

#[rustfmt::skip]
const TIMES_ROMAN: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    // 0-9
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    // : ; < = > ? @
    278, 278, 564, 564, 564, 444, 921,
    // A-Z
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
    // [ \ ] ^ _ `
    333, 278, 333, 469, 500, 333,
    // a-z
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
    // { | } ~
    480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 570, 570, 570, 500, 930,
    722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944,
    722, 778, 611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667,
    333, 278, 333, 581, 500, 333,
    500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833,
    556, 500, 556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444,
    394, 220, 394, 520,
];

#[rustfmt::skip]
const TIMES_ITALIC: [u16; 95] = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 675, 675, 675, 500, 920,
    611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833,
    667, 722, 611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556,
    389, 278, 389, 422, 500, 333,
    500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722,
    500, 500, 500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389,
    400, 275, 400, 541,
];

/// The faces a catalog page is set in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Font {
    #[default]
    Regular,
    Bold,
    Italic,
}

impl Font {
    pub const ALL: [Font; 3] = [Font::Regular, Font::Bold, Font::Italic];

    /// PostScript name of the built-in face.
    pub fn postscript_name(self) -> &'static str {
        match self {
            Self::Regular => "Times-Roman",
            Self::Bold => "Times-Bold",
            Self::Italic => "Times-Italic",
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            Self::Regular => &TIMES_ROMAN,
            Self::Bold => &TIMES_BOLD,
            Self::Italic => &TIMES_ITALIC,
        }
    }

    /// Advance width of one character in font units.
    pub fn char_width(self, c: char) -> u16 {
        match c {
            ' '..='~' => self.widths()[c as usize - 0x20],
            '\u{a0}' => self.widths()[0],
            _ => FALLBACK_WIDTH,
        }
    }

    /// Width of `text` set at `size` points.
    pub fn width_of(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.char_width(c))).sum();
        units as f32 * size / 1000.0
    }

    /// Line-box height at `size` points (ascender to descender).
    pub fn height_at(self, size: f32) -> f32 {
        (ASCENDER - DESCENDER) * size / 1000.0
    }

    /// Distance from the top of the line box to the baseline.
    pub fn ascent_at(self, size: f32) -> f32 {
        ASCENDER * size / 1000.0
    }
}

impl fmt::Display for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.postscript_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_widths() {
        assert_eq!(Font::Regular.char_width(' '), 250);
        assert_eq!(Font::Regular.char_width('W'), 944);
        assert_eq!(Font::Bold.char_width('W'), 1000);
        assert_eq!(Font::Italic.char_width('z'), 389);
        assert_eq!(Font::Regular.char_width('~'), 541);
    }

    #[test]
    fn width_scales_with_size() {
        let at_ten = Font::Regular.width_of("Sky Bolt", 10.0);
        let at_twenty = Font::Regular.width_of("Sky Bolt", 20.0);
        assert!((at_twenty - 2.0 * at_ten).abs() < 1e-4);
    }

    #[test]
    fn bold_is_wider() {
        let text = "Northern Lass";
        assert!(Font::Bold.width_of(text, 9.0) > Font::Regular.width_of(text, 9.0));
    }

    #[test]
    fn non_ascii_uses_fallback() {
        assert_eq!(Font::Regular.char_width('é'), FALLBACK_WIDTH);
        assert_eq!(Font::Regular.char_width('\u{a0}'), 250);
    }

    #[test]
    fn height_is_ninety_percent_of_size() {
        assert!((Font::Regular.height_at(10.0) - 9.0).abs() < 1e-4);
        assert!(Font::Bold.ascent_at(10.0) < Font::Bold.height_at(10.0));
    }
}

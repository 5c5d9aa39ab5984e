//! # Studbook Layout
//!
//! Text layout for fixed-size catalog pages: Times font metrics, the
//! greedy-wrapping [`Paragraph`] builder, a recording [`Canvas`], and the
//! printpdf-backed [`PdfBook`] the recordings are replayed into.

pub mod canvas;
pub mod font;
pub mod paragraph;
pub mod pdf;

pub use canvas::{Canvas, Cursor, PageGeometry, RecordedPage, TextOp, fit_text};
pub use font::Font;
pub use paragraph::{Component, DrawOptions, LINE_GAP, Line, Paragraph, Run};
pub use pdf::{PdfBook, RenderError};

//! Paragraph layout builder.
//!
//! A paragraph is an ordered list of styled components wrapped greedily
//! into lines of at most `max_width` points. Layout is computed on first
//! use and cached; every mutator calls [`Paragraph::invalidate`].

use crate::canvas::{Canvas, Cursor, TextOp};
use crate::font::Font;
use std::sync::OnceLock;

/// Vertical gap between consecutive lines, in points.
pub const LINE_GAP: f32 = 1.0;

pub const DEFAULT_SIZE: f32 = 8.0;

/// Per-component drawing options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DrawOptions {
    pub uppercase: bool,
}

impl DrawOptions {
    pub const UPPERCASE: DrawOptions = DrawOptions { uppercase: true };
}

/// A styled text run as supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub text: String,
    pub font: Font,
    pub size: f32,
    pub options: DrawOptions,
}

impl Component {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: Font::Regular,
            size: DEFAULT_SIZE,
            options: DrawOptions::default(),
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self::new(text).font(Font::Bold)
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self::new(text).font(Font::Italic)
    }

    pub fn font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn uppercase(mut self) -> Self {
        self.options.uppercase = true;
        self
    }

    /// Text as it will be drawn.
    fn display_text(&self) -> String {
        if self.options.uppercase {
            self.text.to_uppercase()
        } else {
            self.text.clone()
        }
    }
}

impl From<&str> for Component {
    fn from(text: &str) -> Self {
        Component::new(text)
    }
}

impl From<String> for Component {
    fn from(text: String) -> Self {
        Component::new(text)
    }
}

/// A measured piece of one line.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub font: Font,
    pub size: f32,
    pub width: f32,
}

/// One laid-out line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    /// Horizontal offset of the first run from the paragraph origin.
    pub x: f32,
    pub runs: Vec<Run>,
}

impl Line {
    fn starting_at(x: f32) -> Self {
        Self { x, runs: Vec::new() }
    }

    /// Tallest run on the line; zero when empty.
    pub fn height(&self) -> f32 {
        self.runs
            .iter()
            .map(|r| r.font.height_at(r.size))
            .fold(0.0, f32::max)
    }

    pub fn width(&self) -> f32 {
        self.runs.iter().map(|r| r.width).sum()
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Wrapped, styled text block.
#[derive(Debug, Clone)]
pub struct Paragraph {
    components: Vec<Component>,
    max_width: f32,
    indent: f32,
    first_line_indent: f32,
    padding_top: f32,
    layout: OnceLock<Vec<Line>>,
}

impl Paragraph {
    pub fn new(max_width: f32) -> Self {
        Self {
            components: Vec::new(),
            max_width,
            indent: 0.0,
            first_line_indent: 0.0,
            padding_top: 0.0,
            layout: OnceLock::new(),
        }
    }

    /// Offset of every line after the first.
    pub fn with_indent(mut self, indent: f32) -> Self {
        self.set_indent(indent);
        self
    }

    pub fn with_first_line_indent(mut self, indent: f32) -> Self {
        self.set_first_line_indent(indent);
        self
    }

    pub fn with_padding_top(mut self, padding: f32) -> Self {
        self.set_padding_top(padding);
        self
    }

    pub fn set_max_width(&mut self, max_width: f32) {
        self.max_width = max_width;
        self.invalidate();
    }

    pub fn set_indent(&mut self, indent: f32) {
        self.indent = indent;
        self.invalidate();
    }

    pub fn set_first_line_indent(&mut self, indent: f32) {
        self.first_line_indent = indent;
        self.invalidate();
    }

    pub fn set_padding_top(&mut self, padding: f32) {
        self.padding_top = padding;
        self.invalidate();
    }

    pub fn max_width(&self) -> f32 {
        self.max_width
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Drop the cached layout.
    pub fn invalidate(&mut self) {
        self.layout.take();
    }

    /// Append a component.
    pub fn add(&mut self, component: impl Into<Component>) -> &mut Self {
        self.components.push(component.into());
        self.invalidate();
        self
    }

    /// Remove the first component with this text that also matches every
    /// provided style field. Returns whether one was removed.
    pub fn remove(
        &mut self,
        text: &str,
        font: Option<Font>,
        size: Option<f32>,
        options: Option<DrawOptions>,
    ) -> bool {
        let found = self.components.iter().position(|c| {
            c.text == text
                && font.is_none_or(|f| c.font == f)
                && size.is_none_or(|s| c.size == s)
                && options.is_none_or(|o| c.options == o)
        });
        match found {
            Some(index) => {
                self.components.remove(index);
                self.invalidate();
                true
            }
            None => false,
        }
    }

    /// Builder-style [`add`](Self::add).
    pub fn push(mut self, component: impl Into<Component>) -> Self {
        self.add(component);
        self
    }

    /// Laid-out lines, building them if needed.
    pub fn lines(&self) -> &[Line] {
        self.layout.get_or_init(|| self.build())
    }

    /// Line heights plus the inter-line gaps plus top padding.
    pub fn height(&self) -> f32 {
        let lines = self.lines();
        let text: f32 = lines.iter().map(Line::height).sum();
        let gaps = LINE_GAP * lines.len().saturating_sub(1) as f32;
        text + gaps + self.padding_top
    }

    /// Plain text of the whole paragraph.
    pub fn text(&self) -> String {
        self.lines().iter().map(Line::text).collect::<Vec<_>>().join(" ")
    }

    /// Greedy word wrap.
    ///
    /// Every word but the first of a component carries one leading space;
    /// the first does too when the component text starts with whitespace.
    /// A line break drops that space. With `max_width <= 0` everything
    /// lands on a single line.
    pub fn build(&self) -> Vec<Line> {
        if self.max_width <= 0.0 {
            let runs = self
                .components
                .iter()
                .map(|c| {
                    let text = c.display_text();
                    Run {
                        width: c.font.width_of(&text, c.size),
                        text,
                        font: c.font,
                        size: c.size,
                    }
                })
                .collect();
            return vec![Line {
                x: self.first_line_indent,
                runs,
            }];
        }

        let mut lines = Vec::new();
        let mut line = Line::starting_at(self.first_line_indent);
        let mut used = self.first_line_indent;

        for component in &self.components {
            let text = component.display_text();
            let leading_space = text.starts_with(char::is_whitespace);
            let measure = |s: &str| component.font.width_of(s, component.size);
            let mut segment = String::new();

            for (i, word) in text.split_whitespace().enumerate() {
                let spaced = i > 0 || leading_space;
                let piece = if spaced { format!(" {word}") } else { word.to_string() };
                let width = measure(&piece);
                let line_has_content = !segment.is_empty() || !line.runs.is_empty();

                if used + width > self.max_width && line_has_content {
                    flush(&mut line, &mut segment, component, &measure);
                    lines.push(std::mem::replace(&mut line, Line::starting_at(self.indent)));
                    segment.push_str(word);
                    used = self.indent + measure(word);
                } else {
                    segment.push_str(&piece);
                    used += width;
                }
            }
            flush(&mut line, &mut segment, component, &measure);
        }

        if !line.runs.is_empty() || lines.is_empty() {
            lines.push(line);
        }
        lines
    }

    /// Draw the paragraph with its first line box at the cursor.
    ///
    /// Runs advance the cursor horizontally; its horizontal origin is
    /// restored afterwards and its vertical position is left unchanged.
    pub fn write(&self, cursor: &mut Cursor, canvas: &mut dyn Canvas) {
        let origin_x = cursor.x;
        let mut y = cursor.y + self.padding_top;
        let mut previous_height = None;

        for line in self.lines() {
            if let Some(h) = previous_height {
                y += h + LINE_GAP;
            }
            cursor.x = origin_x + line.x;
            for run in &line.runs {
                canvas.draw_text(TextOp {
                    text: run.text.clone(),
                    font: run.font,
                    size: run.size,
                    x: cursor.x,
                    y,
                });
                cursor.x += run.width;
            }
            previous_height = Some(line.height());
        }
        cursor.x = origin_x;
    }
}

fn flush(line: &mut Line, segment: &mut String, component: &Component, measure: &dyn Fn(&str) -> f32) {
    if segment.is_empty() {
        return;
    }
    let text = std::mem::take(segment);
    line.runs.push(Run {
        width: measure(&text),
        text,
        font: component.font,
        size: component.size,
    });
}

//! Geometry, color and painting types.
//!
//! The grid never talks to a concrete toolkit. Header and cell drawing go
//! through the [`Painter`] trait, which a toolkit adapter implements on top of
//! its own drawing surface.

use serde::{Deserialize, Serialize};

use crate::column::{HorizontalAlignment, VerticalAlignment};

/// A point in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// The origin point (0, 0).
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// A size in 2D space (width and height).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Check if the size has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A rectangle defined by origin and size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    /// Create a new rectangle from origin and size.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point { x, y },
            size: Size { width, height },
        }
    }

    /// Left edge x coordinate.
    #[inline]
    pub fn left(&self) -> f32 {
        self.origin.x
    }

    /// Top edge y coordinate.
    #[inline]
    pub fn top(&self) -> f32 {
        self.origin.y
    }

    /// Right edge x coordinate.
    #[inline]
    pub fn right(&self) -> f32 {
        self.origin.x + self.size.width
    }

    /// Bottom edge y coordinate.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.height
    }

    /// Width of the rectangle.
    #[inline]
    pub fn width(&self) -> f32 {
        self.size.width
    }

    /// Height of the rectangle.
    #[inline]
    pub fn height(&self) -> f32 {
        self.size.height
    }

    /// Check if the rectangle is empty (zero or negative size).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }

    /// Compute the intersection of two rectangles.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if left < right && top < bottom {
            Some(Rect::new(left, top, right - left, bottom - top))
        } else {
            None
        }
    }

    /// Shrink the rectangle horizontally and vertically by separate insets.
    #[inline]
    pub fn inset(&self, horizontal: f32, vertical: f32) -> Rect {
        Rect::new(
            self.origin.x + horizontal,
            self.origin.y + vertical,
            (self.size.width - horizontal * 2.0).max(0.0),
            (self.size.height - vertical * 2.0).max(0.0),
        )
    }
}

/// An opaque-by-default RGBA color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Color {
    /// Create a color from RGBA components.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color from RGB components.
    #[inline]
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a color from a hex string (e.g., "#FF0000" or "#FF0000FF").
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let len = hex.len();

        if (len != 6 && len != 8) || !hex.is_ascii() {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        let a = if len == 8 {
            u8::from_str_radix(&hex[6..8], 16).ok()?
        } else {
            255
        };

        Some(Self::new(r, g, b, a))
    }

    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::from_rgb(0, 0, 0);
    pub const WHITE: Self = Self::from_rgb(255, 255, 255);
    pub const GRAY: Self = Self::from_rgb(128, 128, 128);
    pub const LIGHT_GRAY: Self = Self::from_rgb(192, 192, 192);
    /// Default header background.
    pub const HEADER_BACKGROUND: Self = Self::from_rgb(224, 224, 224);
    /// Default background of odd rows when alternating colors.
    pub const ROW_ODD: Self = Self::from_rgb(212, 255, 212);
    /// Default background of even rows when alternating colors.
    pub const ROW_EVEN: Self = Self::from_rgb(255, 255, 255);
}

/// Drawing operations the grid needs from a toolkit surface.
pub trait Painter {
    /// Fill a rectangle with a solid color.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Fill a closed polygon with a solid color.
    fn fill_polygon(&mut self, points: &[Point], color: Color);

    /// Draw a single line of text aligned inside `rect`.
    fn draw_text(
        &mut self,
        text: &str,
        rect: Rect,
        horizontal: HorizontalAlignment,
        vertical: VerticalAlignment,
        color: Color,
        bold: bool,
    );

    /// Restrict drawing to `rect`, or remove the clip with `None`.
    fn set_clip(&mut self, rect: Option<Rect>);
}

/// A recorded [`Painter`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    FillRect(Rect, Color),
    FillPolygon(Vec<Point>, Color),
    Text {
        text: String,
        rect: Rect,
        horizontal: HorizontalAlignment,
        vertical: VerticalAlignment,
        color: Color,
        bold: bool,
    },
    Clip(Option<Rect>),
}

/// A [`Painter`] that records every call, for headless hosts and tests.
#[derive(Debug, Default)]
pub struct RecordingPainter {
    pub commands: Vec<PaintCommand>,
}

impl RecordingPainter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All polygons drawn, in order.
    pub fn polygons(&self) -> Vec<&[Point]> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                PaintCommand::FillPolygon(points, _) => Some(points.as_slice()),
                _ => None,
            })
            .collect()
    }

    /// All text drawn, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                PaintCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Painter for RecordingPainter {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(PaintCommand::FillRect(rect, color));
    }

    fn fill_polygon(&mut self, points: &[Point], color: Color) {
        self.commands
            .push(PaintCommand::FillPolygon(points.to_vec(), color));
    }

    fn draw_text(
        &mut self,
        text: &str,
        rect: Rect,
        horizontal: HorizontalAlignment,
        vertical: VerticalAlignment,
        color: Color,
        bold: bool,
    ) {
        self.commands.push(PaintCommand::Text {
            text: text.to_string(),
            rect,
            horizontal,
            vertical,
            color,
            bold,
        });
    }

    fn set_clip(&mut self, rect: Option<Rect>) {
        self.commands.push(PaintCommand::Clip(rect));
    }
}

/// Measures rendered text width, for autosizing columns.
pub trait TextMeasure: Send {
    /// Width of `text` in pixels.
    fn text_width(&self, text: &str, bold: bool) -> i32;
}

/// Measures every character as the same width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedWidthMeasure {
    pub char_width: i32,
    /// Extra width per character for bold text.
    pub bold_extra: i32,
}

impl Default for FixedWidthMeasure {
    fn default() -> Self {
        Self {
            char_width: 7,
            bold_extra: 1,
        }
    }
}

impl TextMeasure for FixedWidthMeasure {
    fn text_width(&self, text: &str, bold: bool) -> i32 {
        let per_char = self.char_width + if bold { self.bold_extra } else { 0 };
        text.lines()
            .map(|line| line.chars().count() as i32 * per_char)
            .max()
            .unwrap_or(0)
    }
}

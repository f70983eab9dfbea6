//! Column header layout, painting and mouse routing.
//!
//! Everything here works in physical column indices. The grid builds a
//! [`HeaderLayout`] from its visible columns, feeds mouse events through a
//! [`HeaderInputRouter`], and maps the resulting [`HeaderAction`]s back to
//! logical columns.

use crate::column::{HorizontalAlignment, VerticalAlignment};
use crate::paint::{Color, Painter, Point, Rect};
use crate::sort::SortOrder;

/// Distance from a section edge, in pixels, that starts a resize.
pub const RESIZE_HANDLE_WIDTH: f32 = 5.0;

/// Mouse travel, in pixels, before a press becomes a drag.
pub const DRAG_THRESHOLD: f32 = 3.0;

/// Smallest width a resize can produce.
pub const MINIMUM_SECTION_WIDTH: i32 = 20;

/// One header section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderSection {
    pub rect: Rect,
    pub movable: bool,
    pub resizable: bool,
    pub sortable: bool,
}

/// Section geometry of the header row.
#[derive(Debug, Clone, Default)]
pub struct HeaderLayout {
    sections: Vec<HeaderSection>,
    height: f32,
    offset: f32,
}

impl HeaderLayout {
    /// Start a layout of the given height, scrolled left by `offset` pixels.
    pub fn new(height: f32, offset: f32) -> Self {
        Self {
            sections: Vec::new(),
            height,
            offset,
        }
    }

    /// Append a section `width` pixels wide.
    pub fn push(&mut self, width: i32, movable: bool, resizable: bool, sortable: bool) {
        let x = self
            .sections
            .last()
            .map_or(-self.offset, |s| s.rect.right());
        self.sections.push(HeaderSection {
            rect: Rect::new(x, 0.0, width.max(0) as f32, self.height),
            movable,
            resizable,
            sortable,
        });
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn section(&self, index: usize) -> Option<&HeaderSection> {
        self.sections.get(index)
    }

    pub fn sections(&self) -> &[HeaderSection] {
        &self.sections
    }

    /// Section under header x coordinate `x`.
    pub fn section_at(&self, x: f32) -> Option<usize> {
        self.sections
            .iter()
            .position(|s| x >= s.rect.left() && x < s.rect.right())
    }

    /// Resizable section whose right edge is within the handle width of `x`.
    pub fn resize_handle_at(&self, x: f32) -> Option<usize> {
        self.sections
            .iter()
            .position(|s| s.resizable && (x - s.rect.right()).abs() < RESIZE_HANDLE_WIDTH)
    }
}

/// What a header gesture asks the grid to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderAction {
    /// Toggle the sort of a column.
    Sort(usize),
    /// Move a column to a new display position.
    Move { from: usize, to: usize },
    /// Live width while a resize drag is in progress.
    Resize { col: usize, width: i32 },
    /// A resize drag ended at this width.
    ResizeFinished { col: usize, width: i32 },
    /// A context menu was requested, over a section or empty header space.
    ContextMenu(Option<usize>),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Gesture {
    #[default]
    Idle,
    Pressed {
        section: Option<usize>,
        handle: Option<usize>,
        x: f32,
    },
    Moving {
        from: usize,
    },
    Resizing {
        col: usize,
        start_x: f32,
        start_width: f32,
        width: i32,
    },
}

/// Turns header mouse events into at most one gesture per press.
///
/// A press near a section edge that turns into a drag resizes; a drag
/// elsewhere moves the section; a press released without dragging sorts.
#[derive(Debug, Clone, Default)]
pub struct HeaderInputRouter {
    gesture: Gesture,
}

impl HeaderInputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a press is being tracked.
    pub fn is_active(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    /// Left button pressed at header x coordinate `x`.
    pub fn mouse_down(&mut self, x: f32, layout: &HeaderLayout) {
        self.gesture = Gesture::Pressed {
            section: layout.section_at(x),
            handle: layout.resize_handle_at(x),
            x,
        };
    }

    /// Mouse moved with the button down.
    pub fn mouse_move(&mut self, x: f32, layout: &HeaderLayout) -> Option<HeaderAction> {
        match self.gesture {
            Gesture::Pressed { section, handle, x: start } => {
                if (x - start).abs() < DRAG_THRESHOLD {
                    return None;
                }
                if let Some(col) = handle {
                    let start_width = layout.section(col)?.rect.width();
                    self.gesture = Gesture::Resizing {
                        col,
                        start_x: start,
                        start_width,
                        width: start_width as i32,
                    };
                    tracing::trace!(target: "horizon_datagrid::header", col, "resize started");
                    return self.mouse_move(x, layout);
                }
                if let Some(from) = section.filter(|&s| layout.section(s).is_some_and(|s| s.movable)) {
                    self.gesture = Gesture::Moving { from };
                    tracing::trace!(target: "horizon_datagrid::header", from, "move started");
                }
                None
            }
            Gesture::Resizing {
                col,
                start_x,
                start_width,
                ..
            } => {
                let width = ((start_width + x - start_x) as i32).max(MINIMUM_SECTION_WIDTH);
                self.gesture = Gesture::Resizing {
                    col,
                    start_x,
                    start_width,
                    width,
                };
                Some(HeaderAction::Resize { col, width })
            }
            Gesture::Moving { .. } | Gesture::Idle => None,
        }
    }

    /// Left button released at `x`.
    pub fn mouse_up(&mut self, x: f32, layout: &HeaderLayout) -> Option<HeaderAction> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Pressed { section, .. } => {
                let col = section?;
                let sortable = layout.section(col).is_some_and(|s| s.sortable);
                (sortable && layout.section_at(x) == Some(col)).then_some(HeaderAction::Sort(col))
            }
            Gesture::Moving { from } => {
                let to = layout
                    .section_at(x)
                    .unwrap_or_else(|| if x < 0.0 { 0 } else { layout.len().saturating_sub(1) });
                (to != from).then_some(HeaderAction::Move { from, to })
            }
            Gesture::Resizing { col, width, .. } => Some(HeaderAction::ResizeFinished { col, width }),
            Gesture::Idle => None,
        }
    }

    /// Right button clicked at `x`.
    pub fn context_menu(&mut self, x: f32, layout: &HeaderLayout) -> HeaderAction {
        self.gesture = Gesture::Idle;
        HeaderAction::ContextMenu(layout.section_at(x))
    }
}

/// Built-in entries of the header context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMenuAction {
    /// Autosize one logical column.
    AutosizeColumn(usize),
    AutosizeAll,
}

/// How one header section is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCellStyle<'a> {
    pub caption: &'a str,
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
    pub fore_color: Color,
    pub back_color: Color,
    pub bold: bool,
    /// Order of the sort indicator; `None` for unsorted columns.
    pub sort: Option<SortOrder>,
}

/// Draws header sections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderPainter {
    pub sort_indicator_size: f32,
    pub sort_indicator_buffer: f32,
    pub border_color: Color,
}

impl Default for HeaderPainter {
    fn default() -> Self {
        Self {
            sort_indicator_size: 6.0,
            sort_indicator_buffer: 3.0,
            border_color: Color::GRAY,
        }
    }
}

impl HeaderPainter {
    /// Paint every section of `layout` with the matching style.
    pub fn paint(&self, painter: &mut dyn Painter, layout: &HeaderLayout, styles: &[HeaderCellStyle<'_>]) {
        for (section, style) in layout.sections().iter().zip(styles) {
            if section.rect.is_empty() {
                continue;
            }
            painter.set_clip(Some(section.rect));
            self.paint_section(painter, section.rect, style);
        }
        painter.set_clip(None);
    }

    /// Paint one section: background, border, caption and sort indicator.
    pub fn paint_section(&self, painter: &mut dyn Painter, rect: Rect, style: &HeaderCellStyle<'_>) {
        painter.fill_rect(rect, style.back_color);
        painter.fill_rect(
            Rect::new(rect.right() - 1.0, rect.top(), 1.0, rect.height()),
            self.border_color,
        );

        let caption_rect = rect.inset(3.0, 2.0);
        painter.draw_text(
            style.caption,
            caption_rect,
            style.horizontal,
            style.vertical,
            style.fore_color,
            style.bold,
        );

        if let Some(order) = style.sort {
            painter.fill_polygon(&self.sort_indicator(rect, order), style.fore_color);
        }
    }

    /// Triangle of the sort indicator, inset from the top right corner.
    ///
    /// Descending points down and ascending points up.
    pub fn sort_indicator(&self, rect: Rect, order: SortOrder) -> [Point; 3] {
        let size = self.sort_indicator_size;
        let left = rect.right() - size - self.sort_indicator_buffer;
        let top = rect.top() + self.sort_indicator_buffer;
        match order {
            SortOrder::Descending => [
                Point::new(left, top),
                Point::new(left + size, top),
                Point::new(left + size / 2.0, top + size),
            ],
            SortOrder::Ascending => [
                Point::new(left + size / 2.0, top),
                Point::new(left, top + size),
                Point::new(left + size, top + size),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::RecordingPainter;

    fn layout() -> HeaderLayout {
        let mut layout = HeaderLayout::new(32.0, 0.0);
        layout.push(100, true, true, true);
        layout.push(50, true, true, true);
        layout.push(80, false, false, true);
        layout
    }

    #[test]
    fn test_layout_hit_testing() {
        let layout = layout();
        assert_eq!(layout.section_at(0.0), Some(0));
        assert_eq!(layout.section_at(120.0), Some(1));
        assert_eq!(layout.section_at(500.0), None);
        assert_eq!(layout.resize_handle_at(98.0), Some(0));
        assert_eq!(layout.resize_handle_at(120.0), None);
        // The last section is not resizable.
        assert_eq!(layout.resize_handle_at(230.0), None);

        let scrolled = {
            let mut l = HeaderLayout::new(32.0, 40.0);
            l.push(100, true, true, true);
            l
        };
        assert_eq!(scrolled.section(0).unwrap().rect.left(), -40.0);
    }

    #[test]
    fn test_click_sorts() {
        let layout = layout();
        let mut router = HeaderInputRouter::new();
        router.mouse_down(40.0, &layout);
        assert_eq!(router.mouse_move(41.0, &layout), None);
        assert_eq!(router.mouse_up(41.0, &layout), Some(HeaderAction::Sort(0)));
        assert!(!router.is_active());
    }

    #[test]
    fn test_drag_moves() {
        let layout = layout();
        let mut router = HeaderInputRouter::new();
        router.mouse_down(40.0, &layout);
        router.mouse_move(60.0, &layout);
        assert_eq!(
            router.mouse_up(200.0, &layout),
            Some(HeaderAction::Move { from: 0, to: 2 })
        );

        // Immovable sections do not start a move.
        router.mouse_down(200.0, &layout);
        router.mouse_move(20.0, &layout);
        assert_eq!(router.mouse_up(20.0, &layout), None);
    }

    #[test]
    fn test_drag_at_edge_resizes() {
        let layout = layout();
        let mut router = HeaderInputRouter::new();
        router.mouse_down(99.0, &layout);
        assert_eq!(
            router.mouse_move(129.0, &layout),
            Some(HeaderAction::Resize { col: 0, width: 130 })
        );
        assert_eq!(
            router.mouse_move(0.0, &layout),
            Some(HeaderAction::Resize { col: 0, width: MINIMUM_SECTION_WIDTH })
        );
        assert_eq!(
            router.mouse_up(0.0, &layout),
            Some(HeaderAction::ResizeFinished { col: 0, width: MINIMUM_SECTION_WIDTH })
        );
    }

    #[test]
    fn test_context_menu() {
        let layout = layout();
        let mut router = HeaderInputRouter::new();
        assert_eq!(router.context_menu(110.0, &layout), HeaderAction::ContextMenu(Some(1)));
        assert_eq!(router.context_menu(900.0, &layout), HeaderAction::ContextMenu(None));
    }

    #[test]
    fn test_sort_indicator_direction() {
        let painter = HeaderPainter::default();
        let rect = Rect::new(0.0, 0.0, 100.0, 32.0);

        let down = painter.sort_indicator(rect, SortOrder::Descending);
        assert_eq!(down[0], Point::new(91.0, 3.0));
        assert!(down[2].y > down[0].y);

        let up = painter.sort_indicator(rect, SortOrder::Ascending);
        assert!(up[0].y < up[1].y);
    }

    #[test]
    fn test_paint_draws_indicator_only_for_sorted_column() {
        let layout = layout();
        let style = |caption, sort| HeaderCellStyle {
            caption,
            horizontal: HorizontalAlignment::Center,
            vertical: VerticalAlignment::Center,
            fore_color: Color::BLACK,
            back_color: Color::HEADER_BACKGROUND,
            bold: false,
            sort,
        };
        let styles = [
            style("Name", None),
            style("Age", Some(SortOrder::Ascending)),
            style("City", None),
        ];

        let mut painter = RecordingPainter::new();
        HeaderPainter::default().paint(&mut painter, &layout, &styles);
        assert_eq!(painter.texts(), vec!["Name", "Age", "City"]);
        assert_eq!(painter.polygons().len(), 1);
    }
}

//! Keeping the caret inside the viewport.
//!
//! [`ScrollController`] never animates: a visibility pass either leaves the scroll position
//! alone or jumps it so that the caret is visible with a margin of
//! [`ScrollConfig::vertical_margin_lines`] and [`ScrollConfig::horizontal_margin_chars`].
//!
//! Navigation outside the edit path (line jumps, bookmark jumps, load restore) deposits a
//! target in a one-shot mailbox which the next pass consumes. A small pass counter decides how
//! many passes keep enforcing visibility after one navigation event.

use unicode_width::UnicodeWidthChar;

use crate::config::ScrollConfig;
use crate::line_index::LineIndex;

/// A scroll offset in pixels. Never negative once produced by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollPosition {
    /// Horizontal offset.
    pub x: f32,
    /// Vertical offset.
    pub y: f32,
}

impl ScrollPosition {
    /// Create a position.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn clamped(self) -> Self {
        Self {
            x: self.x.max(0.0),
            y: self.y.max(0.0),
        }
    }
}

/// The visible region: current scroll offset plus size, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// Current scroll offset.
    pub scroll: ScrollPosition,
    /// Visible width.
    pub width: f32,
    /// Visible height.
    pub height: f32,
}

impl Viewport {
    /// Create a viewport.
    pub fn new(scroll: ScrollPosition, width: f32, height: f32) -> Self {
        Self {
            scroll,
            width,
            height,
        }
    }
}

/// Top-left corner of the caret cell in document pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CaretPixel {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
}

/// How many visibility passes should keep enforcing caret visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityPasses {
    /// A fixed number of passes.
    Count(u32),
    /// Until a pass finds the caret already visible.
    UntilSatisfied,
}

/// Derives and consumes scroll targets.
#[derive(Debug, Clone)]
pub struct ScrollController {
    config: ScrollConfig,
    line_height: f32,
    char_width: f32,
    tab_width: usize,
    requested: Option<ScrollPosition>,
    passes: Option<VisibilityPasses>,
}

impl ScrollController {
    /// Create a controller with default metrics (16px lines, 8px cells).
    pub fn new(config: ScrollConfig, tab_width: usize) -> Self {
        Self {
            config,
            line_height: 16.0,
            char_width: 8.0,
            tab_width: tab_width.max(1),
            requested: None,
            passes: None,
        }
    }

    /// Set the font metrics supplied by the renderer.
    pub fn set_metrics(&mut self, line_height: f32, char_width: f32) {
        self.line_height = line_height.max(1.0);
        self.char_width = char_width.max(1.0);
    }

    /// Line height in pixels.
    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Cell width in pixels.
    pub fn char_width(&self) -> f32 {
        self.char_width
    }

    /// Pixel position of the caret at `offset`.
    ///
    /// `y` is `line * line_height`; `x` sums display cells of the line prefix (tabs advance to
    /// the next tab stop) times the cell width.
    pub fn caret_pixel(&self, text: &[u8], index: &LineIndex, offset: usize) -> CaretPixel {
        let offset = offset.min(text.len());
        let line = index.line_of(offset);
        let line_start = index.line_start(line).min(offset);
        let cells = cell_columns(&text[line_start..offset], self.tab_width);
        CaretPixel {
            x: cells as f32 * self.char_width,
            y: line as f32 * self.line_height,
        }
    }

    /// Vertical scroll offset that puts `line` at the top with the configured margin.
    pub fn target_for_line(&self, line: usize) -> ScrollPosition {
        let margin = self.config.vertical_margin_lines * self.line_height;
        ScrollPosition::new(0.0, line as f32 * self.line_height - margin).clamped()
    }

    /// Smallest jump that makes the caret visible with margins. Vertical: the bottom edge is
    /// checked first and the top edge wins when the viewport cannot fit both margins.
    pub fn ensure_visible(&self, caret: CaretPixel, viewport: Viewport) -> ScrollPosition {
        let margin_y = self.config.vertical_margin_lines * self.line_height;
        let margin_x = self.config.horizontal_margin_chars * self.char_width;

        let mut y = viewport.scroll.y;
        let caret_bottom = caret.y + self.line_height + margin_y;
        if caret_bottom > y + viewport.height {
            y = caret_bottom - viewport.height;
        }
        if caret.y - margin_y < y {
            y = caret.y - margin_y;
        }

        let mut x = viewport.scroll.x;
        let caret_right = caret.x + self.char_width + margin_x;
        if caret_right > x + viewport.width {
            x = caret_right - viewport.width;
        }
        if caret.x - margin_x < x {
            x = caret.x - margin_x;
        }

        ScrollPosition::new(x, y).clamped()
    }

    /// Deposit a target for the next pass; replaces any target not yet consumed.
    pub fn request_scroll(&mut self, target: ScrollPosition) {
        self.requested = Some(target.clamped());
    }

    /// The pending target, if any.
    pub fn requested_scroll(&self) -> Option<ScrollPosition> {
        self.requested
    }

    /// Ask the next passes to enforce visibility. A longer request wins over a shorter one.
    pub fn request_visibility(&mut self, passes: VisibilityPasses) {
        self.passes = match (self.passes, passes) {
            (Some(VisibilityPasses::UntilSatisfied), _) | (_, VisibilityPasses::UntilSatisfied) => {
                Some(VisibilityPasses::UntilSatisfied)
            }
            (Some(VisibilityPasses::Count(a)), VisibilityPasses::Count(b)) => {
                Some(VisibilityPasses::Count(a.max(b)))
            }
            (None, count) => Some(count),
        };
    }

    /// Default request after ordinary caret movement: a single pass.
    pub fn notify_caret_moved(&mut self) {
        self.request_visibility(VisibilityPasses::Count(1));
    }

    /// Remaining pass budget.
    pub fn pending_passes(&self) -> Option<VisibilityPasses> {
        self.passes
    }

    /// Run one visibility pass.
    ///
    /// Consumes the requested target (if any), then enforces caret visibility while the pass
    /// budget lasts. Returns the new scroll position when it differs from `viewport.scroll`.
    pub fn visibility_pass(&mut self, caret: CaretPixel, viewport: Viewport) -> Option<ScrollPosition> {
        let base = self.requested.take().unwrap_or(viewport.scroll);
        let mut result = base;

        if let Some(passes) = self.passes {
            let at_base = Viewport {
                scroll: base,
                ..viewport
            };
            result = self.ensure_visible(caret, at_base);
            self.passes = match passes {
                VisibilityPasses::Count(n) if n > 1 => Some(VisibilityPasses::Count(n - 1)),
                VisibilityPasses::Count(_) => None,
                VisibilityPasses::UntilSatisfied if result == base => None,
                VisibilityPasses::UntilSatisfied => Some(VisibilityPasses::UntilSatisfied),
            };
        }

        (result != viewport.scroll).then_some(result)
    }
}

impl Default for ScrollController {
    fn default() -> Self {
        Self::new(ScrollConfig::default(), 4)
    }
}

/// Display cells of `line_prefix`, expanding tabs to `tab_width` stops.
fn cell_columns(line_prefix: &[u8], tab_width: usize) -> usize {
    String::from_utf8_lossy(line_prefix)
        .chars()
        .fold(0, |column, ch| match ch {
            '\t' => (column / tab_width + 1) * tab_width,
            ch => column + ch.width().unwrap_or(0),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn viewport(x: f32, y: f32) -> Viewport {
        Viewport::new(ScrollPosition::new(x, y), 400.0, 160.0)
    }

    #[test]
    fn test_caret_pixel_counts_cells_and_tabs() {
        let controller = ScrollController::default();
        let text = "ab\n\tx你y".as_bytes();
        let index = LineIndex::from_bytes(text);
        // "\t" -> 4 cells, "x" -> 5, "你" -> 7
        let caret = controller.caret_pixel(text, &index, text.len() - 1);
        assert_eq!(caret, CaretPixel { x: 56.0, y: 16.0 });
    }

    #[test]
    fn test_scrolls_down_with_one_line_margin() {
        let mut controller = ScrollController::default();
        controller.notify_caret_moved();
        // Line 20 at y=320; bottom edge with margin = 352.
        let caret = CaretPixel { x: 0.0, y: 320.0 };
        let scrolled = controller.visibility_pass(caret, viewport(0.0, 0.0));
        assert_eq!(scrolled, Some(ScrollPosition::new(0.0, 192.0)));
    }

    #[test]
    fn test_second_pass_is_idempotent() {
        let mut controller = ScrollController::default();
        let caret = CaretPixel { x: 600.0, y: 48.0 };
        controller.notify_caret_moved();
        let first = controller.visibility_pass(caret, viewport(0.0, 0.0)).unwrap();
        controller.notify_caret_moved();
        assert_eq!(controller.visibility_pass(caret, viewport(first.x, first.y)), None);
    }

    #[test]
    fn test_never_negative() {
        let controller = ScrollController::default();
        let caret = CaretPixel { x: 0.0, y: 0.0 };
        let position = controller.ensure_visible(caret, viewport(50.0, 50.0));
        assert_eq!(position, ScrollPosition::new(0.0, 0.0));
    }

    #[test]
    fn test_requested_scroll_consumed_once() {
        let mut controller = ScrollController::default();
        controller.request_scroll(ScrollPosition::new(0.0, 800.0));
        let caret = CaretPixel { x: 0.0, y: 816.0 };
        assert_eq!(
            controller.visibility_pass(caret, viewport(0.0, 0.0)),
            Some(ScrollPosition::new(0.0, 800.0))
        );
        assert_eq!(controller.requested_scroll(), None);
        assert_eq!(controller.visibility_pass(caret, viewport(0.0, 0.0)), None);
    }

    #[test]
    fn test_until_satisfied_clears_after_satisfied_pass() {
        let mut controller = ScrollController::default();
        controller.request_visibility(VisibilityPasses::UntilSatisfied);
        let caret = CaretPixel { x: 0.0, y: 480.0 };
        let first = controller.visibility_pass(caret, viewport(0.0, 0.0)).unwrap();
        assert_eq!(
            controller.pending_passes(),
            Some(VisibilityPasses::UntilSatisfied)
        );
        assert_eq!(controller.visibility_pass(caret, viewport(first.x, first.y)), None);
        assert_eq!(controller.pending_passes(), None);
    }

    #[test]
    fn test_no_budget_leaves_user_scroll_alone() {
        let mut controller = ScrollController::default();
        let caret = CaretPixel { x: 0.0, y: 0.0 };
        assert_eq!(controller.visibility_pass(caret, viewport(0.0, 900.0)), None);
    }

    #[test]
    fn test_target_for_line_is_non_negative() {
        let controller = ScrollController::default();
        assert_eq!(controller.target_for_line(0), ScrollPosition::new(0.0, 0.0));
        assert_eq!(controller.target_for_line(10), ScrollPosition::new(0.0, 144.0));
    }
}

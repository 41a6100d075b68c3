//! Geometry
//!
//! Viewport-relative element rectangles, viewport size and per-side offsets.

use serde::Deserialize;

/// Element rectangle as returned by getBoundingClientRect
///
/// All values are in pixels relative to the viewport origin.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClientRect {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl ClientRect {
    /// Create from position and size
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            top: y,
            right: x + width,
            bottom: y + height,
            left: x,
            width,
            height,
        }
    }

    /// Same rect moved by (dx, dy)
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::from_xywh(self.left + dx, self.top + dy, self.width, self.height)
    }
}

/// Size of the visible area (innerWidth / innerHeight)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Per-side margin narrowing (positive) or widening (negative) the viewport
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Offset {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Offset {
    /// Same offset on all four sides
    pub const fn all(value: f64) -> Self {
        Self { top: value, right: value, bottom: value, left: value }
    }

    /// Apply a partial update. Non-finite values are ignored.
    pub fn apply(&mut self, update: OffsetUpdate) {
        let sides = [
            (&mut self.top, update.top),
            (&mut self.right, update.right),
            (&mut self.bottom, update.bottom),
            (&mut self.left, update.left),
        ];
        for (side, value) in sides {
            if let Some(v) = value.filter(|v| v.is_finite()) {
                *side = v;
            }
        }
    }
}

/// Partial offset: only the `Some` sides are applied
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OffsetUpdate {
    pub top: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
    pub left: Option<f64>,
}

impl OffsetUpdate {
    pub fn top(mut self, value: f64) -> Self {
        self.top = Some(value);
        self
    }

    pub fn right(mut self, value: f64) -> Self {
        self.right = Some(value);
        self
    }

    pub fn bottom(mut self, value: f64) -> Self {
        self.bottom = Some(value);
        self
    }

    pub fn left(mut self, value: f64) -> Self {
        self.left = Some(value);
        self
    }
}

impl From<f64> for OffsetUpdate {
    fn from(value: f64) -> Self {
        Self {
            top: Some(value),
            right: Some(value),
            bottom: Some(value),
            left: Some(value),
        }
    }
}

impl From<Offset> for OffsetUpdate {
    fn from(offset: Offset) -> Self {
        Self {
            top: Some(offset.top),
            right: Some(offset.right),
            bottom: Some(offset.bottom),
            left: Some(offset.left),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_from_xywh() {
        let rect = ClientRect::from_xywh(10.0, 20.0, 100.0, 50.0);
        assert_eq!(rect.left, 10.0);
        assert_eq!(rect.top, 20.0);
        assert_eq!(rect.right, 110.0);
        assert_eq!(rect.bottom, 70.0);

        let moved = rect.translate(0.0, -20.0);
        assert_eq!(moved.top, 0.0);
        assert_eq!(moved.bottom, 50.0);
        assert_eq!(moved.height, 50.0);
    }

    #[test]
    fn test_offset_number_sets_all_sides() {
        let mut offset = Offset::default();
        offset.apply(OffsetUpdate::from(5.0));
        assert_eq!(offset, Offset::all(5.0));
    }

    #[test]
    fn test_offset_partial_update() {
        let mut offset = Offset::all(1.0);
        offset.apply(OffsetUpdate::default().top(10.0));
        assert_eq!(offset.top, 10.0);
        assert_eq!(offset.right, 1.0);
        assert_eq!(offset.bottom, 1.0);
        assert_eq!(offset.left, 1.0);
    }

    #[test]
    fn test_offset_ignores_non_finite() {
        let mut offset = Offset::all(3.0);
        offset.apply(OffsetUpdate::default().left(f64::NAN).bottom(f64::INFINITY));
        assert_eq!(offset, Offset::all(3.0));
    }
}

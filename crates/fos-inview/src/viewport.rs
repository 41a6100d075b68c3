//! Viewport Test
//!
//! Decides whether an element is sufficiently inside the viewport, given
//! per-side offsets and a threshold fraction of the element's own size.

use std::fmt;
use std::rc::Rc;

use crate::geometry::{ClientRect, Offset, ViewportSize};

/// Geometry snapshot handed to a visibility test
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElementBounds {
    pub rect: ClientRect,
    pub viewport: ViewportSize,
}

/// Visibility predicate
///
/// Cloning shares the same function; two tests are equal when they share it.
#[derive(Clone)]
pub struct VisibilityTest(Rc<dyn Fn(&ElementBounds, &InViewOptions) -> bool>);

impl VisibilityTest {
    pub fn new(test: impl Fn(&ElementBounds, &InViewOptions) -> bool + 'static) -> Self {
        Self(Rc::new(test))
    }

    pub fn evaluate(&self, bounds: &ElementBounds, options: &InViewOptions) -> bool {
        (self.0)(bounds, options)
    }
}

impl Default for VisibilityTest {
    fn default() -> Self {
        Self::new(in_viewport)
    }
}

impl PartialEq for VisibilityTest {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for VisibilityTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VisibilityTest(..)")
    }
}

/// Resolved options a registry checks its elements with
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InViewOptions {
    pub offset: Offset,
    /// Fraction in [0, 1] of the element's width/height that must be visible
    pub threshold: f64,
    pub test: VisibilityTest,
}

impl InViewOptions {
    /// Merge per-selector overrides over these defaults, field by field
    pub fn merged(&self, overrides: SelectorOptions) -> InViewOptions {
        let threshold = overrides.threshold.filter(|t| {
            let valid = is_valid_threshold(*t);
            if !valid {
                tracing::warn!("Ignoring out-of-range selector threshold {}", t);
            }
            valid
        });

        InViewOptions {
            offset: overrides.offset.unwrap_or(self.offset),
            threshold: threshold.unwrap_or(self.threshold),
            test: overrides.test.unwrap_or_else(|| self.test.clone()),
        }
    }
}

/// Per-selector overrides passed to `InView::control`
#[derive(Debug, Clone, Default)]
pub struct SelectorOptions {
    pub offset: Option<Offset>,
    pub threshold: Option<f64>,
    pub test: Option<VisibilityTest>,
}

impl SelectorOptions {
    pub fn offset(mut self, offset: Offset) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn test(mut self, test: VisibilityTest) -> Self {
        self.test = Some(test);
        self
    }
}

/// Threshold must be a number in [0, 1]
pub fn is_valid_threshold(threshold: f64) -> bool {
    (0.0..=1.0).contains(&threshold)
}

/// Default visibility test
///
/// Each axis passes when the element reaches past both opposing viewport
/// edges by more than `offset + threshold * size`, or when it overflows
/// both edges by more than the offset.
pub fn in_viewport(bounds: &ElementBounds, options: &InViewOptions) -> bool {
    let rect = &bounds.rect;
    let offset = &options.offset;

    // Distance between each element edge and the opposing viewport edge
    let top = rect.bottom;
    let right = bounds.viewport.width - rect.left;
    let bottom = bounds.viewport.height - rect.top;
    let left = rect.right;

    let threshold_x = options.threshold * rect.width;
    let threshold_y = options.threshold * rect.height;

    let vertical = (top > offset.top + threshold_y && bottom > offset.bottom + threshold_y)
        || (top < -offset.top && bottom < -offset.bottom);

    let horizontal = (right > offset.right + threshold_x && left > offset.left + threshold_x)
        || (right < -offset.right && left < -offset.left);

    vertical && horizontal
}

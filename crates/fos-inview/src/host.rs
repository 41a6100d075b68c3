//! Host Collaborators
//!
//! What in-view needs from the environment: element geometry, selector
//! queries, event subscription and (optionally) mutation observation.
//!
//! Subscriptions are declarative. The host records them and its event loop
//! feeds the events back through [`InView::handle_event`] and
//! [`InView::handle_mutations`].
//!
//! [`InView::handle_event`]: crate::InView::handle_event
//! [`InView::handle_mutations`]: crate::InView::handle_mutations

use std::hash::Hash;

use serde::Deserialize;

use crate::error::InViewError;
use crate::geometry::{ClientRect, ViewportSize};

/// Geometry source
pub trait Geometry {
    /// Element handle, compared by identity
    type Element: Clone + Eq + Hash;

    /// Viewport-relative rect of `element`
    fn bounding_client_rect(&self, element: &Self::Element) -> ClientRect;

    /// Current viewport size
    fn viewport(&self) -> ViewportSize;
}

/// Document environment driving in-view
pub trait Host: Geometry {
    /// Whether a document is present at all
    fn has_dom(&self) -> bool {
        true
    }

    /// Elements matching `selector`, in document order
    fn query_selector_all(&self, selector: &str) -> Result<Vec<Self::Element>, InViewError>;

    /// Subscribe to a window event
    fn add_event_listener(&mut self, event: TriggerEvent, options: &EventOptions);

    /// Whether DOMContentLoaded has already fired
    fn is_ready(&self) -> bool {
        false
    }

    fn supports_mutation_observer(&self) -> bool {
        false
    }

    /// Start observing the document body
    fn observe_mutations(&mut self, _init: &MutationObserverInit) {}
}

/// Window events in-view listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerEvent {
    Scroll,
    Resize,
    Load,
    DomContentLoaded,
}

impl TriggerEvent {
    /// Events that re-check every registry
    pub const CHECKS: [TriggerEvent; 3] = [TriggerEvent::Scroll, TriggerEvent::Resize, TriggerEvent::Load];

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerEvent::Scroll => "scroll",
            TriggerEvent::Resize => "resize",
            TriggerEvent::Load => "load",
            TriggerEvent::DomContentLoaded => "DOMContentLoaded",
        }
    }
}

/// addEventListener options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EventOptions {
    pub capture: bool,
    pub passive: bool,
    pub once: bool,
}

/// Mutation observer options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationObserverInit {
    pub attributes: bool,
    pub child_list: bool,
    pub subtree: bool,
}

impl MutationObserverInit {
    /// Attributes, children and descendants
    pub const fn everything() -> Self {
        Self { attributes: true, child_list: true, subtree: true }
    }
}

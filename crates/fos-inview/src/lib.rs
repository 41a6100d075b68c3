//! fOS In-View
//!
//! Detects when elements enter or leave the viewport and fires `enter` /
//! `exit` handlers, once per transition.
//!
//! - One [`Registry`] per selector, holding the matched elements and which
//!   of them are currently in view
//! - A throttled check over every registry on scroll, resize, load and
//!   DOM mutation
//! - Per-side offsets and a visibility threshold, globally or per selector
//!
//! # Example
//! ```rust,ignore
//! use fos_inview::{InView, InViewEvent, Handler, SelectorOptions};
//!
//! let mut inview = InView::new(host).expect("document available");
//! inview
//!     .control(".lazy", SelectorOptions::default())?
//!     .on(InViewEvent::Enter, Handler::new(|el, _| load_image(el)))
//!     .on(InViewEvent::Exit, Handler::new(|el, _| unload_image(el)));
//!
//! // From the host event loop
//! inview.handle_event(TriggerEvent::Scroll, Instant::now())?;
//! inview.poll(Instant::now())?;
//! ```

mod config;
mod error;
mod geometry;
pub mod host;
pub mod memory_host;
mod registry;
mod scheduler;
pub mod throttle;
mod viewport;

pub use config::InViewConfig;
pub use error::{HandlerError, InViewError};
pub use geometry::{ClientRect, Offset, OffsetUpdate, ViewportSize};
pub use host::{EventOptions, Geometry, Host, MutationObserverInit, TriggerEvent};
pub use memory_host::{ElementId, MemoryElement, MemoryHost};
pub use registry::{Handler, HandlerSet, InViewEvent, Registry};
pub use scheduler::InView;
pub use throttle::Throttle;
pub use viewport::{ElementBounds, InViewOptions, SelectorOptions, VisibilityTest, in_viewport, is_valid_threshold};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

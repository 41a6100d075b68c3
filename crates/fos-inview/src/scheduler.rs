//! Scheduler
//!
//! Owns one registry per selector, the global default options, and the
//! throttled check loop driven by window events and DOM mutations.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::{Duration, Instant};

use crate::config::InViewConfig;
use crate::error::InViewError;
use crate::geometry::{Offset, OffsetUpdate};
use crate::host::{EventOptions, Host, MutationObserverInit, TriggerEvent};
use crate::registry::Registry;
use crate::throttle::Throttle;
use crate::viewport::{ElementBounds, InViewOptions, SelectorOptions, VisibilityTest, is_valid_threshold};

/// Listener wiring happens once, on the first `control()` call
#[derive(Debug)]
enum InitState {
    Uninitialized,
    Initialized {
        throttle: Throttle,
        observing_mutations: bool,
    },
}

/// Visibility tracker
pub struct InView<H: Host> {
    host: H,
    registries: HashMap<String, Registry<H::Element>>,
    /// Selectors in registration order
    history: Vec<String>,
    options: InViewOptions,
    interval: Duration,
    event_options: EventOptions,
    state: InitState,
}

impl<H: Host> InView<H> {
    /// Create with default configuration. Returns `None` when the host has no document.
    pub fn new(host: H) -> Option<Self> {
        Self::with_config(host, InViewConfig::default())
    }

    pub fn with_config(host: H, config: InViewConfig) -> Option<Self> {
        if !host.has_dom() {
            tracing::debug!("No document available, in-view disabled");
            return None;
        }

        let mut inview = Self {
            host,
            registries: HashMap::new(),
            history: Vec::new(),
            options: InViewOptions::default(),
            interval: config.interval(),
            event_options: config.event_options,
            state: InitState::Uninitialized,
        };
        inview.set_offset(config.offset);
        inview.set_threshold(config.threshold);
        Some(inview)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, InitState::Initialized { .. })
    }

    fn init(&mut self) {
        for event in TriggerEvent::CHECKS {
            self.host.add_event_listener(event, &self.event_options);
        }

        // A document that is already loaded never fires DOMContentLoaded again
        let mut observing_mutations = false;
        if self.host.supports_mutation_observer() {
            if self.host.is_ready() {
                self.host.observe_mutations(&MutationObserverInit::everything());
                tracing::debug!("Observing DOM mutations");
                observing_mutations = true;
            } else {
                self.host.add_event_listener(TriggerEvent::DomContentLoaded, &EventOptions::default());
            }
        }

        tracing::debug!("in-view initialized, checking at most every {:?}", self.interval);
        self.state = InitState::Initialized {
            throttle: Throttle::new(self.interval),
            observing_mutations,
        };
    }

    /// Get or create the registry for `selector`
    ///
    /// The element list is re-queried on every call. An existing registry
    /// gets the fresh elements and options; per-element state is kept for
    /// elements that are still matched.
    pub fn control(
        &mut self,
        selector: &str,
        options: SelectorOptions,
    ) -> Result<&mut Registry<H::Element>, InViewError> {
        if !self.is_initialized() {
            self.init();
        }

        if selector.trim().is_empty() {
            return Err(InViewError::InvalidSelector(selector.to_string()));
        }

        let options = self.options.merged(options);
        let elements = self.host.query_selector_all(selector)?;

        match self.registries.entry(selector.to_string()) {
            Entry::Occupied(entry) => {
                let registry = entry.into_mut();
                registry.set_elements(elements);
                registry.set_options(options);
                Ok(registry)
            }
            Entry::Vacant(entry) => {
                tracing::debug!("Tracking {} element(s) for {:?}", elements.len(), selector);
                self.history.push(selector.to_string());
                Ok(entry.insert(Registry::new(elements, options)))
            }
        }
    }

    pub fn registry(&self, selector: &str) -> Option<&Registry<H::Element>> {
        self.registries.get(selector)
    }

    pub fn registry_mut(&mut self, selector: &str) -> Option<&mut Registry<H::Element>> {
        self.registries.get_mut(selector)
    }

    /// Registered selectors in registration order
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    pub fn offset(&self) -> Offset {
        self.options.offset
    }

    /// Update the default offset with a number (all sides) or a partial offset
    ///
    /// Existing registries are not affected. Returns the resulting offset.
    pub fn set_offset(&mut self, offset: impl Into<OffsetUpdate>) -> Offset {
        self.options.offset.apply(offset.into());
        tracing::debug!("Default offset is now {:?}", self.options.offset);
        self.options.offset
    }

    pub fn threshold(&self) -> f64 {
        self.options.threshold
    }

    /// Set the default threshold. Values outside [0, 1] are ignored.
    ///
    /// Returns the threshold in effect afterwards.
    pub fn set_threshold(&mut self, threshold: f64) -> f64 {
        if is_valid_threshold(threshold) {
            self.options.threshold = threshold;
        } else {
            tracing::debug!("Ignoring invalid threshold {}", threshold);
        }
        self.options.threshold
    }

    pub fn test(&self) -> &VisibilityTest {
        &self.options.test
    }

    /// Replace the default visibility test
    pub fn set_test(&mut self, test: VisibilityTest) -> &VisibilityTest {
        self.options.test = test;
        &self.options.test
    }

    /// One-off check of `element` against the default options
    pub fn is(&self, element: &H::Element) -> bool {
        let bounds = ElementBounds {
            rect: self.host.bounding_client_rect(element),
            viewport: self.host.viewport(),
        };
        self.options.test.evaluate(&bounds, &self.options)
    }

    pub fn event_options(&self) -> EventOptions {
        self.event_options
    }

    /// Change the listener options. Rejected once listeners are wired.
    pub fn add_event_options(&mut self, options: EventOptions) -> Result<(), InViewError> {
        self.reject_if_initialized("event options")?;
        self.event_options = options;
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Change the check interval. Rejected once listeners are wired.
    pub fn set_interval(&mut self, interval: Duration) -> Result<(), InViewError> {
        self.reject_if_initialized("interval")?;
        self.interval = interval;
        Ok(())
    }

    fn reject_if_initialized(&self, setting: &'static str) -> Result<(), InViewError> {
        if self.is_initialized() {
            tracing::warn!("in-view: can not change {} after in-view is initialized", setting);
            return Err(InViewError::AlreadyInitialized(setting));
        }
        Ok(())
    }

    /// Check every registry in registration order, unthrottled
    pub fn check_all(&mut self) -> Result<(), InViewError> {
        for selector in &self.history {
            if let Some(registry) = self.registries.get_mut(selector) {
                registry.check(&self.host)?;
            }
        }
        Ok(())
    }

    /// Fire `exit` for everything currently in view, in every registry
    pub fn run_exit_on_elements_currently_in_view(&mut self) -> Result<(), InViewError> {
        for selector in &self.history {
            if let Some(registry) = self.registries.get_mut(selector) {
                registry.run_exit_on_elements_currently_in_view()?;
            }
        }
        Ok(())
    }

    /// Deliver a window event the host subscribed to
    pub fn handle_event(&mut self, event: TriggerEvent, now: Instant) -> Result<(), InViewError> {
        let InitState::Initialized { throttle, observing_mutations } = &mut self.state else {
            return Ok(());
        };

        match event {
            TriggerEvent::DomContentLoaded => {
                if !*observing_mutations && self.host.supports_mutation_observer() {
                    self.host.observe_mutations(&MutationObserverInit::everything());
                    *observing_mutations = true;
                    tracing::debug!("Observing DOM mutations");
                }
                Ok(())
            }
            _ => {
                if throttle.call(now) {
                    self.check_all()
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Deliver DOM mutations seen by the observer
    pub fn handle_mutations(&mut self, now: Instant) -> Result<(), InViewError> {
        let due = match &mut self.state {
            InitState::Initialized { throttle, observing_mutations: true } => throttle.call(now),
            _ => false,
        };
        if due { self.check_all() } else { Ok(()) }
    }

    /// Run the deferred trailing check, if it is due
    pub fn poll(&mut self, now: Instant) -> Result<(), InViewError> {
        let due = match &mut self.state {
            InitState::Initialized { throttle, .. } => throttle.poll(now),
            InitState::Uninitialized => false,
        };
        if due {
            tracing::trace!("Running deferred check");
            self.check_all()
        } else {
            Ok(())
        }
    }

    /// When `poll` next has work
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.state {
            InitState::Initialized { throttle, .. } => throttle.deadline(),
            InitState::Uninitialized => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ViewportSize;
    use crate::memory_host::{MemoryElement, MemoryHost};

    fn inview() -> InView<MemoryHost> {
        InView::new(MemoryHost::new(ViewportSize::new(800.0, 600.0))).unwrap()
    }

    #[test]
    fn test_no_dom_is_inert() {
        assert!(InView::new(MemoryHost::detached()).is_none());
    }

    #[test]
    fn test_offset_accessors() {
        let mut inview = inview();
        assert_eq!(inview.offset(), Offset::all(0.0));

        assert_eq!(inview.set_offset(5.0_f64), Offset::all(5.0));
        let offset = inview.set_offset(OffsetUpdate::default().top(10.0));
        assert_eq!(offset, Offset { top: 10.0, right: 5.0, bottom: 5.0, left: 5.0 });
    }

    #[test]
    fn test_threshold_validation() {
        let mut inview = inview();
        assert_eq!(inview.set_threshold(1.5), 0.0);
        assert_eq!(inview.set_threshold(-1.0), 0.0);
        assert_eq!(inview.set_threshold(f64::NAN), 0.0);
        assert_eq!(inview.set_threshold(0.5), 0.5);
        assert_eq!(inview.set_threshold(2.0), 0.5);
        assert_eq!(inview.threshold(), 0.5);
    }

    #[test]
    fn test_init_is_lazy_and_once() {
        let mut inview = inview();
        assert!(!inview.is_initialized());
        assert!(inview.host().listeners().is_empty());

        inview.control("div", SelectorOptions::default()).unwrap();
        inview.control("p", SelectorOptions::default()).unwrap();
        assert!(inview.is_initialized());

        let events: Vec<_> = inview.host().listeners().iter().map(|(e, _)| *e).collect();
        assert_eq!(
            events,
            vec![
                TriggerEvent::Scroll,
                TriggerEvent::Resize,
                TriggerEvent::Load,
                TriggerEvent::DomContentLoaded,
            ]
        );
    }

    #[test]
    fn test_no_dom_content_loaded_without_observer_support() {
        let host = MemoryHost::new(ViewportSize::new(800.0, 600.0)).without_mutation_observer();
        let mut inview = InView::new(host).unwrap();
        inview.control("div", SelectorOptions::default()).unwrap();
        assert!(!inview.host().is_listening(TriggerEvent::DomContentLoaded));
        assert_eq!(inview.host().listeners().len(), 3);
    }

    #[test]
    fn test_ready_document_observes_mutations_on_init() {
        let mut host = MemoryHost::new(ViewportSize::new(800.0, 600.0));
        host.mark_ready();
        let mut inview = InView::new(host).unwrap();
        inview.control("div", SelectorOptions::default()).unwrap();

        assert!(!inview.host().is_listening(TriggerEvent::DomContentLoaded));
        assert_eq!(inview.host().mutation_observer(), Some(MutationObserverInit::everything()));

        // A late DOMContentLoaded does not attach a second observer
        inview.handle_event(TriggerEvent::DomContentLoaded, Instant::now()).unwrap();
        assert_eq!(inview.host().listeners().len(), 3);
    }

    #[test]
    fn test_settings_rejected_after_init() {
        let mut inview = inview();
        let options = EventOptions { passive: true, ..Default::default() };
        assert!(inview.add_event_options(options).is_ok());
        assert!(inview.set_interval(Duration::from_millis(250)).is_ok());

        inview.control("div", SelectorOptions::default()).unwrap();
        assert!(inview.host().listeners().iter().take(3).all(|(_, o)| o.passive));

        assert!(matches!(
            inview.set_interval(Duration::from_millis(10)),
            Err(InViewError::AlreadyInitialized("interval"))
        ));
        assert!(matches!(
            inview.add_event_options(EventOptions::default()),
            Err(InViewError::AlreadyInitialized("event options"))
        ));
        assert_eq!(inview.interval(), Duration::from_millis(250));
        assert!(inview.event_options().passive);
    }

    #[test]
    fn test_control_reuses_registry() {
        let mut inview = inview();
        let first = inview.host_mut().insert(MemoryElement::new("div").at(0.0, 0.0, 10.0, 10.0));

        assert_eq!(inview.control("div", SelectorOptions::default()).unwrap().elements(), &[first]);

        let second = inview.host_mut().insert(MemoryElement::new("div").at(0.0, 20.0, 10.0, 10.0));
        let registry = inview.control("div", SelectorOptions::default().threshold(0.5)).unwrap();
        assert_eq!(registry.elements(), &[first, second]);
        assert_eq!(registry.options().threshold, 0.5);

        assert_eq!(inview.selectors().collect::<Vec<_>>(), vec!["div"]);
    }

    #[test]
    fn test_invalid_selector() {
        let mut inview = inview();
        assert!(matches!(
            inview.control("", SelectorOptions::default()),
            Err(InViewError::InvalidSelector(_))
        ));
        assert!(matches!(
            inview.control("ul > li", SelectorOptions::default()),
            Err(InViewError::InvalidSelector(_))
        ));
        assert_eq!(inview.selectors().count(), 0);
    }

    #[test]
    fn test_global_options_do_not_touch_existing_registries() {
        let mut inview = inview();
        inview.control("div", SelectorOptions::default()).unwrap();
        inview.set_threshold(0.75);
        inview.set_offset(30.0_f64);

        let registry = inview.registry("div").unwrap();
        assert_eq!(registry.options().threshold, 0.0);
        assert_eq!(registry.options().offset, Offset::all(0.0));
    }

    #[test]
    fn test_is_uses_global_options() {
        let mut inview = inview();
        let el = inview.host_mut().insert(MemoryElement::new("div").at(0.0, 550.0, 100.0, 100.0));
        assert!(inview.is(&el));

        inview.set_threshold(0.6);
        assert!(!inview.is(&el));

        inview.set_test(VisibilityTest::new(|_, _| true));
        assert!(inview.is(&el));
    }

    #[test]
    fn test_events_ignored_before_init() {
        let mut inview = inview();
        inview.handle_event(TriggerEvent::Scroll, Instant::now()).unwrap();
        assert_eq!(inview.next_deadline(), None);
    }
}

//! Element Registry
//!
//! Tracks the elements matched by one selector, remembers which of them are
//! currently in view, and fires `enter`/`exit` handlers once per transition.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;
use std::str::FromStr;

use crate::error::HandlerError;
use crate::host::Geometry;
use crate::viewport::{ElementBounds, InViewOptions};

/// Registry event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InViewEvent {
    /// Element moved into view
    Enter,
    /// Element moved out of view
    Exit,
}

impl InViewEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            InViewEvent::Enter => "enter",
            InViewEvent::Exit => "exit",
        }
    }
}

impl FromStr for InViewEvent {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enter" => Ok(InViewEvent::Enter),
            "exit" => Ok(InViewEvent::Exit),
            _ => Err(()),
        }
    }
}

type HandlerFn<E> = dyn Fn(&E, usize) -> Result<(), HandlerError>;

/// Event handler, called with the element and its index in the registry
///
/// Handlers compare by identity: a clone is the same handler.
pub struct Handler<E>(Rc<HandlerFn<E>>);

impl<E> Handler<E> {
    /// Handler that cannot fail
    pub fn new(f: impl Fn(&E, usize) + 'static) -> Self {
        Self(Rc::new(move |element: &E, index| {
            f(element, index);
            Ok(())
        }))
    }

    /// Handler whose error aborts the running check
    pub fn fallible(f: impl Fn(&E, usize) -> Result<(), HandlerError> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, element: &E, index: usize) -> Result<(), HandlerError> {
        (self.0)(element, index)
    }
}

impl<E> Clone for Handler<E> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<E> PartialEq for Handler<E> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<E> fmt::Debug for Handler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

/// Ordered handler lists per event
#[derive(Debug)]
pub struct HandlerSet<E> {
    enter: Vec<Handler<E>>,
    exit: Vec<Handler<E>>,
}

impl<E> Default for HandlerSet<E> {
    fn default() -> Self {
        Self { enter: Vec::new(), exit: Vec::new() }
    }
}

impl<E> HandlerSet<E> {
    pub fn get(&self, event: InViewEvent) -> &[Handler<E>] {
        match event {
            InViewEvent::Enter => &self.enter,
            InViewEvent::Exit => &self.exit,
        }
    }

    fn get_mut(&mut self, event: InViewEvent) -> &mut Vec<Handler<E>> {
        match event {
            InViewEvent::Enter => &mut self.enter,
            InViewEvent::Exit => &mut self.exit,
        }
    }

    /// Append, duplicates included
    pub fn add(&mut self, event: InViewEvent, handler: Handler<E>) {
        self.get_mut(event).push(handler);
    }

    /// Remove the first registration of `handler`. Returns whether one was found.
    pub fn remove(&mut self, event: InViewEvent, handler: &Handler<E>) -> bool {
        let handlers = self.get_mut(event);
        match handlers.iter().position(|h| h == handler) {
            Some(pos) => {
                handlers.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Call every handler for `event` in registration order, stopping at the first error
    pub fn emit(&self, event: InViewEvent, element: &E, index: usize) -> Result<(), HandlerError> {
        for handler in self.get(event) {
            handler.call(element, index)?;
        }
        Ok(())
    }
}

/// Elements of one selector and their last known visibility
#[derive(Debug)]
pub struct Registry<E> {
    elements: Vec<E>,
    /// Elements currently in view, keyed by identity
    current: HashSet<E>,
    options: InViewOptions,
    handlers: HandlerSet<E>,
}

impl<E: Clone + Eq + Hash> Registry<E> {
    /// Create a registry; every element starts out of view
    pub fn new(elements: Vec<E>, options: InViewOptions) -> Self {
        Self {
            elements,
            current: HashSet::new(),
            options,
            handlers: HandlerSet::default(),
        }
    }

    pub fn elements(&self) -> &[E] {
        &self.elements
    }

    /// Replace the element list
    ///
    /// Elements that are still present keep their state; new ones start out of view.
    pub fn set_elements(&mut self, elements: Vec<E>) {
        let present: HashSet<&E> = elements.iter().collect();
        self.current.retain(|element| present.contains(element));
        self.elements = elements;
    }

    pub fn options(&self) -> &InViewOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: InViewOptions) {
        self.options = options;
    }

    pub fn handlers(&self) -> &HandlerSet<E> {
        &self.handlers
    }

    pub fn handler_count(&self, event: InViewEvent) -> usize {
        self.handlers.get(event).len()
    }

    /// Whether `element` was in view at the last check
    pub fn is_in_view(&self, element: &E) -> bool {
        self.current.contains(element)
    }

    pub fn in_view_count(&self) -> usize {
        self.current.len()
    }

    /// Register a handler
    pub fn on(&mut self, event: InViewEvent, handler: Handler<E>) -> &mut Self {
        self.handlers.add(event, handler);
        self
    }

    /// Unregister a handler; removing one that is not registered does nothing
    pub fn off(&mut self, event: InViewEvent, handler: &Handler<E>) -> &mut Self {
        self.handlers.remove(event, handler);
        self
    }

    /// Re-evaluate every element and fire handlers for each transition
    ///
    /// State is committed before the handlers run, so a failing handler
    /// never causes the same transition to fire twice. The first handler
    /// error stops the check and is returned.
    pub fn check<G>(&mut self, geometry: &G) -> Result<(), HandlerError>
    where
        G: Geometry<Element = E> + ?Sized,
    {
        let viewport = geometry.viewport();

        for (index, element) in self.elements.iter().enumerate() {
            let bounds = ElementBounds {
                rect: geometry.bounding_client_rect(element),
                viewport,
            };
            let passes = self.options.test.evaluate(&bounds, &self.options);
            let was_in_view = self.current.contains(element);

            if passes && !was_in_view {
                tracing::trace!("Element {} entered view", index);
                self.current.insert(element.clone());
                self.handlers.emit(InViewEvent::Enter, element, index)?;
            } else if !passes && was_in_view {
                tracing::trace!("Element {} exited view", index);
                self.current.remove(element);
                self.handlers.emit(InViewEvent::Exit, element, index)?;
            }
        }

        Ok(())
    }

    /// Fire `exit` for every element currently in view and mark it out of view
    ///
    /// Geometry is not consulted.
    pub fn run_exit_on_elements_currently_in_view(&mut self) -> Result<(), HandlerError> {
        for (index, element) in self.elements.iter().enumerate() {
            if self.current.remove(element) {
                self.handlers.emit(InViewEvent::Exit, element, index)?;
            }
        }
        Ok(())
    }
}

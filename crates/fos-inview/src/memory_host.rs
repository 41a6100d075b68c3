//! In-memory Host
//!
//! A tiny document model for headless use: elements with a tag, an id,
//! classes and a document-space rect, a scrollable viewport, and simple
//! selector matching (`tag`, `.class`, `#id`, compounds, comma lists).

use crate::error::InViewError;
use crate::geometry::{ClientRect, ViewportSize};
use crate::host::{EventOptions, Geometry, Host, MutationObserverInit, TriggerEvent};

/// Element handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32);

/// Element data
#[derive(Debug, Clone, Default)]
pub struct MemoryElement {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    /// Position in document coordinates
    pub rect: ClientRect,
}

impl MemoryElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn at(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.rect = ClientRect::from_xywh(x, y, width, height);
        self
    }
}

/// In-memory document
#[derive(Debug)]
pub struct MemoryHost {
    has_dom: bool,
    ready: bool,
    mutation_observer_supported: bool,
    viewport: ViewportSize,
    scroll_x: f64,
    scroll_y: f64,
    next_id: u32,
    /// Document order
    elements: Vec<(ElementId, MemoryElement)>,
    listeners: Vec<(TriggerEvent, EventOptions)>,
    observer: Option<MutationObserverInit>,
    pending_mutations: usize,
}

impl MemoryHost {
    pub fn new(viewport: ViewportSize) -> Self {
        Self {
            has_dom: true,
            ready: false,
            mutation_observer_supported: true,
            viewport,
            scroll_x: 0.0,
            scroll_y: 0.0,
            next_id: 1,
            elements: Vec::new(),
            listeners: Vec::new(),
            observer: None,
            pending_mutations: 0,
        }
    }

    /// Host without a document
    pub fn detached() -> Self {
        Self {
            has_dom: false,
            ..Self::new(ViewportSize::default())
        }
    }

    /// Host without MutationObserver support
    pub fn without_mutation_observer(mut self) -> Self {
        self.mutation_observer_supported = false;
        self
    }

    /// Mark the document as loaded (DOMContentLoaded has fired)
    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    /// Append an element to the document
    pub fn insert(&mut self, element: MemoryElement) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.elements.push((id, element));
        self.record_mutation();
        id
    }

    /// Remove an element. Returns false if it was not in the document.
    pub fn remove(&mut self, id: ElementId) -> bool {
        let before = self.elements.len();
        self.elements.retain(|(eid, _)| *eid != id);
        let removed = self.elements.len() != before;
        if removed {
            self.record_mutation();
        }
        removed
    }

    pub fn element(&self, id: ElementId) -> Option<&MemoryElement> {
        self.elements.iter().find(|(eid, _)| *eid == id).map(|(_, el)| el)
    }

    /// Move an element, in document coordinates
    pub fn set_rect(&mut self, id: ElementId, rect: ClientRect) {
        if let Some((_, el)) = self.elements.iter_mut().find(|(eid, _)| *eid == id) {
            el.rect = rect;
            self.record_mutation();
        }
    }

    pub fn add_class(&mut self, id: ElementId, class: &str) {
        if let Some((_, el)) = self.elements.iter_mut().find(|(eid, _)| *eid == id) {
            el.classes.push(class.to_string());
            self.record_mutation();
        }
    }

    pub fn scroll_to(&mut self, x: f64, y: f64) {
        self.scroll_x = x;
        self.scroll_y = y;
    }

    pub fn scroll_by(&mut self, dx: f64, dy: f64) {
        self.scroll_to(self.scroll_x + dx, self.scroll_y + dy);
    }

    pub fn scroll_position(&self) -> (f64, f64) {
        (self.scroll_x, self.scroll_y)
    }

    pub fn resize(&mut self, viewport: ViewportSize) {
        self.viewport = viewport;
    }

    /// Subscriptions made through `add_event_listener`, in order
    pub fn listeners(&self) -> &[(TriggerEvent, EventOptions)] {
        &self.listeners
    }

    pub fn is_listening(&self, event: TriggerEvent) -> bool {
        self.listeners.iter().any(|(e, _)| *e == event)
    }

    /// Options the mutation observer was attached with
    pub fn mutation_observer(&self) -> Option<MutationObserverInit> {
        self.observer
    }

    /// Number of mutations since the last call
    pub fn take_mutations(&mut self) -> usize {
        std::mem::take(&mut self.pending_mutations)
    }

    fn record_mutation(&mut self) {
        if self.observer.is_some() {
            self.pending_mutations += 1;
        }
    }
}

impl Geometry for MemoryHost {
    type Element = ElementId;

    fn bounding_client_rect(&self, element: &ElementId) -> ClientRect {
        self.element(*element)
            .map(|el| el.rect.translate(-self.scroll_x, -self.scroll_y))
            .unwrap_or_default()
    }

    fn viewport(&self) -> ViewportSize {
        self.viewport
    }
}

impl Host for MemoryHost {
    fn has_dom(&self) -> bool {
        self.has_dom
    }

    fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementId>, InViewError> {
        let compounds = parse_selector_list(selector)
            .ok_or_else(|| InViewError::InvalidSelector(selector.to_string()))?;

        Ok(self
            .elements
            .iter()
            .filter(|(_, el)| compounds.iter().any(|c| c.matches(el)))
            .map(|(id, _)| *id)
            .collect())
    }

    fn add_event_listener(&mut self, event: TriggerEvent, options: &EventOptions) {
        tracing::trace!("addEventListener({})", event.as_str());
        self.listeners.push((event, *options));
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn supports_mutation_observer(&self) -> bool {
        self.mutation_observer_supported
    }

    fn observe_mutations(&mut self, init: &MutationObserverInit) {
        self.observer = Some(*init);
    }
}

/// One compound selector, e.g. `div.card#hero`
#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
}

impl Compound {
    fn matches(&self, element: &MemoryElement) -> bool {
        self.tag.as_ref().is_none_or(|tag| *tag == element.tag)
            && self.ids.iter().all(|id| element.id.as_deref() == Some(id.as_str()))
            && self.classes.iter().all(|class| element.classes.contains(class))
    }
}

fn is_ident(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn parse_selector_list(selector: &str) -> Option<Vec<Compound>> {
    selector.split(',').map(|part| parse_compound(part.trim())).collect()
}

fn parse_compound(input: &str) -> Option<Compound> {
    let mut compound = Compound::default();

    let tag_len = input.find(['.', '#']).unwrap_or(input.len());
    let tag = &input[..tag_len];
    match tag {
        "" | "*" => {}
        _ if is_ident(tag) => compound.tag = Some(tag.to_ascii_lowercase()),
        _ => return None,
    }

    let mut rest = &input[tag_len..];
    while let Some(marker) = rest.chars().next() {
        let body = &rest[1..];
        let len = body.find(['.', '#']).unwrap_or(body.len());
        let name = &body[..len];
        if !is_ident(name) {
            return None;
        }
        match marker {
            '.' => compound.classes.push(name.to_string()),
            _ => compound.ids.push(name.to_string()),
        }
        rest = &body[len..];
    }

    if tag.is_empty() && compound.ids.is_empty() && compound.classes.is_empty() {
        return None;
    }
    Some(compound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> (MemoryHost, ElementId, ElementId, ElementId) {
        let mut host = MemoryHost::new(ViewportSize::new(800.0, 600.0));
        let a = host.insert(MemoryElement::new("div").with_class("card").with_id("a").at(0.0, 0.0, 100.0, 100.0));
        let b = host.insert(MemoryElement::new("DIV").with_class("card").with_class("wide").at(0.0, 700.0, 100.0, 100.0));
        let c = host.insert(MemoryElement::new("img").at(0.0, 1400.0, 100.0, 100.0));
        (host, a, b, c)
    }

    #[test]
    fn test_query_simple_selectors() {
        let (host, a, b, c) = host();
        assert_eq!(host.query_selector_all("div").unwrap(), vec![a, b]);
        assert_eq!(host.query_selector_all(".card").unwrap(), vec![a, b]);
        assert_eq!(host.query_selector_all("#a").unwrap(), vec![a]);
        assert_eq!(host.query_selector_all("div.card.wide").unwrap(), vec![b]);
        assert_eq!(host.query_selector_all("*").unwrap(), vec![a, b, c]);
        assert!(host.query_selector_all("span").unwrap().is_empty());
    }

    #[test]
    fn test_query_list_keeps_document_order() {
        let (host, a, _, c) = host();
        assert_eq!(host.query_selector_all("img, #a").unwrap(), vec![a, c]);
        assert_eq!(host.query_selector_all("#a, div#a").unwrap(), vec![a]);
    }

    #[test]
    fn test_invalid_selectors() {
        let (host, ..) = host();
        for selector in ["", "  ", "div > p", "div p", ".", "#", "div,", "a[href]"] {
            assert!(
                matches!(host.query_selector_all(selector), Err(InViewError::InvalidSelector(_))),
                "{selector:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_scroll_moves_client_rects() {
        let (mut host, _, b, _) = host();
        assert_eq!(host.bounding_client_rect(&b).top, 700.0);

        host.scroll_by(0.0, 500.0);
        assert_eq!(host.bounding_client_rect(&b).top, 200.0);
        assert_eq!(host.scroll_position(), (0.0, 500.0));
    }

    #[test]
    fn test_removed_element_has_empty_rect() {
        let (mut host, a, ..) = host();
        assert!(host.remove(a));
        assert!(!host.remove(a));
        assert_eq!(host.bounding_client_rect(&a), ClientRect::default());
    }

    #[test]
    fn test_mutations_counted_once_observed() {
        let (mut host, a, ..) = host();
        host.add_class(a, "x");
        assert_eq!(host.take_mutations(), 0);

        host.observe_mutations(&MutationObserverInit::everything());
        host.add_class(a, "y");
        host.insert(MemoryElement::new("p"));
        assert_eq!(host.take_mutations(), 2);
        assert_eq!(host.take_mutations(), 0);
    }
}

//! Scripted scroll session over an in-memory document
//!
//! Run with `RUST_LOG=fos_inview=trace` to see every transition.

use std::time::{Duration, Instant};

use anyhow::Context;
use fos_inview::{
    ElementId, Handler, InView, InViewEvent, MemoryElement, MemoryHost, Offset, SelectorOptions, TriggerEvent,
    ViewportSize,
};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut host = MemoryHost::new(ViewportSize::new(1024.0, 768.0));
    for i in 0..8 {
        host.insert(
            MemoryElement::new("section")
                .with_id(&format!("s{i}"))
                .at(0.0, i as f64 * 600.0, 1024.0, 400.0),
        );
    }
    host.insert(MemoryElement::new("img").with_class("lazy").at(100.0, 2500.0, 300.0, 200.0));

    let mut inview = InView::new(host).context("no document")?;
    inview.set_interval(Duration::from_millis(50))?;

    inview
        .control("section", SelectorOptions::default().threshold(0.5))?
        .on(InViewEvent::Enter, Handler::new(|el: &ElementId, index| tracing::info!("section {} ({:?}) entered", index, el)))
        .on(InViewEvent::Exit, Handler::new(|el: &ElementId, index| tracing::info!("section {} ({:?}) exited", index, el)));

    inview
        .control(".lazy", SelectorOptions::default().offset(Offset::all(-200.0)))?
        .on(InViewEvent::Enter, Handler::new(|el: &ElementId, _| tracing::info!("loading image {:?}", el)));

    let start = Instant::now();
    inview.handle_event(TriggerEvent::DomContentLoaded, start)?;
    inview.handle_event(TriggerEvent::Load, start)?;

    // Scroll 40px every 10ms, as a wheel would
    let mut now = start;
    for _ in 0..120 {
        now += Duration::from_millis(10);
        inview.host_mut().scroll_by(0.0, 40.0);
        inview.handle_event(TriggerEvent::Scroll, now)?;
        inview.poll(now)?;
    }
    if let Some(deadline) = inview.next_deadline() {
        inview.poll(deadline)?;
    }

    tracing::info!("Scrolled to {:?}, leaving page", inview.host().scroll_position());
    inview.run_exit_on_elements_currently_in_view()?;

    Ok(())
}

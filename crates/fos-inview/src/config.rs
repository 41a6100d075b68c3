//! In-view Configuration

use std::time::Duration;

use serde::Deserialize;

use crate::geometry::Offset;
use crate::host::EventOptions;

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InViewConfig {
    /// Minimum time between two checks (ms)
    pub interval_ms: u64,

    /// Options passed to addEventListener for scroll/resize/load
    pub event_options: EventOptions,

    /// Default offset for new selectors
    pub offset: Offset,

    /// Default threshold for new selectors, in [0, 1]
    pub threshold: f64,
}

impl InViewConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for InViewConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            event_options: EventOptions::default(),
            offset: Offset::all(0.0),
            threshold: 0.0,
        }
    }
}

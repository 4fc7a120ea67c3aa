//! Per-coordinator options

use serde::{Deserialize, Serialize};

use crate::error::{FlightError, Result};

/// Options controlling a single coordinator instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightOptions {
    /// Cache the first successful result forever and never run the producer again.
    pub once: bool,
    /// Label carried in log lines and events.
    pub name: String,
    /// Buffer size of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for FlightOptions {
    fn default() -> Self {
        Self {
            once: false,
            name: "flight".to_string(),
            event_capacity: 256,
        }
    }
}

impl FlightOptions {
    /// Options with `once` enabled.
    pub fn run_once() -> Self {
        Self {
            once: true,
            ..Default::default()
        }
    }

    /// Set the once flag.
    pub fn with_once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    /// Set the label used in logs and events.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the event channel capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Check that every option is in range.
    pub fn validate(&self) -> Result<()> {
        if self.event_capacity == 0 {
            return Err(FlightError::InvalidOption("event_capacity must be at least 1".to_string()));
        }
        Ok(())
    }
}

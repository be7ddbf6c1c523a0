use crate::domain::model::Measurement;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Holds the most recent successful reading.
///
/// Starts out as an all-absent measurement and is only ever replaced
/// whole, so readers see either the previous reading or the new one.
#[derive(Debug, Default)]
pub struct MeasurementStore {
    current: RwLock<Arc<Measurement>>,
}

impl MeasurementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<Measurement> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, measurement: Measurement) {
        let next = Arc::new(measurement);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

/// Append-only list of audit lines, kept for display.
#[derive(Debug, Default)]
pub struct ReadingHistory {
    lines: Mutex<Vec<String>>,
}

impl ReadingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, line: String) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }

    pub fn entries(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

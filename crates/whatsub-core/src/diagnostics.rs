use std::sync::Mutex;

use crate::error::WhatsubError;
use crate::http::ResponseOutcome;

/// Reporting sink shared by the fetcher and the overlay service. Injected
/// explicitly so callers decide where output goes instead of the components
/// writing to a global console.
pub trait Diagnostics: Send + Sync {
    fn note(&self, message: &str);
    fn completed(&self, outcome: &ResponseOutcome);
    fn failed(&self, error: &WhatsubError);
}

/// Collects every report in memory. Used by tests to assert that exactly one
/// outcome is reported per invocation.
#[derive(Default)]
pub struct MemoryDiagnostics {
    lines: Mutex<Vec<String>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    fn push(&self, line: String) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line);
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn note(&self, message: &str) {
        self.push(message.to_string());
    }

    fn completed(&self, outcome: &ResponseOutcome) {
        self.push(format!(
            "completed: status={} bytes={}",
            outcome.status,
            outcome.body.len()
        ));
    }

    fn failed(&self, error: &WhatsubError) {
        self.push(format!("failed: {error}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_records_in_order() {
        let sink = MemoryDiagnostics::new();
        sink.note("first");
        sink.completed(&ResponseOutcome {
            status: 200,
            headers: Vec::new(),
            body: "{}".to_string(),
        });
        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "first");
        assert_eq!(lines[1], "completed: status=200 bytes=2");
    }
}

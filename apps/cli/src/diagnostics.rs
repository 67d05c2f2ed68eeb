use console::style;
use whatsub_core::{Diagnostics, ResponseOutcome, WhatsubError};

/// Console sink: outcomes print as `Status Code:` / `Response:` lines,
/// failures as a red `Error:` line on stderr.
pub struct ConsoleDiagnostics {
    pub show_headers: bool,
}

impl ConsoleDiagnostics {
    pub fn new() -> Self {
        Self {
            show_headers: false,
        }
    }
}

impl Default for ConsoleDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics for ConsoleDiagnostics {
    fn note(&self, message: &str) {
        println!("{}", style(message).dim());
    }

    fn completed(&self, outcome: &ResponseOutcome) {
        println!("{} {}", style("Status Code:").green().bold(), outcome.status);
        if self.show_headers {
            println!("{}", style("Headers:").bold());
            for (name, value) in &outcome.headers {
                println!("  {name}: {value}");
            }
        }
        println!("{} {}", style("Response:").bold(), outcome.body);
    }

    fn failed(&self, error: &WhatsubError) {
        eprintln!("{} {}", style("Error:").red().bold(), error);
    }
}

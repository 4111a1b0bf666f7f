//! Terminal output for human-facing command results

use colored::Colorize;
use reqcov_core::{
    Diagnostic,
    Severity,
};

/// Prints status lines, colored when the terminal supports it
#[derive(Debug, Clone)]
pub struct OutputManager {
    colored: bool,
}

impl OutputManager {
    /// Create an output manager
    pub fn new(colored: bool) -> Self {
        colored::control::set_override(colored);
        Self { colored }
    }

    /// Section header
    pub fn header(&self, title: &str) {
        let rule = "=".repeat(60);
        println!("{}", rule);
        if self.colored {
            println!("{}", title.bold());
        } else {
            println!("{}", title);
        }
        println!("{}", rule);
    }

    /// Success line
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("{} {}", "✅".bright_green(), message.bright_green());
        } else {
            println!("✅ {}", message);
        }
    }

    /// Failure line
    pub fn failure(&self, message: &str) {
        if self.colored {
            println!("{} {}", "❌".bright_red(), message.bright_red().bold());
        } else {
            println!("❌ {}", message);
        }
    }

    /// Warning line
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("{} {}", "⚠️".bright_yellow(), message.bright_yellow());
        } else {
            println!("⚠️  {}", message);
        }
    }

    /// Plain indented line
    pub fn item(&self, message: &str) {
        println!("   {}", message);
    }

    /// Diagnostic line, colored by severity
    pub fn diagnostic(&self, diagnostic: &Diagnostic) {
        let line = diagnostic.to_string();
        if !self.colored {
            println!("   {}", line);
            return;
        }
        let line = match diagnostic.severity {
            Severity::Error => line.bright_red(),
            Severity::Warning => line.bright_yellow(),
            Severity::Info => line.dimmed(),
        };
        println!("   {}", line);
    }
}

//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Healthy/Low:     green   (low risk, success messages)
//!   - Watch/Medium:    yellow  (medium risk and severity)
//!   - Danger/High:     red     (high risk and severity)
//!   - Critical:        red bold
//!   - Reference:       cyan    (task ids)
//!   - Muted:           dimmed  (field labels, reasons)
//!   - Emphasis:        bold    (section headers)

use colored::Colorize;
use pathwise_core::{RiskLevel, Severity};

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}

pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Colorize a task ID (cyan).
pub(crate) fn colorize_id(id: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return id.to_string();
    }
    id.cyan().to_string()
}

/// Apply color to a risk level.
pub(crate) fn colorize_level(level: RiskLevel, config: &OutputConfig) -> String {
    let text = level.to_string();
    if !config.use_colors {
        return text;
    }
    match level {
        RiskLevel::Low => text.green().to_string(),
        RiskLevel::Medium => text.yellow().to_string(),
        RiskLevel::High => text.red().to_string(),
        RiskLevel::Critical => text.red().bold().to_string(),
    }
}

/// Get a colored severity marker, with ASCII fallback support.
pub(crate) fn severity_icon(severity: Severity, config: &OutputConfig) -> String {
    let icon = if config.use_ascii {
        match severity {
            Severity::Low => "-",
            Severity::Medium => "!",
            Severity::High => "!!",
            Severity::Critical => "!!!",
        }
    } else {
        match severity {
            Severity::Low => "○",
            Severity::Medium => "▲",
            Severity::High => "✗",
            Severity::Critical => "✖",
        }
    };

    if !config.use_colors {
        return icon.to_string();
    }

    match severity {
        Severity::Low => icon.dimmed().to_string(),
        Severity::Medium => icon.yellow().to_string(),
        Severity::High => icon.red().to_string(),
        Severity::Critical => icon.red().bold().to_string(),
    }
}

//! Output formatting for CLI commands.
//!
//! This module provides utilities for formatting command output in both
//! human-readable text format and JSON format for programmatic use.
//!
//! Text renderers write to any [`Write`] so they can be tested against a
//! buffer; the `print_*` functions send them to stdout.

pub mod color;

use pathwise_core::{
    Alert, Bottleneck, CriticalPath, FactorBreakdown, ProjectSnapshot, ResourceConflict,
    RiskAnalysis, RiskScore, SuggestedDependency, TaskId,
};
use serde::Serialize;
use std::env;
use std::io::{self, Write};

pub use color::{success, warning};

use color::{bold, colorize_id, colorize_level, dimmed, severity_icon};

// ============================================================================
// Output Configuration
// ============================================================================

const DEFAULT_TERMINAL_WIDTH: u16 = 80;
const DEFAULT_MAX_CONTENT_WIDTH: usize = 80;

/// Configuration for output formatting.
///
/// This struct holds settings that control how output is formatted,
/// including terminal width limits, ASCII fallback mode, and color output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Maximum content width for text wrapping.
    pub max_width: usize,
    /// Whether to use ASCII-only icons instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new `OutputConfig` with explicit values.
    pub fn new(max_width: usize, use_ascii: bool, use_colors: bool) -> Self {
        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Create an `OutputConfig` by reading from environment variables.
    ///
    /// Reads:
    /// - `PATHWISE_MAX_WIDTH`: Maximum content width (default: 80)
    /// - `PATHWISE_ASCII`: Set to "1" or "true" for ASCII-only icons (default: false)
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `PATHWISE_COLOR`: Set to "0" or "false" to disable colors (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_width = match lookup("PATHWISE_MAX_WIDTH") {
            Some(s) if !s.is_empty() => s.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    env_var = "PATHWISE_MAX_WIDTH",
                    value = %s,
                    default = DEFAULT_MAX_CONTENT_WIDTH,
                    "Invalid value, using default"
                );
                DEFAULT_MAX_CONTENT_WIDTH
            }),
            _ => DEFAULT_MAX_CONTENT_WIDTH,
        };

        let use_ascii = match lookup("PATHWISE_ASCII") {
            Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
            Some(v) if v == "0" || v.eq_ignore_ascii_case("false") || v.is_empty() => false,
            Some(v) => {
                tracing::warn!(
                    env_var = "PATHWISE_ASCII",
                    value = %v,
                    "Invalid value (expected '1', 'true', '0', or 'false'), using default"
                );
                false
            }
            None => false,
        };

        // https://no-color.org/
        let use_colors = lookup("NO_COLOR").is_none()
            && lookup("PATHWISE_COLOR")
                .is_none_or(|v| v != "0" && !v.eq_ignore_ascii_case("false"));

        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Width available for content on the current terminal.
    pub fn content_width(&self) -> usize {
        get_terminal_width().min(self.max_width)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_CONTENT_WIDTH,
            use_ascii: false,
            use_colors: true,
        }
    }
}

/// Get the current terminal width, falling back to default if detection fails.
fn get_terminal_width() -> usize {
    terminal_size::terminal_size()
        .map_or(usize::from(DEFAULT_TERMINAL_WIDTH), |(w, _)| usize::from(w.0))
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

// ============================================================================
// Public Dispatch Functions
// ============================================================================

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(handle, "{json}")
}

/// Print a full analysis as text.
pub fn print_analysis(analysis: &RiskAnalysis, snapshot: &ProjectSnapshot) -> io::Result<()> {
    let config = OutputConfig::from_env();
    let width = config.content_width();
    write_analysis_text(&mut io::stdout().lock(), analysis, snapshot, width, &config)
}

/// Print a critical path as text.
pub fn print_critical_path(path: &CriticalPath, snapshot: &ProjectSnapshot) -> io::Result<()> {
    let config = OutputConfig::from_env();
    write_critical_path_text(&mut io::stdout().lock(), path, snapshot, &config)
}

/// Print a risk score as text.
pub fn print_risk(risk: &RiskScore) -> io::Result<()> {
    let config = OutputConfig::from_env();
    write_risk_text(&mut io::stdout().lock(), risk, &config)
}

/// Print dependency suggestions as text.
pub fn print_suggestions(suggestions: &[SuggestedDependency]) -> io::Result<()> {
    let config = OutputConfig::from_env();
    let width = config.content_width();
    write_suggestions_text(&mut io::stdout().lock(), suggestions, width, &config)
}

// ============================================================================
// Text Formatting
// ============================================================================

fn write_heading<W: Write>(w: &mut W, title: &str, config: &OutputConfig) -> io::Result<()> {
    writeln!(w)?;
    writeln!(w, "{}", bold(title, config))
}

/// Write the complete analysis report.
pub fn write_analysis_text<W: Write>(
    w: &mut W,
    analysis: &RiskAnalysis,
    snapshot: &ProjectSnapshot,
    width: usize,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {}",
        bold(&snapshot.name, config),
        dimmed(&format!("({})", snapshot.id), config)
    )?;
    writeln!(
        w,
        "{} {}",
        dimmed("Analyzed at:", config),
        analysis.analyzed_at.to_rfc3339()
    )?;

    write_risk_text(w, &analysis.report.risk, config)?;
    write_critical_path_text(w, &analysis.report.critical_path, snapshot, config)?;
    write_alerts_text(w, &analysis.report.alerts, width, config)?;
    write_bottlenecks_text(w, &analysis.report.bottlenecks, width, config)?;
    write_conflicts_text(w, &analysis.report.resource_conflicts, config)?;
    if !analysis.suggested_dependencies.is_empty() {
        write_suggestions_text(w, &analysis.suggested_dependencies, width, config)?;
    }
    Ok(())
}

/// Write the score, level and factor table.
pub fn write_risk_text<W: Write>(
    w: &mut W,
    risk: &RiskScore,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {}/100 ({})",
        bold("Risk score:", config),
        risk.score,
        colorize_level(risk.level, config)
    )?;

    let factors = &risk.factors;
    let rows: [(&str, &FactorBreakdown, &str); 5] = [
        ("Overdue", &factors.overdue, "tasks"),
        ("Blocked", &factors.blocked, "tasks"),
        ("Resource conflicts", &factors.resource_conflicts, "users"),
        ("Dependency depth", &factors.dependency_depth, "levels"),
        ("At risk", &factors.at_risk, "tasks"),
    ];
    for (label, factor, unit) in rows {
        let penalty = if factor.penalty == 0 {
            dimmed("0", config)
        } else {
            warning(&format!("-{}", factor.penalty), config)
        };
        writeln!(
            w,
            "  {:<20} {:>3} {:<7} {penalty}",
            label, factor.count, unit
        )?;
    }
    Ok(())
}

fn task_title<'a>(snapshot: &'a ProjectSnapshot, id: &TaskId) -> Option<&'a str> {
    snapshot
        .tasks
        .iter()
        .find(|task| &task.id == id)
        .map(|task| task.title.as_str())
}

/// Write the critical path, one task per line.
pub fn write_critical_path_text<W: Write>(
    w: &mut W,
    path: &CriticalPath,
    snapshot: &ProjectSnapshot,
    config: &OutputConfig,
) -> io::Result<()> {
    let plural = if path.total_days == 1 { "" } else { "s" };
    write_heading(
        w,
        &format!("Critical path ({} day{plural}):", path.total_days),
        config,
    )?;

    if path.task_ids.is_empty() {
        return writeln!(w, "  {}", dimmed("No tasks", config));
    }
    for (position, id) in path.task_ids.iter().enumerate() {
        let title = task_title(snapshot, id).unwrap_or_default();
        writeln!(
            w,
            "  {:>2}. {} {title}",
            position + 1,
            colorize_id(id.as_str(), config)
        )?;
    }
    Ok(())
}

fn write_wrapped<W: Write>(w: &mut W, prefix: &str, text: &str, width: usize) -> io::Result<()> {
    let indent = " ".repeat(4);
    for (i, line) in wrap_text(text, width.saturating_sub(4)).iter().enumerate() {
        if i == 0 {
            writeln!(w, "  {prefix} {line}")?;
        } else {
            writeln!(w, "{indent}{line}")?;
        }
    }
    Ok(())
}

fn write_alerts_text<W: Write>(
    w: &mut W,
    alerts: &[Alert],
    width: usize,
    config: &OutputConfig,
) -> io::Result<()> {
    if alerts.is_empty() {
        return Ok(());
    }
    write_heading(w, "Alerts:", config)?;
    for alert in alerts {
        write_wrapped(
            w,
            &severity_icon(alert.severity, config),
            &alert.message,
            width,
        )?;
    }
    Ok(())
}

fn write_bottlenecks_text<W: Write>(
    w: &mut W,
    bottlenecks: &[Bottleneck],
    width: usize,
    config: &OutputConfig,
) -> io::Result<()> {
    if bottlenecks.is_empty() {
        return Ok(());
    }
    write_heading(w, "Bottlenecks:", config)?;
    for bottleneck in bottlenecks {
        writeln!(
            w,
            "  {} {} {}",
            colorize_id(bottleneck.task_id.as_str(), config),
            bottleneck.task_title,
            dimmed(
                &format!("(+{}d impact)", bottleneck.delay_impact_days),
                config
            )
        )?;
        for line in wrap_text(&bottleneck.reason, width.saturating_sub(4)) {
            writeln!(w, "    {}", dimmed(&line, config))?;
        }
    }
    Ok(())
}

fn write_conflicts_text<W: Write>(
    w: &mut W,
    conflicts: &[ResourceConflict],
    config: &OutputConfig,
) -> io::Result<()> {
    if conflicts.is_empty() {
        return Ok(());
    }
    write_heading(w, "Resource conflicts:", config)?;
    for conflict in conflicts {
        let who = conflict.user_name.as_deref().unwrap_or(&conflict.user_id);
        let ids: Vec<String> = conflict
            .task_ids
            .iter()
            .map(|id| colorize_id(id.as_str(), config))
            .collect();
        writeln!(
            w,
            "  {who}: {} tasks due within {} days ({})",
            conflict.task_ids.len(),
            conflict.overlap_days,
            ids.join(", ")
        )?;
    }
    Ok(())
}

/// Write dependency suggestions with their confidence and reason.
pub fn write_suggestions_text<W: Write>(
    w: &mut W,
    suggestions: &[SuggestedDependency],
    width: usize,
    config: &OutputConfig,
) -> io::Result<()> {
    write_heading(w, "Suggested dependencies:", config)?;
    if suggestions.is_empty() {
        return writeln!(w, "  {}", dimmed("None", config));
    }
    for suggestion in suggestions {
        writeln!(
            w,
            "  {} -> {} {}",
            colorize_id(suggestion.task_id.as_str(), config),
            colorize_id(suggestion.depends_on_task_id.as_str(), config),
            dimmed(&format!("({:.2})", suggestion.confidence), config)
        )?;
        for line in wrap_text(&suggestion.reason, width.saturating_sub(4)) {
            writeln!(w, "    {line}")?;
        }
    }
    Ok(())
}

/// Wrap text to the given width, preserving blank lines.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, max_width.max(1))
                    .into_iter()
                    .map(std::borrow::Cow::into_owned)
                    .collect()
            }
        })
        .collect()
}

use std::fmt::Write;

use anyhow::Result;
use colored::Colorize;

use crate::result::{Issue, ScanResult, Severity};

/// Format styles supported by the default reporter.
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Produce a report string from a `ScanResult` in the desired format.
pub fn render_report(result: &ScanResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Human => render_human(result),
        OutputFormat::Json => {
            let mut rendered = serde_json::to_string_pretty(result)?;
            rendered.push('\n');
            Ok(rendered)
        }
    }
}

fn render_human(result: &ScanResult) -> Result<String> {
    let mut out = String::new();
    if !result.ok {
        writeln!(
            out,
            "Scan failed: {}",
            result.error_message.as_deref().unwrap_or("no error message")
        )?;
        return Ok(out);
    }
    if result.issues.is_empty() {
        writeln!(out, "No known vulnerabilities found.")?;
    } else {
        writeln!(out, "Found {}:", count_label(result.issues.len()))?;
        writeln!(out)?;
        for issue in ordered(&result.issues) {
            writeln!(
                out,
                "- [{}] {} {}",
                severity_badge(issue.severity),
                issue.id,
                issue.title
            )?;
            writeln!(out, "  package: {}@{}", issue.package_name, issue.version)?;
            if !issue.description.trim().is_empty() {
                writeln!(out, "  {}", single_line(&issue.description))?;
            }
        }
    }
    if let Some(summary) = &result.summary {
        writeln!(out)?;
        writeln!(out, "{summary}")?;
    }
    Ok(out)
}

/// Issues sorted most severe first, ties broken by id for stable output.
fn ordered(issues: &[Issue]) -> Vec<&Issue> {
    let mut ordered: Vec<&Issue> = issues.iter().collect();
    ordered.sort_by(|a, b| b.severity.cmp(&a.severity).then_with(|| a.id.cmp(&b.id)));
    ordered
}

fn severity_badge(severity: Severity) -> String {
    let label = severity.to_string();
    match severity {
        Severity::Critical => label.red().bold().to_string(),
        Severity::High => label.red().to_string(),
        Severity::Medium => label.yellow().to_string(),
        Severity::Low => label.green().to_string(),
        Severity::Unknown => label.dimmed().to_string(),
    }
}

fn count_label(count: usize) -> String {
    if count == 1 {
        "1 issue".to_owned()
    } else {
        format!("{count} issues")
    }
}

fn single_line(text: &str) -> String {
    text.trim()
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

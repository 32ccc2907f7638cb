// Output module - Terminal presentation of check, cycle and channel results

use crate::monitor::{CheckReport, CycleReport, Finding, Severity};
use colored::*;
use std::path::PathBuf;

/// Print a section header with consistent formatting
pub fn print_section_header(title: &str) {
    println!("\n{}", title.cyan().bold());
    println!("{}", "=".repeat(80));
}

/// Format a severity with appropriate color
pub fn format_severity(severity: Severity) -> ColoredString {
    let label = severity.to_string();
    match severity {
        Severity::Critical => label.red().bold(),
        Severity::High => label.red(),
        Severity::Medium => label.yellow(),
        Severity::Low => label.green(),
        Severity::Info => label.normal(),
    }
}

/// Format a status indicator with color based on boolean value
fn format_status_indicator(value: bool) -> ColoredString {
    if value { "✓".green() } else { "✗".red() }
}

pub fn format_finding(finding: &Finding) -> String {
    format!(
        "  [{}] {}: {}",
        format_severity(finding.severity),
        finding.title,
        finding.message
    )
}

/// Print one check's outcome and its findings
pub fn print_check_report(report: &CheckReport) {
    print_section_header(&format!("Check: {}", report.check));

    println!(
        "  {} {}",
        format_status_indicator(report.passed()),
        if report.passed() { "passed" } else { "failed" }
    );
    for finding in &report.findings {
        println!("{}", format_finding(finding));
    }

    if let Ok(metrics) = serde_json::to_string_pretty(&report.metrics) {
        println!("\n{}", "Metrics:".bold());
        println!("{}", metrics);
    }
    println!();
}

/// Print a cycle summary and every finding it produced
pub fn print_cycle_report(report: &CycleReport) {
    let summary = &report.summary;
    print_section_header("Monitoring Cycle");

    println!(
        "  Checks passed: {}/{}",
        summary.checks_passed, summary.total_checks
    );
    println!("  Duration:      {}ms", summary.duration_ms);
    println!(
        "  Findings:      {} ({} critical)",
        summary.findings, summary.critical_findings
    );
    if report.delivery_failures > 0 {
        println!(
            "  {}",
            format!("{} alert deliveries failed", report.delivery_failures).yellow()
        );
    }

    if !report.findings.is_empty() {
        println!();
        for finding in &report.findings {
            println!("{}", format_finding(finding));
        }
    }
    println!();
}

/// Print per-channel test results
pub fn print_channel_results(results: &[(String, crate::Result<()>)]) {
    print_section_header("Alert Channel Tests:");

    if results.is_empty() {
        println!("No alert channels configured");
    } else {
        for (channel_name, result) in results {
            let message = match result {
                Ok(()) => "Success".to_string(),
                Err(e) => format!("Failed: {}", e),
            };
            println!(
                "  {} {} - {}",
                format_status_indicator(result.is_ok()),
                channel_name,
                message
            );
        }
    }
    println!();
}

pub fn print_written_files(paths: &[PathBuf]) {
    for path in paths {
        println!("{} Report saved to: {}", "✓".green(), path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_finding_contains_title_and_message() {
        colored::control::set_override(false);
        let finding = Finding {
            check_name: "health".to_string(),
            severity: Severity::Critical,
            title: "Vault is sealed".to_string(),
            message: "Vault reports sealed=true".to_string(),
            timestamp: Utc::now(),
            source_host: "monitor-1".to_string(),
        };

        assert_eq!(
            format_finding(&finding),
            "  [CRITICAL] Vault is sealed: Vault reports sealed=true"
        );
    }
}
